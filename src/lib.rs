//! `strandgraph` is a crate for editing the strand graph of a DNA origami
//! design.
//!
//! A design is a set of parallel axes (virtual helices) on a grid. Each axis
//! has two lanes, the scaffold and the staple side, and each lane holds
//! non-overlapping strands. Strands are linked 3' to 5' by crossovers between
//! axes, and following those links from a 5' end gives an oligo: one
//! continuous polymer with a single color and sequence.
//!
//! The crate provides three main points of entry:
//!
//! - [`Design`] holds the graph and exposes every edit (connecting, clearing,
//!   splitting, merging and resizing strands, installing and removing
//!   crossovers, painting sequences and colors) as a journaled transaction
//!   that can be undone and redone.
//! - [`autostaple`] breaks over-long staple oligos into pieces close to a
//!   preferred length using a shortest-path search over the admissible cut
//!   points.
//! - [`codec`] writes a design as per-axis records and rebuilds it from them.
//!
//! Shared configuration, such as the lattice the axes sit on and the staple
//! palette, lives in a [`Context`](context::Context) handed to the design at
//! construction.
//!
//! ```
//! use strandgraph::Design;
//! use strandgraph::autostaple;
//! use strandgraph::autostaple::Params;
//! use strandgraph::design::Side;
//!
//! let mut design = Design::default();
//! let a = design.add_axis_with_length(0, 0, 64)?.lane(Side::Staple);
//! let b = design.add_axis_with_length(0, 1, 64)?.lane(Side::Staple);
//!
//! // Staples run toward lower indices on even axes and higher ones on odd.
//! let first = design.connect(a, 0, 39)?;
//! design.connect(b, 0, 29)?;
//! design.install_crossover(a, 0, b, 0)?;
//!
//! let oligo = design.oligo_of(first).ok_or("no oligo")?;
//! assert_eq!(design.oligo_length(oligo), Some(70));
//!
//! let plan = autostaple::run(&mut design, oligo, &Params::default())?;
//! assert_eq!(plan.lengths(), &[35, 35]);
//!
//! // The whole autostaple run is one step of history.
//! design.undo()?;
//! assert_eq!(design.oligo_length(oligo), Some(70));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![warn(rust_2021_compatibility)]
#![warn(missing_debug_implementations)]
#![warn(clippy::missing_docs_in_private_items)]
#![warn(rustdoc::broken_intra_doc_links)]

pub mod autostaple;
pub mod codec;
pub mod color;
pub mod context;
pub mod design;
pub mod range;

pub use color::Color;
pub use design::Design;
