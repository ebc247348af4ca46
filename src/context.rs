//! Shared configuration for a design.
//!
//! A [`Context`] is created once by the host and handed to every
//! [`Design`](crate::Design) it constructs. It holds everything that would
//! otherwise be global application state: the lattice the helices are laid
//! out on, the palette new staples are drawn from, and the policy for
//! degenerate single-base crossovers.
//!
//! ```
//! use strandgraph::context::Builder;
//! use strandgraph::context::Lattice;
//!
//! let context = Builder::default().lattice(Lattice::Square).build();
//! assert_eq!(context.lattice().step(), 32);
//! assert_eq!(context.default_axis_length(), 64);
//! ```

use nonempty::NonEmpty;

use crate::Color;

pub mod builder;
pub mod lattice;

pub use builder::Builder;
pub use lattice::Lattice;

/// The default staple palette.
pub const STAPLE_PALETTE: [Color; 12] = [
    Color::rgb(0xcc, 0x00, 0x00),
    Color::rgb(0xf7, 0x43, 0x08),
    Color::rgb(0xf7, 0x93, 0x1e),
    Color::rgb(0xaa, 0xaa, 0x00),
    Color::rgb(0x57, 0xbb, 0x00),
    Color::rgb(0x00, 0x72, 0x00),
    Color::rgb(0x03, 0xb6, 0xa2),
    Color::rgb(0x17, 0x00, 0xde),
    Color::rgb(0x73, 0x00, 0xde),
    Color::rgb(0xb8, 0x05, 0x6c),
    Color::rgb(0x33, 0x33, 0x33),
    Color::rgb(0x88, 0x88, 0x88),
];

/// The default scaffold color.
pub const SCAFFOLD_COLOR: Color = Color::rgb(0x00, 0x66, 0xcc);

/// What to do when a crossover would leave a strand one base long between two
/// links.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum SingleBaseCrossovers {
    /// Extend the strand by one base away from the new crossover, rejecting
    /// the crossover when there is no room.
    #[default]
    Extend,

    /// Install the crossover as requested.
    Allow,
}

/// Shared configuration for a design.
#[derive(Clone, Debug)]
pub struct Context {
    /// The lattice the helices are arranged on.
    lattice: Lattice,

    /// The colors cycled through for new staple oligos.
    palette: NonEmpty<Color>,

    /// The color of scaffold oligos.
    scaffold_color: Color,

    /// The single-base crossover policy.
    single_base_crossovers: SingleBaseCrossovers,

    /// The length given to newly created axes.
    default_axis_length: usize,
}

impl Context {
    /// Gets the lattice.
    pub fn lattice(&self) -> Lattice {
        self.lattice
    }

    /// Gets the staple palette.
    pub fn palette(&self) -> &NonEmpty<Color> {
        &self.palette
    }

    /// Gets the `n`th staple color, cycling through the palette.
    ///
    /// # Examples
    ///
    /// ```
    /// use strandgraph::context::Context;
    /// use strandgraph::context::STAPLE_PALETTE;
    ///
    /// let context = Context::default();
    /// assert_eq!(context.staple_color(0), STAPLE_PALETTE[0]);
    /// assert_eq!(context.staple_color(13), STAPLE_PALETTE[1]);
    /// ```
    pub fn staple_color(&self, n: usize) -> Color {
        self.palette[n % self.palette.len()]
    }

    /// Gets the scaffold color.
    pub fn scaffold_color(&self) -> Color {
        self.scaffold_color
    }

    /// Gets the single-base crossover policy.
    pub fn single_base_crossovers(&self) -> SingleBaseCrossovers {
        self.single_base_crossovers
    }

    /// Gets the length given to newly created axes.
    pub fn default_axis_length(&self) -> usize {
        self.default_axis_length
    }
}

impl Default for Context {
    fn default() -> Self {
        Builder::default().build()
    }
}
