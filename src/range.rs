//! Sorted, non-overlapping sets of half-open integer intervals.
//!
//! A [`RangeSet`] is the geometric backbone of every lane in a design: each
//! strand occupies one interval of the set and the set guarantees that no two
//! strands ever overlap. The set itself knows nothing about strands. Instead,
//! it carries an opaque value per interval and defers the question "may these
//! two touching intervals be fused into one?" to a [`MergePolicy`] supplied at
//! construction time.
//!
//! ```text
//! 0   1   2   3   4   5   6   7   8   9
//! |---A---|       |-----B-----|           <= before
//!         |---A---|                       <= add_range(2, 4, A)
//! |-------A-------|-----B-----|           <= after (A merged, B untouched)
//! ```

pub mod interval;
pub mod set;

pub use interval::Interval;
pub use set::Equal;
pub use set::Inconsistency;
pub use set::MergePolicy;
pub use set::RangeSet;
pub use set::Splice;
