//! Virtual helices.

use omics::coordinate::Strand as Polarity;

use crate::design::Side;
use crate::design::StrandId;
use crate::range::RangeSet;

/// A virtual helix: a fixed grid position carrying a scaffold lane and a
/// staple lane over the shared index domain `[0, length)`.
#[derive(Clone, Debug, PartialEq)]
pub struct Axis {
    /// The grid row.
    row: usize,

    /// The grid column.
    col: usize,

    /// The number of base positions on each lane.
    length: usize,

    /// The strands on the scaffold lane.
    scaffold: RangeSet<StrandId>,

    /// The strands on the staple lane.
    staple: RangeSet<StrandId>,
}

impl Axis {
    /// Creates an axis with empty lanes.
    pub(crate) fn new(row: usize, col: usize, length: usize) -> Self {
        Self {
            row,
            col,
            length,
            scaffold: RangeSet::default(),
            staple: RangeSet::default(),
        }
    }

    /// Gets the grid row.
    pub fn row(&self) -> usize {
        self.row
    }

    /// Gets the grid column.
    pub fn col(&self) -> usize {
        self.col
    }

    /// Gets the grid coordinate as `(row, col)`.
    pub fn coordinate(&self) -> (usize, usize) {
        (self.row, self.col)
    }

    /// Gets the number of base positions on each lane.
    #[allow(clippy::len_without_is_empty)]
    pub fn length(&self) -> usize {
        self.length
    }

    pub(crate) fn set_length(&mut self, length: usize) {
        self.length = length;
    }

    /// Returns whether `row + col` is even.
    pub fn is_even_parity(&self) -> bool {
        (self.row + self.col) % 2 == 0
    }

    /// Gets the 5'→3' polarity of a lane.
    ///
    /// [`Polarity::Positive`] means 5'→3' runs toward increasing indices. The
    /// scaffold is positive on even-parity helices and the staple is always
    /// the complement of the scaffold.
    pub fn polarity(&self, side: Side) -> Polarity {
        let scaffold = match self.is_even_parity() {
            true => Polarity::Positive,
            false => Polarity::Negative,
        };

        match side {
            Side::Scaffold => scaffold,
            Side::Staple => scaffold.complement(),
        }
    }

    /// Gets the strand intervals of one lane.
    pub fn lane(&self, side: Side) -> &RangeSet<StrandId> {
        match side {
            Side::Scaffold => &self.scaffold,
            Side::Staple => &self.staple,
        }
    }

    pub(crate) fn lane_mut(&mut self, side: Side) -> &mut RangeSet<StrandId> {
        match side {
            Side::Scaffold => &mut self.scaffold,
            Side::Staple => &mut self.staple,
        }
    }

    /// Clamps an index into `[0, length - 1]`.
    pub(crate) fn clamp(&self, idx: usize) -> usize {
        idx.min(self.length.saturating_sub(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polarity_follows_parity() {
        let even = Axis::new(0, 0, 42);
        assert_eq!(even.polarity(Side::Scaffold), Polarity::Positive);
        assert_eq!(even.polarity(Side::Staple), Polarity::Negative);

        let odd = Axis::new(0, 1, 42);
        assert_eq!(odd.polarity(Side::Scaffold), Polarity::Negative);
        assert_eq!(odd.polarity(Side::Staple), Polarity::Positive);
    }

    #[test]
    fn test_clamp() {
        let axis = Axis::new(2, 2, 10);
        assert_eq!(axis.clamp(3), 3);
        assert_eq!(axis.clamp(10), 9);
        assert_eq!(axis.clamp(usize::MAX), 9);
    }
}
