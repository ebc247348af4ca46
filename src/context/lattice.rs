//! Helix packing lattices and their crossover geometry.
//!
//! Neighboring helices can only be joined where their backbones face each
//! other. On both lattices this happens at a fixed set of offsets that repeat
//! every [`Lattice::step()`] bases. Each helix has up to three (honeycomb) or
//! four (square) neighbor slots, and each slot has its own offsets.

use crate::design::Side;

/// Offsets per neighbor slot: honeycomb scaffold, facing left.
const HONEYCOMB_SCAFFOLD_LEFT: &[&[usize]] = &[&[1, 11], &[8, 18], &[4, 15]];

/// Offsets per neighbor slot: honeycomb scaffold, facing right.
const HONEYCOMB_SCAFFOLD_RIGHT: &[&[usize]] = &[&[2, 12], &[9, 19], &[5, 16]];

/// Offsets per neighbor slot: honeycomb staple, facing left.
const HONEYCOMB_STAPLE_LEFT: &[&[usize]] = &[&[6], &[13], &[20]];

/// Offsets per neighbor slot: honeycomb staple, facing right.
const HONEYCOMB_STAPLE_RIGHT: &[&[usize]] = &[&[7], &[14], &[0]];

/// Offsets per neighbor slot: square scaffold, facing left.
const SQUARE_SCAFFOLD_LEFT: &[&[usize]] = &[&[4, 26, 15], &[18, 28, 7], &[10, 20, 31], &[2, 12, 23]];

/// Offsets per neighbor slot: square scaffold, facing right.
const SQUARE_SCAFFOLD_RIGHT: &[&[usize]] =
    &[&[5, 27, 16], &[19, 29, 8], &[11, 21, 0], &[3, 13, 24]];

/// Offsets per neighbor slot: square staple, facing left.
const SQUARE_STAPLE_LEFT: &[&[usize]] = &[&[31], &[23], &[15], &[7]];

/// Offsets per neighbor slot: square staple, facing right.
const SQUARE_STAPLE_RIGHT: &[&[usize]] = &[&[0], &[24], &[16], &[8]];

/// The lattice helices are packed on.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Lattice {
    /// Hexagonal packing; 21 bases per two helical turns.
    #[default]
    Honeycomb,

    /// Square packing; 32 bases per three helical turns.
    Square,
}

impl Lattice {
    /// Gets the number of bases after which the crossover pattern repeats.
    pub fn step(&self) -> usize {
        match self {
            Lattice::Honeycomb => 21,
            Lattice::Square => 32,
        }
    }

    /// Gets the grid coordinates of every neighbor slot of `(row, col)`, in
    /// slot order. Slots falling off the grid's low edge are [`None`].
    ///
    /// # Examples
    ///
    /// ```
    /// use strandgraph::context::Lattice;
    ///
    /// let neighbors = Lattice::Honeycomb.neighbors(0, 0);
    /// assert_eq!(neighbors, vec![Some((0, 1)), None, None]);
    ///
    /// let neighbors = Lattice::Honeycomb.neighbors(1, 2);
    /// assert_eq!(neighbors, vec![Some((1, 1)), Some((2, 2)), Some((1, 3))]);
    /// ```
    pub fn neighbors(&self, row: usize, col: usize) -> Vec<Option<(usize, usize)>> {
        let even = (row + col) % 2 == 0;

        let deltas: &[(isize, isize)] = match (self, even) {
            (Lattice::Honeycomb, true) => &[(0, 1), (-1, 0), (0, -1)],
            (Lattice::Honeycomb, false) => &[(0, -1), (1, 0), (0, 1)],
            (Lattice::Square, true) => &[(0, 1), (1, 0), (0, -1), (-1, 0)],
            (Lattice::Square, false) => &[(0, -1), (-1, 0), (0, 1), (1, 0)],
        };

        deltas
            .iter()
            .map(|(dr, dc)| {
                let r = row.checked_add_signed(*dr)?;
                let c = col.checked_add_signed(*dc)?;
                Some((r, c))
            })
            .collect()
    }

    /// Gets the crossover offsets (modulo [`Lattice::step()`]) per neighbor
    /// slot for one side of a helix, for crossovers leaving toward the right
    /// (increasing index) or the left.
    pub fn crossover_offsets(&self, side: Side, facing_right: bool) -> &'static [&'static [usize]] {
        match (self, side, facing_right) {
            (Lattice::Honeycomb, Side::Scaffold, false) => HONEYCOMB_SCAFFOLD_LEFT,
            (Lattice::Honeycomb, Side::Scaffold, true) => HONEYCOMB_SCAFFOLD_RIGHT,
            (Lattice::Honeycomb, Side::Staple, false) => HONEYCOMB_STAPLE_LEFT,
            (Lattice::Honeycomb, Side::Staple, true) => HONEYCOMB_STAPLE_RIGHT,
            (Lattice::Square, Side::Scaffold, false) => SQUARE_SCAFFOLD_LEFT,
            (Lattice::Square, Side::Scaffold, true) => SQUARE_SCAFFOLD_RIGHT,
            (Lattice::Square, Side::Staple, false) => SQUARE_STAPLE_LEFT,
            (Lattice::Square, Side::Staple, true) => SQUARE_STAPLE_RIGHT,
        }
    }
}
