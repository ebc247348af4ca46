//! The persisted shape of an axis.

use std::collections::BTreeMap;

use crate::Color;
use crate::design::Side;

/// The insertion size that marks a skipped base.
pub const SKIP: isize = -1;

/// The persisted state of one lane.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct LaneRecord {
    /// One token per base, separated by spaces.
    connectivity: String,

    /// Oligo colors, keyed by the index of a 5' end of the oligo.
    colors: BTreeMap<usize, Color>,

    /// Insertion sizes, with [`SKIP`] for a skipped base.
    insertions: BTreeMap<usize, isize>,

    /// Sequence text per base.
    sequences: BTreeMap<usize, String>,
}

impl LaneRecord {
    /// Creates a new [`LaneRecord`].
    ///
    /// # Examples
    ///
    /// ```
    /// use std::collections::BTreeMap;
    ///
    /// use strandgraph::codec::LaneRecord;
    ///
    /// let record = LaneRecord::new(
    ///     String::from(". -|> <|-"),
    ///     BTreeMap::new(),
    ///     BTreeMap::from([(2, -1)]),
    ///     BTreeMap::new(),
    /// );
    ///
    /// assert_eq!(record.connectivity(), ". -|> <|-");
    /// assert_eq!(record.insertions().get(&2), Some(&-1));
    /// ```
    pub fn new(
        connectivity: String,
        colors: BTreeMap<usize, Color>,
        insertions: BTreeMap<usize, isize>,
        sequences: BTreeMap<usize, String>,
    ) -> Self {
        Self {
            connectivity,
            colors,
            insertions,
            sequences,
        }
    }

    /// Gets the connectivity string.
    pub fn connectivity(&self) -> &str {
        &self.connectivity
    }

    /// Gets the oligo colors, keyed by the index of a 5' end.
    pub fn colors(&self) -> &BTreeMap<usize, Color> {
        &self.colors
    }

    /// Gets the insertion sizes.
    pub fn insertions(&self) -> &BTreeMap<usize, isize> {
        &self.insertions
    }

    /// Gets the sequence text per base.
    pub fn sequences(&self) -> &BTreeMap<usize, String> {
        &self.sequences
    }

    /// Gets the oligo colors for mutation.
    pub(crate) fn colors_mut(&mut self) -> &mut BTreeMap<usize, Color> {
        &mut self.colors
    }
}

/// The persisted state of one axis.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AxisRecord {
    /// The grid row.
    row: usize,

    /// The grid column.
    col: usize,

    /// The number of bases.
    length: usize,

    /// The scaffold lane.
    scaffold: LaneRecord,

    /// The staple lane.
    staple: LaneRecord,
}

impl AxisRecord {
    /// Creates a new [`AxisRecord`].
    pub fn new(
        row: usize,
        col: usize,
        length: usize,
        scaffold: LaneRecord,
        staple: LaneRecord,
    ) -> Self {
        Self {
            row,
            col,
            length,
            scaffold,
            staple,
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

    /// Gets the number of bases.
    pub fn length(&self) -> usize {
        self.length
    }

    /// Gets the record of one lane.
    pub fn lane(&self, side: Side) -> &LaneRecord {
        match side {
            Side::Scaffold => &self.scaffold,
            Side::Staple => &self.staple,
        }
    }

    /// Gets the record of one lane for mutation.
    pub(crate) fn lane_mut(&mut self, side: Side) -> &mut LaneRecord {
        match side {
            Side::Scaffold => &mut self.scaffold,
            Side::Staple => &mut self.staple,
        }
    }
}
