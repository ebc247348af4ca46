//! Strand records.

use std::collections::BTreeMap;

use omics::coordinate::Strand as Polarity;

use crate::design::LaneId;
use crate::design::OligoId;
use crate::design::StrandId;

/// One of the two ends of a strand.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum End {
    /// The 5' end.
    Five,

    /// The 3' end.
    Three,
}

impl End {
    /// Gets the other end.
    pub fn opposite(&self) -> End {
        match self {
            End::Five => End::Three,
            End::Three => End::Five,
        }
    }
}

impl std::fmt::Display for End {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            End::Five => write!(f, "5'"),
            End::Three => write!(f, "3'"),
        }
    }
}

/// A per-base annotation carried by a strand.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Decorator {
    /// The base is followed by this many extra, unlattice-bound bases.
    Insertion(usize),

    /// The base is omitted from the physical sequence.
    Skip,
}

impl Decorator {
    /// Gets the number of sequence characters the decorated base takes.
    pub fn width(&self) -> usize {
        match self {
            Decorator::Insertion(extra) => 1 + extra,
            Decorator::Skip => 0,
        }
    }
}

/// A contiguous run of occupied bases on one lane.
#[derive(Clone, Debug, PartialEq)]
pub struct Strand {
    /// The lane the strand lives on.
    lane: LaneId,

    /// The 5'→3' polarity of the lane.
    polarity: Polarity,

    /// The lowest occupied index (inclusive).
    low: usize,

    /// The highest occupied index (inclusive).
    high: usize,

    /// The strand the 5' end is linked to.
    conn5: Option<StrandId>,

    /// The strand the 3' end is linked to.
    conn3: Option<StrandId>,

    /// Decorators keyed by absolute index.
    decorators: BTreeMap<usize, Decorator>,

    /// Assigned sequence text keyed by absolute index.
    sequence: BTreeMap<usize, String>,

    /// The oligo the strand belongs to.
    oligo: OligoId,
}

impl Strand {
    /// Creates an unlinked, undecorated strand.
    pub(crate) fn new(
        lane: LaneId,
        polarity: Polarity,
        low: usize,
        high: usize,
        oligo: OligoId,
    ) -> Self {
        debug_assert!(low <= high, "strand bounds must be ordered");

        Self {
            lane,
            polarity,
            low,
            high,
            conn5: None,
            conn3: None,
            decorators: BTreeMap::new(),
            sequence: BTreeMap::new(),
            oligo,
        }
    }

    /// Gets the lane.
    pub fn lane(&self) -> LaneId {
        self.lane
    }

    /// Gets the lane's 5'→3' polarity.
    pub fn polarity(&self) -> Polarity {
        self.polarity
    }

    /// Gets the lowest occupied index.
    pub fn low(&self) -> usize {
        self.low
    }

    /// Gets the highest occupied index.
    pub fn high(&self) -> usize {
        self.high
    }

    /// Gets the number of bases.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.high - self.low + 1
    }

    /// Returns whether `idx` is one of the strand's bases.
    pub fn contains(&self, idx: usize) -> bool {
        self.low <= idx && idx <= self.high
    }

    /// Gets the index of the given end.
    pub fn idx(&self, end: End) -> usize {
        match end {
            End::Five => self.idx5(),
            End::Three => self.idx3(),
        }
    }

    /// Gets the index of the 5' end.
    pub fn idx5(&self) -> usize {
        match self.polarity {
            Polarity::Positive => self.low,
            Polarity::Negative => self.high,
        }
    }

    /// Gets the index of the 3' end.
    pub fn idx3(&self) -> usize {
        match self.polarity {
            Polarity::Positive => self.high,
            Polarity::Negative => self.low,
        }
    }

    /// Gets the end sitting at the low index.
    pub fn low_end(&self) -> End {
        match self.polarity {
            Polarity::Positive => End::Five,
            Polarity::Negative => End::Three,
        }
    }

    /// Gets the end sitting at the high index.
    pub fn high_end(&self) -> End {
        self.low_end().opposite()
    }

    /// Gets the strand linked to the 5' end.
    pub fn conn5(&self) -> Option<StrandId> {
        self.conn5
    }

    /// Gets the strand linked to the 3' end.
    pub fn conn3(&self) -> Option<StrandId> {
        self.conn3
    }

    /// Gets the strand linked to the given end.
    pub fn link(&self, end: End) -> Option<StrandId> {
        match end {
            End::Five => self.conn5,
            End::Three => self.conn3,
        }
    }

    pub(crate) fn set_link(&mut self, end: End, peer: Option<StrandId>) {
        match end {
            End::Five => self.conn5 = peer,
            End::Three => self.conn3 = peer,
        }
    }

    /// Gets the decorators keyed by absolute index.
    pub fn decorators(&self) -> &BTreeMap<usize, Decorator> {
        &self.decorators
    }

    pub(crate) fn decorators_mut(&mut self) -> &mut BTreeMap<usize, Decorator> {
        &mut self.decorators
    }

    /// Gets the assigned sequence text keyed by absolute index.
    pub fn sequence(&self) -> &BTreeMap<usize, String> {
        &self.sequence
    }

    pub(crate) fn sequence_mut(&mut self) -> &mut BTreeMap<usize, String> {
        &mut self.sequence
    }

    /// Gets the oligo.
    pub fn oligo(&self) -> OligoId {
        self.oligo
    }

    pub(crate) fn set_oligo(&mut self, oligo: OligoId) {
        self.oligo = oligo;
    }

    /// Gets the bases in 5'→3' order.
    pub fn bases(&self) -> Vec<usize> {
        match self.polarity {
            Polarity::Positive => (self.low..=self.high).collect(),
            Polarity::Negative => (self.low..=self.high).rev().collect(),
        }
    }

    /// Moves the bounds, dropping per-base data that falls outside of them.
    pub(crate) fn set_bounds(&mut self, low: usize, high: usize) {
        debug_assert!(low <= high, "strand bounds must be ordered");

        self.low = low;
        self.high = high;
        self.decorators.retain(|idx, _| low <= *idx && *idx <= high);
        self.sequence.retain(|idx, _| low <= *idx && *idx <= high);
    }

    /// Splits off the per-base data at and above `idx`.
    pub(crate) fn split_data_off(
        &mut self,
        idx: usize,
    ) -> (BTreeMap<usize, Decorator>, BTreeMap<usize, String>) {
        (self.decorators.split_off(&idx), self.sequence.split_off(&idx))
    }

    /// Absorbs the per-base data of another strand.
    pub(crate) fn absorb_data(
        &mut self,
        decorators: BTreeMap<usize, Decorator>,
        sequence: BTreeMap<usize, String>,
    ) {
        self.decorators.extend(decorators);
        self.sequence.extend(sequence);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::design::AxisId;
    use crate::design::Side;

    fn strand(polarity: Polarity) -> Strand {
        let lane = LaneId::new(AxisId::new(0), Side::Staple);
        Strand::new(lane, polarity, 3, 7, OligoId::new(0))
    }

    #[test]
    fn test_ends_follow_polarity() {
        let forward = strand(Polarity::Positive);
        assert_eq!(forward.idx5(), 3);
        assert_eq!(forward.idx3(), 7);
        assert_eq!(forward.low_end(), End::Five);
        assert_eq!(forward.bases(), vec![3, 4, 5, 6, 7]);

        let reverse = strand(Polarity::Negative);
        assert_eq!(reverse.idx5(), 7);
        assert_eq!(reverse.idx3(), 3);
        assert_eq!(reverse.high_end(), End::Five);
        assert_eq!(reverse.bases(), vec![7, 6, 5, 4, 3]);
    }

    #[test]
    fn test_set_bounds_drops_outside_data() {
        let mut s = strand(Polarity::Positive);
        s.decorators_mut().insert(3, Decorator::Skip);
        s.decorators_mut().insert(6, Decorator::Insertion(2));
        s.sequence_mut().insert(3, String::from("A"));
        s.sequence_mut().insert(5, String::from("C"));

        s.set_bounds(4, 7);

        assert_eq!(s.len(), 4);
        assert_eq!(s.decorators().keys().copied().collect::<Vec<_>>(), vec![6]);
        assert_eq!(s.sequence().keys().copied().collect::<Vec<_>>(), vec![5]);
    }

    #[test]
    fn test_decorator_width() {
        assert_eq!(Decorator::Insertion(3).width(), 4);
        assert_eq!(Decorator::Skip.width(), 0);
    }
}
