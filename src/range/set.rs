//! A sorted set of non-overlapping intervals.

use std::ops::Range;

use crate::range::Interval;

////////////////////////////////////////////////////////////////////////////////////////
// Errors
////////////////////////////////////////////////////////////////////////////////////////

/// An inconsistency discovered by [`RangeSet::check()`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Inconsistency {
    /// The interval at the given index is empty.
    Empty(usize),

    /// The interval at the given index starts before its predecessor ends.
    Overlapping(usize),

    /// The interval at the given index should have been merged with its
    /// predecessor.
    Unmerged(usize),
}

impl std::fmt::Display for Inconsistency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Inconsistency::Empty(i) => write!(f, "interval #{i} is empty"),
            Inconsistency::Overlapping(i) => {
                write!(f, "interval #{i} overlaps or precedes its predecessor")
            }
            Inconsistency::Unmerged(i) => {
                write!(f, "interval #{i} is mergeable with its predecessor")
            }
        }
    }
}

impl std::error::Error for Inconsistency {}

////////////////////////////////////////////////////////////////////////////////////////
// Merge policies
////////////////////////////////////////////////////////////////////////////////////////

/// Decides whether two touching intervals carry values that may be fused.
pub trait MergePolicy<T> {
    /// Returns whether an interval carrying `left` may be merged with an
    /// adjacent interval carrying `right`.
    fn mergeable(&self, left: &T, right: &T) -> bool;
}

/// Merges touching intervals whose values compare equal.
#[derive(Clone, Copy, Debug, Default)]
pub struct Equal;

impl<T> MergePolicy<T> for Equal
where
    T: PartialEq,
{
    fn mergeable(&self, left: &T, right: &T) -> bool {
        left == right
    }
}

impl<T, F> MergePolicy<T> for F
where
    F: Fn(&T, &T) -> bool,
{
    fn mergeable(&self, left: &T, right: &T) -> bool {
        self(left, right)
    }
}

////////////////////////////////////////////////////////////////////////////////////////
// Splice reports
////////////////////////////////////////////////////////////////////////////////////////

/// The bounds of a set before and after a splice.
pub type BoundsChange = ((usize, usize), (usize, usize));

/// A report of everything a single insertion or removal did to the set.
///
/// Callers that attach resources to interval values (e.g., strand records)
/// use this to release or rewrite them.
#[derive(Debug)]
pub struct Splice<T> {
    /// Intervals deleted outright.
    removed: Vec<Interval<T>>,

    /// Intervals cut back to a remainder, as `(before, after)` pairs. An
    /// interval cut in two appears twice.
    truncated: Vec<(Interval<T>, Interval<T>)>,

    /// Intervals fused into a newly added interval.
    absorbed: Vec<Interval<T>>,

    /// The change in bounds, if any.
    bounds: Option<BoundsChange>,
}

impl<T> Default for Splice<T> {
    fn default() -> Self {
        Self {
            removed: Vec::new(),
            truncated: Vec::new(),
            absorbed: Vec::new(),
            bounds: None,
        }
    }
}

impl<T> Splice<T> {
    /// Gets the intervals deleted outright.
    pub fn removed(&self) -> &[Interval<T>] {
        &self.removed
    }

    /// Gets the truncated intervals as `(before, after)` pairs.
    pub fn truncated(&self) -> &[(Interval<T>, Interval<T>)] {
        &self.truncated
    }

    /// Gets the intervals fused into the added interval.
    pub fn absorbed(&self) -> &[Interval<T>] {
        &self.absorbed
    }

    /// Gets the change of bounds, if the splice moved them.
    pub fn bounds_changed(&self) -> Option<BoundsChange> {
        self.bounds
    }

    /// Returns whether the splice left every pre-existing interval alone.
    pub fn is_clean(&self) -> bool {
        self.removed.is_empty() && self.truncated.is_empty() && self.absorbed.is_empty()
    }
}

////////////////////////////////////////////////////////////////////////////////////////
// Range sets
////////////////////////////////////////////////////////////////////////////////////////

/// A sorted set of non-overlapping, half-open intervals.
///
/// No two adjacent intervals in the set are ever mergeable under the set's
/// [`MergePolicy`]; the insertion routine fuses them eagerly.
#[derive(Clone, Debug)]
pub struct RangeSet<T, P = Equal> {
    /// The intervals, sorted by start position.
    ranges: Vec<Interval<T>>,

    /// The policy deciding whether touching intervals merge.
    policy: P,
}

impl<T, P> Default for RangeSet<T, P>
where
    P: Default,
{
    fn default() -> Self {
        Self {
            ranges: Vec::new(),
            policy: P::default(),
        }
    }
}

impl<T, P> PartialEq for RangeSet<T, P>
where
    T: PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.ranges == other.ranges
    }
}

impl<T, P> Eq for RangeSet<T, P> where T: Eq {}

impl<T, P> RangeSet<T, P>
where
    T: Clone,
    P: MergePolicy<T>,
{
    /// Creates an empty set governed by `policy`.
    ///
    /// # Examples
    ///
    /// ```
    /// use strandgraph::range::RangeSet;
    ///
    /// // Never merge touching intervals.
    /// let set = RangeSet::<u8, _>::with_policy(|_: &u8, _: &u8| false);
    /// assert!(set.is_empty());
    /// ```
    pub fn with_policy(policy: P) -> Self {
        Self {
            ranges: Vec::new(),
            policy,
        }
    }

    /// Gets the number of intervals in the set.
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    /// Returns whether the set has no intervals.
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Iterates over the intervals in ascending order.
    pub fn iter(&self) -> std::slice::Iter<'_, Interval<T>> {
        self.ranges.iter()
    }

    /// Gets `(first.start, last.end)`, or `(0, 0)` for an empty set.
    pub fn bounds(&self) -> (usize, usize) {
        match (self.ranges.first(), self.ranges.last()) {
            (Some(first), Some(last)) => (first.start(), last.end()),
            _ => (0, 0),
        }
    }

    /// Binary searches for the interval containing `idx`.
    ///
    /// On a hit, returns `Ok` with the index of the interval. On a miss,
    /// returns `Err` with the insertion point: the index of the first interval
    /// whose start is greater than `idx`.
    pub fn search(&self, idx: usize) -> Result<usize, usize> {
        let i = self.ranges.partition_point(|r| r.start() <= idx);

        match i.checked_sub(1) {
            Some(prev) if self.ranges[prev].contains(idx) => Ok(prev),
            _ => Err(i),
        }
    }

    /// Gets the interval covering `idx`, if any.
    ///
    /// # Examples
    ///
    /// ```
    /// use strandgraph::range::RangeSet;
    ///
    /// let mut set = RangeSet::<char>::default();
    /// set.add_range(2, 5, 'a');
    ///
    /// assert_eq!(set.get(3).map(|i| *i.value()), Some('a'));
    /// assert!(set.get(5).is_none());
    /// ```
    pub fn get(&self, idx: usize) -> Option<&Interval<T>> {
        self.search(idx).ok().map(|i| &self.ranges[i])
    }

    /// Gets the indices of every interval intersecting `[start, end)`.
    fn intersecting(&self, start: usize, end: usize) -> Range<usize> {
        let first = self.ranges.partition_point(|r| r.end() <= start);
        let last = self.ranges.partition_point(|r| r.start() < end);
        first..last.max(first)
    }

    /// Gets the intervals intersecting `[start, end)` in ascending order.
    pub fn overlapping(&self, start: usize, end: usize) -> &[Interval<T>] {
        if start >= end {
            return &[];
        }

        &self.ranges[self.intersecting(start, end)]
    }

    /// Returns whether any position in `[start, end)` is covered.
    pub fn contains_any_in_range(&self, start: usize, end: usize) -> bool {
        !self.overlapping(start, end).is_empty()
    }

    /// Returns whether every position in `[start, end)` is covered.
    ///
    /// # Examples
    ///
    /// ```
    /// use strandgraph::range::RangeSet;
    ///
    /// let mut set = RangeSet::<char>::default();
    /// set.add_range(0, 3, 'a');
    /// set.add_range(3, 6, 'b');
    /// set.add_range(7, 9, 'c');
    ///
    /// assert!(set.contains_all_in_range(1, 6));
    /// assert!(!set.contains_all_in_range(1, 8));
    /// assert!(set.contains_any_in_range(5, 8));
    /// ```
    pub fn contains_all_in_range(&self, start: usize, end: usize) -> bool {
        let hits = self.overlapping(start, end);

        let (Some(first), Some(last)) = (hits.first(), hits.last()) else {
            return false;
        };

        first.start() <= start
            && last.end() >= end
            && hits.windows(2).all(|pair| pair[0].abuts(&pair[1]))
    }

    /// Inserts the value over `[start, end)`.
    ///
    /// Every existing interval within one position of the new one is either
    /// fused into it (when the policy allows), cut back to the part lying
    /// outside of it, or deleted when it lies entirely inside. A request with
    /// `start >= end` does nothing.
    ///
    /// # Examples
    ///
    /// ```
    /// use strandgraph::range::RangeSet;
    ///
    /// let mut set = RangeSet::<char>::default();
    /// set.add_range(0, 4, 'a');
    /// set.add_range(6, 10, 'b');
    ///
    /// // Overwrites the tail of `a` and fuses with `b`.
    /// let splice = set.add_range(2, 6, 'b');
    /// assert_eq!(splice.truncated().len(), 1);
    /// assert_eq!(splice.absorbed().len(), 1);
    ///
    /// let spans = set.iter().map(|i| (i.start(), i.end())).collect::<Vec<_>>();
    /// assert_eq!(spans, vec![(0, 2), (2, 10)]);
    /// ```
    pub fn add_range(&mut self, start: usize, end: usize, value: T) -> Splice<T> {
        let mut splice = Splice::default();

        if start >= end {
            return splice;
        }

        let before = self.bounds();
        let span = self.intersecting(start.saturating_sub(1), end.saturating_add(1));
        let at = span.start;

        let mut new = Interval::try_new(start, end, value)
            .unwrap_or_else(|_| unreachable!("bounds were checked above"));
        let mut left = None;
        let mut right = None;

        for item in self.ranges.drain(span).collect::<Vec<_>>() {
            let outside_left = item.start() < start;
            let outside_right = item.end() > end;

            if !outside_left && !outside_right {
                splice.removed.push(item);
                continue;
            }

            if self.policy.mergeable(item.value(), new.value()) {
                let (lo, hi) = (new.start().min(item.start()), new.end().max(item.end()));
                new = new.with_bounds(lo, hi);
                splice.absorbed.push(item);
                continue;
            }

            if outside_left {
                let piece = item.with_bounds(item.start(), item.end().min(start));
                if piece.end() != item.end() {
                    splice.truncated.push((item.clone(), piece.clone()));
                }
                left = Some(piece);
            }

            if outside_right {
                let piece = item.with_bounds(item.start().max(end), item.end());
                if piece.start() != item.start() {
                    splice.truncated.push((item.clone(), piece.clone()));
                }
                right = Some(piece);
            }
        }

        let replacement = left.into_iter().chain(Some(new)).chain(right);
        self.ranges.splice(at..at, replacement);

        let after = self.bounds();
        if before != after {
            splice.bounds = Some((before, after));
        }

        debug_assert!(self.check().is_ok(), "range set corrupted by insertion");
        splice
    }

    /// Removes every covered position in `[start, end)`.
    ///
    /// Intervals straddling a boundary are cut back to the part lying outside
    /// of the range; an interval straddling both boundaries becomes two
    /// intervals carrying the same value. A request with `start >= end` does
    /// nothing.
    ///
    /// # Examples
    ///
    /// ```
    /// use strandgraph::range::RangeSet;
    ///
    /// let mut set = RangeSet::<char>::default();
    /// set.add_range(0, 10, 'a');
    ///
    /// let splice = set.remove_range(4, 6);
    /// assert_eq!(splice.truncated().len(), 2);
    ///
    /// let spans = set.iter().map(|i| (i.start(), i.end())).collect::<Vec<_>>();
    /// assert_eq!(spans, vec![(0, 4), (6, 10)]);
    /// ```
    pub fn remove_range(&mut self, start: usize, end: usize) -> Splice<T> {
        let mut splice = Splice::default();

        if start >= end {
            return splice;
        }

        let before = self.bounds();
        let span = self.intersecting(start, end);
        let at = span.start;
        let mut replacement = Vec::with_capacity(2);

        for item in self.ranges.drain(span).collect::<Vec<_>>() {
            let mut kept = false;

            if item.start() < start {
                let piece = item.with_bounds(item.start(), start);
                splice.truncated.push((item.clone(), piece.clone()));
                replacement.push(piece);
                kept = true;
            }

            if item.end() > end {
                let piece = item.with_bounds(end, item.end());
                splice.truncated.push((item.clone(), piece.clone()));
                replacement.push(piece);
                kept = true;
            }

            if !kept {
                splice.removed.push(item);
            }
        }

        self.ranges.splice(at..at, replacement);

        let after = self.bounds();
        if before != after {
            splice.bounds = Some((before, after));
        }

        debug_assert!(self.check().is_ok(), "range set corrupted by removal");
        splice
    }

    /// Replaces the value of the interval covering `idx`, returning the old
    /// value.
    ///
    /// The caller is responsible for not creating mergeable neighbors.
    pub fn retag(&mut self, idx: usize, value: T) -> Option<T> {
        let i = self.search(idx).ok()?;
        let old = self.ranges[i].replace_value(value);
        debug_assert!(self.check().is_ok(), "retag created mergeable neighbors");
        Some(old)
    }

    /// Verifies the structural invariants of the set.
    ///
    /// Every interval must be non-empty, the intervals must be strictly
    /// increasing and non-overlapping, and no two touching intervals may be
    /// mergeable.
    pub fn check(&self) -> Result<(), Inconsistency> {
        for (i, interval) in self.ranges.iter().enumerate() {
            if interval.start() >= interval.end() {
                return Err(Inconsistency::Empty(i));
            }

            if i == 0 {
                continue;
            }

            let prev = &self.ranges[i - 1];

            if prev.end() > interval.start() {
                return Err(Inconsistency::Overlapping(i));
            }

            if prev.abuts(interval) && self.policy.mergeable(prev.value(), interval.value()) {
                return Err(Inconsistency::Unmerged(i));
            }
        }

        Ok(())
    }
}

impl<'a, T, P> IntoIterator for &'a RangeSet<T, P> {
    type Item = &'a Interval<T>;
    type IntoIter = std::slice::Iter<'a, Interval<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.ranges.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spans<P: MergePolicy<char>>(set: &RangeSet<char, P>) -> Vec<(usize, usize, char)> {
        set.iter()
            .map(|i| (i.start(), i.end(), *i.value()))
            .collect()
    }

    #[test]
    fn test_search_hit_and_insertion_point() {
        let mut set = RangeSet::<char>::default();
        set.add_range(2, 4, 'a');
        set.add_range(6, 8, 'b');

        assert_eq!(set.search(2), Ok(0));
        assert_eq!(set.search(7), Ok(1));
        assert_eq!(set.search(0), Err(0));
        assert_eq!(set.search(4), Err(1));
        assert_eq!(set.search(5), Err(1));
        assert_eq!(set.search(9), Err(2));
    }

    #[test]
    fn test_add_into_empty_space() {
        let mut set = RangeSet::<char>::default();
        let splice = set.add_range(3, 5, 'a');

        assert!(splice.is_clean());
        assert_eq!(splice.bounds_changed(), Some(((0, 0), (3, 5))));
        assert_eq!(spans(&set), vec![(3, 5, 'a')]);
    }

    #[test]
    fn test_add_merges_adjacent_equal_values() {
        let mut set = RangeSet::<char>::default();
        set.add_range(0, 3, 'a');
        set.add_range(5, 8, 'a');

        let splice = set.add_range(3, 5, 'a');
        assert_eq!(splice.absorbed().len(), 2);
        assert_eq!(spans(&set), vec![(0, 8, 'a')]);
        assert!(set.check().is_ok());
    }

    #[test]
    fn test_add_keeps_adjacent_unequal_values() {
        let mut set = RangeSet::<char>::default();
        set.add_range(0, 3, 'a');

        let splice = set.add_range(3, 5, 'b');
        assert!(splice.is_clean());
        assert_eq!(spans(&set), vec![(0, 3, 'a'), (3, 5, 'b')]);
    }

    #[test]
    fn test_add_inside_splits_unequal_value() {
        let mut set = RangeSet::<char>::default();
        set.add_range(0, 10, 'a');

        let splice = set.add_range(4, 6, 'b');
        assert_eq!(splice.truncated().len(), 2);
        assert_eq!(spans(&set), vec![(0, 4, 'a'), (4, 6, 'b'), (6, 10, 'a')]);
    }

    #[test]
    fn test_add_inside_equal_value_is_absorbed() {
        let mut set = RangeSet::<char>::default();
        set.add_range(0, 10, 'a');

        let splice = set.add_range(4, 6, 'a');
        assert_eq!(splice.absorbed().len(), 1);
        assert_eq!(splice.bounds_changed(), None);
        assert_eq!(spans(&set), vec![(0, 10, 'a')]);
    }

    #[test]
    fn test_add_deletes_contained_intervals() {
        let mut set = RangeSet::<char>::default();
        set.add_range(2, 3, 'a');
        set.add_range(4, 5, 'b');
        set.add_range(6, 7, 'c');

        let splice = set.add_range(1, 8, 'z');
        assert_eq!(splice.removed().len(), 3);
        assert_eq!(spans(&set), vec![(1, 8, 'z')]);
    }

    #[test]
    fn test_remove_truncates_and_deletes() {
        let mut set = RangeSet::<char>::default();
        set.add_range(0, 3, 'a');
        set.add_range(4, 6, 'b');
        set.add_range(7, 10, 'c');

        let splice = set.remove_range(2, 8);
        assert_eq!(splice.removed().len(), 1);
        assert_eq!(splice.truncated().len(), 2);
        assert_eq!(splice.bounds_changed(), None);
        assert_eq!(spans(&set), vec![(0, 2, 'a'), (8, 10, 'c')]);
    }

    #[test]
    fn test_empty_requests_are_noops() {
        let mut set = RangeSet::<char>::default();
        set.add_range(0, 3, 'a');

        assert!(set.add_range(5, 5, 'b').is_clean());
        assert!(set.add_range(6, 5, 'b').is_clean());
        assert!(set.remove_range(2, 2).is_clean());
        assert_eq!(spans(&set), vec![(0, 3, 'a')]);
    }

    #[test]
    fn test_add_then_remove_is_inverse_without_merges() {
        let mut set = RangeSet::<char>::default();
        set.add_range(0, 3, 'a');
        set.add_range(8, 10, 'c');
        let before = set.clone();

        let splice = set.add_range(4, 7, 'b');
        assert!(splice.is_clean());

        set.remove_range(4, 7);
        assert_eq!(set, before);
    }

    #[test]
    fn test_custom_policy() {
        let mut set = RangeSet::with_policy(|a: &char, b: &char| {
            a.eq_ignore_ascii_case(b)
        });
        set.add_range(0, 2, 'a');
        set.add_range(2, 4, 'A');

        assert_eq!(set.len(), 1);
        assert_eq!(set.bounds(), (0, 4));
    }

    #[test]
    fn test_retag() {
        let mut set = RangeSet::<char>::default();
        set.add_range(0, 2, 'a');
        set.add_range(3, 5, 'a');

        assert_eq!(set.retag(4, 'b'), Some('a'));
        assert_eq!(set.retag(2, 'b'), None);
        assert_eq!(spans(&set), vec![(0, 2, 'a'), (3, 5, 'b')]);
    }

    #[test]
    fn test_invariant_holds_under_mixed_operations() {
        let mut set = RangeSet::<char>::default();
        let ops: &[(bool, usize, usize, char)] = &[
            (true, 0, 5, 'a'),
            (true, 3, 9, 'b'),
            (false, 4, 6, ' '),
            (true, 5, 6, 'b'),
            (true, 2, 4, 'a'),
            (false, 0, 1, ' '),
            (true, 10, 12, 'b'),
            (true, 9, 10, 'b'),
            (false, 8, 11, ' '),
        ];

        for &(add, start, end, value) in ops {
            if add {
                set.add_range(start, end, value);
            } else {
                set.remove_range(start, end);
            }

            assert_eq!(set.check(), Ok(()));
        }

        assert_eq!(
            spans(&set),
            vec![(1, 4, 'a'), (5, 8, 'b'), (11, 12, 'b')]
        );
    }

    #[test]
    fn test_remove_keeps_set_consistent_at_extremes() {
        let mut set = RangeSet::<char>::default();
        set.add_range(0, 4, 'a');
        set.add_range(4, 8, 'b');
        set.add_range(8, 12, 'a');

        let splice = set.remove_range(3, 9);
        assert_eq!(splice.truncated().len(), 2);
        assert_eq!(splice.removed().len(), 1);
        assert_eq!(set.check(), Ok(()));
        assert_eq!(spans(&set), vec![(0, 3, 'a'), (9, 12, 'a')]);

        set.remove_range(10, usize::MAX);
        assert_eq!(set.check(), Ok(()));
        assert_eq!(spans(&set), vec![(0, 3, 'a'), (9, 10, 'a')]);

        set.add_range(20, usize::MAX, 'c');
        assert_eq!(set.check(), Ok(()));

        set.remove_range(0, usize::MAX);
        assert_eq!(set.check(), Ok(()));
        assert!(set.is_empty());
    }
}
