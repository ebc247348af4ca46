//! Strand editing along a single lane.
//!
//! Every operation here keeps the lane's interval set and the strand records
//! in agreement. Links only survive at ends that stay where they were: an end
//! that moves or becomes interior loses its link.

use std::collections::BTreeMap;

use omics::coordinate::Strand as Polarity;

use crate::design::Design;
use crate::design::End;
use crate::design::HalfIdx;
use crate::design::LaneId;
use crate::design::Rejected;
use crate::design::Result;
use crate::design::Strand;
use crate::design::StrandId;

/// The drawable geometry of one lane.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Segments {
    /// Center-to-center spans, one per strand, in ascending order.
    segments: Vec<(HalfIdx, HalfIdx)>,

    /// The indices of every 5' end.
    ends5: Vec<usize>,

    /// The indices of every 3' end.
    ends3: Vec<usize>,
}

impl Segments {
    /// Gets the center-to-center spans.
    pub fn segments(&self) -> &[(HalfIdx, HalfIdx)] {
        &self.segments
    }

    /// Gets the indices of every 5' end.
    pub fn ends5(&self) -> &[usize] {
        &self.ends5
    }

    /// Gets the indices of every 3' end.
    pub fn ends3(&self) -> &[usize] {
        &self.ends3
    }
}

impl Design {
    //////////////////////////////////////////////////////////////////////////////////
    // Queries
    //////////////////////////////////////////////////////////////////////////////////

    /// Gets the strand covering `idx` on a lane.
    pub fn strand_at(&self, lane: LaneId, idx: usize) -> Option<StrandId> {
        self.lane_set(lane)
            .ok()?
            .get(idx)
            .map(|interval| *interval.value())
    }

    /// Returns whether a base is occupied.
    pub fn has_base_at(&self, lane: LaneId, idx: usize) -> bool {
        self.strand_at(lane, idx).is_some()
    }

    /// Gets the inclusive `(low, high)` bounds of every strand on a lane in
    /// ascending order.
    pub fn bounds(&self, lane: LaneId) -> Vec<(usize, usize)> {
        self.lane_set(lane)
            .map(|set| set.iter().map(|i| (i.start(), i.end() - 1)).collect())
            .unwrap_or_default()
    }

    /// Gets the `(5', 3')` end indices of every strand on a lane in ascending
    /// order.
    pub fn endpoints(&self, lane: LaneId) -> Vec<(usize, usize)> {
        self.lane_strands(lane)
            .map(|s| (s.idx5(), s.idx3()))
            .collect()
    }

    /// Gets the drawable geometry of a lane.
    pub fn segments_and_endpoints(&self, lane: LaneId) -> Segments {
        let mut result = Segments::default();

        for strand in self.lane_strands(lane) {
            result
                .segments
                .push((HalfIdx::center(strand.low()), HalfIdx::center(strand.high())));
            result.ends5.push(strand.idx5());
            result.ends3.push(strand.idx3());
        }

        result.ends5.sort_unstable();
        result.ends3.sort_unstable();
        result
    }

    /// Iterates over the strands of a lane in ascending order.
    fn lane_strands(&self, lane: LaneId) -> impl Iterator<Item = &Strand> {
        self.lane_set(lane)
            .ok()
            .into_iter()
            .flat_map(|set| set.iter())
            .filter_map(|interval| self.strand(*interval.value()))
    }

    /// Gets the inclusive range a strand may be resized within: up to, but
    /// not including, its lane neighbors or the ends of the axis.
    pub fn resize_bounds(&self, id: StrandId) -> Result<(usize, usize)> {
        let strand = self.require(id)?;
        let lane = strand.lane();
        let length = self
            .axis(lane.axis())
            .ok_or(Rejected::NoSuchAxis(lane.axis()))?
            .length();
        let set = self.lane_set(lane)?;

        let min = set
            .overlapping(0, strand.low())
            .last()
            .map(|below| below.end())
            .unwrap_or(0);

        let max = set
            .overlapping(strand.high() + 1, length)
            .first()
            .map(|above| above.start() - 1)
            .unwrap_or(length - 1);

        Ok((min, max))
    }

    //////////////////////////////////////////////////////////////////////////////////
    // Edits
    //////////////////////////////////////////////////////////////////////////////////

    /// Occupies the inclusive range `[low, high]` (clamped to the axis).
    ///
    /// Strands overlapping or abutting the range are fused into a single
    /// strand. The lowest of them survives and keeps its handle along with
    /// every decorator and sequence of the others; only the outermost links
    /// are kept.
    ///
    /// # Examples
    ///
    /// ```
    /// use strandgraph::Design;
    /// use strandgraph::design::Side;
    ///
    /// let mut design = Design::default();
    /// let lane = design.add_axis(0, 0)?.lane(Side::Scaffold);
    ///
    /// let a = design.connect(lane, 2, 4)?;
    /// design.connect(lane, 8, 10)?;
    /// assert_eq!(design.connect(lane, 5, 7)?, a);
    /// assert_eq!(design.bounds(lane), vec![(2, 10)]);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn connect(&mut self, lane: LaneId, low: usize, high: usize) -> Result<StrandId> {
        let axis = self
            .axis(lane.axis())
            .ok_or(Rejected::NoSuchAxis(lane.axis()))?;
        let polarity = axis.polarity(lane.side());
        let (low, high) = (axis.clamp(low.min(high)), axis.clamp(low.max(high)));

        let hits = self
            .lane_set(lane)?
            .overlapping(low.saturating_sub(1), high + 2)
            .iter()
            .map(|interval| *interval.value())
            .collect::<Vec<_>>();

        self.transact("connect", |design| {
            let Some((&survivor, rest)) = hits.split_first() else {
                return Ok(design.place(lane, polarity, low, high));
            };

            let first = design.require(survivor)?.clone();
            let last_id = rest.last().copied().unwrap_or(survivor);
            let last_high = design.require(last_id)?.high();
            let (new_low, new_high) = (low.min(first.low()), high.max(last_high));

            if new_low != first.low() {
                design.detach(survivor, first.low_end());
            }

            if last_id != survivor || new_high != first.high() {
                design.detach(survivor, first.high_end());
            }

            for &id in rest {
                let strand = design.require(id)?.clone();
                design.detach(id, strand.low_end());

                if id == last_id && new_high == strand.high() {
                    design.relink(id, survivor, strand.high_end());
                } else {
                    design.detach(id, strand.high_end());
                }

                if let Some(mut absorbed) = design.remove_strand(id) {
                    let (decorators, sequence) = absorbed.split_data_off(0);

                    if let Some(s) = design.strand_mut(survivor) {
                        s.absorb_data(decorators, sequence);
                    }
                }
            }

            if let Some(s) = design.touch(survivor) {
                s.set_bounds(new_low, new_high);
            }

            if let Some(axis) = design.axis_mut(lane.axis()) {
                axis.lane_mut(lane.side())
                    .add_range(new_low, new_high + 1, survivor);
            }

            Ok(survivor)
        })
    }

    /// Lays a strand with an oligo of its own on a free span of a lane.
    pub(crate) fn place(
        &mut self,
        lane: LaneId,
        polarity: Polarity,
        low: usize,
        high: usize,
    ) -> StrandId {
        let oligo = self.fresh_oligo(lane.side());
        let id = self.insert_strand(Strand::new(lane, polarity, low, high, oligo));

        if let Some(axis) = self.axis_mut(lane.axis()) {
            axis.lane_mut(lane.side()).add_range(low, high + 1, id);
        }

        id
    }

    /// Erases the bases between two half-base positions.
    ///
    /// The erased span runs from `lo` to one base past `hi`. A base is erased
    /// when its center falls inside the span, and the backbone between two
    /// bases is cut when the whole index separating them does. Strands
    /// straddling the span are cut back to the bases outside of it, and a
    /// strand straddling both sides becomes two strands.
    ///
    /// # Examples
    ///
    /// ```
    /// use strandgraph::Design;
    /// use strandgraph::design::HalfIdx;
    /// use strandgraph::design::Side;
    ///
    /// let mut design = Design::default();
    /// let lane = design.add_axis(0, 0)?.lane(Side::Staple);
    ///
    /// design.connect(lane, 2, 6)?;
    /// design.clear(lane, "3.5".parse()?, "4.5".parse()?)?;
    /// assert_eq!(design.bounds(lane), vec![(2, 2), (5, 6)]);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn clear(&mut self, lane: LaneId, lo: HalfIdx, hi: HalfIdx) -> Result<()> {
        let length = self
            .axis(lane.axis())
            .ok_or(Rejected::NoSuchAxis(lane.axis()))?
            .length();

        if lo > hi {
            return Err(Rejected::EmptyRange);
        }

        // Work in half bases over the span [lo, hi + 1), clamped to one base
        // past the end of the axis.
        let limit = length.saturating_add(1).saturating_mul(2);
        let start = lo.halves().min(limit);
        let end = hi.halves().saturating_add(2).min(limit);
        let first = start / 2;
        let last = (end / 2).min(length);

        self.transact("clear", |design| {
            design.erase(lane, first, last, start % 2 == 0, end % 2 == 1);
            Ok(())
        })
    }

    /// Erases the bases in `[first, end)`.
    ///
    /// With `sever_low`, a strand ending right below `first` loses the link at
    /// that end; with `sever_high`, so does a strand starting exactly at `end`.
    pub(crate) fn erase(
        &mut self,
        lane: LaneId,
        first: usize,
        end: usize,
        sever_low: bool,
        sever_high: bool,
    ) {
        let below = match sever_low {
            true => first
                .checked_sub(1)
                .and_then(|idx| self.end_at(lane, idx, true)),
            false => None,
        };

        let above = match sever_high {
            true => self.end_at(lane, end, false),
            false => None,
        };

        for (id, at) in below.into_iter().chain(above) {
            self.detach(id, at);
        }

        if first >= end {
            return;
        }

        let Some(axis) = self.axis_mut(lane.axis()) else {
            return;
        };

        let splice = axis.lane_mut(lane.side()).remove_range(first, end);
        let removed = splice
            .removed()
            .iter()
            .map(|interval| *interval.value())
            .collect::<Vec<_>>();

        let mut pieces = BTreeMap::<StrandId, Vec<(usize, usize)>>::new();
        for (_, after) in splice.truncated() {
            pieces
                .entry(*after.value())
                .or_default()
                .push((after.start(), after.end() - 1));
        }

        for id in removed {
            self.detach(id, End::Five);
            self.detach(id, End::Three);
            self.remove_strand(id);
        }

        for (id, pieces) in pieces {
            let Some(strand) = self.strand(id).cloned() else {
                continue;
            };

            match pieces.as_slice() {
                [(low, high)] => {
                    if *low != strand.low() {
                        self.detach(id, strand.low_end());
                    }

                    if *high != strand.high() {
                        self.detach(id, strand.high_end());
                    }

                    if let Some(s) = self.touch(id) {
                        s.set_bounds(*low, *high);
                    }
                }
                [(low, high), (upper_low, upper_high)] => {
                    let upper = self.insert_strand(Strand::new(
                        lane,
                        strand.polarity(),
                        *upper_low,
                        *upper_high,
                        strand.oligo(),
                    ));
                    self.relink(id, upper, strand.high_end());
                    self.hand_over(id, upper, *upper_low);

                    if let Some(s) = self.touch(id) {
                        s.set_bounds(*low, *high);
                    }

                    if let Some(axis) = self.axis_mut(lane.axis()) {
                        axis.lane_mut(lane.side()).retag(*upper_low, upper);
                    }
                }
                _ => unreachable!("an erased range cuts a strand into at most two pieces"),
            }
        }
    }

    /// Finds the strand whose high (or low) end sits exactly at `idx`.
    fn end_at(&self, lane: LaneId, idx: usize, high: bool) -> Option<(StrandId, End)> {
        let id = self.strand_at(lane, idx)?;
        let strand = self.strand(id)?;

        match high {
            true => (strand.high() == idx).then(|| (id, strand.high_end())),
            false => (strand.low() == idx).then(|| (id, strand.low_end())),
        }
    }

    /// Moves the per-base data of `from` at and above `idx` onto `to`.
    fn hand_over(&mut self, from: StrandId, to: StrandId, idx: usize) {
        let Some((decorators, sequence)) = self.strand_mut(from).map(|s| s.split_data_off(idx))
        else {
            return;
        };

        if let Some(s) = self.strand_mut(to) {
            s.absorb_data(decorators, sequence);
        }
    }

    /// Cuts the strand covering `idx` into `[low, idx]` and `[idx + 1, high]`.
    ///
    /// The lower piece keeps the original handle; the handle of the upper
    /// piece is returned.
    pub fn split(&mut self, lane: LaneId, idx: usize) -> Result<StrandId> {
        let id = self.require_at(lane, idx)?;
        let strand = self.require(id)?.clone();

        if idx >= strand.high() {
            return Err(Rejected::SplitOutOfRange(id, idx));
        }

        self.transact("split", |design| {
            let upper = design.insert_strand(Strand::new(
                lane,
                strand.polarity(),
                idx + 1,
                strand.high(),
                strand.oligo(),
            ));
            design.relink(id, upper, strand.high_end());
            design.hand_over(id, upper, idx + 1);

            if let Some(s) = design.touch(id) {
                s.set_bounds(strand.low(), idx);
            }

            if let Some(axis) = design.axis_mut(lane.axis()) {
                axis.lane_mut(lane.side())
                    .add_range(idx + 1, strand.high() + 1, upper);
            }

            Ok(upper)
        })
    }

    /// Fuses a strand with the lane neighbor abutting one of its ends,
    /// preferring the neighbor past its 3' end.
    ///
    /// The lower of the two strands survives and its handle is returned.
    pub fn merge(&mut self, id: StrandId) -> Result<StrandId> {
        let strand = self.require(id)?;
        let lane = strand.lane();

        let above = self
            .strand_at(lane, strand.high() + 1)
            .map(|up| (id, up));
        let below = strand
            .low()
            .checked_sub(1)
            .and_then(|idx| self.strand_at(lane, idx))
            .map(|down| (down, id));

        let candidates = match strand.high_end() {
            End::Three => [above, below],
            End::Five => [below, above],
        };

        let (lower, upper) = candidates
            .into_iter()
            .flatten()
            .next()
            .ok_or(Rejected::NothingAdjacent(id))?;

        self.transact("merge", |design| {
            let bottom = design.require(lower)?.clone();
            let top = design.require(upper)?.clone();

            design.detach(lower, bottom.high_end());
            design.detach(upper, top.low_end());
            design.relink(upper, lower, top.high_end());
            design.hand_over(upper, lower, 0);
            design.remove_strand(upper);

            if let Some(s) = design.touch(lower) {
                s.set_bounds(bottom.low(), top.high());
            }

            if let Some(axis) = design.axis_mut(lane.axis()) {
                axis.lane_mut(lane.side())
                    .add_range(bottom.low(), top.high() + 1, lower);
            }

            Ok(lower)
        })
    }

    /// Moves a strand's bounds to `[low, high]`, clamped to
    /// [`Self::resize_bounds()`].
    pub fn resize(&mut self, id: StrandId, low: usize, high: usize) -> Result<()> {
        let (min, max) = self.resize_bounds(id)?;
        let strand = self.require(id)?;

        let (low, high) = (low.min(high).clamp(min, max), low.max(high).clamp(min, max));

        if (low, high) == (strand.low(), strand.high()) {
            return Ok(());
        }

        self.transact("resize", |design| {
            design.reshape(id, low, high);
            Ok(())
        })
    }

    /// Moves a strand's bounds, trusting that the new range is free.
    pub(crate) fn reshape(&mut self, id: StrandId, low: usize, high: usize) {
        let Some(strand) = self.strand(id).cloned() else {
            return;
        };

        if low != strand.low() {
            self.detach(id, strand.low_end());
        }

        if high != strand.high() {
            self.detach(id, strand.high_end());
        }

        if let Some(s) = self.touch(id) {
            s.set_bounds(low, high);
        }

        let lane = strand.lane();
        if let Some(axis) = self.axis_mut(lane.axis()) {
            let set = axis.lane_mut(lane.side());
            set.remove_range(strand.low(), strand.high() + 1);
            set.add_range(low, high + 1, id);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::design::AxisId;
    use crate::design::Side;

    use super::*;

    fn lane(design: &mut Design) -> std::result::Result<LaneId, Rejected> {
        Ok(design.add_axis_with_length(0, 0, 40)?.lane(Side::Staple))
    }

    fn cross(design: &mut Design) -> std::result::Result<(LaneId, LaneId), Rejected> {
        let a = design.add_axis_with_length(0, 0, 40)?;
        let b = design.add_axis_with_length(0, 1, 40)?;
        Ok((a.lane(Side::Staple), b.lane(Side::Staple)))
    }

    #[test]
    fn test_connect_clamps_and_orders() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let mut design = Design::default();
        let lane = lane(&mut design)?;

        design.connect(lane, 50, 35)?;
        assert_eq!(design.bounds(lane), vec![(35, 39)]);

        assert_eq!(
            design.connect(LaneId::new(AxisId::new(9), Side::Staple), 0, 1),
            Err(Rejected::NoSuchAxis(AxisId::new(9)))
        );

        Ok(())
    }

    #[test]
    fn test_connect_absorbs_neighbors() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let mut design = Design::default();
        let lane = lane(&mut design)?;

        let a = design.connect(lane, 2, 4)?;
        let b = design.connect(lane, 6, 8)?;
        design.decorate(lane, 7, crate::design::Decorator::Skip)?;

        assert_eq!(design.connect(lane, 5, 5)?, a);
        assert_eq!(design.bounds(lane), vec![(2, 8)]);
        assert!(design.strand(b).is_none());
        assert_eq!(
            design.strand(a).map(|s| s.decorators().len()),
            Some(1)
        );
        assert_eq!(design.oligos().count(), 1);
        assert!(design.check().is_ok());

        Ok(())
    }

    #[test]
    fn test_clear_whole_index() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let mut design = Design::default();
        let lane = lane(&mut design)?;

        design.connect(lane, 2, 6)?;
        design.clear(lane, HalfIdx::whole(4), HalfIdx::whole(4))?;
        assert_eq!(design.bounds(lane), vec![(2, 3), (5, 6)]);
        assert_eq!(design.oligos().count(), 2);
        assert!(design.check().is_ok());

        Ok(())
    }

    #[test]
    fn test_clear_half_index() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let mut design = Design::default();
        let lane = lane(&mut design)?;

        design.connect(lane, 2, 6)?;
        design.clear(lane, HalfIdx::center(3), HalfIdx::center(4))?;
        assert_eq!(design.bounds(lane), vec![(2, 2), (5, 6)]);

        assert_eq!(
            design.clear(lane, HalfIdx::whole(5), HalfIdx::whole(4)),
            Err(Rejected::EmptyRange)
        );

        Ok(())
    }

    #[test]
    fn test_clear_severs_links_at_cut_edges() -> std::result::Result<(), Box<dyn std::error::Error>>
    {
        let mut design = Design::default();
        let (a, b) = cross(&mut design)?;

        // The staple on (0, 0) runs 3'-ward toward low indices.
        let left = design.connect(a, 10, 20)?;
        let right = design.connect(b, 10, 20)?;
        design.install_crossover(a, 10, b, 10)?;
        assert_eq!(design.strand(left).and_then(|s| s.conn3()), Some(right));

        // Cutting the strand above its 3' end leaves the crossover alone.
        design.clear(a, HalfIdx::whole(11), HalfIdx::whole(12))?;
        assert_eq!(design.bounds(a), vec![(10, 10), (13, 20)]);
        assert_eq!(design.strand(right).and_then(|s| s.conn5()), Some(left));
        assert!(design.check().is_ok());

        // The span [9.5, 10.5) cuts the backbone at 10 and keeps base 10.
        design.undo()?;
        design.clear(a, HalfIdx::center(9), HalfIdx::center(9))?;
        assert_eq!(design.bounds(a), vec![(10, 20)]);
        assert!(design.strand(left).and_then(|s| s.conn3()).is_none());
        assert!(design.strand(right).and_then(|s| s.conn5()).is_none());
        assert_ne!(design.oligo_of(left), design.oligo_of(right));
        assert!(design.check().is_ok());

        Ok(())
    }

    #[test]
    fn test_clear_clamps_huge_bounds() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let mut design = Design::default();
        let lane = lane(&mut design)?;

        design.connect(lane, 10, 20)?;
        design.clear(lane, HalfIdx::whole(30), HalfIdx::whole(usize::MAX))?;
        assert_eq!(design.bounds(lane), vec![(10, 20)]);

        design.clear(lane, HalfIdx::whole(usize::MAX), HalfIdx::whole(usize::MAX))?;
        assert_eq!(design.bounds(lane), vec![(10, 20)]);

        design.clear(lane, HalfIdx::center(15), HalfIdx::from_halves(usize::MAX))?;
        assert_eq!(design.bounds(lane), vec![(10, 14)]);

        design.clear(lane, HalfIdx::whole(0), HalfIdx::whole(usize::MAX))?;
        assert!(design.bounds(lane).is_empty());
        assert_eq!(design.strand_count(), 0);
        assert!(design.check().is_ok());

        Ok(())
    }

    #[test]
    fn test_split_and_merge() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let mut design = Design::default();
        let lane = lane(&mut design)?;

        let a = design.connect(lane, 0, 9)?;
        design.apply_sequence(lane, 0, "ACGTACGTAC")?;

        let b = design.split(lane, 4)?;
        assert_eq!(design.bounds(lane), vec![(0, 4), (5, 9)]);
        assert_ne!(design.oligo_of(a), design.oligo_of(b));
        assert_eq!(
            design.oligo(design.oligo_of(a).ok_or("oligo")?).map(|o| o.color()),
            design.oligo(design.oligo_of(b).ok_or("oligo")?).map(|o| o.color())
        );

        assert_eq!(
            design.split(lane, 9),
            Err(Rejected::SplitOutOfRange(b, 9))
        );

        assert_eq!(design.merge(b)?, a);
        assert_eq!(design.bounds(lane), vec![(0, 9)]);
        assert_eq!(
            design.strand(a).map(|s| s.sequence().len()),
            Some(10)
        );
        assert!(design.check().is_ok());

        Ok(())
    }

    #[test]
    fn test_merge_without_neighbor() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let mut design = Design::default();
        let lane = lane(&mut design)?;

        let a = design.connect(lane, 0, 4)?;
        design.connect(lane, 6, 9)?;
        assert_eq!(design.merge(a), Err(Rejected::NothingAdjacent(a)));

        Ok(())
    }

    #[test]
    fn test_resize_is_clamped() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let mut design = Design::default();
        let lane = lane(&mut design)?;

        design.connect(lane, 0, 4)?;
        let b = design.connect(lane, 10, 14)?;
        design.connect(lane, 20, 24)?;

        assert_eq!(design.resize_bounds(b)?, (5, 19));

        design.resize(b, 2, 30)?;
        assert_eq!(design.bounds(lane), vec![(0, 4), (5, 19), (20, 24)]);

        // Abutting strands stay separate.
        assert_eq!(design.strand_count(), 3);
        assert!(design.check().is_ok());

        Ok(())
    }

    #[test]
    fn test_segments_and_endpoints() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let mut design = Design::default();
        let lane = lane(&mut design)?;

        design.connect(lane, 2, 5)?;
        design.connect(lane, 8, 8)?;

        // Even-parity staples run toward lower indices.
        assert_eq!(design.endpoints(lane), vec![(5, 2), (8, 8)]);

        let geometry = design.segments_and_endpoints(lane);
        assert_eq!(
            geometry.segments(),
            &[
                (HalfIdx::center(2), HalfIdx::center(5)),
                (HalfIdx::center(8), HalfIdx::center(8))
            ]
        );
        assert_eq!(geometry.ends5(), &[5, 8]);
        assert_eq!(geometry.ends3(), &[2, 8]);

        assert!(design.has_base_at(lane, 8));
        assert!(!design.has_base_at(lane, 7));

        Ok(())
    }
}
