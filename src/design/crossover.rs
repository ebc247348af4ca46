//! Crossovers between neighboring axes.

use rust_lapper as lapper;
use tracing::debug;

use crate::context::SingleBaseCrossovers;
use crate::design::AxisId;
use crate::design::Design;
use crate::design::End;
use crate::design::LaneId;
use crate::design::Rejected;
use crate::design::Result;
use crate::design::Side;
use crate::design::StrandId;

/// A place where a crossover to a neighboring axis is geometrically possible.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Candidate {
    /// The neighboring axis.
    neighbor: AxisId,

    /// The index on both axes.
    idx: usize,
}

impl Candidate {
    /// Gets the neighboring axis.
    pub fn neighbor(&self) -> AxisId {
        self.neighbor
    }

    /// Gets the index on both axes.
    pub fn idx(&self) -> usize {
        self.idx
    }
}

impl Design {
    /// Links the 3' end of the strand at `from_idx` on `from` to the 5' end of
    /// the strand at `to_idx` on `to`.
    ///
    /// Whatever either end was linked to before is unlinked. Under
    /// [`SingleBaseCrossovers::Extend`], a one-base strand is first grown by
    /// one base at its other end, and the crossover is refused if it cannot
    /// be.
    pub fn install_crossover(
        &mut self,
        from: LaneId,
        from_idx: usize,
        to: LaneId,
        to_idx: usize,
    ) -> Result<()> {
        if from.axis() == to.axis() {
            return Err(Rejected::SameAxis(from.axis()));
        }

        if from.side() != to.side() {
            return Err(Rejected::SideMismatch(from.side(), to.side()));
        }

        let a = self.require_at(from, from_idx)?;
        let b = self.require_at(to, to_idx)?;
        let (source, target) = (self.require(a)?, self.require(b)?);

        if source.idx3() != from_idx {
            return Err(Rejected::NotAnEnd(a, End::Three, from_idx));
        }

        if target.idx5() != to_idx {
            return Err(Rejected::NotAnEnd(b, End::Five, to_idx));
        }

        if source.conn3() == Some(b) {
            return Ok(());
        }

        let mut growth = Vec::new();
        if self.context().single_base_crossovers() == SingleBaseCrossovers::Extend {
            if source.len() == 1 {
                growth.push(self.extension(a, End::Five)?);
            }

            if target.len() == 1 {
                growth.push(self.extension(b, End::Three)?);
            }
        }

        self.transact("install crossover", |design| {
            for (id, low, high) in growth {
                design.reshape(id, low, high);
            }

            design.detach(a, End::Three);
            design.detach(b, End::Five);
            design.attach(a, b);

            debug!("linked {from} index {from_idx} to {to} index {to_idx}");
            Ok(())
        })
    }

    /// Gets the bounds a one-base strand takes after growing past `end`.
    fn extension(&self, id: StrandId, end: End) -> Result<(StrandId, usize, usize)> {
        let strand = self.require(id)?;
        let (min, max) = self.resize_bounds(id)?;

        if strand.link(end).is_some() {
            return Err(Rejected::NoRoom(id));
        }

        match strand.low_end() == end {
            true if strand.low() > min => Ok((id, strand.low() - 1, strand.high())),
            false if strand.high() < max => Ok((id, strand.low(), strand.high() + 1)),
            _ => Err(Rejected::NoRoom(id)),
        }
    }

    /// Unlinks the 3' end at `from_idx` on `from` from the 5' end at `to_idx`
    /// on `to`.
    pub fn remove_crossover(
        &mut self,
        from: LaneId,
        from_idx: usize,
        to: LaneId,
        to_idx: usize,
    ) -> Result<()> {
        let a = self.require_at(from, from_idx)?;
        let b = self.require_at(to, to_idx)?;
        let (source, target) = (self.require(a)?, self.require(b)?);

        let linked = source.idx3() == from_idx
            && target.idx5() == to_idx
            && source.conn3() == Some(b)
            && target.conn5() == Some(a);

        if !linked {
            return Err(Rejected::NotLinked(a, b));
        }

        self.transact("remove crossover", |design| {
            design.detach(a, End::Three);
            debug!("unlinked {from} index {from_idx} from {to} index {to_idx}");
            Ok(())
        })
    }

    /// Returns whether a strand end at `idx` is linked.
    pub fn has_crossover_at(&self, lane: LaneId, idx: usize) -> bool {
        let Some(strand) = self.strand_at(lane, idx).and_then(|id| self.strand(id)) else {
            return false;
        };

        [End::Five, End::Three]
            .into_iter()
            .any(|end| strand.idx(end) == idx && strand.link(end).is_some())
    }

    /// Finds every index where a crossover leaving `axis` on `side` toward
    /// the right (or left) could land on a neighboring axis.
    ///
    /// A candidate needs a base on both lanes and an index whose offset within
    /// the lattice's repeat matches the neighbor slot's pattern.
    pub fn crossover_candidates(
        &self,
        axis: AxisId,
        facing_right: bool,
        side: Side,
    ) -> Result<Vec<Candidate>> {
        let here = self.axis(axis).ok_or(Rejected::NoSuchAxis(axis))?;
        let lattice = self.context().lattice();
        let step = lattice.step();
        let offsets = lattice.crossover_offsets(side, facing_right);
        let own = here.lane(side);

        let mut candidates = Vec::new();

        for (slot, neighbor) in lattice.neighbors(here.row(), here.col()).into_iter().enumerate() {
            let Some(neighbor) = neighbor.and_then(|(row, col)| self.axis_at(row, col)) else {
                continue;
            };

            let Some(other) = self.axis(neighbor) else {
                continue;
            };

            let index = lapper::Lapper::new(
                other
                    .lane(side)
                    .iter()
                    .map(|interval| lapper::Interval {
                        start: interval.start(),
                        stop: interval.end(),
                        val: *interval.value(),
                    })
                    .collect(),
            );

            for interval in own {
                for hit in index.find(interval.start(), interval.end()) {
                    let start = hit.start.max(interval.start());
                    let end = hit.stop.min(interval.end());

                    candidates.extend(
                        (start..end)
                            .filter(|idx| offsets[slot].contains(&(idx % step)))
                            .map(|idx| Candidate { neighbor, idx }),
                    );
                }
            }
        }

        candidates.sort_unstable();
        candidates.dedup();
        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use crate::context::Builder;

    use super::*;

    fn pair(design: &mut Design, side: Side) -> std::result::Result<(LaneId, LaneId), Rejected> {
        let a = design.add_axis_with_length(0, 0, 42)?;
        let b = design.add_axis_with_length(0, 1, 42)?;
        Ok((a.lane(side), b.lane(side)))
    }

    #[test]
    fn test_install_is_reciprocal() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let mut design = Design::default();
        let (a, b) = pair(&mut design, Side::Staple)?;

        // Staples run toward lower indices on even axes and higher ones on odd.
        let from = design.connect(a, 7, 20)?;
        let to = design.connect(b, 7, 20)?;
        design.install_crossover(a, 7, b, 7)?;

        assert_eq!(design.strand(from).and_then(|s| s.conn3()), Some(to));
        assert_eq!(design.strand(to).and_then(|s| s.conn5()), Some(from));
        assert!(design.has_crossover_at(a, 7));
        assert!(design.has_crossover_at(b, 7));
        assert!(!design.has_crossover_at(a, 20));
        assert!(design.check().is_ok());

        Ok(())
    }

    #[test]
    fn test_install_rejections() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let mut design = Design::default();
        let (a, b) = pair(&mut design, Side::Staple)?;
        let scaffold = b.axis().lane(Side::Scaffold);

        let from = design.connect(a, 7, 20)?;
        design.connect(b, 7, 20)?;
        design.connect(scaffold, 7, 20)?;
        let before = design.undo_count();

        assert_eq!(
            design.install_crossover(a, 20, b, 7),
            Err(Rejected::NotAnEnd(from, End::Three, 20))
        );
        assert_eq!(
            design.install_crossover(a, 7, a, 20),
            Err(Rejected::SameAxis(a.axis()))
        );
        assert_eq!(
            design.install_crossover(a, 7, scaffold, 20),
            Err(Rejected::SideMismatch(Side::Staple, Side::Scaffold))
        );
        assert_eq!(
            design.install_crossover(a, 30, b, 7),
            Err(Rejected::NoStrandAt(a, 30))
        );
        assert_eq!(design.undo_count(), before);

        Ok(())
    }

    #[test]
    fn test_install_replaces_old_peer() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let mut design = Design::default();
        let (a, b) = pair(&mut design, Side::Staple)?;
        let c = design.add_axis_with_length(1, 1, 42)?.lane(Side::Staple);

        let from = design.connect(a, 7, 20)?;
        let old = design.connect(b, 7, 20)?;
        design.install_crossover(a, 7, b, 7)?;

        // (1, 1) is even, so its staple's 5' end is its high index.
        let new = design.connect(c, 0, 7)?;
        design.install_crossover(a, 7, c, 7)?;

        assert_eq!(design.strand(from).and_then(|s| s.conn3()), Some(new));
        assert!(design.strand(old).and_then(|s| s.conn5()).is_none());
        assert!(design.check().is_ok());

        Ok(())
    }

    #[test]
    fn test_single_base_strand_is_extended() -> std::result::Result<(), Box<dyn std::error::Error>>
    {
        let mut design = Design::default();
        let (a, b) = pair(&mut design, Side::Scaffold)?;

        // Even scaffold runs upward, odd scaffold runs downward.
        design.connect(a, 0, 8)?;
        let from = design.connect(a, 10, 10)?;
        design.connect(b, 0, 10)?;
        design.install_crossover(a, 10, b, 10)?;

        // Growing down to 9 abuts the neighbor without fusing with it.
        assert_eq!(design.bounds(a), vec![(0, 8), (9, 10)]);
        assert_eq!(design.strand(from).map(|s| s.idx3()), Some(10));
        assert!(design.check().is_ok());

        Ok(())
    }

    #[test]
    fn test_single_base_without_room() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let mut design = Design::default();
        let (a, b) = pair(&mut design, Side::Scaffold)?;

        let only = design.connect(a, 0, 0)?;
        design.connect(b, 0, 5)?;
        assert_eq!(
            design.install_crossover(a, 0, b, 5),
            Err(Rejected::NoRoom(only))
        );

        let mut design = Design::new(
            Builder::default()
                .single_base_crossovers(SingleBaseCrossovers::Allow)
                .build(),
        );
        let (a, b) = pair(&mut design, Side::Scaffold)?;

        design.connect(a, 0, 0)?;
        design.connect(b, 0, 5)?;
        design.install_crossover(a, 0, b, 5)?;
        assert_eq!(design.bounds(a), vec![(0, 0)]);

        Ok(())
    }

    #[test]
    fn test_candidates() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let mut design = Design::default();
        let (a, b) = pair(&mut design, Side::Staple)?;

        design.connect(a, 0, 41)?;
        design.connect(b, 0, 41)?;

        let right = design.crossover_candidates(a.axis(), true, Side::Staple)?;
        let idx = right.iter().map(|c| c.idx()).collect::<Vec<_>>();
        assert_eq!(idx, vec![7, 28]);
        assert!(right.iter().all(|c| c.neighbor() == b.axis()));

        let left = design.crossover_candidates(a.axis(), false, Side::Staple)?;
        let idx = left.iter().map(|c| c.idx()).collect::<Vec<_>>();
        assert_eq!(idx, vec![6, 27]);

        Ok(())
    }
}
