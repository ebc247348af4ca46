//! Oligos: maximal chains of linked strands.
//!
//! Membership is not maintained eagerly. Edits mark the strands whose links or
//! bounds changed, and at the end of each operation the chains through those
//! strands are walked again and handed an oligo identity. An oligo stays with
//! the chain still holding its head strand; otherwise it goes to the chain
//! holding most of its old bases, so when chains join the oligo with the most
//! bases wins. Chains left without one get a new oligo carrying the color of
//! the oligo they mostly came from.

use std::collections::BTreeSet;

use nonempty::NonEmpty;
use tracing::trace;
use tracing::warn;

use crate::Color;
use crate::design::AxisId;
use crate::design::Design;
use crate::design::End;
use crate::design::OligoId;
use crate::design::Side;
use crate::design::StrandId;

/// A maximal chain of linked strands.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Oligo {
    /// The display color.
    color: Color,

    /// The 5'-most strand, or the canonical strand of a circular chain.
    head: StrandId,

    /// Whether the chain closes on itself.
    circular: bool,
}

impl Oligo {
    /// Creates an oligo record.
    pub(crate) fn new(color: Color, head: StrandId, circular: bool) -> Self {
        Self {
            color,
            head,
            circular,
        }
    }

    /// Gets the display color.
    pub fn color(&self) -> Color {
        self.color
    }

    pub(crate) fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    /// Gets the head strand.
    ///
    /// For a linear oligo this is the strand carrying the 5' end. A circular
    /// oligo has no 5' end, so its head is the member lying on the lowest
    /// axis, side and index.
    pub fn head(&self) -> StrandId {
        self.head
    }

    /// Returns whether the chain closes on itself.
    pub fn is_circular(&self) -> bool {
        self.circular
    }
}

/// The strands visited by following 3' links.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Walk {
    /// The strands in visiting order.
    strands: NonEmpty<StrandId>,

    /// Whether the walk came back to its start.
    circular: bool,
}

impl Walk {
    /// Gets the strands in visiting order.
    pub fn strands(&self) -> &NonEmpty<StrandId> {
        &self.strands
    }

    /// Returns whether the walk came back to its start.
    pub fn is_circular(&self) -> bool {
        self.circular
    }

    /// Returns whether the walk visited `id`.
    pub fn contains(&self, id: StrandId) -> bool {
        self.strands.iter().any(|s| *s == id)
    }
}

/// Picks the oligo with the most bases, preferring the earliest on ties.
fn most_common<'a>(tally: impl Iterator<Item = &'a (OligoId, usize)>) -> Option<OligoId> {
    let mut best: Option<(OligoId, usize)> = None;

    for &(oligo, count) in tally {
        if best.map_or(true, |(_, most)| count > most) {
            best = Some((oligo, count));
        }
    }

    best.map(|(oligo, _)| oligo)
}

impl Design {
    /// Follows a link, ignoring links the peer does not reciprocate.
    fn step(&self, id: StrandId, end: End) -> Option<StrandId> {
        let peer = self.strand(id)?.link(end)?;

        match self.strand(peer) {
            Some(other) if other.link(end.opposite()) == Some(id) => Some(peer),
            _ => {
                warn!("{id} has a {end} link to {peer} that is not reciprocated");
                None
            }
        }
    }

    /// Walks 3'-ward from a strand.
    ///
    /// The walk stops at a missing link, when it comes back to `start`, or once
    /// it has visited every live strand, so it terminates even on a corrupted
    /// graph.
    ///
    /// # Examples
    ///
    /// ```
    /// use strandgraph::Design;
    /// use strandgraph::design::Side;
    ///
    /// let mut design = Design::default();
    /// let a = design.add_axis(0, 0)?.lane(Side::Scaffold);
    /// let b = design.add_axis(0, 1)?.lane(Side::Scaffold);
    ///
    /// // Even-parity scaffolds run toward higher indices.
    /// let first = design.connect(a, 0, 10)?;
    /// let second = design.connect(b, 0, 10)?;
    /// design.install_crossover(a, 10, b, 10)?;
    ///
    /// let walk = design.walk3p(first).ok_or("no such strand")?;
    /// assert_eq!(walk.strands().iter().copied().collect::<Vec<_>>(), vec![first, second]);
    /// assert!(!walk.is_circular());
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn walk3p(&self, start: StrandId) -> Option<Walk> {
        self.strand(start)?;

        let budget = self.strand_count();
        let mut strands = NonEmpty::new(start);
        let mut circular = false;
        let mut current = start;

        while let Some(next) = self.step(current, End::Three) {
            if next == start {
                circular = true;
                break;
            }

            if strands.len() >= budget {
                warn!("walk from {start} exceeded {budget} strands");
                break;
            }

            strands.push(next);
            current = next;
        }

        Some(Walk { strands, circular })
    }

    /// Gets the strands of an oligo from its head.
    pub fn oligo_strands(&self, id: OligoId) -> Option<Walk> {
        self.walk3p(self.oligo(id)?.head())
    }

    /// Gets the number of bases of an oligo.
    pub fn oligo_length(&self, id: OligoId) -> Option<usize> {
        let walk = self.oligo_strands(id)?;

        Some(
            walk.strands()
                .iter()
                .filter_map(|s| self.strand(*s))
                .map(|s| s.len())
                .sum(),
        )
    }

    /// Gets the ordering key used to pick the head of a circular chain.
    fn rank(&self, id: StrandId) -> (AxisId, Side, usize, StrandId) {
        match self.strand(id) {
            Some(s) => (s.lane().axis(), s.lane().side(), s.low(), id),
            None => (AxisId::new(usize::MAX), Side::Staple, usize::MAX, id),
        }
    }

    /// Gets the head strand of the chain through `id`.
    pub(crate) fn chain_head(&self, id: StrandId) -> Option<StrandId> {
        self.strand(id)?;

        let budget = self.strand_count();
        let mut current = id;

        for _ in 0..budget {
            match self.step(current, End::Five) {
                None => return Some(current),
                Some(prev) if prev == id => {
                    let walk = self.walk3p(id)?;
                    return walk.strands().iter().copied().min_by_key(|s| self.rank(*s));
                }
                Some(prev) => current = prev,
            }
        }

        warn!("5' walk from {id} exceeded {budget} strands");
        Some(current)
    }

    /// Reassigns oligo membership for every chain touched since the last call.
    pub(crate) fn reconcile(&mut self) {
        let dirty = std::mem::take(&mut self.dirty);
        let mut stale = std::mem::take(&mut self.stale);

        if dirty.is_empty() && stale.is_empty() {
            return;
        }

        let mut seen = BTreeSet::new();
        let mut chains = Vec::new();

        for id in dirty {
            if !seen.insert(id) {
                continue;
            }

            let Some(walk) = self.chain_head(id).and_then(|head| self.walk3p(head)) else {
                continue;
            };

            seen.extend(walk.strands().iter().copied());
            chains.push(walk);
        }

        // Bases per previous owner of each chain's members, in 5'→3' order.
        let tallies = chains
            .iter()
            .map(|walk| {
                let mut tally: Vec<(OligoId, usize)> = Vec::new();

                for strand in walk.strands().iter().filter_map(|s| self.strand(*s)) {
                    let oligo = strand.oligo();

                    if self.oligo(oligo).is_none() {
                        continue;
                    }

                    match tally.iter_mut().find(|(o, _)| *o == oligo) {
                        Some((_, bases)) => *bases += strand.len(),
                        None => tally.push((oligo, strand.len())),
                    }
                }

                tally
            })
            .collect::<Vec<_>>();

        for tally in &tallies {
            stale.extend(tally.iter().map(|(oligo, _)| *oligo));
        }

        let mut owners = vec![None; chains.len()];
        let mut claimed = BTreeSet::new();

        // An oligo stays with the chain holding its head strand.
        for (i, walk) in chains.iter().enumerate() {
            let owner = most_common(tallies[i].iter().filter(|(oligo, _)| {
                !claimed.contains(oligo)
                    && self
                        .oligo(*oligo)
                        .is_some_and(|o| walk.contains(o.head()))
            }));

            if let Some(oligo) = owner {
                claimed.insert(oligo);
                owners[i] = Some(oligo);
            }
        }

        // Then with the chain holding most of its bases.
        for i in 0..chains.len() {
            if owners[i].is_some() {
                continue;
            }

            if let Some(oligo) =
                most_common(tallies[i].iter().filter(|(oligo, _)| !claimed.contains(oligo)))
            {
                claimed.insert(oligo);
                owners[i] = Some(oligo);
            }
        }

        let mut kept = BTreeSet::new();

        for (i, walk) in chains.iter().enumerate() {
            let head = match walk.is_circular() {
                true => walk
                    .strands()
                    .iter()
                    .copied()
                    .min_by_key(|s| self.rank(*s))
                    .unwrap_or(*walk.strands().first()),
                false => *walk.strands().first(),
            };

            let owner = match owners[i] {
                Some(oligo) => oligo,
                None => {
                    let inherited = most_common(tallies[i].iter())
                        .and_then(|o| self.oligo(o))
                        .map(|o| o.color());

                    let color = match inherited {
                        Some(color) => color,
                        None => {
                            let side = self
                                .strand(head)
                                .map(|s| s.lane().side())
                                .unwrap_or(Side::Staple);
                            self.next_color(side)
                        }
                    };

                    let oligo = self.insert_oligo(Oligo::new(color, head, walk.is_circular()));
                    trace!("created {oligo} for the chain headed by {head}");
                    oligo
                }
            };

            kept.insert(owner);

            let current = self.oligo(owner).map(|o| (o.head(), o.is_circular()));
            if current != Some((head, walk.is_circular())) {
                if let Some(oligo) = self.oligo_mut(owner) {
                    oligo.head = head;
                    oligo.circular = walk.is_circular();
                }
            }

            for id in walk.strands().iter().copied() {
                if self.oligo_of(id) != Some(owner) {
                    if let Some(strand) = self.strand_mut(id) {
                        strand.set_oligo(owner);
                    }
                }
            }
        }

        // Every chain a stale oligo could still own was walked above, since
        // breaking a chain touches the strands on both sides of the break.
        for oligo in stale {
            if !kept.contains(&oligo) && self.oligo(oligo).is_some() {
                debug_assert!(
                    self.strands().all(|(_, s)| s.oligo() != oligo),
                    "{oligo} is still referenced"
                );
                trace!("dropped {oligo}");
                self.remove_oligo(oligo);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::design::LaneId;

    use super::*;

    /// Creates `n` scaffold lanes on the row-0 axes.
    fn lanes(design: &mut Design, n: usize) -> Result<Vec<LaneId>, Box<dyn std::error::Error>> {
        let mut lanes = Vec::new();

        for col in 0..n {
            lanes.push(design.add_axis_with_length(0, col, 30)?.lane(Side::Scaffold));
        }

        Ok(lanes)
    }

    #[test]
    fn test_crossover_merges_oligos() -> Result<(), Box<dyn std::error::Error>> {
        let mut design = Design::default();
        let lanes = lanes(&mut design, 2)?;

        let a = design.connect(lanes[0], 0, 9)?;
        let b = design.connect(lanes[1], 0, 19)?;
        let big = design.oligo_of(b).ok_or("oligo")?;

        // Even scaffold: 3' end at 9. Odd scaffold: 5' end at 19.
        design.install_crossover(lanes[0], 9, lanes[1], 19)?;

        assert_eq!(design.oligos().count(), 1);
        assert_eq!(design.oligo_of(a), Some(big));
        assert_eq!(design.oligo(big).map(|o| o.head()), Some(a));
        assert_eq!(design.oligo_length(big), Some(30));
        assert!(design.check().is_ok());

        Ok(())
    }

    #[test]
    fn test_merged_oligo_follows_base_count() -> Result<(), Box<dyn std::error::Error>> {
        let mut design = Design::default();
        let lanes = lanes(&mut design, 3)?;

        // Two short strands (10 bases) against one long strand (20 bases).
        let a = design.connect(lanes[0], 0, 4)?;
        design.connect(lanes[1], 0, 4)?;
        design.install_crossover(lanes[0], 4, lanes[1], 4)?;
        let short = design.oligo_of(a).ok_or("oligo")?;
        assert_eq!(design.oligo_strands(short).map(|w| w.strands().len()), Some(2));

        let b = design.connect(lanes[2], 0, 19)?;
        let long = design.oligo_of(b).ok_or("oligo")?;
        let color = design.oligo(long).map(|o| o.color());

        design.install_crossover(lanes[1], 0, lanes[2], 0)?;

        assert_eq!(design.oligos().count(), 1);
        assert_eq!(design.oligo_of(a), Some(long));
        assert!(design.oligo(short).is_none());
        assert_eq!(design.oligo(long).map(|o| o.color()), color);
        assert_eq!(design.oligo(long).map(|o| o.head()), Some(a));
        assert_eq!(design.oligo_length(long), Some(30));
        assert!(design.check().is_ok());

        Ok(())
    }

    #[test]
    fn test_removing_crossover_splits_oligo() -> Result<(), Box<dyn std::error::Error>> {
        let mut design = Design::default();
        let lanes = lanes(&mut design, 2)?;

        let a = design.connect(lanes[0], 0, 9)?;
        let b = design.connect(lanes[1], 0, 19)?;
        design.install_crossover(lanes[0], 9, lanes[1], 19)?;
        let merged = design.oligo_of(a).ok_or("oligo")?;

        design.remove_crossover(lanes[0], 9, lanes[1], 19)?;

        assert_eq!(design.oligo_of(a), Some(merged));
        assert_ne!(design.oligo_of(b), Some(merged));
        assert_eq!(design.oligos().count(), 2);
        assert!(design.check().is_ok());

        Ok(())
    }

    #[test]
    fn test_circular_oligo() -> Result<(), Box<dyn std::error::Error>> {
        let mut design = Design::default();
        let lanes = lanes(&mut design, 2)?;

        let a = design.connect(lanes[0], 5, 15)?;
        let b = design.connect(lanes[1], 5, 15)?;

        // Even scaffold runs 5→15, odd scaffold runs 15→5.
        design.install_crossover(lanes[0], 15, lanes[1], 15)?;
        design.install_crossover(lanes[1], 5, lanes[0], 5)?;

        let oligo = design.oligo_of(a).ok_or("oligo")?;
        assert_eq!(design.oligo_of(b), Some(oligo));
        assert!(design.oligo(oligo).is_some_and(|o| o.is_circular()));
        assert_eq!(design.oligo(oligo).map(|o| o.head()), Some(a));

        let walk = design.walk3p(b).ok_or("walk")?;
        assert!(walk.is_circular());
        assert_eq!(walk.strands().len(), 2);
        assert!(design.check().is_ok());

        Ok(())
    }

    #[test]
    fn test_walk_survives_unreciprocated_link() -> Result<(), Box<dyn std::error::Error>> {
        let mut design = Design::default();
        let lanes = lanes(&mut design, 3)?;

        let a = design.connect(lanes[0], 0, 9)?;
        let b = design.connect(lanes[1], 0, 9)?;
        let c = design.connect(lanes[2], 0, 9)?;
        design.install_crossover(lanes[0], 9, lanes[1], 9)?;

        // Point b's 3' end at c without c pointing back.
        design.strands[b.get()]
            .as_mut()
            .ok_or("strand")?
            .set_link(End::Three, Some(c));

        let walk = design.walk3p(a).ok_or("walk")?;
        assert_eq!(walk.strands().len(), 2);
        assert!(walk.strands().len() <= design.strand_count() + 1);
        assert!(design.check().is_err());

        Ok(())
    }
}
