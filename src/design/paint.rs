//! Sequences, colors and per-base decorators.

use std::collections::BTreeMap;

use crate::Color;
use crate::design::Decorator;
use crate::design::Design;
use crate::design::LaneId;
use crate::design::OligoId;
use crate::design::Rejected;
use crate::design::Result;

/// The character shown for a base that has no sequence assigned.
pub const UNASSIGNED: char = '?';

impl Design {
    /// Assigns `text` along the oligo running through a base, starting at the
    /// oligo's 5' end.
    ///
    /// Each base takes one character, a base with an insertion of `k` takes
    /// `1 + k`, and a skipped base takes none. Bases past the end of `text`
    /// are padded with spaces.
    ///
    /// # Examples
    ///
    /// ```
    /// use strandgraph::Design;
    /// use strandgraph::design::Decorator;
    /// use strandgraph::design::Side;
    ///
    /// let mut design = Design::default();
    /// let lane = design.add_axis(0, 0)?.lane(Side::Scaffold);
    ///
    /// let strand = design.connect(lane, 0, 5)?;
    /// design.decorate(lane, 1, Decorator::Insertion(2))?;
    /// design.decorate(lane, 3, Decorator::Skip)?;
    /// design.apply_sequence(lane, 4, "ACGTTG")?;
    ///
    /// let oligo = design.oligo_of(strand).ok_or("no oligo")?;
    /// assert_eq!(design.oligo_sequence(oligo).as_deref(), Some("ACGTTG "));
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn apply_sequence(&mut self, lane: LaneId, idx: usize, text: &str) -> Result<()> {
        let id = self.require_at(lane, idx)?;
        let oligo = self.require(id)?.oligo();
        let walk = self
            .oligo_strands(oligo)
            .ok_or(Rejected::NoSuchStrand(id))?;

        self.transact("apply sequence", |design| {
            let mut chars = text.chars();

            for member in walk.strands().iter().copied() {
                let Some(strand) = design.strand(member) else {
                    continue;
                };

                let mut assigned = BTreeMap::new();

                for base in strand.bases() {
                    let width = strand
                        .decorators()
                        .get(&base)
                        .map(Decorator::width)
                        .unwrap_or(1);

                    let chunk = chars.by_ref().take(width).collect::<String>();
                    assigned.insert(base, format!("{chunk:<width$}"));
                }

                if let Some(strand) = design.strand_mut(member) {
                    *strand.sequence_mut() = assigned;
                }
            }

            Ok(())
        })
    }

    /// Gets the text of an oligo from 5' to 3'.
    ///
    /// Bases without an assigned sequence show as [`UNASSIGNED`], repeated to
    /// the width of the base.
    pub fn oligo_sequence(&self, id: OligoId) -> Option<String> {
        let walk = self.oligo_strands(id)?;
        let mut text = String::new();

        for strand in walk.strands().iter().filter_map(|s| self.strand(*s)) {
            for base in strand.bases() {
                match strand.sequence().get(&base) {
                    Some(chunk) => text.push_str(chunk),
                    None => {
                        let width = strand
                            .decorators()
                            .get(&base)
                            .map(Decorator::width)
                            .unwrap_or(1);
                        text.extend(std::iter::repeat(UNASSIGNED).take(width));
                    }
                }
            }
        }

        Some(text)
    }

    /// Sets the color of the oligo running through a base.
    pub fn apply_color(&mut self, lane: LaneId, idx: usize, color: Color) -> Result<()> {
        let id = self.require_at(lane, idx)?;
        let oligo = self.require(id)?.oligo();

        self.transact("apply color", |design| {
            if let Some(oligo) = design.oligo_mut(oligo) {
                oligo.set_color(color);
            }

            Ok(())
        })
    }

    /// Places a decorator on an occupied base, replacing any already there.
    ///
    /// An insertion of zero bases removes the decorator instead.
    pub fn decorate(&mut self, lane: LaneId, idx: usize, decorator: Decorator) -> Result<()> {
        let id = self.require_at(lane, idx)?;

        self.transact("decorate", |design| {
            if let Some(strand) = design.strand_mut(id) {
                match decorator {
                    Decorator::Insertion(0) => strand.decorators_mut().remove(&idx),
                    decorator => strand.decorators_mut().insert(idx, decorator),
                };
            }

            Ok(())
        })
    }

    /// Removes the decorator from an occupied base.
    pub fn undecorate(&mut self, lane: LaneId, idx: usize) -> Result<()> {
        self.decorate(lane, idx, Decorator::Insertion(0))
    }
}
