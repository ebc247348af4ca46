//! Transactions and undo history.
//!
//! While a transaction is open, the first time any strand, oligo or axis is
//! touched its before-image is copied into the innermost journal layer. A
//! layer that closes successfully is folded into its parent, keeping the
//! parent's (older) images. A layer that fails is replayed in reverse, which
//! restores everything it touched no matter how deeply nested it was.
//!
//! Closing the outermost layer compares every before-image with the current
//! record and keeps the ones that changed as a [`Transaction`].

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use tracing::debug;

use crate::design::Axis;
use crate::design::AxisId;
use crate::design::Design;
use crate::design::Oligo;
use crate::design::OligoId;
use crate::design::Rejected;
use crate::design::Result;
use crate::design::Strand;
use crate::design::StrandId;

/// Records the before-image of `key` unless one was already recorded.
fn remember<K, V>(images: &mut BTreeMap<K, Option<V>>, key: K, current: &Option<V>)
where
    K: Ord,
    V: Clone,
{
    images.entry(key).or_insert_with(|| current.clone());
}

/// Writes an image back into an arena slot, returning whether the slot was
/// occupied before.
fn put<V: Clone>(arena: &mut Vec<Option<V>>, slot: usize, image: &Option<V>) -> bool {
    if arena.len() <= slot {
        arena.resize_with(slot + 1, || None);
    }

    std::mem::replace(&mut arena[slot], image.clone()).is_some()
}

////////////////////////////////////////////////////////////////////////////////////////
// Journal
////////////////////////////////////////////////////////////////////////////////////////

/// The before-images of one open transaction.
#[derive(Debug, Default)]
pub(crate) struct Layer {
    /// The transaction's label.
    label: String,

    /// Strand before-images.
    strands: BTreeMap<StrandId, Option<Strand>>,

    /// Oligo before-images.
    oligos: BTreeMap<OligoId, Option<Oligo>>,

    /// Axis before-images.
    axes: BTreeMap<AxisId, Option<Axis>>,

    /// Palette colors drawn before the layer opened.
    colors_drawn: usize,
}

/// The stack of open transactions.
#[derive(Debug, Default)]
pub(crate) struct Journal {
    /// The open layers, innermost last.
    layers: Vec<Layer>,
}

impl Journal {
    /// Opens a layer.
    pub(crate) fn open(&mut self, label: &str, colors_drawn: usize) {
        self.layers.push(Layer {
            label: label.to_string(),
            colors_drawn,
            ..Default::default()
        });
    }

    /// Returns whether any layer is open.
    pub(crate) fn is_open(&self) -> bool {
        !self.layers.is_empty()
    }

    /// Closes the innermost layer successfully.
    ///
    /// Returns the layer when it was the outermost one.
    pub(crate) fn close(&mut self) -> Option<Layer> {
        let layer = self.layers.pop()?;

        let Some(parent) = self.layers.last_mut() else {
            return Some(layer);
        };

        for (id, image) in layer.strands {
            parent.strands.entry(id).or_insert(image);
        }

        for (id, image) in layer.oligos {
            parent.oligos.entry(id).or_insert(image);
        }

        for (id, image) in layer.axes {
            parent.axes.entry(id).or_insert(image);
        }

        None
    }

    /// Closes the innermost layer for rollback.
    pub(crate) fn discard(&mut self) -> Option<Layer> {
        self.layers.pop()
    }

    /// Remembers a strand.
    pub(crate) fn remember_strand(&mut self, id: StrandId, current: &Option<Strand>) {
        if let Some(layer) = self.layers.last_mut() {
            remember(&mut layer.strands, id, current);
        }
    }

    /// Remembers an oligo.
    pub(crate) fn remember_oligo(&mut self, id: OligoId, current: &Option<Oligo>) {
        if let Some(layer) = self.layers.last_mut() {
            remember(&mut layer.oligos, id, current);
        }
    }

    /// Remembers an axis.
    pub(crate) fn remember_axis(&mut self, id: AxisId, current: &Option<Axis>) {
        if let Some(layer) = self.layers.last_mut() {
            remember(&mut layer.axes, id, current);
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////
// Transactions
////////////////////////////////////////////////////////////////////////////////////////

/// A record that changed, as it was before and after.
#[derive(Clone, Debug)]
pub struct Change<K, V> {
    /// The record's handle.
    id: K,

    /// The record before; [`None`] if it did not exist.
    before: Option<V>,

    /// The record after; [`None`] if it was deleted.
    after: Option<V>,
}

impl<K, V> Change<K, V> {
    /// Gets the record's handle.
    pub fn id(&self) -> &K {
        &self.id
    }

    /// Gets the record before the change.
    pub fn before(&self) -> Option<&V> {
        self.before.as_ref()
    }

    /// Gets the record after the change.
    pub fn after(&self) -> Option<&V> {
        self.after.as_ref()
    }

    /// Gets the image to restore when moving in `direction`.
    fn image(&self, direction: Direction) -> &Option<V> {
        match direction {
            Direction::Backward => &self.before,
            Direction::Forward => &self.after,
        }
    }
}

/// A committed unit of undo.
#[derive(Clone, Debug)]
pub struct Transaction {
    /// The label of the outermost operation.
    label: String,

    /// Strand changes.
    strands: Vec<Change<StrandId, Strand>>,

    /// Oligo changes.
    oligos: Vec<Change<OligoId, Oligo>>,

    /// Axis changes.
    axes: Vec<Change<AxisId, Axis>>,

    /// The axes whose bases changed.
    touched: BTreeSet<AxisId>,

    /// Palette colors drawn before and after.
    colors_drawn: (usize, usize),
}

impl Transaction {
    /// Gets the label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Gets the strand changes.
    pub fn strands(&self) -> &[Change<StrandId, Strand>] {
        &self.strands
    }

    /// Gets the oligo changes.
    pub fn oligos(&self) -> &[Change<OligoId, Oligo>] {
        &self.oligos
    }

    /// Gets the axis changes.
    pub fn axes(&self) -> &[Change<AxisId, Axis>] {
        &self.axes
    }

    /// Gets the axes whose bases changed.
    pub fn touched(&self) -> &BTreeSet<AxisId> {
        &self.touched
    }

    /// Returns whether nothing changed.
    pub fn is_empty(&self) -> bool {
        self.strands.is_empty() && self.oligos.is_empty() && self.axes.is_empty()
    }
}

/// The undo and redo stacks.
#[derive(Debug, Default)]
pub(crate) struct History {
    /// Transactions that can be undone, most recent last.
    undo: Vec<Transaction>,

    /// Transactions that can be redone, most recently undone last.
    redo: Vec<Transaction>,
}

/// Which image of a transaction to restore.
#[derive(Clone, Copy, Debug)]
enum Direction {
    /// Restore the before-images.
    Backward,

    /// Restore the after-images.
    Forward,
}

impl Design {
    /// Turns the outermost layer into a transaction and records it.
    pub(crate) fn commit(&mut self, layer: Layer) {
        let Layer {
            label,
            strands,
            oligos,
            axes,
            colors_drawn,
        } = layer;

        let strands = strands
            .into_iter()
            .filter_map(|(id, before)| {
                let after = self.strand(id).cloned();
                (before != after).then_some(Change { id, before, after })
            })
            .collect::<Vec<_>>();

        let oligos = oligos
            .into_iter()
            .filter_map(|(id, before)| {
                let after = self.oligo(id).cloned();
                (before != after).then_some(Change { id, before, after })
            })
            .collect::<Vec<_>>();

        let axes = axes
            .into_iter()
            .filter_map(|(id, before)| {
                let after = self.axis(id).cloned();
                (before != after).then_some(Change { id, before, after })
            })
            .collect::<Vec<_>>();

        let mut touched = axes.iter().map(|change| change.id).collect::<BTreeSet<_>>();

        for change in &strands {
            touched.extend(
                change
                    .before
                    .iter()
                    .chain(change.after.iter())
                    .map(|s| s.lane().axis()),
            );
        }

        let recolored = oligos
            .iter()
            .map(|change| change.id)
            .collect::<BTreeSet<_>>();

        if !recolored.is_empty() {
            touched.extend(
                self.strands()
                    .filter(|(_, s)| recolored.contains(&s.oligo()))
                    .map(|(_, s)| s.lane().axis()),
            );
        }

        let transaction = Transaction {
            label,
            strands,
            oligos,
            axes,
            touched,
            colors_drawn: (colors_drawn, self.colors_drawn),
        };

        if transaction.is_empty() {
            return;
        }

        debug_assert!(
            self.check().is_ok(),
            "`{}` left the design inconsistent: {:?}",
            transaction.label,
            self.check()
        );

        debug!(
            "committed `{}` ({} strands, {} oligos, {} axes)",
            transaction.label,
            transaction.strands.len(),
            transaction.oligos.len(),
            transaction.axes.len()
        );

        let touched = transaction.touched.clone();
        self.history.undo.push(transaction);
        self.history.redo.clear();
        self.notify(&touched);
    }

    /// Restores every before-image of a failed layer.
    pub(crate) fn rollback(&mut self, layer: Layer) {
        debug!("rolled back `{}`", layer.label);

        for (id, image) in &layer.strands {
            self.put_strand(*id, image);
        }

        for (id, image) in &layer.oligos {
            put(&mut self.oligos, id.get(), image);
        }

        for (id, image) in &layer.axes {
            put(&mut self.axes, id.get(), image);
        }

        self.colors_drawn = layer.colors_drawn;
        self.dirty.clear();
        self.stale.clear();
    }

    /// Writes a strand image back, keeping the live count in step.
    fn put_strand(&mut self, id: StrandId, image: &Option<Strand>) {
        match (put(&mut self.strands, id.get(), image), image.is_some()) {
            (false, true) => self.live_strands += 1,
            (true, false) => self.live_strands -= 1,
            _ => {}
        }
    }

    /// Writes one side of a transaction back into the arenas.
    fn restore(&mut self, transaction: &Transaction, direction: Direction) {
        for change in &transaction.strands {
            self.put_strand(change.id, change.image(direction));
        }

        for change in &transaction.oligos {
            put(&mut self.oligos, change.id.get(), change.image(direction));
        }

        for change in &transaction.axes {
            put(&mut self.axes, change.id.get(), change.image(direction));
        }

        self.colors_drawn = match direction {
            Direction::Backward => transaction.colors_drawn.0,
            Direction::Forward => transaction.colors_drawn.1,
        };
    }

    /// Reverts the most recent transaction.
    pub fn undo(&mut self) -> Result<()> {
        if self.journal.is_open() {
            return Err(Rejected::MacroOpen);
        }

        let transaction = self.history.undo.pop().ok_or(Rejected::NothingToUndo)?;
        self.restore(&transaction, Direction::Backward);
        debug!("undid `{}`", transaction.label);

        self.notify(&transaction.touched);
        self.history.redo.push(transaction);
        Ok(())
    }

    /// Reapplies the most recently undone transaction.
    pub fn redo(&mut self) -> Result<()> {
        if self.journal.is_open() {
            return Err(Rejected::MacroOpen);
        }

        let transaction = self.history.redo.pop().ok_or(Rejected::NothingToRedo)?;
        self.restore(&transaction, Direction::Forward);
        debug!("redid `{}`", transaction.label);

        self.notify(&transaction.touched);
        self.history.undo.push(transaction);
        Ok(())
    }

    /// Returns whether there is anything to undo.
    pub fn can_undo(&self) -> bool {
        !self.history.undo.is_empty()
    }

    /// Returns whether there is anything to redo.
    pub fn can_redo(&self) -> bool {
        !self.history.redo.is_empty()
    }

    /// Gets the number of transactions that can be undone.
    pub fn undo_count(&self) -> usize {
        self.history.undo.len()
    }

    /// Gets the transaction [`Self::undo()`] would revert.
    pub fn last_transaction(&self) -> Option<&Transaction> {
        self.history.undo.last()
    }

    /// Drops every transaction from both stacks.
    pub fn clear_history(&mut self) {
        self.history.undo.clear();
        self.history.redo.clear();
    }

    /// Opens a macro: every operation until the matching
    /// [`Self::end_macro()`] becomes a single transaction.
    ///
    /// Macros nest. Operations refused inside a macro are rolled back on their
    /// own without closing it.
    pub fn begin_macro(&mut self, label: &str) {
        self.journal.open(label, self.colors_drawn);
    }

    /// Closes the innermost macro, committing it if it was the outermost.
    pub fn end_macro(&mut self) -> Result<()> {
        if !self.journal.is_open() {
            return Err(Rejected::NoMacroOpen);
        }

        self.reconcile();

        if let Some(layer) = self.journal.close() {
            self.commit(layer);
        }

        Ok(())
    }

    /// Closes the innermost macro, reverting everything done inside it.
    pub fn abort_macro(&mut self) -> Result<()> {
        let layer = self.journal.discard().ok_or(Rejected::NoMacroOpen)?;
        self.rollback(layer);
        Ok(())
    }

    /// Runs `f` as a single transaction, reverting everything it did if it
    /// returns an error.
    ///
    /// # Examples
    ///
    /// ```
    /// use strandgraph::Design;
    /// use strandgraph::design::Rejected;
    /// use strandgraph::design::Side;
    ///
    /// let mut design = Design::default();
    /// let lane = design.add_axis(0, 0)?.lane(Side::Staple);
    ///
    /// let result = design.atomic("two strands", |d| {
    ///     d.connect(lane, 0, 4)?;
    ///     d.connect(lane, 10, 14)?;
    ///     d.split(lane, 20)
    /// });
    ///
    /// assert_eq!(result, Err(Rejected::NoStrandAt(lane, 20)));
    /// assert!(design.bounds(lane).is_empty());
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn atomic<T, E>(
        &mut self,
        label: &str,
        f: impl FnOnce(&mut Design) -> std::result::Result<T, E>,
    ) -> std::result::Result<T, E> {
        self.transact(label, f)
    }
}

#[cfg(test)]
mod tests {
    use crate::design::HalfIdx;
    use crate::design::Side;

    use super::*;

    #[test]
    fn test_undo_redo() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let mut design = Design::default();
        let lane = design.add_axis(0, 0)?.lane(Side::Staple);

        design.connect(lane, 0, 9)?;
        design.split(lane, 4)?;
        assert_eq!(design.last_transaction().map(|t| t.label()), Some("split"));

        design.undo()?;
        assert_eq!(design.bounds(lane), vec![(0, 9)]);
        assert_eq!(design.oligos().count(), 1);
        assert_eq!(design.strand_count(), 1);
        assert!(design.can_redo());

        design.redo()?;
        assert_eq!(design.bounds(lane), vec![(0, 4), (5, 9)]);
        assert_eq!(design.oligos().count(), 2);
        assert_eq!(design.strand_count(), 2);
        assert!(design.check().is_ok());

        // A new edit forgets the redo stack.
        design.undo()?;
        design.connect(lane, 20, 25)?;
        assert!(!design.can_redo());
        assert_eq!(design.redo(), Err(Rejected::NothingToRedo));

        Ok(())
    }

    #[test]
    fn test_macro_commits_once() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let mut design = Design::default();
        let lane = design.add_axis(0, 0)?.lane(Side::Staple);
        let before = design.undo_count();

        design.begin_macro("draw");
        design.connect(lane, 0, 9)?;
        design.connect(lane, 20, 29)?;
        assert_eq!(design.undo(), Err(Rejected::MacroOpen));
        design.end_macro()?;

        assert_eq!(design.undo_count(), before + 1);

        design.undo()?;
        assert!(design.bounds(lane).is_empty());
        assert_eq!(design.end_macro(), Err(Rejected::NoMacroOpen));

        Ok(())
    }

    #[test]
    fn test_failed_atomic_rolls_back_nested_work() -> std::result::Result<(), Box<dyn std::error::Error>>
    {
        let mut design = Design::default();
        let lane = design.add_axis(0, 0)?.lane(Side::Staple);
        design.connect(lane, 0, 9)?;
        let before = design.undo_count();

        let result = design.atomic("outer", |d| {
            d.clear(lane, HalfIdx::whole(3), HalfIdx::whole(5))?;
            d.atomic("inner", |d| d.connect(lane, 15, 19))?;
            d.merge(crate::design::StrandId::new(999))
        });

        assert!(result.is_err());
        assert_eq!(design.bounds(lane), vec![(0, 9)]);
        assert_eq!(design.strand_count(), 1);
        assert_eq!(design.oligos().count(), 1);
        assert_eq!(design.undo_count(), before);
        assert!(design.check().is_ok());

        Ok(())
    }

    #[test]
    fn test_abort_macro() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let mut design = Design::default();
        let lane = design.add_axis(0, 0)?.lane(Side::Staple);

        design.begin_macro("scratch");
        design.connect(lane, 0, 9)?;

        // A refused operation inside the macro only undoes itself.
        assert!(design.split(lane, 9).is_err());
        assert_eq!(design.bounds(lane), vec![(0, 9)]);

        design.abort_macro()?;
        assert!(design.bounds(lane).is_empty());
        assert!(!design.can_redo());

        Ok(())
    }

    #[test]
    fn test_palette_follows_history() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let mut design = Design::default();
        let lane = design.add_axis(0, 0)?.lane(Side::Staple);
        let color = |design: &Design, id| {
            design
                .oligo_of(id)
                .and_then(|o| design.oligo(o))
                .map(|o| o.color())
        };
        let palette = |n| Some(design.context().staple_color(n));
        let expected = [palette(0), palette(1), palette(2)];

        let first = design.connect(lane, 0, 4)?;
        let second = design.connect(lane, 10, 14)?;
        assert_eq!(color(&design, first), expected[0]);
        assert_eq!(color(&design, second), expected[1]);

        // Undoing hands the color back.
        design.undo()?;
        let second = design.connect(lane, 10, 14)?;
        assert_eq!(color(&design, second), expected[1]);

        // So does a refused transaction.
        let result = design.atomic("refused", |d| {
            d.connect(lane, 20, 24)?;
            d.split(lane, 30)
        });
        assert!(result.is_err());

        let third = design.connect(lane, 20, 24)?;
        assert_eq!(color(&design, third), expected[2]);

        // Redo replays the same draw.
        design.undo()?;
        design.redo()?;
        assert_eq!(color(&design, third), expected[2]);
        let fourth = design.connect(lane, 30, 34)?;
        assert_eq!(color(&design, fourth), Some(design.context().staple_color(3)));

        Ok(())
    }

    #[test]
    fn test_no_op_is_not_recorded() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let mut design = Design::default();
        let lane = design.add_axis(0, 0)?.lane(Side::Staple);

        design.connect(lane, 0, 9)?;
        let before = design.undo_count();

        design.connect(lane, 2, 5)?;
        assert_eq!(design.undo_count(), before);

        Ok(())
    }
}
