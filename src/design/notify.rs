//! Change notification.

use std::collections::BTreeSet;

use crate::design::AxisId;

/// Something that wants to know when the bases of an axis change.
///
/// Any `FnMut(AxisId)` closure is an observer.
pub trait Observer {
    /// Called once per touched axis after a commit, undo or redo.
    fn bases_modified(&mut self, axis: AxisId);
}

impl<F> Observer for F
where
    F: FnMut(AxisId),
{
    fn bases_modified(&mut self, axis: AxisId) {
        self(axis)
    }
}

/// The registered observers.
#[derive(Default)]
pub(crate) struct Observers {
    /// Each observer with the axis it watches.
    entries: Vec<(AxisId, Box<dyn Observer>)>,
}

impl std::fmt::Debug for Observers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observers")
            .field("len", &self.entries.len())
            .finish()
    }
}

impl Observers {
    /// Registers an observer for one axis.
    pub(crate) fn register(&mut self, axis: AxisId, observer: Box<dyn Observer>) {
        self.entries.push((axis, observer));
    }

    /// Tells every observer of the given axes, in registration order.
    pub(crate) fn notify(&mut self, axes: &BTreeSet<AxisId>) {
        for (axis, observer) in self.entries.iter_mut() {
            if axes.contains(axis) {
                observer.bases_modified(*axis);
            }
        }
    }
}
