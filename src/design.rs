//! The strand graph.
//!
//! A [`Design`] owns every [`Axis`] (virtual helix), every [`Strand`] laid on
//! the axes' lanes, and the [`Oligo`]s formed by following strand links from
//! 5' to 3'. Strands and oligos live in arenas and are referred to by
//! [`StrandId`] and [`OligoId`] handles that are never reused.
//!
//! Every public mutation is a journaled transaction. Operations validate their
//! input before touching anything, and a rejected operation leaves the design
//! exactly as it was. Committed transactions land on the undo stack and wake
//! the [observers](notify::Observer) of every axis they touched.
//!
//! ```
//! use strandgraph::Design;
//! use strandgraph::design::HalfIdx;
//! use strandgraph::design::Side;
//!
//! let mut design = Design::default();
//! let axis = design.add_axis(0, 0)?;
//! let lane = axis.lane(Side::Staple);
//!
//! design.connect(lane, 2, 6)?;
//! design.clear(lane, HalfIdx::whole(4), HalfIdx::whole(4))?;
//! assert_eq!(design.bounds(lane), vec![(2, 3), (5, 6)]);
//!
//! design.undo()?;
//! assert_eq!(design.bounds(lane), vec![(2, 6)]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::collections::BTreeSet;

use tracing::debug;

use crate::Color;
use crate::context::Context;

pub mod axis;
pub mod crossover;
pub mod half;
pub mod history;
pub mod lane;
pub mod notify;
pub mod oligo;
pub mod paint;
pub mod strand;

pub use axis::Axis;
pub use half::HalfIdx;
pub use history::Transaction;
pub use oligo::Oligo;
pub use oligo::Walk;
pub use strand::Decorator;
pub use strand::End;
pub use strand::Strand;

use history::History;
use history::Journal;
use notify::Observer;
use notify::Observers;

////////////////////////////////////////////////////////////////////////////////////////
// Handles
////////////////////////////////////////////////////////////////////////////////////////

/// Defines an opaque arena handle.
macro_rules! handle {
    ($(#[$doc:meta])* $name:ident, $prefix:literal) => {
        $(#[$doc])*
        #[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
        pub struct $name(usize);

        impl $name {
            /// Creates a handle from a raw arena slot.
            pub fn new(slot: usize) -> Self {
                Self(slot)
            }

            /// Gets the raw arena slot.
            pub fn get(&self) -> usize {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}{}", $prefix, self.0)
            }
        }
    };
}

handle!(
    /// A handle to an [`Axis`].
    AxisId,
    "axis:"
);

handle!(
    /// A handle to a [`Strand`].
    StrandId,
    "strand:"
);

handle!(
    /// A handle to an [`Oligo`].
    OligoId,
    "oligo:"
);

/// Which of an axis' two lanes.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Side {
    /// The scaffold lane.
    Scaffold,

    /// The staple lane.
    Staple,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Scaffold => write!(f, "scaffold"),
            Side::Staple => write!(f, "staple"),
        }
    }
}

/// One lane of one axis.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct LaneId {
    /// The axis.
    axis: AxisId,

    /// The side.
    side: Side,
}

impl LaneId {
    /// Creates a lane handle.
    pub fn new(axis: AxisId, side: Side) -> Self {
        Self { axis, side }
    }

    /// Gets the axis.
    pub fn axis(&self) -> AxisId {
        self.axis
    }

    /// Gets the side.
    pub fn side(&self) -> Side {
        self.side
    }
}

impl AxisId {
    /// Gets the handle of one of this axis' lanes.
    pub fn lane(&self, side: Side) -> LaneId {
        LaneId::new(*self, side)
    }
}

impl std::fmt::Display for LaneId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.axis, self.side)
    }
}

////////////////////////////////////////////////////////////////////////////////////////
// Errors
////////////////////////////////////////////////////////////////////////////////////////

/// A reason an operation was refused.
///
/// A refused operation never changes the design.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Rejected {
    /// The axis does not exist.
    NoSuchAxis(AxisId),

    /// The strand does not exist.
    NoSuchStrand(StrandId),

    /// No strand covers the index on the lane.
    NoStrandAt(LaneId, usize),

    /// An axis already occupies the grid coordinate.
    Occupied(usize, usize),

    /// Axes must hold at least one base.
    ZeroLength,

    /// The requested range is empty.
    EmptyRange,

    /// The index is not the expected end of the strand.
    NotAnEnd(StrandId, End, usize),

    /// Crossovers must join two different axes.
    SameAxis(AxisId),

    /// Crossovers must join two lanes of the same side.
    SideMismatch(Side, Side),

    /// The strands are not linked as requested.
    NotLinked(StrandId, StrandId),

    /// The strand has no adjacent lane neighbor to merge with.
    NothingAdjacent(StrandId),

    /// The split index must leave bases on both sides.
    SplitOutOfRange(StrandId, usize),

    /// A single-base strand at a crossover has no room to grow.
    NoRoom(StrandId),

    /// There is no transaction to undo.
    NothingToUndo,

    /// There is no transaction to redo.
    NothingToRedo,

    /// History cannot move while a macro is open.
    MacroOpen,

    /// No macro is open.
    NoMacroOpen,
}

impl std::fmt::Display for Rejected {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rejected::NoSuchAxis(id) => write!(f, "no such axis: {id}"),
            Rejected::NoSuchStrand(id) => write!(f, "no such strand: {id}"),
            Rejected::NoStrandAt(lane, idx) => write!(f, "no strand at {lane} index {idx}"),
            Rejected::Occupied(row, col) => {
                write!(f, "an axis already exists at ({row}, {col})")
            }
            Rejected::ZeroLength => write!(f, "axes must hold at least one base"),
            Rejected::EmptyRange => write!(f, "the requested range is empty"),
            Rejected::NotAnEnd(id, end, idx) => {
                write!(f, "index {idx} is not the {end} end of {id}")
            }
            Rejected::SameAxis(id) => {
                write!(f, "a crossover cannot join {id} to itself")
            }
            Rejected::SideMismatch(a, b) => {
                write!(f, "a crossover cannot join a {a} lane to a {b} lane")
            }
            Rejected::NotLinked(a, b) => write!(f, "{a} is not linked to {b}"),
            Rejected::NothingAdjacent(id) => {
                write!(f, "{id} has no adjacent strand to merge with")
            }
            Rejected::SplitOutOfRange(id, idx) => {
                write!(f, "cannot split {id} after index {idx}")
            }
            Rejected::NoRoom(id) => {
                write!(f, "{id} is a single base and cannot be extended")
            }
            Rejected::NothingToUndo => write!(f, "nothing to undo"),
            Rejected::NothingToRedo => write!(f, "nothing to redo"),
            Rejected::MacroOpen => write!(f, "a macro is open"),
            Rejected::NoMacroOpen => write!(f, "no macro is open"),
        }
    }
}

impl std::error::Error for Rejected {}

/// A broken structural invariant found by [`Design::check()`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Violation {
    /// A lane's interval set is malformed.
    Lane(LaneId, crate::range::Inconsistency),

    /// A lane interval and its strand disagree.
    Geometry(StrandId),

    /// A link is not reciprocated.
    Unreciprocated(StrandId, End),

    /// A link joins two strands on the same axis.
    SameAxisLink(StrandId),

    /// A strand points at an oligo that does not exist.
    Orphaned(StrandId),

    /// Linked strands belong to different oligos.
    SplitOligo(StrandId, StrandId),

    /// An oligo's recorded head or topology is wrong.
    Head(OligoId),
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Violation::Lane(lane, err) => write!(f, "lane {lane}: {err}"),
            Violation::Geometry(id) => write!(f, "{id} disagrees with its lane"),
            Violation::Unreciprocated(id, end) => {
                write!(f, "the {end} link of {id} is not reciprocated")
            }
            Violation::SameAxisLink(id) => write!(f, "{id} is linked within its own axis"),
            Violation::Orphaned(id) => write!(f, "{id} has no oligo"),
            Violation::SplitOligo(a, b) => {
                write!(f, "{a} and {b} are linked but belong to different oligos")
            }
            Violation::Head(id) => write!(f, "{id} records the wrong head"),
        }
    }
}

impl std::error::Error for Violation {}

/// A [`Result`](std::result::Result) with a [`Rejected`].
type Result<T> = std::result::Result<T, Rejected>;

////////////////////////////////////////////////////////////////////////////////////////
// Design
////////////////////////////////////////////////////////////////////////////////////////

/// A DNA origami design.
#[derive(Debug)]
pub struct Design {
    /// The configuration the design was created with.
    context: Context,

    /// The axis arena.
    axes: Vec<Option<Axis>>,

    /// The strand arena.
    strands: Vec<Option<Strand>>,

    /// The number of occupied slots in `strands`.
    live_strands: usize,

    /// The oligo arena.
    oligos: Vec<Option<Oligo>>,

    /// Before-images for the open transactions.
    journal: Journal,

    /// Committed transactions.
    history: History,

    /// Per-axis change listeners.
    observers: Observers,

    /// Strands whose oligo membership must be recomputed.
    dirty: BTreeSet<StrandId>,

    /// Oligos that may have lost every member.
    stale: BTreeSet<OligoId>,

    /// How many staple colors have been drawn from the palette.
    colors_drawn: usize,
}

impl Default for Design {
    fn default() -> Self {
        Self::new(Context::default())
    }
}

impl Design {
    /// Creates an empty design.
    pub fn new(context: Context) -> Self {
        Self {
            context,
            axes: Vec::new(),
            strands: Vec::new(),
            live_strands: 0,
            oligos: Vec::new(),
            journal: Journal::default(),
            history: History::default(),
            observers: Observers::default(),
            dirty: BTreeSet::new(),
            stale: BTreeSet::new(),
            colors_drawn: 0,
        }
    }

    /// Gets the context.
    pub fn context(&self) -> &Context {
        &self.context
    }

    //////////////////////////////////////////////////////////////////////////////////
    // Reads
    //////////////////////////////////////////////////////////////////////////////////

    /// Gets an axis.
    pub fn axis(&self, id: AxisId) -> Option<&Axis> {
        self.axes.get(id.get()).and_then(Option::as_ref)
    }

    /// Iterates over the live axes in creation order.
    pub fn axes(&self) -> impl Iterator<Item = (AxisId, &Axis)> {
        self.axes
            .iter()
            .enumerate()
            .filter_map(|(i, axis)| axis.as_ref().map(|axis| (AxisId::new(i), axis)))
    }

    /// Finds the axis at a grid coordinate.
    pub fn axis_at(&self, row: usize, col: usize) -> Option<AxisId> {
        self.axes()
            .find(|(_, axis)| axis.coordinate() == (row, col))
            .map(|(id, _)| id)
    }

    /// Gets a strand.
    pub fn strand(&self, id: StrandId) -> Option<&Strand> {
        self.strands.get(id.get()).and_then(Option::as_ref)
    }

    /// Iterates over the live strands.
    pub fn strands(&self) -> impl Iterator<Item = (StrandId, &Strand)> {
        self.strands
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|s| (StrandId::new(i), s)))
    }

    /// Gets the number of live strands.
    pub fn strand_count(&self) -> usize {
        self.live_strands
    }

    /// Gets an oligo.
    pub fn oligo(&self, id: OligoId) -> Option<&Oligo> {
        self.oligos.get(id.get()).and_then(Option::as_ref)
    }

    /// Iterates over the live oligos.
    pub fn oligos(&self) -> impl Iterator<Item = (OligoId, &Oligo)> {
        self.oligos
            .iter()
            .enumerate()
            .filter_map(|(i, o)| o.as_ref().map(|o| (OligoId::new(i), o)))
    }

    /// Gets the oligo a strand belongs to.
    pub fn oligo_of(&self, id: StrandId) -> Option<OligoId> {
        self.strand(id).map(|s| s.oligo())
    }

    /// Gets the strand intervals of a lane.
    pub(crate) fn lane_set(&self, lane: LaneId) -> Result<&crate::range::RangeSet<StrandId>> {
        self.axis(lane.axis())
            .map(|axis| axis.lane(lane.side()))
            .ok_or(Rejected::NoSuchAxis(lane.axis()))
    }

    /// Gets a strand or refuses.
    pub(crate) fn require(&self, id: StrandId) -> Result<&Strand> {
        self.strand(id).ok_or(Rejected::NoSuchStrand(id))
    }

    /// Gets the strand covering `idx` on a lane or refuses.
    pub(crate) fn require_at(&self, lane: LaneId, idx: usize) -> Result<StrandId> {
        self.strand_at(lane, idx)
            .ok_or(Rejected::NoStrandAt(lane, idx))
    }

    //////////////////////////////////////////////////////////////////////////////////
    // Axes
    //////////////////////////////////////////////////////////////////////////////////

    /// Adds an axis of the context's default length at a grid coordinate.
    pub fn add_axis(&mut self, row: usize, col: usize) -> Result<AxisId> {
        let length = self.context.default_axis_length();
        self.add_axis_with_length(row, col, length)
    }

    /// Adds an axis at a grid coordinate.
    pub fn add_axis_with_length(&mut self, row: usize, col: usize, length: usize) -> Result<AxisId> {
        if self.axis_at(row, col).is_some() {
            return Err(Rejected::Occupied(row, col));
        }

        if length == 0 {
            return Err(Rejected::ZeroLength);
        }

        self.transact("add axis", |design| {
            let id = AxisId::new(design.axes.len());
            design.journal.remember_axis(id, &None);
            design.axes.push(Some(Axis::new(row, col, length)));
            debug!("added {id} at ({row}, {col}) with {length} bases");
            Ok(id)
        })
    }

    /// Changes the number of bases of an axis.
    ///
    /// Shrinking erases every base at or above the new length on both lanes.
    /// Strands crossing the boundary are cut back to it.
    pub fn resize_axis(&mut self, id: AxisId, length: usize) -> Result<()> {
        let old = self.axis(id).ok_or(Rejected::NoSuchAxis(id))?.length();

        if length == 0 {
            return Err(Rejected::ZeroLength);
        }

        if length == old {
            return Ok(());
        }

        self.transact("resize axis", |design| {
            if length < old {
                for side in [Side::Scaffold, Side::Staple] {
                    design.erase(id.lane(side), length, old, false, false);
                }
            }

            if let Some(axis) = design.axis_mut(id) {
                axis.set_length(length);
            }

            Ok(())
        })
    }

    //////////////////////////////////////////////////////////////////////////////////
    // Observers
    //////////////////////////////////////////////////////////////////////////////////

    /// Registers an observer that is told whenever bases on `axis` change.
    ///
    /// Observers run once per touched axis when a transaction commits, is
    /// undone, or is redone. They never run for a rejected operation.
    pub fn observe(&mut self, axis: AxisId, observer: impl Observer + 'static) {
        self.observers.register(axis, Box::new(observer));
    }

    //////////////////////////////////////////////////////////////////////////////////
    // Consistency
    //////////////////////////////////////////////////////////////////////////////////

    /// Verifies every structural invariant of the graph.
    ///
    /// The lanes must be well formed and agree with their strands, every link
    /// must be reciprocated and cross between axes, and every oligo must be
    /// exactly one connected chain with the correct head.
    pub fn check(&self) -> std::result::Result<(), Violation> {
        for (axis_id, axis) in self.axes() {
            for side in [Side::Scaffold, Side::Staple] {
                let lane = axis_id.lane(side);
                let set = axis.lane(side);
                set.check().map_err(|err| Violation::Lane(lane, err))?;

                for interval in set {
                    let id = *interval.value();
                    let strand = self.strand(id).ok_or(Violation::Geometry(id))?;

                    if strand.lane() != lane
                        || strand.low() != interval.start()
                        || strand.high() + 1 != interval.end()
                        || strand.polarity() != axis.polarity(side)
                    {
                        return Err(Violation::Geometry(id));
                    }
                }
            }
        }

        for (id, strand) in self.strands() {
            let covered = self
                .lane_set(strand.lane())
                .ok()
                .and_then(|set| set.get(strand.low()))
                .map(|interval| *interval.value());

            if covered != Some(id) {
                return Err(Violation::Geometry(id));
            }

            if self.oligo(strand.oligo()).is_none() {
                return Err(Violation::Orphaned(id));
            }

            for end in [End::Five, End::Three] {
                let Some(peer) = strand.link(end) else {
                    continue;
                };

                let other = self
                    .strand(peer)
                    .ok_or(Violation::Unreciprocated(id, end))?;

                if other.link(end.opposite()) != Some(id) {
                    return Err(Violation::Unreciprocated(id, end));
                }

                if other.lane().axis() == strand.lane().axis() {
                    return Err(Violation::SameAxisLink(id));
                }

                if other.oligo() != strand.oligo() {
                    return Err(Violation::SplitOligo(id, peer));
                }
            }
        }

        for (id, oligo) in self.oligos() {
            let walk = self.walk3p(oligo.head()).ok_or(Violation::Head(id))?;

            if walk.is_circular() != oligo.is_circular()
                || self.chain_head(oligo.head()) != Some(oligo.head())
                || walk.strands().iter().any(|s| self.oligo_of(*s) != Some(id))
            {
                return Err(Violation::Head(id));
            }
        }

        Ok(())
    }

    //////////////////////////////////////////////////////////////////////////////////
    // Journaled mutation
    //////////////////////////////////////////////////////////////////////////////////

    /// Gets an axis for mutation, remembering its before-image.
    pub(crate) fn axis_mut(&mut self, id: AxisId) -> Option<&mut Axis> {
        let slot = self.axes.get_mut(id.get())?;
        self.journal.remember_axis(id, slot);
        slot.as_mut()
    }

    /// Gets a strand for mutation, remembering its before-image.
    ///
    /// Unlike [`Self::touch()`], the strand's oligo is left alone.
    pub(crate) fn strand_mut(&mut self, id: StrandId) -> Option<&mut Strand> {
        let slot = self.strands.get_mut(id.get())?;
        self.journal.remember_strand(id, slot);
        slot.as_mut()
    }

    /// Gets a strand for a topology change, queueing its oligo for
    /// reconciliation.
    pub(crate) fn touch(&mut self, id: StrandId) -> Option<&mut Strand> {
        if self.strand(id).is_some() {
            self.dirty.insert(id);
        }

        self.strand_mut(id)
    }

    /// Gets an oligo for mutation, remembering its before-image.
    pub(crate) fn oligo_mut(&mut self, id: OligoId) -> Option<&mut Oligo> {
        let slot = self.oligos.get_mut(id.get())?;
        self.journal.remember_oligo(id, slot);
        slot.as_mut()
    }

    /// Adds a strand to the arena. The caller places it on its lane.
    pub(crate) fn insert_strand(&mut self, strand: Strand) -> StrandId {
        let id = StrandId::new(self.strands.len());
        self.journal.remember_strand(id, &None);
        self.strands.push(Some(strand));
        self.live_strands += 1;
        self.dirty.insert(id);
        id
    }

    /// Drops a strand from the arena. The caller removes it from its lane.
    pub(crate) fn remove_strand(&mut self, id: StrandId) -> Option<Strand> {
        let slot = self.strands.get_mut(id.get())?;
        self.journal.remember_strand(id, slot);
        let strand = slot.take()?;

        self.live_strands -= 1;
        self.dirty.remove(&id);
        self.stale.insert(strand.oligo());
        Some(strand)
    }

    /// Adds an oligo to the arena.
    pub(crate) fn insert_oligo(&mut self, oligo: Oligo) -> OligoId {
        let id = OligoId::new(self.oligos.len());
        self.journal.remember_oligo(id, &None);
        self.oligos.push(Some(oligo));
        id
    }

    /// Drops an oligo from the arena.
    pub(crate) fn remove_oligo(&mut self, id: OligoId) -> Option<Oligo> {
        let slot = self.oligos.get_mut(id.get())?;
        self.journal.remember_oligo(id, slot);
        slot.take()
    }

    /// Creates a single-strand oligo with the next color for its side.
    pub(crate) fn fresh_oligo(&mut self, side: Side) -> OligoId {
        let color = self.next_color(side);

        // The head is fixed up by reconciliation once the strand exists.
        self.insert_oligo(Oligo::new(color, StrandId::new(self.strands.len()), false))
    }

    /// Draws the color for a new oligo.
    pub(crate) fn next_color(&mut self, side: Side) -> Color {
        match side {
            Side::Scaffold => self.context.scaffold_color(),
            Side::Staple => {
                let color = self.context.staple_color(self.colors_drawn);
                self.colors_drawn += 1;
                color
            }
        }
    }

    /// Severs the link at one end of a strand on both sides.
    pub(crate) fn detach(&mut self, id: StrandId, end: End) {
        let Some(peer) = self.strand(id).and_then(|s| s.link(end)) else {
            return;
        };

        if let Some(strand) = self.touch(id) {
            strand.set_link(end, None);
        }

        if let Some(other) = self.touch(peer) {
            if other.link(end.opposite()) == Some(id) {
                other.set_link(end.opposite(), None);
            }
        }
    }

    /// Links the 3' end of `from` to the 5' end of `to`.
    pub(crate) fn attach(&mut self, from: StrandId, to: StrandId) {
        if let Some(strand) = self.touch(from) {
            strand.set_link(End::Three, Some(to));
        }

        if let Some(strand) = self.touch(to) {
            strand.set_link(End::Five, Some(from));
        }
    }

    /// Moves the link at one end of `old` onto the same end of `new`.
    pub(crate) fn relink(&mut self, old: StrandId, new: StrandId, end: End) {
        let Some(peer) = self.strand(old).and_then(|s| s.link(end)) else {
            return;
        };

        if let Some(strand) = self.touch(old) {
            strand.set_link(end, None);
        }

        if let Some(strand) = self.touch(new) {
            strand.set_link(end, Some(peer));
        }

        if let Some(other) = self.touch(peer) {
            other.set_link(end.opposite(), Some(new));
        }
    }

    //////////////////////////////////////////////////////////////////////////////////
    // Transactions
    //////////////////////////////////////////////////////////////////////////////////

    /// Runs `f` as one transaction.
    ///
    /// On success the oligos are reconciled and, at the outermost level, the
    /// transaction is committed. On failure everything `f` changed is rolled
    /// back, including changes made by nested transactions that had already
    /// succeeded.
    pub(crate) fn transact<T, E>(
        &mut self,
        label: &str,
        f: impl FnOnce(&mut Design) -> std::result::Result<T, E>,
    ) -> std::result::Result<T, E> {
        self.journal.open(label, self.colors_drawn);

        match f(self) {
            Ok(value) => {
                self.reconcile();

                if let Some(layer) = self.journal.close() {
                    self.commit(layer);
                }

                Ok(value)
            }
            Err(err) => {
                if let Some(layer) = self.journal.discard() {
                    self.rollback(layer);
                }

                Err(err)
            }
        }
    }

    /// Tells the observers of the given axes that their bases changed.
    fn notify(&mut self, axes: &BTreeSet<AxisId>) {
        self.observers.notify(axes);
    }
}
