//! Breaking long oligos into staples of a preferred length.
//!
//! Every base of a linear oligo that may be cut after becomes a node, and a
//! cut set is a path from the oligo's 5' end to its 3' end in which every hop
//! spans an admissible number of bases. Each hop costs the cube of its
//! distance from the target length, and the cheapest path is found with
//! Dijkstra's algorithm (see [`search`]).
//!
//! ```
//! use strandgraph::Design;
//! use strandgraph::autostaple;
//! use strandgraph::autostaple::Params;
//! use strandgraph::design::Side;
//!
//! let mut design = Design::default();
//! let lane = design.add_axis_with_length(0, 0, 100)?.lane(Side::Staple);
//! let strand = design.connect(lane, 0, 69)?;
//! let oligo = design.oligo_of(strand).ok_or("no oligo")?;
//!
//! let plan = autostaple::run(&mut design, oligo, &Params::default())?;
//! assert_eq!(plan.lengths(), &[35, 35]);
//! assert_eq!(design.bounds(lane), vec![(0, 34), (35, 69)]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use tracing::debug;

use crate::design::Design;
use crate::design::LaneId;
use crate::design::OligoId;
use crate::design::Rejected;
use crate::design::Side;
use crate::design::StrandId;

pub mod nodes;
pub mod search;

pub use nodes::Node;

/// The default preferred staple length.
pub const DEFAULT_TARGET: usize = 35;

/// The default minimum staple length.
pub const DEFAULT_MIN: usize = 30;

/// The default maximum staple length.
pub const DEFAULT_MAX: usize = 40;

/// The default minimum number of bases between a cut and a crossover.
pub const DEFAULT_MIN_LEG: usize = 5;

////////////////////////////////////////////////////////////////////////////////////////
// Errors
////////////////////////////////////////////////////////////////////////////////////////

/// An error related to breaking an oligo.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Error {
    /// The oligo does not exist.
    NoSuchOligo(OligoId),

    /// A strand of the oligo does not exist.
    NoSuchStrand(StrandId),

    /// Circular oligos have no ends to measure from.
    Circular(OligoId),

    /// No cut set keeps every piece within the length bounds.
    NoSolution(OligoId),

    /// Applying a cut was refused.
    Rejected(Rejected),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::NoSuchOligo(id) => write!(f, "no such oligo: {id}"),
            Error::NoSuchStrand(id) => write!(f, "no such strand: {id}"),
            Error::Circular(id) => write!(f, "{id} is circular"),
            Error::NoSolution(id) => write!(f, "no admissible cut set for {id}"),
            Error::Rejected(err) => write!(f, "cut rejected: {err}"),
        }
    }
}

impl std::error::Error for Error {}

/// A [`Result`](std::result::Result) with an [`Error`].
type Result<T> = std::result::Result<T, Error>;

////////////////////////////////////////////////////////////////////////////////////////
// Parameters
////////////////////////////////////////////////////////////////////////////////////////

/// Length preferences for the pieces of a broken oligo.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Params {
    /// The preferred length.
    target: usize,

    /// The shortest admissible length.
    min: usize,

    /// The longest admissible length.
    max: usize,

    /// The fewest bases allowed between a cut and a crossover.
    min_leg: usize,
}

impl Params {
    /// Creates a new [`Params`].
    pub fn new(target: usize, min: usize, max: usize, min_leg: usize) -> Self {
        Self {
            target,
            min,
            max,
            min_leg,
        }
    }

    /// Gets the preferred length.
    pub fn target(&self) -> usize {
        self.target
    }

    /// Gets the shortest admissible length.
    pub fn min(&self) -> usize {
        self.min
    }

    /// Gets the longest admissible length.
    pub fn max(&self) -> usize {
        self.max
    }

    /// Gets the fewest bases allowed between a cut and a crossover.
    pub fn min_leg(&self) -> usize {
        self.min_leg
    }
}

impl Default for Params {
    fn default() -> Self {
        Self::new(DEFAULT_TARGET, DEFAULT_MIN, DEFAULT_MAX, DEFAULT_MIN_LEG)
    }
}

////////////////////////////////////////////////////////////////////////////////////////
// Plans
////////////////////////////////////////////////////////////////////////////////////////

/// A lane split that cuts an oligo.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Cut {
    /// The lane.
    lane: LaneId,

    /// The index handed to [`Design::split()`].
    idx: usize,
}

impl Cut {
    /// Creates a new [`Cut`].
    pub fn new(lane: LaneId, idx: usize) -> Self {
        Self { lane, idx }
    }

    /// Gets the lane.
    pub fn lane(&self) -> LaneId {
        self.lane
    }

    /// Gets the index handed to [`Design::split()`].
    pub fn idx(&self) -> usize {
        self.idx
    }
}

/// The cheapest way to break one oligo.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Plan {
    /// The oligo.
    oligo: OligoId,

    /// The splits, in 5' to 3' order.
    cuts: Vec<Cut>,

    /// The length of each resulting piece, in 5' to 3' order.
    lengths: Vec<usize>,

    /// The total cost.
    cost: u64,
}

impl Plan {
    /// Gets the oligo.
    pub fn oligo(&self) -> OligoId {
        self.oligo
    }

    /// Gets the splits, in 5' to 3' order.
    pub fn cuts(&self) -> &[Cut] {
        &self.cuts
    }

    /// Gets the length of each resulting piece, in 5' to 3' order.
    pub fn lengths(&self) -> &[usize] {
        &self.lengths
    }

    /// Gets the total cost.
    pub fn cost(&self) -> u64 {
        self.cost
    }
}

/// The outcome of breaking every long staple.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Summary {
    /// The plans that were applied.
    applied: Vec<Plan>,

    /// The oligos left alone and why.
    skipped: Vec<(OligoId, Error)>,
}

impl Summary {
    /// Gets the plans that were applied.
    pub fn applied(&self) -> &[Plan] {
        &self.applied
    }

    /// Gets the oligos left alone and why.
    pub fn skipped(&self) -> &[(OligoId, Error)] {
        &self.skipped
    }
}

////////////////////////////////////////////////////////////////////////////////////////
// Operations
////////////////////////////////////////////////////////////////////////////////////////

/// Finds the cheapest way to break an oligo without changing the design.
pub fn plan(design: &Design, oligo: OligoId, params: &Params) -> Result<Plan> {
    let candidates = nodes::breakpoints(design, oligo, params)?;
    let positions = candidates.iter().map(Node::pos).collect::<Vec<_>>();

    let route = search::shortest(&positions, params).ok_or(Error::NoSolution(oligo))?;

    let mut cuts = Vec::new();
    let mut lengths = Vec::new();
    let mut from = 0;

    for node in route.breakpoints().iter().map(|i| &candidates[*i]) {
        cuts.push(nodes::cut(design, node)?);
        lengths.push(node.pos() - from);
        from = node.pos();
    }

    if let Some(total) = positions.last() {
        lengths.push(total - from);
    }

    Ok(Plan {
        oligo,
        cuts,
        lengths,
        cost: route.cost(),
    })
}

/// Breaks an oligo as cheaply as possible.
///
/// All of the splits form one transaction. If no admissible cut set exists,
/// the design is left untouched.
pub fn run(design: &mut Design, oligo: OligoId, params: &Params) -> Result<Plan> {
    let plan = plan(design, oligo, params)?;

    design
        .atomic("autostaple", |d| {
            for cut in plan.cuts() {
                d.split(cut.lane(), cut.idx())?;
            }

            Ok::<_, Rejected>(())
        })
        .map_err(Error::Rejected)?;

    debug!(
        "broke {oligo} into {} pieces at cost {}",
        plan.lengths().len(),
        plan.cost()
    );

    Ok(plan)
}

/// Breaks every linear staple oligo longer than the maximum length.
///
/// The whole pass is one transaction. Oligos without an admissible cut set
/// are reported in the [`Summary`] and left as they are.
pub fn run_all(design: &mut Design, params: &Params) -> Result<Summary> {
    let long = design
        .oligos()
        .filter(|(_, oligo)| !oligo.is_circular())
        .filter(|(_, oligo)| {
            design
                .strand(oligo.head())
                .is_some_and(|s| s.lane().side() == Side::Staple)
        })
        .map(|(id, _)| id)
        .filter(|id| design.oligo_length(*id).is_some_and(|len| len > params.max()))
        .collect::<Vec<_>>();

    design.atomic("autostaple", |d| {
        let mut summary = Summary::default();

        for oligo in long {
            match run(d, oligo, params) {
                Ok(plan) => summary.applied.push(plan),
                Err(err) => {
                    debug!("left {oligo} alone: {err}");
                    summary.skipped.push((oligo, err));
                }
            }
        }

        Ok(summary)
    })
}

/// Finds the cost of the cheapest cut set by trying every admissible one.
///
/// Exponential in the oligo's length; meant for checking [`plan()`] on short
/// oligos.
pub fn brute_force(design: &Design, oligo: OligoId, params: &Params) -> Result<u64> {
    let positions = nodes::breakpoints(design, oligo, params)?
        .iter()
        .map(Node::pos)
        .collect::<Vec<_>>();

    search::exhaustive(&positions, params).ok_or(Error::NoSolution(oligo))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Chains staple strands of the given lengths across consecutive axes.
    fn chain(
        design: &mut Design,
        row: usize,
        lengths: &[usize],
    ) -> std::result::Result<OligoId, Box<dyn std::error::Error>> {
        let mut previous: Option<(LaneId, usize)> = None;
        let mut head = None;

        for (col, length) in lengths.iter().enumerate() {
            let lane = design
                .add_axis_with_length(row, col, 200)?
                .lane(Side::Staple);
            let id = design.connect(lane, 0, length - 1)?;
            let strand = design.strand(id).ok_or("strand")?;
            let (idx5, idx3) = (strand.idx5(), strand.idx3());

            if let Some((from, from_idx)) = previous {
                design.install_crossover(from, from_idx, lane, idx5)?;
            }

            head.get_or_insert(id);
            previous = Some((lane, idx3));
        }

        let head = head.ok_or("empty chain")?;
        Ok(design.oligo_of(head).ok_or("oligo")?)
    }

    #[test]
    fn test_plan_does_not_mutate() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let mut design = Design::default();
        let oligo = chain(&mut design, 0, &[70])?;
        let before = design.undo_count();

        let plan = plan(&design, oligo, &Params::default())?;
        assert_eq!(plan.lengths(), &[35, 35]);
        assert_eq!(plan.cost(), 0);
        assert_eq!(plan.cuts().len(), 1);
        assert_eq!(design.undo_count(), before);

        Ok(())
    }

    #[test]
    fn test_legs_push_cuts_away_from_crossovers() -> std::result::Result<(), Box<dyn std::error::Error>>
    {
        let mut design = Design::default();
        let oligo = chain(&mut design, 0, &[20, 50])?;
        let params = Params::new(35, 30, 40, 16);

        let best = brute_force(&design, oligo, &params)?;
        let plan = run(&mut design, oligo, &params)?;
        assert_eq!(plan.lengths(), &[36, 34]);
        assert_eq!(plan.cost(), 2);
        assert_eq!(plan.cost(), best);

        Ok(())
    }

    #[test]
    fn test_run_is_one_transaction() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let mut design = Design::default();
        let oligo = chain(&mut design, 0, &[60, 60])?;
        let lanes = design
            .axes()
            .map(|(id, _)| id.lane(Side::Staple))
            .collect::<Vec<_>>();
        let before = design.undo_count();

        let plan = run(&mut design, oligo, &Params::default())?;
        assert_eq!(plan.lengths().iter().sum::<usize>(), 120);
        assert!(plan.lengths().iter().all(|len| (30..=40).contains(len)));
        assert_eq!(design.undo_count(), before + 1);
        assert_eq!(design.oligos().count(), plan.lengths().len());
        assert!(design.check().is_ok());

        design.undo()?;
        assert_eq!(design.oligos().count(), 1);
        for lane in lanes {
            assert_eq!(design.bounds(lane), vec![(0, 59)]);
        }

        Ok(())
    }

    #[test]
    fn test_failures() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let mut design = Design::default();
        let short = chain(&mut design, 0, &[25])?;
        let odd = chain(&mut design, 1, &[45])?;

        assert_eq!(
            plan(&design, short, &Params::default()),
            Err(Error::NoSolution(short))
        );
        assert_eq!(
            run(&mut design, odd, &Params::default()),
            Err(Error::NoSolution(odd))
        );
        assert_eq!(
            plan(&design, odd, &Params::new(35, 40, 30, 0)),
            Err(Error::NoSolution(odd))
        );

        // Close a loop between two strands.
        let a = design.add_axis_with_length(2, 0, 20)?.lane(Side::Staple);
        let b = design.add_axis_with_length(2, 1, 20)?.lane(Side::Staple);
        let first = design.connect(a, 0, 9)?;
        design.connect(b, 0, 9)?;
        design.install_crossover(a, 0, b, 0)?;
        design.install_crossover(b, 9, a, 9)?;

        let circular = design.oligo_of(first).ok_or("oligo")?;
        assert_eq!(
            plan(&design, circular, &Params::default()),
            Err(Error::Circular(circular))
        );

        Ok(())
    }

    #[test]
    fn test_run_all() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let mut design = Design::default();
        let long = chain(&mut design, 0, &[70])?;
        let odd = chain(&mut design, 1, &[45])?;
        chain(&mut design, 2, &[20])?;

        let scaffold = design.add_axis_with_length(3, 0, 200)?.lane(Side::Scaffold);
        design.connect(scaffold, 0, 149)?;
        let before = design.undo_count();

        let summary = run_all(&mut design, &Params::default())?;
        assert_eq!(
            summary.applied().iter().map(Plan::oligo).collect::<Vec<_>>(),
            vec![long]
        );
        assert_eq!(summary.skipped(), &[(odd, Error::NoSolution(odd))]);
        assert_eq!(design.bounds(scaffold), vec![(0, 149)]);
        assert_eq!(design.undo_count(), before + 1);

        Ok(())
    }
}
