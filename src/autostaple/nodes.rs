//! Candidate breakpoints along an oligo.

use omics::coordinate::Strand as Polarity;

use crate::autostaple::Cut;
use crate::autostaple::Error;
use crate::autostaple::Params;
use crate::design::Design;
use crate::design::OligoId;
use crate::design::StrandId;

/// A place where an oligo may be cut.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Node {
    /// The number of bases from the 5' end up to and including this base.
    pos: usize,

    /// The strand holding the base.
    strand: StrandId,

    /// The index of the base on its lane.
    idx: usize,

    /// Whether this is the 3'-most base of the oligo.
    terminal: bool,
}

impl Node {
    /// Gets the number of bases from the 5' end up to and including this
    /// base.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Gets the strand holding the base.
    pub fn strand(&self) -> StrandId {
        self.strand
    }

    /// Gets the index of the base on its lane.
    pub fn idx(&self) -> usize {
        self.idx
    }

    /// Gets whether this is the 3'-most base of the oligo.
    pub fn is_terminal(&self) -> bool {
        self.terminal
    }
}

/// Lists the breakpoints of a linear oligo in 5' to 3' order.
///
/// A base yields a breakpoint (a cut just 3' of it) when the next base lies on
/// the same strand, no crossover is closer than the minimum leg length on
/// either side, and at least that many bases remain before the 3' end. The
/// 3'-most base is always listed and is the only terminal node.
pub fn breakpoints(design: &Design, oligo: OligoId, params: &Params) -> Result<Vec<Node>, Error> {
    let walk = design.oligo_strands(oligo).ok_or(Error::NoSuchOligo(oligo))?;

    if walk.is_circular() {
        return Err(Error::Circular(oligo));
    }

    let strands = walk
        .strands()
        .iter()
        .filter_map(|id| design.strand(*id).map(|s| (*id, s)))
        .collect::<Vec<_>>();

    let total = strands.iter().map(|(_, s)| s.len()).sum::<usize>();

    // Positions just 3' of each crossover.
    let crossovers = strands
        .iter()
        .scan(0, |pos, (_, s)| {
            *pos += s.len();
            Some(*pos)
        })
        .filter(|pos| *pos < total)
        .collect::<Vec<_>>();

    let leg = params.min_leg();
    let mut nodes = Vec::new();
    let mut pos = 0;

    for (id, strand) in strands {
        let bases = strand.bases();
        let last = bases.len() - 1;

        for (k, idx) in bases.into_iter().enumerate() {
            pos += 1;

            let terminal = pos == total;
            let admissible = k < last
                && total - pos >= leg
                && crossovers.iter().all(|c| c.abs_diff(pos) >= leg);

            if terminal || admissible {
                nodes.push(Node {
                    pos,
                    strand: id,
                    idx,
                    terminal,
                });
            }
        }
    }

    Ok(nodes)
}

/// Gets the split that cuts the oligo just 3' of a node's base.
pub(crate) fn cut(design: &Design, node: &Node) -> Result<Cut, Error> {
    let strand = design
        .strand(node.strand)
        .ok_or(Error::NoSuchStrand(node.strand))?;

    // Lane splits keep `[low, idx]` together, so the lower of the two bases
    // around the cut is the one to split at.
    let idx = match strand.polarity() {
        Polarity::Positive => node.idx,
        Polarity::Negative => node.idx - 1,
    };

    Ok(Cut::new(strand.lane(), idx))
}
