//! Shortest-path search over candidate breakpoints.
//!
//! Breakpoints are given as cumulative base counts in 5' to 3' order. Node `0`
//! is a synthetic start before the first base, node `i` (for `i >= 1`) is the
//! breakpoint at `positions[i - 1]`, and the last node is the terminal.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::autostaple::Params;

/// Gets the cost of one segment.
///
/// Deviations are cubed so that several small deviations beat one large one.
///
/// # Examples
///
/// ```
/// use strandgraph::autostaple::search::cost;
///
/// assert_eq!(cost(35, 35), 0);
/// assert_eq!(cost(33, 35), 8);
/// assert_eq!(cost(40, 35), 125);
/// ```
pub fn cost(length: usize, target: usize) -> u64 {
    (length.abs_diff(target) as u64).pow(3)
}

/// A cheapest way to reach the terminal.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Route {
    /// The total cost.
    cost: u64,

    /// The interior breakpoints taken, as indices into the positions.
    breakpoints: Vec<usize>,
}

impl Route {
    /// Gets the total cost.
    pub fn cost(&self) -> u64 {
        self.cost
    }

    /// Gets the interior breakpoints taken, as indices into the positions.
    pub fn breakpoints(&self) -> &[usize] {
        &self.breakpoints
    }
}

/// An entry in the frontier.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct State {
    /// The cost so far.
    cost: u64,

    /// The node reached.
    node: usize,
}

impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so the heap pops the cheapest, then the earliest node.
        other
            .cost
            .cmp(&self.cost)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Gets the position of a node.
fn position(positions: &[usize], node: usize) -> usize {
    match node {
        0 => 0,
        n => positions[n - 1],
    }
}

/// Finds the cheapest partition of `[0, positions.last()]` into segments
/// whose lengths lie within the bounds of `params`.
///
/// Returns [`None`] if the terminal cannot be reached.
pub fn shortest(positions: &[usize], params: &Params) -> Option<Route> {
    let terminal = positions.len();

    if terminal == 0 {
        return None;
    }

    let mut best = vec![u64::MAX; terminal + 1];
    let mut back = vec![None; terminal + 1];
    let mut frontier = BinaryHeap::new();

    best[0] = 0;
    frontier.push(State { cost: 0, node: 0 });

    while let Some(State { cost: so_far, node }) = frontier.pop() {
        if so_far > best[node] {
            continue;
        }

        if node == terminal {
            let mut breakpoints = Vec::new();
            let mut current = back[terminal];

            while let Some(n) = current.filter(|n| *n != 0) {
                breakpoints.push(n - 1);
                current = back[n];
            }

            breakpoints.reverse();
            return Some(Route {
                cost: so_far,
                breakpoints,
            });
        }

        let from = position(positions, node);

        for next in node + 1..=terminal {
            let length = position(positions, next) - from;

            if length > params.max() {
                break;
            }

            if length < params.min() {
                continue;
            }

            let total = so_far + cost(length, params.target());
            if total < best[next] {
                best[next] = total;
                back[next] = Some(node);
                frontier.push(State {
                    cost: total,
                    node: next,
                });
            }
        }
    }

    None
}

/// Finds the cost of the cheapest partition by trying every admissible one.
///
/// This is exponential in the number of positions and exists to check
/// [`shortest()`].
pub fn exhaustive(positions: &[usize], params: &Params) -> Option<u64> {
    let mut best = None;
    explore(positions, params, 0, 0, &mut best);
    best
}

/// Extends every partition that currently ends at `node`.
fn explore(positions: &[usize], params: &Params, node: usize, cost_so_far: u64, best: &mut Option<u64>) {
    let terminal = positions.len();

    if node == terminal {
        if best.map_or(true, |b| cost_so_far < b) {
            *best = Some(cost_so_far);
        }

        return;
    }

    let from = position(positions, node);

    for next in node + 1..=terminal {
        let length = position(positions, next) - from;

        if length > params.max() {
            break;
        }

        if length >= params.min() {
            explore(
                positions,
                params,
                next,
                cost_so_far + cost(length, params.target()),
                best,
            );
        }
    }
}
