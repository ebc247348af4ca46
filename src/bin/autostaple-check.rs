//! A binary to check that the `strandgraph` autostaple search finds the
//! cheapest cut set.
//!
//! ```shell
//! cargo run --release --bin=autostaple-check --features=binaries -- -n 500
//! ```
//!
//! It achieves this by carrying out the following:
//!
//! * Randomly generating `n` linear staple oligos whose strands take weighted
//!   random lengths, planning each with [`autostaple::plan()`], and ensuring
//!   the plan's cost matches an exhaustive search over every admissible cut
//!   set ([`autostaple::brute_force()`]).

use anyhow::Context as _;
use anyhow::Result;
use anyhow::bail;
use clap::Parser;
use clap_verbosity_flag::Verbosity;
use rand::Rng;
use rand::rngs::ThreadRng;
use strandgraph::Design;
use strandgraph::autostaple;
use strandgraph::autostaple::Params;
use strandgraph::design::LaneId;
use strandgraph::design::OligoId;
use strandgraph::design::Side;
use tabled::builder::Builder;
use tabled::settings::Alignment;
use tabled::settings::Style;
use tabled::settings::object::Rows;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing_log::AsTrace as _;
use tracing_subscriber::EnvFilter;
use weighted_rand::builder::NewBuilder;
use weighted_rand::builder::WalkerTableBuilder;
use weighted_rand::table::WalkerTable;

/// The strand lengths to draw from.
const STRAND_LENGTHS: &[usize] = &[7, 14, 16, 21, 28, 32, 35, 42];

/// The relative weight of each strand length.
const STRAND_WEIGHTS: &[u32] = &[2, 6, 3, 8, 5, 2, 2, 1];

/// The length of every generated axis.
const AXIS_LENGTH: usize = 64;

/// The longest oligo the exhaustive search is asked to handle.
const MAX_OLIGO_LENGTH: usize = 240;

////////////////////////////////////////////////////////////////////////////////////////
// Generating oligos
////////////////////////////////////////////////////////////////////////////////////////

/// A source of random strand layouts.
#[derive(Debug)]
struct Layouts {
    /// The weighted distribution over [`STRAND_LENGTHS`].
    weights: WalkerTable,

    /// The random number generator.
    rng: ThreadRng,
}

impl Layouts {
    /// Creates a new [`Layouts`].
    fn new() -> Self {
        Self {
            weights: WalkerTableBuilder::new(STRAND_WEIGHTS).build(),
            rng: Default::default(),
        }
    }

    /// Picks strand lengths adding up to a random total of at most `max`.
    ///
    /// Every strand holds at least two bases so that no crossover lands on a
    /// single-base strand.
    fn random_layout(&mut self, max: usize) -> Vec<usize> {
        let total = self.rng.gen_range(2..=max.max(2));
        let mut remaining = total;
        let mut lengths = Vec::new();

        while remaining > 0 {
            let mut length = STRAND_LENGTHS[self.weights.next()].min(remaining);

            if remaining - length == 1 {
                length += 1;
            }

            lengths.push(length);
            remaining -= length;
        }

        lengths
    }
}

/// Lays a chain of staple strands across consecutive axes.
fn build(lengths: &[usize]) -> Result<(Design, OligoId)> {
    let mut design = Design::default();
    let mut previous: Option<(LaneId, usize)> = None;
    let mut head = None;

    for (col, length) in lengths.iter().enumerate() {
        let lane = design
            .add_axis_with_length(0, col, AXIS_LENGTH)?
            .lane(Side::Staple);
        let id = design.connect(lane, 0, length - 1)?;
        let strand = design.strand(id).context("strand was just created")?;
        let (idx5, idx3) = (strand.idx5(), strand.idx3());

        if let Some((from, from_idx)) = previous {
            design.install_crossover(from, from_idx, lane, idx5)?;
        }

        head.get_or_insert(id);
        previous = Some((lane, idx3));
    }

    let oligo = head
        .and_then(|id| design.oligo_of(id))
        .context("layout has no strands")?;

    Ok((design, oligo))
}

////////////////////////////////////////////////////////////////////////////////////////
// Tallies
////////////////////////////////////////////////////////////////////////////////////////

/// The outcome of every trial.
#[derive(Debug, Default)]
struct Tally {
    /// Oligos with an admissible cut set.
    solved: usize,

    /// Oligos without an admissible cut set.
    unsolvable: usize,

    /// Oligos where the search and the exhaustive search disagree.
    mismatched: usize,

    /// The summed cost of every solved oligo.
    cost: u64,
}

////////////////////////////////////////////////////////////////////////////////////////
// Main
////////////////////////////////////////////////////////////////////////////////////////

/// Compares the autostaple search against an exhaustive search.
#[derive(Parser)]
struct Args {
    /// The number of oligos to generate.
    #[arg(short, default_value_t = 1_000)]
    n: usize,

    /// The longest oligo to generate.
    #[arg(short, long, default_value_t = 120)]
    length: usize,

    /// The preferred staple length.
    #[arg(long, default_value_t = autostaple::DEFAULT_TARGET)]
    target: usize,

    /// The shortest admissible staple length.
    #[arg(long, default_value_t = autostaple::DEFAULT_MIN)]
    min: usize,

    /// The longest admissible staple length.
    #[arg(long, default_value_t = autostaple::DEFAULT_MAX)]
    max: usize,

    /// The fewest bases allowed between a cut and a crossover.
    #[arg(long, default_value_t = autostaple::DEFAULT_MIN_LEG)]
    min_leg: usize,

    #[command(flatten)]
    verbose: Verbosity,
}

fn check(args: &Args) -> Result<()> {
    if args.length > MAX_OLIGO_LENGTH {
        bail!(
            "oligos longer than {MAX_OLIGO_LENGTH} bases are too slow to search exhaustively"
        );
    }

    let params = Params::new(args.target, args.min, args.max, args.min_leg);
    let mut layouts = Layouts::new();
    let mut tally = Tally::default();

    for trial in 0..args.n {
        let lengths = layouts.random_layout(args.length);
        let (design, oligo) = build(&lengths)
            .with_context(|| format!("building layout {lengths:?}"))?;

        let planned = autostaple::plan(&design, oligo, &params);
        let exhaustive = autostaple::brute_force(&design, oligo, &params);

        match (planned, exhaustive) {
            (Ok(plan), Ok(best)) if plan.cost() == best => {
                let within = plan
                    .lengths()
                    .iter()
                    .all(|len| (params.min()..=params.max()).contains(len));

                if within {
                    debug!("trial {trial}: {lengths:?} cut into {:?}", plan.lengths());
                    tally.solved += 1;
                    tally.cost += plan.cost();
                } else {
                    error!("trial {trial}: {lengths:?} cut into {:?}", plan.lengths());
                    tally.mismatched += 1;
                }
            }
            (Err(autostaple::Error::NoSolution(_)), Err(autostaple::Error::NoSolution(_))) => {
                debug!("trial {trial}: {lengths:?} has no admissible cut set");
                tally.unsolvable += 1;
            }
            (planned, exhaustive) => {
                error!("trial {trial}: {lengths:?}");
                error!("  ↳ search: {planned:?}");
                error!("  ↳ exhaustive: {exhaustive:?}");
                tally.mismatched += 1;
            }
        }
    }

    let mut builder = Builder::default();
    builder.push_record(["Trials", "Solved", "Unsolvable", "Mismatched", "Total cost"]);
    builder.push_record([
        args.n.to_string(),
        tally.solved.to_string(),
        tally.unsolvable.to_string(),
        tally.mismatched.to_string(),
        tally.cost.to_string(),
    ]);

    let table = builder
        .build()
        .with(Style::rounded())
        .modify(Rows::new(1..), Alignment::right())
        .to_string();

    println!("{table}");

    if tally.mismatched > 0 {
        error!("{} of {} trials disagreed", tally.mismatched, args.n);
        std::process::exit(1);
    }

    info!("all {} trials agreed", args.n);
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    assert!(args.n > 0, "`n` must be greater than 0!");

    match std::env::var("RUST_LOG") {
        Ok(_) => tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .init(),
        Err(_) => tracing_subscriber::fmt()
            .with_max_level(args.verbose.log_level_filter().as_trace())
            .init(),
    };

    check(&args)
}
