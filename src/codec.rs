//! Converting a design to and from its persisted shape.
//!
//! A design persists as one [`AxisRecord`] per axis, in axis order. Each lane
//! of an axis carries a connectivity string with one [`Base`] token per base
//! plus maps of colors, insertions and sequence text keyed by base index.
//! Crossover tokens name the other axis by its position in the record list.
//!
//! ```
//! use strandgraph::Design;
//! use strandgraph::codec;
//! use strandgraph::context::Context;
//! use strandgraph::design::Side;
//!
//! let mut design = Design::default();
//! let lane = design.add_axis_with_length(0, 0, 8)?.lane(Side::Scaffold);
//! design.connect(lane, 2, 4)?;
//!
//! let records = codec::encode(&design);
//! assert_eq!(
//!     records[0].lane(Side::Scaffold).connectivity(),
//!     ". . -|> <|> <|- . . ."
//! );
//!
//! let rebuilt = codec::decode(&records, Context::default())?;
//! assert_eq!(rebuilt.bounds(lane), vec![(2, 4)]);
//! assert_eq!(codec::encode(&rebuilt), records);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use tracing::debug;

use crate::Color;
use crate::context::Context;
use crate::design::AxisId;
use crate::design::Decorator;
use crate::design::Design;
use crate::design::End;
use crate::design::LaneId;
use crate::design::OligoId;
use crate::design::Rejected;
use crate::design::Side;
use crate::design::Strand;
use crate::design::StrandId;

pub mod base;
pub mod record;

pub use base::Base;
pub use base::Link;
pub use base::ParseError;
pub use record::AxisRecord;
pub use record::LaneRecord;

use base::format_bases;
use base::parse_bases;
use record::SKIP;

/// The sides in the order they are written.
const SIDES: [Side; 2] = [Side::Scaffold, Side::Staple];

////////////////////////////////////////////////////////////////////////////////////////
// Errors
////////////////////////////////////////////////////////////////////////////////////////

/// An error associated with rebuilding a design from records.
///
/// Lane positions are given as the position of the axis's record and the side.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Error {
    /// A connectivity string could not be parsed.
    Parse(usize, Side, ParseError),

    /// A connectivity string does not have one token per base.
    LengthMismatch(usize, Side, usize, usize),

    /// A base is joined to a neighbor that is not joined back.
    Broken(usize, Side, usize),

    /// A crossover does not land on the matching end of a strand that points
    /// back.
    Unpaired(usize, Side, usize),

    /// An insertion or sequence is attached to an empty base.
    Unplaced(usize, Side, usize),

    /// An insertion size is below the skip marker.
    InvalidInsertion(usize, Side, usize, isize),

    /// The design refused a record.
    Rejected(Rejected),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Parse(axis, side, err) => {
                write!(f, "invalid connectivity for axis {axis} {side}: {err}")
            }
            Error::LengthMismatch(axis, side, expected, found) => write!(
                f,
                "axis {axis} {side} has {found} base tokens, expected {expected}"
            ),
            Error::Broken(axis, side, idx) => {
                write!(f, "broken backbone at axis {axis} {side} index {idx}")
            }
            Error::Unpaired(axis, side, idx) => {
                write!(f, "unpaired crossover at axis {axis} {side} index {idx}")
            }
            Error::Unplaced(axis, side, idx) => {
                write!(f, "data on empty base at axis {axis} {side} index {idx}")
            }
            Error::InvalidInsertion(axis, side, idx, size) => write!(
                f,
                "invalid insertion of {size} at axis {axis} {side} index {idx}"
            ),
            Error::Rejected(err) => write!(f, "rejected: {err}"),
        }
    }
}

impl std::error::Error for Error {}

/// A [`Result`](std::result::Result) with an [`Error`].
type Result<T> = std::result::Result<T, Error>;

////////////////////////////////////////////////////////////////////////////////////////
// Encoding
////////////////////////////////////////////////////////////////////////////////////////

/// Writes a design as one record per axis.
pub fn encode(design: &Design) -> Vec<AxisRecord> {
    let positions = design
        .axes()
        .enumerate()
        .map(|(position, (id, _))| (id, position))
        .collect::<BTreeMap<_, _>>();

    let mut records = design
        .axes()
        .map(|(id, axis)| {
            let [scaffold, staple] =
                SIDES.map(|side| encode_lane(design, id.lane(side), axis.length(), &positions));
            AxisRecord::new(axis.row(), axis.col(), axis.length(), scaffold, staple)
        })
        .collect::<Vec<_>>();

    for (_, oligo) in design.oligos() {
        let Some(head) = design.strand(oligo.head()) else {
            continue;
        };

        let lane = head.lane();
        if let Some(record) = positions
            .get(&lane.axis())
            .and_then(|position| records.get_mut(*position))
        {
            record
                .lane_mut(lane.side())
                .colors_mut()
                .insert(head.idx5(), oligo.color());
        }
    }

    records
}

/// Writes the bases, insertions and sequence text of one lane.
fn encode_lane(
    design: &Design,
    lane: LaneId,
    length: usize,
    positions: &BTreeMap<AxisId, usize>,
) -> LaneRecord {
    let mut bases = vec![Base::Empty; length];
    let mut insertions = BTreeMap::new();
    let mut sequences = BTreeMap::new();

    let strands = design
        .axis(lane.axis())
        .into_iter()
        .flat_map(|axis| axis.lane(lane.side()))
        .filter_map(|interval| design.strand(*interval.value()));

    for strand in strands {
        for idx in strand.low()..=strand.high() {
            let low = match idx == strand.low() {
                true => end_link(design, strand, strand.low_end(), positions),
                false => Link::LeftConnected,
            };

            let high = match idx == strand.high() {
                true => end_link(design, strand, strand.high_end(), positions),
                false => Link::RightConnected,
            };

            if let Some(base) = bases.get_mut(idx) {
                *base = Base::Occupied { low, high };
            }
        }

        for (idx, decorator) in strand.decorators() {
            let size = match decorator {
                Decorator::Insertion(k) => *k as isize,
                Decorator::Skip => SKIP,
            };

            insertions.insert(*idx, size);
        }

        sequences.extend(strand.sequence().iter().map(|(idx, text)| (*idx, text.clone())));
    }

    LaneRecord::new(format_bases(&bases), BTreeMap::new(), insertions, sequences)
}

/// Gets the token for one end of a strand.
fn end_link(
    design: &Design,
    strand: &Strand,
    end: End,
    positions: &BTreeMap<AxisId, usize>,
) -> Link {
    strand
        .link(end)
        .and_then(|peer| design.strand(peer))
        .and_then(|peer| {
            positions.get(&peer.lane().axis()).map(|axis| Link::Crossover {
                axis: *axis,
                idx: peer.idx(end.opposite()),
            })
        })
        .unwrap_or(Link::Unconnected)
}

////////////////////////////////////////////////////////////////////////////////////////
// Decoding
////////////////////////////////////////////////////////////////////////////////////////

/// A crossover token at a strand end, waiting for its peer to exist.
#[derive(Debug)]
struct Pending {
    /// The strand carrying the token.
    strand: StrandId,

    /// The end of the strand carrying the token.
    end: End,

    /// The record position, side and index of the token.
    at: (usize, Side, usize),

    /// The record position and index the token names.
    to: (usize, usize),
}

/// Splits a lane's tokens into the `(low, high)` bounds of its strands.
///
/// Returns the index of the first inconsistent base on failure.
fn runs(bases: &[Base]) -> std::result::Result<Vec<(usize, usize)>, usize> {
    let mut runs = Vec::new();
    let mut open = None;

    for (idx, base) in bases.iter().enumerate() {
        let (low, high) = match base {
            Base::Empty if open.is_none() => continue,
            Base::Empty => return Err(idx),
            Base::Occupied { low, high } => (*low, *high),
        };

        let start = match (open, low) {
            (Some(start), Link::LeftConnected) => start,
            (None, Link::Unconnected | Link::Crossover { .. }) => idx,
            _ => return Err(idx),
        };

        match high {
            Link::RightConnected => open = Some(start),
            Link::LeftConnected => return Err(idx),
            Link::Unconnected | Link::Crossover { .. } => {
                runs.push((start, idx));
                open = None;
            }
        }
    }

    match open {
        Some(_) => Err(bases.len().saturating_sub(1)),
        None => Ok(runs),
    }
}

/// Rebuilds a design from its records.
///
/// The rebuilt design starts with an empty history.
pub fn decode(records: &[AxisRecord], context: Context) -> Result<Design> {
    let mut design = Design::new(context);
    let mut axes = Vec::with_capacity(records.len());
    let mut lanes = Vec::new();

    for (position, record) in records.iter().enumerate() {
        let id = design
            .add_axis_with_length(record.row(), record.col(), record.length())
            .map_err(Error::Rejected)?;
        axes.push(id);

        for side in SIDES {
            let bases = parse_bases(record.lane(side).connectivity())
                .map_err(|err| Error::Parse(position, side, err))?;

            if bases.len() != record.length() {
                return Err(Error::LengthMismatch(
                    position,
                    side,
                    record.length(),
                    bases.len(),
                ));
            }

            lanes.push((position, side, bases));
        }
    }

    design.atomic("decode", |d| {
        let mut pending = Vec::new();

        for (position, side, bases) in &lanes {
            let (position, side) = (*position, *side);
            let lane = axes[position].lane(side);
            let polarity = d
                .axis(lane.axis())
                .ok_or(Error::Rejected(Rejected::NoSuchAxis(lane.axis())))?
                .polarity(side);

            for (low, high) in runs(bases).map_err(|idx| Error::Broken(position, side, idx))? {
                let id = d.place(lane, polarity, low, high);
                let strand = d.require(id).map_err(Error::Rejected)?;

                let ends = [
                    (strand.low_end(), bases[low], low),
                    (strand.high_end(), bases[high], high),
                ];

                for (end, base, idx) in ends {
                    let link = match (end == strand.low_end(), base) {
                        (true, Base::Occupied { low, .. }) => low,
                        (false, Base::Occupied { high, .. }) => high,
                        (_, Base::Empty) => continue,
                    };

                    if let Link::Crossover { axis, idx: other } = link {
                        pending.push(Pending {
                            strand: id,
                            end,
                            at: (position, side, idx),
                            to: (axis, other),
                        });
                    }
                }
            }

            let record = records[position].lane(side);

            for (&idx, &size) in record.insertions() {
                let decorator = match size {
                    SKIP => Decorator::Skip,
                    0 => continue,
                    k if k > 0 => Decorator::Insertion(k as usize),
                    k => return Err(Error::InvalidInsertion(position, side, idx, k)),
                };

                let id = d
                    .strand_at(lane, idx)
                    .ok_or(Error::Unplaced(position, side, idx))?;

                if let Some(strand) = d.strand_mut(id) {
                    strand.decorators_mut().insert(idx, decorator);
                }
            }

            for (&idx, text) in record.sequences() {
                let id = d
                    .strand_at(lane, idx)
                    .ok_or(Error::Unplaced(position, side, idx))?;

                if let Some(strand) = d.strand_mut(id) {
                    strand.sequence_mut().insert(idx, text.clone());
                }
            }
        }

        // Each link is made from its 3' side and confirmed from its 5' side.
        let peer = |d: &Design, p: &Pending| -> Option<StrandId> {
            let (axis, idx) = p.to;
            let (position, side, _) = p.at;

            if axis == position {
                return None;
            }

            let other = d.strand_at(axes.get(axis)?.lane(side), idx)?;
            (d.strand(other)?.idx(p.end.opposite()) == idx).then_some(other)
        };

        for p in pending.iter().filter(|p| p.end == End::Three) {
            let (position, side, idx) = p.at;
            let target = peer(&*d, p).ok_or(Error::Unpaired(position, side, idx))?;
            d.attach(p.strand, target);
        }

        let tokens = pending
            .iter()
            .map(|p| (p.strand, p.end))
            .collect::<BTreeSet<_>>();

        for p in &pending {
            let (position, side, idx) = p.at;
            let linked = peer(&*d, p).is_some_and(|other| {
                tokens.contains(&(other, p.end.opposite()))
                    && d.strand(p.strand).and_then(|s| s.link(p.end)) == Some(other)
                    && d.strand(other).and_then(|s| s.link(p.end.opposite())) == Some(p.strand)
            });

            if !linked {
                return Err(Error::Unpaired(position, side, idx));
            }
        }

        Ok::<_, Error>(())
    })?;

    let colors = recorded_colors(&design, records, &axes);
    design.atomic("decode colors", |d| {
        for (id, color) in colors {
            if let Some(oligo) = d.oligo_mut(id) {
                oligo.set_color(color);
            }
        }

        Ok::<_, Error>(())
    })?;

    design.clear_history();
    debug!(
        "decoded {} axes with {} strands",
        records.len(),
        design.strand_count()
    );

    Ok(design)
}

/// Finds the recorded color of each oligo at the 5' end of any of its
/// strands.
fn recorded_colors(
    design: &Design,
    records: &[AxisRecord],
    axes: &[AxisId],
) -> Vec<(OligoId, Color)> {
    let positions = axes
        .iter()
        .enumerate()
        .map(|(position, id)| (*id, position))
        .collect::<BTreeMap<_, _>>();

    design
        .oligos()
        .filter_map(|(id, _)| {
            let walk = design.oligo_strands(id)?;
            let color = walk.strands().iter().find_map(|member| {
                let strand = design.strand(*member)?;
                let lane = strand.lane();
                let record = records.get(*positions.get(&lane.axis())?)?;
                record.lane(lane.side()).colors().get(&strand.idx5()).copied()
            })?;

            Some((id, color))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use crate::context::SCAFFOLD_COLOR;

    use super::*;

    fn scaffold_pair() -> std::result::Result<(Design, LaneId, LaneId), Box<dyn std::error::Error>> {
        let mut design = Design::default();
        let a = design.add_axis_with_length(0, 0, 8)?.lane(Side::Scaffold);
        let b = design.add_axis_with_length(0, 1, 8)?.lane(Side::Scaffold);

        // The even scaffold runs upward, the odd one downward.
        design.connect(a, 0, 3)?;
        design.connect(b, 0, 3)?;
        design.install_crossover(a, 3, b, 3)?;

        Ok((design, a, b))
    }

    #[test]
    fn test_encode_crossover() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let (design, ..) = scaffold_pair()?;
        let records = encode(&design);

        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0].lane(Side::Scaffold).connectivity(),
            "-|> <|> <|> <|x1:3 . . . ."
        );
        assert_eq!(
            records[1].lane(Side::Scaffold).connectivity(),
            "-|> <|> <|> <|x0:3 . . . ."
        );
        assert_eq!(records[0].lane(Side::Staple).connectivity(), ". . . . . . . .");
        assert_eq!(
            records[0].lane(Side::Scaffold).colors(),
            &BTreeMap::from([(0, SCAFFOLD_COLOR)])
        );
        assert!(records[1].lane(Side::Scaffold).colors().is_empty());

        Ok(())
    }

    #[test]
    fn test_round_trip() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let (mut design, a, b) = scaffold_pair()?;
        let staple = a.axis().lane(Side::Staple);

        design.decorate(a, 1, Decorator::Insertion(2))?;
        design.decorate(b, 2, Decorator::Skip)?;
        design.apply_sequence(a, 0, "ACGTACGTAC")?;
        design.connect(staple, 0, 2)?;
        design.connect(staple, 3, 5)?;
        design.split(staple, 3)?;
        design.apply_color(staple, 5, Color::rgb(1, 2, 3))?;

        let records = encode(&design);
        let rebuilt = decode(&records, Context::default())?;

        assert_eq!(encode(&rebuilt), records);
        assert!(rebuilt.check().is_ok());
        assert!(!rebuilt.can_undo());

        for lane in [a, b, staple] {
            assert_eq!(rebuilt.bounds(lane), design.bounds(lane));
        }

        let sequences = |d: &Design| {
            let mut all = d
                .oligos()
                .filter_map(|(id, _)| d.oligo_sequence(id))
                .collect::<Vec<_>>();
            all.sort();
            all
        };
        assert_eq!(sequences(&rebuilt), sequences(&design));

        Ok(())
    }

    #[test]
    fn test_round_trip_circular() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let (mut design, a, b) = scaffold_pair()?;
        design.install_crossover(b, 0, a, 0)?;

        let records = encode(&design);
        let rebuilt = decode(&records, Context::default())?;

        assert_eq!(encode(&rebuilt), records);
        assert!(rebuilt.oligos().all(|(_, o)| o.is_circular()));

        Ok(())
    }

    fn records(scaffold: &str) -> Vec<AxisRecord> {
        vec![AxisRecord::new(
            0,
            0,
            4,
            LaneRecord::new(scaffold.into(), BTreeMap::new(), BTreeMap::new(), BTreeMap::new()),
            LaneRecord::new(". . . .".into(), BTreeMap::new(), BTreeMap::new(), BTreeMap::new()),
        )]
    }

    #[test]
    fn test_decode_errors() {
        let cases = [
            ("-|> . . .", Error::Broken(0, Side::Scaffold, 1)),
            (". <|- . .", Error::Broken(0, Side::Scaffold, 1)),
            (". . . -|>", Error::Broken(0, Side::Scaffold, 3)),
            (". . .", Error::LengthMismatch(0, Side::Scaffold, 4, 3)),
            ("x0:2|- . . .", Error::Unpaired(0, Side::Scaffold, 0)),
        ];

        for (connectivity, expected) in cases {
            assert_eq!(
                decode(&records(connectivity), Context::default()).err(),
                Some(expected)
            );
        }

        assert!(matches!(
            decode(&records("?|- . . ."), Context::default()),
            Err(Error::Parse(0, Side::Scaffold, _))
        ));

        let misplaced = vec![AxisRecord::new(
            0,
            0,
            4,
            LaneRecord::new(
                "-|- . . .".into(),
                BTreeMap::new(),
                BTreeMap::from([(2, 1)]),
                BTreeMap::new(),
            ),
            LaneRecord::new(". . . .".into(), BTreeMap::new(), BTreeMap::new(), BTreeMap::new()),
        )];
        assert_eq!(
            decode(&misplaced, Context::default()).err(),
            Some(Error::Unplaced(0, Side::Scaffold, 2))
        );
    }

    #[test]
    fn test_one_sided_crossover_is_rejected() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let (design, ..) = scaffold_pair()?;
        let mut records = encode(&design);

        // Drop the 5' side of the crossover.
        records[1] = AxisRecord::new(
            0,
            1,
            8,
            LaneRecord::new(
                "-|> <|> <|> <|- . . . .".into(),
                BTreeMap::new(),
                BTreeMap::new(),
                BTreeMap::new(),
            ),
            records[1].lane(Side::Staple).clone(),
        );

        assert_eq!(
            decode(&records, Context::default()).err(),
            Some(Error::Unpaired(0, Side::Scaffold, 3))
        );

        Ok(())
    }
}
