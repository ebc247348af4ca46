//! The connectivity token of one base.

use std::num::ParseIntError;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

/// The token for an empty base.
pub const EMPTY: &str = ".";

/// The separator between the low and high side of an occupied base.
pub const SIDE_DELIMITER: char = '|';

/// The separator between the tokens of consecutive bases.
pub const BASE_DELIMITER: char = ' ';

/// Matches a crossover token such as `x3:14`.
static CROSSOVER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^x(\d+):(\d+)$").unwrap());

/// An error associated with parsing a base token.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ParseError {
    /// The token has no side delimiter.
    MissingDelimiter(String),

    /// A side of the token is not a known link.
    InvalidLink(String),

    /// A crossover token names an unparseable number.
    InvalidNumber(ParseIntError),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::MissingDelimiter(s) => {
                write!(f, "missing \"{SIDE_DELIMITER}\" in base token \"{s}\"")
            }
            ParseError::InvalidLink(s) => write!(f, "invalid link: \"{s}\""),
            ParseError::InvalidNumber(err) => write!(f, "invalid crossover: {err}"),
        }
    }
}

impl std::error::Error for ParseError {}

/// What one side of an occupied base connects to.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Link {
    /// Nothing.
    Unconnected,

    /// The base below it on the same strand.
    LeftConnected,

    /// The base above it on the same strand.
    RightConnected,

    /// A base on another axis, by record position and index.
    Crossover {
        /// The position of the other axis's record.
        axis: usize,

        /// The index of the other base.
        idx: usize,
    },
}

impl std::fmt::Display for Link {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Link::Unconnected => write!(f, "-"),
            Link::LeftConnected => write!(f, "<"),
            Link::RightConnected => write!(f, ">"),
            Link::Crossover { axis, idx } => write!(f, "x{axis}:{idx}"),
        }
    }
}

impl FromStr for Link {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "-" => Ok(Link::Unconnected),
            "<" => Ok(Link::LeftConnected),
            ">" => Ok(Link::RightConnected),
            _ => {
                let captures = CROSSOVER
                    .captures(s)
                    .ok_or_else(|| ParseError::InvalidLink(s.into()))?;

                let axis = captures[1].parse().map_err(ParseError::InvalidNumber)?;
                let idx = captures[2].parse().map_err(ParseError::InvalidNumber)?;

                Ok(Link::Crossover { axis, idx })
            }
        }
    }
}

/// The connectivity of one base of a lane.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Base {
    /// No strand covers the base.
    Empty,

    /// A strand covers the base.
    Occupied {
        /// The connection toward lower indices.
        low: Link,

        /// The connection toward higher indices.
        high: Link,
    },
}

impl std::fmt::Display for Base {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Base::Empty => write!(f, "{EMPTY}"),
            Base::Occupied { low, high } => write!(f, "{low}{SIDE_DELIMITER}{high}"),
        }
    }
}

impl FromStr for Base {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == EMPTY {
            return Ok(Base::Empty);
        }

        let (low, high) = s
            .split_once(SIDE_DELIMITER)
            .ok_or_else(|| ParseError::MissingDelimiter(s.into()))?;

        Ok(Base::Occupied {
            low: low.parse()?,
            high: high.parse()?,
        })
    }
}

/// Parses a whole connectivity string.
///
/// # Examples
///
/// ```
/// use strandgraph::codec::base::Base;
/// use strandgraph::codec::base::Link;
/// use strandgraph::codec::base::parse_bases;
///
/// let bases = parse_bases(". -|> <|x1:4")?;
/// assert_eq!(bases.len(), 3);
/// assert_eq!(bases[0], Base::Empty);
/// assert_eq!(
///     bases[2],
///     Base::Occupied {
///         low: Link::LeftConnected,
///         high: Link::Crossover { axis: 1, idx: 4 },
///     }
/// );
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn parse_bases(s: &str) -> Result<Vec<Base>, ParseError> {
    s.split(BASE_DELIMITER)
        .filter(|token| !token.is_empty())
        .map(str::parse)
        .collect()
}

/// Writes bases as a connectivity string.
pub fn format_bases(bases: &[Base]) -> String {
    bases
        .iter()
        .map(|base| base.to_string())
        .collect::<Vec<_>>()
        .join(&BASE_DELIMITER.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_links() -> Result<(), Box<dyn std::error::Error>> {
        assert_eq!("-".parse::<Link>()?, Link::Unconnected);
        assert_eq!("x12:0".parse::<Link>()?, Link::Crossover { axis: 12, idx: 0 });
        assert_eq!(Link::Crossover { axis: 3, idx: 41 }.to_string(), "x3:41");

        assert_eq!(
            "x1".parse::<Link>(),
            Err(ParseError::InvalidLink(String::from("x1")))
        );
        assert!(matches!(
            "x99999999999999999999999:1".parse::<Link>(),
            Err(ParseError::InvalidNumber(_))
        ));

        Ok(())
    }

    #[test]
    fn test_bases() -> Result<(), Box<dyn std::error::Error>> {
        let bases = parse_bases("-|> <|> <|-  .")?;
        assert_eq!(bases.len(), 4);
        assert_eq!(format_bases(&bases), "-|> <|> <|- .");

        assert_eq!(
            "<>".parse::<Base>(),
            Err(ParseError::MissingDelimiter(String::from("<>")))
        );
        assert!(parse_bases("").map(|b| b.is_empty()).unwrap_or(false));

        Ok(())
    }
}
