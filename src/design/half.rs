//! Positions on the half-base grid.

use std::str::FromStr;

/// An error related to the parsing of a [`HalfIdx`].
#[derive(Debug, Eq, PartialEq)]
pub struct ParseHalfIdxError(String);

impl std::fmt::Display for ParseHalfIdxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "parse error: {} is not a whole or half base position",
            self.0
        )
    }
}

impl std::error::Error for ParseHalfIdxError {}

/// A lane position that is either a whole base index or halfway between two.
///
/// Whole index `i` is the left edge of base `i`; `i + 0.5` is its center.
///
/// # Examples
///
/// ```
/// use strandgraph::design::HalfIdx;
///
/// let center = HalfIdx::center(3);
/// assert_eq!(center.to_string(), "3.5");
/// assert_eq!("3.5".parse::<HalfIdx>()?, center);
/// assert!(HalfIdx::whole(4) > center);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct HalfIdx(usize);

impl HalfIdx {
    /// Creates a position from a count of half bases.
    pub fn from_halves(halves: usize) -> Self {
        Self(halves)
    }

    /// Creates the position of the left edge of base `idx`.
    pub fn whole(idx: usize) -> Self {
        Self(idx.saturating_mul(2))
    }

    /// Creates the position of the center of base `idx`.
    pub fn center(idx: usize) -> Self {
        Self(idx.saturating_mul(2).saturating_add(1))
    }

    /// Gets the position as a count of half bases.
    pub fn halves(&self) -> usize {
        self.0
    }

    /// Returns whether the position is a whole index.
    pub fn is_whole(&self) -> bool {
        self.0 % 2 == 0
    }

    /// Gets the base the position falls in.
    pub fn floor(&self) -> usize {
        self.0 / 2
    }
}

impl From<usize> for HalfIdx {
    fn from(idx: usize) -> Self {
        Self::whole(idx)
    }
}

impl std::fmt::Display for HalfIdx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.is_whole() {
            true => write!(f, "{}", self.floor()),
            false => write!(f, "{}.5", self.floor()),
        }
    }
}

impl FromStr for HalfIdx {
    type Err = ParseHalfIdxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let error = || ParseHalfIdxError(s.to_string());

        let (whole, fraction) = match s.split_once('.') {
            Some((whole, fraction)) => (whole, Some(fraction)),
            None => (s, None),
        };

        let idx = whole.parse::<usize>().map_err(|_| error())?;

        match fraction {
            None | Some("0") => Ok(Self::whole(idx)),
            Some("5") => Ok(Self::center(idx)),
            Some(_) => Err(error()),
        }
    }
}
