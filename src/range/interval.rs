//! A half-open interval carrying a value.

/// An error related to an interval.
#[derive(Debug, Eq, PartialEq)]
pub enum Error {
    /// The start position equals the end position, which would result in a
    /// zero-sized interval.
    ZeroSizedInterval,

    /// The start position is greater than the end position.
    StartGreaterThanEnd,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::ZeroSizedInterval => write!(
                f,
                "start position equals end position, which is a zero-sized interval"
            ),
            Error::StartGreaterThanEnd => {
                write!(f, "start position cannot be greater than the end position")
            }
        }
    }
}

impl std::error::Error for Error {}

/// A half-open interval `[start, end)` carrying a value.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Interval<T> {
    /// The first position covered by the interval.
    start: usize,

    /// The first position past the interval.
    end: usize,

    /// The value attached to the interval.
    value: T,
}

impl<T> Interval<T> {
    /// Attempts to create a new [`Interval`].
    ///
    /// # Examples
    ///
    /// ```
    /// use strandgraph::range::Interval;
    ///
    /// let interval = Interval::try_new(2, 5, 'a')?;
    /// assert_eq!(interval.len(), 3);
    ///
    /// assert!(Interval::try_new(5, 5, 'a').is_err());
    /// assert!(Interval::try_new(6, 5, 'a').is_err());
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn try_new(start: usize, end: usize, value: T) -> Result<Self, Error> {
        if start == end {
            return Err(Error::ZeroSizedInterval);
        }

        if start > end {
            return Err(Error::StartGreaterThanEnd);
        }

        Ok(Self { start, end, value })
    }

    /// Gets the start position of the interval.
    pub fn start(&self) -> usize {
        self.start
    }

    /// Gets the end position of the interval (exclusive).
    pub fn end(&self) -> usize {
        self.end
    }

    /// Gets the value attached to the interval.
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Consumes self and returns the attached value.
    pub fn into_value(self) -> T {
        self.value
    }

    /// Gets the number of positions covered by the interval.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Returns whether `idx` falls within the interval.
    ///
    /// # Examples
    ///
    /// ```
    /// use strandgraph::range::Interval;
    ///
    /// let interval = Interval::try_new(2, 5, ())?;
    /// assert!(!interval.contains(1));
    /// assert!(interval.contains(2));
    /// assert!(interval.contains(4));
    /// assert!(!interval.contains(5));
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn contains(&self, idx: usize) -> bool {
        self.start <= idx && idx < self.end
    }

    /// Returns whether the interval shares at least one position with
    /// `[start, end)`.
    pub fn overlaps(&self, start: usize, end: usize) -> bool {
        self.start < end && start < self.end
    }

    /// Returns whether `other` begins exactly where this interval ends.
    pub fn abuts(&self, other: &Interval<T>) -> bool {
        self.end == other.start
    }

    /// Replaces the attached value, returning the previous one.
    pub(crate) fn replace_value(&mut self, value: T) -> T {
        std::mem::replace(&mut self.value, value)
    }

    /// Creates an interval with the same value over the provided bounds.
    ///
    /// The bounds are trusted to be non-empty.
    pub(crate) fn with_bounds(&self, start: usize, end: usize) -> Self
    where
        T: Clone,
    {
        debug_assert!(start < end, "interval bounds must be non-empty");

        Self {
            start,
            end,
            value: self.value.clone(),
        }
    }
}

impl<T> std::fmt::Display for Interval<T>
where
    T: std::fmt::Display,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}):{}", self.start, self.end, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_interval() -> Result<(), Box<dyn std::error::Error>> {
        let interval = Interval::try_new(0, 10, "x")?;
        assert_eq!(interval.start(), 0);
        assert_eq!(interval.end(), 10);
        assert_eq!(interval.value(), &"x");
        assert_eq!(interval.len(), 10);
        assert_eq!(interval.to_string(), "[0, 10):x");
        Ok(())
    }

    #[test]
    fn test_invalid_intervals() {
        let err = Interval::try_new(3, 3, ()).unwrap_err();
        assert_eq!(err, Error::ZeroSizedInterval);
        assert_eq!(
            err.to_string(),
            "start position equals end position, which is a zero-sized interval"
        );

        let err = Interval::try_new(4, 3, ()).unwrap_err();
        assert_eq!(err, Error::StartGreaterThanEnd);
    }

    #[test]
    fn test_overlaps_and_abuts() -> Result<(), Box<dyn std::error::Error>> {
        let a = Interval::try_new(0, 4, ())?;
        let b = Interval::try_new(4, 6, ())?;

        assert!(a.abuts(&b));
        assert!(!b.abuts(&a));
        assert!(!a.overlaps(4, 6));
        assert!(a.overlaps(3, 6));

        Ok(())
    }
}
