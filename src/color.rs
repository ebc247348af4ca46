//! Display colors assigned to oligos.

use std::str::FromStr;

/// An error related to the parsing of a color.
#[derive(Debug, Eq, PartialEq)]
pub struct ParseColorError(String);

impl std::fmt::Display for ParseColorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "parse color error: {} is not a valid `#rrggbb` color", self.0)
    }
}

impl std::error::Error for ParseColorError {}

/// A 24-bit RGB color.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Color(u32);

impl Color {
    /// Creates a color from its red, green and blue components.
    ///
    /// # Examples
    ///
    /// ```
    /// use strandgraph::Color;
    ///
    /// let color = Color::rgb(0xcc, 0x00, 0x00);
    /// assert_eq!(color.to_string(), "#cc0000");
    /// ```
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self(((r as u32) << 16) | ((g as u32) << 8) | b as u32)
    }

    /// Gets the packed `0xrrggbb` value.
    pub fn get(&self) -> u32 {
        self.0
    }
}

impl FromStr for Color {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s
            .strip_prefix('#')
            .filter(|hex| hex.len() == 6 && hex.bytes().all(|b| b.is_ascii_hexdigit()))
            .ok_or_else(|| ParseColorError(s.to_string()))?;

        u32::from_str_radix(hex, 16)
            .map(Color)
            .map_err(|_| ParseColorError(s.to_string()))
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:06x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_from_str() -> Result<(), Box<dyn std::error::Error>> {
        let color: Color = "#0066cc".parse()?;
        assert_eq!(color, Color::rgb(0x00, 0x66, 0xcc));
        assert_eq!(color.get(), 0x0066cc);

        let err = "0066cc".parse::<Color>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "parse color error: 0066cc is not a valid `#rrggbb` color"
        );

        assert!("#0066c".parse::<Color>().is_err());
        assert!("#0066cg".parse::<Color>().is_err());

        Ok(())
    }

    #[test]
    fn test_color_display() {
        assert_eq!(Color::rgb(0xf7, 0x93, 0x1e).to_string(), "#f7931e");
        assert_eq!(Color::rgb(0, 0, 0).to_string(), "#000000");
    }
}
