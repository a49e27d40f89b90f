// SPDX-License-Identifier: MIT
//
// Foreground colors for console output.
//
// A closed enum covering the three ways a terminal can be told about
// color: "whatever your default is", the 256-entry indexed palette,
// and 24-bit RGB. The named constants map the sixteen classic console
// colors onto the first sixteen palette slots, so callers that think
// in "red text, cyan text" terms never touch raw indices.
//
// Encoding to escape sequences lives in `ansi` — this module only
// names colors.

use std::fmt;

// ─── Color ───────────────────────────────────────────────────────────────────

/// A foreground color as the terminal understands it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    /// The terminal's ambient default foreground (SGR 39).
    Default,
    /// An entry of the 256-color palette. Indices 0-7 are the classic
    /// colors, 8-15 their bright variants, 16-255 the extended cube.
    Ansi256(u8),
    /// 24-bit true color.
    Rgb(u8, u8, u8),
}

impl Color {
    pub const BLACK: Self = Self::Ansi256(0);
    pub const RED: Self = Self::Ansi256(1);
    pub const GREEN: Self = Self::Ansi256(2);
    pub const YELLOW: Self = Self::Ansi256(3);
    pub const BLUE: Self = Self::Ansi256(4);
    pub const MAGENTA: Self = Self::Ansi256(5);
    pub const CYAN: Self = Self::Ansi256(6);
    pub const GRAY: Self = Self::Ansi256(7);
    pub const DARK_GRAY: Self = Self::Ansi256(8);
    pub const BRIGHT_RED: Self = Self::Ansi256(9);
    pub const BRIGHT_GREEN: Self = Self::Ansi256(10);
    pub const BRIGHT_YELLOW: Self = Self::Ansi256(11);
    pub const BRIGHT_BLUE: Self = Self::Ansi256(12);
    pub const BRIGHT_MAGENTA: Self = Self::Ansi256(13);
    pub const BRIGHT_CYAN: Self = Self::Ansi256(14);
    pub const WHITE: Self = Self::Ansi256(15);

    /// Whether this is the ambient default (no explicit color set).
    #[inline]
    #[must_use]
    pub const fn is_default(self) -> bool {
        matches!(self, Self::Default)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::Default
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => write!(f, "default"),
            Self::Ansi256(idx) => write!(f, "ansi({idx})"),
            Self::Rgb(r, g, b) => write!(f, "rgb({r},{g},{b})"),
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_constants_use_classic_slots() {
        assert_eq!(Color::BLACK, Color::Ansi256(0));
        assert_eq!(Color::GRAY, Color::Ansi256(7));
        assert_eq!(Color::DARK_GRAY, Color::Ansi256(8));
        assert_eq!(Color::WHITE, Color::Ansi256(15));
    }

    #[test]
    fn default_is_default() {
        assert!(Color::Default.is_default());
        assert!(Color::default().is_default());
        assert!(!Color::RED.is_default());
        assert!(!Color::Rgb(0, 0, 0).is_default());
    }

    #[test]
    fn display_formats() {
        assert_eq!(Color::Default.to_string(), "default");
        assert_eq!(Color::CYAN.to_string(), "ansi(6)");
        assert_eq!(Color::Rgb(1, 2, 3).to_string(), "rgb(1,2,3)");
    }

    #[test]
    fn color_is_copy() {
        let a = Color::BLUE;
        let b = a;
        assert_eq!(a, b);
    }
}
