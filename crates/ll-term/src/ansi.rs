// SPDX-License-Identifier: MIT
//
// ANSI escape sequence generation.
//
// Pure functions that write escape sequences to any `impl Write`. No
// state, no decisions about when to emit — the `Console` makes those.
// This module just knows the byte-level encoding of every terminal
// command the library needs.
//
// All cursor positions are 0-indexed in our API and converted to
// 1-indexed for the terminal (ANSI standard uses 1-based coordinates).
//
// All functions return `io::Result` propagated from the underlying
// writer.

use std::io::{self, Write};

use crate::color::Color;

// ─── Cursor ──────────────────────────────────────────────────────────────────

/// Move the cursor to `(col, row)` using the CUP (Cursor Position) sequence.
///
/// Our coordinates are 0-indexed; ANSI CUP is 1-indexed.
#[inline]
pub fn cursor_to(w: &mut impl Write, col: u16, row: u16) -> io::Result<()> {
    write!(w, "\x1b[{};{}H", row + 1, col + 1)
}

/// Request a cursor position report (DSR 6).
///
/// The terminal answers on stdin with `ESC [ row ; col R`, 1-indexed.
#[inline]
pub fn cursor_report(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[6n")
}

// ─── Foreground Color ────────────────────────────────────────────────────────

/// Set the foreground (text) color.
///
/// Uses compact SGR codes for standard colors (30-37, 90-97), the
/// 256-color extended format for palette indices 16-255, and 24-bit
/// true color for RGB.
pub fn fg(w: &mut impl Write, color: Color) -> io::Result<()> {
    match color {
        Color::Default => w.write_all(b"\x1b[39m"),
        Color::Ansi256(idx) => {
            if idx < 8 {
                write!(w, "\x1b[{}m", 30 + u16::from(idx))
            } else if idx < 16 {
                write!(w, "\x1b[{}m", 82 + u16::from(idx))
            } else {
                write!(w, "\x1b[38;5;{idx}m")
            }
        }
        Color::Rgb(r, g, b) => write!(w, "\x1b[38;2;{r};{g};{b}m"),
    }
}

/// Reset all SGR attributes to terminal defaults (SGR 0).
#[inline]
pub fn reset(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[0m")
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn capture(f: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn cursor_to_converts_to_one_indexed() {
        assert_eq!(capture(|w| cursor_to(w, 0, 0)), "\x1b[1;1H");
        assert_eq!(capture(|w| cursor_to(w, 4, 9)), "\x1b[10;5H");
    }

    #[test]
    fn cursor_report_is_dsr_six() {
        assert_eq!(capture(cursor_report), "\x1b[6n");
    }

    #[test]
    fn fg_default() {
        assert_eq!(capture(|w| fg(w, Color::Default)), "\x1b[39m");
    }

    #[test]
    fn fg_classic_colors_use_compact_codes() {
        assert_eq!(capture(|w| fg(w, Color::Ansi256(0))), "\x1b[30m");
        assert_eq!(capture(|w| fg(w, Color::Ansi256(7))), "\x1b[37m");
    }

    #[test]
    fn fg_bright_colors_use_compact_codes() {
        assert_eq!(capture(|w| fg(w, Color::Ansi256(8))), "\x1b[90m");
        assert_eq!(capture(|w| fg(w, Color::Ansi256(15))), "\x1b[97m");
    }

    #[test]
    fn fg_extended_palette() {
        assert_eq!(capture(|w| fg(w, Color::Ansi256(16))), "\x1b[38;5;16m");
        assert_eq!(capture(|w| fg(w, Color::Ansi256(255))), "\x1b[38;5;255m");
    }

    #[test]
    fn fg_true_color() {
        assert_eq!(
            capture(|w| fg(w, Color::Rgb(12, 34, 56))),
            "\x1b[38;2;12;34;56m"
        );
    }

    #[test]
    fn reset_is_sgr_zero() {
        assert_eq!(capture(reset), "\x1b[0m");
    }
}
