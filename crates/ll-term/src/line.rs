// SPDX-License-Identifier: MIT
//
// Line clearing and in-place rewriting.
//
// Free functions over any `Terminal` that blank out and re-emit whole
// lines without disturbing the caller's cursor: each one runs inside a
// cursor guard, so the cursor ends up exactly where it started no
// matter which line was touched.
//
// Lines are blanked by overwriting them with spaces up to the window
// width. On a non-interactive terminal the width reads as 0, the
// blanking writes nothing, and only the plain text output goes through.

use std::fmt;
use std::io;

use crate::color::Color;
use crate::scoped::{with_cursor_at, with_foreground};
use crate::terminal::Terminal;

/// Blank `count` lines starting at `start_row`.
///
/// # Errors
///
/// Returns an error if any underlying write fails.
pub fn clear_lines<T: Terminal + ?Sized>(term: &mut T, start_row: u16, count: u16) -> io::Result<()> {
    let blanks = " ".repeat(usize::from(term.window_width()));
    with_cursor_at(term, 0, start_row, |t| {
        for row in start_row..start_row.saturating_add(count) {
            t.set_cursor_position(0, row)?;
            if !blanks.is_empty() {
                t.write_str(&blanks)?;
            }
        }
        Ok(())
    })
}

/// Blank every line from `start_row` through the current cursor row.
///
/// # Errors
///
/// Returns an error if any underlying write fails.
pub fn clear_lines_from<T: Terminal + ?Sized>(term: &mut T, start_row: u16) -> io::Result<()> {
    let current = term.cursor_row();
    let count = current.saturating_sub(start_row).saturating_add(1);
    clear_lines(term, start_row, count)
}

/// Blank the current line from `offset_col` onward and rewrite it with
/// `value`, leaving the cursor where it was.
///
/// # Errors
///
/// Returns an error if any underlying write fails.
pub fn rewrite<T: Terminal + ?Sized>(
    term: &mut T,
    value: impl fmt::Display,
    offset_col: u16,
) -> io::Result<()> {
    let row = term.cursor_row();
    let blanks = " ".repeat(usize::from(term.window_width().saturating_sub(offset_col)));
    let text = value.to_string();
    with_cursor_at(term, offset_col, row, |t| {
        if !blanks.is_empty() {
            t.write_str(&blanks)?;
        }
        t.set_cursor_position(offset_col, row)?;
        t.write_str(&text)
    })
}

/// Rewrite the line `offset_up` rows above the cursor.
///
/// An offset of 1 rewrites the line just above, 2 the one before that,
/// and so on. The cursor is restored afterwards.
///
/// # Errors
///
/// Returns an error if any underlying write fails.
pub fn rewrite_line<T: Terminal + ?Sized>(
    term: &mut T,
    value: impl fmt::Display,
    offset_up: u16,
) -> io::Result<()> {
    let row = term.cursor_row().saturating_sub(offset_up);
    rewrite_line_at(term, row, value)
}

/// Rewrite the line `offset_up` rows above the cursor in `color`.
///
/// # Errors
///
/// Returns an error if any underlying write fails.
pub fn rewrite_line_colored<T: Terminal + ?Sized>(
    term: &mut T,
    value: impl fmt::Display,
    color: Color,
    offset_up: u16,
) -> io::Result<()> {
    with_foreground(term, color, |t| rewrite_line(t, value, offset_up))
}

/// Blank and rewrite the line at an absolute `row`.
///
/// # Errors
///
/// Returns an error if any underlying write fails.
pub fn rewrite_line_at<T: Terminal + ?Sized>(
    term: &mut T,
    row: u16,
    value: impl fmt::Display,
) -> io::Result<()> {
    let blanks = " ".repeat(usize::from(term.window_width()));
    let text = value.to_string();
    with_cursor_at(term, 0, row, |t| {
        if !blanks.is_empty() {
            t.write_str(&blanks)?;
        }
        t.set_cursor_position(0, row)?;
        t.write_line(&text)
    })
}

/// Blank and rewrite the line at an absolute `row` in `color`.
///
/// # Errors
///
/// Returns an error if any underlying write fails.
pub fn rewrite_line_at_colored<T: Terminal + ?Sized>(
    term: &mut T,
    row: u16,
    value: impl fmt::Display,
    color: Color,
) -> io::Result<()> {
    with_foreground(term, color, |t| rewrite_line_at(t, row, value))
}

/// Write `value` at `(col, row)`, leaving the cursor where it was.
///
/// # Errors
///
/// Returns an error if any underlying write fails.
pub fn write_at<T: Terminal + ?Sized>(
    term: &mut T,
    value: impl fmt::Display,
    col: u16,
    row: u16,
) -> io::Result<()> {
    let text = value.to_string();
    with_cursor_at(term, col, row, |t| t.write_str(&text))
}

/// Write `value` at `(col, row)` in `color`, leaving both the cursor
/// and the ambient foreground where they were.
///
/// # Errors
///
/// Returns an error if any underlying write fails.
pub fn write_at_colored<T: Terminal + ?Sized>(
    term: &mut T,
    value: impl fmt::Display,
    col: u16,
    row: u16,
    color: Color,
) -> io::Result<()> {
    let text = value.to_string();
    with_cursor_at(term, col, row, |t| t.write_colored(&text, color))
}

/// Write each item on its own line.
///
/// # Errors
///
/// Returns an error if any underlying write fails.
pub fn write_lines<T, I>(term: &mut T, lines: I) -> io::Result<()>
where
    T: Terminal + ?Sized,
    I: IntoIterator,
    I::Item: fmt::Display,
{
    for line in lines {
        term.write_line(&line.to_string())?;
    }
    Ok(())
}

// ─── Tests ───────────────────────────────────────────────────────────────────
