// SPDX-License-Identifier: MIT
//
// Boxed single-line text input.
//
// Draws a double-line box at the cursor position, then runs a blocking
// edit loop over the terminal's key events until Enter: printable
// characters insert at the caret, Backspace/Delete remove around it,
// Home/End/arrows move it, and pasted text is inserted with line
// breaks stripped. The interior is exactly one line — input that would
// not fit between the borders is refused rather than scrolled.
//
// Caret movement and deletion are grapheme-aware, so a combining
// sequence or an emoji behaves as one unit. The caret column is
// computed from display width, which keeps it honest for wide (CJK)
// characters too.
//
// On a non-interactive terminal nothing is drawn; keys are consumed
// until Enter or end of input and the accumulated text is returned.

use std::io;

use ll_term::color::Color;
use ll_term::input::{Event, KeyCode};
use ll_term::scoped::with_foreground;
use ll_term::terminal::Terminal;
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

// ─── Box drawing ────────────────────────────────────────────────────────────

const TOP_LEFT: char = '╔';
const TOP_RIGHT: char = '╗';
const BOTTOM_LEFT: char = '╚';
const BOTTOM_RIGHT: char = '╝';
const HORIZONTAL: char = '═';
const VERTICAL: char = '║';

// ─── TextBox ────────────────────────────────────────────────────────────────

/// A single-line text editor framed in a box.
///
/// # Example
///
/// ```no_run
/// use ll_term::color::Color;
/// use ll_term::terminal::Console;
/// use ll_text::textbox::TextBox;
///
/// let mut term = Console::new();
/// let prompt = TextBox::new(&mut term, 32, Color::CYAN);
/// let name = prompt.read_line(&mut term)?;
/// # Ok::<(), std::io::Error>(())
/// ```
pub struct TextBox {
    /// Total box width in columns, borders included.
    width: u16,
    /// Border color.
    color: Color,
    /// Top-left corner, captured at construction.
    anchor: (u16, u16),
}

impl TextBox {
    /// Create a box anchored at the current cursor position.
    ///
    /// `width` is the total width including both borders; it is
    /// clamped to at least 3 so the interior exists.
    pub fn new<T: Terminal + ?Sized>(term: &mut T, width: u16, color: Color) -> Self {
        Self {
            width: width.max(3),
            color,
            anchor: term.cursor_position(),
        }
    }

    /// Columns available for text between the borders.
    fn interior(&self) -> usize {
        usize::from(self.width) - 2
    }

    /// Draw the box, edit until Enter, and return the entered text.
    ///
    /// The cursor is left on the row below the box. On a
    /// non-interactive terminal nothing is drawn and input is consumed
    /// until Enter or end of input.
    ///
    /// # Errors
    ///
    /// Propagates terminal read and write failures. End of input is
    /// not an error — the text accumulated so far is returned.
    pub fn read_line<T: Terminal + ?Sized>(&self, term: &mut T) -> io::Result<String> {
        if !term.is_interactive() {
            return read_plain(term);
        }

        self.draw_box(term)?;

        let mut buf = String::new();
        let mut caret = 0usize;
        self.draw_text(term, &buf, caret)?;

        loop {
            match term.read_key() {
                Ok(Event::Key(key)) => match key.code {
                    KeyCode::Enter => break,
                    KeyCode::Backspace => {
                        if caret > 0 {
                            let start = prev_boundary(&buf, caret);
                            buf.replace_range(start..caret, "");
                            caret = start;
                        }
                    }
                    KeyCode::Delete => {
                        if caret < buf.len() {
                            let end = next_boundary(&buf, caret);
                            buf.replace_range(caret..end, "");
                        }
                    }
                    KeyCode::Home => caret = 0,
                    KeyCode::End => caret = buf.len(),
                    KeyCode::Left => caret = prev_boundary(&buf, caret),
                    KeyCode::Right => caret = next_boundary(&buf, caret),
                    KeyCode::Char(ch) => {
                        if self.insert_fits(&buf, ch) {
                            buf.insert(caret, ch);
                            caret += ch.len_utf8();
                        }
                    }
                    _ => {}
                },
                Ok(Event::Paste(text)) => {
                    for ch in text.chars().filter(|c| *c != '\n' && *c != '\r') {
                        if self.insert_fits(&buf, ch) {
                            buf.insert(caret, ch);
                            caret += ch.len_utf8();
                        }
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(e),
            }
            self.draw_text(term, &buf, caret)?;
        }

        // Park the cursor on the row below the box.
        let (col, row) = self.anchor;
        term.set_cursor_position(col, row.saturating_add(3))?;
        Ok(buf)
    }

    /// Whether inserting `ch` keeps the text within the interior.
    fn insert_fits(&self, buf: &str, ch: char) -> bool {
        !ch.is_control() && buf.width() + ch.width().unwrap_or(0) <= self.interior()
    }

    /// Paint the three border rows in the box color.
    fn draw_box<T: Terminal + ?Sized>(&self, term: &mut T) -> io::Result<()> {
        let (col, row) = self.anchor;
        let interior = self.interior();

        let top = frame_row(TOP_LEFT, HORIZONTAL, TOP_RIGHT, interior);
        let middle = frame_row(VERTICAL, ' ', VERTICAL, interior);
        let bottom = frame_row(BOTTOM_LEFT, HORIZONTAL, BOTTOM_RIGHT, interior);

        with_foreground(term, self.color, |t| {
            t.set_cursor_position(col, row)?;
            t.write_str(&top)?;
            t.set_cursor_position(col, row + 1)?;
            t.write_str(&middle)?;
            t.set_cursor_position(col, row + 2)?;
            t.write_str(&bottom)
        })
    }

    /// Repaint the interior and place the cursor at the caret.
    fn draw_text<T: Terminal + ?Sized>(&self, term: &mut T, buf: &str, caret: usize) -> io::Result<()> {
        let (col, row) = self.anchor;
        let text_row = row + 1;
        let pad = self.interior().saturating_sub(buf.width());

        term.set_cursor_position(col + 1, text_row)?;
        term.write_str(buf)?;
        if pad > 0 {
            term.write_str(&" ".repeat(pad))?;
        }

        #[allow(clippy::cast_possible_truncation)] // Interior is < u16::MAX.
        let caret_col = col + 1 + buf[..caret].width() as u16;
        term.set_cursor_position(caret_col, text_row)
    }
}

/// One border row: `left`, `fill` repeated across the interior, `right`.
fn frame_row(left: char, fill: char, right: char, interior: usize) -> String {
    let mut row = String::with_capacity(interior + 2);
    row.push(left);
    row.extend(std::iter::repeat_n(fill, interior));
    row.push(right);
    row
}

/// Byte offset of the grapheme boundary before `idx`.
fn prev_boundary(s: &str, idx: usize) -> usize {
    s[..idx].grapheme_indices(true).last().map_or(0, |(i, _)| i)
}

/// Byte offset of the grapheme boundary after `idx`.
fn next_boundary(s: &str, idx: usize) -> usize {
    s[idx..].graphemes(true).next().map_or(idx, |g| idx + g.len())
}

/// Degraded mode: consume input until Enter or end of input.
fn read_plain<T: Terminal + ?Sized>(term: &mut T) -> io::Result<String> {
    let mut buf = String::new();
    loop {
        match term.read_key() {
            Ok(Event::Key(key)) => match key.code {
                KeyCode::Enter => break,
                KeyCode::Backspace => {
                    buf.pop();
                }
                KeyCode::Char(ch) if !ch.is_control() => buf.push(ch),
                _ => {}
            },
            Ok(Event::Paste(text)) => {
                buf.extend(text.chars().filter(|c| *c != '\n' && *c != '\r'));
            }
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e),
        }
    }
    Ok(buf)
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use ll_term::terminal::{CaptureTerminal, Op};
    use pretty_assertions::assert_eq;

    fn boxed(width: u16) -> (CaptureTerminal, TextBox) {
        let mut term = CaptureTerminal::new();
        let tb = TextBox::new(&mut term, width, Color::CYAN);
        (term, tb)
    }

    #[test]
    fn returns_typed_text_on_enter() {
        let (mut term, tb) = boxed(10);
        term.queue_text("hi");
        term.queue_key(KeyCode::Enter);
        assert_eq!(tb.read_line(&mut term).unwrap(), "hi");
    }

    #[test]
    fn draws_the_border_rows() {
        let (mut term, tb) = boxed(6);
        term.queue_key(KeyCode::Enter);
        tb.read_line(&mut term).unwrap();

        let ops = term.take_ops();
        assert!(ops.contains(&Op::Write("╔════╗".into())));
        assert!(ops.contains(&Op::Write("║    ║".into())));
        assert!(ops.contains(&Op::Write("╚════╝".into())));
        assert_eq!(ops.first(), Some(&Op::SetForeground(Color::CYAN)));
    }

    #[test]
    fn backspace_removes_before_the_caret() {
        let (mut term, tb) = boxed(10);
        term.queue_text("ab");
        term.queue_key(KeyCode::Backspace);
        term.queue_text("c");
        term.queue_key(KeyCode::Enter);
        assert_eq!(tb.read_line(&mut term).unwrap(), "ac");
    }

    #[test]
    fn arrows_move_the_insertion_point() {
        let (mut term, tb) = boxed(10);
        term.queue_text("ac");
        term.queue_key(KeyCode::Left);
        term.queue_text("b");
        term.queue_key(KeyCode::Enter);
        assert_eq!(tb.read_line(&mut term).unwrap(), "abc");
    }

    #[test]
    fn home_and_end_jump_to_the_edges() {
        let (mut term, tb) = boxed(10);
        term.queue_text("bc");
        term.queue_key(KeyCode::Home);
        term.queue_text("a");
        term.queue_key(KeyCode::End);
        term.queue_text("d");
        term.queue_key(KeyCode::Enter);
        assert_eq!(tb.read_line(&mut term).unwrap(), "abcd");
    }

    #[test]
    fn delete_removes_at_the_caret() {
        let (mut term, tb) = boxed(10);
        term.queue_text("abc");
        term.queue_key(KeyCode::Home);
        term.queue_key(KeyCode::Delete);
        term.queue_key(KeyCode::Enter);
        assert_eq!(tb.read_line(&mut term).unwrap(), "bc");
    }

    #[test]
    fn input_beyond_the_interior_is_refused() {
        let (mut term, tb) = boxed(5);
        term.queue_text("abcd");
        term.queue_key(KeyCode::Enter);
        assert_eq!(tb.read_line(&mut term).unwrap(), "abc");
    }

    #[test]
    fn wide_characters_count_their_display_width() {
        let (mut term, tb) = boxed(5);
        term.queue_event(Event::Paste("日本".into()));
        term.queue_key(KeyCode::Enter);
        // Interior is 3 columns; the second CJK char needs 2 more.
        assert_eq!(tb.read_line(&mut term).unwrap(), "日");
    }

    #[test]
    fn paste_strips_line_breaks() {
        let (mut term, tb) = boxed(12);
        term.queue_event(Event::Paste("x\r\ny".into()));
        term.queue_key(KeyCode::Enter);
        assert_eq!(tb.read_line(&mut term).unwrap(), "xy");
    }

    #[test]
    fn escape_is_ignored() {
        let (mut term, tb) = boxed(10);
        term.queue_text("a");
        term.queue_key(KeyCode::Escape);
        term.queue_text("b");
        term.queue_key(KeyCode::Enter);
        assert_eq!(tb.read_line(&mut term).unwrap(), "ab");
    }

    #[test]
    fn caret_column_follows_the_text() {
        let (mut term, tb) = boxed(10);
        term.queue_text("a");
        term.queue_key(KeyCode::Enter);
        tb.read_line(&mut term).unwrap();

        // After typing 'a' the cursor sits right after it inside the
        // box: border column + one character.
        assert!(term.ops().contains(&Op::SetCursor(2, 1)));
    }

    #[test]
    fn cursor_parks_below_the_box() {
        let mut term = CaptureTerminal::new();
        term.set_cursor_position(4, 2).unwrap();
        let tb = TextBox::new(&mut term, 8, Color::GRAY);
        term.queue_key(KeyCode::Enter);
        tb.read_line(&mut term).unwrap();

        assert_eq!(term.ops().last(), Some(&Op::SetCursor(4, 5)));
        assert_eq!(term.cursor_position(), (4, 5));
    }

    #[test]
    fn headless_reads_until_enter_without_drawing() {
        let mut term = CaptureTerminal::headless();
        let tb = TextBox::new(&mut term, 10, Color::CYAN);
        term.queue_text("quiet");
        term.queue_key(KeyCode::Enter);

        assert_eq!(tb.read_line(&mut term).unwrap(), "quiet");
        assert!(term.ops().is_empty());
    }

    #[test]
    fn headless_end_of_input_returns_accumulated_text() {
        let mut term = CaptureTerminal::headless();
        let tb = TextBox::new(&mut term, 10, Color::CYAN);
        term.queue_text("ab");

        assert_eq!(tb.read_line(&mut term).unwrap(), "ab");
    }

    #[test]
    fn minimum_width_keeps_an_interior() {
        let mut term = CaptureTerminal::new();
        let tb = TextBox::new(&mut term, 0, Color::CYAN);
        term.queue_text("x");
        term.queue_key(KeyCode::Enter);
        assert_eq!(tb.read_line(&mut term).unwrap(), "x");
    }
}
