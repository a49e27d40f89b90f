// SPDX-License-Identifier: MIT
//
// ll-term — terminal capability layer for liveline.
//
// A thin, honest wrapper over the character-grid display: where the
// cursor is, what color text comes out in, and how to put both back
// the way they were. Everything above this crate composes three ideas:
//
//   - a `Terminal` capability trait with a real `Console` behind it,
//     degrading silently when no interactive device is attached;
//   - scoped guards that save cursor/color state, apply a temporary
//     change, and restore on every exit path;
//   - line helpers that blank and rewrite single lines in place.
//
// There is no TUI framework underneath: the crate speaks ANSI and
// termios directly, emits only the escape sequences it needs, and
// degrades to plain writes the moment output is redirected.

pub mod ansi;
pub mod color;
pub mod input;
pub mod line;
pub mod scoped;
pub mod terminal;

pub use color::Color;
pub use input::{Event, KeyCode, KeyEvent, Modifiers};
pub use scoped::{ColorGuard, CursorGuard, with_cursor_at, with_foreground};
pub use terminal::{CaptureTerminal, Console, Op, Terminal};
