// SPDX-License-Identifier: MIT
//
// Scoped terminal state — save, change, restore.
//
// Cursor position and ambient foreground color are global to the
// terminal device. Any operation that needs to write "somewhere else"
// (re-render a line above the cursor, paint one value in a different
// color) must put the state back when it is done, or every caller
// after it inherits a misplaced cursor or the wrong color.
//
// The guards here capture the current state on construction, apply the
// requested change, and restore the captured state on drop — on normal
// exit, on `?` early-return, and on panic alike. On a non-interactive
// terminal every step degrades to a no-op (the capability skips the
// writes and answers queries with fixed defaults), but the restore
// still runs.
//
// The guards deref to the underlying terminal, so a guarded block
// keeps operating on the same capability it already holds. They
// compose by nesting; each restores only the state it captured.

use std::io;
use std::ops::{Deref, DerefMut};

use crate::color::Color;
use crate::terminal::Terminal;

// ─── CursorGuard ────────────────────────────────────────────────────────────

/// Moves the cursor for the duration of a scope, then puts it back.
///
/// # Example
///
/// ```
/// use ll_term::scoped::CursorGuard;
/// use ll_term::terminal::{CaptureTerminal, Terminal};
///
/// let mut term = CaptureTerminal::new();
/// let before = term.cursor_position();
/// {
///     let mut at = CursorGuard::move_to(&mut term, 0, 5)?;
///     at.write_str("status")?;
/// }
/// assert_eq!(term.cursor_position(), before);
/// # Ok::<(), std::io::Error>(())
/// ```
#[must_use]
pub struct CursorGuard<'a, T: Terminal + ?Sized> {
    term: &'a mut T,
    saved: (u16, u16),
}

impl<'a, T: Terminal + ?Sized> CursorGuard<'a, T> {
    /// Save the current cursor position and move to `(col, row)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the repositioning write fails. The cursor
    /// has not moved in that case, so there is nothing to restore.
    pub fn move_to(term: &'a mut T, col: u16, row: u16) -> io::Result<Self> {
        let saved = term.cursor_position();
        term.set_cursor_position(col, row)?;
        Ok(Self { term, saved })
    }
}

impl<T: Terminal + ?Sized> Drop for CursorGuard<'_, T> {
    fn drop(&mut self) {
        let (col, row) = self.saved;
        let _ = self.term.set_cursor_position(col, row);
    }
}

impl<T: Terminal + ?Sized> Deref for CursorGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.term
    }
}

impl<T: Terminal + ?Sized> DerefMut for CursorGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        self.term
    }
}

// ─── ColorGuard ─────────────────────────────────────────────────────────────

/// Changes the ambient foreground for the duration of a scope, then
/// puts it back.
#[must_use]
pub struct ColorGuard<'a, T: Terminal + ?Sized> {
    term: &'a mut T,
    saved: Color,
}

impl<'a, T: Terminal + ?Sized> ColorGuard<'a, T> {
    /// Save the current foreground and switch to `color`.
    ///
    /// # Errors
    ///
    /// Returns an error if the color change fails to write. The
    /// ambient color is unchanged in that case.
    pub fn set(term: &'a mut T, color: Color) -> io::Result<Self> {
        let saved = term.foreground();
        term.set_foreground(color)?;
        Ok(Self { term, saved })
    }
}

impl<T: Terminal + ?Sized> Drop for ColorGuard<'_, T> {
    fn drop(&mut self) {
        let _ = self.term.set_foreground(self.saved);
    }
}

impl<T: Terminal + ?Sized> Deref for ColorGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.term
    }
}

impl<T: Terminal + ?Sized> DerefMut for ColorGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        self.term
    }
}

// ─── Closure helpers ────────────────────────────────────────────────────────

/// Run `body` with the cursor at `(col, row)`, restoring the previous
/// position afterwards — whether `body` succeeds or fails.
///
/// # Errors
///
/// Propagates the repositioning error or `body`'s error, in that
/// order. Restoration happens in both cases.
pub fn with_cursor_at<T, R, F>(term: &mut T, col: u16, row: u16, body: F) -> io::Result<R>
where
    T: Terminal + ?Sized,
    F: FnOnce(&mut T) -> io::Result<R>,
{
    let mut guard = CursorGuard::move_to(term, col, row)?;
    body(&mut *guard)
}

/// Run `body` with the foreground set to `color`, restoring the
/// previous color afterwards — whether `body` succeeds or fails.
///
/// # Errors
///
/// Propagates the color-change error or `body`'s error, in that order.
/// Restoration happens in both cases.
pub fn with_foreground<T, R, F>(term: &mut T, color: Color, body: F) -> io::Result<R>
where
    T: Terminal + ?Sized,
    F: FnOnce(&mut T) -> io::Result<R>,
{
    let mut guard = ColorGuard::set(term, color)?;
    body(&mut *guard)
}

// ─── Tests ───────────────────────────────────────────────────────────────────
