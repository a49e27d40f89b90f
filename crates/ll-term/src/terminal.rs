// SPDX-License-Identifier: MIT
//
// The terminal capability: one trait, two implementations.
//
// `Terminal` is the shared capability object every component in this
// library takes by `&mut` — cursor and color state belong to the one
// terminal device, so threading a single exclusive handle through all
// callers is what makes interleaved output a compile-time question
// instead of a runtime race.
//
// `Console` talks to the real device. Interactivity is probed once via
// `isatty`; when there is no interactive device attached (redirected
// output, CI, a pipe), every cursor and color operation degrades to a
// no-op or a fixed default instead of failing — headless operation is
// an expected mode, not an error.
//
// `CaptureTerminal` records the exact operation sequence in memory and
// replays scripted key events, for tests and headless scripting.
//
// Safety: the unix module necessarily uses `unsafe` for termios
// (tcgetattr, tcsetattr), ioctl (TIOCGWINSZ), isatty, poll, and raw fd
// reads. These are the standard POSIX interfaces for terminal control —
// there is no safe alternative. Each unsafe block is minimal.

use std::collections::VecDeque;
use std::io::{self, Write};

use unicode_width::UnicodeWidthStr;

use crate::ansi;
use crate::color::Color;
use crate::input::{Event, Parser};

// ─── Terminal ───────────────────────────────────────────────────────────────

/// The terminal capability consumed by every component in this library.
///
/// Queries degrade rather than fail: on a non-interactive terminal the
/// cursor reads as `(0, 0)`, the window width as `0`, the foreground as
/// [`Color::Default`], and positioning/color writes are skipped.
/// Genuine output errors (a broken pipe under a `write_str`) propagate
/// as `io::Error`.
pub trait Terminal {
    /// True only if cursor and size queries are safe to issue.
    fn is_interactive(&self) -> bool;

    /// Current cursor position as `(column, row)`, 0-indexed.
    ///
    /// `(0, 0)` when no interactive device is attached or the query
    /// fails.
    fn cursor_position(&mut self) -> (u16, u16);

    /// Current cursor column. `0` when not interactive.
    fn cursor_col(&mut self) -> u16 {
        self.cursor_position().0
    }

    /// Current cursor row. `0` when not interactive.
    fn cursor_row(&mut self) -> u16 {
        self.cursor_position().1
    }

    /// Reposition the cursor. No-op when not interactive.
    ///
    /// # Errors
    ///
    /// Returns an error if writing the escape sequence fails.
    fn set_cursor_position(&mut self, col: u16, row: u16) -> io::Result<()>;

    /// Window width in columns. `0` when not queryable.
    fn window_width(&mut self) -> u16;

    /// The ambient foreground color last set through this handle.
    ///
    /// [`Color::Default`] when not interactive.
    fn foreground(&self) -> Color;

    /// Change the ambient foreground color. No-op when not interactive
    /// or when `color` is already active — a redundant SGR sequence is
    /// never emitted.
    ///
    /// # Errors
    ///
    /// Returns an error if writing the escape sequence fails.
    fn set_foreground(&mut self, color: Color) -> io::Result<()>;

    /// Write a string verbatim at the cursor.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying write fails.
    fn write_str(&mut self, s: &str) -> io::Result<()>;

    /// Write a string followed by a line terminator.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying write fails.
    fn write_line(&mut self, s: &str) -> io::Result<()>;

    /// Block until the next key or paste event.
    ///
    /// # Errors
    ///
    /// Returns [`io::ErrorKind::UnexpectedEof`] when input is
    /// exhausted, or any underlying read error.
    fn read_key(&mut self) -> io::Result<Event>;

    /// Write a string in the given color, restoring the ambient
    /// foreground afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying write fails.
    fn write_colored(&mut self, s: &str, color: Color) -> io::Result<()> {
        crate::scoped::with_foreground(self, color, |t| t.write_str(s))
    }
}

// ─── Console ────────────────────────────────────────────────────────────────

/// The real terminal, on the process's stdin/stdout.
///
/// # Example
///
/// ```no_run
/// use ll_term::terminal::{Console, Terminal};
///
/// let mut term = Console::new();
/// term.write_line("hello")?;
/// let (col, row) = term.cursor_position();
/// # Ok::<(), std::io::Error>(())
/// ```
pub struct Console {
    /// Probed once at construction: stdin and stdout are both TTYs.
    interactive: bool,
    /// Foreground color last set through this handle.
    fg: Color,
    /// Incremental input parser fed from raw stdin reads.
    parser: Parser,
    /// Events decoded but not yet handed out by `read_key`.
    pending: VecDeque<Event>,
}

/// How long `read_key` waits before resolving a lone ESC (milliseconds).
const ESC_FLUSH_TIMEOUT_MS: i32 = 10;

/// Poll interval while no bytes are pending (milliseconds).
const IDLE_POLL_TIMEOUT_MS: i32 = 50;

/// How long a cursor position query waits for the terminal's answer
/// (milliseconds). Generous: even a slow ssh round trip fits.
const CURSOR_REPORT_TIMEOUT_MS: i32 = 250;

impl Console {
    /// Create a handle to the process terminal.
    ///
    /// Probes interactivity once: both stdin and stdout must be TTYs
    /// for cursor and color operations to be issued at all.
    #[must_use]
    pub fn new() -> Self {
        Self {
            interactive: sys::stdin_is_tty() && sys::stdout_is_tty(),
            fg: Color::Default,
            parser: Parser::new(),
            pending: VecDeque::new(),
        }
    }

    /// Ask the terminal where its cursor is via a DSR 6 round trip.
    ///
    /// Writes `ESC[6n`, then reads stdin under temporary raw mode until
    /// the `ESC[{row};{col}R` report arrives or the timeout expires.
    /// Any unrelated bytes that arrive around the report (keys the user
    /// typed meanwhile) are fed to the input parser instead of being
    /// dropped.
    fn query_cursor(&mut self) -> Option<(u16, u16)> {
        let _raw = sys::RawModeGuard::enter().ok()?;

        {
            let mut stdout = io::stdout().lock();
            ansi::cursor_report(&mut stdout).ok()?;
            stdout.flush().ok()?;
        }

        let mut buf = Vec::with_capacity(32);
        let mut chunk = [0u8; 256];
        let mut waited = 0;
        while waited < CURSOR_REPORT_TIMEOUT_MS {
            waited += 50;
            if !sys::poll_stdin(50) {
                continue;
            }
            let n = sys::read_stdin(&mut chunk).ok()?;
            if n == 0 {
                return None;
            }
            buf.extend_from_slice(&chunk[..n]);

            if let Some((start, end, col, row)) = find_cursor_report(&buf) {
                // Bytes around the report are real input — keep them.
                let before = self.parser.advance(&buf[..start]);
                self.pending.extend(before);
                let after = self.parser.advance(&buf[end..]);
                self.pending.extend(after);
                return Some((col, row));
            }
        }
        None
    }

    /// Blocking raw-mode read loop used by `read_key` on a TTY.
    fn read_key_interactive(&mut self) -> io::Result<Event> {
        let _raw = sys::RawModeGuard::enter()?;
        let mut chunk = [0u8; 256];

        loop {
            if let Some(event) = self.pending.pop_front() {
                return Ok(event);
            }

            // A short timeout only matters while bytes are pending:
            // that is the window in which a lone ESC must resolve.
            let timeout = if self.parser.has_pending() {
                ESC_FLUSH_TIMEOUT_MS
            } else {
                IDLE_POLL_TIMEOUT_MS
            };
            if !sys::poll_stdin(timeout) {
                if self.parser.has_pending() {
                    self.pending.extend(self.parser.flush());
                }
                continue;
            }

            let n = sys::read_stdin(&mut chunk)?;
            if n == 0 {
                return Err(io::ErrorKind::UnexpectedEof.into());
            }
            self.pending.extend(self.parser.advance(&chunk[..n]));
        }
    }

    /// Blocking cooked-mode read loop for redirected stdin.
    fn read_key_redirected(&mut self) -> io::Result<Event> {
        use std::io::Read;

        let mut chunk = [0u8; 256];
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Ok(event);
            }

            let n = io::stdin().lock().read(&mut chunk)?;
            if n == 0 {
                // No more bytes will ever come — resolve pending ESC now.
                self.pending.extend(self.parser.flush());
                return self
                    .pending
                    .pop_front()
                    .ok_or_else(|| io::ErrorKind::UnexpectedEof.into());
            }
            self.pending.extend(self.parser.advance(&chunk[..n]));
        }
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}

impl Terminal for Console {
    fn is_interactive(&self) -> bool {
        self.interactive
    }

    fn cursor_position(&mut self) -> (u16, u16) {
        if !self.interactive {
            return (0, 0);
        }
        self.query_cursor().unwrap_or((0, 0))
    }

    fn set_cursor_position(&mut self, col: u16, row: u16) -> io::Result<()> {
        if !self.interactive {
            return Ok(());
        }
        let mut stdout = io::stdout().lock();
        ansi::cursor_to(&mut stdout, col, row)?;
        stdout.flush()
    }

    fn window_width(&mut self) -> u16 {
        sys::window_size().map_or(0, |(cols, _rows)| cols)
    }

    fn foreground(&self) -> Color {
        if self.interactive { self.fg } else { Color::Default }
    }

    fn set_foreground(&mut self, color: Color) -> io::Result<()> {
        if !self.interactive || color == self.fg {
            return Ok(());
        }
        {
            let mut stdout = io::stdout().lock();
            ansi::fg(&mut stdout, color)?;
            stdout.flush()?;
        }
        self.fg = color;
        Ok(())
    }

    fn write_str(&mut self, s: &str) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        stdout.write_all(s.as_bytes())?;
        stdout.flush()
    }

    fn write_line(&mut self, s: &str) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        stdout.write_all(s.as_bytes())?;
        stdout.write_all(b"\n")?;
        stdout.flush()
    }

    fn read_key(&mut self) -> io::Result<Event> {
        if let Some(event) = self.pending.pop_front() {
            return Ok(event);
        }
        if self.interactive {
            self.read_key_interactive()
        } else {
            self.read_key_redirected()
        }
    }
}

/// Locate a DSR cursor position report (`ESC [ row ; col R`) in `buf`.
///
/// Returns `(start, end, col, row)` with the report occupying
/// `buf[start..end]` and the position converted to 0-indexed.
fn find_cursor_report(buf: &[u8]) -> Option<(usize, usize, u16, u16)> {
    let mut i = 0;
    while i + 2 < buf.len() {
        if buf[i] != 0x1B || buf[i + 1] != b'[' {
            i += 1;
            continue;
        }

        let mut j = i + 2;
        let mut row: u16 = 0;
        let mut col: u16 = 0;
        let mut current: u16 = 0;
        let mut seen_semicolon = false;
        let mut valid = false;

        while j < buf.len() {
            match buf[j] {
                b @ b'0'..=b'9' => {
                    current = current.saturating_mul(10).saturating_add(u16::from(b - b'0'));
                }
                b';' if !seen_semicolon => {
                    row = current;
                    current = 0;
                    seen_semicolon = true;
                }
                b'R' if seen_semicolon => {
                    col = current;
                    valid = true;
                    break;
                }
                _ => break,
            }
            j += 1;
        }

        if valid && row > 0 && col > 0 {
            return Some((i, j + 1, col - 1, row - 1));
        }
        i += 1;
    }
    None
}

// ─── CaptureTerminal ────────────────────────────────────────────────────────

/// One recorded terminal operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    /// Cursor repositioned to `(column, row)`.
    SetCursor(u16, u16),
    /// Ambient foreground changed.
    SetForeground(Color),
    /// Text written verbatim.
    Write(String),
    /// Text written with a line terminator.
    WriteLine(String),
}

/// An in-memory terminal that records operations and replays scripted
/// input.
///
/// The simulated cursor advances by display width on writes and drops
/// to column 0 of the next row on `write_line`, so anchor and guard
/// behavior can be asserted without a device. Construct it
/// non-interactive with [`headless`](CaptureTerminal::headless) to
/// exercise degraded operation.
pub struct CaptureTerminal {
    interactive: bool,
    width: u16,
    cursor: (u16, u16),
    fg: Color,
    ops: Vec<Op>,
    keys: VecDeque<Event>,
}

impl CaptureTerminal {
    /// An interactive capture terminal, 80 columns wide.
    #[must_use]
    pub fn new() -> Self {
        Self {
            interactive: true,
            width: 80,
            cursor: (0, 0),
            fg: Color::Default,
            ops: Vec::new(),
            keys: VecDeque::new(),
        }
    }

    /// A non-interactive capture terminal (no device attached).
    #[must_use]
    pub fn headless() -> Self {
        Self {
            interactive: false,
            ..Self::new()
        }
    }

    /// Override the reported window width.
    #[must_use]
    pub fn with_width(mut self, width: u16) -> Self {
        self.width = width;
        self
    }

    /// The recorded operation sequence so far.
    #[must_use]
    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    /// Take the recorded operations, leaving the log empty.
    pub fn take_ops(&mut self) -> Vec<Op> {
        std::mem::take(&mut self.ops)
    }

    /// Queue an input event for `read_key`.
    pub fn queue_event(&mut self, event: Event) {
        self.keys.push_back(event);
    }

    /// Queue a plain key press for `read_key`.
    pub fn queue_key(&mut self, code: crate::input::KeyCode) {
        self.queue_event(Event::Key(crate::input::KeyEvent {
            code,
            modifiers: crate::input::Modifiers::empty(),
        }));
    }

    /// Queue one key press per character of `text`.
    pub fn queue_text(&mut self, text: &str) {
        for ch in text.chars() {
            self.queue_key(crate::input::KeyCode::Char(ch));
        }
    }
}

impl Default for CaptureTerminal {
    fn default() -> Self {
        Self::new()
    }
}

impl Terminal for CaptureTerminal {
    fn is_interactive(&self) -> bool {
        self.interactive
    }

    fn cursor_position(&mut self) -> (u16, u16) {
        if self.interactive { self.cursor } else { (0, 0) }
    }

    fn set_cursor_position(&mut self, col: u16, row: u16) -> io::Result<()> {
        if self.interactive {
            self.cursor = (col, row);
            self.ops.push(Op::SetCursor(col, row));
        }
        Ok(())
    }

    fn window_width(&mut self) -> u16 {
        if self.interactive { self.width } else { 0 }
    }

    fn foreground(&self) -> Color {
        if self.interactive { self.fg } else { Color::Default }
    }

    fn set_foreground(&mut self, color: Color) -> io::Result<()> {
        if self.interactive && color != self.fg {
            self.fg = color;
            self.ops.push(Op::SetForeground(color));
        }
        Ok(())
    }

    fn write_str(&mut self, s: &str) -> io::Result<()> {
        #[allow(clippy::cast_possible_truncation)] // Capped by u16::MAX columns.
        let advance = s.width().min(usize::from(u16::MAX)) as u16;
        self.cursor.0 = self.cursor.0.saturating_add(advance);
        self.ops.push(Op::Write(s.to_owned()));
        Ok(())
    }

    fn write_line(&mut self, s: &str) -> io::Result<()> {
        self.ops.push(Op::WriteLine(s.to_owned()));
        self.cursor = (0, self.cursor.1.saturating_add(1));
        Ok(())
    }

    fn read_key(&mut self) -> io::Result<Event> {
        self.keys
            .pop_front()
            .ok_or_else(|| io::ErrorKind::UnexpectedEof.into())
    }
}

// ─── Unix plumbing ──────────────────────────────────────────────────────────

#[cfg(unix)]
mod sys {
    #![allow(unsafe_code)]

    use std::io;

    /// Whether stdin is connected to a terminal.
    pub fn stdin_is_tty() -> bool {
        unsafe { libc::isatty(libc::STDIN_FILENO) != 0 }
    }

    /// Whether stdout is connected to a terminal.
    pub fn stdout_is_tty() -> bool {
        unsafe { libc::isatty(libc::STDOUT_FILENO) != 0 }
    }

    /// Query the terminal size via `ioctl(TIOCGWINSZ)`.
    ///
    /// Returns `None` if stdout is not a terminal or the query fails.
    pub fn window_size() -> Option<(u16, u16)> {
        let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
        let result = unsafe { libc::ioctl(libc::STDOUT_FILENO, libc::TIOCGWINSZ, &mut ws) };

        if result == 0 && ws.ws_col > 0 && ws.ws_row > 0 {
            Some((ws.ws_col, ws.ws_row))
        } else {
            None
        }
    }

    /// Poll stdin for readability with a timeout in milliseconds.
    pub fn poll_stdin(timeout_ms: i32) -> bool {
        let ready = unsafe {
            let mut pfd = libc::pollfd {
                fd: libc::STDIN_FILENO,
                events: libc::POLLIN,
                revents: 0,
            };
            libc::poll(&raw mut pfd, 1, timeout_ms)
        };
        ready > 0
    }

    /// Read available bytes from stdin's file descriptor.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the read fails.
    pub fn read_stdin(buf: &mut [u8]) -> io::Result<usize> {
        let n = unsafe { libc::read(libc::STDIN_FILENO, buf.as_mut_ptr().cast(), buf.len()) };
        if n < 0 {
            return Err(io::Error::last_os_error());
        }
        #[allow(clippy::cast_sign_loss)] // n >= 0 guaranteed above.
        Ok(n as usize)
    }

    /// Raw-mode scope: enters on construction, restores the saved
    /// termios on drop — on normal exit and on panic alike.
    pub struct RawModeGuard {
        original: libc::termios,
    }

    impl RawModeGuard {
        /// Enter raw mode on stdin, saving the current termios.
        ///
        /// # Errors
        ///
        /// Returns the OS error if stdin is not a terminal or the
        /// attributes cannot be changed.
        pub fn enter() -> io::Result<Self> {
            unsafe {
                let mut termios: libc::termios = std::mem::zeroed();
                if libc::tcgetattr(libc::STDIN_FILENO, &raw mut termios) != 0 {
                    return Err(io::Error::last_os_error());
                }

                let original = termios;

                // cfmakeraw equivalent: disable all line processing.
                termios.c_iflag &= !(libc::IGNBRK
                    | libc::BRKINT
                    | libc::PARMRK
                    | libc::ISTRIP
                    | libc::INLCR
                    | libc::IGNCR
                    | libc::ICRNL
                    | libc::IXON);
                termios.c_lflag &=
                    !(libc::ECHO | libc::ECHONL | libc::ICANON | libc::ISIG | libc::IEXTEN);
                termios.c_cflag &= !(libc::CSIZE | libc::PARENB);
                termios.c_cflag |= libc::CS8;

                // VMIN=1, VTIME=0: read() blocks until at least 1 byte.
                termios.c_cc[libc::VMIN] = 1;
                termios.c_cc[libc::VTIME] = 0;

                if libc::tcsetattr(libc::STDIN_FILENO, libc::TCSAFLUSH, &raw const termios) != 0 {
                    return Err(io::Error::last_os_error());
                }

                Ok(Self { original })
            }
        }
    }

    impl Drop for RawModeGuard {
        fn drop(&mut self) {
            unsafe {
                let _ = libc::tcsetattr(libc::STDIN_FILENO, libc::TCSAFLUSH, &raw const self.original);
            }
        }
    }
}

#[cfg(not(unix))]
mod sys {
    use std::io;

    pub fn stdin_is_tty() -> bool {
        false
    }

    pub fn stdout_is_tty() -> bool {
        false
    }

    pub fn window_size() -> Option<(u16, u16)> {
        None
    }

    pub fn poll_stdin(_timeout_ms: i32) -> bool {
        false
    }

    pub fn read_stdin(buf: &mut [u8]) -> io::Result<usize> {
        use std::io::Read;
        io::stdin().lock().read(buf)
    }

    /// Raw mode does not exist off-unix; the guard is a no-op.
    pub struct RawModeGuard;

    impl RawModeGuard {
        pub fn enter() -> io::Result<Self> {
            Err(io::ErrorKind::Unsupported.into())
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
