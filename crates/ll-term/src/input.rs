// SPDX-License-Identifier: MIT
//
// Terminal input parser.
//
// Turns raw stdin bytes into structured events: keys and paste content.
// Handles the protocols this library actually reads:
//
// - Legacy CSI sequences (arrows, Home/End, editing keys)
// - SS3 sequences (arrow and Home/End alternate encoding)
// - Bracketed paste (accumulates pasted text between delimiters)
// - Alt+key (ESC followed by a printable character)
// - UTF-8 multi-byte characters
//
// The parser maintains a small internal byte buffer because escape
// sequences can span multiple `read()` calls. Feed bytes with
// [`Parser::advance`], retrieve events from the returned `Vec`. After
// a timeout with no new bytes, call [`Parser::flush`] to emit any
// pending lone ESC as a real Escape keypress.
//
// Number parsing is done directly on `&[u8]` — no intermediate
// `String` allocation for CSI parameter decoding.

use bitflags::bitflags;

// ─── Event Types ────────────────────────────────────────────────────────────

/// A parsed terminal input event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A keyboard event.
    Key(KeyEvent),
    /// Bracketed paste content.
    ///
    /// The terminal wraps clipboard paste with `CSI 200~` / `CSI 201~`
    /// delimiters. We accumulate the raw bytes between them and deliver
    /// the result as a single event, so pasted text is never mistaken
    /// for typed keys.
    Paste(String),
}

/// A keyboard event with key identity and modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    /// Which key was pressed.
    pub code: KeyCode,
    /// Active modifier keys (Shift, Alt, Ctrl).
    pub modifiers: Modifiers,
}

/// Identity of a key.
///
/// Named keys have dedicated variants; printable characters use
/// [`Char`](KeyCode::Char).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCode {
    /// A Unicode character (printable).
    Char(char),
    // ── Named keys ──────────────────────────────────────────────
    Enter,
    Tab,
    Backspace,
    Escape,
    Delete,
    // ── Navigation ──────────────────────────────────────────────
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
}

bitflags! {
    /// Keyboard modifier flags.
    ///
    /// Matches the xterm CSI modifier encoding (`param = 1 + bitmask`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct Modifiers: u8 {
        const SHIFT = 0b0000_0001;
        const ALT   = 0b0000_0010;
        const CTRL  = 0b0000_0100;
    }
}

// ─── Parser ─────────────────────────────────────────────────────────────────

/// Bracketed paste opening delimiter: `ESC [ 200 ~`
const PASTE_START: &[u8] = b"\x1b[200~";
/// Bracketed paste closing delimiter: `ESC [ 201 ~`
const PASTE_END: &[u8] = b"\x1b[201~";

/// Terminal input parser.
///
/// Feed raw bytes via [`advance`](Parser::advance) and collect
/// structured [`Event`]s. The parser buffers incomplete sequences
/// internally and resumes parsing when more bytes arrive.
///
/// # Escape vs escape-sequence ambiguity
///
/// A bare `ESC` byte (0x1B) could be either a standalone Escape
/// keypress or the start of a multi-byte escape sequence. The parser
/// keeps a lone ESC pending. The caller should wait a short timeout
/// (~10ms) and then call [`flush`](Parser::flush) to emit the pending
/// ESC as a real Escape key event.
pub struct Parser {
    /// Accumulated raw bytes waiting to be parsed.
    buf: Vec<u8>,
    /// When `true`, we're inside a bracketed paste and accumulating
    /// raw bytes until the closing delimiter arrives.
    in_paste: bool,
}

impl Parser {
    /// Create a new parser with an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buf: Vec::with_capacity(64),
            in_paste: false,
        }
    }

    /// Feed raw bytes from stdin and return all events that can be parsed.
    ///
    /// Bytes that form an incomplete sequence are kept in the internal
    /// buffer and will be combined with future calls. Call
    /// [`flush`](Parser::flush) after a timeout to emit any pending
    /// lone ESC.
    pub fn advance(&mut self, data: &[u8]) -> Vec<Event> {
        self.buf.extend_from_slice(data);
        let mut events = Vec::new();
        let mut pos = 0;

        while pos < self.buf.len() {
            // ── Paste mode: scan for closing delimiter ──────────────
            if self.in_paste {
                let remaining = &self.buf[pos..];
                if let Some(end_offset) = find_subsequence(remaining, PASTE_END) {
                    let text = String::from_utf8_lossy(&remaining[..end_offset]).into_owned();
                    events.push(Event::Paste(text));
                    pos += end_offset + PASTE_END.len();
                    self.in_paste = false;
                } else {
                    // Delimiter not yet found — keep all bytes pending.
                    break;
                }
                continue;
            }

            // ── Paste start: check before general parsing ───────────
            // Detected here so `parse_csi` never sees it.
            let remaining = &self.buf[pos..];
            if remaining.len() >= PASTE_START.len()
                && remaining[..PASTE_START.len()] == *PASTE_START
            {
                self.in_paste = true;
                pos += PASTE_START.len();
                continue;
            }
            // A shorter prefix of the paste delimiter might still grow
            // into it — stall only if the bytes match exactly.
            if remaining.len() < PASTE_START.len()
                && PASTE_START.starts_with(remaining)
                && remaining.starts_with(b"\x1b[")
            {
                break;
            }

            // ── Normal parsing ──────────────────────────────────────
            match try_parse(&self.buf, pos) {
                Parsed::Event(event, consumed) => {
                    events.push(event);
                    pos += consumed;
                }
                Parsed::Incomplete => break,
                Parsed::Skip(n) => pos += n,
            }
        }

        // Compact: remove consumed bytes, keep unconsumed remainder.
        if pos > 0 {
            self.buf.drain(..pos);
        }

        events
    }

    /// Are there unconsumed bytes that might complete with more data?
    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.buf.is_empty()
    }

    /// Flush pending bytes as literal key events.
    ///
    /// Called after a timeout (typically ~10ms) to resolve the ESC
    /// ambiguity: a lone ESC byte becomes an Escape key event, and any
    /// other leftover bytes become `Char` events.
    pub fn flush(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        for &byte in &self.buf {
            let code = match byte {
                0x1B => KeyCode::Escape,
                0x00 => KeyCode::Char('@'),
                b @ 0x01..=0x1A => KeyCode::Char((b + b'a' - 1) as char),
                0x7F => KeyCode::Backspace,
                b @ 0x20..=0x7E => KeyCode::Char(b as char),
                _ => continue,
            };
            let modifiers = match byte {
                0x00..=0x1A => Modifiers::CTRL,
                _ => Modifiers::empty(),
            };
            events.push(Event::Key(KeyEvent { code, modifiers }));
        }
        self.buf.clear();
        events
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Stateless Parsing Functions ────────────────────────────────────────────
//
// All parse functions are pure — they read from `buf[pos..]` and return
// what they found plus how many bytes to consume.

/// Result of trying to parse one event from the buffer.
enum Parsed {
    /// Successfully parsed an event, consuming `usize` bytes.
    Event(Event, usize),
    /// Sequence is incomplete — need more bytes.
    Incomplete,
    /// Unrecognized byte(s), skip `usize` bytes.
    Skip(usize),
}

fn press(code: KeyCode) -> Event {
    Event::Key(KeyEvent {
        code,
        modifiers: Modifiers::empty(),
    })
}

fn key_with(code: KeyCode, modifiers: Modifiers) -> Event {
    Event::Key(KeyEvent { code, modifiers })
}

fn ctrl_key(code: KeyCode) -> Event {
    Event::Key(KeyEvent {
        code,
        modifiers: Modifiers::CTRL,
    })
}

/// Try to parse a single event starting at `buf[pos]`.
fn try_parse(buf: &[u8], pos: usize) -> Parsed {
    let remaining = &buf[pos..];
    if remaining.is_empty() {
        return Parsed::Skip(0);
    }

    match remaining[0] {
        // ESC — could be an escape sequence or a standalone Escape key.
        0x1B => parse_escape(remaining),
        // Control characters.
        0x00 => Parsed::Event(ctrl_key(KeyCode::Char('@')), 1),
        b @ (0x01..=0x07 | 0x0B..=0x0C | 0x0E..=0x1A) => {
            Parsed::Event(ctrl_key(KeyCode::Char((b + b'a' - 1) as char)), 1)
        }
        0x08 | 0x7F => Parsed::Event(press(KeyCode::Backspace), 1),
        0x09 => Parsed::Event(press(KeyCode::Tab), 1),
        0x0A | 0x0D => Parsed::Event(press(KeyCode::Enter), 1),
        // ASCII printable.
        b @ 0x20..=0x7E => Parsed::Event(press(KeyCode::Char(b as char)), 1),
        // UTF-8 multi-byte.
        0xC0..=0xFF => parse_utf8(remaining),
        // Bare continuation bytes (0x80..=0xBF) — invalid lead, skip.
        _ => Parsed::Skip(1),
    }
}

// ── Escape sequences ────────────────────────────────────────────────────────

fn parse_escape(buf: &[u8]) -> Parsed {
    debug_assert_eq!(buf[0], 0x1B);

    if buf.len() < 2 {
        return Parsed::Incomplete;
    }

    match buf[1] {
        // CSI: ESC [
        b'[' => parse_csi(buf),
        // SS3: ESC O
        b'O' => parse_ss3(buf),
        // Alt+ESC.
        0x1B => Parsed::Event(key_with(KeyCode::Escape, Modifiers::ALT), 2),
        // Alt+printable character.
        b @ 0x20..=0x7E => Parsed::Event(key_with(KeyCode::Char(b as char), Modifiers::ALT), 2),
        // Alt+control character (e.g., ESC Ctrl+A).
        b @ 0x01..=0x1A => Parsed::Event(
            key_with(
                KeyCode::Char((b + b'a' - 1) as char),
                Modifiers::ALT | Modifiers::CTRL,
            ),
            2,
        ),
        // Unknown byte after ESC — emit standalone Escape.
        _ => Parsed::Event(press(KeyCode::Escape), 1),
    }
}

// ── CSI (Control Sequence Introducer) ───────────────────────────────────────

fn parse_csi(buf: &[u8]) -> Parsed {
    debug_assert!(buf.len() >= 2 && buf[0] == 0x1B && buf[1] == b'[');

    if buf.len() < 3 {
        return Parsed::Incomplete;
    }

    // Scan for the final byte (0x40..=0x7E).
    // CSI parameter bytes are in 0x30..=0x3F, intermediate in 0x20..=0x2F.
    let mut end = 2;
    while end < buf.len() {
        let b = buf[end];
        if (0x40..=0x7E).contains(&b) {
            break;
        }
        if !(0x20..=0x3F).contains(&b) {
            // Invalid byte in CSI sequence — abort.
            return Parsed::Skip(end + 1);
        }
        end += 1;
    }

    if end >= buf.len() {
        return Parsed::Incomplete;
    }

    let final_byte = buf[end];
    let params = parse_csi_params(&buf[2..end]);
    let consumed = end + 1;

    // ── Tilde-terminated sequences (editing keys) ────────────────────
    if final_byte == b'~' {
        let first = params.first().copied().unwrap_or(0);
        let modifiers = params.get(1).map_or(Modifiers::empty(), |&p| decode_modifiers(p));

        return match first {
            1 | 7 => Parsed::Event(key_with(KeyCode::Home, modifiers), consumed),
            3 => Parsed::Event(key_with(KeyCode::Delete, modifiers), consumed),
            4 | 8 => Parsed::Event(key_with(KeyCode::End, modifiers), consumed),
            5 => Parsed::Event(key_with(KeyCode::PageUp, modifiers), consumed),
            6 => Parsed::Event(key_with(KeyCode::PageDown, modifiers), consumed),
            _ => Parsed::Skip(consumed),
        };
    }

    // ── Letter-terminated sequences (arrows, Home/End) ───────────────
    // With modifiers the form is `CSI 1 ; mod X`.
    let modifiers = params.get(1).map_or(Modifiers::empty(), |&p| decode_modifiers(p));
    let code = match final_byte {
        b'A' => KeyCode::Up,
        b'B' => KeyCode::Down,
        b'C' => KeyCode::Right,
        b'D' => KeyCode::Left,
        b'H' => KeyCode::Home,
        b'F' => KeyCode::End,
        _ => return Parsed::Skip(consumed),
    };
    Parsed::Event(key_with(code, modifiers), consumed)
}

// ── SS3 (Single Shift 3) ────────────────────────────────────────────────────

/// Application-mode arrows and Home/End: `ESC O A` through `ESC O F`.
fn parse_ss3(buf: &[u8]) -> Parsed {
    debug_assert!(buf.len() >= 2 && buf[0] == 0x1B && buf[1] == b'O');

    if buf.len() < 3 {
        return Parsed::Incomplete;
    }

    let code = match buf[2] {
        b'A' => KeyCode::Up,
        b'B' => KeyCode::Down,
        b'C' => KeyCode::Right,
        b'D' => KeyCode::Left,
        b'H' => KeyCode::Home,
        b'F' => KeyCode::End,
        _ => return Parsed::Skip(3),
    };
    Parsed::Event(press(code), 3)
}

// ── UTF-8 ───────────────────────────────────────────────────────────────────

fn parse_utf8(buf: &[u8]) -> Parsed {
    let len = match buf[0] {
        0xC0..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF7 => 4,
        _ => return Parsed::Skip(1),
    };

    if buf.len() < len {
        return Parsed::Incomplete;
    }

    match std::str::from_utf8(&buf[..len]) {
        Ok(s) => match s.chars().next() {
            Some(ch) => Parsed::Event(press(KeyCode::Char(ch)), len),
            None => Parsed::Skip(len),
        },
        Err(_) => Parsed::Skip(1),
    }
}

// ── Parameter decoding ──────────────────────────────────────────────────────

/// Parse semicolon-separated decimal CSI parameters from raw bytes.
fn parse_csi_params(raw: &[u8]) -> Vec<u16> {
    let mut params = Vec::new();
    let mut current: u16 = 0;
    let mut seen_digit = false;

    for &b in raw {
        match b {
            b'0'..=b'9' => {
                current = current.saturating_mul(10).saturating_add(u16::from(b - b'0'));
                seen_digit = true;
            }
            b';' => {
                params.push(if seen_digit { current } else { 0 });
                current = 0;
                seen_digit = false;
            }
            // Anything else (intermediate bytes) ends number accumulation.
            _ => {}
        }
    }
    if seen_digit {
        params.push(current);
    }
    params
}

/// Decode the xterm modifier parameter (`param = 1 + bitmask`).
fn decode_modifiers(param: u16) -> Modifiers {
    if param < 2 {
        return Modifiers::empty();
    }
    #[allow(clippy::cast_possible_truncation)] // Masked to 3 bits below.
    let mask = ((param - 1) & 0b111) as u8;
    Modifiers::from_bits_truncate(mask)
}

/// Find the first occurrence of `needle` in `haystack`.
fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn keys(parser: &mut Parser, bytes: &[u8]) -> Vec<Event> {
        parser.advance(bytes)
    }

    #[test]
    fn ascii_printable() {
        let mut p = Parser::new();
        assert_eq!(keys(&mut p, b"a"), vec![press(KeyCode::Char('a'))]);
    }

    #[test]
    fn multiple_chars_in_one_feed() {
        let mut p = Parser::new();
        assert_eq!(
            keys(&mut p, b"hi"),
            vec![press(KeyCode::Char('h')), press(KeyCode::Char('i'))]
        );
    }

    #[test]
    fn enter_and_tab_and_backspace() {
        let mut p = Parser::new();
        assert_eq!(keys(&mut p, b"\r"), vec![press(KeyCode::Enter)]);
        assert_eq!(keys(&mut p, b"\n"), vec![press(KeyCode::Enter)]);
        assert_eq!(keys(&mut p, b"\t"), vec![press(KeyCode::Tab)]);
        assert_eq!(keys(&mut p, b"\x7f"), vec![press(KeyCode::Backspace)]);
        assert_eq!(keys(&mut p, b"\x08"), vec![press(KeyCode::Backspace)]);
    }

    #[test]
    fn control_characters() {
        let mut p = Parser::new();
        assert_eq!(keys(&mut p, b"\x03"), vec![ctrl_key(KeyCode::Char('c'))]);
        assert_eq!(keys(&mut p, b"\x01"), vec![ctrl_key(KeyCode::Char('a'))]);
    }

    #[test]
    fn csi_arrows() {
        let mut p = Parser::new();
        assert_eq!(keys(&mut p, b"\x1b[A"), vec![press(KeyCode::Up)]);
        assert_eq!(keys(&mut p, b"\x1b[B"), vec![press(KeyCode::Down)]);
        assert_eq!(keys(&mut p, b"\x1b[C"), vec![press(KeyCode::Right)]);
        assert_eq!(keys(&mut p, b"\x1b[D"), vec![press(KeyCode::Left)]);
    }

    #[test]
    fn csi_home_end() {
        let mut p = Parser::new();
        assert_eq!(keys(&mut p, b"\x1b[H"), vec![press(KeyCode::Home)]);
        assert_eq!(keys(&mut p, b"\x1b[F"), vec![press(KeyCode::End)]);
        assert_eq!(keys(&mut p, b"\x1b[1~"), vec![press(KeyCode::Home)]);
        assert_eq!(keys(&mut p, b"\x1b[4~"), vec![press(KeyCode::End)]);
    }

    #[test]
    fn csi_editing_keys() {
        let mut p = Parser::new();
        assert_eq!(keys(&mut p, b"\x1b[3~"), vec![press(KeyCode::Delete)]);
        assert_eq!(keys(&mut p, b"\x1b[5~"), vec![press(KeyCode::PageUp)]);
        assert_eq!(keys(&mut p, b"\x1b[6~"), vec![press(KeyCode::PageDown)]);
    }

    #[test]
    fn csi_modifiers() {
        let mut p = Parser::new();
        assert_eq!(
            keys(&mut p, b"\x1b[1;2A"),
            vec![key_with(KeyCode::Up, Modifiers::SHIFT)]
        );
        assert_eq!(
            keys(&mut p, b"\x1b[1;5C"),
            vec![key_with(KeyCode::Right, Modifiers::CTRL)]
        );
        assert_eq!(
            keys(&mut p, b"\x1b[3;3~"),
            vec![key_with(KeyCode::Delete, Modifiers::ALT)]
        );
    }

    #[test]
    fn ss3_arrows_and_home_end() {
        let mut p = Parser::new();
        assert_eq!(keys(&mut p, b"\x1bOA"), vec![press(KeyCode::Up)]);
        assert_eq!(keys(&mut p, b"\x1bOD"), vec![press(KeyCode::Left)]);
        assert_eq!(keys(&mut p, b"\x1bOH"), vec![press(KeyCode::Home)]);
        assert_eq!(keys(&mut p, b"\x1bOF"), vec![press(KeyCode::End)]);
    }

    #[test]
    fn alt_char() {
        let mut p = Parser::new();
        assert_eq!(
            keys(&mut p, b"\x1bx"),
            vec![key_with(KeyCode::Char('x'), Modifiers::ALT)]
        );
    }

    #[test]
    fn lone_esc_stays_pending_until_flush() {
        let mut p = Parser::new();
        assert_eq!(keys(&mut p, b"\x1b"), vec![]);
        assert!(p.has_pending());
        assert_eq!(p.flush(), vec![press(KeyCode::Escape)]);
        assert!(!p.has_pending());
    }

    #[test]
    fn split_csi_across_feeds() {
        let mut p = Parser::new();
        assert_eq!(keys(&mut p, b"\x1b["), vec![]);
        assert_eq!(keys(&mut p, b"A"), vec![press(KeyCode::Up)]);
    }

    #[test]
    fn utf8_multibyte() {
        let mut p = Parser::new();
        assert_eq!(keys(&mut p, "é".as_bytes()), vec![press(KeyCode::Char('é'))]);
        assert_eq!(keys(&mut p, "界".as_bytes()), vec![press(KeyCode::Char('界'))]);
    }

    #[test]
    fn utf8_split_across_feeds() {
        let mut p = Parser::new();
        let bytes = "é".as_bytes();
        assert_eq!(keys(&mut p, &bytes[..1]), vec![]);
        assert_eq!(keys(&mut p, &bytes[1..]), vec![press(KeyCode::Char('é'))]);
    }

    #[test]
    fn invalid_utf8_lead_is_skipped() {
        let mut p = Parser::new();
        assert_eq!(keys(&mut p, &[0x80, b'a']), vec![press(KeyCode::Char('a'))]);
    }

    #[test]
    fn bracketed_paste() {
        let mut p = Parser::new();
        assert_eq!(
            keys(&mut p, b"\x1b[200~hello\x1b[201~"),
            vec![Event::Paste("hello".into())]
        );
    }

    #[test]
    fn bracketed_paste_split_across_feeds() {
        let mut p = Parser::new();
        assert_eq!(keys(&mut p, b"\x1b[200~hel"), vec![]);
        assert_eq!(keys(&mut p, b"lo\x1b[201"), vec![]);
        assert_eq!(keys(&mut p, b"~"), vec![Event::Paste("hello".into())]);
    }

    #[test]
    fn paste_content_may_contain_escapes() {
        let mut p = Parser::new();
        assert_eq!(
            keys(&mut p, b"\x1b[200~a\x1b[Ab\x1b[201~"),
            vec![Event::Paste("a\x1b[Ab".into())]
        );
    }

    #[test]
    fn keys_after_paste() {
        let mut p = Parser::new();
        assert_eq!(
            keys(&mut p, b"\x1b[200~x\x1b[201~y"),
            vec![Event::Paste("x".into()), press(KeyCode::Char('y'))]
        );
    }

    #[test]
    fn unknown_csi_is_skipped() {
        let mut p = Parser::new();
        assert_eq!(
            keys(&mut p, b"\x1b[99~a"),
            vec![press(KeyCode::Char('a'))]
        );
    }

    #[test]
    fn csi_params_decoding() {
        assert_eq!(parse_csi_params(b""), Vec::<u16>::new());
        assert_eq!(parse_csi_params(b"1"), vec![1]);
        assert_eq!(parse_csi_params(b"1;5"), vec![1, 5]);
        assert_eq!(parse_csi_params(b";5"), vec![0, 5]);
    }

    #[test]
    fn modifier_decoding() {
        assert_eq!(decode_modifiers(0), Modifiers::empty());
        assert_eq!(decode_modifiers(1), Modifiers::empty());
        assert_eq!(decode_modifiers(2), Modifiers::SHIFT);
        assert_eq!(decode_modifiers(3), Modifiers::ALT);
        assert_eq!(decode_modifiers(5), Modifiers::CTRL);
        assert_eq!(decode_modifiers(8), Modifiers::all());
    }
}
