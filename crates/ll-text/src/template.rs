// SPDX-License-Identifier: MIT
//
// Template text — one console line with named, updatable fields.
//
// A pattern like `"downloaded {done:6} of {total:6} bytes"` is parsed
// once into literal runs and field references. Each field holds a
// value, a minimum display width, and a color; updating a field and
// re-rendering repaints the whole line in place at the position it was
// first created, without disturbing the caller's cursor.
//
// The grammar, in one left-to-right scan:
//
//   - `{name}` / `{name:width}` reference a field; `name` is any run
//     of characters except `{`, `}`, `:`; `width` is a non-negative
//     decimal integer (missing or empty means 0, no padding).
//   - `\{` escapes a literal `{`.
//   - `}` outside a field is literal. The asymmetry with `{` is
//     deliberate: only `{` opens anything, so only `{` needs escaping.
//
// Parsing is atomic — on any error no parts and no field table are
// produced.

use std::collections::HashMap;
use std::fmt;
use std::io;

use ll_term::color::Color;
use ll_term::scoped::with_cursor_at;
use ll_term::terminal::Terminal;
use thiserror::Error;
use unicode_width::UnicodeWidthStr;

// ─── Parts ──────────────────────────────────────────────────────────────────

/// One parsed segment of a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
    /// Text emitted verbatim.
    Literal(String),
    /// A reference to the named field, resolved at render time.
    Field(String),
}

/// Per-field state: minimum display width, current value, color.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    width: usize,
    value: Option<String>,
    color: Color,
}

impl FieldSpec {
    fn new() -> Self {
        Self {
            width: 0,
            value: None,
            color: Color::Default,
        }
    }

    /// Minimum display width in columns (0 = no padding).
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// The current value, if one has been set.
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// The color this field renders in.
    #[must_use]
    pub const fn color(&self) -> Color {
        self.color
    }

    /// The value (or empty string) right-padded with spaces to at
    /// least `width` display columns. Never truncates.
    fn padded(&self) -> String {
        let value = self.value.as_deref().unwrap_or("");
        let pad = self.width.saturating_sub(value.width());
        let mut out = String::with_capacity(value.len() + pad);
        out.push_str(value);
        out.extend(std::iter::repeat_n(' ', pad));
        out
    }
}

// ─── Errors ─────────────────────────────────────────────────────────────────

/// A malformed template pattern. Positions are byte offsets of the
/// offending character.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// `{` appeared inside a field.
    #[error("'{{' cannot appear inside a field (byte {pos})")]
    NestedField { pos: usize },
    /// A field closed with an empty name.
    #[error("field name cannot be empty (byte {pos})")]
    EmptyName { pos: usize },
    /// The width suffix is not a non-negative decimal integer.
    #[error("invalid field width {text:?} (byte {pos})")]
    InvalidWidth { pos: usize, text: String },
    /// The pattern ended inside a field.
    #[error("unterminated field at end of pattern")]
    Unterminated,
}

/// A failed field update.
#[derive(Debug, Error)]
pub enum UpdateError {
    /// The template declares no field with this name.
    #[error("no field named {0:?} in this template")]
    UnknownField(String),
    /// The stringified value contains a line break, which would
    /// corrupt single-line re-rendering.
    #[error("field value must not contain a line break")]
    InvalidValue,
    /// A terminal write failed during re-rendering.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// A failed [`TemplateText::with_values`] construction.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error(transparent)]
    Update(#[from] UpdateError),
}

// ─── Parser ─────────────────────────────────────────────────────────────────

/// Parse a pattern into its part sequence and field table.
///
/// Pure function of the input; on error nothing is produced. A field
/// name declared twice shares one [`FieldSpec`] and the later
/// occurrence's width wins.
///
/// # Errors
///
/// Returns a [`TemplateError`] naming the offending byte position.
pub fn parse(pattern: &str) -> Result<(Vec<Part>, HashMap<String, FieldSpec>), TemplateError> {
    let mut parts = Vec::new();
    let mut fields: HashMap<String, FieldSpec> = HashMap::new();

    let mut literal = String::new();
    let mut in_field = false;
    let mut past_colon = false;
    let mut name = String::new();
    let mut width_text = String::new();

    for (pos, ch) in pattern.char_indices() {
        match ch {
            '{' => {
                if in_field {
                    return Err(TemplateError::NestedField { pos });
                }
                if literal.ends_with('\\') {
                    // `\{` — drop the escape, keep a literal brace.
                    literal.pop();
                    literal.push('{');
                } else {
                    if !literal.is_empty() {
                        parts.push(Part::Literal(std::mem::take(&mut literal)));
                    }
                    in_field = true;
                }
            }
            '}' => {
                if !in_field {
                    // Unmatched `}` is literal.
                    literal.push('}');
                } else {
                    if name.is_empty() {
                        return Err(TemplateError::EmptyName { pos });
                    }
                    let width = if width_text.is_empty() {
                        0
                    } else {
                        width_text
                            .parse::<usize>()
                            .map_err(|_| TemplateError::InvalidWidth {
                                pos,
                                text: width_text.clone(),
                            })?
                    };
                    let spec = fields.entry(name.clone()).or_insert_with(FieldSpec::new);
                    spec.width = width;
                    parts.push(Part::Field(std::mem::take(&mut name)));
                    width_text.clear();
                    in_field = false;
                    past_colon = false;
                }
            }
            ':' if in_field => {
                // First `:` switches to width accumulation; later
                // colons inside the same field are dropped.
                past_colon = true;
            }
            _ => {
                if in_field {
                    if past_colon {
                        width_text.push(ch);
                    } else {
                        name.push(ch);
                    }
                } else {
                    literal.push(ch);
                }
            }
        }
    }

    if in_field {
        return Err(TemplateError::Unterminated);
    }
    if !literal.is_empty() {
        parts.push(Part::Literal(literal));
    }
    Ok((parts, fields))
}

// ─── TemplateText ───────────────────────────────────────────────────────────

/// One on-screen line with named fields that can be re-rendered in
/// place.
///
/// The screen position at construction time becomes the line's anchor:
/// every [`render`](Self::render) repositions there first, overwriting
/// the same visual line, and restores the caller's cursor afterwards.
///
/// # Example
///
/// ```
/// use ll_term::terminal::CaptureTerminal;
/// use ll_text::template::TemplateText;
///
/// let mut term = CaptureTerminal::new();
/// let mut line = TemplateText::new(&mut term, "sent {count:6} packets")?;
/// line.update(&mut term, "count", 128, true)?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct TemplateText {
    parts: Vec<Part>,
    fields: HashMap<String, FieldSpec>,
    anchor: (u16, u16),
}

impl TemplateText {
    /// Parse `pattern` and anchor the line at the current cursor
    /// position. Fields start absent, in the ambient foreground color.
    ///
    /// # Errors
    ///
    /// Returns a [`TemplateError`] if the pattern is malformed; the
    /// terminal is not touched in that case.
    pub fn new<T: Terminal + ?Sized>(term: &mut T, pattern: &str) -> Result<Self, TemplateError> {
        let (parts, mut fields) = parse(pattern)?;
        let ambient = term.foreground();
        for spec in fields.values_mut() {
            spec.color = ambient;
        }
        Ok(Self {
            parts,
            fields,
            anchor: term.cursor_position(),
        })
    }

    /// Parse `pattern`, seed the named fields, and render once.
    ///
    /// # Errors
    ///
    /// Returns a [`BuildError`] if the pattern is malformed, a seeded
    /// name is undeclared, a seeded value contains a line break, or
    /// the initial render fails.
    pub fn with_values<'a, T, I, V>(
        term: &mut T,
        pattern: &str,
        values: I,
    ) -> Result<Self, BuildError>
    where
        T: Terminal + ?Sized,
        I: IntoIterator<Item = (&'a str, V)>,
        V: fmt::Display,
    {
        let mut text = Self::new(term, pattern)?;
        for (name, value) in values {
            text.store(name, &value, None)?;
        }
        text.render(term).map_err(UpdateError::from)?;
        Ok(text)
    }

    /// The screen position this line re-renders at.
    #[must_use]
    pub const fn anchor(&self) -> (u16, u16) {
        self.anchor
    }

    /// The named field's state, if the template declares it.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.get(name)
    }

    /// Set a field's value, keeping its color.
    ///
    /// The value is stringified immediately. With `re_render` the
    /// whole line is repainted before returning.
    ///
    /// # Errors
    ///
    /// [`UpdateError::InvalidValue`] if the value contains a line
    /// break, [`UpdateError::UnknownField`] if the template declares
    /// no such field, or a propagated render failure.
    pub fn update<T: Terminal + ?Sized>(
        &mut self,
        term: &mut T,
        name: &str,
        value: impl fmt::Display,
        re_render: bool,
    ) -> Result<(), UpdateError> {
        self.store(name, &value, None)?;
        if re_render {
            self.render(term)?;
        }
        Ok(())
    }

    /// Set a field's value and color.
    ///
    /// # Errors
    ///
    /// Same as [`update`](Self::update).
    pub fn update_colored<T: Terminal + ?Sized>(
        &mut self,
        term: &mut T,
        name: &str,
        value: impl fmt::Display,
        color: Color,
        re_render: bool,
    ) -> Result<(), UpdateError> {
        self.store(name, &value, Some(color))?;
        if re_render {
            self.render(term)?;
        }
        Ok(())
    }

    fn store(
        &mut self,
        name: &str,
        value: &dyn fmt::Display,
        color: Option<Color>,
    ) -> Result<(), UpdateError> {
        let text = value.to_string();
        if text.contains('\n') {
            return Err(UpdateError::InvalidValue);
        }
        let spec = self
            .fields
            .get_mut(name)
            .ok_or_else(|| UpdateError::UnknownField(name.to_owned()))?;
        spec.value = Some(text);
        if let Some(color) = color {
            spec.color = color;
        }
        Ok(())
    }

    /// Repaint the whole line at its anchor.
    ///
    /// Literals are written verbatim; each field is padded to its
    /// width and written in its color; a line terminator follows. The
    /// cursor is restored afterwards, even on failure. Rendering twice
    /// with no intervening update emits the identical operation
    /// sequence.
    ///
    /// # Errors
    ///
    /// Propagates terminal write failures.
    pub fn render<T: Terminal + ?Sized>(&self, term: &mut T) -> io::Result<()> {
        let (col, row) = self.anchor;
        with_cursor_at(term, col, row, |t| {
            for part in &self.parts {
                match part {
                    Part::Literal(text) => t.write_str(text)?,
                    Part::Field(name) => {
                        let Some(spec) = self.fields.get(name) else {
                            continue;
                        };
                        t.write_colored(&spec.padded(), spec.color)?;
                    }
                }
            }
            t.write_line("")
        })
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
