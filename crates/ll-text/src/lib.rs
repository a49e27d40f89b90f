// SPDX-License-Identifier: MIT
//
// ll-text — text widgets for liveline.
//
// Two widgets over the `ll-term` capability layer:
//
//   - `TemplateText`: a console line parsed once from a pattern with
//     named `{field:width}` slots, re-rendered in place field by field;
//   - `TextBox`: a boxed single-line editor with caret movement,
//     deletion, and paste.
//
// Both take the terminal by `&mut` and leave cursor and color state
// exactly as they found them.

pub mod template;
pub mod textbox;

pub use template::{BuildError, FieldSpec, Part, TemplateError, TemplateText, UpdateError, parse};
pub use textbox::TextBox;
