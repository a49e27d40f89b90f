// SPDX-License-Identifier: MIT
//
// liveline demo — a live status line, a boxed prompt, and an in-place
// rewrite, exercising the library end to end.
//
// Run it on a terminal to watch a transfer line update field by field;
// with output redirected everything degrades to plain lines.

use std::io;
use std::thread;
use std::time::Duration;

use ll_term::color::Color;
use ll_term::line;
use ll_term::terminal::{Console, Terminal};
use ll_text::template::TemplateText;
use ll_text::textbox::TextBox;

/// Total bytes the fake transfer pretends to move.
const TOTAL_BYTES: u64 = 1 << 20;

/// Steps the transfer takes, and the pause between them.
const STEPS: u64 = 32;
const STEP_DELAY: Duration = Duration::from_millis(40);

fn main() -> io::Result<()> {
    let mut term = Console::new();

    term.write_line("liveline demo")?;
    term.write_line("")?;

    run_transfer(&mut term)?;

    term.write_line("")?;
    term.write_line("Label this run:")?;
    let prompt = TextBox::new(&mut term, 32, Color::CYAN);
    let label = prompt.read_line(&mut term)?;

    let label = if label.trim().is_empty() {
        "(unlabeled)".to_owned()
    } else {
        label
    };
    line::rewrite_line_colored(&mut term, format!("saved as {label}"), Color::GREEN, 1)?;
    Ok(())
}

/// Render a transfer status line and update it in place until done.
fn run_transfer(term: &mut Console) -> io::Result<()> {
    fn progress(
        status: &mut TemplateText,
        term: &mut Console,
        done: u64,
        state: Option<(&str, Color)>,
    ) -> io::Result<()> {
        status
            .update(term, "done", done, false)
            .map_err(io::Error::other)?;
        status
            .update(term, "total", TOTAL_BYTES, false)
            .map_err(io::Error::other)?;
        if let Some((label, color)) = state {
            status
                .update_colored(term, "state", label, color, false)
                .map_err(io::Error::other)?;
        }
        status.render(term)
    }

    let mut status = TemplateText::new(
        term,
        "transferring {done:9} of {total:9} bytes  {state:8}",
    )
    .map_err(io::Error::other)?;

    if !term.is_interactive() {
        // Redirected output: one final line instead of an animation.
        return progress(
            &mut status,
            term,
            TOTAL_BYTES,
            Some(("done", Color::GREEN)),
        );
    }

    progress(&mut status, term, 0, Some(("running", Color::YELLOW)))?;
    for step in 1..=STEPS {
        let done = TOTAL_BYTES * step / STEPS;
        let state = (step == STEPS).then_some(("done", Color::GREEN));
        progress(&mut status, term, done, state)?;
        thread::sleep(STEP_DELAY);
    }
    Ok(())
}
