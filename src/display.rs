#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use tabled::{Table, Tabled, settings::Style};

use crate::{
    catalog::Puzzle,
    java::diagnostics::{
        diagnostics_table, first_stack_frame, javac_error_count, parse_javac_output,
    },
    puzzle::{PlacementState, ShuffledSource, Slot},
};

/// The board as text: fixed tokens verbatim, gaps as `[n:____]` or, once
/// filled, `[n:token]`.
pub fn render_board(shuffled: &ShuffledSource, placement: &PlacementState) -> String {
    let mut out = String::new();
    for slot in shuffled.remaining_sequence() {
        match slot {
            Slot::Fixed(token) => out.push_str(token.image()),
            Slot::Gap(gap) => {
                let filling = placement
                    .occupant(*gap)
                    .and_then(|id| shuffled.bay_token(id).ok())
                    .map(|bay| bay.token().image().to_string())
                    .unwrap_or_else(|| "____".to_string());
                out.push_str(&format!("[{gap}:{filling}]"));
            }
        }
    }
    out
}

/// One bay row.
#[derive(Tabled)]
struct BayRow {
    /// bay id
    #[tabled(rename = "Token")]
    id:    String,
    /// token text
    #[tabled(rename = "Text")]
    image: String,
    /// where it sits
    #[tabled(rename = "Placed in")]
    gap:   String,
}

/// The bay as a table, one row per removed token.
pub fn render_bay(shuffled: &ShuffledSource, placement: &PlacementState) -> String {
    let rows = shuffled.bay_tokens().iter().map(|bay| BayRow {
        id:    bay.id().to_string(),
        image: bay.token().image().to_string(),
        gap:   placement
            .gap_of(bay.id())
            .map(|gap| format!("gap {gap}"))
            .unwrap_or_else(|| "-".to_string()),
    });
    Table::new(rows).with(Style::rounded()).to_string()
}

/// One catalog row.
#[derive(Tabled)]
struct PuzzleRow {
    /// puzzle id
    #[tabled(rename = "Puzzle")]
    id:       String,
    /// category
    #[tabled(rename = "Category")]
    category: String,
    /// number of hints
    #[tabled(rename = "Hints")]
    hints:    usize,
}

/// The catalog as a table.
pub fn render_catalog<'a>(puzzles: impl IntoIterator<Item = &'a Puzzle>) -> String {
    let rows = puzzles.into_iter().map(|p| PuzzleRow {
        id:       p.id().to_string(),
        category: p.category().to_string(),
        hints:    p.hints().len(),
    });
    Table::new(rows).with(Style::rounded()).to_string()
}

/// Explains a failed compile or run.
///
/// Compiler output becomes a diagnostics table with javac's error count
/// under it. A runtime failure keeps its text and names the innermost frame
/// of the stack trace. Anything else is passed through.
pub fn render_failure(output: &str) -> String {
    let diags = parse_javac_output(output);
    if !diags.is_empty() {
        let mut out = diagnostics_table(&diags);
        if let Some(count) = javac_error_count(output) {
            let noun = if count == 1 { "error" } else { "errors" };
            out.push_str(&format!("\n{count} {noun} in total"));
        }
        return out;
    }

    match first_stack_frame(output) {
        Some(frame) => format!(
            "{}\nThe program stopped at {} line {}",
            output.trim_end(),
            frame.file_name,
            frame.line_number
        ),
        None => output.to_string(),
    }
}
