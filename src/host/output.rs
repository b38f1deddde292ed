//! Transcript formatting: text tables or JSON.

use super::script::Transcript;
use crate::error::ShellError;
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::{Cell, Table};
use owo_colors::OwoColorize;

/// Render `transcript` as a step table followed by the shutdown events.
pub fn format_transcript_text(transcript: &Transcript, color: bool) -> String {
    let mut out = String::new();
    let heading = format!("Session: {}", transcript.shell_title);
    if color {
        out.push_str(&format!("{}\n", heading.bold().underline()));
    } else {
        out.push_str(&format!("{heading}\n"));
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_BORDERS_ONLY)
        .set_header(vec!["#", "Action", "Page", "Title", "Stack", "Detail", "Events"]);
    for step in &transcript.steps {
        let status = if step.ok {
            step.detail.clone()
        } else if color {
            format!("{}", format!("error: {}", step.detail).red())
        } else {
            format!("error: {}", step.detail)
        };
        table.add_row(vec![
            Cell::new(step.index),
            Cell::new(&step.action),
            Cell::new(step.page.as_deref().unwrap_or("-")),
            Cell::new(step.title.as_deref().unwrap_or("-")),
            Cell::new(step.back_stack),
            Cell::new(status),
            Cell::new(step.events.join("\n")),
        ]);
    }
    out.push_str(&table.to_string());
    out.push('\n');

    if !transcript.shutdown.is_empty() {
        let heading = "Shutdown";
        if color {
            out.push_str(&format!("{}\n", heading.bold()));
        } else {
            out.push_str(&format!("{heading}\n"));
        }
        for event in &transcript.shutdown {
            out.push_str(&format!("  {event}\n"));
        }
    }

    let failures = transcript.failures();
    let summary = format!("{} steps, {} failed", transcript.steps.len(), failures);
    if color && failures > 0 {
        out.push_str(&format!("{}", summary.yellow()));
    } else {
        out.push_str(&summary);
    }
    out
}

pub fn format_transcript_json(transcript: &Transcript) -> Result<String, ShellError> {
    serde_json::to_string_pretty(transcript).map_err(|e| ShellError::Script(e.to_string()))
}
