use std::io::IsTerminal;

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Row as ComfyRow, Table};
use terminal_size::{Width as TermWidth, terminal_size};
use unicode_width::UnicodeWidthStr;

use super::{Cli, OutputFormat};
use crate::generator::{Report, Termination};

pub(super) fn terminal_width() -> Option<u16> {
    if let Ok(cols) = std::env::var("COLUMNS")
        && let Ok(v) = cols.parse::<u16>()
    {
        return Some(v);
    }
    terminal_size().map(|(TermWidth(w), _)| w)
}

/// Keeps the tail of a long path, which is the part that tells bundles apart.
pub(super) fn shorten_path_for_table(path: &str, max: usize) -> String {
    if path.width() <= max {
        return path.to_string();
    }
    let mut tail = String::new();
    let mut width = 1;
    for c in path.chars().rev() {
        let w = c.to_string().width();
        if width + w > max {
            break;
        }
        width += w;
        tail.insert(0, c);
    }
    format!("…{tail}")
}

fn termination_label(t: Option<Termination>) -> &'static str {
    match t {
        None => "none",
        Some(Termination::BundleNotFound) => "bundle_not_found",
        Some(Termination::UserDeclinedSchema) => "user_declined_schema",
    }
}

pub(super) fn render_report(cli: &Cli, report: &Report) -> anyhow::Result<()> {
    match cli.output {
        // Status lines were already printed as the run went.
        OutputFormat::Text => Ok(()),
        OutputFormat::Json => {
            let s = serde_json::to_string_pretty(report)?;
            println!("{s}");
            Ok(())
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .apply_modifier(UTF8_ROUND_CORNERS)
                .set_content_arrangement(ContentArrangement::DynamicFullWidth);

            if let Some(w) = terminal_width() {
                table.set_width(w);
            }

            table.set_header(ComfyRow::from(vec![header_cell("key"), header_cell("value")]));

            let schema_path = report
                .schema_path
                .as_ref()
                .map(|p| shorten_path_for_table(&p.display().to_string(), 48))
                .unwrap_or_default();
            let rows = [
                ("bundle", report.bundle.to_string()),
                ("schema_path", schema_path),
                ("schema_created", report.schema_created.to_string()),
                ("config_updated", report.config_updated.to_string()),
                ("route_added", report.route_added.to_string()),
                ("terminated", termination_label(report.terminated).to_string()),
            ];
            for (key, value) in rows {
                table.add_row(ComfyRow::from(vec![Cell::new(key), Cell::new(value)]));
            }
            println!("{table}");
            Ok(())
        }
    }
}

fn header_cell(text: &str) -> Cell {
    if std::io::stdout().is_terminal() {
        Cell::new(text)
            .add_attribute(Attribute::Bold)
            .fg(Color::Cyan)
    } else {
        Cell::new(text)
    }
}
