//! Terminal output helpers shared by all commands.

use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{ContentArrangement, Table};
use owo_colors::OwoColorize;

/// Consistent formatting for command output.
#[derive(Debug, Default, Clone, Copy)]
pub struct Output;

impl Output {
    pub fn new() -> Self {
        Self
    }

    /// Plain status line
    pub fn status(&self, message: &str) {
        println!("{message}");
    }

    pub fn success(&self, message: &str) {
        println!("{} {}", "✓".bright_green(), message);
    }

    pub fn warning(&self, message: &str) {
        println!("{} {}", "!".bright_yellow(), message.yellow());
    }

    pub fn info(&self, label: &str, message: &str) {
        println!("{} {}", label.bright_blue(), message);
    }

    /// Indented key/value pair
    pub fn kv(&self, key: &str, value: &str) {
        println!("  {:<14} {}", format!("{key}:").dimmed(), value);
    }

    pub fn table(&self, header: &[&str], rows: Vec<Vec<String>>) {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL_CONDENSED)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(header.to_vec());
        for row in rows {
            table.add_row(row);
        }
        println!("{table}");
    }
}

/// Render an active flag.
pub fn active_label(active: bool) -> String {
    if active {
        "active".green().to_string()
    } else {
        "inactive".dimmed().to_string()
    }
}
