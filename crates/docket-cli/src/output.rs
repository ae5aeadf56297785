//! Output formatting for the CLI.

use docket_llm::ProviderStatus;
use docket_pipeline::{EventTable, RunReport, TableSummary};
use colored::*;
use tabled::{
    builder::Builder,
    settings::{
        object::{Columns, Rows},
        Alignment, Modify, Style, Width,
    },
};

/// Widest the particulars column is allowed to render on a terminal
const PARTICULARS_WIDTH: usize = 60;

/// Output formatter.
pub struct Formatter {
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(color_enabled: bool) -> Self {
        Self { color_enabled }
    }

    /// Format an event table for the terminal.
    pub fn format_events(&self, table: &EventTable) -> String {
        if table.rows().is_empty() {
            return self.colorize("No events found.", "yellow");
        }

        let mut builder = Builder::default();
        builder.push_record(table.headers());
        for row in table.rows() {
            builder.push_record(row.iter().map(|cell| cell.to_string()));
        }

        let mut rendered = builder.build();
        rendered
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()))
            .with(Modify::new(Columns::single(2)).with(Width::wrap(PARTICULARS_WIDTH)));

        rendered.to_string()
    }

    /// Format provider availability.
    pub fn format_providers(&self, statuses: &[ProviderStatus]) -> String {
        let mut builder = Builder::default();
        builder.push_record(["Key", "Provider", "Model", "Credential"]);

        for status in statuses {
            let credential = match &status.credential_var {
                Some(var) => format!("set ({})", var),
                None => format!("missing ({})", status.kind.credential_vars().join(" or ")),
            };
            builder.push_record([
                status.kind.key(),
                status.kind.display_name(),
                status.model.as_str(),
                credential.as_str(),
            ]);
        }

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));

        table.to_string()
    }

    /// Format the summary line printed after a run.
    pub fn run_summary(&self, report: &RunReport, summary: &TableSummary) -> String {
        let message = format!(
            "{} document(s), {} event(s), {} with citations, avg {:.0} chars per event",
            summary.unique_documents,
            summary.total_events,
            summary.events_with_citations,
            summary.avg_particulars_length
        );
        let failed = report.fallback_documents();
        if failed == 0 {
            self.success(&message)
        } else {
            self.warning(&format!("{} ({} document(s) fell back)", message, failed))
        }
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            _ => text.to_string(),
        }
    }
}
