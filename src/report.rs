/*!
 * Reporting functionality for codemap-extract
 *
 * Renders the outcome of a run as console tables using the tabled library.
 */

use std::time::Duration;

use tabled::{
    settings::{object::Columns, Alignment, Modify, Padding, Style},
    Table, Tabled,
};

use crate::library::LibraryReportStats;
use crate::types::{CopyStats, RunLayout};
use crate::utils::format_file_size;

/// Everything a finished run produced
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Where the artifacts were written
    pub layout: RunLayout,
    /// Collector statistics
    pub copy: CopyStats,
    /// Library report statistics
    pub libraries: LibraryReportStats,
    /// Wall time of the run
    pub duration: Duration,
}

/// Report generator for run summaries
#[derive(Debug, Default)]
pub struct Reporter;

impl Reporter {
    pub fn new() -> Self {
        Self
    }

    /// Print the report to stdout
    pub fn print_report(&self, summary: &RunSummary) {
        println!("\n{}", self.generate_report(summary));
    }

    /// Generate the report text
    pub fn generate_report(&self, summary: &RunSummary) -> String {
        let mut report = format!(
            "✅  EXTRACTION COMPLETE\n{}",
            self.create_summary_table(summary)
        );

        if !summary.copy.failures.is_empty() {
            report.push_str(&format!(
                "\n\n⚠️  FILES NOT COPIED\n{}",
                self.create_failures_table(&summary.copy)
            ));
        }

        report
    }

    fn create_summary_table(&self, summary: &RunSummary) -> String {
        #[derive(Tabled)]
        struct SummaryRow {
            #[tabled(rename = "Metric")]
            key: String,

            #[tabled(rename = "Value")]
            value: String,
        }

        let copy = &summary.copy;
        let libraries = &summary.libraries;
        let rows = vec![
            SummaryRow {
                key: "📂 Codebase Folder".to_string(),
                value: summary.layout.codebase_dir.display().to_string(),
            },
            SummaryRow {
                key: "🗺️ Codemap".to_string(),
                value: summary.layout.codemap_file.display().to_string(),
            },
            SummaryRow {
                key: "📄 Files Copied".to_string(),
                value: format!(
                    "{} ({} text, {} binary, {})",
                    copy.copied(),
                    copy.text_files,
                    copy.binary_files,
                    format_file_size(copy.bytes)
                ),
            },
            SummaryRow {
                key: "❌ Copy Failures".to_string(),
                value: copy.failures.len().to_string(),
            },
            SummaryRow {
                key: "📚 Library Reports".to_string(),
                value: format!(
                    "{} written, {} skipped, {} failed",
                    libraries.written.len(),
                    libraries.skipped.len(),
                    libraries.failed.len()
                ),
            },
            SummaryRow {
                key: "⏱️ Process Time".to_string(),
                value: format!("{:.4?}", summary.duration),
            },
        ];

        let mut table = Table::new(rows);
        table
            .with(Style::rounded())
            .with(Padding::new(1, 1, 0, 0))
            .with(Modify::new(Columns::new(..)).with(Alignment::left()));

        table.to_string()
    }

    fn create_failures_table(&self, copy: &CopyStats) -> String {
        #[derive(Tabled)]
        struct FailureRow {
            #[tabled(rename = "File Path")]
            path: String,

            #[tabled(rename = "Error")]
            error: String,
        }

        let rows: Vec<FailureRow> = copy
            .failures
            .iter()
            .map(|(path, error)| FailureRow {
                path: path.display().to_string(),
                error: error.clone(),
            })
            .collect();

        let mut table = Table::new(rows);
        table
            .with(Style::rounded())
            .with(Padding::new(1, 1, 0, 0))
            .with(Modify::new(Columns::new(..)).with(Alignment::left()));

        table.to_string()
    }
}
