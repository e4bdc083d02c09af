//! Human-readable progress output

use colored::*;
use sheetprobe_core::reader::Worksheet;
use sheetprobe_core::{AnalysisObserver, BatchOutcome, FileResult, ProbeError};
use std::path::Path;

const RULE_WIDTH: usize = 60;

/// Prints batch progress and the closing summary to stdout
#[derive(Debug, Default)]
pub struct ConsoleObserver;

impl ConsoleObserver {
    pub fn print_banner(&self) {
        println!("{}", "LGU Excel Template Analysis".bold());
        println!("{}", "=".repeat(50));
    }
}

fn rule() -> String {
    "=".repeat(RULE_WIDTH)
}

/// Inputs are shown by file name, as they sit in the working directory
fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// "Input Forms" reads as "Input" in per-file messages
fn input_kind(label: &str) -> &str {
    label.strip_suffix(" Forms").unwrap_or(label)
}

impl AnalysisObserver for ConsoleObserver {
    fn workbook_started(&mut self, path: &Path) {
        println!();
        println!("{}", rule());
        println!("{} {}", "ANALYZING:".bold(), display_name(path).cyan().bold());
        println!("{}", rule());
    }

    fn workbook_loaded(&mut self, sheet_names: &[String]) {
        println!("{}", "Workbook loaded successfully".green());
        println!("Sheets: {}", sheet_names.join(", "));
    }

    fn sheet_started(&mut self, sheet: &Worksheet) {
        println!();
        println!("{}", format!("=== Analyzing {} ===", sheet.name).bold());
        println!("Dimensions: {}", sheet.dimensions());
        println!("Max Row: {}, Max Col: {}", sheet.max_row, sheet.max_col);
    }

    fn merged_cells_found(&mut self, count: usize) {
        println!("Merged Cells: {}", count);
    }

    fn row_scanned(&mut self, row: u32, cell_count: usize) {
        println!("{}", format!("Row {}: {} cells with data", row, cell_count).bright_black());
    }

    fn report_written(&mut self, path: &Path) {
        println!();
        println!("{} {}", "Analysis saved to:".green().bold(), path.display());
    }

    fn file_missing(&mut self, label: &str, path: &Path) {
        let heading = format!("{} file not found:", input_kind(label));
        println!("{} {}", heading.yellow().bold(), display_name(path));
    }

    fn file_failed(&mut self, path: &Path, error: &ProbeError) {
        println!(
            "{} {}: {}",
            "Error analyzing".red().bold(),
            display_name(path),
            error
        );
    }

    fn summary(&mut self, outcomes: &[BatchOutcome]) {
        println!();
        println!("{}", rule());
        println!("{}", "ANALYSIS SUMMARY".bold());
        println!("{}", rule());

        for outcome in outcomes {
            let FileResult::Analyzed(report) = &outcome.result else {
                continue;
            };
            println!("{}", format!("{} Analysis:", outcome.label).bold().underline());
            for sheet in report.sheets() {
                println!(
                    "  - {}: {} rows, {} cols, {} merged cells",
                    sheet.sheet_name.cyan(),
                    sheet.max_row,
                    sheet.max_col,
                    sheet.merged_cells.len()
                );
            }
        }

        println!();
        println!(
            "{}",
            "Analysis complete! Check the generated JSON files for detailed structure."
                .green()
                .bold()
        );
    }
}
