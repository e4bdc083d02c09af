//! Progress notifications emitted while a batch runs

use std::path::Path;

use crate::driver::{BatchOutcome, FileResult};
use crate::error::ProbeError;
use crate::reader::Worksheet;

/// Receives progress from the driver and the analyzer.
///
/// Every method has an empty default so implementors only pick the
/// events they care about.
pub trait AnalysisObserver {
    /// A present input is about to be opened
    fn workbook_started(&mut self, _path: &Path) {}

    /// The workbook opened; sheet names are in workbook order
    fn workbook_loaded(&mut self, _sheet_names: &[String]) {}

    /// A worksheet has been read and is about to be scanned
    fn sheet_started(&mut self, _sheet: &Worksheet) {}

    fn merged_cells_found(&mut self, _count: usize) {}

    /// A scanned row yielded at least one recorded cell (`row` is 1-based)
    fn row_scanned(&mut self, _row: u32, _cell_count: usize) {}

    fn report_written(&mut self, _path: &Path) {}

    /// A labelled input is absent from the base directory
    fn file_missing(&mut self, _label: &str, _path: &Path) {}

    fn file_failed(&mut self, _path: &Path, _error: &ProbeError) {}

    /// Called once after every input was handled
    fn summary(&mut self, _outcomes: &[BatchOutcome]) {}
}

/// Discards every notification
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl AnalysisObserver for NullObserver {}

/// Forwards progress to `tracing`: per-sheet detail at debug, results at info
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl AnalysisObserver for TracingObserver {
    fn workbook_started(&mut self, path: &Path) {
        tracing::debug!(file = %path.display(), "analyzing workbook");
    }

    fn workbook_loaded(&mut self, sheet_names: &[String]) {
        tracing::debug!(sheets = ?sheet_names, "workbook loaded");
    }

    fn sheet_started(&mut self, sheet: &Worksheet) {
        tracing::debug!(
            sheet = %sheet.name,
            dimensions = %sheet.dimensions(),
            max_row = sheet.max_row,
            max_col = sheet.max_col,
            "analyzing sheet"
        );
    }

    fn merged_cells_found(&mut self, count: usize) {
        tracing::debug!(count, "merged cells");
    }

    fn row_scanned(&mut self, row: u32, cell_count: usize) {
        tracing::debug!(row, cells = cell_count, "row with data");
    }

    fn report_written(&mut self, path: &Path) {
        tracing::info!(output = %path.display(), "analysis saved");
    }

    fn file_missing(&mut self, label: &str, path: &Path) {
        tracing::warn!(forms = label, file = %path.display(), "input file not found");
    }

    fn file_failed(&mut self, path: &Path, error: &ProbeError) {
        tracing::error!(file = %path.display(), %error, "analysis failed");
    }

    fn summary(&mut self, outcomes: &[BatchOutcome]) {
        for outcome in outcomes {
            if let FileResult::Analyzed(report) = &outcome.result {
                for sheet in report.sheets() {
                    tracing::info!(
                        forms = outcome.label,
                        sheet = %sheet.sheet_name,
                        rows = sheet.max_row,
                        cols = sheet.max_col,
                        merged = sheet.merged_cells.len(),
                        "sheet summary"
                    );
                }
            }
        }
    }
}
