//! Batch driver over the fixed pair of form workbooks

use std::path::{Path, PathBuf};

use crate::analyzer::analyze_worksheet;
use crate::config::ProbeConfig;
use crate::error::ProbeError;
use crate::observer::AnalysisObserver;
use crate::reader::{WorkbookReader, open_workbook};
use crate::report::{WorkbookReport, report_path_for, write_report};

/// The labelled inputs processed on every run, relative to the base directory
pub const FIXED_INPUTS: [(&str, &str); 2] = [
    ("Input Forms", "MSWDO-2025-RPMES-Input-Forms-1-4 (1).xlsx"),
    ("Output Forms", "RPMES-Output-Forms-5-11.xlsx"),
];

/// What happened to one input of a batch
#[derive(Debug)]
pub struct BatchOutcome {
    pub label: &'static str,
    pub input: PathBuf,
    pub result: FileResult,
}

#[derive(Debug)]
pub enum FileResult {
    /// The report was built and written next to the input
    Analyzed(WorkbookReport),
    Missing,
    /// Loading or writing failed; holds the rendered cause
    Failed(String),
}

impl BatchOutcome {
    pub fn report(&self) -> Option<&WorkbookReport> {
        match &self.result {
            FileResult::Analyzed(report) => Some(report),
            _ => None,
        }
    }
}

/// Analyze every sheet of one workbook and write its JSON report.
///
/// Nothing is written when any sheet fails to load.
pub fn analyze_file(
    path: &Path,
    config: &ProbeConfig,
    observer: &mut dyn AnalysisObserver,
) -> Result<WorkbookReport, ProbeError> {
    let mut report = WorkbookReport::new();
    {
        let mut workbook = open_workbook(path)?;
        let sheet_names = workbook.sheet_names();
        observer.workbook_loaded(&sheet_names);

        for name in &sheet_names {
            let sheet = workbook.read_worksheet(name)?;
            report.insert(analyze_worksheet(&sheet, config.scan, observer));
        }
    }

    let output = report_path_for(path);
    write_report(&report, &output)?;
    observer.report_written(&output);

    Ok(report)
}

/// Run the pipeline for each input that exists under `base_dir`.
///
/// Failures are reported to the observer and logged; the batch always
/// runs to the end and closes with `observer.summary`.
pub fn run_batch(
    base_dir: &Path,
    inputs: &[(&'static str, &str)],
    config: &ProbeConfig,
    observer: &mut dyn AnalysisObserver,
) -> Vec<BatchOutcome> {
    let mut outcomes = Vec::with_capacity(inputs.len());

    for &(label, file_name) in inputs {
        let input = base_dir.join(file_name);

        let result = if !input.exists() {
            observer.file_missing(label, &input);
            FileResult::Missing
        } else {
            observer.workbook_started(&input);
            match analyze_file(&input, config, observer) {
                Ok(report) => FileResult::Analyzed(report),
                Err(err) => {
                    tracing::debug!(file = %input.display(), error = ?err, "skipping input");
                    observer.file_failed(&input, &err);
                    FileResult::Failed(err.to_string())
                }
            }
        };

        outcomes.push(BatchOutcome {
            label,
            input,
            result,
        });
    }

    observer.summary(&outcomes);
    outcomes
}
