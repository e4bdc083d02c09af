//! sheetprobe-core: structure extraction for spreadsheet form templates
//!
//! Reads `.xlsx` workbooks, summarizes the layout of every sheet (extent,
//! merged ranges, bold header cells, alignment, border and fill presence)
//! and writes the result as a JSON report next to the input.

pub mod analyzer;
pub mod config;
pub mod driver;
pub mod error;
pub mod observer;
pub mod reader;
pub mod report;

use std::path::Path;

pub use analyzer::analyze_worksheet;
pub use config::{ProbeConfig, ScanWindow};
pub use driver::{BatchOutcome, FIXED_INPUTS, FileResult};
pub use error::{LoadError, ProbeError, WriteError};
pub use observer::{AnalysisObserver, NullObserver, TracingObserver};
pub use report::{AlignmentInfo, CellInfo, WorkbookReport, WorksheetStructure};

/// Main probe interface
#[derive(Debug, Clone, Default)]
pub struct Probe {
    config: ProbeConfig,
}

impl Probe {
    /// Create a probe with the default scan window
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ProbeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    /// Analyze one workbook and write `<stem>_analysis.json` beside it
    pub fn analyze_file<P: AsRef<Path>>(
        &self,
        path: P,
        observer: &mut dyn AnalysisObserver,
    ) -> Result<WorkbookReport, ProbeError> {
        driver::analyze_file(path.as_ref(), &self.config, observer)
    }

    /// Process the fixed form workbooks found in `base_dir`
    pub fn run<P: AsRef<Path>>(
        &self,
        base_dir: P,
        observer: &mut dyn AnalysisObserver,
    ) -> Vec<BatchOutcome> {
        driver::run_batch(base_dir.as_ref(), &FIXED_INPUTS, &self.config, observer)
    }
}
