//! Report data structures and the JSON report writer

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::WriteError;

/// Suffix appended to the input stem to name the report file
pub const REPORT_SUFFIX: &str = "_analysis.json";

/// Structural summary of one worksheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorksheetStructure {
    pub sheet_name: String,
    pub max_row: u32,
    pub max_col: u32,
    pub merged_cells: Vec<String>,
    /// Scanned cells with a bold font
    pub headers: Vec<CellInfo>,
    /// Scanned non-empty cells, grouped by row
    pub data_cells: Vec<Vec<CellInfo>>,
    /// Always empty; kept so consumers of the format see the key
    #[serde(default)]
    pub formats: BTreeMap<String, serde_json::Value>,
}

/// Presentation metadata of one scanned cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellInfo {
    pub row: u32,
    pub col: u32,
    pub value: String,
    pub coordinate: String,
    pub font_bold: bool,
    pub font_size: Option<f64>,
    pub alignment: AlignmentInfo,
    pub border: bool,
    pub fill: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlignmentInfo {
    pub horizontal: Option<String>,
    pub vertical: Option<String>,
}

/// Per-sheet structures of one workbook, in workbook order.
///
/// Serializes as a JSON object keyed by sheet name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkbookReport {
    sheets: Vec<WorksheetStructure>,
}

impl WorkbookReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sheet; a sheet with the same name is replaced in place
    pub fn insert(&mut self, structure: WorksheetStructure) {
        match self
            .sheets
            .iter_mut()
            .find(|s| s.sheet_name == structure.sheet_name)
        {
            Some(existing) => *existing = structure,
            None => self.sheets.push(structure),
        }
    }

    pub fn get(&self, sheet_name: &str) -> Option<&WorksheetStructure> {
        self.sheets.iter().find(|s| s.sheet_name == sheet_name)
    }

    pub fn sheets(&self) -> &[WorksheetStructure] {
        &self.sheets
    }

    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }
}

impl Serialize for WorkbookReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.sheets.len()))?;
        for sheet in &self.sheets {
            map.serialize_entry(&sheet.sheet_name, sheet)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for WorkbookReport {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ReportVisitor;

        impl<'de> Visitor<'de> for ReportVisitor {
            type Value = WorkbookReport;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of sheet names to worksheet structures")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut report = WorkbookReport::new();
                while let Some((_name, structure)) =
                    access.next_entry::<String, WorksheetStructure>()?
                {
                    report.insert(structure);
                }
                Ok(report)
            }
        }

        deserializer.deserialize_map(ReportVisitor)
    }
}

/// Output path for an input workbook: the stem plus `_analysis.json`, next to the input
pub fn report_path_for(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    input.with_file_name(format!("{}{}", stem, REPORT_SUFFIX))
}

/// Write a report as 2-space indented UTF-8 JSON, replacing any existing file
pub fn write_report(report: &WorkbookReport, path: &Path) -> Result<(), WriteError> {
    let json = serde_json::to_string_pretty(report)?;
    fs::write(path, json).map_err(|source| WriteError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Load a report previously written by [`write_report`]
pub fn read_report(path: &Path) -> anyhow::Result<WorkbookReport> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}
