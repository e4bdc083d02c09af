//! Workbook loader built on custom XML parsers over the ZIP package

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use zip::ZipArchive;

use crate::error::{LoadError, LoadResult};

pub mod parser_utils;
pub mod styles;
pub mod workbook;
pub mod xlsx_parser;

pub use self::xlsx_parser::XlsxReader;
pub use workbook::{AlignmentStyle, Cell, CellRange, CellStyle, CellValue, FontStyle, Worksheet};

/// Read-only access to the sheets of an opened workbook
pub trait WorkbookReader {
    /// Sheet names in workbook order
    fn sheet_names(&self) -> Vec<String>;
    /// Parse one worksheet by its display name
    fn read_worksheet(&mut self, name: &str) -> LoadResult<Worksheet>;
}

/// Open a workbook file for structural reading
pub fn open_workbook<P: AsRef<Path>>(path: P) -> LoadResult<XlsxReader<BufReader<File>>> {
    let path_ref = path.as_ref();

    if !path_ref.exists() {
        return Err(LoadError::NotFound(path_ref.to_path_buf()));
    }

    let is_xlsx = path_ref
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.eq_ignore_ascii_case("xlsx") || s.eq_ignore_ascii_case("xlsm"))
        .unwrap_or(false);
    if !is_xlsx {
        return Err(LoadError::UnsupportedFormat(path_ref.to_path_buf()));
    }

    let file = File::open(path_ref)?;
    let archive = ZipArchive::new(BufReader::new(file))?;
    XlsxReader::new(archive)
}
