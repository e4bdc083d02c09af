//! Worksheet structure extraction over a bounded preview window

use std::collections::BTreeMap;

use crate::config::ScanWindow;
use crate::observer::AnalysisObserver;
use crate::reader::{Cell, Worksheet};
use crate::report::{AlignmentInfo, CellInfo, WorksheetStructure};

/// Build the structure summary of one worksheet.
///
/// Only the top-left `window` of the sheet is scanned, so the cost does
/// not depend on the sheet size. Merged ranges and extents always cover
/// the whole sheet.
pub fn analyze_worksheet(
    sheet: &Worksheet,
    window: ScanWindow,
    observer: &mut dyn AnalysisObserver,
) -> WorksheetStructure {
    observer.sheet_started(sheet);

    let merged_cells: Vec<String> = sheet.merged_cells.iter().map(|r| r.to_string()).collect();
    observer.merged_cells_found(merged_cells.len());

    let last_row = window.row_limit.min(sheet.max_row);
    let last_col = window.col_limit.min(sheet.max_col);

    let mut headers = Vec::new();
    let mut data_cells = Vec::new();

    for row in 1..=last_row {
        let mut row_data = Vec::new();
        for col in 1..=last_col {
            let Some(cell) = sheet.get_cell(row - 1, col - 1) else {
                continue;
            };
            let Some(info) = cell_info(cell) else {
                continue;
            };
            if info.font_bold {
                headers.push(info.clone());
            }
            row_data.push(info);
        }

        if !row_data.is_empty() {
            observer.row_scanned(row, row_data.len());
            data_cells.push(row_data);
        }
    }

    WorksheetStructure {
        sheet_name: sheet.name.clone(),
        max_row: sheet.max_row,
        max_col: sheet.max_col,
        merged_cells,
        headers,
        data_cells,
        formats: BTreeMap::new(),
    }
}

/// Describe a cell, or `None` when it holds no value
fn cell_info(cell: &Cell) -> Option<CellInfo> {
    if cell.value.is_empty() {
        return None;
    }
    let value = cell.value.display_string();
    if value.is_empty() {
        return None;
    }

    let font = cell.style.font.as_ref();
    let alignment = cell
        .style
        .alignment
        .as_ref()
        .map(|a| AlignmentInfo {
            horizontal: a.horizontal.clone(),
            vertical: a.vertical.clone(),
        })
        .unwrap_or_default();

    Some(CellInfo {
        row: cell.row + 1,
        col: cell.col + 1,
        value,
        coordinate: cell.coordinate(),
        font_bold: font.is_some_and(|f| f.bold),
        font_size: font.and_then(|f| f.size),
        alignment,
        border: cell.style.border,
        fill: cell.style.fill,
    })
}
