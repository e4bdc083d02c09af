//! Worksheet data structures

use std::collections::BTreeMap;
use std::fmt;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

use super::parser_utils::cell_coordinate;

/// Represents a worksheet as read from the package
#[derive(Debug, Clone, Default)]
pub struct Worksheet {
    pub name: String,
    /// Cells keyed by 0-based (row, col), including styled cells without a value
    pub cells: BTreeMap<(u32, u32), Cell>,
    /// Merged cell ranges in document order
    pub merged_cells: Vec<CellRange>,
    /// 1-based index of the last row holding a cell or a merged range
    pub max_row: u32,
    /// 1-based index of the last column holding a cell or a merged range
    pub max_col: u32,
}

impl Worksheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cells: BTreeMap::new(),
            merged_cells: Vec::new(),
            max_row: 1,
            max_col: 1,
        }
    }

    /// Get a cell at the given 0-based position
    pub fn get_cell(&self, row: u32, col: u32) -> Option<&Cell> {
        self.cells.get(&(row, col))
    }

    /// Insert a cell, growing the sheet extent to cover it
    pub fn insert_cell(&mut self, cell: Cell) {
        self.extend_to(cell.row, cell.col);
        self.cells.insert((cell.row, cell.col), cell);
    }

    /// Register a merged range, growing the sheet extent to cover it
    pub fn add_merged_range(&mut self, range: CellRange) {
        self.extend_to(range.end_row, range.end_col);
        self.merged_cells.push(range);
    }

    /// Blank the values of cells covered by a merged range, except the range's top-left cell
    pub fn clear_merged_followers(&mut self) {
        for range in &self.merged_cells {
            for row in range.start_row..=range.end_row {
                let followers = self
                    .cells
                    .range_mut((row, range.start_col)..=(row, range.end_col))
                    .filter(|((r, c), _)| (*r, *c) != (range.start_row, range.start_col));
                for (_, cell) in followers {
                    cell.value = CellValue::Empty;
                }
            }
        }
    }

    fn extend_to(&mut self, row: u32, col: u32) {
        self.max_row = self.max_row.max(row + 1);
        self.max_col = self.max_col.max(col + 1);
    }

    /// Used range in A1 form, e.g. "A1:J45"
    pub fn dimensions(&self) -> String {
        let positions = self
            .cells
            .keys()
            .copied()
            .chain(self.merged_cells.iter().flat_map(|r| {
                [(r.start_row, r.start_col), (r.end_row, r.end_col)]
            }));

        let mut bounds: Option<(u32, u32, u32, u32)> = None;
        for (row, col) in positions {
            bounds = Some(match bounds {
                None => (row, col, row, col),
                Some((r0, c0, r1, c1)) => (r0.min(row), c0.min(col), r1.max(row), c1.max(col)),
            });
        }

        let (r0, c0, r1, c1) = bounds.unwrap_or((0, 0, 0, 0));
        CellRange::new(r0, c0, r1, c1).to_string()
    }
}

/// An inclusive rectangular range with 0-based bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRange {
    pub start_row: u32,
    pub start_col: u32,
    pub end_row: u32,
    pub end_col: u32,
}

impl CellRange {
    pub fn new(start_row: u32, start_col: u32, end_row: u32, end_col: u32) -> Self {
        Self {
            start_row: start_row.min(end_row),
            start_col: start_col.min(end_col),
            end_row: start_row.max(end_row),
            end_col: start_col.max(end_col),
        }
    }

    pub fn contains(&self, row: u32, col: u32) -> bool {
        row >= self.start_row && row <= self.end_row && col >= self.start_col && col <= self.end_col
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let start = cell_coordinate(self.start_row, self.start_col);
        if self.start_row == self.end_row && self.start_col == self.end_col {
            write!(f, "{}", start)
        } else {
            write!(f, "{}:{}", start, cell_coordinate(self.end_row, self.end_col))
        }
    }
}

/// Represents a single cell
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub row: u32,
    pub col: u32,
    pub value: CellValue,
    pub style: CellStyle,
}

impl Cell {
    pub fn coordinate(&self) -> String {
        cell_coordinate(self.row, self.col)
    }
}

/// Cell value types
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    /// Numeric value with the literal stored in the sheet
    Number { value: f64, raw: String },
    Boolean(bool),
    Error(String),
    /// Date, already converted from the serial number
    Date(NaiveDateTime),
    /// Time of day, for serial numbers below one day
    Time(NaiveTime),
    /// Formula text without the leading '='
    Formula(String),
}

impl CellValue {
    /// Check if the cell holds nothing worth reporting.
    ///
    /// Zero and `false` count as empty, like blank text.
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) | CellValue::Error(s) => s.is_empty(),
            CellValue::Formula(f) => f.is_empty(),
            CellValue::Number { value, .. } => *value == 0.0,
            CellValue::Boolean(b) => !b,
            CellValue::Date(_) | CellValue::Time(_) => false,
        }
    }

    /// Render the value the way it is reported in `CellInfo.value`
    pub fn display_string(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) | CellValue::Error(s) => s.clone(),
            CellValue::Number { value, raw } => format_number(*value, raw),
            CellValue::Boolean(true) => "True".to_string(),
            CellValue::Boolean(false) => "False".to_string(),
            CellValue::Date(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
            CellValue::Time(t) => t.format("%H:%M:%S").to_string(),
            CellValue::Formula(f) => format!("={}", f),
        }
    }
}

fn format_number(value: f64, raw: &str) -> String {
    let integral_literal = !raw.contains(['.', 'e', 'E']);
    if integral_literal && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{:?}", value)
    }
}

/// Day zero of the serial date system (1899-12-30, or 1904-01-01)
fn excel_epoch(date1904: bool) -> NaiveDate {
    if date1904 {
        NaiveDate::from_ymd_opt(1904, 1, 1).unwrap_or_default()
    } else {
        NaiveDate::from_ymd_opt(1899, 12, 30).unwrap_or_default()
    }
}

/// Convert a serial date number into a timestamp, rounded to the second
pub(crate) fn serial_to_datetime(serial: f64, date1904: bool) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    let millis = (serial * 86_400_000.0).round() as i64;
    let mut seconds = (millis + 500) / 1000;
    // 1900 counts a 29 February that never existed, so earlier serials are a day behind
    if !date1904 && (1.0..60.0).contains(&serial) {
        seconds += 86_400;
    }
    let midnight = excel_epoch(date1904).and_hms_opt(0, 0, 0)?;
    midnight.checked_add_signed(Duration::try_seconds(seconds)?)
}

/// Convert a serial number into a date, or a time of day when it is below one day
pub(crate) fn serial_to_value(serial: f64, date1904: bool) -> Option<CellValue> {
    let dt = serial_to_datetime(serial, date1904)?;
    if serial < 1.0 {
        Some(CellValue::Time(dt.time()))
    } else {
        Some(CellValue::Date(dt))
    }
}

/// Presentation attributes resolved for one cell
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellStyle {
    pub font: Option<FontStyle>,
    pub alignment: Option<AlignmentStyle>,
    /// The cell's border draws at least one edge
    pub border: bool,
    /// The cell carries a pattern or gradient fill
    pub fill: bool,
    pub number_format: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FontStyle {
    pub bold: bool,
    pub size: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlignmentStyle {
    pub horizontal: Option<String>,
    pub vertical: Option<String>,
}
