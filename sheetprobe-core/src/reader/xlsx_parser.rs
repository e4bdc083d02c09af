//! XML parsing of the XLSX package parts a structural scan needs

use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read, Seek};
use std::sync::LazyLock;

use quick_xml::Reader;
use quick_xml::events::Event;
use regex::{Captures, Regex};
use zip::ZipArchive;

use super::parser_utils::{attr_value, column_letters, is_truthy, parse_cell_range, parse_cell_ref, read_text_node};
use super::styles::{StyleSheet, is_date_format, read_styles};
use super::workbook::{Cell, CellRange, CellStyle, CellValue, Worksheet, serial_to_value};
use super::WorkbookReader;
use crate::error::{LoadError, LoadResult};

/// A sheet listed in `xl/workbook.xml`, with its resolved part path
#[derive(Debug, Clone)]
struct SheetEntry {
    name: String,
    path: String,
}

/// Reader over an open XLSX package
pub struct XlsxReader<R: Read + Seek> {
    archive: ZipArchive<R>,
    sheets: Vec<SheetEntry>,
    shared_strings: Vec<String>,
    styles: StyleSheet,
    date1904: bool,
}

impl<R: Read + Seek> XlsxReader<R> {
    /// Read the workbook-level parts (sheet list, shared strings, styles)
    pub fn new(mut archive: ZipArchive<R>) -> LoadResult<Self> {
        let (sheet_refs, date1904) = read_workbook_xml(&mut archive)?;
        let relationships = read_workbook_rels(&mut archive)?;

        let mut sheets = Vec::with_capacity(sheet_refs.len());
        for (name, rid) in sheet_refs {
            let target = relationships.get(&rid).ok_or_else(|| {
                LoadError::invalid(format!("relationship '{}' not found for sheet '{}'", rid, name))
            })?;
            sheets.push(SheetEntry {
                name,
                path: resolve_part_path(target),
            });
        }

        let shared_strings = extract_shared_strings(&mut archive)?;
        let styles = read_styles(&mut archive)?;

        Ok(Self {
            archive,
            sheets,
            shared_strings,
            styles,
            date1904,
        })
    }
}

impl<R: Read + Seek> WorkbookReader for XlsxReader<R> {
    fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|s| s.name.clone()).collect()
    }

    fn read_worksheet(&mut self, name: &str) -> LoadResult<Worksheet> {
        let entry = self
            .sheets
            .iter()
            .find(|s| s.name == name)
            .cloned()
            .ok_or_else(|| LoadError::invalid(format!("sheet '{}' not found in workbook", name)))?;

        let sheet_xml = self
            .archive
            .by_name(&entry.path)
            .map_err(|_| LoadError::MissingPart(entry.path.clone()))?;

        let context = SheetContext {
            shared_strings: &self.shared_strings,
            styles: &self.styles,
            date1904: self.date1904,
        };
        parse_sheet_xml(&entry.name, BufReader::new(sheet_xml), &context)
    }
}

/// Sheet names with their relationship ids, and the date1904 flag
fn read_workbook_xml<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
) -> LoadResult<(Vec<(String, String)>, bool)> {
    let workbook_xml = archive
        .by_name("xl/workbook.xml")
        .map_err(|_| LoadError::MissingPart("xl/workbook.xml".to_string()))?;
    let mut reader = Reader::from_reader(BufReader::new(workbook_xml));
    reader.config_mut().trim_text(true);

    let mut sheets = Vec::new();
    let mut date1904 = false;
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) => match e.name().as_ref() {
                b"sheet" => {
                    let mut name = String::new();
                    let mut rid = String::new();
                    for attr in e.attributes().flatten() {
                        match attr.key.as_ref() {
                            b"name" => name = attr.unescape_value()?.into_owned(),
                            _ if attr.key.local_name().as_ref() == b"id" => {
                                rid = attr.unescape_value()?.into_owned()
                            }
                            _ => {}
                        }
                    }
                    if name.is_empty() {
                        return Err(LoadError::invalid("sheet entry without a name"));
                    }
                    sheets.push((name, rid));
                }
                b"workbookPr" => {
                    for attr in e.attributes().flatten() {
                        if attr.key.as_ref() == b"date1904" {
                            date1904 = is_truthy(&attr);
                        }
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok((sheets, date1904))
}

/// Relationship id -> target for the workbook part
fn read_workbook_rels<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
) -> LoadResult<HashMap<String, String>> {
    let rels_xml = archive
        .by_name("xl/_rels/workbook.xml.rels")
        .map_err(|_| LoadError::MissingPart("xl/_rels/workbook.xml.rels".to_string()))?;
    let mut reader = Reader::from_reader(BufReader::new(rels_xml));
    reader.config_mut().trim_text(true);

    let mut rels = HashMap::new();
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) if e.name().as_ref() == b"Relationship" => {
                let mut id = String::new();
                let mut target = String::new();
                for attr in e.attributes().flatten() {
                    match attr.key.as_ref() {
                        b"Id" => id = attr.unescape_value()?.into_owned(),
                        b"Target" => target = attr.unescape_value()?.into_owned(),
                        _ => {}
                    }
                }
                rels.insert(id, target);
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(rels)
}

/// Targets are relative to `xl/` unless they are package-absolute
fn resolve_part_path(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("xl/{}", target),
    }
}

/// Read `xl/sharedStrings.xml`; rich-text runs are concatenated, phonetic runs skipped
pub fn extract_shared_strings<R: Read + Seek>(archive: &mut ZipArchive<R>) -> LoadResult<Vec<String>> {
    let mut strings = Vec::new();
    let ss_xml = match archive.by_name("xl/sharedStrings.xml") {
        Ok(file) => file,
        Err(_) => return Ok(strings),
    };

    let mut reader = Reader::from_reader(BufReader::new(ss_xml));
    let mut buf = Vec::new();
    let mut current_string = String::new();
    let mut in_phonetic = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"rPh" => in_phonetic = true,
                b"t" if !in_phonetic => current_string.push_str(&read_text_node(&mut reader)?),
                _ => {}
            },
            Event::End(e) => match e.name().as_ref() {
                b"rPh" => in_phonetic = false,
                b"si" => strings.push(std::mem::take(&mut current_string)),
                _ => {}
            },
            Event::Empty(e) if e.name().as_ref() == b"si" => strings.push(String::new()),
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(strings)
}

/// Workbook-level tables a sheet parse resolves against
struct SheetContext<'a> {
    shared_strings: &'a [String],
    styles: &'a StyleSheet,
    date1904: bool,
}

/// Master formula of a shared-formula group
struct SharedFormula {
    text: String,
    row: u32,
    col: u32,
    range: Option<CellRange>,
}

/// Parse one worksheet part into cells and merged ranges
fn parse_sheet_xml<B: BufRead>(name: &str, source: B, context: &SheetContext<'_>) -> LoadResult<Worksheet> {
    let mut sheet = Worksheet::new(name);
    let mut shared_formulas: HashMap<u32, Vec<SharedFormula>> = HashMap::new();

    // Untrimmed, whitespace inside inline strings is content
    let mut reader = Reader::from_reader(source);

    let mut buf = Vec::new();
    let mut current_row = 0u32;
    let mut current_col = 0u32;

    loop {
        let event = reader.read_event_into(&mut buf)?;
        let is_empty = matches!(event, Event::Empty(_));
        match event {
            Event::Start(e) | Event::Empty(e) => match e.name().as_ref() {
                b"row" => {
                    for attr in e.attributes().flatten() {
                        if attr.key.as_ref() == b"r" {
                            current_row = attr
                                .unescape_value()?
                                .parse::<u32>()
                                .map_err(|_| LoadError::invalid("row number is not an integer"))?
                                .saturating_sub(1);
                        }
                    }
                    current_col = 0;
                }
                b"c" => {
                    let mut r_attr = String::new();
                    let mut s_attr = None;
                    let mut t_attr = String::new();
                    for attr in e.attributes().flatten() {
                        match attr.key.as_ref() {
                            b"r" => r_attr = attr.unescape_value()?.into_owned(),
                            b"s" => s_attr = attr.unescape_value()?.parse::<usize>().ok(),
                            b"t" => t_attr = attr.unescape_value()?.into_owned(),
                            _ => {}
                        }
                    }

                    let (row, col) = match parse_cell_ref(&r_attr) {
                        Some((r, c)) => {
                            current_row = r;
                            (r, c)
                        }
                        None => (current_row, current_col),
                    };
                    current_col = col + 1;

                    let style = context.styles.resolve(s_attr);
                    let contents = if is_empty {
                        CellContents::default()
                    } else {
                        parse_cell_contents(&mut reader, &t_attr, context.shared_strings)?
                    };

                    let value = match expand_formula(&mut shared_formulas, contents.formula_parts, row, col) {
                        Some(f) => CellValue::Formula(f),
                        None => apply_number_format(contents.value, &style, context.date1904),
                    };

                    sheet.insert_cell(Cell { row, col, value, style });
                }
                b"mergeCell" => {
                    if let Some(ref_str) = attr_value(&e, b"ref")? {
                        match parse_cell_range(&ref_str) {
                            Some((r0, c0, r1, c1)) => sheet.add_merged_range(CellRange::new(r0, c0, r1, c1)),
                            None => tracing::warn!(sheet = name, range = %ref_str, "skipping malformed merged range"),
                        }
                    }
                }
                _ => {}
            },
            Event::End(e) => {
                if e.name().as_ref() == b"worksheet" {
                    break;
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    sheet.clear_merged_followers();
    Ok(sheet)
}

/// Numbers shown through a date or time format become dates
fn apply_number_format(value: CellValue, style: &CellStyle, date1904: bool) -> CellValue {
    if let CellValue::Number { value: serial, .. } = &value
        && style.number_format.as_deref().is_some_and(is_date_format)
        && let Some(converted) = serial_to_value(*serial, date1904)
    {
        return converted;
    }
    value
}

/// Formula data found in a `<f>` element
#[derive(Debug, Default)]
struct FormulaParts {
    text: Option<String>,
    shared_index: Option<u32>,
    shared_ref: Option<String>,
}

#[derive(Debug)]
struct CellContents {
    value: CellValue,
    formula_parts: FormulaParts,
}

impl Default for CellContents {
    fn default() -> Self {
        Self {
            value: CellValue::Empty,
            formula_parts: FormulaParts::default(),
        }
    }
}

fn parse_cell_contents<R: BufRead>(
    reader: &mut Reader<R>,
    t_attr: &str,
    shared_strings: &[String],
) -> LoadResult<CellContents> {
    let mut contents = CellContents::default();
    let mut buf = Vec::new();

    loop {
        let event = reader.read_event_into(&mut buf)?;
        let is_start = matches!(event, Event::Start(_));
        match event {
            Event::Start(e) | Event::Empty(e) => match e.name().as_ref() {
                b"v" => {
                    let v_text = if is_start { read_text_node(reader)? } else { String::new() };
                    contents.value = match t_attr {
                        "s" => {
                            let idx = v_text.trim().parse::<usize>().unwrap_or(usize::MAX);
                            match shared_strings.get(idx) {
                                Some(s) => CellValue::Text(s.clone()),
                                None => {
                                    tracing::debug!(index = %v_text, "shared string index out of range");
                                    CellValue::Empty
                                }
                            }
                        }
                        "b" => CellValue::Boolean(v_text.trim() == "1"),
                        "e" => CellValue::Error(v_text),
                        "str" | "inlineStr" | "d" => CellValue::Text(v_text),
                        _ => match v_text.trim().parse::<f64>() {
                            Ok(value) => CellValue::Number {
                                value,
                                raw: v_text.trim().to_string(),
                            },
                            Err(_) if v_text.is_empty() => CellValue::Empty,
                            Err(_) => CellValue::Text(v_text),
                        },
                    };
                }
                b"f" => {
                    let mut is_shared = false;
                    for attr in e.attributes().flatten() {
                        match attr.key.as_ref() {
                            b"si" => contents.formula_parts.shared_index = attr.unescape_value()?.parse::<u32>().ok(),
                            b"t" => is_shared = attr.value.as_ref() == b"shared",
                            b"ref" => contents.formula_parts.shared_ref = Some(attr.unescape_value()?.into_owned()),
                            _ => {}
                        }
                    }
                    if is_start {
                        let f_text = read_text_node(reader)?;
                        if !f_text.is_empty() {
                            contents.formula_parts.text = Some(f_text);
                        }
                    }
                    if !is_shared {
                        contents.formula_parts.shared_index = None;
                    }
                }
                b"is" if is_start => {
                    // Inline string can have multiple <t> tags
                    let mut is_text = String::new();
                    let mut is_buf = Vec::new();
                    let mut in_phonetic = false;
                    loop {
                        match reader.read_event_into(&mut is_buf)? {
                            Event::Start(ee) if ee.name().as_ref() == b"rPh" => in_phonetic = true,
                            Event::Start(ee) if ee.name().as_ref() == b"t" && !in_phonetic => {
                                is_text.push_str(&read_text_node(reader)?);
                            }
                            Event::End(ee) if ee.name().as_ref() == b"rPh" => in_phonetic = false,
                            Event::End(ee) if ee.name().as_ref() == b"is" => break,
                            Event::Eof => break,
                            _ => {}
                        }
                        is_buf.clear();
                    }
                    contents.value = CellValue::Text(is_text);
                }
                _ => {}
            },
            Event::End(e) if e.name().as_ref() == b"c" => break,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(contents)
}

/// Produce the formula of a cell, expanding shared-formula references
fn expand_formula(
    shared_formulas: &mut HashMap<u32, Vec<SharedFormula>>,
    parts: FormulaParts,
    row: u32,
    col: u32,
) -> Option<String> {
    let formula = match (parts.shared_index, parts.text) {
        (Some(si), Some(text)) => {
            let range = parts
                .shared_ref
                .as_deref()
                .and_then(parse_cell_range)
                .map(|(r0, c0, r1, c1)| CellRange::new(r0, c0, r1, c1));
            shared_formulas.entry(si).or_default().push(SharedFormula {
                text: text.clone(),
                row,
                col,
                range,
            });
            text
        }
        (Some(si), None) => {
            let defs = shared_formulas.get(&si)?;
            let master = defs
                .iter()
                .find(|d| d.range.is_some_and(|r| r.contains(row, col)))
                .or_else(|| defs.last())?;
            let row_shift = row as i64 - master.row as i64;
            let col_shift = col as i64 - master.col as i64;
            translate_shared_formula(&master.text, row_shift, col_shift)
        }
        (None, text) => text?,
    };

    Some(formula.strip_prefix('=').map(str::to_string).unwrap_or(formula))
}

static CELL_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?P<sheet>(?:'[^']+'|[A-Za-z0-9_.]+)!)?(?P<col_abs>\$?)(?P<col>[A-Z]{1,3})(?P<row_abs>\$?)(?P<row>[0-9]+)",
    )
    .expect("cell reference pattern is valid")
});

/// Shift the relative references of a shared formula by the given offsets
fn translate_shared_formula(formula: &str, row_shift: i64, col_shift: i64) -> String {
    CELL_REFERENCE
        .replace_all(formula, |caps: &Captures| {
            let Some(whole) = caps.get(0) else {
                return String::new();
            };
            // Names like LOG10( or ABC1X are not references
            let inside_name = formula[..whole.start()]
                .chars()
                .next_back()
                .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
            let followed_by_name = formula[whole.end()..]
                .chars()
                .next()
                .is_some_and(|c| c == '(' || c.is_ascii_alphanumeric() || c == '_');
            if inside_name || followed_by_name {
                return whole.as_str().to_string();
            }

            let Some((row, col)) = parse_cell_ref(&format!("{}{}", &caps["col"], &caps["row"])) else {
                return whole.as_str().to_string();
            };
            let col_abs = !caps["col_abs"].is_empty();
            let row_abs = !caps["row_abs"].is_empty();

            let new_row = if row_abs { row } else { (row as i64 + row_shift).max(0) as u32 };
            let new_col = if col_abs { col } else { (col as i64 + col_shift).max(0) as u32 };

            format!(
                "{}{}{}{}{}",
                caps.name("sheet").map_or("", |m| m.as_str()),
                if col_abs { "$" } else { "" },
                column_letters(new_col),
                if row_abs { "$" } else { "" },
                new_row + 1
            )
        })
        .into_owned()
}
