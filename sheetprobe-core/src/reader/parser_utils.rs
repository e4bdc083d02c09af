//! Common parsing utilities shared by the XLSX part parsers

use quick_xml::Reader;
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesStart, Event};

use crate::error::LoadResult;

/// Parse a cell reference like "A1" into (row, col) as 0-based indices
pub fn parse_cell_ref(cell_ref: &str) -> Option<(u32, u32)> {
    let mut col = 0u32;
    let mut row_str = String::new();

    for ch in cell_ref.chars() {
        if ch.is_ascii_alphabetic() {
            col = col
                .checked_mul(26)?
                .checked_add(ch.to_ascii_uppercase() as u32 - 'A' as u32 + 1)?;
        } else if ch.is_ascii_digit() {
            row_str.push(ch);
        }
    }

    if row_str.is_empty() || col == 0 {
        return None;
    }

    let row = row_str.parse::<u32>().ok()?;
    if row == 0 {
        return None;
    }

    // Convert to 0-based
    Some((row - 1, col - 1))
}

/// Parse a cell range like "A1:B2" into (start_row, start_col, end_row, end_col).
/// A lone reference is treated as a one-cell range.
pub fn parse_cell_range(range: &str) -> Option<(u32, u32, u32, u32)> {
    match range.split_once(':') {
        Some((start, end)) => {
            let (start_row, start_col) = parse_cell_ref(start)?;
            let (end_row, end_col) = parse_cell_ref(end)?;
            Some((start_row, start_col, end_row, end_col))
        }
        None => {
            let (row, col) = parse_cell_ref(range)?;
            Some((row, col, row, col))
        }
    }
}

/// Convert a 0-based column index to letters (0 -> A, 26 -> AA)
pub fn column_letters(mut col: u32) -> String {
    let mut result = String::new();
    loop {
        result.insert(0, (b'A' + (col % 26) as u8) as char);
        if col < 26 {
            break;
        }
        col = col / 26 - 1;
    }
    result
}

/// Excel-style reference for 0-based indices (0, 0 -> "A1")
pub fn cell_coordinate(row: u32, col: u32) -> String {
    format!("{}{}", column_letters(col), row + 1)
}

/// Read text content from an XML node, up to its closing tag
pub fn read_text_node<R: std::io::BufRead>(reader: &mut Reader<R>) -> LoadResult<String> {
    let mut buf = Vec::new();
    let mut text = String::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Text(e) => text.push_str(e.unescape()?.as_ref()),
            Event::CData(e) => text.push_str(&String::from_utf8_lossy(e.as_ref())),
            Event::End(_) => break,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(text)
}

/// Look up an attribute by key and return its unescaped value
pub fn attr_value(e: &BytesStart<'_>, key: &[u8]) -> LoadResult<Option<String>> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == key {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

/// OOXML boolean attribute: "1"/"true" are true, everything else false
pub fn is_truthy(attr: &Attribute<'_>) -> bool {
    matches!(attr.value.as_ref(), b"1" | b"true")
}
