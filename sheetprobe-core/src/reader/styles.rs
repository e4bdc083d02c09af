//! Parsing of `xl/styles.xml` into resolvable cell styles

use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read, Seek};

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use zip::ZipArchive;

use super::parser_utils::is_truthy;
use super::workbook::{AlignmentStyle, CellStyle, FontStyle};
use crate::error::LoadResult;

/// One entry of `<cellXfs>`
#[derive(Debug, Clone, Default, PartialEq)]
struct CellFormat {
    num_fmt_id: u32,
    font_id: usize,
    fill_id: usize,
    border_id: usize,
    alignment: Option<AlignmentStyle>,
}

/// Size of the body font a workbook without a styles part is shown with
const DEFAULT_FONT_SIZE: f64 = 11.0;

/// Style tables of a workbook, indexed the way cells reference them
#[derive(Debug, Clone, Default)]
pub struct StyleSheet {
    /// False when the package has no styles part at all
    present: bool,
    num_fmts: HashMap<u32, String>,
    fonts: Vec<FontStyle>,
    /// Per fill: whether it paints anything
    fills: Vec<bool>,
    /// Per border: whether any edge is drawn
    borders: Vec<bool>,
    cell_xfs: Vec<CellFormat>,
}

impl StyleSheet {
    /// Resolve the style a cell with the given `s` attribute carries
    pub fn resolve(&self, style_index: Option<usize>) -> CellStyle {
        if !self.present {
            return CellStyle {
                font: Some(FontStyle {
                    bold: false,
                    size: Some(DEFAULT_FONT_SIZE),
                }),
                number_format: builtin_number_format(0).map(str::to_string),
                ..CellStyle::default()
            };
        }

        let index = style_index.unwrap_or(0);
        let Some(xf) = self.cell_xfs.get(index) else {
            tracing::debug!(index, "cell references an unknown style, using defaults");
            return CellStyle::default();
        };

        CellStyle {
            font: self.fonts.get(xf.font_id).cloned(),
            alignment: xf.alignment.clone(),
            border: self.borders.get(xf.border_id).copied().unwrap_or(false),
            fill: self.fills.get(xf.fill_id).copied().unwrap_or(false),
            number_format: self.number_format(xf.num_fmt_id).map(str::to_string),
        }
    }

    fn number_format(&self, id: u32) -> Option<&str> {
        self.num_fmts
            .get(&id)
            .map(String::as_str)
            .or_else(|| builtin_number_format(id))
    }
}

/// Read the workbook styles; a package without `xl/styles.xml` yields empty tables
pub fn read_styles<R: Read + Seek>(archive: &mut ZipArchive<R>) -> LoadResult<StyleSheet> {
    let styles_xml = match archive.by_name("xl/styles.xml") {
        Ok(file) => file,
        Err(_) => return Ok(StyleSheet::default()),
    };
    parse_styles_xml(BufReader::new(styles_xml))
}

/// Parse the content of a styles part
pub fn parse_styles_xml<B: BufRead>(source: B) -> LoadResult<StyleSheet> {
    let mut reader = Reader::from_reader(source);
    reader.config_mut().trim_text(true);

    let mut styles = StyleSheet {
        present: true,
        ..StyleSheet::default()
    };

    let mut buf = Vec::new();
    let mut in_fonts = false;
    let mut in_fills = false;
    let mut in_borders = false;
    let mut in_cell_xfs = false;
    let mut current_font: Option<FontStyle> = None;
    let mut current_fill: Option<bool> = None;
    let mut current_border: Option<bool> = None;
    let mut current_xf: Option<CellFormat> = None;

    loop {
        let event = reader.read_event_into(&mut buf)?;
        let is_empty = matches!(event, Event::Empty(_));
        match event {
            Event::Start(e) | Event::Empty(e) => match e.name().as_ref() {
                b"numFmt" => {
                    let mut id = None;
                    let mut code = None;
                    for attr in e.attributes().flatten() {
                        match attr.key.as_ref() {
                            b"numFmtId" => id = attr.unescape_value()?.parse::<u32>().ok(),
                            b"formatCode" => code = Some(attr.unescape_value()?.into_owned()),
                            _ => {}
                        }
                    }
                    if let (Some(id), Some(code)) = (id, code) {
                        styles.num_fmts.insert(id, code);
                    }
                }

                b"fonts" if !is_empty => in_fonts = true,
                b"font" if in_fonts => {
                    if is_empty {
                        styles.fonts.push(FontStyle::default());
                    } else {
                        current_font = Some(FontStyle::default());
                    }
                }
                b"b" => {
                    if let Some(font) = current_font.as_mut() {
                        font.bold = e
                            .attributes()
                            .flatten()
                            .find(|a| a.key.as_ref() == b"val")
                            .map(|a| is_truthy(&a))
                            .unwrap_or(true);
                    }
                }
                b"sz" => {
                    if let Some(font) = current_font.as_mut() {
                        for attr in e.attributes().flatten() {
                            if attr.key.as_ref() == b"val" {
                                font.size = attr.unescape_value()?.parse::<f64>().ok();
                            }
                        }
                    }
                }

                b"fills" if !is_empty => in_fills = true,
                b"fill" if in_fills => {
                    if is_empty {
                        styles.fills.push(false);
                    } else {
                        current_fill = Some(false);
                    }
                }
                b"patternFill" => {
                    if let Some(fill) = current_fill.as_mut() {
                        for attr in e.attributes().flatten() {
                            if attr.key.as_ref() == b"patternType" {
                                *fill = attr.value.as_ref() != b"none";
                            }
                        }
                    }
                }
                b"gradientFill" => {
                    if let Some(fill) = current_fill.as_mut() {
                        *fill = true;
                    }
                }

                b"borders" if !is_empty => in_borders = true,
                b"border" if in_borders => {
                    if is_empty {
                        styles.borders.push(false);
                    } else {
                        current_border = Some(false);
                    }
                }
                b"left" | b"right" | b"top" | b"bottom" | b"diagonal" | b"start" | b"end" => {
                    if let Some(border) = current_border.as_mut() {
                        for attr in e.attributes().flatten() {
                            if attr.key.as_ref() == b"style" && attr.value.as_ref() != b"none" {
                                *border = true;
                            }
                        }
                    }
                }

                b"cellXfs" if !is_empty => in_cell_xfs = true,
                b"xf" if in_cell_xfs => {
                    let xf = parse_xf(&e)?;
                    if is_empty {
                        styles.cell_xfs.push(xf);
                    } else {
                        current_xf = Some(xf);
                    }
                }
                b"alignment" => {
                    if let Some(xf) = current_xf.as_mut() {
                        xf.alignment = Some(parse_alignment(&e)?);
                    }
                }
                _ => {}
            },
            Event::End(e) => match e.name().as_ref() {
                b"fonts" => in_fonts = false,
                b"font" => {
                    if let Some(font) = current_font.take() {
                        styles.fonts.push(font);
                    }
                }
                b"fills" => in_fills = false,
                b"fill" => {
                    if let Some(fill) = current_fill.take() {
                        styles.fills.push(fill);
                    }
                }
                b"borders" => in_borders = false,
                b"border" => {
                    if let Some(border) = current_border.take() {
                        styles.borders.push(border);
                    }
                }
                b"cellXfs" => in_cell_xfs = false,
                b"xf" => {
                    if let Some(xf) = current_xf.take() {
                        styles.cell_xfs.push(xf);
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(styles)
}

fn parse_xf(e: &BytesStart<'_>) -> LoadResult<CellFormat> {
    let mut xf = CellFormat::default();
    for attr in e.attributes().flatten() {
        let value = attr.unescape_value()?;
        match attr.key.as_ref() {
            b"numFmtId" => xf.num_fmt_id = value.parse().unwrap_or(0),
            b"fontId" => xf.font_id = value.parse().unwrap_or(0),
            b"fillId" => xf.fill_id = value.parse().unwrap_or(0),
            b"borderId" => xf.border_id = value.parse().unwrap_or(0),
            _ => {}
        }
    }
    Ok(xf)
}

fn parse_alignment(e: &BytesStart<'_>) -> LoadResult<AlignmentStyle> {
    let mut alignment = AlignmentStyle::default();
    for attr in e.attributes().flatten() {
        match attr.key.as_ref() {
            b"horizontal" => alignment.horizontal = Some(attr.unescape_value()?.into_owned()),
            b"vertical" => alignment.vertical = Some(attr.unescape_value()?.into_owned()),
            _ => {}
        }
    }
    Ok(alignment)
}

/// Built-in number formats that workbooks reference by id only
fn builtin_number_format(id: u32) -> Option<&'static str> {
    let code = match id {
        0 => "General",
        1 => "0",
        2 => "0.00",
        3 => "#,##0",
        4 => "#,##0.00",
        9 => "0%",
        10 => "0.00%",
        11 => "0.00E+00",
        12 => "# ?/?",
        13 => "# ??/??",
        14 => "mm-dd-yy",
        15 => "d-mmm-yy",
        16 => "d-mmm",
        17 => "mmm-yy",
        18 => "h:mm AM/PM",
        19 => "h:mm:ss AM/PM",
        20 => "h:mm",
        21 => "h:mm:ss",
        22 => "m/d/yy h:mm",
        37 => "#,##0 ;(#,##0)",
        38 => "#,##0 ;[Red](#,##0)",
        39 => "#,##0.00;(#,##0.00)",
        40 => "#,##0.00;[Red](#,##0.00)",
        45 => "mm:ss",
        46 => "[h]:mm:ss",
        47 => "mmss.0",
        48 => "##0.0E+0",
        49 => "@",
        _ => return None,
    };
    Some(code)
}

/// Whether a number format renders its value as a date or time
pub fn is_date_format(code: &str) -> bool {
    let mut cleaned = String::new();
    let mut chars = code.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                for c in chars.by_ref() {
                    if c == '"' {
                        break;
                    }
                }
            }
            '\\' | '_' | '*' => {
                chars.next();
            }
            '[' => {
                let mut section = String::new();
                for c in chars.by_ref() {
                    if c == ']' {
                        break;
                    }
                    section.push(c);
                }
                // Elapsed time markers like [h] or [mm] are date tokens, colors and locales are not
                let lower = section.to_ascii_lowercase();
                if !lower.is_empty() && lower.chars().all(|c| matches!(c, 'h' | 'm' | 's')) {
                    cleaned.push_str(&lower);
                }
            }
            ';' => break,
            _ => cleaned.push(ch.to_ascii_lowercase()),
        }
    }

    if cleaned.contains("general") {
        return false;
    }
    cleaned.chars().any(|c| matches!(c, 'd' | 'm' | 'y' | 'h' | 's'))
}
