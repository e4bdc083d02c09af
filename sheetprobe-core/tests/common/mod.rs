#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::Path;

use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// Style tables shared by the fixtures.
///
/// cellXfs: 0 plain Calibri 11, 1 bold 14 centered, 2 thin border with
/// solid fill, 3 built-in date format 14, 4 gray125 fill and an empty border.
pub const STYLES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
<fonts count="2">
<font><sz val="11"/><name val="Calibri"/></font>
<font><b/><sz val="14"/><name val="Calibri"/></font>
</fonts>
<fills count="3">
<fill><patternFill patternType="none"/></fill>
<fill><patternFill patternType="gray125"/></fill>
<fill><patternFill patternType="solid"><fgColor rgb="FFFFFF00"/></patternFill></fill>
</fills>
<borders count="2">
<border><left/><right/><top/><bottom/><diagonal/></border>
<border><left style="thin"/><right/><top/><bottom/><diagonal/></border>
</borders>
<cellStyleXfs count="1"><xf numFmtId="0" fontId="1" fillId="0" borderId="0"/></cellStyleXfs>
<cellXfs count="5">
<xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/>
<xf numFmtId="0" fontId="1" fillId="0" borderId="0" xfId="0" applyAlignment="1"><alignment horizontal="center"/></xf>
<xf numFmtId="0" fontId="0" fillId="2" borderId="1" xfId="0"/>
<xf numFmtId="14" fontId="0" fillId="0" borderId="0" xfId="0" applyNumberFormat="1"/>
<xf numFmtId="0" fontId="0" fillId="1" borderId="0" xfId="0"/>
</cellXfs>
</styleSheet>"#;

/// One worksheet of a fixture workbook
pub struct MockSheet {
    pub name: String,
    pub rows: String,
    pub merges: Vec<String>,
}

impl MockSheet {
    /// `rows` is the raw content of `<sheetData>`
    pub fn new(name: &str, rows: &str) -> Self {
        Self {
            name: name.to_string(),
            rows: rows.to_string(),
            merges: Vec::new(),
        }
    }

    pub fn merge(mut self, range: &str) -> Self {
        self.merges.push(range.to_string());
        self
    }

    fn to_xml(&self) -> String {
        let mut xml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
<sheetData>"#,
        );
        xml.push_str(&self.rows);
        xml.push_str("</sheetData>");
        if !self.merges.is_empty() {
            xml.push_str(&format!(r#"<mergeCells count="{}">"#, self.merges.len()));
            for range in &self.merges {
                xml.push_str(&format!(r#"<mergeCell ref="{}"/>"#, range));
            }
            xml.push_str("</mergeCells>");
        }
        xml.push_str("</worksheet>");
        xml
    }
}

/// Contents of a fixture workbook
pub struct MockWorkbook {
    pub sheets: Vec<MockSheet>,
    pub shared_strings: Vec<String>,
    pub styles: Option<String>,
}

impl MockWorkbook {
    pub fn new(sheets: Vec<MockSheet>) -> Self {
        Self {
            sheets,
            shared_strings: Vec::new(),
            styles: Some(STYLES_XML.to_string()),
        }
    }

    pub fn shared_strings(mut self, strings: &[&str]) -> Self {
        self.shared_strings = strings.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn without_styles(mut self) -> Self {
        self.styles = None;
        self
    }

    /// Write the package to `path`
    pub fn write(&self, path: &Path) -> anyhow::Result<()> {
        let file = File::create(path)?;
        let mut zip = ZipWriter::new(file);
        let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);

        zip.start_file("[Content_Types].xml", options)?;
        let mut content_types = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
"#,
        );
        for (i, _) in self.sheets.iter().enumerate() {
            content_types.push_str(&format!(
                r#"<Override PartName="/xl/worksheets/sheet{}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
                i + 1
            ));
        }
        content_types.push_str("</Types>");
        zip.write_all(content_types.as_bytes())?;

        zip.start_file("_rels/.rels", options)?;
        zip.write_all(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
</Relationships>"#.as_bytes())?;

        zip.start_file("xl/workbook.xml", options)?;
        let mut workbook_xml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
<sheets>"#,
        );
        for (i, sheet) in self.sheets.iter().enumerate() {
            workbook_xml.push_str(&format!(
                r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
                sheet.name,
                i + 1,
                i + 1
            ));
        }
        workbook_xml.push_str("</sheets></workbook>");
        zip.write_all(workbook_xml.as_bytes())?;

        zip.start_file("xl/_rels/workbook.xml.rels", options)?;
        let mut rels_xml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        );
        for (i, _) in self.sheets.iter().enumerate() {
            rels_xml.push_str(&format!(
                r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{}.xml"/>"#,
                i + 1,
                i + 1
            ));
        }
        rels_xml.push_str("</Relationships>");
        zip.write_all(rels_xml.as_bytes())?;

        if !self.shared_strings.is_empty() {
            zip.start_file("xl/sharedStrings.xml", options)?;
            let mut sst = format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="{0}" uniqueCount="{0}">"#,
                self.shared_strings.len()
            );
            for s in &self.shared_strings {
                sst.push_str(&format!("<si><t>{}</t></si>", s));
            }
            sst.push_str("</sst>");
            zip.write_all(sst.as_bytes())?;
        }

        if let Some(styles) = &self.styles {
            zip.start_file("xl/styles.xml", options)?;
            zip.write_all(styles.as_bytes())?;
        }

        for (i, sheet) in self.sheets.iter().enumerate() {
            zip.start_file(format!("xl/worksheets/sheet{}.xml", i + 1), options)?;
            zip.write_all(sheet.to_xml().as_bytes())?;
        }

        zip.finish()?;
        Ok(())
    }
}
