mod common;

use std::fs;
use std::path::Path;

use common::{MockSheet, MockWorkbook};
use sheetprobe_core::driver::{analyze_file, run_batch};
use sheetprobe_core::reader::parser_utils::cell_coordinate;
use sheetprobe_core::reader::{WorkbookReader, open_workbook};
use sheetprobe_core::report::{read_report, report_path_for};
use sheetprobe_core::{
    AlignmentInfo, AnalysisObserver, BatchOutcome, CellInfo, FIXED_INPUTS, FileResult,
    NullObserver, Probe, ProbeConfig, ProbeError, ScanWindow,
};

fn form1_workbook() -> MockWorkbook {
    MockWorkbook::new(vec![MockSheet::new(
        "Form1",
        r#"<row r="1"><c r="A1" s="1" t="s"><v>0</v></c></row><row r="3"><c r="B3" s="0"/></row>"#,
    )])
    .shared_strings(&["Title"])
}

#[derive(Default)]
struct Recorder {
    loaded: Vec<Vec<String>>,
    rows: Vec<(u32, usize)>,
    written: Vec<String>,
    missing: Vec<String>,
    failed: usize,
    summaries: usize,
}

impl AnalysisObserver for Recorder {
    fn workbook_loaded(&mut self, sheet_names: &[String]) {
        self.loaded.push(sheet_names.to_vec());
    }

    fn row_scanned(&mut self, row: u32, cell_count: usize) {
        self.rows.push((row, cell_count));
    }

    fn report_written(&mut self, path: &Path) {
        self.written.push(path.file_name().unwrap().to_string_lossy().into_owned());
    }

    fn file_missing(&mut self, label: &str, _path: &Path) {
        self.missing.push(label.to_string());
    }

    fn file_failed(&mut self, _path: &Path, _error: &ProbeError) {
        self.failed += 1;
    }

    fn summary(&mut self, _outcomes: &[BatchOutcome]) {
        self.summaries += 1;
    }
}

#[test]
fn test_title_form() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("forms.xlsx");
    form1_workbook().write(&path)?;

    let mut recorder = Recorder::default();
    let report = analyze_file(&path, &ProbeConfig::default(), &mut recorder)?;

    let sheet = report.get("Form1").unwrap();
    assert_eq!(sheet.max_row, 3);
    assert_eq!(sheet.max_col, 2);
    assert!(sheet.merged_cells.is_empty());
    assert!(sheet.formats.is_empty());

    let title = CellInfo {
        row: 1,
        col: 1,
        value: "Title".to_string(),
        coordinate: "A1".to_string(),
        font_bold: true,
        font_size: Some(14.0),
        alignment: AlignmentInfo {
            horizontal: Some("center".to_string()),
            vertical: None,
        },
        border: false,
        fill: false,
    };
    assert_eq!(sheet.headers, vec![title.clone()]);
    assert_eq!(sheet.data_cells, vec![vec![title]]);

    assert_eq!(recorder.loaded, vec![vec!["Form1".to_string()]]);
    assert_eq!(recorder.rows, vec![(1, 1)]);
    assert_eq!(recorder.written, vec!["forms_analysis.json"]);
    assert!(dir.path().join("forms_analysis.json").exists());
    Ok(())
}

#[test]
fn test_merged_ranges_in_document_order() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("merged.xlsx");
    MockWorkbook::new(vec![
        MockSheet::new("Form2", "").merge("A1:C1").merge("A2:A5"),
    ])
    .write(&path)?;

    let report = analyze_file(&path, &ProbeConfig::default(), &mut NullObserver)?;
    let sheet = report.get("Form2").unwrap();
    assert_eq!(sheet.merged_cells, vec!["A1:C1", "A2:A5"]);
    assert_eq!(sheet.max_row, 5);
    assert_eq!(sheet.max_col, 3);
    assert!(sheet.data_cells.is_empty());
    Ok(())
}

#[test]
fn test_scan_window_is_bounded() -> anyhow::Result<()> {
    let mut rows = String::new();
    for row in 0..30u32 {
        rows.push_str(&format!(r#"<row r="{}">"#, row + 1));
        for col in 0..30u32 {
            rows.push_str(&format!(r#"<c r="{}"><v>{}</v></c>"#, cell_coordinate(row, col), col));
        }
        rows.push_str("</row>");
    }
    rows.push_str(r#"<row r="1000"><c r="ALL1000"><v>1</v></c></row>"#);

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("large.xlsx");
    MockWorkbook::new(vec![MockSheet::new("Large", &rows)]).write(&path)?;

    let report = analyze_file(&path, &ProbeConfig::default(), &mut NullObserver)?;
    let sheet = report.get("Large").unwrap();
    assert_eq!(sheet.max_row, 1000);
    assert_eq!(sheet.max_col, 1000);
    assert_eq!(sheet.data_cells.len(), 20);
    for row in &sheet.data_cells {
        assert_eq!(row.len(), 10);
        assert!(row.iter().all(|c| c.row <= 20 && c.col <= 10));
    }

    let config = ProbeConfig {
        scan: ScanWindow::new(3, 25),
    };
    let report = analyze_file(&path, &config, &mut NullObserver)?;
    let sheet = report.get("Large").unwrap();
    assert_eq!(sheet.data_cells.len(), 3);
    assert_eq!(sheet.data_cells[2].len(), 25);
    assert_eq!(sheet.data_cells[2][24].coordinate, "Y3");
    Ok(())
}

#[test]
fn test_cell_value_strings() -> anyhow::Result<()> {
    let rows = concat!(
        r#"<row r="1">"#,
        r#"<c r="A1" t="inlineStr"><is><t>Hello </t><t>World</t></is></c>"#,
        r#"<c r="B1" t="b"><v>1</v></c>"#,
        r#"<c r="C1" t="e"><v>#N/A</v></c>"#,
        r#"<c r="D1"><v>5.5</v></c>"#,
        r#"<c r="E1"><v>42</v></c>"#,
        r#"<c r="F1" t="s"><v>0</v></c>"#,
        r#"</row>"#,
        r#"<row r="2">"#,
        r#"<c r="A2" s="3"><v>45672</v></c>"#,
        r#"<c r="B2"><f t="shared" ref="B2:B3" si="0">A2+1</f><v>45673</v></c>"#,
        r#"<c r="C2" t="str"><f>UPPER("x")</f><v>X</v></c>"#,
        r#"</row>"#,
        r#"<row r="3">"#,
        r#"<c r="A3" s="2" t="inlineStr"><is><t>Boxed</t></is></c>"#,
        r#"<c r="B3"><f t="shared" si="0"/><v>45674</v></c>"#,
        r#"<c r="C3" s="4" t="inlineStr"><is><t>Shaded</t></is></c>"#,
        r#"</row>"#,
    );

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("types.xlsx");
    MockWorkbook::new(vec![MockSheet::new("Types", rows)])
        .shared_strings(&["Shared"])
        .write(&path)?;

    let report = analyze_file(&path, &ProbeConfig::default(), &mut NullObserver)?;
    let sheet = report.get("Types").unwrap();
    let values: Vec<Vec<&str>> = sheet
        .data_cells
        .iter()
        .map(|row| row.iter().map(|c| c.value.as_str()).collect())
        .collect();

    assert_eq!(
        values,
        vec![
            vec!["Hello World", "True", "#N/A", "5.5", "42", "Shared"],
            vec!["2025-01-15 00:00:00", "=A2+1", "=UPPER(\"x\")"],
            vec!["Boxed", "=A3+1", "Shaded"],
        ]
    );

    let boxed = &sheet.data_cells[2][0];
    assert!(boxed.border);
    assert!(boxed.fill);
    let shaded = &sheet.data_cells[2][2];
    assert!(!shaded.border);
    assert!(shaded.fill);
    assert!(sheet.headers.is_empty());
    Ok(())
}

#[test]
fn test_workbook_without_styles() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("plain.xlsx");
    MockWorkbook::new(vec![MockSheet::new(
        "Plain",
        r#"<row r="1"><c r="A1" t="inlineStr"><is><t>Name</t></is></c><c r="B1"><v>3</v></c></row>"#,
    )])
    .without_styles()
    .write(&path)?;

    let report = analyze_file(&path, &ProbeConfig::default(), &mut NullObserver)?;
    let row = &report.get("Plain").unwrap().data_cells[0];
    assert_eq!(row.len(), 2);
    assert_eq!(row[1].value, "3");
    for cell in row {
        assert!(!cell.font_bold);
        assert_eq!(cell.font_size, Some(11.0));
        assert_eq!(cell.alignment, AlignmentInfo::default());
        assert!(!cell.border);
        assert!(!cell.fill);
    }
    Ok(())
}

#[test]
fn test_zero_and_false_are_not_recorded() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("falsy.xlsx");
    MockWorkbook::new(vec![MockSheet::new(
        "Totals",
        concat!(
            r#"<row r="1"><c r="A1"><v>0</v></c><c r="B1"><v>0.0</v></c>"#,
            r#"<c r="C1" t="b"><v>0</v></c><c r="D1" t="b"><v>1</v></c></row>"#,
            r#"<row r="2"><c r="A2" s="1"><v>0</v></c></row>"#,
        ),
    )])
    .write(&path)?;

    let report = analyze_file(&path, &ProbeConfig::default(), &mut NullObserver)?;
    let sheet = report.get("Totals").unwrap();
    let recorded: Vec<_> = sheet
        .data_cells
        .iter()
        .flatten()
        .map(|c| (c.coordinate.as_str(), c.value.as_str()))
        .collect();
    assert_eq!(recorded, vec![("D1", "True")]);
    assert!(sheet.headers.is_empty());
    Ok(())
}

#[test]
fn test_merged_area_keeps_only_anchor_value() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("banner.xlsx");
    MockWorkbook::new(vec![
        MockSheet::new(
            "Form3",
            concat!(
                r#"<row r="1"><c r="A1" s="1" t="s"><v>0</v></c><c r="B1" s="1" t="s"><v>1</v></c>"#,
                r#"<c r="C1" t="s"><v>1</v></c><c r="D1" t="s"><v>1</v></c></row>"#,
            ),
        )
        .merge("A1:C1"),
    ])
    .shared_strings(&["Banner", "Stale"])
    .write(&path)?;

    let report = analyze_file(&path, &ProbeConfig::default(), &mut NullObserver)?;
    let sheet = report.get("Form3").unwrap();
    let coords: Vec<_> = sheet.data_cells[0].iter().map(|c| c.coordinate.as_str()).collect();
    assert_eq!(coords, vec!["A1", "D1"]);
    assert_eq!(sheet.headers.len(), 1);
    assert_eq!(sheet.headers[0].value, "Banner");
    Ok(())
}

#[test]
fn test_sheets_keep_workbook_order() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("order.xlsx");
    MockWorkbook::new(vec![
        MockSheet::new("Form 4", ""),
        MockSheet::new("Form 1", ""),
        MockSheet::new("Form 3", ""),
    ])
    .write(&path)?;

    let workbook = open_workbook(&path)?;
    assert_eq!(workbook.sheet_names(), vec!["Form 4", "Form 1", "Form 3"]);

    let report = analyze_file(&path, &ProbeConfig::default(), &mut NullObserver)?;
    let names: Vec<_> = report.sheets().iter().map(|s| s.sheet_name.as_str()).collect();
    assert_eq!(names, vec!["Form 4", "Form 1", "Form 3"]);

    let json = fs::read_to_string(report_path_for(&path))?;
    let positions: Vec<_> = names.iter().map(|n| json.find(&format!("\"{}\"", n)).unwrap()).collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]));
    Ok(())
}

#[test]
fn test_report_round_trip() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("round.xlsx");
    MockWorkbook::new(vec![
        MockSheet::new(
            "Form1",
            r#"<row r="1"><c r="A1" s="1" t="s"><v>0</v></c><c r="B1" s="2"><v>2.25</v></c></row>"#,
        )
        .merge("A1:B1"),
        MockSheet::new("Empty", ""),
    ])
    .shared_strings(&["Title"])
    .write(&path)?;

    let report = analyze_file(&path, &ProbeConfig::default(), &mut NullObserver)?;
    let loaded = read_report(&report_path_for(&path))?;
    assert_eq!(loaded, report);

    let empty = loaded.get("Empty").unwrap();
    assert_eq!((empty.max_row, empty.max_col), (1, 1));
    assert!(empty.data_cells.is_empty());
    Ok(())
}

#[test]
fn test_non_ascii_is_written_verbatim() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("local.xlsx");
    MockWorkbook::new(vec![MockSheet::new(
        "Año",
        r#"<row r="1"><c r="A1" t="s"><v>0</v></c></row>"#,
    )])
    .shared_strings(&["Población"])
    .write(&path)?;

    analyze_file(&path, &ProbeConfig::default(), &mut NullObserver)?;
    let json = fs::read_to_string(report_path_for(&path))?;
    assert!(json.contains("\"Año\": {"));
    assert!(json.contains("\"value\": \"Población\""));
    assert!(!json.contains("\\u"));
    Ok(())
}

#[test]
fn test_batch_with_one_input_missing() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    form1_workbook().write(&dir.path().join(FIXED_INPUTS[0].1))?;

    let mut recorder = Recorder::default();
    let outcomes = run_batch(dir.path(), &FIXED_INPUTS, &ProbeConfig::default(), &mut recorder);

    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0].label, "Input Forms");
    assert!(matches!(outcomes[0].result, FileResult::Analyzed(_)));
    assert!(matches!(outcomes[1].result, FileResult::Missing));
    assert_eq!(recorder.missing, vec!["Output Forms"]);
    assert_eq!(recorder.failed, 0);
    assert_eq!(recorder.summaries, 1);

    assert!(
        dir.path()
            .join("MSWDO-2025-RPMES-Input-Forms-1-4 (1)_analysis.json")
            .exists()
    );
    assert!(!dir.path().join("RPMES-Output-Forms-5-11_analysis.json").exists());

    let written = read_report(&report_path_for(&outcomes[0].input))?;
    assert_eq!(Some(&written), outcomes[0].report());
    Ok(())
}

#[test]
fn test_corrupt_input_does_not_stop_the_batch() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    fs::write(dir.path().join(FIXED_INPUTS[0].1), b"PK\x03\x04 truncated")?;
    form1_workbook().write(&dir.path().join(FIXED_INPUTS[1].1))?;

    let mut recorder = Recorder::default();
    let outcomes = Probe::new().run(dir.path(), &mut recorder);

    assert!(matches!(outcomes[0].result, FileResult::Failed(_)));
    assert!(matches!(outcomes[1].result, FileResult::Analyzed(_)));
    assert_eq!(recorder.failed, 1);
    assert_eq!(recorder.written, vec!["RPMES-Output-Forms-5-11_analysis.json"]);
    assert!(
        !dir.path()
            .join("MSWDO-2025-RPMES-Input-Forms-1-4 (1)_analysis.json")
            .exists()
    );
    Ok(())
}

#[test]
fn test_missing_sheet_part_fails_without_output() -> anyhow::Result<()> {
    use std::io::Write;
    use zip::ZipWriter;
    use zip::write::SimpleFileOptions;

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("hollow.xlsx");
    let mut zip = ZipWriter::new(fs::File::create(&path)?);
    let options = SimpleFileOptions::default();
    zip.start_file("xl/workbook.xml", options)?;
    zip.write_all(
        br#"<workbook xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="Gone" sheetId="1" r:id="rId1"/></sheets></workbook>"#,
    )?;
    zip.start_file("xl/_rels/workbook.xml.rels", options)?;
    zip.write_all(
        br#"<Relationships><Relationship Id="rId1" Target="/xl/worksheets/gone.xml"/></Relationships>"#,
    )?;
    zip.finish()?;

    let err = analyze_file(&path, &ProbeConfig::default(), &mut NullObserver).unwrap_err();
    assert!(err.to_string().contains("xl/worksheets/gone.xml"));
    assert!(!report_path_for(&path).exists());
    Ok(())
}
