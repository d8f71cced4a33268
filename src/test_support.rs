//! Builds small `.xlsx` workbooks in memory for tests.

use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

pub enum Cell<'a> {
    Text(&'a str),
    Number(f64),
}

fn column_letters(mut column: usize) -> String {
    let mut letters = String::new();
    column += 1;
    while column > 0 {
        column -= 1;
        letters.insert(0, (b'A' + (column % 26) as u8) as char);
        column /= 26;
    }
    letters
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

/// Sheet XML for sparse `(row, column, cell)` entries, all 0-based.
fn sheet_xml(cells: &[(usize, usize, Cell)]) -> String {
    let mut sorted: Vec<&(usize, usize, Cell)> = cells.iter().collect();
    sorted.sort_by_key(|(row, column, _)| (*row, *column));

    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
    );
    let mut current_row: Option<usize> = None;
    for (row, column, cell) in sorted {
        if current_row != Some(*row) {
            if current_row.is_some() {
                xml.push_str("</row>");
            }
            xml.push_str(&format!(r#"<row r="{}">"#, row + 1));
            current_row = Some(*row);
        }
        let reference = format!("{}{}", column_letters(*column), row + 1);
        match cell {
            Cell::Text(text) => xml.push_str(&format!(
                r#"<c r="{reference}" t="inlineStr"><is><t>{}</t></is></c>"#,
                escape(text)
            )),
            Cell::Number(value) => xml.push_str(&format!(r#"<c r="{reference}"><v>{value}</v></c>"#)),
        }
    }
    if current_row.is_some() {
        xml.push_str("</row>");
    }
    xml.push_str("</sheetData></worksheet>");
    xml
}

pub fn xlsx(sheet_name: &str, cells: &[(usize, usize, Cell)]) -> Vec<u8> {
    let files = [
        (
            "[Content_Types].xml",
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/></Types>"#.to_string(),
        ),
        (
            "_rels/.rels",
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#.to_string(),
        ),
        (
            "xl/workbook.xml",
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="{}" sheetId="1" r:id="rId1"/></sheets></workbook>"#,
                escape(sheet_name)
            ),
        ),
        (
            "xl/_rels/workbook.xml.rels",
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#.to_string(),
        ),
        ("xl/worksheets/sheet1.xml", sheet_xml(cells)),
    ];

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in files {
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        writer.start_file(name, options).unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// A two-site July 2024 movements report laid out like the real ones.
pub fn july_report() -> Vec<u8> {
    use Cell::{Number, Text};
    xlsx(
        "Movimientos",
        &[
            (0, 0, Text("GANADERA DEL NORTE")),
            (1, 0, Text("Reporte de movimientos mes de julio de 2024")),
            (4, 0, Text("INVENTARIO DE GANADO")),
            (5, 0, Text("EL ROSARIO")),
            (7, 0, Text("CATEGORIA")),
            (8, 12, Text("SALDO FINAL")),
            (9, 0, Text("VP")),
            (9, 12, Number(120.0)),
            (10, 0, Text("CM")),
            (10, 12, Number(30.0)),
            (11, 0, Text("BUEY")),
            (11, 12, Number(4.0)),
            (12, 0, Text("TOTAL")),
            (12, 12, Number(154.0)),
            (15, 0, Text("INVENTARIO DE GANADO EQUINO")),
            (16, 0, Text("EL ROSARIO")),
            (18, 0, Text("CATEGORIA")),
            (20, 0, Text("VP")),
            (20, 12, Number(999.0)),
            (24, 0, Text("INVENTARIO DE GANADO")),
            (25, 0, Text("SANTA FE")),
            (27, 0, Text("CATEGORIA")),
            (29, 0, Text("VP")),
            (29, 12, Number(40.0)),
            (30, 0, Text("nas")),
            (30, 12, Number(6.0)),
            (31, 0, Text("TOTAL")),
            (31, 12, Number(0.0)),
        ],
    )
}
