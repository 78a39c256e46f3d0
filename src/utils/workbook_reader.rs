use std::io::Cursor;

use calamine::{Data, Reader, open_workbook_auto_from_rs};
use csv::ReaderBuilder;
use tracing::{debug, warn};

use crate::error::DashboardError;
use crate::model::table::{Cell, RawTable, Sheet, Workbook};

/// Container formats accepted on upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkbookFormat {
    /// xlsx / xlsm / xlsb / xls / ods, read through calamine.
    Spreadsheet,
    Csv,
}

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0];

impl WorkbookFormat {
    /// File extension first, then magic bytes; anything else is read as CSV.
    pub fn detect(file_name: Option<&str>, bytes: &[u8]) -> Self {
        let ext = file_name
            .and_then(|n| n.rsplit_once('.'))
            .map(|(_, ext)| ext.to_ascii_lowercase());

        match ext.as_deref() {
            Some("xlsx" | "xlsm" | "xlsb" | "xls" | "ods") => WorkbookFormat::Spreadsheet,
            Some("csv" | "txt") => WorkbookFormat::Csv,
            _ if bytes.starts_with(ZIP_MAGIC) || bytes.starts_with(OLE_MAGIC) => {
                WorkbookFormat::Spreadsheet
            }
            _ => WorkbookFormat::Csv,
        }
    }
}

/// Reads every sheet of an uploaded file into raw tables.
pub fn read_workbook(file_name: Option<&str>, bytes: &[u8]) -> Result<Workbook, DashboardError> {
    if bytes.is_empty() {
        return Err(DashboardError::EmptyUpload);
    }

    let workbook = match WorkbookFormat::detect(file_name, bytes) {
        WorkbookFormat::Spreadsheet => read_spreadsheet(bytes)?,
        WorkbookFormat::Csv => read_csv(csv_sheet_name(file_name), bytes)?,
    };

    if workbook.sheets.is_empty() {
        return Err(DashboardError::EmptyWorkbook);
    }
    Ok(workbook)
}

fn csv_sheet_name(file_name: Option<&str>) -> String {
    file_name
        .map(|n| n.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(n))
        .filter(|stem| !stem.trim().is_empty())
        .unwrap_or("Sheet1")
        .to_string()
}

fn read_spreadsheet(bytes: &[u8]) -> Result<Workbook, DashboardError> {
    let mut book = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| DashboardError::UnreadableWorkbook(e.to_string()))?;

    let mut sheets = Vec::new();
    for name in book.sheet_names() {
        let range = match book.worksheet_range(&name) {
            Ok(r) => r,
            Err(e) => {
                // Chart sheets and similar have no cell range.
                warn!(sheet = %name, error = %e, "Skipping unreadable worksheet");
                continue;
            }
        };

        let mut rows = range.rows();
        let headers: Vec<String> = match rows.next() {
            Some(header_row) => header_row.iter().map(header_text).collect(),
            None => {
                debug!(sheet = %name, "Worksheet is empty");
                Vec::new()
            }
        };
        let body: Vec<Vec<Cell>> = rows.map(|r| r.iter().map(to_cell).collect()).collect();

        debug!(sheet = %name, columns = headers.len(), rows = body.len(), "Worksheet read");
        sheets.push(Sheet {
            name,
            table: RawTable::new(headers, body),
        });
    }

    Ok(Workbook { sheets })
}

fn read_csv(sheet_name: String, bytes: &[u8]) -> Result<Workbook, DashboardError> {
    // Tolerate ragged rows instead of failing on minor format issues.
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .has_headers(true)
        .from_reader(bytes);

    let headers: Vec<String> = rdr
        .headers()
        .map_err(|e| DashboardError::UnreadableWorkbook(e.to_string()))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record.map_err(|e| DashboardError::UnreadableWorkbook(e.to_string()))?;
        rows.push(record.iter().map(Cell::from).collect());
    }

    debug!(sheet = %sheet_name, columns = headers.len(), rows = rows.len(), "CSV read");
    Ok(Workbook {
        sheets: vec![Sheet {
            name: sheet_name,
            table: RawTable::new(headers, rows),
        }],
    })
}

fn to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::String(s) => Cell::from(s.as_str()),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(ndt) => Cell::DateTime(ndt),
            None => Cell::Number(dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::from(s.as_str()),
    }
}

fn header_text(data: &Data) -> String {
    match to_cell(data) {
        Cell::Text(s) => s.trim().to_string(),
        Cell::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "Sr. No.,EmpID,FName,Attendance Date,Final Status\n\
                          1,30001,Ana Diaz,05/01/2024,Present\n\
                          2,30002,Bo Lee,06/01/2024\n";

    #[test]
    fn detects_format_by_name_and_magic() {
        assert_eq!(
            WorkbookFormat::detect(Some("march.XLSX"), b"anything"),
            WorkbookFormat::Spreadsheet
        );
        assert_eq!(WorkbookFormat::detect(None, b"PK\x03\x04rest"), WorkbookFormat::Spreadsheet);
        assert_eq!(WorkbookFormat::detect(Some("dump.csv"), b"PK\x03\x04"), WorkbookFormat::Csv);
        assert_eq!(WorkbookFormat::detect(None, b"EmpID,FName"), WorkbookFormat::Csv);
    }

    #[test]
    fn reads_csv_as_single_sheet() {
        let wb = read_workbook(Some("dummy_attendance.csv"), SAMPLE.as_bytes()).unwrap();
        assert_eq!(wb.sheet_names(), vec!["dummy_attendance".to_string()]);
        let table = &wb.sheets[0].table;
        assert_eq!(table.headers[1], "EmpID");
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.cell(0, 2), &Cell::Text("Ana Diaz".into()));
        // ragged row reads as empty past its end
        assert_eq!(table.cell(1, 4), &Cell::Empty);
    }

    #[test]
    fn rejects_empty_and_corrupt_uploads() {
        assert_eq!(read_workbook(Some("a.csv"), b""), Err(DashboardError::EmptyUpload));
        let err = read_workbook(Some("broken.xlsx"), b"PK\x03\x04garbage").unwrap_err();
        assert!(err.is_data_fault());
    }
}
