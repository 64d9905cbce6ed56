//! Spreadsheet decoding: uploaded bytes to ordered raw rows.
//!
//! Only the first sheet of a workbook is read; the first row supplies the
//! headers. Headers are trimmed but case is preserved, since the normalizer's
//! alias precedence is case-sensitive.

use std::path::Path;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("unrecognized spreadsheet format: {0}")]
    UnknownFormat(String),

    #[error("could not read spreadsheet: {0}")]
    Workbook(String),

    #[error("could not read CSV: {0}")]
    Csv(#[from] csv::Error),
}

/// Supported upload formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetFormat {
    Csv,
    Xlsx,
    Xls,
}

impl SheetFormat {
    /// Detect format from file extension.
    pub fn from_extension(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "csv" => Some(Self::Csv),
            "xlsx" => Some(Self::Xlsx),
            "xls" => Some(Self::Xls),
            _ => None,
        }
    }

    /// Detect format from a multipart content-type header. Fallback only;
    /// the decoder is the real validation gate.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        match content_type {
            "text/csv" | "application/csv" => Some(Self::Csv),
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet" => {
                Some(Self::Xlsx)
            }
            "application/vnd.ms-excel" => Some(Self::Xls),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SheetFormat::Csv => "csv",
            SheetFormat::Xlsx => "xlsx",
            SheetFormat::Xls => "xls",
        }
    }
}

/// One decoded spreadsheet row before field normalization.
///
/// Cells are kept in column order with their header, so a file with duplicate
/// header names stays well-defined: lookup returns the leftmost column.
#[derive(Debug, Clone, Default)]
pub struct RawRow {
    /// 1-based row number in the source file (the header row is row 1).
    pub row_number: usize,
    cells: Vec<(String, String)>,
}

impl RawRow {
    pub fn new(row_number: usize, cells: Vec<(String, String)>) -> Self {
        Self { row_number, cells }
    }

    /// Value of the leftmost column whose header matches exactly.
    pub fn get(&self, header: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(h, _)| h == header)
            .map(|(_, v)| v.as_str())
    }
}

/// Decoded spreadsheet: headers plus ordered rows, one `RawRow` per data row.
#[derive(Debug, Clone)]
pub struct ParsedSheet {
    pub file_name: String,
    pub format: SheetFormat,
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
    pub warnings: Vec<String>,
}

/// Parse uploaded bytes into rows. Format is chosen by extension, falling
/// back to the multipart content type when the name has no usable extension.
pub fn parse_bytes(
    file_name: &str,
    content_type: Option<&str>,
    data: &[u8],
) -> Result<ParsedSheet, ParseError> {
    let format = SheetFormat::from_extension(Path::new(file_name))
        .or_else(|| content_type.and_then(SheetFormat::from_content_type))
        .ok_or_else(|| ParseError::UnknownFormat(file_name.to_string()))?;

    match format {
        SheetFormat::Csv => parse_csv(file_name, data),
        SheetFormat::Xlsx | SheetFormat::Xls => parse_workbook(file_name, format, data),
    }
}

fn parse_csv(file_name: &str, data: &[u8]) -> Result<ParsedSheet, ParseError> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(data);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    let mut warnings = Vec::new();

    for (idx, result) in reader.records().enumerate() {
        match result {
            Ok(record) => {
                let cells = headers
                    .iter()
                    .enumerate()
                    .map(|(i, h)| (h.clone(), record.get(i).unwrap_or("").to_string()))
                    .collect();
                rows.push(RawRow::new(idx + 2, cells));
            }
            Err(e) => {
                warnings.push(format!("row {}: {}", idx + 2, e));
            }
        }
    }

    Ok(ParsedSheet {
        file_name: file_name.to_string(),
        format: SheetFormat::Csv,
        headers,
        rows,
        warnings,
    })
}

fn parse_workbook(
    file_name: &str,
    format: SheetFormat,
    data: &[u8],
) -> Result<ParsedSheet, ParseError> {
    use calamine::{open_workbook_from_rs, DataType, Range, Xls, Xlsx};

    let cursor = std::io::Cursor::new(data);

    // First sheet only; additional sheets are ignored.
    let range: Range<DataType> = match format {
        SheetFormat::Xlsx => {
            let mut workbook: Xlsx<_> = open_workbook_from_rs(cursor)
                .map_err(|e: calamine::XlsxError| ParseError::Workbook(e.to_string()))?;
            first_sheet_range(&mut workbook)?
        }
        SheetFormat::Xls => {
            let mut workbook: Xls<_> = open_workbook_from_rs(cursor)
                .map_err(|e: calamine::XlsError| ParseError::Workbook(e.to_string()))?;
            first_sheet_range(&mut workbook)?
        }
        SheetFormat::Csv => unreachable!("csv handled by parse_csv"),
    };

    let mut rows_iter = range.rows();

    let headers: Vec<String> = rows_iter
        .next()
        .map(|row| {
            row.iter()
                .map(|cell: &DataType| cell.to_string().trim().to_string())
                .collect()
        })
        .unwrap_or_default();

    let mut rows = Vec::new();
    for (idx, row) in rows_iter.enumerate() {
        let cells = headers
            .iter()
            .enumerate()
            .map(|(i, h)| {
                let value = row
                    .get(i)
                    .map(|cell: &DataType| cell.to_string())
                    .unwrap_or_default();
                (h.clone(), value)
            })
            .collect();
        rows.push(RawRow::new(idx + 2, cells));
    }

    Ok(ParsedSheet {
        file_name: file_name.to_string(),
        format,
        headers,
        rows,
        warnings: Vec::new(),
    })
}

fn first_sheet_range<RS, R>(workbook: &mut R) -> Result<calamine::Range<calamine::DataType>, ParseError>
where
    RS: std::io::Read + std::io::Seek,
    R: calamine::Reader<RS>,
    R::Error: std::fmt::Display,
{
    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| ParseError::Workbook("no sheets found in workbook".to_string()))?;

    workbook
        .worksheet_range(&sheet_name)
        .ok_or_else(|| ParseError::Workbook(format!("sheet '{sheet_name}' is unreadable")))?
        .map_err(|e| ParseError::Workbook(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_detection_by_extension() {
        assert_eq!(
            SheetFormat::from_extension(Path::new("candidates.csv")),
            Some(SheetFormat::Csv)
        );
        assert_eq!(
            SheetFormat::from_extension(Path::new("candidates.xlsx")),
            Some(SheetFormat::Xlsx)
        );
        assert_eq!(
            SheetFormat::from_extension(Path::new("legacy.XLS")),
            Some(SheetFormat::Xls)
        );
        assert_eq!(SheetFormat::from_extension(Path::new("notes.txt")), None);
        assert_eq!(SheetFormat::from_extension(Path::new("noextension")), None);
    }

    #[test]
    fn test_format_detection_by_content_type() {
        assert_eq!(
            SheetFormat::from_content_type("text/csv"),
            Some(SheetFormat::Csv)
        );
        assert_eq!(
            SheetFormat::from_content_type(
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            ),
            Some(SheetFormat::Xlsx)
        );
        assert_eq!(SheetFormat::from_content_type("application/pdf"), None);
    }

    #[test]
    fn test_unknown_format_is_a_parse_error() {
        let err = parse_bytes("resume.pdf", None, b"%PDF-1.4").unwrap_err();
        assert!(matches!(err, ParseError::UnknownFormat(_)));
    }

    #[test]
    fn test_csv_headers_preserve_case() {
        let data = b"CandidateName,Mobile\nAlice,555-0100\n";
        let sheet = parse_bytes("candidates.csv", None, data).unwrap();
        assert_eq!(sheet.headers, vec!["CandidateName", "Mobile"]);
        assert_eq!(sheet.rows.len(), 1);
        assert_eq!(sheet.rows[0].get("CandidateName"), Some("Alice"));
        assert_eq!(sheet.rows[0].get("candidatename"), None);
    }

    #[test]
    fn test_csv_rows_keep_file_order_and_row_numbers() {
        let data = b"Name,Phone\nAlice,1\nBob,2\nCara,3\n";
        let sheet = parse_bytes("candidates.csv", None, data).unwrap();
        assert_eq!(sheet.rows.len(), 3);
        assert_eq!(sheet.rows[0].row_number, 2);
        assert_eq!(sheet.rows[2].row_number, 4);
        assert_eq!(sheet.rows[2].get("Name"), Some("Cara"));
    }

    #[test]
    fn test_duplicate_headers_leftmost_column_wins() {
        let data = b"Name,Name\nfirst,second\n";
        let sheet = parse_bytes("candidates.csv", None, data).unwrap();
        assert_eq!(sheet.rows[0].get("Name"), Some("first"));
    }

    #[test]
    fn test_short_csv_row_fills_missing_cells_as_empty() {
        let data = b"Name,Phone\nAlice\n";
        let sheet = parse_bytes("candidates.csv", None, data).unwrap();
        assert_eq!(sheet.rows[0].get("Phone"), Some(""));
    }

    #[test]
    fn test_garbage_xlsx_bytes_fail_without_panicking() {
        let err = parse_bytes("candidates.xlsx", None, b"this is not a zip archive").unwrap_err();
        assert!(matches!(err, ParseError::Workbook(_)));
    }

    #[test]
    fn test_content_type_fallback_when_extension_missing() {
        let data = b"Name\nAlice\n";
        let sheet = parse_bytes("upload", Some("text/csv"), data).unwrap();
        assert_eq!(sheet.format, SheetFormat::Csv);
        assert_eq!(sheet.rows.len(), 1);
    }
}
