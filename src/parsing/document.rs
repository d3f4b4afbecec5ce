
use calamine::{open_workbook_auto, Data, Reader};
use indexmap::IndexMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::data_types::cell_value::CellValue;

#[derive(thiserror::Error, Debug)]
pub enum DocumentError {
    #[error("unsupported report format: {path:?}")]
    Unsupported { path: PathBuf },
    #[error("error while reading {path:?}: {source}")]
    Io { path: PathBuf, source: std::io::Error },
    #[error("error while parsing delimited report {path:?}: {source}")]
    Delimited { path: PathBuf, source: csv::Error },
    #[error("error while parsing JSON report {path:?}: {source}")]
    Json { path: PathBuf, source: serde_json::Error },
    #[error("error while reading workbook {path:?}: {source}")]
    Workbook { path: PathBuf, source: calamine::Error },
}

/// One sheet of a report, stored row-major
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Sheet {
    name: String,
    rows: Vec<Vec<CellValue>>
}

impl Sheet {
    pub fn new(name: String, rows: Vec<Vec<CellValue>>) -> Self {
        Self { name, rows }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    /// Cell lookup; anything outside the stored grid is treated as missing
    pub fn cell(&self, row: usize, col: usize) -> Option<&CellValue> {
        self.rows.get(row).and_then(|r| r.get(col))
    }
}

/// Position and value of a single cell inside a `Document`
#[derive(Clone, Copy, Debug)]
pub struct CellRef<'a> {
    pub sheet: usize,
    pub row: usize,
    pub col: usize,
    pub value: &'a CellValue
}

/// A loaded report: a list of sheets of normalized cells.
/// Consumers only ask label/value questions, never about sheet geometry beyond "the cell to the right".
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Document {
    sheets: Vec<Sheet>
}

impl Document {
    pub fn new(sheets: Vec<Sheet>) -> Self {
        Self { sheets }
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    /// Iterates every cell, sheet by sheet in row-major order
    pub fn cells(&self) -> impl Iterator<Item = CellRef<'_>> {
        self.sheets.iter().enumerate()
            .flat_map(|(sheet, s)| {
                s.rows.iter().enumerate()
                    .flat_map(move |(row, cells)| {
                        cells.iter().enumerate()
                            .map(move |(col, value)| CellRef { sheet, row, col, value })
                    })
            })
    }

    /// Iterates the text of every `Text` cell
    pub fn text_cells(&self) -> impl Iterator<Item = &str> {
        self.cells().filter_map(|c| c.value.as_text())
    }

    /// Returns the cell immediately right of (`sheet`, `row`, `col`)
    pub fn lookup_next_cell_in_row(&self, sheet: usize, row: usize, col: usize) -> Option<&CellValue> {
        self.sheets.get(sheet)
            .and_then(|s| s.cell(row, col + 1))
    }

    /// Values right of every cell whose trimmed text equals `label`, in document order.
    /// Labels without a non-empty neighbour are skipped.
    pub fn lookup_cells<'a, 'b>(&'a self, label: &'b str) -> impl Iterator<Item = &'a CellValue> + 'b
    where 'a: 'b
    {
        self.cells()
            .filter(move |c| c.value.as_text().is_some_and(|t| t.trim() == label))
            .filter_map(move |c| self.lookup_next_cell_in_row(c.sheet, c.row, c.col))
            .filter(|v| !v.is_empty())
    }

    /// First value of `lookup_cells`
    pub fn lookup_cell(&self, label: &str) -> Option<&CellValue> {
        self.lookup_cells(label).next()
    }
}

/// Anything that can turn a report file into a `Document`
pub trait DocumentLoader {
    /// Returns true if `path` looks like a report this loader can open
    fn supports(&self, path: &Path) -> bool;

    /// Loads the full document
    /// # Errors
    /// * if the file cannot be read or parsed
    fn open(&self, path: &Path) -> Result<Document, DocumentError>;
}

/// Loads reports from disk: `.xlsx`/`.xls` workbooks keep their sheets, `.csv` and `.tsv` files hold a single sheet,
/// `.json` files hold either an object of named sheets or a bare array of rows.
#[derive(Clone, Copy, Debug, Default)]
pub struct FileDocumentLoader;

/// Supported report extensions, compared case-insensitively
const SUPPORTED_EXTENSIONS: [&str; 5] = ["xlsx", "xls", "csv", "tsv", "json"];

fn extension_lower(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

impl DocumentLoader for FileDocumentLoader {
    fn supports(&self, path: &Path) -> bool {
        extension_lower(path)
            .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
    }

    fn open(&self, path: &Path) -> Result<Document, DocumentError> {
        match extension_lower(path).as_deref() {
            Some("csv") => load_delimited(path, b','),
            Some("tsv") => load_delimited(path, b'\t'),
            Some("json") => load_json_document(path),
            Some("xlsx") | Some("xls") => load_workbook(path),
            _ => Err(DocumentError::Unsupported { path: path.to_path_buf() })
        }
    }
}

/// Loads a delimited export as a single sheet named after the file stem
fn load_delimited(path: &Path, delimiter: u8) -> Result<Document, DocumentError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false) // reports are free-form, the first row is data
        .flexible(true)
        .from_path(path)
        .map_err(|source| DocumentError::Delimited { path: path.to_path_buf(), source })?;

    let mut rows = vec![];
    for result in csv_reader.records() {
        let record = result.map_err(|source| DocumentError::Delimited { path: path.to_path_buf(), source })?;
        rows.push(record.iter().map(CellValue::from_raw_text).collect());
    }

    let name = path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    Ok(Document::new(vec![Sheet::new(name, rows)]))
}

fn workbook_cell(value: &Data) -> CellValue {
    match value {
        Data::Empty | Data::Error(_) => CellValue::Empty,
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::String(s) if s.trim().is_empty() => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        other => CellValue::from_raw_text(&other.to_string())
    }
}

/// Loads every worksheet of an Excel workbook, format picked from the extension
fn load_workbook(path: &Path) -> Result<Document, DocumentError> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|source| DocumentError::Workbook { path: path.to_path_buf(), source })?;

    let mut sheets = vec![];
    for name in workbook.sheet_names() {
        let range = workbook.worksheet_range(&name)
            .map_err(|source| DocumentError::Workbook { path: path.to_path_buf(), source })?;
        // ranges start at the first used cell, pad so column offsets match the sheet
        let (row_offset, col_offset) = range.start()
            .map(|(r, c)| (r as usize, c as usize))
            .unwrap_or_default();
        let mut rows: Vec<Vec<CellValue>> = vec![vec![]; row_offset];
        rows.extend(range.rows().map(|r| {
            std::iter::repeat(CellValue::Empty).take(col_offset)
                .chain(r.iter().map(workbook_cell))
                .collect()
        }));
        sheets.push(Sheet::new(name, rows));
    }
    Ok(Document::new(sheets))
}

/// The two JSON layouts we accept
#[derive(serde::Deserialize)]
#[serde(untagged)]
enum JsonDocument {
    Sheets(IndexMap<String, Vec<Vec<serde_json::Value>>>),
    Rows(Vec<Vec<serde_json::Value>>)
}

fn json_cell(value: serde_json::Value) -> CellValue {
    use serde_json::Value;
    match value {
        Value::Null => CellValue::Empty,
        Value::String(s) if s.trim().is_empty() => CellValue::Empty,
        Value::String(s) => CellValue::Text(s),
        Value::Number(n) => n.as_f64().map(CellValue::Number).unwrap_or_default(),
        other => CellValue::Text(other.to_string())
    }
}

fn load_json_document(path: &Path) -> Result<Document, DocumentError> {
    let fp = File::open(path)
        .map_err(|source| DocumentError::Io { path: path.to_path_buf(), source })?;
    let raw: JsonDocument = serde_json::from_reader(BufReader::new(fp))
        .map_err(|source| DocumentError::Json { path: path.to_path_buf(), source })?;

    let to_rows = |rows: Vec<Vec<serde_json::Value>>| -> Vec<Vec<CellValue>> {
        rows.into_iter()
            .map(|r| r.into_iter().map(json_cell).collect())
            .collect()
    };

    let sheets = match raw {
        JsonDocument::Sheets(sheets) => sheets.into_iter()
            .map(|(name, rows)| Sheet::new(name, to_rows(rows)))
            .collect(),
        JsonDocument::Rows(rows) => {
            let name = path.file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default();
            vec![Sheet::new(name, to_rows(rows))]
        }
    };
    Ok(Document::new(sheets))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    #[test]
    fn test_lookup_cell() {
        let document = Document::new(vec![
            Sheet::new("summary".to_string(), vec![
                vec![text("Run name")],
                vec![CellValue::Empty, text("Density"), CellValue::Number(215.0)],
            ]),
            Sheet::new("details".to_string(), vec![
                vec![text("Run name"), text("230515_NB501289_0712_AHGTJ5BGXY")],
            ])
        ]);

        // the first label has no neighbour, so the second sheet answers
        assert_eq!(document.lookup_cell("Run name"), Some(&text("230515_NB501289_0712_AHGTJ5BGXY")));
        assert_eq!(document.lookup_cell("Density"), Some(&CellValue::Number(215.0)));
        assert_eq!(document.lookup_cell("Yield"), None);
        assert_eq!(document.lookup_next_cell_in_row(0, 1, 1), Some(&CellValue::Number(215.0)));
        assert_eq!(document.lookup_next_cell_in_row(0, 1, 2), None);
        assert_eq!(document.lookup_next_cell_in_row(5, 0, 0), None);
        assert_eq!(document.text_cells().count(), 4);
    }

    #[test]
    fn test_lookup_cells() {
        let document = Document::new(vec![
            Sheet::new("summary".to_string(), vec![
                vec![text("Run name"), text("230610_NB501289_0726_AHXYZ790")],
                vec![text("Run name"), CellValue::Empty],
                vec![text(" Run name "), text("230612_NB501289_0727_AHXYZ791")],
            ])
        ]);
        let values: Vec<&CellValue> = document.lookup_cells("Run name").collect();
        assert_eq!(values, vec![
            &text("230610_NB501289_0726_AHXYZ790"),
            &text("230612_NB501289_0727_AHXYZ791")
        ]);
        assert_eq!(document.lookup_cell("Run name"), Some(&text("230610_NB501289_0726_AHXYZ790")));
        assert_eq!(document.lookup_cells("Yield").count(), 0);
    }

    #[test]
    fn test_supports() {
        let loader = FileDocumentLoader;
        assert!(loader.supports(Path::new("reports/230515_run_mRNAseq.csv")));
        assert!(loader.supports(Path::new("reports/230515_run_mRNAseq.TSV")));
        assert!(loader.supports(Path::new("reports/230515_run_mRNAseq.json")));
        assert!(loader.supports(Path::new("reports/230515_run_mRNAseq.xlsx")));
        assert!(loader.supports(Path::new("reports/230515_run_mRNAseq.XLS")));
        assert!(!loader.supports(Path::new("reports/230515_run_mRNAseq.docx")));
        assert!(!loader.supports(Path::new("reports/README")));
    }

    #[test]
    fn test_open_csv() {
        let loader = FileDocumentLoader;
        let document = loader.open(Path::new("test_data/reports/2023/230515_NB501289_mRNAseq.csv")).unwrap();
        assert_eq!(document.sheets().len(), 1);
        assert_eq!(document.lookup_cell("Run name"), Some(&text("230515_NB501289_0712_AHGTJ5BGXY")));
        assert_eq!(document.lookup_cell("Cycles Read 1"), Some(&CellValue::Number(75.0)));
    }

    #[test]
    fn test_open_json() {
        let loader = FileDocumentLoader;
        let document = loader.open(Path::new("test_data/reports/2024/240201_A01742_3mRNAseq.json")).unwrap();
        assert_eq!(document.sheets().len(), 2);
        assert_eq!(document.sheets()[0].name(), "Run");
        assert_eq!(document.lookup_cell("Run name"), Some(&text("240201_A01742_0155_BHFLWCDRX3")));
    }

    #[test]
    fn test_open_xlsx() {
        let loader = FileDocumentLoader;
        let document = loader.open(Path::new("test_data/reports/2023/230801_M04404_16S.xlsx")).unwrap();
        assert_eq!(document.sheets().len(), 2);
        assert_eq!(document.sheets()[0].name(), "Run");
        assert_eq!(document.lookup_cell("Run name"), Some(&text("230801_M04404_0100_000000000-KX7P2")));
        assert_eq!(document.lookup_cell("Cycles Read 1"), Some(&CellValue::Number(151.0)));
        // the second sheet starts at C3, positions are kept
        assert_eq!(document.sheets()[1].cell(2, 2), Some(&text("PhiX")));
        assert_eq!(document.lookup_next_cell_in_row(1, 2, 2), Some(&CellValue::Number(5.0)));
    }

    #[test]
    fn test_open_errors() {
        let loader = FileDocumentLoader;
        assert!(matches!(
            loader.open(Path::new("test_data/reports/corrupt/230515_broken_RNAseq.json")),
            Err(DocumentError::Json { .. })
        ));
        assert!(matches!(
            loader.open(Path::new("test_data/reports/missing.json")),
            Err(DocumentError::Io { .. })
        ));
        assert!(matches!(
            loader.open(Path::new("test_data/reports/notes.docx")),
            Err(DocumentError::Unsupported { .. })
        ));
        assert!(matches!(
            loader.open(Path::new("test_data/reports/missing.xlsx")),
            Err(DocumentError::Workbook { .. })
        ));
    }
}
