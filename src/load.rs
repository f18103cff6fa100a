//! Spreadsheet loading.
//!
//! Stage 1 of the pipeline. Reads the tabular content source into an ordered
//! list of [`Record`]s. Source order is preserved; it is the only identity a
//! record has.
//!
//! ## Supported Formats
//!
//! | Extension | Reader |
//! |-----------|--------|
//! | `.xlsx`, `.xlsm`, `.xlsb`, `.xls`, `.ods` | `calamine` (first sheet, or the configured one) |
//! | `.csv` | `csv` |
//!
//! ## Columns
//!
//! The first row is the header. Header cells are trimmed before matching, so
//! `" question "` is the `question` column. `category`, `question` and
//! `answer` are required; `summary`, `keywords` and `ai_summary` are optional.
//! Any other columns are ignored.
//!
//! ## Cell Rules
//!
//! - Values are trimmed; blank optional cells become `None`.
//! - Rows with every cell blank are skipped.
//! - A blank `category` or `question` is an error naming the row.
//! - A blank `answer` is allowed and renders no paragraphs.

use crate::types::Record;
use calamine::{Data, Reader, open_workbook_auto};
use std::path::{Path, PathBuf};
use thiserror::Error;

const WORKBOOK_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("content source not found: {0}")]
    NotFound(PathBuf),
    #[error("unsupported content format '{extension}' for {path} (expected .csv, .xlsx, .xlsm, .xlsb, .xls or .ods)")]
    UnsupportedFormat { path: PathBuf, extension: String },
    #[error("failed to read workbook {path}: {source}")]
    Workbook {
        path: PathBuf,
        source: calamine::Error,
    },
    #[error("sheet '{sheet}' not found in {path}")]
    MissingSheet { path: PathBuf, sheet: String },
    #[error("failed to read CSV {path}: {source}")]
    Csv { path: PathBuf, source: csv::Error },
    #[error("content source {0} has no header row")]
    Empty(PathBuf),
    #[error("missing required column '{column}' (found: {found:?})")]
    MissingColumn { column: String, found: Vec<String> },
    #[error("row {row}: required column '{column}' is blank")]
    MissingValue { row: usize, column: String },
}

/// Load records from a spreadsheet or CSV file.
///
/// `sheet` selects a workbook sheet by name; it is ignored for CSV.
pub fn load(path: &Path, sheet: Option<&str>) -> Result<Vec<Record>, LoadError> {
    if !path.is_file() {
        return Err(LoadError::NotFound(path.to_path_buf()));
    }
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    let rows = if extension == "csv" {
        read_csv_rows(path)?
    } else if WORKBOOK_EXTENSIONS.contains(&extension.as_str()) {
        read_workbook_rows(path, sheet)?
    } else {
        return Err(LoadError::UnsupportedFormat {
            path: path.to_path_buf(),
            extension,
        });
    };

    let mut rows = rows.into_iter();
    let header = rows
        .next()
        .ok_or_else(|| LoadError::Empty(path.to_path_buf()))?;
    records_from_rows(&header, rows)
}

fn read_csv_rows(path: &Path) -> Result<Vec<Vec<String>>, LoadError> {
    let csv_err = |source| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(csv_err)?;

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(csv_err)?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

fn read_workbook_rows(path: &Path, sheet: Option<&str>) -> Result<Vec<Vec<String>>, LoadError> {
    let workbook_err = |source| LoadError::Workbook {
        path: path.to_path_buf(),
        source,
    };
    let mut workbook = open_workbook_auto(path).map_err(workbook_err)?;

    let range = match sheet {
        Some(name) => {
            if !workbook.sheet_names().iter().any(|s| s == name) {
                return Err(LoadError::MissingSheet {
                    path: path.to_path_buf(),
                    sheet: name.to_string(),
                });
            }
            workbook.worksheet_range(name).map_err(workbook_err)?
        }
        None => match workbook.worksheet_range_at(0) {
            Some(range) => range.map_err(workbook_err)?,
            None => return Err(LoadError::Empty(path.to_path_buf())),
        },
    };

    Ok(range
        .rows()
        .map(|row| row.iter().map(cell_text).collect())
        .collect())
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

/// Column positions resolved from the header row.
struct Columns {
    category: usize,
    question: usize,
    answer: usize,
    summary: Option<usize>,
    keywords: Option<usize>,
    ai_summary: Option<usize>,
}

impl Columns {
    fn resolve(header: &[String]) -> Result<Self, LoadError> {
        let names: Vec<String> = header
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
            .collect();
        let find = |name: &str| names.iter().position(|n| n == name);
        let require = |name: &str| {
            find(name).ok_or_else(|| LoadError::MissingColumn {
                column: name.to_string(),
                found: names.clone(),
            })
        };

        Ok(Self {
            category: require("category")?,
            question: require("question")?,
            answer: require("answer")?,
            summary: find("summary"),
            keywords: find("keywords"),
            ai_summary: find("ai_summary"),
        })
    }
}

/// Build records from a header row and the data rows that follow it.
///
/// Row numbers in errors are 1-based with the header as row 1, matching what a
/// spreadsheet application shows.
pub fn records_from_rows<I>(header: &[String], rows: I) -> Result<Vec<Record>, LoadError>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let columns = Columns::resolve(header)?;
    let mut records = Vec::new();

    for (idx, row) in rows.into_iter().enumerate() {
        let row_number = idx + 2;
        if row.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        let text = |col: usize| row.get(col).map(|c| c.trim()).unwrap_or("");
        let optional = |col: Option<usize>| {
            col.map(text)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        let required = |col: usize, name: &str| {
            let value = text(col);
            if value.is_empty() {
                Err(LoadError::MissingValue {
                    row: row_number,
                    column: name.to_string(),
                })
            } else {
                Ok(value.to_string())
            }
        };

        records.push(Record {
            category: required(columns.category, "category")?,
            question: required(columns.question, "question")?,
            summary: optional(columns.summary),
            answer: text(columns.answer).to_string(),
            keywords: optional(columns.keywords),
            ai_summary: optional(columns.ai_summary),
        });
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::write_csv;
    use tempfile::TempDir;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn records_keep_source_order() {
        let header = row(&["category", "question", "answer"]);
        let records = records_from_rows(
            &header,
            vec![
                row(&["B", "second?", "2"]),
                row(&["A", "first?", "1"]),
                row(&["B", "third?", "3"]),
            ],
        )
        .unwrap();
        let questions: Vec<&str> = records.iter().map(|r| r.question.as_str()).collect();
        assert_eq!(questions, vec!["second?", "first?", "third?"]);
    }

    #[test]
    fn header_names_are_trimmed() {
        let header = row(&["\u{feff} category ", " question", "answer  ", " keywords "]);
        let records =
            records_from_rows(&header, vec![row(&["c", "q", "a", "geo,ai"])]).unwrap();
        assert_eq!(records[0].category, "c");
        assert_eq!(records[0].keywords.as_deref(), Some("geo,ai"));
    }

    #[test]
    fn missing_optional_columns_are_absent() {
        let header = row(&["category", "question", "answer"]);
        let records = records_from_rows(&header, vec![row(&["c", "q", "a"])]).unwrap();
        assert_eq!(records[0].summary, None);
        assert_eq!(records[0].keywords, None);
        assert_eq!(records[0].ai_summary, None);
    }

    #[test]
    fn blank_optional_cells_are_absent() {
        let header = row(&["category", "question", "answer", "summary", "ai_summary"]);
        let records =
            records_from_rows(&header, vec![row(&["c", "q", "a", "   ", ""])]).unwrap();
        assert_eq!(records[0].summary, None);
        assert_eq!(records[0].ai_summary, None);
    }

    #[test]
    fn short_rows_are_padded_with_blanks() {
        let header = row(&["category", "question", "answer", "keywords"]);
        let records = records_from_rows(&header, vec![row(&["c", "q"])]).unwrap();
        assert_eq!(records[0].answer, "");
        assert_eq!(records[0].keywords, None);
    }

    #[test]
    fn blank_rows_are_skipped() {
        let header = row(&["category", "question", "answer"]);
        let records = records_from_rows(
            &header,
            vec![row(&["", " ", ""]), row(&["c", "q", "a"]), row(&[])],
        )
        .unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn missing_required_column_is_error() {
        let header = row(&["category", "question", "summary"]);
        let err = records_from_rows(&header, vec![]).unwrap_err();
        match err {
            LoadError::MissingColumn { column, found } => {
                assert_eq!(column, "answer");
                assert!(found.contains(&"summary".to_string()));
            }
            other => panic!("expected MissingColumn, got {other:?}"),
        }
    }

    #[test]
    fn blank_question_reports_row_number() {
        let header = row(&["category", "question", "answer"]);
        let err = records_from_rows(
            &header,
            vec![row(&["c", "q", "a"]), row(&["c", "", "a"])],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            LoadError::MissingValue { row: 3, ref column } if column == "question"
        ));
    }

    #[test]
    fn answer_newlines_are_preserved() {
        let header = row(&["category", "question", "answer"]);
        let records =
            records_from_rows(&header, vec![row(&["c", "q", "第一段\n第二段"])]).unwrap();
        assert_eq!(records[0].answer, "第一段\n第二段");
    }

    // =========================================================================
    // File loading
    // =========================================================================

    #[test]
    fn load_csv_file() {
        let tmp = TempDir::new().unwrap();
        let path = write_csv(
            tmp.path(),
            "category,question,summary,answer,keywords\n\
             基础,什么是 GEO?,,\"第一段\n第二段\",\"geo,ai\"\n\
             进阶,如何优化?,简短回答,做好结构化数据,\n",
        );

        let records = load(&path, None).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].question, "什么是 GEO?");
        assert_eq!(records[0].summary, None);
        assert_eq!(records[0].answer, "第一段\n第二段");
        assert_eq!(records[0].keywords.as_deref(), Some("geo,ai"));
        assert_eq!(records[1].summary.as_deref(), Some("简短回答"));
        assert_eq!(records[1].keywords, None);
    }

    #[test]
    fn load_missing_file_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let err = load(&tmp.path().join("content.xlsx"), None).unwrap_err();
        assert!(matches!(err, LoadError::NotFound(_)));
    }

    #[test]
    fn load_unknown_extension_is_unsupported() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("content.txt");
        std::fs::write(&path, "category,question,answer\n").unwrap();
        let err = load(&path, None).unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedFormat { .. }));
    }

    #[test]
    fn load_empty_csv_has_no_header() {
        let tmp = TempDir::new().unwrap();
        let path = write_csv(tmp.path(), "");
        let err = load(&path, None).unwrap_err();
        assert!(matches!(err, LoadError::Empty(_)));
    }

    fn fixture_xlsx() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures/content.xlsx")
    }

    #[test]
    fn load_workbook_reads_first_sheet() {
        let records = load(&fixture_xlsx(), None).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].category, "基础");
        assert_eq!(records[0].question, "什么是 GEO?");
        assert_eq!(records[0].summary.as_deref(), Some("生成式引擎优化"));
        let paragraphs: Vec<&str> = records[0].answer_paragraphs().collect();
        assert_eq!(paragraphs, vec!["第一段", "第二段"]);
        assert_eq!(records[0].keywords.as_deref(), Some("geo,ai"));
        assert_eq!(records[1].summary, None);
        assert_eq!(records[2].category, "进阶");
    }

    #[test]
    fn load_workbook_numeric_cell_uses_display_form() {
        let records = load(&fixture_xlsx(), None).unwrap();
        assert_eq!(records[1].keywords.as_deref(), Some("2024"));
    }

    #[test]
    fn load_workbook_named_sheet() {
        let records = load(&fixture_xlsx(), Some("Archive")).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].category, "归档");
        assert_eq!(records[0].answer, "已归档。");
    }

    #[test]
    fn load_workbook_missing_sheet_is_error() {
        let err = load(&fixture_xlsx(), Some("Drafts")).unwrap_err();
        assert!(matches!(err, LoadError::MissingSheet { ref sheet, .. } if sheet == "Drafts"));
        assert!(err.to_string().contains("sheet 'Drafts' not found"));
    }

    #[test]
    fn load_corrupt_workbook_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("content.xlsx");
        std::fs::write(&path, b"not a zip archive").unwrap();
        let err = load(&path, None).unwrap_err();
        assert!(matches!(err, LoadError::Workbook { .. }));
    }
}
