//! Minimal CSV table reader shared by the food-log and center loaders.
//!
//! Header row required. Fields may be quoted (`"a, b"`, `""` escapes a
//! quote) and a quoted field may span lines. Blank lines are skipped. Rows
//! must have as many fields as the header.

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CsvError {
    #[error("Failed to read {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("CSV has no header row")]
    MissingHeader,

    #[error("Required column '{0}' not found in header")]
    MissingColumn(String),

    #[error("Line {line}: expected {expected} fields, found {found}")]
    RaggedRow {
        line: usize,
        expected: usize,
        found: usize,
    },
}

/// One data row with its 1-based line number in the source.
#[derive(Debug, Clone)]
pub struct CsvRow {
    pub line: usize,
    pub fields: Vec<String>,
}

impl CsvRow {
    pub fn get(&self, idx: usize) -> &str {
        self.fields.get(idx).map_or("", |f| f.trim())
    }
}

#[derive(Debug, Clone)]
pub struct CsvTable {
    pub headers: Vec<String>,
    pub rows: Vec<CsvRow>,
}

impl CsvTable {
    pub fn read(path: &Path) -> Result<Self, CsvError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| CsvError::Io(path.to_path_buf(), e))?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self, CsvError> {
        let contents = contents.strip_prefix('\u{feff}').unwrap_or(contents);
        let mut records = split_records(contents)
            .into_iter()
            .filter(|(_, r)| !r.trim().is_empty());

        let (_, header_record) = records.next().ok_or(CsvError::MissingHeader)?;
        let headers: Vec<String> = csv_split(&header_record)
            .into_iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for (line, text) in records {
            let fields = csv_split(&text);
            if fields.len() != headers.len() {
                return Err(CsvError::RaggedRow {
                    line,
                    expected: headers.len(),
                    found: fields.len(),
                });
            }
            rows.push(CsvRow { line, fields });
        }

        Ok(Self { headers, rows })
    }

    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn require_column(&self, name: &str) -> Result<usize, CsvError> {
        self.column(name)
            .ok_or_else(|| CsvError::MissingColumn(name.to_string()))
    }
}

/// Split input into records, each tagged with the 1-based line it starts on.
///
/// Newlines inside a quoted field stay part of the record. A `\r` right
/// before a record-ending newline is dropped.
fn split_records(contents: &str) -> Vec<(usize, String)> {
    let mut records = Vec::new();
    let mut current = String::new();
    let mut start_line = 1;
    let mut line = 1;
    let mut in_quotes = false;

    for ch in contents.chars() {
        match ch {
            // A doubled quote toggles twice, so escapes need no special case
            '"' => {
                in_quotes = !in_quotes;
                current.push(ch);
            }
            '\n' => {
                line += 1;
                if in_quotes {
                    current.push(ch);
                } else {
                    if current.ends_with('\r') {
                        current.pop();
                    }
                    records.push((start_line, std::mem::take(&mut current)));
                    start_line = line;
                }
            }
            _ => current.push(ch),
        }
    }
    if current.ends_with('\r') {
        current.pop();
    }
    if !current.is_empty() {
        records.push((start_line, current));
    }
    records
}

/// Split a CSV record respecting quoted fields (handles commas inside quotes).
/// Returns owned strings because quoted fields need unquoting.
pub fn csv_split(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                if in_quotes {
                    // Escaped quote ("")
                    if chars.peek() == Some(&'"') {
                        current.push('"');
                        chars.next();
                    } else {
                        in_quotes = false;
                    }
                } else {
                    in_quotes = true;
                }
            }
            ',' if !in_quotes => {
                fields.push(std::mem::take(&mut current));
            }
            _ => current.push(ch),
        }
    }
    fields.push(current);
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_handles_quoted_commas() {
        let fields = csv_split(r#"Annapurna Trust,"Rice, Dal, Chapati",98450 11223,120"#);
        assert_eq!(fields, vec!["Annapurna Trust", "Rice, Dal, Chapati", "98450 11223", "120"]);
    }

    #[test]
    fn test_split_unescapes_double_quotes() {
        let fields = csv_split(r#""say ""hi""",x"#);
        assert_eq!(fields, vec![r#"say "hi""#, "x"]);
    }

    #[test]
    fn test_parse_skips_blank_lines_and_crlf() {
        let table = CsvTable::parse("\u{feff}A,B\r\n1,2\r\n\r\n3,4\r\n").unwrap();
        assert_eq!(table.headers, vec!["A", "B"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[1].line, 4);
        assert_eq!(table.rows[1].get(1), "4");
    }

    #[test]
    fn test_quoted_field_may_span_lines() {
        let csv = "CenterName,AcceptedFoods,Capacity_kg\r\n\
                   Seva Kitchen,\"Chapati,\r\nCurd\",40\r\n\
                   Hope Shelter,Salad,15\r\n";
        let table = CsvTable::parse(csv).unwrap();
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].line, 2);
        assert_eq!(table.rows[0].get(1), "Chapati,\r\nCurd");
        assert_eq!(table.rows[0].get(2), "40");
        assert_eq!(table.rows[1].line, 4);
        assert_eq!(table.rows[1].get(0), "Hope Shelter");
    }

    #[test]
    fn test_ragged_row_reports_line() {
        let err = CsvTable::parse("A,B\n1,2\n3\n").unwrap_err();
        assert!(matches!(err, CsvError::RaggedRow { line: 3, expected: 2, found: 1 }));
    }

    #[test]
    fn test_empty_input_has_no_header() {
        assert!(matches!(CsvTable::parse("\n\n"), Err(CsvError::MissingHeader)));
    }

    #[test]
    fn test_require_column() {
        let table = CsvTable::parse("Day, TimeSlot ,Rice\n").unwrap();
        assert_eq!(table.require_column("TimeSlot").unwrap(), 1);
        assert!(matches!(
            table.require_column("Dal"),
            Err(CsvError::MissingColumn(c)) if c == "Dal"
        ));
    }
}
