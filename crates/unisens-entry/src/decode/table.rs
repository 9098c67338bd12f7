//! Delimited-text payloads of values and event entries.

use std::path::Path;
use std::str::FromStr;

use tracing::debug;

use crate::csv_format::CsvFileFormat;
use crate::EntryError;

/// Shape a delimited-text payload is returned in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ReadMode {
    /// Rows of fields with empty fields dropped.
    #[default]
    List,
    /// Typed table with the first column as row index.
    Frame,
    /// Rectangular matrix of raw field text.
    Matrix,
}

impl FromStr for ReadMode {
    type Err = EntryError;

    fn from_str(mode: &str) -> Result<Self, Self::Err> {
        match mode {
            "list" => Ok(ReadMode::List),
            "pandas" | "pd" | "dataframe" => Ok(ReadMode::Frame),
            "numpy" | "np" | "array" => Ok(ReadMode::Matrix),
            other => Err(EntryError::Validation(format!(
                "invalid mode: {other}, select from [\"numpy\", \"pandas\", \"list\"]"
            ))),
        }
    }
}

/// One event row: the parsed timestamp followed by the remaining fields.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct EventRecord {
    pub time: f64,
    pub fields: Vec<String>,
}

/// Table cell with the type inferred from its text.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum Cell {
    Int(i64),
    Float(f64),
    Text(String),
    Missing,
}

impl Cell {
    pub fn infer(raw: &str, decimal_mark: &str) -> Cell {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Cell::Missing;
        }
        if let Ok(value) = trimmed.parse::<i64>() {
            return Cell::Int(value);
        }
        match parse_decimal(trimmed, decimal_mark) {
            Some(value) => Cell::Float(value),
            None => Cell::Text(raw.to_string()),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Int(value) => Some(*value as f64),
            Cell::Float(value) => Some(*value),
            Cell::Text(_) | Cell::Missing => None,
        }
    }
}

/// Type shared by every cell of a frame column: the widest kind any of its
/// non-empty cells needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum ColumnKind {
    Int,
    Float,
    Text,
}

impl ColumnKind {
    fn of(raw: &str, decimal_mark: &str) -> ColumnKind {
        match Cell::infer(raw, decimal_mark) {
            Cell::Int(_) | Cell::Missing => ColumnKind::Int,
            Cell::Float(_) => ColumnKind::Float,
            Cell::Text(_) => ColumnKind::Text,
        }
    }

    fn cell(self, raw: &str, decimal_mark: &str) -> Cell {
        match (self, Cell::infer(raw, decimal_mark)) {
            (_, Cell::Missing) => Cell::Missing,
            (ColumnKind::Float, Cell::Int(value)) => Cell::Float(value as f64),
            (ColumnKind::Text, Cell::Int(_) | Cell::Float(_)) => Cell::Text(raw.to_string()),
            (_, cell) => cell,
        }
    }
}

/// Table whose first column became the row index.
///
/// Cells are typed per column: a column mixing integers and decimals holds
/// floats, a column with any text holds text (empty cells stay `Missing`).
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Frame {
    pub index: Vec<Cell>,
    pub rows: Vec<Vec<Cell>>,
    pub columns: usize,
}

impl Frame {
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn column(&self, col: usize) -> Option<Vec<&Cell>> {
        (col < self.columns).then(|| self.rows.iter().map(|row| &row[col]).collect())
    }
}

/// Row-major matrix of field text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Matrix {
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<String>,
}

impl Matrix {
    pub fn get(&self, row: usize, col: usize) -> Option<&str> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.data.get(row * self.cols + col).map(String::as_str)
    }

    pub fn row(&self, row: usize) -> Option<&[String]> {
        (row < self.rows).then(|| &self.data[row * self.cols..(row + 1) * self.cols])
    }
}

/// Split delimited text into records.
///
/// Follows the Excel dialect: a field starting with `"` is quoted, may
/// contain the separator and line breaks, and `""` stands for one quote.
/// `\r\n` and a lone `\r` both end a line. Blank lines come back as empty
/// records.
pub fn split_records(text: &str, separator: char) -> Vec<Vec<String>> {
    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    let mut records = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut field_start = true;
    let mut line_open = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(c);
            }
            continue;
        }
        match c {
            '"' if field_start => {
                in_quotes = true;
                field_start = false;
                line_open = true;
            }
            '\n' => {
                if line_open {
                    record.push(std::mem::take(&mut field));
                }
                records.push(std::mem::take(&mut record));
                field_start = true;
                line_open = false;
            }
            c if c == separator => {
                record.push(std::mem::take(&mut field));
                field_start = true;
                line_open = true;
            }
            c => {
                field.push(c);
                field_start = false;
                line_open = true;
            }
        }
    }
    if line_open {
        record.push(field);
        records.push(record);
    }
    records
}

/// Records with empty fields removed.
pub fn list_rows(records: Vec<Vec<String>>) -> Vec<Vec<String>> {
    records
        .into_iter()
        .map(|record| record.into_iter().filter(|field| !field.is_empty()).collect())
        .collect()
}

/// Parse list rows as events. The first field of every row must be a
/// timestamp; the first row that is not aborts the whole read.
pub fn event_records(
    records: Vec<Vec<String>>,
    decimal_mark: &str,
) -> Result<Vec<EventRecord>, EntryError> {
    list_rows(records)
        .into_iter()
        .enumerate()
        .map(|(idx, mut fields)| -> Result<EventRecord, EntryError> {
            let first = if fields.is_empty() {
                String::new()
            } else {
                fields.remove(0)
            };
            let time = parse_decimal(first.trim(), decimal_mark).ok_or(
                EntryError::Conversion {
                    row: idx + 1,
                    value: first,
                },
            )?;
            Ok(EventRecord { time, fields })
        })
        .collect()
}

pub fn frame(records: Vec<Vec<String>>, decimal_mark: &str) -> Result<Frame, EntryError> {
    let records: Vec<Vec<String>> = records
        .into_iter()
        .filter(|record| !record.is_empty())
        .collect();
    let Some(width) = records.first().map(Vec::len) else {
        return Ok(Frame::default());
    };
    if let Some((idx, record)) = records
        .iter()
        .enumerate()
        .find(|(_, record)| record.len() > width)
    {
        return Err(EntryError::Payload(format!(
            "row {} has {} fields, expected at most {width}",
            idx + 1,
            record.len()
        )));
    }

    let kinds: Vec<ColumnKind> = (0..width)
        .map(|col| {
            records
                .iter()
                .map(|record| ColumnKind::of(field_at(record, col), decimal_mark))
                .max()
                .unwrap_or(ColumnKind::Int)
        })
        .collect();

    let mut out = Frame {
        columns: width - 1,
        ..Default::default()
    };
    for record in &records {
        let mut cells = kinds
            .iter()
            .enumerate()
            .map(|(col, kind)| kind.cell(field_at(record, col), decimal_mark));
        out.index.push(cells.next().unwrap_or(Cell::Missing));
        out.rows.push(cells.collect());
    }
    Ok(out)
}

fn field_at(record: &[String], col: usize) -> &str {
    record.get(col).map_or("", String::as_str)
}

pub fn matrix(records: Vec<Vec<String>>) -> Result<Matrix, EntryError> {
    let mut out = Matrix::default();
    for record in records.into_iter().filter(|record| !record.is_empty()) {
        if out.rows == 0 {
            out.cols = record.len();
        } else if record.len() != out.cols {
            return Err(EntryError::Payload(format!(
                "row {} has {} fields, expected {}",
                out.rows + 1,
                record.len(),
                out.cols
            )));
        }
        out.data.extend(record);
        out.rows += 1;
    }
    Ok(out)
}

/// Read a delimited-text payload file into the requested shape.
pub fn read_table(
    path: &Path,
    format: &CsvFileFormat,
    mode: ReadMode,
    events: bool,
) -> Result<super::EntryData, EntryError> {
    use super::EntryData;

    let separator = format.separator_char()?;
    let text = std::fs::read_to_string(path)
        .map_err(|err| EntryError::Io(format!("{}: {err}", path.display())))?;
    let records = split_records(&text, separator);
    debug!(
        path = %path.display(),
        records = records.len(),
        ?mode,
        events,
        "read delimited payload"
    );
    let data = match (mode, events) {
        (ReadMode::List, false) => EntryData::Rows(list_rows(records)),
        (ReadMode::List, true) => EntryData::Events(event_records(records, format.decimal_mark())?),
        (ReadMode::Frame, _) => EntryData::Frame(frame(records, format.decimal_mark())?),
        (ReadMode::Matrix, _) => EntryData::Matrix(matrix(records)?),
    };
    Ok(data)
}

fn parse_decimal(raw: &str, decimal_mark: &str) -> Option<f64> {
    if decimal_mark == "." {
        raw.parse().ok()
    } else {
        raw.replace(decimal_mark, ".").parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|row| row.iter().map(|s| s.to_string()).collect())
            .collect()
    }

    #[test]
    fn read_mode_aliases() {
        assert_eq!("list".parse::<ReadMode>().unwrap(), ReadMode::List);
        assert_eq!("pd".parse::<ReadMode>().unwrap(), ReadMode::Frame);
        assert_eq!("dataframe".parse::<ReadMode>().unwrap(), ReadMode::Frame);
        assert_eq!("array".parse::<ReadMode>().unwrap(), ReadMode::Matrix);
        let err = "json".parse::<ReadMode>().unwrap_err();
        match err {
            EntryError::Validation(msg) => {
                assert!(msg.contains("numpy") && msg.contains("pandas") && msg.contains("list"))
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn split_plain_records() {
        let records = split_records("1;2;3\n4;5;6\n", ';');
        assert_eq!(records, strings(&[&["1", "2", "3"], &["4", "5", "6"]]));
        let records = split_records("a,b\r\nc,d", ',');
        assert_eq!(records, strings(&[&["a", "b"], &["c", "d"]]));
    }

    #[test]
    fn lone_carriage_return_ends_a_line() {
        let records = split_records("1;2\r3;4\r", ';');
        assert_eq!(records, strings(&[&["1", "2"], &["3", "4"]]));
        let records = split_records("1;2\r\n\r\n3;4", ';');
        assert_eq!(records.len(), 3);
        assert!(records[1].is_empty());
    }

    #[test]
    fn split_quoted_fields() {
        let records = split_records("\"a;b\";\"say \"\"hi\"\"\"\n\"multi\nline\";x\n", ';');
        assert_eq!(
            records,
            strings(&[&["a;b", "say \"hi\""], &["multi\nline", "x"]])
        );
    }

    #[test]
    fn blank_lines_are_empty_records() {
        let records = split_records("1;2\n\n3;4\n", ';');
        assert_eq!(records.len(), 3);
        assert!(records[1].is_empty());
    }

    #[test]
    fn list_rows_drop_empty_fields() {
        let rows = list_rows(split_records("1;;3;\n", ';'));
        assert_eq!(rows, strings(&[&["1", "3"]]));
    }

    #[test]
    fn events_parse_timestamps() {
        let events = event_records(split_records("1.5;a;b\n2;c\n", ';'), ".").unwrap();
        assert_eq!(
            events,
            vec![
                EventRecord {
                    time: 1.5,
                    fields: vec!["a".into(), "b".into()]
                },
                EventRecord {
                    time: 2.0,
                    fields: vec!["c".into()]
                },
            ]
        );
    }

    #[test]
    fn events_abort_on_bad_timestamp() {
        let err = event_records(split_records("1.0;ok\nx;a;b\n", ';'), ".").unwrap_err();
        match err {
            EntryError::Conversion { row, value } => {
                assert_eq!(row, 2);
                assert_eq!(value, "x");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        let err = event_records(split_records("1.0;ok\n\n", ';'), ".").unwrap_err();
        assert!(matches!(err, EntryError::Conversion { row: 2, .. }));
    }

    #[test]
    fn events_honour_decimal_comma() {
        let events = event_records(split_records("1,25;a\n", ';'), ",").unwrap();
        assert_eq!(events[0].time, 1.25);
    }

    #[test]
    fn frame_uses_first_column_as_index() {
        let frame = frame(split_records("0;1.5;a\n10;2\n\n", ';'), ".").unwrap();
        assert_eq!(frame.len(), 2);
        assert_eq!(frame.columns, 2);
        assert_eq!(frame.index, vec![Cell::Int(0), Cell::Int(10)]);
        assert_eq!(frame.rows[0], vec![Cell::Float(1.5), Cell::Text("a".into())]);
        assert_eq!(frame.rows[1], vec![Cell::Float(2.0), Cell::Missing]);
        let col = frame.column(0).unwrap();
        assert_eq!(col, vec![&Cell::Float(1.5), &Cell::Float(2.0)]);
    }

    #[test]
    fn frame_columns_share_one_type() {
        let frame = frame(split_records("0;1;x\n1;1,5;7\n2;;8\n", ';'), ",").unwrap();
        assert_eq!(
            frame.column(0).unwrap(),
            vec![&Cell::Float(1.0), &Cell::Float(1.5), &Cell::Missing]
        );
        assert_eq!(
            frame.column(1).unwrap(),
            vec![
                &Cell::Text("x".into()),
                &Cell::Text("7".into()),
                &Cell::Text("8".into())
            ]
        );
        assert_eq!(frame.index, vec![Cell::Int(0), Cell::Int(1), Cell::Int(2)]);
    }

    #[test]
    fn frame_rejects_overlong_rows() {
        let err = frame(split_records("0;1\n1;2;3\n", ';'), ".").unwrap_err();
        assert!(matches!(err, EntryError::Payload(_)));
    }

    #[test]
    fn matrix_requires_rectangular_rows() {
        let m = matrix(split_records("1;2\n3;\n", ';')).unwrap();
        assert_eq!((m.rows, m.cols), (2, 2));
        assert_eq!(m.get(1, 0), Some("3"));
        assert_eq!(m.get(1, 1), Some(""));
        assert_eq!(m.row(0).unwrap(), &["1".to_string(), "2".to_string()]);
        assert!(m.get(2, 0).is_none());
        let err = matrix(split_records("1;2\n3\n", ';')).unwrap_err();
        assert!(matches!(err, EntryError::Payload(_)));
    }
}
