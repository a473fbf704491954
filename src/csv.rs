// src/csv.rs
// Typed CSV rows.
//
// Type marking: text is always double-quoted (inner quotes doubled), numbers
// and booleans are bare, null is an empty bare cell. The parser keeps track of
// which cells were quoted so every value reads back as the kind it was written.

use std::io::{self, Write};
use std::mem::take;

use thiserror::Error;

use crate::record::{Record, Value};

pub const SEP: char = ',';

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CsvError {
    #[error("unterminated quoted cell")]
    Unterminated,
    #[error("bare cell `{0}` is neither a number nor a boolean")]
    BadBareCell(String),
    #[error("row has {found} cells but the header has {expected}")]
    Width { expected: usize, found: usize },
}

/* ---------------- Writing ---------------- */

fn write_text<W: Write>(w: &mut W, s: &str) -> io::Result<()> {
    write!(w, "\"{}\"", s.replace('"', "\"\""))
}

fn write_cell<W: Write>(w: &mut W, value: &Value) -> io::Result<()> {
    match value {
        Value::Text(s) => write_text(w, s),
        Value::Number(n) => write!(w, "{n}"),
        Value::Bool(b) => write!(w, "{b}"),
        Value::Null => Ok(()),
    }
}

/// Write one newline-terminated row.
pub fn write_row<'a, W: Write>(mut w: W, cells: impl IntoIterator<Item = &'a Value>) -> io::Result<()> {
    let mut first = true;
    for cell in cells {
        if !first { write!(w, "{SEP}")?; } else { first = false; }
        write_cell(&mut w, cell)?;
    }
    writeln!(w)
}

/// Header cells are text like any other.
pub fn write_header<W: Write>(mut w: W, names: &[String]) -> io::Result<()> {
    let mut first = true;
    for name in names {
        if !first { write!(w, "{SEP}")?; } else { first = false; }
        write_text(&mut w, name)?;
    }
    writeln!(w)
}

/* ---------------- Parsing ---------------- */

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Cell {
    pub text: String,
    pub quoted: bool,
}

/// A physical line ends a record only when its quotes are balanced; a quoted
/// cell may carry line breaks.
pub fn quotes_balanced(s: &str) -> bool {
    s.bytes().filter(|&b| b == b'"').count() % 2 == 0
}

/// Split one record (trailing "\n" / "\r\n" tolerated) into cells.
pub fn parse_record(line: &str) -> Result<Vec<Cell>, CsvError> {
    let line = line.strip_suffix('\n').unwrap_or(line);
    let line = line.strip_suffix('\r').unwrap_or(line);

    let mut cells = Vec::new();
    let mut cell = Cell::default();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes => {
                if matches!(chars.peek(), Some('"')) {
                    chars.next(); // double-quote escape
                    cell.text.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' => {
                if cell.text.is_empty() { cell.quoted = true; }
                in_quotes = true;
            }
            c if c == SEP && !in_quotes => cells.push(take(&mut cell)),
            c => cell.text.push(c),
        }
    }

    if in_quotes { return Err(CsvError::Unterminated); }
    cells.push(cell);
    Ok(cells)
}

pub fn cell_value(cell: Cell) -> Result<Value, CsvError> {
    if cell.quoted { return Ok(Value::Text(cell.text)); }
    match cell.text.as_str() {
        "" => Ok(Value::Null),
        "true" => Ok(Value::Bool(true)),
        "false" => Ok(Value::Bool(false)),
        bare => serde_json::from_str::<serde_json::Number>(bare)
            .map(Value::Number)
            .map_err(|_| CsvError::BadBareCell(s!(bare))),
    }
}

pub fn parse_header(line: &str) -> Result<Vec<String>, CsvError> {
    Ok(parse_record(line)?.into_iter().map(|c| c.text).collect())
}

/// Pair a data line with the header names.
pub fn decode_row(header: &[String], line: &str) -> Result<Record, CsvError> {
    let cells = parse_record(line)?;
    if cells.len() != header.len() {
        return Err(CsvError::Width { expected: header.len(), found: cells.len() });
    }
    header.iter()
        .zip(cells)
        .map(|(name, cell)| Ok((name.as_str(), cell_value(cell)?)))
        .collect()
}
