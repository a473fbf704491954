// src/storage/csv_store.rs
// Header row plus type-marked data rows, `<namespace>/<name>.csv`.
//
// The header is fixed by the first row ever written; every later row must
// carry exactly the same field set. Quoted cells may span lines. Both readers
// join physical lines, terminators included, until the quotes balance: a
// record's quote count is even, and any tail of it that starts inside a
// quoted cell is odd, so the parity test finds record starts going backward.
use std::{
    fs::File,
    io::{self, BufRead, BufReader, Write},
    path::PathBuf,
};

use super::{Rows, Storage, StoreError};
use crate::{
    config::consts::CSV_EXT,
    core::read_backward,
    csv::{decode_row, parse_header, quotes_balanced, write_header, write_row, CsvError},
    file::{append_with, open_existing, write_atomic},
    record::{Record, Value},
};

#[derive(Clone, Debug)]
pub struct CsvStore {
    namespace: PathBuf,
}

impl CsvStore {
    pub const KIND: &'static str = "csv";

    pub fn new(namespace: impl Into<PathBuf>) -> Self {
        Self { namespace: namespace.into() }
    }

    /// The header of an existing, non-empty resource.
    fn header(&self, name: &str) -> Result<Option<Vec<String>>, StoreError> {
        let Some(file) = open_existing(&self.path_for(name))? else { return Ok(None) };
        let mut records = LogicalLines::new(file);
        match records.next().transpose()? {
            Some(line) => Ok(Some(parse_header(&line)?)),
            None => Ok(None),
        }
    }
}

/// Physical lines joined until their quotes balance; blank lines between
/// records dropped. Line terminators inside a record are kept.
struct LogicalLines {
    reader: BufReader<File>,
}

impl LogicalLines {
    fn new(file: File) -> Self { Self { reader: BufReader::new(file) } }
}

impl Iterator for LogicalLines {
    type Item = Result<String, StoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut record = String::new();
        loop {
            let start = record.len();
            match self.reader.read_line(&mut record) {
                Ok(0) if record.is_empty() => return None,
                Ok(0) => return Some(Err(CsvError::Unterminated.into())),
                Ok(_) => {
                    if start == 0 && record.trim().is_empty() { record.clear(); continue; }
                    if quotes_balanced(&record) { return Some(Ok(record)); }
                }
                Err(e) => return Some(Err(e.into())),
            }
        }
    }
}

/// The same records, last to first, from lines read backward.
struct BackwardRecords<I> {
    lines: I,
}

impl<I: Iterator<Item = io::Result<String>>> Iterator for BackwardRecords<I> {
    type Item = Result<String, StoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut record = String::new();
        loop {
            match self.lines.next() {
                Some(Ok(line)) => {
                    if record.is_empty() && line.trim().is_empty() { continue; }
                    record.insert_str(0, &line);
                    if quotes_balanced(&record) { return Some(Ok(record)); }
                }
                Some(Err(e)) => return Some(Err(e.into())),
                None if record.is_empty() => return None,
                None => return Some(Err(CsvError::Unterminated.into())),
            }
        }
    }
}

/// Values of `row` in header order, or a schema mismatch.
fn cells<'a>(header: &[String], row: &'a Record) -> Result<Vec<&'a Value>, StoreError> {
    let mismatch = || StoreError::SchemaMismatch { expected: header.to_vec(), found: row.field_names() };
    if row.len() != header.len() { return Err(mismatch()); }
    header.iter().map(|h| row.get(h).ok_or_else(mismatch)).collect()
}

fn write_rows(w: &mut dyn Write, header: &[String], rows: &[Record]) -> Result<(), StoreError> {
    for row in rows {
        write_row(&mut *w, cells(header, row)?)?;
    }
    Ok(())
}

impl Storage for CsvStore {
    fn kind(&self) -> &'static str { Self::KIND }

    fn path_for(&self, name: &str) -> PathBuf {
        self.namespace.join(format!("{name}.{CSV_EXT}"))
    }

    fn load(&self, name: &str) -> Result<Rows, StoreError> {
        let Some(file) = open_existing(&self.path_for(name))? else { return Ok(Box::new(std::iter::empty())) };
        let mut records = LogicalLines::new(file);
        let header = match records.next().transpose()? {
            Some(line) => parse_header(&line)?,
            None => return Ok(Box::new(std::iter::empty())),
        };
        let rows = records.map(move |line| -> Result<Record, StoreError> { Ok(decode_row(&header, &line?)?) });
        Ok(Box::new(rows))
    }

    fn load_backward(&self, name: &str) -> Result<Rows, StoreError> {
        let Some(header) = self.header(name)? else { return Ok(Box::new(std::iter::empty())) };
        let Some(file) = open_existing(&self.path_for(name))? else { return Ok(Box::new(std::iter::empty())) };

        let mut records = BackwardRecords { lines: read_backward(file)? }.peekable();
        // The last record read backward is the header itself.
        let rows = std::iter::from_fn(move || {
            let record = records.next()?;
            records.peek()?;
            Some(record)
        })
        .map(move |line| -> Result<Record, StoreError> { Ok(decode_row(&header, &line?)?) });
        Ok(Box::new(rows))
    }

    fn write_replace(&self, name: &str, rows: &[Record]) -> Result<(), StoreError> {
        let header = rows.first().map(Record::field_names).unwrap_or_default();
        // Check before touching the file.
        for row in rows { cells(&header, row)?; }

        write_atomic(&self.path_for(name), |w| {
            if !header.is_empty() { write_header(&mut *w, &header)?; }
            write_rows(w, &header, rows)
        })
    }

    fn write_append(&self, name: &str, rows: &[Record]) -> Result<(), StoreError> {
        let Some(header) = self.header(name)? else { return self.write_replace(name, rows) };
        for row in rows { cells(&header, row)?; }
        append_with(&self.path_for(name), |w| write_rows(w, &header, rows))
    }
}
