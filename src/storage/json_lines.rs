// src/storage/json_lines.rs
// One JSON object per line, `<namespace>/<name>.lines.json`.

use std::{
    io::{BufRead, BufReader, Write},
    path::PathBuf,
};

use super::{Rows, Storage, StoreError};
use crate::{
    config::consts::JSON_LINES_EXT,
    core::read_backward,
    file::{append_with, open_existing, write_atomic},
    record::Record,
};

#[derive(Clone, Debug)]
pub struct JsonLines {
    namespace: PathBuf,
}

impl JsonLines {
    pub const KIND: &'static str = "json-lines";

    pub fn new(namespace: impl Into<PathBuf>) -> Self {
        Self { namespace: namespace.into() }
    }
}

fn parse_line(line: &str) -> Option<Result<Record, StoreError>> {
    let line = line.trim();
    if line.is_empty() { return None; }
    Some(serde_json::from_str(line).map_err(StoreError::from))
}

fn write_rows(w: &mut dyn Write, rows: &[Record]) -> Result<(), StoreError> {
    for row in rows {
        serde_json::to_writer(&mut *w, row)?;
        w.write_all(b"\n")?;
    }
    Ok(())
}

impl Storage for JsonLines {
    fn kind(&self) -> &'static str { Self::KIND }

    fn path_for(&self, name: &str) -> PathBuf {
        self.namespace.join(format!("{name}.{JSON_LINES_EXT}"))
    }

    fn load(&self, name: &str) -> Result<Rows, StoreError> {
        let Some(file) = open_existing(&self.path_for(name))? else { return Ok(Box::new(std::iter::empty())) };
        let rows = BufReader::new(file).lines().filter_map(|line| match line {
            Ok(line) => parse_line(&line),
            Err(e) => Some(Err(e.into())),
        });
        Ok(Box::new(rows))
    }

    fn load_backward(&self, name: &str) -> Result<Rows, StoreError> {
        let Some(file) = open_existing(&self.path_for(name))? else { return Ok(Box::new(std::iter::empty())) };
        let rows = read_backward(file)?.filter_map(|line| match line {
            Ok(line) => parse_line(&line),
            Err(e) => Some(Err(e.into())),
        });
        Ok(Box::new(rows))
    }

    fn write_replace(&self, name: &str, rows: &[Record]) -> Result<(), StoreError> {
        write_atomic(&self.path_for(name), |w| write_rows(w, rows))
    }

    fn write_append(&self, name: &str, rows: &[Record]) -> Result<(), StoreError> {
        append_with(&self.path_for(name), |w| write_rows(w, rows))
    }
}
