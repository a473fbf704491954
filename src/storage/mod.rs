// src/storage/mod.rs
//! Persistence backends.
//!
//! Every backend keeps one resource per dataset name inside its namespace
//! directory and supports the same four operations:
//!
//! - `load` / `load_backward`: lazy iterators in storage order and in exact
//!   reverse of it. A resource that was never written is empty, not an error.
//! - `replace`: all-or-nothing rewrite of the whole resource.
//! - `append`: deduplicate the batch against what is stored (see
//!   [`crate::dedup`]) and add the survivors after the existing bytes. With
//!   nothing stored yet it is a plain `replace`.
//!
//! There is no locking. One writer per (namespace, dataset) at a time; another
//! process appending while `append` reads history backward breaks dedup.

mod csv_store;
mod json_lines;

use std::{io, path::{Path, PathBuf}};

use thiserror::Error;
use tracing::{debug, error, info};

use crate::{csv::CsvError, dedup::dedup, record::Record, retry::Outcome};

pub use csv_store::CsvStore;
pub use json_lines::JsonLines;

/// Lazy, finite sequence of stored rows. Holds its file handle until dropped.
pub type Rows = Box<dyn Iterator<Item = Result<Record, StoreError>>>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("malformed JSON line: {0}")]
    Json(#[from] serde_json::Error),
    #[error("malformed CSV row: {0}")]
    Csv(#[from] CsvError),
    #[error("row fields {found:?} do not match the CSV header {expected:?}")]
    SchemaMismatch { expected: Vec<String>, found: Vec<String> },
}

/// Outcome of a write, for reporting.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreResult {
    pub success: bool,
    pub message: String,
}

impl StoreResult {
    pub fn ok() -> Self { Self { success: true, message: s!() } }

    pub fn failed(message: impl Into<String>) -> Self {
        Self { success: false, message: message.into() }
    }
}

impl Outcome for StoreResult {
    fn succeeded(&self) -> bool { self.success }
}

pub trait Storage {
    /// Stable kebab-case backend name ("json-lines", "csv").
    fn kind(&self) -> &'static str;

    /// Where the resource for dataset `name` lives.
    fn path_for(&self, name: &str) -> PathBuf;

    fn load(&self, name: &str) -> Result<Rows, StoreError>;

    fn load_backward(&self, name: &str) -> Result<Rows, StoreError>;

    /// Atomically make `rows` the entire content.
    fn write_replace(&self, name: &str, rows: &[Record]) -> Result<(), StoreError>;

    /// Add `rows` after the existing content, which must exist.
    fn write_append(&self, name: &str, rows: &[Record]) -> Result<(), StoreError>;

    fn replace(&self, name: &str, rows: &[Record]) -> StoreResult {
        match self.write_replace(name, rows) {
            Ok(()) => {
                info!(store = self.kind(), dataset = name, rows = rows.len(), "replaced");
                StoreResult::ok()
            }
            Err(e) => failure(self.kind(), &self.path_for(name), name, "replace", e),
        }
    }

    fn append<S: AsRef<str>>(&self, name: &str, rows: &[Record], facets: &[S], fields: &[S]) -> StoreResult
    where
        Self: Sized,
    {
        append_dyn(self, name, rows, &keys(facets), &keys(fields))
    }
}

fn failure(kind: &str, path: &Path, name: &str, op: &str, e: StoreError) -> StoreResult {
    let message = format!("{kind} {op} of {} failed: {e}", path.display());
    error!(store = kind, dataset = name, "{message}");
    StoreResult::failed(message)
}

fn keys<S: AsRef<str>>(keys: &[S]) -> Vec<&str> {
    keys.iter().map(AsRef::as_ref).collect()
}

/// Dedup-aware append usable through `dyn Storage`.
pub fn append_dyn(
    store: &dyn Storage,
    name: &str,
    rows: &[Record],
    facets: &[&str],
    fields: &[&str],
) -> StoreResult {
    match try_append(store, name, rows, facets, fields) {
        Ok(written) => {
            info!(store = store.kind(), dataset = name, fetched = rows.len(), written, "appended");
            StoreResult::ok()
        }
        Err(e) => failure(store.kind(), &store.path_for(name), name, "append", e),
    }
}

fn try_append(
    store: &dyn Storage,
    name: &str,
    rows: &[Record],
    facets: &[&str],
    fields: &[&str],
) -> Result<usize, StoreError> {
    // Nothing stored yet: the batch becomes the whole history.
    if store.load(name)?.next().transpose()?.is_none() {
        debug!(store = store.kind(), dataset = name, "no history; replacing");
        store.write_replace(name, rows)?;
        return Ok(rows.len());
    }

    let fresh = dedup(|| store.load_backward(name), rows.to_vec(), facets, fields)?;
    if !fresh.is_empty() {
        store.write_append(name, &fresh)?;
    }
    Ok(fresh.len())
}

/* ---------------- Backend table ---------------- */

pub type StoreFactory = fn(&Path) -> Box<dyn Storage>;

fn json_lines(namespace: &Path) -> Box<dyn Storage> { Box::new(JsonLines::new(namespace)) }
fn csv(namespace: &Path) -> Box<dyn Storage> { Box::new(CsvStore::new(namespace)) }

/// Every backend the CLI can select, by name.
pub const STORES: &[(&str, StoreFactory)] = &[
    (JsonLines::KIND, json_lines),
    (CsvStore::KIND, csv),
];

pub fn store_names() -> Vec<&'static str> {
    STORES.iter().map(|(name, _)| *name).collect()
}

pub fn store_factory(kind: &str) -> Option<StoreFactory> {
    STORES.iter().find(|(name, _)| *name == kind).map(|(_, f)| *f)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_lists_both_backends() {
        assert_eq!(store_names(), vec!["json-lines", "csv"]);
        let dir = Path::new("ns");
        assert_eq!(store_factory("csv").unwrap()(dir).path_for("x"), dir.join("x.csv"));
        assert_eq!(store_factory("json-lines").unwrap()(dir).path_for("x"), dir.join("x.lines.json"));
        assert!(store_factory("sqlite").is_none());
    }

    #[test]
    fn failure_names_store_op_and_path() {
        let err = StoreError::SchemaMismatch { expected: vec![s!("a")], found: vec![s!("b")] };
        let res = failure("csv", Path::new("ns/t.csv"), "t", "append", err);
        assert!(!res.succeeded());
        assert!(res.message.starts_with("csv append of ns/t.csv failed: row fields"), "{}", res.message);
    }
}
