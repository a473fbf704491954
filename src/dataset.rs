// src/dataset.rs
//! A dataset is one remote table: where to fetch it, how to normalize its
//! rows and which fields identify a repeated row.

use thiserror::Error;

use crate::{core::NetError, record::Record, retry::Outcome, transform::Transformer};

#[derive(Debug, Error)]
pub enum FetchError {
    #[error(transparent)]
    Net(#[from] NetError),
    #[error("not configured: {0}")]
    Config(String),
    #[error("unexpected payload: {0}")]
    Shape(String),
}

/// Result of one fetch. On failure `rows` is empty and `message` says why;
/// on success `message` may be empty and `rows` may be too.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FetchResult {
    pub success: bool,
    pub message: String,
    pub rows: Vec<Record>,
}

impl FetchResult {
    pub fn ok(rows: Vec<Record>) -> Self {
        Self { success: true, message: s!(), rows }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self { success: false, message: message.into(), rows: Vec::new() }
    }
}

impl From<Result<Vec<Record>, FetchError>> for FetchResult {
    fn from(res: Result<Vec<Record>, FetchError>) -> Self {
        match res {
            Ok(rows) => Self::ok(rows),
            Err(e) => Self::failed(e.to_string()),
        }
    }
}

impl Outcome for FetchResult {
    fn succeeded(&self) -> bool { self.success }
}

pub trait Dataset {
    /// Used for file names and on the command line.
    fn name(&self) -> &'static str;

    /// Fields (after transform) that pick which stored row a new row is
    /// compared with, e.g. the sensor site. Empty switches dedup to
    /// suffix-splice mode.
    fn dedup_facets(&self) -> &[&'static str];

    /// Fields (after transform) that must all match for a row to count as
    /// already stored, typically a timestamp or an incident number.
    fn dedup_fields(&self) -> &[&'static str];

    fn transformer(&self) -> Transformer;

    /// Pull the current rows from the source, oldest first.
    fn fetch(&self) -> FetchResult;
}
