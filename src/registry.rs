// src/registry.rs
//! Runs the ETL pass: for each registered dataset, fetch (with retry),
//! transform the batch once, then hand it to every configured store.
//!
//! A failed fetch or transform skips storage for that dataset only. Stores
//! are independent of each other: one failing does not stop the next.

use std::path::Path;

use chrono::{DateTime, Local};
use thiserror::Error;
use tracing::{error, info, info_span, warn};

use crate::{
    config::options::RunOptions,
    core::{Http, NetError},
    dataset::{Dataset, FetchResult},
    datasets::{dataset_factory, dataset_names, FetchContext},
    progress::Progress,
    retry::RetryPolicy,
    storage::{append_dyn, store_factory, store_names, StoreFactory, StoreResult},
};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("unknown dataset(s): {}; available: {}", .0.join(", "), dataset_names().join(", "))]
    UnknownDataset(Vec<String>),
    #[error("unknown store(s): {}; available: {}", .0.join(", "), store_names().join(", "))]
    UnknownStore(Vec<String>),
    #[error("could not set up HTTP client: {0}")]
    Http(#[from] NetError),
}

/// The fetch step as reported: the fetched row count replaces the rows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchOutcome {
    pub success: bool,
    pub message: String,
    pub rows: usize,
}

impl From<&FetchResult> for FetchOutcome {
    fn from(res: &FetchResult) -> Self {
        Self { success: res.success, message: res.message.clone(), rows: res.rows.len() }
    }
}

/// Everything that happened to one dataset in one run. `success` is false if
/// any step failed; finding which one is up to the reader.
#[derive(Clone, Debug)]
pub struct UpdateResult {
    pub success: bool,
    pub fetch: FetchOutcome,
    pub stores: Vec<(&'static str, StoreResult)>,
    pub name: &'static str,
    pub timestamp: DateTime<Local>,
}

struct Entry {
    dataset: Box<dyn Dataset>,
    stores: Vec<StoreFactory>,
}

/// Datasets mapped to the stores that persist them.
pub struct Registry {
    entries: Vec<Entry>,
    retry: RetryPolicy,
}

impl Registry {
    pub fn new(retry: RetryPolicy) -> Self {
        Self { entries: Vec::new(), retry }
    }

    pub fn register(&mut self, dataset: Box<dyn Dataset>, stores: Vec<StoreFactory>) -> &mut Self {
        self.entries.push(Entry { dataset, stores });
        self
    }

    /// Every selected dataset, each writing to every selected store.
    pub fn from_options(opts: &RunOptions) -> Result<Self, RegistryError> {
        let datasets = opts.datasets.resolve(&dataset_names()).map_err(RegistryError::UnknownDataset)?;
        let kinds = opts.stores.resolve(&store_names()).map_err(RegistryError::UnknownStore)?;
        let stores: Vec<StoreFactory> = kinds.iter().filter_map(|k| store_factory(k)).collect();

        let ctx = FetchContext {
            http: Http::new(opts.skip_ssl_verification)?,
            airnow_api_key: opts.airnow_api_key.clone(),
        };

        let mut registry = Self::new(opts.retry);
        for make in datasets.iter().filter_map(|n| dataset_factory(n)) {
            registry.register(make(&ctx), stores.clone());
        }
        Ok(registry)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|e| e.dataset.name()).collect()
    }

    /// Fetch and store every dataset, one after another, into `namespace`.
    pub fn update(&self, namespace: &Path, mut progress: Option<&mut dyn Progress>) -> Vec<UpdateResult> {
        if let Some(p) = progress.as_deref_mut() { p.begin(self.entries.len()); }

        let mut results = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            let result = self.update_one(entry, namespace);
            if let Some(p) = progress.as_deref_mut() { p.dataset_done(&result); }
            results.push(result);
        }

        if let Some(p) = progress.as_deref_mut() { p.finish(); }
        results
    }

    fn update_one(&self, entry: &Entry, namespace: &Path) -> UpdateResult {
        let dataset = entry.dataset.as_ref();
        let name = dataset.name();
        let _span = info_span!("dataset", dataset = name).entered();

        let fetched = self.retry.run(|| dataset.fetch());
        let mut fetch = FetchOutcome::from(&fetched);
        if !fetched.success {
            error!(reason = %fetched.message, "fetch failed");
            return finished(name, fetch, Vec::new());
        }
        info!(rows = fetch.rows, "fetched");

        let rows = match dataset.transformer().apply_all(&fetched.rows) {
            Ok(rows) => rows,
            Err(e) => {
                fetch.success = false;
                fetch.message = format!("transform failed: {e}");
                error!(reason = %e, "transform failed");
                return finished(name, fetch, Vec::new());
            }
        };

        let facets = dataset.dedup_facets();
        let fields = dataset.dedup_fields();
        let stores = entry.stores.iter()
            .map(|make| {
                let store = make(namespace);
                let res = append_dyn(store.as_ref(), name, &rows, facets, fields);
                if !res.success { warn!(store = store.kind(), "store failed"); }
                (store.kind(), res)
            })
            .collect();

        finished(name, fetch, stores)
    }
}

fn finished(name: &'static str, fetch: FetchOutcome, stores: Vec<(&'static str, StoreResult)>) -> UpdateResult {
    let success = fetch.success && stores.iter().all(|(_, r)| r.success);
    UpdateResult { success, fetch, stores, name, timestamp: Local::now() }
}
