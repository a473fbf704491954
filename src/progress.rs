// src/progress.rs
use crate::registry::UpdateResult;

/// Status reporting for a registry run. Frontends implement this to show
/// per-dataset results as they land; every hook defaults to a no-op.
pub trait Progress {
    /// Called once with the number of datasets about to run.
    fn begin(&mut self, _total: usize) {}

    /// Called after each dataset, successful or not.
    fn dataset_done(&mut self, _result: &UpdateResult) {}

    /// Called at the end of the run.
    fn finish(&mut self) {}
}

/// A no-op progress sink.
pub struct NullProgress;
impl Progress for NullProgress {}
