// src/lib.rs

#[macro_use]
pub mod macros;

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod core;
pub mod csv;

pub mod dataset;
pub mod datasets;
pub mod dedup;
pub mod file;
pub mod log;
pub mod progress;
pub mod record;
pub mod registry;
pub mod retry;
pub mod storage;
pub mod transform;
