// src/cli.rs
use std::{
    io::{self, Write},
    path::PathBuf,
    time::Duration,
};

use clap::Parser;
use thiserror::Error;

use crate::{
    config::{
        consts::{AIRNOW_KEY_ENV, DEFAULT_NAMESPACE, DEFAULT_STORE, RETRY_ATTEMPTS, RETRY_DELTA_SECS},
        options::{RunOptions, Selection},
    },
    datasets::dataset_names,
    file::ensure_directory,
    log::{self, LogError},
    progress::Progress,
    registry::{Registry, RegistryError, UpdateResult},
    retry::RetryPolicy,
    storage::store_names,
};

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Log(#[from] LogError),
    #[error("namespace {path}: {source}")]
    Namespace { path: PathBuf, source: io::Error },
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Fetch Montana public datasets and append new rows to local stores.
#[derive(Debug, Parser)]
#[command(name = "mtdata", version)]
pub struct Cli {
    /// Directory for data files and debug.log; created if missing
    #[arg(short = 'n', long, visible_alias = "out", value_name = "DIR", default_value = DEFAULT_NAMESPACE)]
    pub namespace: PathBuf,

    /// Dataset to update (repeatable; default: all)
    #[arg(short = 'd', long = "dataset", value_name = "NAME")]
    pub datasets: Vec<String>,

    /// Store to write to (repeatable; default: json-lines)
    #[arg(short = 's', long = "store", value_name = "NAME")]
    pub stores: Vec<String>,

    /// Print dataset names and exit
    #[arg(long)]
    pub list_datasets: bool,

    /// Print store names and exit
    #[arg(long)]
    pub list_stores: bool,

    /// Fetch attempts per dataset
    #[arg(long, value_name = "N", default_value_t = RETRY_ATTEMPTS)]
    pub retries: u32,

    /// Extra wait added before each further attempt
    #[arg(long, value_name = "SECS", default_value_t = RETRY_DELTA_SECS)]
    pub retry_delay: u64,

    /// Accept invalid TLS certificates (some sources let theirs lapse)
    #[arg(long)]
    pub skip_ssl_verification: bool,

    /// AirNow API key for air_quality
    #[arg(long, env = AIRNOW_KEY_ENV, hide_env_values = true, value_name = "KEY")]
    pub airnow_api_key: Option<String>,
}

impl Cli {
    pub fn listing(&self) -> bool { self.list_datasets || self.list_stores }

    pub fn options(&self) -> RunOptions {
        let stores = if self.stores.is_empty() { vec![s!(DEFAULT_STORE)] } else { self.stores.clone() };
        RunOptions {
            namespace: self.namespace.clone(),
            datasets: Selection::from_names(self.datasets.clone()),
            stores: Selection::Named(stores),
            retry: RetryPolicy::new(Duration::from_secs(self.retry_delay), self.retries),
            skip_ssl_verification: self.skip_ssl_verification,
            airnow_api_key: self.airnow_api_key.clone(),
        }
    }
}

/// One `<name> - ok|fail` line per dataset, as each finishes.
struct StatusLines<'a> {
    out: &'a mut dyn Write,
    error: Option<io::Error>,
}

impl Progress for StatusLines<'_> {
    fn dataset_done(&mut self, result: &UpdateResult) {
        if self.error.is_some() { return; }
        let status = if result.success { "ok" } else { "fail" };
        if let Err(e) = writeln!(self.out, "{} - {status}", result.name) { self.error = Some(e); }
    }
}

pub fn run() -> Result<(), CliError> {
    let cli = Cli::parse();
    if !cli.listing() {
        log::init(&cli.namespace)?;
    }
    execute(&cli, &mut io::stdout().lock())
}

/// Dataset failures are reported on `out`, not returned.
pub fn execute(cli: &Cli, out: &mut dyn Write) -> Result<(), CliError> {
    if cli.list_datasets {
        for name in dataset_names() { writeln!(out, "{name}")?; }
    }
    if cli.list_stores {
        for name in store_names() { writeln!(out, "{name}")?; }
    }
    if cli.listing() { return Ok(()); }

    let opts = cli.options();
    ensure_directory(&opts.namespace)
        .map_err(|source| CliError::Namespace { path: opts.namespace.clone(), source })?;

    let registry = Registry::from_options(&opts)?;
    tracing::info!(datasets = ?registry.names(), namespace = %opts.namespace.display(), "update started");

    let mut status = StatusLines { out, error: None };
    let results = registry.update(&opts.namespace, Some(&mut status));
    if let Some(e) = status.error { return Err(e.into()); }

    let failed = results.iter().filter(|r| !r.success).count();
    tracing::info!(total = results.len(), failed, "update finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("mtdata").chain(args.iter().copied())).unwrap()
    }

    fn output(cli: &Cli) -> Result<String, CliError> {
        let mut buf = Vec::new();
        execute(cli, &mut buf)?;
        Ok(String::from_utf8(buf).unwrap())
    }

    #[test]
    fn defaults() {
        let opts = parse(&[]).options();
        assert_eq!(opts.namespace, PathBuf::from("."));
        assert_eq!(opts.datasets, Selection::All);
        assert_eq!(opts.stores, Selection::Named(vec![s!("json-lines")]));
        assert_eq!(opts.retry, RetryPolicy::default());
        assert!(!opts.skip_ssl_verification);
    }

    #[test]
    fn repeatable_selections_and_out_alias() {
        let cli = parse(&["--out", "data", "-d", "air_quality", "--dataset", "mt_covid_counts", "-s", "csv", "-s", "json-lines"]);
        let opts = cli.options();
        assert_eq!(opts.namespace, PathBuf::from("data"));
        assert_eq!(opts.datasets, Selection::Named(vec![s!("air_quality"), s!("mt_covid_counts")]));
        assert_eq!(opts.stores, Selection::Named(vec![s!("csv"), s!("json-lines")]));
    }

    #[test]
    fn retry_flags() {
        let opts = parse(&["--retries", "5", "--retry-delay", "0"]).options();
        assert_eq!(opts.retry, RetryPolicy::new(Duration::ZERO, 5));
    }

    #[test]
    fn lists_print_names() {
        assert_eq!(output(&parse(&["--list-stores"])).unwrap(), "json-lines\ncsv\n");
        assert_eq!(
            output(&parse(&["--list-datasets"])).unwrap(),
            "air_quality\nmissoula_911\nmt_covid_counts\n",
        );
    }

    #[test]
    fn unknown_names_are_errors() {
        let dir = tempfile::tempdir().unwrap();
        let ns = dir.path().to_str().unwrap();

        let err = output(&parse(&["-n", ns, "-d", "weather"])).unwrap_err();
        assert!(matches!(err, CliError::Registry(RegistryError::UnknownDataset(ref n)) if n == &[s!("weather")]));

        let err = output(&parse(&["-n", ns, "-s", "sqlite"])).unwrap_err();
        assert!(matches!(err, CliError::Registry(RegistryError::UnknownStore(_))));
    }

    #[test]
    fn bad_flag_is_rejected() {
        assert!(Cli::try_parse_from(["mtdata", "--retries", "many"]).is_err());
    }
}
