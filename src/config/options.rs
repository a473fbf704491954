// src/config/options.rs
use std::path::PathBuf;

use super::consts::{DEFAULT_NAMESPACE, DEFAULT_STORE};
use crate::retry::RetryPolicy;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Selection {
    All,
    Named(Vec<String>),
}

impl Selection {
    /// Empty list means "everything".
    pub fn from_names(names: Vec<String>) -> Self {
        if names.is_empty() { Selection::All } else { Selection::Named(names) }
    }

    /// Resolve against the available names, keeping the caller's order.
    /// Unknown names are returned in `Err`.
    pub fn resolve<'a>(&self, available: &[&'a str]) -> Result<Vec<&'a str>, Vec<String>> {
        match self {
            Selection::All => Ok(available.to_vec()),
            Selection::Named(names) => {
                let mut found = Vec::with_capacity(names.len());
                let mut unknown = Vec::new();
                for name in names {
                    match available.iter().find(|a| **a == name.as_str()) {
                        Some(a) if !found.contains(a) => found.push(*a),
                        Some(_) => {}
                        None => unknown.push(name.clone()),
                    }
                }
                if unknown.is_empty() { Ok(found) } else { Err(unknown) }
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunOptions {
    /// Directory holding one file per (dataset, store) plus the debug log.
    pub namespace: PathBuf,
    pub datasets: Selection,
    pub stores: Selection,
    pub retry: RetryPolicy,
    pub skip_ssl_verification: bool,
    pub airnow_api_key: Option<String>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            namespace: PathBuf::from(DEFAULT_NAMESPACE),
            datasets: Selection::All,
            stores: Selection::Named(vec![s!(DEFAULT_STORE)]),
            retry: RetryPolicy::default(),
            skip_ssl_verification: false,
            airnow_api_key: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const AVAILABLE: &[&str] = &["air_quality", "missoula_911", "mt_covid_counts"];

    #[test]
    fn all_resolves_to_everything() {
        assert_eq!(Selection::from_names(vec![]).resolve(AVAILABLE).unwrap(), AVAILABLE.to_vec());
    }

    #[test]
    fn named_keeps_order_and_drops_repeats() {
        let sel = Selection::from_names(vec![s!("mt_covid_counts"), s!("air_quality"), s!("mt_covid_counts")]);
        assert_eq!(sel.resolve(AVAILABLE).unwrap(), vec!["mt_covid_counts", "air_quality"]);
    }

    #[test]
    fn unknown_names_are_reported() {
        let sel = Selection::from_names(vec![s!("air_quality"), s!("weather")]);
        assert_eq!(sel.resolve(AVAILABLE).unwrap_err(), vec![s!("weather")]);
    }

    #[test]
    fn default_run_uses_json_lines_only() {
        let opts = RunOptions::default();
        assert_eq!(opts.stores.resolve(&["json-lines", "csv"]).unwrap(), vec!["json-lines"]);
        assert_eq!(opts.datasets, Selection::All);
    }
}
