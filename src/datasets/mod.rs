// src/datasets/mod.rs
//! The bundled Montana datasets and the name → constructor table the CLI
//! selects from.

mod air_quality;
mod missoula_911;
mod mt_covid_counts;

use serde_json::Value as Json;

use crate::{core::Http, dataset::{Dataset, FetchError}, record::Record};

pub use air_quality::AirQuality;
pub use missoula_911::Missoula911;
pub use mt_covid_counts::CovidCounts;

/// What a dataset needs to reach its source.
#[derive(Clone, Debug)]
pub struct FetchContext {
    pub http: Http,
    pub airnow_api_key: Option<String>,
}

pub type DatasetFactory = fn(&FetchContext) -> Box<dyn Dataset>;

fn air_quality(ctx: &FetchContext) -> Box<dyn Dataset> { Box::new(AirQuality::new(ctx)) }
fn missoula_911(ctx: &FetchContext) -> Box<dyn Dataset> { Box::new(Missoula911::new(ctx)) }
fn mt_covid_counts(ctx: &FetchContext) -> Box<dyn Dataset> { Box::new(CovidCounts::new(ctx)) }

pub const DATASETS: &[(&str, DatasetFactory)] = &[
    (AirQuality::NAME, air_quality),
    (Missoula911::NAME, missoula_911),
    (CovidCounts::NAME, mt_covid_counts),
];

pub fn dataset_names() -> Vec<&'static str> {
    DATASETS.iter().map(|(name, _)| *name).collect()
}

pub fn dataset_factory(name: &str) -> Option<DatasetFactory> {
    DATASETS.iter().find(|(n, _)| *n == name).map(|(_, f)| *f)
}

/// A JSON array of flat objects as records.
fn rows_from(payload: Json) -> Result<Vec<Record>, FetchError> {
    let Json::Array(items) = payload else {
        return Err(FetchError::Shape(s!("expected a JSON array of rows")));
    };
    items.into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            Json::Object(map) => Ok(Record::from_json_object(map)),
            other => Err(FetchError::Shape(format!("row {i} is not an object: {other}"))),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::record::Value;

    fn ctx() -> FetchContext {
        FetchContext { http: Http::new(false).unwrap(), airnow_api_key: None }
    }

    #[test]
    fn table_builds_every_dataset_under_its_own_name() {
        assert_eq!(dataset_names(), vec!["air_quality", "missoula_911", "mt_covid_counts"]);
        for (name, make) in DATASETS {
            assert_eq!(make(&ctx()).name(), *name);
        }
        assert!(dataset_factory("weather").is_none());
    }

    #[test]
    fn dedup_keys_survive_the_transform() {
        for (_, make) in DATASETS {
            let ds = make(&ctx());
            let transformer = ds.transformer();
            let names: Vec<&str> = transformer.names().collect();
            for key in ds.dedup_facets().iter().chain(ds.dedup_fields()) {
                assert!(names.contains(key), "{}: {key} not produced by transformer", ds.name());
            }
        }
    }

    #[test]
    fn rows_from_array_of_objects() {
        let rows = rows_from(json!([{ "a": 1, "b": [1, 2] }, { "a": null }])).unwrap();
        assert_eq!(rows[0].get("a"), Some(&Value::from(1)));
        assert_eq!(rows[0].get("b"), Some(&Value::from("[1,2]")));
        assert_eq!(rows[1].get("a"), Some(&Value::Null));
    }

    #[test]
    fn rows_from_rejects_other_shapes() {
        assert!(matches!(rows_from(json!({ "error": "nope" })), Err(FetchError::Shape(_))));
        assert!(matches!(rows_from(json!([1])), Err(FetchError::Shape(_))));
    }
}
