// src/datasets/mt_covid_counts.rs
// Per-county COVID-19 counts from the state's ArcGIS feature service.

use chrono::{Local, NaiveDate};
use serde_json::Value as Json;

use super::FetchContext;
use crate::{
    core::Http,
    dataset::{Dataset, FetchError, FetchResult},
    record::Record,
    transform::Transformer,
};

const URL: &str = "https://services.arcgis.com/qnjIrwR8z5Izc0ij/ArcGIS/rest/services/COVID_Cases_Production_View/FeatureServer/0/query";

const PARAMS: &[(&str, &str)] = &[
    ("f", "json"),
    ("where", "Total <> 0"),
    ("returnGeometry", "false"),
    ("spatialRel", "esriSpatialRelIntersects"),
    ("outFields", "*"),
    ("outSR", "102100"),
    ("resultOffset", "0"),
    ("resultRecordCount", "56"),
    ("cacheHint", "true"),
];

pub struct CovidCounts {
    http: Http,
}

/// `features[].attributes`, each stamped with the day it was fetched.
fn feature_rows(payload: Json, fetched: NaiveDate) -> Result<Vec<Record>, FetchError> {
    let stamp = fetched.format("%Y-%m-%d").to_string();
    let Some(Json::Array(features)) = payload.get("features").cloned() else {
        return Err(FetchError::Shape(s!("no `features` array in response")));
    };
    features.into_iter()
        .map(|feature| match feature {
            Json::Object(mut f) => match f.remove("attributes") {
                Some(Json::Object(attrs)) => {
                    let mut row = Record::from_json_object(attrs);
                    row.insert("fetch_date", stamp.as_str());
                    Ok(row)
                }
                _ => Err(FetchError::Shape(s!("feature without `attributes` object"))),
            },
            _ => Err(FetchError::Shape(s!("feature is not an object"))),
        })
        .collect()
}

impl CovidCounts {
    pub const NAME: &'static str = "mt_covid_counts";

    pub fn new(ctx: &FetchContext) -> Self { Self { http: ctx.http.clone() } }

    fn try_fetch(&self) -> Result<Vec<Record>, FetchError> {
        let payload = self.http.get_json::<Json>(URL, PARAMS)?;
        feature_rows(payload, Local::now().date_naive())
    }
}

impl Dataset for CovidCounts {
    fn name(&self) -> &'static str { Self::NAME }

    fn dedup_facets(&self) -> &[&'static str] { &["county"] }

    // A county's row is only new when one of its counts moved.
    fn dedup_fields(&self) -> &[&'static str] {
        &["cumulative_cases", "new_cases", "cumulative_deaths", "active_cases", "recovered_cases"]
    }

    fn transformer(&self) -> Transformer {
        Transformer::new()
            .rename("county", "NAMELABEL")
            .rename("county_fips", "ALLFIPS")
            .field("fetch_date")
            .rename("cumulative_cases", "Total")
            .rename("new_cases", "NewCases")
            .rename("cumulative_deaths", "TotalDeaths")
            .rename("active_cases", "TotalActive")
            .rename("recovered_cases", "TotalRecovered")
    }

    fn fetch(&self) -> FetchResult { self.try_fetch().into() }
}
