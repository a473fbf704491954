// src/datasets/air_quality.rs
// Hourly PM2.5 readings from AirNow for every site in the Montana bounding box.

use serde_json::Value as Json;

use super::{rows_from, FetchContext};
use crate::{
    config::consts::AIRNOW_KEY_ENV,
    core::Http,
    dataset::{Dataset, FetchError, FetchResult},
    record::Record,
    transform::Transformer,
};

const URL: &str = "https://www.airnowapi.org/aq/data/";

const PARAMS: &[(&str, &str)] = &[
    ("parameters", "PM25"),
    ("BBOX", "-116.160889,44.298048,-103.416748,49.172497"),
    ("dataType", "A"),
    ("format", "application/json"),
    ("verbose", "1"),
    ("nowcastonly", "0"),
    ("includerawconcentrations", "0"),
];

pub struct AirQuality {
    http: Http,
    api_key: Option<String>,
}

impl AirQuality {
    pub const NAME: &'static str = "air_quality";

    pub fn new(ctx: &FetchContext) -> Self {
        Self { http: ctx.http.clone(), api_key: ctx.airnow_api_key.clone() }
    }

    fn try_fetch(&self) -> Result<Vec<Record>, FetchError> {
        let key = self.api_key.as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| FetchError::Config(format!("{AIRNOW_KEY_ENV} is not set")))?;

        let mut params: Vec<(&str, &str)> = PARAMS.to_vec();
        params.push(("API_KEY", key));
        rows_from(self.http.get_json::<Json>(URL, &params)?)
    }
}

impl Dataset for AirQuality {
    fn name(&self) -> &'static str { Self::NAME }

    fn dedup_facets(&self) -> &[&'static str] { &["site_name"] }

    fn dedup_fields(&self) -> &[&'static str] { &["utc_timestamp"] }

    fn transformer(&self) -> Transformer {
        Transformer::new()
            .rename("aqi", "AQI")
            .rename("agency_name", "AgencyName")
            .rename("category", "Category")
            .rename("full_aqs_code", "FullAQSCode")
            .rename("intl_aqs_code", "IntlAQSCode")
            .rename("latitude", "Latitude")
            .rename("longitude", "Longitude")
            .rename("parameter", "Parameter")
            .rename("site_name", "SiteName")
            .rename("utc_timestamp", "UTC")
            .rename("unit", "Unit")
    }

    fn fetch(&self) -> FetchResult { self.try_fetch().into() }
}
