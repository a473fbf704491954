// src/datasets/missoula_911.rs
// Missoula city and county 911 calls from the county's daily public report.

use chrono::{Local, NaiveDate, TimeDelta};
use serde_json::Value as Json;

use super::{rows_from, FetchContext};
use crate::{
    config::consts::INCIDENT_LOOKBACK_DAYS,
    core::Http,
    dataset::{Dataset, FetchError, FetchResult},
    record::Record,
    transform::{updaters::split_first, Transformer},
};

const URL: &str = "https://apps.missoulacounty.us/dailypublicreport/pinpoints.ashx";

/// The report wants unpadded `month/day/year`.
const DATE_FORMAT: &str = "%-m/%-d/%Y";

pub struct Missoula911 {
    http: Http,
}

/// `(startdate, enddate)` covering the lookback window ending `today`.
fn window(today: NaiveDate) -> (String, String) {
    let start = today - TimeDelta::days(INCIDENT_LOOKBACK_DAYS);
    (start.format(DATE_FORMAT).to_string(), today.format(DATE_FORMAT).to_string())
}

impl Missoula911 {
    pub const NAME: &'static str = "missoula_911";

    pub fn new(ctx: &FetchContext) -> Self { Self { http: ctx.http.clone() } }

    fn try_fetch(&self) -> Result<Vec<Record>, FetchError> {
        let (start, end) = window(Local::now().date_naive());
        let params = [("startdate", start.as_str()), ("enddate", end.as_str())];
        rows_from(self.http.get_json::<Json>(URL, &params)?)
    }
}

impl Dataset for Missoula911 {
    fn name(&self) -> &'static str { Self::NAME }

    fn dedup_facets(&self) -> &[&'static str] { &[] }

    fn dedup_fields(&self) -> &[&'static str] { &["cfs_number"] }

    fn transformer(&self) -> Transformer {
        Transformer::new()
            .rename("agency", "Agency")
            .rename("cfs_number", "CFSNumber")
            .rename("latitude", "Latitude")
            .rename("longitude", "Longitude")
            // "8/20/2020 10:03:12 AM / 1234 Main St"
            .update("timestamp", Some("Description"), split_first(" / "))
            .rename("title", "Title")
    }

    fn fetch(&self) -> FetchResult { self.try_fetch().into() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Value;

    #[test]
    fn window_is_unpadded_and_spans_a_week() {
        let today = NaiveDate::from_ymd_opt(2020, 9, 3).unwrap();
        assert_eq!(window(today), (s!("8/27/2020"), s!("9/3/2020")));
    }

    #[test]
    fn timestamp_comes_from_description() {
        let raw = record! {
            "Agency" => "MPD", "CFSNumber" => "2020-123456", "Latitude" => 46.87, "Longitude" => -113.99,
            "Description" => "8/20/2020 10:03:12 AM / 1234 Main St", "Title" => "TRAFFIC STOP",
        };
        let ctx = FetchContext { http: Http::new(false).unwrap(), airnow_api_key: None };
        let row = Missoula911::new(&ctx).transformer().apply(&raw).unwrap();
        assert_eq!(row.get("timestamp"), Some(&Value::from("8/20/2020 10:03:12 AM")));
        assert_eq!(row.field_names(), ["agency", "cfs_number", "latitude", "longitude", "timestamp", "title"]);
    }
}
