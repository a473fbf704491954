// tests/registry.rs
use std::cell::Cell;
use std::fs;
use std::time::Duration;

use mtdata::dataset::{Dataset, FetchResult};
use mtdata::progress::Progress;
use mtdata::record;
use mtdata::record::Record;
use mtdata::registry::{Registry, UpdateResult};
use mtdata::retry::RetryPolicy;
use mtdata::storage::{store_factory, StoreFactory};
use mtdata::transform::Transformer;

/// Serves scripted fetch results, one per call; the last one repeats.
struct Scripted {
    results: Vec<FetchResult>,
    calls: Cell<usize>,
}

impl Scripted {
    fn new(results: Vec<FetchResult>) -> Box<Self> {
        Box::new(Self { results, calls: Cell::new(0) })
    }
}

impl Dataset for Scripted {
    fn name(&self) -> &'static str { "sensors" }

    fn dedup_facets(&self) -> &[&'static str] { &["site"] }

    fn dedup_fields(&self) -> &[&'static str] { &["time"] }

    fn transformer(&self) -> Transformer {
        Transformer::new().rename("site", "Site").rename("time", "Time").field("pm25")
    }

    fn fetch(&self) -> FetchResult {
        let n = self.calls.get();
        self.calls.set(n + 1);
        self.results[n.min(self.results.len() - 1)].clone()
    }
}

fn raw_rows() -> Vec<Record> {
    vec![
        record! { "Site" => "Missoula", "Time" => "17:00", "pm25" => 9.5, "extra" => 1 },
        record! { "Site" => "Helena", "Time" => "17:00", "pm25" => 3 },
    ]
}

fn stores(kinds: &[&str]) -> Vec<StoreFactory> {
    kinds.iter().map(|k| store_factory(k).unwrap()).collect()
}

fn run_once(dataset: Box<Scripted>, kinds: &[&str], ns: &std::path::Path) -> UpdateResult {
    let mut registry = Registry::new(RetryPolicy::once());
    registry.register(dataset, stores(kinds));
    registry.update(ns, None).remove(0)
}

#[test]
fn fetched_rows_land_in_every_store_once() {
    let dir = tempfile::tempdir().unwrap();
    let mut registry = Registry::new(RetryPolicy::once());
    registry.register(Scripted::new(vec![FetchResult::ok(raw_rows())]), stores(&["json-lines", "csv"]));

    let first = registry.update(dir.path(), None);
    assert_eq!(first.len(), 1);
    assert!(first[0].success);
    assert_eq!(first[0].name, "sensors");
    assert_eq!(first[0].fetch.rows, 2);
    assert_eq!(first[0].stores.iter().map(|(k, _)| *k).collect::<Vec<_>>(), ["json-lines", "csv"]);

    let second = registry.update(dir.path(), None);
    assert!(second[0].success);

    let json = fs::read_to_string(dir.path().join("sensors.lines.json")).unwrap();
    assert_eq!(json.lines().count(), 2);
    assert!(!json.contains("extra"));
    let csv = fs::read_to_string(dir.path().join("sensors.csv")).unwrap();
    assert_eq!(csv, "\"site\",\"time\",\"pm25\"\n\"Missoula\",\"17:00\",9.5\n\"Helena\",\"17:00\",3\n");
}

#[test]
fn failed_fetch_skips_storage() {
    let dir = tempfile::tempdir().unwrap();
    let res = run_once(Scripted::new(vec![FetchResult::failed("HTTP 503")]), &["json-lines"], dir.path());

    assert!(!res.success);
    assert!(!res.fetch.success);
    assert_eq!(res.fetch.message, "HTTP 503");
    assert!(res.stores.is_empty());
    assert!(!dir.path().join("sensors.lines.json").exists());
}

#[test]
fn transform_failure_is_reported_as_fetch_failure() {
    let dir = tempfile::tempdir().unwrap();
    let rows = vec![record! { "Site" => "Butte", "pm25" => 1 }];
    let res = run_once(Scripted::new(vec![FetchResult::ok(rows)]), &["json-lines"], dir.path());

    assert!(!res.success);
    assert!(!res.fetch.success);
    assert!(res.fetch.message.starts_with("transform failed"), "{}", res.fetch.message);
    assert!(res.fetch.message.contains("Time"));
    assert!(res.stores.is_empty());
    assert!(!dir.path().join("sensors.lines.json").exists());
}

#[test]
fn one_failing_store_does_not_stop_the_next() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("sensors.csv"), "\"site\",\"other\"\n\"Butte\",1\n").unwrap();

    let res = run_once(Scripted::new(vec![FetchResult::ok(raw_rows())]), &["csv", "json-lines"], dir.path());

    assert!(!res.success);
    assert!(res.fetch.success);
    let (csv_kind, csv_res) = &res.stores[0];
    let (json_kind, json_res) = &res.stores[1];
    assert_eq!((*csv_kind, *json_kind), ("csv", "json-lines"));
    assert!(!csv_res.success);
    assert!(json_res.success);
    assert_eq!(fs::read_to_string(dir.path().join("sensors.csv")).unwrap(), "\"site\",\"other\"\n\"Butte\",1\n");
}

#[test]
fn fetch_is_retried_until_it_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    let mut registry = Registry::new(RetryPolicy::new(Duration::ZERO, 3));
    let dataset = Scripted::new(vec![
        FetchResult::failed("timeout"),
        FetchResult::failed("timeout"),
        FetchResult::ok(raw_rows()),
    ]);
    registry.register(dataset, stores(&["json-lines"]));

    let res = registry.update(dir.path(), None).remove(0);
    assert!(res.success);
    assert_eq!(res.fetch.rows, 2);
}

#[test]
fn retries_give_up_after_max_attempts() {
    let dir = tempfile::tempdir().unwrap();
    let mut registry = Registry::new(RetryPolicy::new(Duration::ZERO, 2));
    let dataset = Scripted::new(vec![
        FetchResult::failed("first"),
        FetchResult::failed("second"),
        FetchResult::ok(raw_rows()),
    ]);
    registry.register(dataset, stores(&["json-lines"]));

    let res = registry.update(dir.path(), None).remove(0);
    assert!(!res.success);
    assert_eq!(res.fetch.message, "second");
}

#[derive(Default)]
struct Recorder {
    events: Vec<String>,
}

impl Progress for Recorder {
    fn begin(&mut self, total: usize) { self.events.push(format!("begin {total}")); }

    fn dataset_done(&mut self, result: &UpdateResult) {
        self.events.push(format!("{} {}", result.name, result.success));
    }

    fn finish(&mut self) { self.events.push("finish".into()); }
}

#[test]
fn progress_sees_each_dataset() {
    let dir = tempfile::tempdir().unwrap();
    let mut registry = Registry::new(RetryPolicy::once());
    registry
        .register(Scripted::new(vec![FetchResult::ok(raw_rows())]), stores(&["json-lines"]))
        .register(Scripted::new(vec![FetchResult::failed("down")]), stores(&["json-lines"]));

    let mut progress = Recorder::default();
    registry.update(dir.path(), Some(&mut progress));
    assert_eq!(progress.events, ["begin 2", "sensors true", "sensors false", "finish"]);
}
