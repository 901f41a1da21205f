// tests/metrics_described.rs
use metrics::{Counter, Gauge, Histogram, Key, KeyName, Metadata, Recorder, SharedString, Unit};
use parking_lot::Mutex;
use regex::Regex;

use feed_moderator::telemetry::{describe_metrics, COUNTERS, GAUGES, HISTOGRAMS};

/// Remembers every description it is given; all handles are no-ops.
#[derive(Default)]
struct DescribeLog {
    seen: Mutex<Vec<(&'static str, String, Option<Unit>)>>,
}

impl DescribeLog {
    fn push(&self, kind: &'static str, key: KeyName, unit: Option<Unit>) {
        self.seen.lock().push((kind, key.as_str().to_string(), unit));
    }

    fn names(&self, kind: &str) -> Vec<String> {
        self.seen
            .lock()
            .iter()
            .filter(|(k, _, _)| *k == kind)
            .map(|(_, n, _)| n.clone())
            .collect()
    }
}

impl Recorder for DescribeLog {
    fn describe_counter(&self, key: KeyName, unit: Option<Unit>, _description: SharedString) {
        self.push("counter", key, unit);
    }

    fn describe_gauge(&self, key: KeyName, unit: Option<Unit>, _description: SharedString) {
        self.push("gauge", key, unit);
    }

    fn describe_histogram(&self, key: KeyName, unit: Option<Unit>, _description: SharedString) {
        self.push("histogram", key, unit);
    }

    fn register_counter(&self, _key: &Key, _metadata: &Metadata<'_>) -> Counter {
        Counter::noop()
    }

    fn register_gauge(&self, _key: &Key, _metadata: &Metadata<'_>) -> Gauge {
        Gauge::noop()
    }

    fn register_histogram(&self, _key: &Key, _metadata: &Metadata<'_>) -> Histogram {
        Histogram::noop()
    }
}

#[test]
fn every_metric_is_described_with_its_kind() {
    let log = DescribeLog::default();
    metrics::with_local_recorder(&log, describe_metrics);

    assert_eq!(log.names("counter"), COUNTERS);
    assert_eq!(log.names("gauge"), GAUGES);
    assert_eq!(log.names("histogram"), HISTOGRAMS);

    let parse = log
        .seen
        .lock()
        .iter()
        .find(|(_, n, _)| n == "ingest_parse_ms")
        .map(|(_, _, u)| u.clone());
    assert_eq!(parse, Some(Some(Unit::Milliseconds)));
}

#[test]
fn emit_sites_only_use_described_names() {
    let sources = [
        include_str!("../src/decision.rs"),
        include_str!("../src/edits.rs"),
        include_str!("../src/translate.rs"),
        include_str!("../src/ingest/mod.rs"),
        include_str!("../src/ingest/scheduler.rs"),
        include_str!("../src/ingest/providers/rss.rs"),
    ];
    let emit = Regex::new(r#"\b(counter|gauge|histogram)!\(\s*"([a-z_]+)""#).unwrap();

    let mut checked = 0;
    for src in sources {
        for cap in emit.captures_iter(src) {
            let described = match &cap[1] {
                "counter" => COUNTERS,
                "gauge" => GAUGES,
                _ => HISTOGRAMS,
            };
            assert!(described.contains(&&cap[2]), "{} {} is not described", &cap[1], &cap[2]);
            checked += 1;
        }
    }
    assert!(checked >= 12, "only {checked} emit sites found");
}
