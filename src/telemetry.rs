// src/telemetry.rs
//! Metric descriptions. Emit sites live next to the code they count; every
//! name used there is described here.

use metrics::{describe_counter, describe_gauge, describe_histogram, Unit};
use once_cell::sync::OnceCell;

/// Counter names, in the order they are described.
pub const COUNTERS: &[&str] = &[
    "ingest_items_total",
    "ingest_duplicates_total",
    "ingest_discarded_total",
    "ingest_candidates_total",
    "ingest_source_errors_total",
    "ingest_runs_total",
    "moderation_decisions_total",
    "moderation_broadcast_errors_total",
    "moderation_edits_total",
    "translate_fallbacks_total",
];

pub const GAUGES: &[&str] = &["ingest_pipeline_last_run_ts"];

pub const HISTOGRAMS: &[&str] = &["ingest_parse_ms"];

/// Describe every metric against the installed recorder.
pub fn describe_metrics() {
    describe_counter!("ingest_items_total", "Feed items considered by ingest.");
    describe_counter!(
        "ingest_duplicates_total",
        "Items skipped because their canonical key was already seen."
    );
    describe_counter!(
        "ingest_discarded_total",
        "Foreign items discarded by the relevance gate."
    );
    describe_counter!(
        "ingest_candidates_total",
        "Candidates registered for moderation."
    );
    describe_counter!(
        "ingest_source_errors_total",
        "Feed fetch/parse errors and failed moderator posts."
    );
    describe_counter!("ingest_runs_total", "Scheduled ingestion cycles started.");
    describe_counter!(
        "moderation_decisions_total",
        "Moderator decisions, labelled by action."
    );
    describe_counter!(
        "moderation_broadcast_errors_total",
        "Approvals whose broadcast publish failed."
    );
    describe_counter!(
        "moderation_edits_total",
        "Moderator edits mirrored to the broadcast channel."
    );
    describe_counter!(
        "translate_fallbacks_total",
        "Translation attempts that fell through to the next provider."
    );
    describe_gauge!(
        "ingest_pipeline_last_run_ts",
        Unit::Seconds,
        "Unix time of the last ingestion cycle."
    );
    describe_histogram!(
        "ingest_parse_ms",
        Unit::Milliseconds,
        "Time spent parsing one feed document."
    );
}

/// [`describe_metrics`] at most once per process.
pub(crate) fn ensure_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(describe_metrics);
}
