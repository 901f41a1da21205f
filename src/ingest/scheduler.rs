// src/ingest/scheduler.rs
use std::time::Duration;

use metrics::{counter, gauge};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::ingest::Ingestor;

#[derive(Clone, Copy, Debug)]
pub struct IngestSchedulerCfg {
    pub interval: Duration,
    pub first_delay: Duration,
}

impl Default for IngestSchedulerCfg {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(600),
            first_delay: Duration::from_secs(5),
        }
    }
}

/// Spawn the periodic ingestion task. Cycles never overlap: a slow cycle
/// delays the next tick instead of stacking up.
pub fn spawn_ingest_scheduler(cfg: IngestSchedulerCfg, mut ingestor: Ingestor) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(cfg.first_delay).await;

        let mut ticker = tokio::time::interval(cfg.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let report = ingestor.run_cycle().await;

            counter!("ingest_runs_total").increment(1);
            gauge!("ingest_pipeline_last_run_ts").set(chrono::Utc::now().timestamp() as f64);

            tracing::info!(
                target: "ingest",
                considered = report.considered,
                duplicates = report.duplicates,
                discarded = report.discarded,
                registered = report.registered,
                failed = report.failed,
                seen = ingestor.seen().len(),
                "ingest tick"
            );
        }
    })
}
