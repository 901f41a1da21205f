//! Runs a single ingestion cycle against `SOURCES` with log-only surfaces, so
//! the composed moderator messages can be inspected without a bot.

use std::sync::Arc;
use std::time::Duration;

use feed_moderator::compose::{Composer, ComposerConfig};
use feed_moderator::config::load_topic_default;
use feed_moderator::image::ImageResolver;
use feed_moderator::ingest::providers::rss::RssFeedProvider;
use feed_moderator::ingest::types::FeedSource;
use feed_moderator::ingest::Ingestor;
use feed_moderator::notify::LogSurface;
use feed_moderator::store::{ModerationStore, RetentionPolicy};
use feed_moderator::translate::Translator;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().with_target(false).init();

    let timeout = Duration::from_secs(10);
    let sources: Vec<Box<dyn FeedSource>> = std::env::var("SOURCES")
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .map(|u| Box::new(RssFeedProvider::from_url(u, timeout)) as Box<dyn FeedSource>)
        .collect();
    if sources.is_empty() {
        anyhow::bail!("set SOURCES to a comma-separated list of feed URLs");
    }

    let translator = match std::env::var("LIBRETRANSLATE_URL") {
        Ok(url) => Translator::with_defaults(&url, std::env::var("LIBRETRANSLATE_API_KEY").ok(), timeout),
        Err(_) => Translator::disabled(),
    };
    let composer = Composer::new(
        load_topic_default()?.into_filter(),
        translator,
        ComposerConfig::default(),
    );

    let mut ingestor = Ingestor::new(
        sources,
        composer,
        ImageResolver::new(true, timeout),
        ModerationStore::shared(RetentionPolicy::RetainDecided),
        Arc::new(LogSurface::new()),
    );
    let report = ingestor.run_cycle().await;

    println!(
        "feed-preview done: considered={} duplicates={} discarded={} registered={} failed={}",
        report.considered, report.duplicates, report.discarded, report.registered, report.failed
    );
    Ok(())
}
