//! Feed moderation service: binary entrypoint.
//! Polls the configured feeds, posts candidates to the moderator chat and
//! publishes approved ones to the broadcast channel.

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use feed_moderator::compose::{Composer, ComposerConfig};
use feed_moderator::config::{load_topic_default, AppConfig};
use feed_moderator::decision::DecisionHandler;
use feed_moderator::edits::EditPropagator;
use feed_moderator::image::ImageResolver;
use feed_moderator::ingest::providers::rss::RssFeedProvider;
use feed_moderator::ingest::scheduler::{spawn_ingest_scheduler, IngestSchedulerCfg};
use feed_moderator::ingest::types::FeedSource;
use feed_moderator::ingest::Ingestor;
use feed_moderator::notify::telegram::{TelegramBroadcaster, TelegramClient, TelegramModerator};
use feed_moderator::notify::updates::{run_polling, UpdateDispatcher};
use feed_moderator::notify::{BroadcastSurface, ModeratorSurface};
use feed_moderator::store::ModerationStore;
use feed_moderator::translate::Translator;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("feed_moderator=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when the file is absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = AppConfig::from_env().context("loading configuration")?;
    let topic = load_topic_default().context("loading topic lists")?;
    tracing::info!(?cfg, keywords = topic.keywords.len(), foreign_hosts = topic.foreign_hosts.len(), "configuration loaded");

    let client = Arc::new(TelegramClient::new(cfg.bot_token.clone(), cfg.outbound_timeout));
    if let Err(e) = client.delete_webhook(true).await {
        tracing::warn!(error = %e, "deleteWebhook failed; continuing");
    }

    let store = ModerationStore::shared(cfg.retention);
    let moderator: Arc<dyn ModeratorSurface> =
        Arc::new(TelegramModerator::new(client.clone(), cfg.moderator_chat_id));
    let broadcast: Arc<dyn BroadcastSurface> =
        Arc::new(TelegramBroadcaster::new(client.clone(), cfg.broadcast_chat_id));

    // --- Ingestion ---
    let translator = Translator::with_defaults(
        &cfg.libretranslate_url,
        cfg.libretranslate_api_key.clone(),
        cfg.outbound_timeout,
    );
    let composer = Composer::new(
        topic.into_filter(),
        translator,
        ComposerConfig {
            target_language: cfg.translate_target.clone(),
            native_summary_budget: cfg.native_summary_budget,
        },
    );
    let images = ImageResolver::new(cfg.scrape_og_image, cfg.outbound_timeout);

    if cfg.sources.is_empty() {
        tracing::warn!("SOURCES is empty; nothing will be ingested");
    }
    let sources: Vec<Box<dyn FeedSource>> = cfg
        .sources
        .iter()
        .map(|url| Box::new(RssFeedProvider::from_url(url.as_str(), cfg.outbound_timeout)) as Box<dyn FeedSource>)
        .collect();

    let ingestor = Ingestor::new(sources, composer, images, store.clone(), moderator.clone())
        .with_items_per_source(cfg.items_per_source);
    let scheduler = spawn_ingest_scheduler(
        IngestSchedulerCfg {
            interval: cfg.poll_interval,
            first_delay: cfg.first_poll_delay,
        },
        ingestor,
    );

    // --- Moderation ---
    let decisions = DecisionHandler::new(store.clone(), moderator.clone(), broadcast.clone());
    let edits = cfg
        .edit_propagation
        .then(|| EditPropagator::new(store.clone(), broadcast.clone()));
    let dispatcher = UpdateDispatcher::new(decisions, edits, moderator, cfg.moderator_chat_id);

    tokio::select! {
        _ = run_polling(client, dispatcher) => {}
        res = tokio::signal::ctrl_c() => {
            if let Err(e) = res {
                tracing::warn!(error = %e, "ctrl-c handler failed");
            }
            tracing::info!("shutdown requested");
        }
    }

    scheduler.abort();
    Ok(())
}
