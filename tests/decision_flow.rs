// tests/decision_flow.rs
mod common;

use std::sync::Arc;

use common::{native_item, RecordingBroadcaster, RecordingModerator, StaticFeed};
use feed_moderator::compose::{source_line, Composer, ComposerConfig, ALREADY_PROCESSED, STATUS_APPROVED, STATUS_REJECTED, TEXT_MESSAGE_LIMIT};
use feed_moderator::decision::{callback_data, DecisionHandler, DecisionOutcome, ModerationAction};
use feed_moderator::image::ImageResolver;
use feed_moderator::ingest::types::FeedItem;
use feed_moderator::ingest::Ingestor;
use feed_moderator::notify::updates::{Dispatched, Update, UpdateDispatcher};
use feed_moderator::relevance::RelevanceFilter;
use feed_moderator::store::{CandidateStatus, ModerationStore, RetentionPolicy, SharedStore, Token};
use feed_moderator::translate::Translator;

struct Harness {
    store: SharedStore,
    moderator: Arc<RecordingModerator>,
    broadcast: Arc<RecordingBroadcaster>,
    handler: DecisionHandler,
}

fn harness(retention: RetentionPolicy) -> Harness {
    let store = ModerationStore::shared(retention);
    let moderator = RecordingModerator::new();
    let broadcast = RecordingBroadcaster::new();
    let handler = DecisionHandler::new(store.clone(), moderator.clone(), broadcast.clone());
    Harness {
        store,
        moderator,
        broadcast,
        handler,
    }
}

/// Ingest `items` through the real pipeline so candidates and postings exist.
async fn ingest(h: &Harness, items: Vec<FeedItem>) {
    let composer = Composer::new(
        RelevanceFilter::default(),
        Translator::disabled(),
        ComposerConfig::default(),
    );
    let mut ingestor = Ingestor::new(
        vec![StaticFeed::boxed(items)],
        composer,
        ImageResolver::offline(),
        h.store.clone(),
        h.moderator.clone(),
    );
    ingestor.run_cycle().await;
}

#[tokio::test]
async fn scenario_native_item_approved_end_to_end() {
    let h = harness(RetentionPolicy::RetainDecided);
    let link = "https://www.ukrinform.ua/rubric/1";
    ingest(&h, vec![native_item(link, "Новина", "Короткий підсумок")]).await;

    let post = h.moderator.last_post();
    assert_eq!(
        post.text,
        format!("*Новина*\nКороткий підсумок\n\n[Читати джерело]({link})")
    );
    assert!(post.image_url.is_none());
    let token = post.token.unwrap();

    let out = h
        .handler
        .decide(&token, ModerationAction::Approve, Some(&post.posting))
        .await;
    let DecisionOutcome::Approved { broadcast } = out else {
        panic!("expected approval, got {out:?}");
    };

    let published = h.broadcast.published.lock().clone();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].posting, broadcast);
    assert_eq!(published[0].text, format!("{}{}", post.text, source_line(link)));

    let store = h.store.lock().await;
    let c = store.get(&token).unwrap();
    assert_eq!(c.status, CandidateStatus::Approved);
    assert_eq!(c.broadcast_ref, Some(broadcast));
    drop(store);

    let finalized = h.moderator.finalized.lock().clone();
    assert_eq!(finalized.len(), 1);
    assert_eq!(finalized[0].0, post.posting);
    assert!(finalized[0].1.ends_with(STATUS_APPROVED));
}

#[tokio::test]
async fn scenario_long_summary_truncated_before_source_line() {
    let h = harness(RetentionPolicy::RetainDecided);
    let link = "https://local.ua/long";
    ingest(&h, vec![native_item(link, "Довга", &"я".repeat(5000))]).await;
    let post = h.moderator.last_post();
    assert!(post.text.chars().count() <= TEXT_MESSAGE_LIMIT);

    h.handler
        .decide(&post.token.unwrap(), ModerationAction::Approve, None)
        .await;

    let text = h.broadcast.published.lock()[0].text.clone();
    assert!(text.chars().count() <= TEXT_MESSAGE_LIMIT);
    assert!(text.ends_with(&format!("...{}", source_line(link))));
}

#[tokio::test]
async fn second_decision_is_a_no_op() {
    let h = harness(RetentionPolicy::RetainDecided);
    ingest(&h, vec![native_item("https://local.ua/1", "A", "B")]).await;
    let post = h.moderator.last_post();
    let token = post.token.unwrap();

    let first = h.handler.decide(&token, ModerationAction::Approve, Some(&post.posting)).await;
    assert!(matches!(first, DecisionOutcome::Approved { .. }));

    for action in [ModerationAction::Approve, ModerationAction::Reject] {
        let again = h.handler.decide(&token, action, Some(&post.posting)).await;
        assert_eq!(again, DecisionOutcome::AlreadyProcessed);
    }
    assert_eq!(h.broadcast.published.lock().len(), 1);
    assert_eq!(h.store.lock().await.get(&token).unwrap().status, CandidateStatus::Approved);
}

#[tokio::test]
async fn concurrent_approvals_publish_once() {
    let h = Arc::new(harness(RetentionPolicy::RetainDecided));
    ingest(&h, vec![native_item("https://local.ua/race", "A", "B")]).await;
    let token = h.moderator.last_post().token.unwrap();

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let h = h.clone();
        tasks.push(tokio::spawn(async move {
            h.handler.decide(&token, ModerationAction::Approve, None).await
        }));
    }
    let mut approved = 0;
    for t in tasks {
        if matches!(t.await.unwrap(), DecisionOutcome::Approved { .. }) {
            approved += 1;
        }
    }
    assert_eq!(approved, 1);
    assert_eq!(h.broadcast.published.lock().len(), 1);
}

#[tokio::test]
async fn reject_never_broadcasts() {
    let h = harness(RetentionPolicy::DropDecided);
    ingest(&h, vec![native_item("https://local.ua/r", "A", "B")]).await;
    let post = h.moderator.last_post();
    let token = post.token.unwrap();

    let out = h.handler.decide(&token, ModerationAction::Reject, Some(&post.posting)).await;
    assert_eq!(out, DecisionOutcome::Rejected);
    assert!(h.broadcast.published.lock().is_empty());
    assert!(h.moderator.finalized.lock()[0].1.ends_with(STATUS_REJECTED));
    // Dropped right away under this policy.
    assert!(h.store.lock().await.get(&token).is_none());
    assert_eq!(
        h.handler.decide(&token, ModerationAction::Approve, None).await,
        DecisionOutcome::AlreadyProcessed
    );
}

#[tokio::test]
async fn unknown_and_forged_tokens_change_nothing() {
    let h = harness(RetentionPolicy::RetainDecided);
    ingest(&h, vec![native_item("https://local.ua/u", "A", "B")]).await;

    let out = h.handler.decide(&Token::new(), ModerationAction::Approve, None).await;
    assert_eq!(out, DecisionOutcome::AlreadyProcessed);
    let out = h.handler.decide_raw("not-a-token", ModerationAction::Approve, None).await;
    assert_eq!(out, DecisionOutcome::AlreadyProcessed);

    assert!(h.broadcast.published.lock().is_empty());
    assert_eq!(h.store.lock().await.pending_count(), 1);
}

#[tokio::test]
async fn broadcast_failure_keeps_candidate_pending() {
    let h = harness(RetentionPolicy::RetainDecided);
    ingest(&h, vec![native_item("https://local.ua/f", "A", "B")]).await;
    let post = h.moderator.last_post();
    let token = post.token.unwrap();

    h.broadcast.set_failing(true);
    let out = h.handler.decide(&token, ModerationAction::Approve, Some(&post.posting)).await;
    assert_eq!(out, DecisionOutcome::BroadcastFailed);
    assert!(h.store.lock().await.pending(&token).is_some());
    assert!(h.moderator.finalized.lock().is_empty());

    // A retry once the surface recovers succeeds.
    h.broadcast.set_failing(false);
    let out = h.handler.decide(&token, ModerationAction::Approve, Some(&post.posting)).await;
    assert!(matches!(out, DecisionOutcome::Approved { .. }));
}

fn callback_update(id: i64, data: &str, message_id: i64) -> Update {
    serde_json::from_value(serde_json::json!({
        "update_id": id,
        "callback_query": {
            "id": format!("cb-{id}"),
            "data": data,
            "message": {"message_id": message_id, "chat": {"id": common::MODERATOR_CHAT}}
        }
    }))
    .unwrap()
}

#[tokio::test]
async fn dispatcher_routes_callbacks_and_marks_stale_clicks() {
    let h = harness(RetentionPolicy::RetainDecided);
    ingest(&h, vec![native_item("https://local.ua/d", "A", "B")]).await;
    let post = h.moderator.last_post();
    let token = post.token.unwrap();

    let dispatcher = UpdateDispatcher::new(
        DecisionHandler::new(h.store.clone(), h.moderator.clone(), h.broadcast.clone()),
        None,
        h.moderator.clone(),
        common::MODERATOR_CHAT,
    );

    let data = callback_data(ModerationAction::Approve, &token);
    let first = dispatcher
        .dispatch(&callback_update(1, &data, post.posting.message_id))
        .await;
    assert!(matches!(first, Dispatched::Decision(DecisionOutcome::Approved { .. })));

    let second = dispatcher
        .dispatch(&callback_update(2, &data, post.posting.message_id))
        .await;
    assert_eq!(second, Dispatched::Decision(DecisionOutcome::AlreadyProcessed));
    let finalized = h.moderator.finalized.lock().clone();
    assert_eq!(finalized.last().unwrap().1, ALREADY_PROCESSED);

    // Unknown actions are acknowledged and otherwise ignored.
    let third = dispatcher
        .dispatch(&callback_update(3, "publish:whatever", post.posting.message_id))
        .await;
    assert_eq!(third, Dispatched::Skipped);
    assert_eq!(h.moderator.acks.lock().len(), 3);
    assert_eq!(h.broadcast.published.lock().len(), 1);
}
