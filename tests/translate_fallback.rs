// tests/translate_fallback.rs
mod common;

use common::{FailingProvider, StubProvider};
use feed_moderator::translate::{DynProvider, Translator};

#[tokio::test]
async fn primary_success_skips_secondary() {
    let primary = StubProvider::new("[p] ");
    let secondary = StubProvider::new("[s] ");
    let t = Translator::new(vec![primary.clone() as DynProvider, secondary.clone() as DynProvider]);

    assert_eq!(t.translate("hello", "uk").await, "[p] hello");
    assert_eq!(primary.calls(), 1);
    assert_eq!(secondary.calls(), 0);
}

#[tokio::test]
async fn primary_failure_falls_back_to_secondary() {
    let primary = FailingProvider::new();
    let secondary = StubProvider::new("[s] ");
    let t = Translator::new(vec![primary.clone() as DynProvider, secondary.clone() as DynProvider]);

    assert_eq!(t.translate("hello", "uk").await, "[s] hello");
    assert_eq!(primary.calls(), 1);
    assert_eq!(secondary.calls(), 1);
}

#[tokio::test]
async fn all_failures_return_input_unchanged() {
    let a = FailingProvider::new();
    let b = FailingProvider::new();
    let t = Translator::new(vec![a.clone() as DynProvider, b.clone() as DynProvider]);

    assert_eq!(t.translate("Kyiv under fire", "uk").await, "Kyiv under fire");
    assert_eq!(a.calls() + b.calls(), 2);
}

#[tokio::test]
async fn empty_input_never_reaches_a_provider() {
    let p = StubProvider::new("[p] ");
    let t = Translator::new(vec![p.clone() as DynProvider]);
    assert_eq!(t.translate("", "uk").await, "");
    assert_eq!(p.calls(), 0);
}

#[tokio::test]
async fn disabled_translator_is_identity() {
    assert_eq!(Translator::disabled().translate("text", "uk").await, "text");
}
