// tests/relevance_filter.rs
use feed_moderator::relevance::{RelevanceFilter, SourceClass};

#[test]
fn hosts_are_classified_by_snippet() {
    let f = RelevanceFilter::default();
    assert_eq!(f.classify("https://www.bbc.com/news/world-1"), SourceClass::Foreign);
    assert_eq!(f.classify("https://WWW.Reuters.com/world/"), SourceClass::Foreign);
    assert_eq!(f.classify("https://www.dw.com/en/x"), SourceClass::Foreign);
    assert_eq!(f.classify("https://www.pravda.com.ua/news/1"), SourceClass::Native);
    assert_eq!(f.classify("garbage"), SourceClass::Native);
}

#[test]
fn native_items_are_always_relevant() {
    let f = RelevanceFilter::default();
    assert!(f.is_relevant("https://www.ukrinform.ua/x", "Погода", ""));
    assert!(f.is_relevant("https://www.ukrinform.ua/y", "", ""));
}

#[test]
fn foreign_items_need_a_keyword() {
    let f = RelevanceFilter::default();
    let link = "https://www.theguardian.com/world/2024/x";
    assert!(!f.is_relevant(link, "Elections in France", "Turnout was high."));
    assert!(f.is_relevant(link, "Talks on Ukraine resume", ""));
    assert!(f.is_relevant(link, "Aid package", "Delivered to KHARKIV overnight"));
    // Cyrillic stems match inflected forms.
    assert!(f.is_relevant(link, "", "Удар по Києву"));
}

#[test]
fn configured_lists_replace_defaults() {
    let f = RelevanceFilter::new(vec![" Example.ORG ".into()], &["Mars".to_string()]);
    assert_eq!(f.classify("https://www.bbc.com/a"), SourceClass::Native);
    assert!(f.is_relevant("https://news.example.org/1", "Rover lands on mars", ""));
    assert!(!f.is_relevant("https://news.example.org/2", "Ukraine", ""));
}

#[test]
fn no_keywords_means_no_foreign_item_passes() {
    let f = RelevanceFilter::new(vec!["bbc.".into()], &[]);
    assert!(!f.is_relevant("https://www.bbc.com/a", "Ukraine", "Kyiv"));
    assert!(f.is_relevant("https://local.ua/a", "", ""));
}
