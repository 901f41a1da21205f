// src/canonical.rs
//! Link canonicalization used as the deduplication key.

use url::Url;

/// Query parameters that only carry campaign/click tracking.
pub const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "fbclid",
    "gclid",
    "mc_cid",
    "mc_eid",
];

fn is_tracking_param(name: &str) -> bool {
    TRACKING_PARAMS
        .iter()
        .any(|p| p.eq_ignore_ascii_case(name))
}

/// Normalize a link into its canonical key.
///
/// Lowercases scheme and host, strips trailing slashes from the path (an empty
/// path becomes `/`), drops tracking parameters and the fragment, and
/// re-encodes the remaining query pairs in their original order.
/// Unparseable input is returned unchanged.
pub fn canonicalize(link: &str) -> String {
    let mut url = match Url::parse(link.trim()) {
        Ok(u) => u,
        Err(e) => {
            tracing::debug!(target: "ingest", error = %e, link, "canonicalize: unparseable link");
            return link.to_string();
        }
    };

    url.set_fragment(None);

    // The parser only folds case for http-like schemes.
    if let Some(host) = url.host_str().map(str::to_string) {
        let lower = host.to_lowercase();
        if lower != host && url.set_host(Some(&lower)).is_err() {
            tracing::debug!(target: "ingest", host = %host, "canonicalize: host left as is");
        }
    }

    if !url.cannot_be_a_base() {
        let trimmed = url.path().trim_end_matches('/').to_string();
        if trimmed.is_empty() {
            url.set_path("/");
        } else {
            url.set_path(&trimmed);
        }
    }

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| !is_tracking_param(k))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    if kept.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(kept);
    }

    url.to_string()
}
