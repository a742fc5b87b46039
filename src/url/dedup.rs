//! Detail-page identifier canonicalization and the run-wide seen-set

use crate::model::DetailIdentifier;
use crate::url::normalize::{canonical_key, normalize_parsed, resolve_href};
use regex::Regex;
use std::collections::HashSet;
use std::sync::Mutex;
use url::Url;

/// Turns raw hrefs into identifiers and remembers which ones were handed out
///
/// `is_new` is a single test-and-set under one lock, so two workers racing on
/// the same identifier can never both be told it is new.
pub struct UrlDeduplicator {
    base: Url,
    token_pattern: Regex,
    seen: Mutex<HashSet<String>>,
}

impl UrlDeduplicator {
    /// Creates a deduplicator for one site
    ///
    /// # Arguments
    ///
    /// * `base` - Site root used to resolve relative hrefs
    /// * `id_separator` - Literal path fragment that precedes the posting
    ///   token, e.g. `,oferta,`
    pub fn new(base: Url, id_separator: &str) -> Self {
        let pattern = format!("{}([A-Za-z0-9-]+)", regex::escape(id_separator));
        let token_pattern = Regex::new(&pattern).expect("escaped literal is a valid regex");

        Self {
            base,
            token_pattern,
            seen: Mutex::new(HashSet::new()),
        }
    }

    /// Derives the canonical identifier of a posting
    ///
    /// Preference order:
    /// 1. `in_page_id`, when present and purely numeric
    /// 2. the token following the id separator in the URL path
    /// 3. the canonical absolute URL
    ///
    /// # Examples
    ///
    /// ```
    /// use job_miner::url::UrlDeduplicator;
    /// use job_miner::DetailIdentifier;
    /// use url::Url;
    ///
    /// let dedup = UrlDeduplicator::new(Url::parse("https://theprotocol.it").unwrap(), ",oferta,");
    /// let id = dedup.canonicalize("/szczegoly/praca/analityk,oferta,952b0000-9568", None);
    /// assert_eq!(id, DetailIdentifier::Token("952b0000-9568".to_string()));
    /// ```
    pub fn canonicalize(&self, raw_href: &str, in_page_id: Option<&str>) -> DetailIdentifier {
        if let Some(id) = in_page_id.map(str::trim) {
            if !id.is_empty() && id.chars().all(|c| c.is_ascii_digit()) {
                return DetailIdentifier::Numeric(id.to_string());
            }
        }

        let canonical = self.canonical_url(raw_href);

        let path = Url::parse(&canonical)
            .map(|u| u.path().to_string())
            .unwrap_or_else(|_| canonical.clone());
        if let Some(token) = self.token_pattern.captures(&path).and_then(|c| c.get(1)) {
            return DetailIdentifier::Token(token.as_str().to_string());
        }

        DetailIdentifier::Url(canonical)
    }

    /// Canonical absolute form of an href
    ///
    /// Unparseable hrefs fall back to their trimmed text without a trailing slash.
    pub fn canonical_url(&self, raw_href: &str) -> String {
        match resolve_href(&self.base, raw_href).and_then(normalize_parsed) {
            Ok(url) => canonical_key(&url),
            Err(e) => {
                tracing::debug!("Using raw href as identifier for '{}': {}", raw_href, e);
                raw_href.trim().trim_end_matches('/').to_string()
            }
        }
    }

    /// Absolute URL to fetch for an href, scheme preserved
    pub fn absolute_url(&self, raw_href: &str) -> Option<String> {
        resolve_href(&self.base, raw_href)
            .and_then(normalize_parsed)
            .map(|url| url.to_string())
            .ok()
    }

    /// Returns true exactly once per identifier, marking it seen
    pub fn is_new(&self, id: &DetailIdentifier) -> bool {
        let mut seen = self.seen.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        seen.insert(id.as_str().to_string())
    }

    /// Number of identifiers marked so far
    pub fn seen_count(&self) -> usize {
        self.seen
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}
