//! Run-scoped crawl state
//!
//! Nothing in here outlives a single crawl invocation; duplicate suppression
//! across runs is left to the record store's unique keys.

use crate::url::UrlDeduplicator;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Identifiers seen so far and the listing page being processed
pub struct CrawlState {
    dedup: Arc<UrlDeduplicator>,
    cursor: u32,
}

impl CrawlState {
    pub fn new(dedup: Arc<UrlDeduplicator>) -> Self {
        Self { dedup, cursor: 0 }
    }

    /// Shared handle to the seen-set, for workers
    pub fn dedup(&self) -> &Arc<UrlDeduplicator> {
        &self.dedup
    }

    /// Current listing page (0 before the first page)
    pub fn cursor(&self) -> u32 {
        self.cursor
    }

    /// Moves the cursor to `page`; the cursor never moves backwards
    pub fn advance_to(&mut self, page: u32) {
        self.cursor = self.cursor.max(page);
    }

    /// Number of distinct identifiers seen this run
    pub fn seen_count(&self) -> usize {
        self.dedup.seen_count()
    }
}

/// Cooperative cancellation flag
///
/// Once triggered, no new listing page is started and queued detail tasks
/// skip their fetch. Requests already in flight run to completion or timeout.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    flag: Arc<AtomicBool>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}
