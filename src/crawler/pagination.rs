//! Listing page count detection
//!
//! Strategies, in order, each consulted only when the previous one is
//! inconclusive:
//! 1. Structured count embedded in page 1
//! 2. Highest page number in the pagination controls of page 1
//! 3. Empirical probing of pages 2, 3, ... until one is short, empty of new
//!    identifiers, or fails
//!
//! Every answer is clamped to the safety cap. When nothing is conclusive the
//! resolver settles on a single page and flags a warning.

use super::parser::{max_pagination_page, structured_total_count};
use crate::config::PaginationMode;
use crate::model::{DetailIdentifier, ListingPage};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use url::Url;

/// Fetches and parses listing pages on the resolver's behalf
#[async_trait]
pub trait ListingProbe: Send + Sync {
    /// `None` when the page could not be fetched
    async fn fetch_listing(&self, page: u32) -> Option<ListingPage>;
}

/// Which strategy produced the page count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    StructuredCount,
    PaginationControls,
    EmpiricalProbe,
    Fallback,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StructuredCount => "structured-count",
            Self::PaginationControls => "controls",
            Self::EmpiricalProbe => "probe",
            Self::Fallback => "fallback",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The resolver's answer
#[derive(Debug, Clone)]
pub struct PaginationOutcome {
    /// Number of listing pages to crawl, 1..=cap
    pub pages: u32,
    pub strategy: Strategy,
    /// Set when the count is a guess
    pub warning: bool,
    /// Listing pages fetched while probing, by index
    pub prefetched: BTreeMap<u32, ListingPage>,
}

impl PaginationOutcome {
    fn decided(pages: u32, strategy: Strategy) -> Self {
        Self {
            pages,
            strategy,
            warning: false,
            prefetched: BTreeMap::new(),
        }
    }
}

/// Decides how many listing pages a search has
#[derive(Debug, Clone)]
pub struct PaginationResolver {
    page_size: u32,
    safety_cap: u32,
    mode: PaginationMode,
    base_url: Url,
}

impl PaginationResolver {
    /// # Arguments
    ///
    /// * `page_size` - Postings on a full listing page
    /// * `safety_cap` - Upper bound on the answer
    /// * `mode` - Strategy chain to run
    /// * `base_url` - Used to resolve pagination hrefs
    pub fn new(page_size: u32, safety_cap: u32, mode: PaginationMode, base_url: Url) -> Self {
        Self {
            page_size: page_size.max(1),
            safety_cap: safety_cap.max(1),
            mode,
            base_url,
        }
    }

    fn clamp(&self, pages: u32) -> u32 {
        pages.clamp(1, self.safety_cap)
    }

    /// Resolves the page count from page 1
    ///
    /// # Arguments
    ///
    /// * `first` - Parsed page 1
    /// * `first_html` - Raw body of page 1
    /// * `probe` - Used only by the empirical strategy
    pub async fn resolve(
        &self,
        first: &ListingPage,
        first_html: &str,
        probe: &dyn ListingProbe,
    ) -> PaginationOutcome {
        let run_structured = matches!(self.mode, PaginationMode::Auto | PaginationMode::StructuredCount);
        let run_controls = matches!(self.mode, PaginationMode::Auto | PaginationMode::Controls);
        let run_probe = matches!(self.mode, PaginationMode::Auto | PaginationMode::Probe);

        if run_structured {
            if let Some(pages) = self.from_structured_count(first_html) {
                tracing::info!("Pagination: {} page(s) from structured count", pages);
                return PaginationOutcome::decided(pages, Strategy::StructuredCount);
            }
            tracing::debug!("Pagination: no structured count on page 1");
        }

        if run_controls {
            if let Some(pages) = self.from_controls(first_html) {
                tracing::info!("Pagination: {} page(s) from pagination controls", pages);
                return PaginationOutcome::decided(pages, Strategy::PaginationControls);
            }
            tracing::debug!("Pagination: no pagination controls on page 1");
        }

        if run_probe {
            if let Some(outcome) = self.probe(first, probe).await {
                tracing::info!("Pagination: {} page(s) from probing", outcome.pages);
                return outcome;
            }
        }

        tracing::warn!("Pagination could not be determined; crawling page 1 only");
        PaginationOutcome {
            pages: 1,
            strategy: Strategy::Fallback,
            warning: true,
            prefetched: BTreeMap::new(),
        }
    }

    fn from_structured_count(&self, html: &str) -> Option<u32> {
        let total = structured_total_count(html)?;
        let pages = total.div_ceil(u64::from(self.page_size));
        let pages = u32::try_from(pages).unwrap_or(u32::MAX);
        Some(self.clamp(pages))
    }

    fn from_controls(&self, html: &str) -> Option<u32> {
        max_pagination_page(html, &self.base_url).map(|pages| self.clamp(pages))
    }

    /// Walks pages 2..=cap with a seen-set seeded from page 1
    ///
    /// Returns `None` when page 1 itself has no postings.
    async fn probe(&self, first: &ListingPage, probe: &dyn ListingProbe) -> Option<PaginationOutcome> {
        if first.is_empty() {
            tracing::debug!("Pagination: page 1 has no postings, nothing to probe");
            return None;
        }

        let mut outcome = PaginationOutcome::decided(1, Strategy::EmpiricalProbe);
        if first.len() < self.page_size as usize {
            return Some(outcome);
        }

        let mut seen: HashSet<DetailIdentifier> = first.identifiers().cloned().collect();

        for page in 2..=self.safety_cap {
            let Some(listing) = probe.fetch_listing(page).await else {
                tracing::warn!("Probe of page {} failed; assuming {} page(s)", page, page - 1);
                outcome.pages = page - 1;
                return Some(outcome);
            };

            let new_ids = listing
                .identifiers()
                .filter(|id| seen.insert((*id).clone()))
                .count();
            tracing::debug!(
                "Probe page {}: {} posting(s), {} new",
                page,
                listing.len(),
                new_ids
            );

            if new_ids == 0 {
                outcome.pages = page - 1;
                return Some(outcome);
            }

            let short = listing.len() < self.page_size as usize;
            outcome.prefetched.insert(page, listing);
            if short {
                outcome.pages = page;
                return Some(outcome);
            }
        }

        tracing::warn!("Probing reached the safety cap of {} pages", self.safety_cap);
        outcome.pages = self.safety_cap;
        Some(outcome)
    }
}
