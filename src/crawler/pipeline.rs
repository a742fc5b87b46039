//! Crawl pipeline - listing pages in, structured records out
//!
//! This module contains the crawl loop that coordinates:
//! - Fetching page 1 and resolving how many listing pages exist
//! - Walking the listing pages one at a time, deduplicating detail links
//! - Dispatching each page's new links to the worker pool
//! - Collecting records and per-run counters

use super::dispatcher::{DispatchContext, DispatchReport, Dispatcher};
use super::fetcher::{FetchPolicy, Fetcher};
use super::pagination::{ListingProbe, PaginationResolver, Strategy};
use super::transport::{ReqwestTransport, Transport};
use crate::config::{Config, CrawlerConfig};
use crate::model::{DetailLink, JobRecord, ListingPage, SkillRecord};
use crate::site::{site_for, JobSite};
use crate::skills::SkillCategorizer;
use crate::state::{CrawlState, ShutdownSignal};
use crate::url::UrlDeduplicator;
use crate::MinerError;
use async_trait::async_trait;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;

/// Per-run counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlCounts {
    pub pages_planned: u32,
    pub pages_crawled: u32,
    pub pages_failed: u32,
    pub links_discovered: usize,
    pub duplicate_links: usize,
    pub tasks_dispatched: usize,
    pub records: usize,
    pub fetch_failures: usize,
    pub parse_failures: usize,
    pub duplicate_records: usize,
    pub cancelled_tasks: usize,
    pub task_panics: usize,
    pub skills_matched: usize,
    pub skills_unmatched: usize,
}

impl CrawlCounts {
    fn absorb(&mut self, report: &DispatchReport) {
        self.records += report.postings.len();
        self.fetch_failures += report.fetch_failed;
        self.parse_failures += report.parse_failed;
        self.duplicate_records += report.duplicates;
        self.cancelled_tasks += report.cancelled;
        self.task_panics += report.panicked;
        for posting in &report.postings {
            self.skills_matched += posting.skills.len();
            self.skills_unmatched += posting.unmatched_skills;
        }
    }
}

/// How the page count was decided
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationSummary {
    pub pages: u32,
    pub strategy: Strategy,
    pub warning: bool,
}

/// Everything one crawl produced
#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    pub jobs: Vec<JobRecord>,
    pub skills: Vec<SkillRecord>,
    pub counts: CrawlCounts,
    pub pagination: PaginationSummary,
    /// Set when the shutdown signal stopped the crawl early
    pub interrupted: bool,
}

impl CrawlOutcome {
    fn empty() -> Self {
        Self {
            jobs: Vec::new(),
            skills: Vec::new(),
            counts: CrawlCounts::default(),
            pagination: PaginationSummary {
                pages: 1,
                strategy: Strategy::Fallback,
                warning: true,
            },
            interrupted: false,
        }
    }
}

/// Random pause in `[min_ms, max_ms]` between listing pages
fn polite_delay(crawler: &CrawlerConfig) -> Duration {
    let (low, high) = (crawler.polite_delay_min_ms, crawler.polite_delay_max_ms);
    if high == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rand::rng().random_range(low.min(high)..=high))
}

/// Fetches and parses listing pages for the pagination resolver
struct SiteProbe<'a> {
    fetcher: &'a Fetcher,
    site: &'a dyn JobSite,
    dedup: &'a UrlDeduplicator,
}

impl<'a> SiteProbe<'a> {
    async fn fetch_page(&self, index: u32) -> Option<(ListingPage, String)> {
        let url = self.site.listing_url(index);
        let (body, ok) = self.fetcher.fetch(&url).await.into_parts();
        if !ok {
            return None;
        }
        let page = self.site.parse_listing(index, &url, &body, self.dedup);
        tracing::debug!("Listing page {}: {} posting link(s)", index, page.len());
        Some((page, body))
    }
}

#[async_trait]
impl<'a> ListingProbe for SiteProbe<'a> {
    async fn fetch_listing(&self, page: u32) -> Option<ListingPage> {
        self.fetch_page(page).await.map(|(listing, _)| listing)
    }
}

/// One configured crawl over one site
pub struct Pipeline {
    crawler: CrawlerConfig,
    site: Arc<dyn JobSite>,
    fetcher: Fetcher,
    categorizer: Arc<SkillCategorizer>,
    shutdown: ShutdownSignal,
}

impl Pipeline {
    /// Creates a pipeline using the production HTTP transport
    ///
    /// # Returns
    ///
    /// * `Ok(Pipeline)` - Ready to run
    /// * `Err(MinerError)` - Unknown site, bad selector or HTTP client failure
    pub fn new(config: &Config) -> Result<Self, MinerError> {
        let transport = ReqwestTransport::new(
            &config.user_agent,
            Duration::from_secs(config.fetch.timeout_secs),
        )?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Creates a pipeline over any transport
    pub fn with_transport(
        config: &Config,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, MinerError> {
        let site = site_for(config)?;
        let fetcher = Fetcher::new(transport, FetchPolicy::from_config(&config.fetch));

        Ok(Self {
            crawler: config.crawler.clone(),
            site,
            fetcher,
            categorizer: Arc::new(SkillCategorizer::from_entries(&config.taxonomy)),
            shutdown: ShutdownSignal::new(),
        })
    }

    /// Replaces the shutdown signal, e.g. with one wired to Ctrl-C
    pub fn with_shutdown(mut self, shutdown: ShutdownSignal) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }

    /// Runs the crawl to completion
    ///
    /// Listing pages are processed strictly one after another; detail pages
    /// of one listing page run concurrently. Failures are counted, never
    /// returned.
    pub async fn run(&self) -> CrawlOutcome {
        let dedup = Arc::new(UrlDeduplicator::new(
            self.site.base_url().clone(),
            self.site.id_separator(),
        ));
        let mut state = CrawlState::new(Arc::clone(&dedup));
        let mut outcome = CrawlOutcome::empty();

        let probe = SiteProbe {
            fetcher: &self.fetcher,
            site: self.site.as_ref(),
            dedup: &dedup,
        };

        tracing::info!("Starting crawl of {}", self.site.source());

        let Some((first, first_html)) = probe.fetch_page(1).await else {
            tracing::error!("Could not fetch the first listing page; nothing to crawl");
            outcome.counts.pages_failed = 1;
            return outcome;
        };

        let resolver = PaginationResolver::new(
            self.crawler.page_size,
            self.crawler.max_pages_safety_cap,
            self.crawler.pagination,
            self.site.base_url().clone(),
        );
        let resolution = resolver.resolve(&first, &first_html, &probe).await;
        drop(first_html);

        outcome.pagination = PaginationSummary {
            pages: resolution.pages,
            strategy: resolution.strategy,
            warning: resolution.warning,
        };
        outcome.counts.pages_planned = resolution.pages;
        tracing::info!(
            "Crawling {} listing page(s) (strategy: {})",
            resolution.pages,
            resolution.strategy
        );

        let mut pending = resolution.prefetched;
        pending.insert(1, first);

        let dispatcher = Dispatcher::new(
            DispatchContext {
                fetcher: self.fetcher.clone(),
                site: Arc::clone(&self.site),
                categorizer: Arc::clone(&self.categorizer),
                dedup: Arc::clone(&dedup),
                shutdown: self.shutdown.clone(),
            },
            self.crawler.worker_count as usize,
        );

        for index in 1..=resolution.pages {
            if self.shutdown.is_triggered() {
                tracing::warn!("Shutdown requested; stopping before listing page {}", index);
                outcome.interrupted = true;
                break;
            }

            if index > 1 {
                let pause = polite_delay(&self.crawler);
                if !pause.is_zero() {
                    tokio::time::sleep(pause).await;
                }
            }

            let page = match pending.remove(&index) {
                Some(page) => page,
                None => match probe.fetch_page(index).await {
                    Some((page, _)) => page,
                    None => {
                        tracing::warn!("Skipping listing page {} after fetch failure", index);
                        outcome.counts.pages_failed += 1;
                        continue;
                    }
                },
            };

            state.advance_to(index);
            outcome.counts.pages_crawled += 1;
            outcome.counts.links_discovered += page.len();

            let discovered = page.len();
            let fresh: Vec<DetailLink> = page
                .links
                .into_iter()
                .filter(|link| state.dedup().is_new(&link.id))
                .collect();
            outcome.counts.duplicate_links += discovered - fresh.len();

            if fresh.is_empty() {
                tracing::info!(
                    "Listing page {} has no new postings; stopping",
                    state.cursor()
                );
                break;
            }

            tracing::info!(
                "Listing page {}/{}: {} new of {} link(s)",
                index,
                resolution.pages,
                fresh.len(),
                discovered
            );
            outcome.counts.tasks_dispatched += fresh.len();

            let report = dispatcher.run(fresh).await;
            outcome.counts.absorb(&report);
            for posting in report.postings {
                outcome.jobs.push(posting.job);
                outcome.skills.extend(posting.skills);
            }
        }

        if self.shutdown.is_triggered() {
            outcome.interrupted = true;
        }

        tracing::info!(
            "Crawl finished: {} record(s), {} distinct identifier(s) seen, {} fetch failure(s), {} parse failure(s)",
            outcome.counts.records,
            state.seen_count(),
            outcome.counts.fetch_failures,
            outcome.counts.parse_failures
        );
        outcome
    }
}
