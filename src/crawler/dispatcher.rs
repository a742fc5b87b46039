//! Bounded worker pool for detail pages
//!
//! One task per detail link, at most `worker_count` of them holding a permit
//! at any time. A failing or panicking task is counted and logged; it never
//! cancels its siblings.

use super::fetcher::Fetcher;
use crate::model::{DetailLink, JobRecord, SkillRecord};
use crate::site::JobSite;
use crate::skills::SkillCategorizer;
use crate::state::ShutdownSignal;
use crate::url::UrlDeduplicator;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Everything a worker needs, shared read-only across tasks
pub struct DispatchContext {
    pub fetcher: Fetcher,
    pub site: Arc<dyn JobSite>,
    pub categorizer: Arc<SkillCategorizer>,
    pub dedup: Arc<UrlDeduplicator>,
    pub shutdown: ShutdownSignal,
}

/// One extracted posting with its categorized skills
#[derive(Debug, Clone)]
pub struct Posting {
    pub job: JobRecord,
    pub skills: Vec<SkillRecord>,
    /// Skill labels that matched no category
    pub unmatched_skills: usize,
}

enum TaskOutcome {
    Posting(Posting),
    FetchFailed,
    ParseFailed,
    Duplicate,
    Cancelled,
}

/// Aggregated result of one dispatch round; postings are in completion order
#[derive(Debug, Default)]
pub struct DispatchReport {
    pub postings: Vec<Posting>,
    pub fetch_failed: usize,
    pub parse_failed: usize,
    pub duplicates: usize,
    pub cancelled: usize,
    pub panicked: usize,
}

impl DispatchReport {
    fn record(&mut self, outcome: TaskOutcome) {
        match outcome {
            TaskOutcome::Posting(posting) => self.postings.push(posting),
            TaskOutcome::FetchFailed => self.fetch_failed += 1,
            TaskOutcome::ParseFailed => self.parse_failed += 1,
            TaskOutcome::Duplicate => self.duplicates += 1,
            TaskOutcome::Cancelled => self.cancelled += 1,
        }
    }
}

pub struct Dispatcher {
    context: Arc<DispatchContext>,
    permits: Arc<Semaphore>,
}

impl Dispatcher {
    pub fn new(context: DispatchContext, worker_count: usize) -> Self {
        Self {
            context: Arc::new(context),
            permits: Arc::new(Semaphore::new(worker_count.max(1))),
        }
    }

    /// Processes every link and waits for all tasks to finish
    pub async fn run(&self, links: Vec<DetailLink>) -> DispatchReport {
        let mut tasks = JoinSet::new();

        for link in links {
            let context = Arc::clone(&self.context);
            let permits = Arc::clone(&self.permits);

            tasks.spawn(async move {
                let Ok(_permit) = permits.acquire_owned().await else {
                    return TaskOutcome::Cancelled;
                };
                process_link(&context, link).await
            });
        }

        let mut report = DispatchReport::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => report.record(outcome),
                Err(e) => {
                    tracing::error!("Detail task aborted: {}", e);
                    report.panicked += 1;
                }
            }
        }

        tracing::debug!(
            "Dispatch finished: {} posting(s), {} fetch failure(s), {} parse failure(s), {} duplicate(s), {} cancelled",
            report.postings.len(),
            report.fetch_failed,
            report.parse_failed,
            report.duplicates,
            report.cancelled
        );
        report
    }
}

async fn process_link(context: &DispatchContext, link: DetailLink) -> TaskOutcome {
    if context.shutdown.is_triggered() {
        tracing::debug!("Skipping {} after shutdown", link.url);
        return TaskOutcome::Cancelled;
    }

    let (body, ok) = context.fetcher.fetch(&link.url).await.into_parts();
    if !ok {
        return TaskOutcome::FetchFailed;
    }

    let Some(extracted) = context
        .site
        .extract_detail(&body, &link.url, &context.dedup)
    else {
        tracing::warn!("Could not parse detail page {}", link.url);
        return TaskOutcome::ParseFailed;
    };

    // The listing identifier was marked before dispatch; a numeric id found on
    // the page may still collide with another posting's.
    let job = extracted.record;
    if job.id != link.id && !context.dedup.is_new(&job.id) {
        tracing::debug!("Duplicate posting {} at {}", job.id, link.url);
        return TaskOutcome::Duplicate;
    }

    let mut skills = Vec::new();
    let mut unmatched_skills = 0;
    for label in extracted.skill_labels {
        match context.categorizer.categorize(&label) {
            Some(category) => skills.push(SkillRecord {
                job_id: job.id.clone(),
                source: job.source.clone(),
                skill_name: label,
                category: category.to_string(),
            }),
            None => {
                tracing::trace!("Uncategorized skill '{}' on {}", label, job.id);
                unmatched_skills += 1;
            }
        }
    }

    tracing::debug!("Extracted {} ({}) with {} skill(s)", job.id, job.title, skills.len());
    TaskOutcome::Posting(Posting {
        job,
        skills,
        unmatched_skills,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SourceConfig;
    use crate::crawler::fetcher::FetchPolicy;
    use crate::crawler::testing::{Scripted, ScriptedTransport};
    use crate::crawler::transport::{HttpResponse, Transport, TransportError};
    use crate::model::DetailIdentifier;
    use crate::site::TheProtocol;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use url::Url;

    fn detail_html(title: &str, offer_id: &str) -> String {
        format!(
            r#"<html><body>
                <h1 data-test="text-offerTitle">{}</h1>
                <span data-test="text-offerId">{}</span>
                <span data-test="chip-technology">Python</span>
                <span data-test="chip-technology">Basket weaving</span>
            </body></html>"#,
            title, offer_id
        )
    }

    fn link(token: &str) -> DetailLink {
        DetailLink {
            id: DetailIdentifier::Token(token.to_string()),
            url: format!("https://test.pl/praca/x,oferta,{}", token),
        }
    }

    fn site() -> Arc<dyn JobSite> {
        Arc::new(
            TheProtocol::new(&SourceConfig {
                site: "theprotocol".to_string(),
                name: "test.pl".to_string(),
                base_url: "https://test.pl".to_string(),
                search_url: "https://test.pl/search".to_string(),
                page_param: "page".to_string(),
            })
            .unwrap(),
        )
    }

    fn dispatcher(transport: Arc<dyn Transport>, workers: usize, shutdown: ShutdownSignal) -> Dispatcher {
        let context = DispatchContext {
            fetcher: Fetcher::new(
                transport,
                FetchPolicy {
                    max_retries: 1,
                    base_delay: Duration::ZERO,
                    timeout: Duration::from_secs(5),
                },
            ),
            site: site(),
            categorizer: Arc::new(SkillCategorizer::from_entries(&[])),
            dedup: Arc::new(UrlDeduplicator::new(
                Url::parse("https://test.pl").unwrap(),
                ",oferta,",
            )),
            shutdown,
        };
        Dispatcher::new(context, workers)
    }

    #[tokio::test]
    async fn test_successful_posting_with_skills() {
        let a = link("a");
        let transport = Arc::new(
            ScriptedTransport::new().route(&a.url, vec![Scripted::ok(detail_html("Analyst", "101"))]),
        );
        let report = dispatcher(transport, 2, ShutdownSignal::new()).run(vec![a]).await;

        assert_eq!(report.postings.len(), 1);
        let posting = &report.postings[0];
        assert_eq!(posting.job.id, DetailIdentifier::Numeric("101".to_string()));
        assert_eq!(posting.skills.len(), 1);
        assert_eq!(posting.skills[0].skill_name, "Python");
        assert_eq!(posting.skills[0].category, "Programming Languages");
        assert_eq!(posting.skills[0].job_id, posting.job.id);
        assert_eq!(posting.unmatched_skills, 1);
    }

    #[tokio::test]
    async fn test_failures_are_isolated() {
        let (ok, broken, missing, panics) = (link("ok"), link("broken"), link("missing"), link("panics"));
        let transport = Arc::new(
            ScriptedTransport::new()
                .route(&ok.url, vec![Scripted::ok(detail_html("Fine", "1"))])
                .route(&broken.url, vec![Scripted::status(500)])
                .route(&missing.url, vec![Scripted::ok("<html><body>gone</body></html>")])
                .route(&panics.url, vec![Scripted::Panic]),
        );

        let report = dispatcher(transport, 4, ShutdownSignal::new())
            .run(vec![ok, broken, missing, panics])
            .await;

        assert_eq!(report.postings.len(), 1);
        assert_eq!(report.postings[0].job.title, "Fine");
        assert_eq!(report.fetch_failed, 1);
        assert_eq!(report.parse_failed, 1);
        assert_eq!(report.panicked, 1);
    }

    #[tokio::test]
    async fn test_same_numeric_id_on_two_urls_is_duplicate() {
        let (a, b) = (link("a"), link("b"));
        let transport = Arc::new(
            ScriptedTransport::new()
                .route(&a.url, vec![Scripted::ok(detail_html("Same", "555"))])
                .route(&b.url, vec![Scripted::ok(detail_html("Same", "555"))]),
        );

        let report = dispatcher(transport, 2, ShutdownSignal::new()).run(vec![a, b]).await;
        assert_eq!(report.postings.len(), 1);
        assert_eq!(report.duplicates, 1);
    }

    #[tokio::test]
    async fn test_shutdown_skips_fetches() {
        let shutdown = ShutdownSignal::new();
        shutdown.trigger();
        let transport = Arc::new(ScriptedTransport::new());

        let report = dispatcher(transport.clone(), 2, shutdown)
            .run(vec![link("a"), link("b")])
            .await;

        assert_eq!(report.cancelled, 2);
        assert!(report.postings.is_empty());
        assert!(transport.calls().is_empty());
    }

    /// Records the highest number of concurrent requests
    #[derive(Default)]
    struct GaugeTransport {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl Transport for GaugeTransport {
        async fn get(&self, _url: &str) -> Result<HttpResponse, TransportError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            Ok(HttpResponse {
                status: 200,
                body: detail_html("Job", ""),
            })
        }
    }

    #[tokio::test]
    async fn test_concurrency_bounded_by_worker_count() {
        let transport = Arc::new(GaugeTransport::default());
        let links: Vec<_> = (0..8).map(|i| link(&format!("job{}", i))).collect();

        let report = dispatcher(transport.clone(), 3, ShutdownSignal::new())
            .run(links)
            .await;

        let peak = transport.peak.load(Ordering::SeqCst);
        assert!(peak <= 3, "peak concurrency was {}", peak);
        assert!(peak >= 1);
        assert_eq!(report.postings.len(), 8);
    }
}
