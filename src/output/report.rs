//! End-of-run crawl report
//!
//! Summarizes one crawl's counters, its pagination decision and what the
//! record store did with the results.

use crate::crawler::CrawlOutcome;
use crate::storage::PersistReport;
use std::collections::BTreeMap;

/// Prints the crawl report to stdout
pub fn print_crawl_report(outcome: &CrawlOutcome, persisted: Option<&PersistReport>) {
    println!("{}", format_crawl_report(outcome, persisted));
}

/// Renders the crawl report as plain text
///
/// `persisted` is `None` when the results were not written to the store.
pub fn format_crawl_report(outcome: &CrawlOutcome, persisted: Option<&PersistReport>) -> String {
    let counts = &outcome.counts;
    let pagination = &outcome.pagination;
    let mut out = String::new();

    out.push_str("=== Crawl Report ===\n\n");
    if outcome.interrupted {
        out.push_str("Crawl was interrupted before all pages were processed\n\n");
    }

    out.push_str("Pagination:\n");
    out.push_str(&format!(
        "  {} page(s) planned via {}\n",
        pagination.pages, pagination.strategy
    ));
    if pagination.warning {
        out.push_str("  Warning: page count could not be detected, only page 1 was planned\n");
    }
    out.push_str(&format!(
        "  {} crawled, {} failed\n\n",
        counts.pages_crawled, counts.pages_failed
    ));

    out.push_str("Postings:\n");
    out.push_str(&format!(
        "  Links discovered: {} ({} duplicate)\n",
        counts.links_discovered, counts.duplicate_links
    ));
    out.push_str(&format!("  Detail pages fetched: {}\n", counts.tasks_dispatched));
    out.push_str(&format!("  Records extracted: {}\n", counts.records));
    out.push_str(&format!(
        "  Failures: {} fetch, {} parse, {} panicked\n",
        counts.fetch_failures, counts.parse_failures, counts.task_panics
    ));
    if counts.duplicate_records > 0 {
        out.push_str(&format!("  Duplicate records dropped: {}\n", counts.duplicate_records));
    }
    if counts.cancelled_tasks > 0 {
        out.push_str(&format!("  Cancelled before fetch: {}\n", counts.cancelled_tasks));
    }
    out.push('\n');

    out.push_str(&format!(
        "Skills: {} categorized, {} outside the taxonomy\n",
        counts.skills_matched, counts.skills_unmatched
    ));
    let mut per_category: BTreeMap<&str, usize> = BTreeMap::new();
    for skill in &outcome.skills {
        *per_category.entry(skill.category.as_str()).or_default() += 1;
    }
    for (category, count) in &per_category {
        out.push_str(&format!("  {}: {}\n", category, count));
    }
    out.push('\n');

    match persisted {
        Some(report) => {
            out.push_str("Storage:\n");
            out.push_str(&format!(
                "  Postings: {} new, {} already stored, {} failed\n",
                report.jobs_inserted, report.jobs_existing, report.job_failures
            ));
            out.push_str(&format!(
                "  Skills: {} new, {} already stored, {} failed\n",
                report.skills_inserted, report.skills_existing, report.skill_failures
            ));
        }
        None => out.push_str("Storage: skipped\n"),
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::{CrawlCounts, PaginationSummary, Strategy};
    use crate::model::{DetailIdentifier, SkillRecord};

    fn outcome() -> CrawlOutcome {
        let skill = |name: &str, category: &str| SkillRecord {
            job_id: DetailIdentifier::Numeric("1".to_string()),
            source: "theprotocol.it".to_string(),
            skill_name: name.to_string(),
            category: category.to_string(),
        };

        CrawlOutcome {
            jobs: Vec::new(),
            skills: vec![
                skill("SQL", "Programming Languages"),
                skill("Python", "Programming Languages"),
                skill("Azure", "Cloud"),
            ],
            counts: CrawlCounts {
                pages_planned: 3,
                pages_crawled: 3,
                links_discovered: 60,
                tasks_dispatched: 60,
                records: 58,
                fetch_failures: 1,
                parse_failures: 1,
                skills_matched: 3,
                skills_unmatched: 4,
                ..CrawlCounts::default()
            },
            pagination: PaginationSummary {
                pages: 3,
                strategy: Strategy::StructuredCount,
                warning: false,
            },
            interrupted: false,
        }
    }

    #[test]
    fn test_report_counts() {
        let text = format_crawl_report(&outcome(), None);
        assert!(text.contains("3 page(s) planned via structured-count"));
        assert!(text.contains("Records extracted: 58"));
        assert!(text.contains("Failures: 1 fetch, 1 parse, 0 panicked"));
        assert!(text.contains("Programming Languages: 2"));
        assert!(text.contains("Cloud: 1"));
        assert!(text.contains("Storage: skipped"));
        assert!(!text.contains("interrupted"));
        assert!(!text.contains("Warning"));
    }

    #[test]
    fn test_report_fallback_and_storage() {
        let mut outcome = outcome();
        outcome.interrupted = true;
        outcome.pagination = PaginationSummary {
            pages: 1,
            strategy: Strategy::Fallback,
            warning: true,
        };
        let persisted = PersistReport {
            jobs_inserted: 50,
            jobs_existing: 8,
            skills_inserted: 3,
            ..PersistReport::default()
        };

        let text = format_crawl_report(&outcome, Some(&persisted));
        assert!(text.contains("interrupted"));
        assert!(text.contains("Warning: page count could not be detected"));
        assert!(text.contains("Postings: 50 new, 8 already stored, 0 failed"));
    }
}
