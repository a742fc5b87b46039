//! Storage module for persisting crawl results
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Idempotent upserts of postings and their skills
//! - Run tracking with per-run counters
//! - Statistics queries for reporting

mod schema;
mod sqlite;
mod traits;

pub use schema::widths;
pub use sqlite::SqliteStorage;
pub use traits::{JobStore, StorageError, StorageResult};

use crate::crawler::CrawlOutcome;
use crate::MinerError;
use std::collections::HashMap;
use std::path::Path;

/// Initializes or opens a storage database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStorage)` - Successfully initialized storage
/// * `Err(MinerError)` - Failed to initialize storage
pub fn open_storage(path: &Path) -> Result<SqliteStorage, MinerError> {
    SqliteStorage::new(path)
}

/// Represents a crawl run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: RunStatus,
    pub summary: RunSummary,
}

/// Counters stored with a finished run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub pagination_strategy: Option<String>,
    pub pages_planned: u32,
    pub pages_crawled: u32,
    pub records: u32,
    pub fetch_failures: u32,
    pub parse_failures: u32,
}

impl RunSummary {
    pub fn from_outcome(outcome: &CrawlOutcome) -> Self {
        let counts = &outcome.counts;
        Self {
            pagination_strategy: Some(outcome.pagination.strategy.to_string()),
            pages_planned: counts.pages_planned,
            pages_crawled: counts.pages_crawled,
            records: counts.records as u32,
            fetch_failures: counts.fetch_failures as u32,
            parse_failures: counts.parse_failures as u32,
        }
    }
}

/// Status of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Interrupted,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Interrupted => "interrupted",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "interrupted" => Some(Self::Interrupted),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// Cuts a string to at most `max` characters
pub fn truncate(value: &str, max: usize) -> &str {
    match value.char_indices().nth(max) {
        Some((byte_index, _)) => &value[..byte_index],
        None => value,
    }
}

/// What happened to each record handed to the store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistReport {
    pub jobs_inserted: usize,
    pub jobs_existing: usize,
    pub job_failures: usize,
    pub skills_inserted: usize,
    pub skills_existing: usize,
    pub skill_failures: usize,
}

/// Writes a crawl's records, one at a time
///
/// A failing record is logged and counted; the remaining records are still
/// written. Skills of a posting that could not be stored count as failures.
pub fn persist_outcome<S: JobStore + ?Sized>(store: &mut S, outcome: &CrawlOutcome) -> PersistReport {
    let mut report = PersistReport::default();
    let mut row_ids: HashMap<(&str, &str), i64> = HashMap::new();

    for job in &outcome.jobs {
        let existed = matches!(store.find_job(job.id.as_str(), &job.source), Ok(Some(_)));
        match store.upsert_job(job) {
            Ok(row_id) => {
                if existed {
                    report.jobs_existing += 1;
                } else {
                    report.jobs_inserted += 1;
                }
                row_ids.insert((job.id.as_str(), job.source.as_str()), row_id);
            }
            Err(e) => {
                tracing::error!("Failed to store posting {} ({}): {}", job.id, job.title, e);
                report.job_failures += 1;
            }
        }
    }

    for skill in &outcome.skills {
        let Some(row_id) = row_ids.get(&(skill.job_id.as_str(), skill.source.as_str())) else {
            report.skill_failures += 1;
            continue;
        };

        match store.upsert_skill(skill, *row_id) {
            Ok(true) => report.skills_inserted += 1,
            Ok(false) => report.skills_existing += 1,
            Err(e) => {
                tracing::error!(
                    "Failed to store skill '{}' for {}: {}",
                    skill.skill_name,
                    skill.job_id,
                    e
                );
                report.skill_failures += 1;
            }
        }
    }

    tracing::info!(
        "Persisted {} new and {} known posting(s), {} new skill(s); {} failure(s)",
        report.jobs_inserted,
        report.jobs_existing,
        report.skills_inserted,
        report.job_failures + report.skill_failures
    );
    report
}
