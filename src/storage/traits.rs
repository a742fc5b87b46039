//! Storage traits and error types
//!
//! This module defines the trait interface for record stores and
//! associated error types.

use crate::model::{JobRecord, SkillRecord};
use crate::storage::{RunRecord, RunStatus, RunSummary};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Record store with upsert-by-natural-key semantics
///
/// A posting is identified by `(job_id, source)` and a skill by
/// `(job_id, source, skill_name)`. Writing the same record twice leaves the
/// store unchanged.
pub trait JobStore {
    // ===== Run Management =====

    /// Creates a new crawl run in the `running` state
    ///
    /// # Arguments
    ///
    /// * `config_hash` - Hash of the configuration file
    ///
    /// # Returns
    ///
    /// The ID of the newly created run
    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;

    /// Records the final status and counters of a run
    fn complete_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        summary: &RunSummary,
    ) -> StorageResult<()>;

    // ===== Records =====

    /// Row id of a stored posting, if any
    fn find_job(&self, job_id: &str, source: &str) -> StorageResult<Option<i64>>;

    /// Inserts a posting unless one with the same key exists
    ///
    /// # Returns
    ///
    /// The row id, either newly created or existing. An existing row is not
    /// modified.
    fn upsert_job(&mut self, job: &JobRecord) -> StorageResult<i64>;

    /// Inserts a skill unless it is already stored for that posting
    ///
    /// # Arguments
    ///
    /// * `skill` - The categorized skill
    /// * `job_row_id` - Row id returned by `upsert_job` for the owning posting
    ///
    /// # Returns
    ///
    /// `true` if a row was inserted, `false` if it already existed
    fn upsert_skill(&mut self, skill: &SkillRecord, job_row_id: i64) -> StorageResult<bool>;

    // ===== Statistics =====

    /// Total number of stored postings
    fn count_jobs(&self) -> StorageResult<u64>;

    /// Postings per source, largest first
    fn count_jobs_by_source(&self) -> StorageResult<Vec<(String, u64)>>;

    /// Skill rows per category, largest first
    fn count_skills_by_category(&self) -> StorageResult<Vec<(String, u64)>>;

    /// Most frequent skill names, case-insensitively grouped
    fn top_skills(&self, limit: usize) -> StorageResult<Vec<(String, u64)>>;

    /// Average advertised salary bounds over postings that list one
    fn salary_averages(&self) -> StorageResult<Option<(f64, f64)>>;
}
