//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the JobStore trait.

use crate::model::{JobRecord, SkillRecord};
use crate::storage::schema::{initialize_schema, widths};
use crate::storage::traits::{JobStore, StorageError, StorageResult};
use crate::storage::{truncate, RunRecord, RunStatus, RunSummary};
use crate::MinerError;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

const RUN_COLUMNS: &str = "id, started_at, finished_at, config_hash, status, pagination_strategy,
     pages_planned, pages_crawled, records, fetch_failures, parse_failures";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(MinerError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, MinerError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> Result<Self, MinerError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
        Ok(RunRecord {
            id: row.get(0)?,
            started_at: row.get(1)?,
            finished_at: row.get(2)?,
            config_hash: row.get(3)?,
            status: RunStatus::from_db_string(&row.get::<_, String>(4)?)
                .unwrap_or(RunStatus::Running),
            summary: RunSummary {
                pagination_strategy: row.get(5)?,
                pages_planned: row.get(6)?,
                pages_crawled: row.get(7)?,
                records: row.get(8)?,
                fetch_failures: row.get(9)?,
                parse_failures: row.get(10)?,
            },
        })
    }

    fn grouped_counts(
        &self,
        sql: &str,
        args: impl rusqlite::Params,
    ) -> StorageResult<Vec<(String, u64)>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt
            .query_map(args, |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

impl JobStore for SqliteStorage {
    // ===== Run Management =====

    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (started_at, config_hash, status) VALUES (?1, ?2, ?3)",
            params![now, config_hash, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        let sql = format!("SELECT {} FROM runs WHERE id = ?1", RUN_COLUMNS);
        self.conn
            .query_row(&sql, params![run_id], Self::run_from_row)
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let sql = format!("SELECT {} FROM runs ORDER BY id DESC LIMIT 1", RUN_COLUMNS);
        let run = self.conn.query_row(&sql, [], Self::run_from_row).optional()?;
        Ok(run)
    }

    fn complete_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        summary: &RunSummary,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2, pagination_strategy = ?3,
             pages_planned = ?4, pages_crawled = ?5, records = ?6,
             fetch_failures = ?7, parse_failures = ?8
             WHERE id = ?9",
            params![
                status.to_db_string(),
                now,
                summary.pagination_strategy,
                summary.pages_planned,
                summary.pages_crawled,
                summary.records,
                summary.fetch_failures,
                summary.parse_failures,
                run_id
            ],
        )?;

        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    // ===== Records =====

    fn find_job(&self, job_id: &str, source: &str) -> StorageResult<Option<i64>> {
        let id = self
            .conn
            .query_row(
                "SELECT id FROM job_listings WHERE job_id = ?1 AND source = ?2",
                params![
                    truncate(job_id, widths::JOB_ID),
                    truncate(source, widths::SOURCE)
                ],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    fn upsert_job(&mut self, job: &JobRecord) -> StorageResult<i64> {
        if let Some(id) = self.find_job(job.id.as_str(), &job.source)? {
            tracing::debug!("Posting {} already stored as row {}", job.id, id);
            return Ok(id);
        }

        self.conn.execute(
            "INSERT INTO job_listings (
                job_id, source, title, company, link, salary_min, salary_max, location,
                operating_mode, work_type, experience_level, employment_type,
                years_of_experience, scraped_at, listing_status
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
            params![
                truncate(job.id.as_str(), widths::JOB_ID),
                truncate(&job.source, widths::SOURCE),
                truncate(&job.title, widths::TITLE),
                truncate(&job.company, widths::COMPANY),
                truncate(&job.url, widths::LINK),
                job.salary_min(),
                job.salary_max(),
                truncate(&job.location, widths::LOCATION),
                truncate(&job.operating_mode, widths::OPERATING_MODE),
                truncate(&job.work_type, widths::WORK_TYPE),
                job.experience_level,
                truncate(&job.employment_type, widths::EMPLOYMENT_TYPE),
                job.years_of_experience,
                job.scraped_at.to_rfc3339(),
                truncate(job.status.to_db_string(), widths::STATUS),
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        tracing::debug!("Stored posting {} as row {}", job.id, id);
        Ok(id)
    }

    fn upsert_skill(&mut self, skill: &SkillRecord, job_row_id: i64) -> StorageResult<bool> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO skills (job_id, job_row_id, source, skill_name, category)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                truncate(skill.job_id.as_str(), widths::JOB_ID),
                job_row_id,
                truncate(&skill.source, widths::SOURCE),
                truncate(&skill.skill_name, widths::SKILL_NAME),
                truncate(&skill.category, widths::CATEGORY),
            ],
        )?;
        Ok(inserted > 0)
    }

    // ===== Statistics =====

    fn count_jobs(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM job_listings", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_jobs_by_source(&self) -> StorageResult<Vec<(String, u64)>> {
        self.grouped_counts(
            "SELECT source, COUNT(*) AS n FROM job_listings GROUP BY source ORDER BY n DESC, source",
            [],
        )
    }

    fn count_skills_by_category(&self) -> StorageResult<Vec<(String, u64)>> {
        self.grouped_counts(
            "SELECT category, COUNT(*) AS n FROM skills
             GROUP BY category ORDER BY n DESC, category",
            [],
        )
    }

    fn top_skills(&self, limit: usize) -> StorageResult<Vec<(String, u64)>> {
        self.grouped_counts(
            "SELECT MIN(skill_name), COUNT(*) AS n FROM skills
             GROUP BY LOWER(skill_name) ORDER BY n DESC, 1 LIMIT ?1",
            params![limit as i64],
        )
    }

    fn salary_averages(&self) -> StorageResult<Option<(f64, f64)>> {
        let averages: (Option<f64>, Option<f64>) = self.conn.query_row(
            "SELECT AVG(salary_min), AVG(salary_max) FROM job_listings
             WHERE salary_min IS NOT NULL AND salary_max IS NOT NULL",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        Ok(match averages {
            (Some(min), Some(max)) => Some((min, max)),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DetailIdentifier, SalaryRange};
    use crate::state::ListingStatus;

    fn job(id: &str, title: &str) -> JobRecord {
        JobRecord {
            id: DetailIdentifier::Numeric(id.to_string()),
            source: "theprotocol.it".to_string(),
            title: title.to_string(),
            company: "Acme".to_string(),
            url: format!("https://theprotocol.it/praca/x,oferta,{}", id),
            salary: Some(SalaryRange::new(10000, 15000)),
            location: "Warszawa".to_string(),
            operating_mode: "hybrid".to_string(),
            work_type: "full-time".to_string(),
            experience_level: "junior".to_string(),
            employment_type: "B2B".to_string(),
            years_of_experience: Some(2),
            scraped_at: Utc::now(),
            status: ListingStatus::Active,
        }
    }

    fn skill(job_id: &str, name: &str, category: &str) -> SkillRecord {
        SkillRecord {
            job_id: DetailIdentifier::Numeric(job_id.to_string()),
            source: "theprotocol.it".to_string(),
            skill_name: name.to_string(),
            category: category.to_string(),
        }
    }

    #[test]
    fn test_create_in_memory() {
        let storage = SqliteStorage::new_in_memory();
        assert!(storage.is_ok());
    }

    #[test]
    fn test_create_and_complete_run() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let run_id = storage.create_run("test_hash").unwrap();
        assert!(run_id > 0);

        let summary = RunSummary {
            pagination_strategy: Some("probe".to_string()),
            pages_planned: 3,
            pages_crawled: 3,
            records: 120,
            fetch_failures: 2,
            parse_failures: 1,
        };
        storage
            .complete_run(run_id, RunStatus::Completed, &summary)
            .unwrap();

        let run = storage.get_latest_run().unwrap().unwrap();
        assert_eq!(run.id, run_id);
        assert_eq!(run.status, RunStatus::Completed);
        assert_eq!(run.config_hash, "test_hash");
        assert!(run.finished_at.is_some());
        assert_eq!(run.summary, summary);
    }

    #[test]
    fn test_unknown_run() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        assert!(matches!(storage.get_run(42), Err(StorageError::RunNotFound(42))));
        assert!(matches!(
            storage.complete_run(42, RunStatus::Failed, &RunSummary::default()),
            Err(StorageError::RunNotFound(42))
        ));
        assert!(storage.get_latest_run().unwrap().is_none());
    }

    #[test]
    fn test_upsert_job_is_idempotent() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();

        let first = storage.upsert_job(&job("100", "Original")).unwrap();
        let second = storage.upsert_job(&job("100", "Changed title")).unwrap();

        assert_eq!(first, second);
        assert_eq!(storage.count_jobs().unwrap(), 1);

        let title: String = storage
            .conn
            .query_row("SELECT title FROM job_listings WHERE id = ?1", [first], |row| row.get(0))
            .unwrap();
        assert_eq!(title, "Original");
    }

    #[test]
    fn test_same_id_different_source_is_distinct() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let a = job("100", "A");
        let mut b = job("100", "B");
        b.source = "other.pl".to_string();

        let id_a = storage.upsert_job(&a).unwrap();
        let id_b = storage.upsert_job(&b).unwrap();
        assert_ne!(id_a, id_b);
        assert_eq!(storage.count_jobs_by_source().unwrap().len(), 2);
    }

    #[test]
    fn test_upsert_job_truncates_long_fields() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let mut long = job("7", &"T".repeat(400));
        long.work_type = "w".repeat(80);

        let id = storage.upsert_job(&long).unwrap();
        let (title_len, work_type_len): (i64, i64) = storage
            .conn
            .query_row(
                "SELECT LENGTH(title), LENGTH(work_type) FROM job_listings WHERE id = ?1",
                [id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(title_len, 255);
        assert_eq!(work_type_len, 50);
    }

    #[test]
    fn test_upsert_skill_is_idempotent() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let row = storage.upsert_job(&job("1", "Job")).unwrap();

        assert!(storage.upsert_skill(&skill("1", "SQL", "Programming Languages"), row).unwrap());
        assert!(!storage.upsert_skill(&skill("1", "SQL", "Programming Languages"), row).unwrap());
        assert!(storage.upsert_skill(&skill("1", "Python", "Programming Languages"), row).unwrap());

        assert_eq!(
            storage.count_skills_by_category().unwrap(),
            vec![("Programming Languages".to_string(), 2)]
        );
    }

    #[test]
    fn test_statistics() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let r1 = storage.upsert_job(&job("1", "One")).unwrap();
        let r2 = storage.upsert_job(&job("2", "Two")).unwrap();
        let mut no_salary = job("3", "Three");
        no_salary.salary = None;
        storage.upsert_job(&no_salary).unwrap();

        storage.upsert_skill(&skill("1", "SQL", "Programming Languages"), r1).unwrap();
        storage.upsert_skill(&skill("2", "sql", "Programming Languages"), r2).unwrap();
        storage.upsert_skill(&skill("2", "Power BI", "BI & Visualization"), r2).unwrap();

        assert_eq!(storage.count_jobs().unwrap(), 3);
        assert_eq!(
            storage.count_jobs_by_source().unwrap(),
            vec![("theprotocol.it".to_string(), 3)]
        );

        assert_eq!(
            storage.count_skills_by_category().unwrap(),
            vec![
                ("Programming Languages".to_string(), 2),
                ("BI & Visualization".to_string(), 1),
            ]
        );

        let top = storage.top_skills(1).unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].1, 2);

        let (min, max) = storage.salary_averages().unwrap().unwrap();
        assert_eq!(min, 10000.0);
        assert_eq!(max, 15000.0);
    }

    #[test]
    fn test_salary_averages_empty() {
        let storage = SqliteStorage::new_in_memory().unwrap();
        assert_eq!(storage.salary_averages().unwrap(), None);
    }
}
