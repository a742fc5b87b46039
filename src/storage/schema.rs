//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the Job-Miner database.

/// Column widths enforced on insert
pub mod widths {
    pub const JOB_ID: usize = 100;
    pub const SOURCE: usize = 50;
    pub const TITLE: usize = 255;
    pub const COMPANY: usize = 255;
    pub const LINK: usize = 500;
    pub const LOCATION: usize = 255;
    pub const OPERATING_MODE: usize = 255;
    pub const WORK_TYPE: usize = 50;
    pub const EMPLOYMENT_TYPE: usize = 50;
    pub const STATUS: usize = 20;
    pub const SKILL_NAME: usize = 150;
    pub const CATEGORY: usize = 50;
}

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Track crawl runs
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    status TEXT NOT NULL,
    pagination_strategy TEXT,
    pages_planned INTEGER NOT NULL DEFAULT 0,
    pages_crawled INTEGER NOT NULL DEFAULT 0,
    records INTEGER NOT NULL DEFAULT 0,
    fetch_failures INTEGER NOT NULL DEFAULT 0,
    parse_failures INTEGER NOT NULL DEFAULT 0
);

-- One row per posting, keyed by its identifier within a source
CREATE TABLE IF NOT EXISTS job_listings (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    job_id TEXT NOT NULL,
    source TEXT NOT NULL,
    title TEXT NOT NULL,
    company TEXT NOT NULL,
    link TEXT NOT NULL,
    salary_min INTEGER,
    salary_max INTEGER,
    location TEXT,
    operating_mode TEXT,
    work_type TEXT,
    experience_level TEXT,
    employment_type TEXT,
    years_of_experience INTEGER,
    scraped_at TEXT NOT NULL,
    listing_status TEXT NOT NULL,
    UNIQUE(job_id, source)
);

CREATE INDEX IF NOT EXISTS idx_job_listings_source ON job_listings(source);

-- Categorized skills per posting
CREATE TABLE IF NOT EXISTS skills (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    job_id TEXT NOT NULL,
    job_row_id INTEGER NOT NULL REFERENCES job_listings(id),
    source TEXT NOT NULL,
    skill_name TEXT NOT NULL,
    category TEXT NOT NULL,
    UNIQUE(job_id, source, skill_name)
);

CREATE INDEX IF NOT EXISTS idx_skills_category ON skills(category);
CREATE INDEX IF NOT EXISTS idx_skills_job_row ON skills(job_row_id);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
