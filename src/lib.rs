//! Job-Miner: a polite job board crawler
//!
//! This crate crawls a paginated job listing site, extracts every job posting
//! into a structured record, classifies the listed skills against a fixed
//! taxonomy, and hands the records to an idempotent record store.

pub mod config;
pub mod crawler;
pub mod extract;
pub mod model;
pub mod output;
pub mod site;
pub mod skills;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Job-Miner operations
#[derive(Debug, Error)]
pub enum MinerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    StorageError(#[from] storage::StorageError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    #[error("Unknown site '{0}'")]
    UnknownSite(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,

    #[error("Malformed URL: {0}")]
    Malformed(String),
}

/// Result type alias for Job-Miner operations
pub type Result<T> = std::result::Result<T, MinerError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawlOutcome, Pipeline};
pub use model::{DetailIdentifier, JobRecord, SkillRecord};
pub use state::ListingStatus;
pub use url::{normalize_url, UrlDeduplicator};
