//! Records produced by a crawl
//!
//! - `DetailIdentifier`: the natural key of a posting
//! - `ListingPage`: one page of search results and the detail links on it
//! - `JobRecord` / `SkillRecord`: what is handed to the record store

use crate::state::ListingStatus;
use chrono::{DateTime, Utc};
use std::fmt;

/// Canonical key of a job posting
///
/// Variants are listed from most to least trustworthy. Two postings with the
/// same identifier and the same source are the same entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DetailIdentifier {
    /// Purely numeric offer id printed on the detail page
    Numeric(String),

    /// Token taken from the URL path after the site's id separator
    Token(String),

    /// Canonical absolute URL, when nothing better is available
    Url(String),
}

impl DetailIdentifier {
    /// The key string stored and compared
    pub fn as_str(&self) -> &str {
        match self {
            Self::Numeric(s) | Self::Token(s) | Self::Url(s) => s,
        }
    }

    /// Short name of the variant, used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Numeric(_) => "numeric",
            Self::Token(_) => "token",
            Self::Url(_) => "url",
        }
    }
}

impl fmt::Display for DetailIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A detail page link discovered on a listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailLink {
    pub id: DetailIdentifier,
    /// Absolute URL to fetch
    pub url: String,
}

/// One fetched page of search results
#[derive(Debug, Clone)]
pub struct ListingPage {
    /// 1-based page index
    pub index: u32,
    pub url: String,
    /// Detail links in page order, each identifier at most once
    pub links: Vec<DetailLink>,
}

impl ListingPage {
    /// Builds a page, dropping repeated identifiers while keeping first-seen order
    pub fn new(index: u32, url: impl Into<String>, links: Vec<DetailLink>) -> Self {
        let mut seen = std::collections::HashSet::new();
        let links = links
            .into_iter()
            .filter(|link| seen.insert(link.id.clone()))
            .collect();

        Self {
            index,
            url: url.into(),
            links,
        }
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn identifiers(&self) -> impl Iterator<Item = &DetailIdentifier> {
        self.links.iter().map(|link| &link.id)
    }
}

/// Advertised salary bounds, `min <= max`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SalaryRange {
    pub min: i64,
    pub max: i64,
}

impl SalaryRange {
    /// Creates a range, swapping the bounds if they arrive reversed
    pub fn new(a: i64, b: i64) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }
}

/// A structured job posting
#[derive(Debug, Clone, PartialEq)]
pub struct JobRecord {
    pub id: DetailIdentifier,
    /// Source tag, e.g. "theprotocol.it"
    pub source: String,
    pub title: String,
    pub company: String,
    pub url: String,
    pub salary: Option<SalaryRange>,
    pub location: String,
    pub operating_mode: String,
    pub work_type: String,
    pub experience_level: String,
    pub employment_type: String,
    pub years_of_experience: Option<u32>,
    pub scraped_at: DateTime<Utc>,
    pub status: ListingStatus,
}

impl JobRecord {
    pub fn salary_min(&self) -> Option<i64> {
        self.salary.map(|s| s.min)
    }

    pub fn salary_max(&self) -> Option<i64> {
        self.salary.map(|s| s.max)
    }
}

/// A skill listed on a posting, resolved to a taxonomy category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillRecord {
    pub job_id: DetailIdentifier,
    pub source: String,
    pub skill_name: String,
    pub category: String,
}
