//! Statistics generation from the record store
//!
//! This module provides functionality for extracting and displaying
//! database statistics from the storage layer.

use crate::storage::{JobStore, RunRecord};
use crate::MinerError;

/// Number of skills listed in the statistics overview
pub const TOP_SKILLS: usize = 15;

/// Database statistics summary
#[derive(Debug, Clone, Default)]
pub struct StoreStatistics {
    /// Total number of stored postings
    pub total_jobs: u64,

    /// Postings per source, largest first
    pub jobs_by_source: Vec<(String, u64)>,

    /// Skill rows per category, largest first
    pub skills_by_category: Vec<(String, u64)>,

    /// Most frequent skills
    pub top_skills: Vec<(String, u64)>,

    /// Average (min, max) salary over postings that advertise one
    pub salary_averages: Option<(f64, f64)>,

    /// The most recent crawl run, if any
    pub latest_run: Option<RunRecord>,
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `store` - The storage backend to query
///
/// # Returns
///
/// * `Ok(StoreStatistics)` - Successfully loaded statistics
/// * `Err(MinerError)` - Failed to query statistics
pub fn load_statistics<S: JobStore + ?Sized>(store: &S) -> Result<StoreStatistics, MinerError> {
    Ok(StoreStatistics {
        total_jobs: store.count_jobs()?,
        jobs_by_source: store.count_jobs_by_source()?,
        skills_by_category: store.count_skills_by_category()?,
        top_skills: store.top_skills(TOP_SKILLS)?,
        salary_averages: store.salary_averages()?,
        latest_run: store.get_latest_run()?,
    })
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &StoreStatistics) {
    println!("{}", format_statistics(stats));
}

/// Renders statistics as plain text
pub fn format_statistics(stats: &StoreStatistics) -> String {
    let mut out = String::new();
    out.push_str("=== Job-Miner Statistics ===\n\n");

    out.push_str("Overview:\n");
    out.push_str(&format!("  Stored postings: {}\n", stats.total_jobs));
    for (source, count) in &stats.jobs_by_source {
        out.push_str(&format!("  - {}: {}\n", source, count));
    }
    if let Some((min, max)) = stats.salary_averages {
        out.push_str(&format!("  Average salary range: {:.0} - {:.0}\n", min, max));
    }
    out.push('\n');

    if !stats.skills_by_category.is_empty() {
        let total: u64 = stats.skills_by_category.iter().map(|(_, n)| n).sum();
        out.push_str("Skills by Category:\n");
        for (category, count) in &stats.skills_by_category {
            let percentage = (*count as f64 / total as f64) * 100.0;
            out.push_str(&format!("  {}: {} ({:.1}%)\n", category, count, percentage));
        }
        out.push('\n');
    }

    if !stats.top_skills.is_empty() {
        out.push_str(&format!("Top {} Skills:\n", stats.top_skills.len()));
        for (rank, (skill, count)) in stats.top_skills.iter().enumerate() {
            out.push_str(&format!("  {:>2}. {} ({})\n", rank + 1, skill, count));
        }
        out.push('\n');
    }

    match &stats.latest_run {
        Some(run) => {
            out.push_str(&format!(
                "Latest Run: #{} {} (started {})\n",
                run.id,
                run.status.to_db_string(),
                run.started_at
            ));
            if let Some(strategy) = &run.summary.pagination_strategy {
                out.push_str(&format!(
                    "  {} / {} pages crawled ({}), {} records, {} fetch and {} parse failures\n",
                    run.summary.pages_crawled,
                    run.summary.pages_planned,
                    strategy,
                    run.summary.records,
                    run.summary.fetch_failures,
                    run.summary.parse_failures
                ));
            }
        }
        None => out.push_str("No crawl runs recorded\n"),
    }

    out
}
