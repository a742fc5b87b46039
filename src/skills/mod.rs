//! Skill categorization
//!
//! Maps raw skill chip labels to taxonomy categories. A label that matches
//! nothing is dropped by the caller.

mod taxonomy;

pub use taxonomy::{default_entries, DEFAULT_TAXONOMY};

use crate::config::TaxonomyEntry;
use std::collections::HashSet;

/// Lowercases, trims and collapses internal whitespace
fn normalize_label(label: &str) -> String {
    label
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Ordered `(category, members)` lookup, built once per run
#[derive(Debug, Clone)]
pub struct SkillCategorizer {
    categories: Vec<(String, HashSet<String>)>,
}

impl SkillCategorizer {
    /// Builds a categorizer from configuration entries, keeping their order
    ///
    /// An empty slice selects the built-in taxonomy.
    pub fn from_entries(entries: &[TaxonomyEntry]) -> Self {
        if entries.is_empty() {
            return Self::from_entries(&default_entries());
        }

        let categories = entries
            .iter()
            .map(|entry| {
                let members = entry
                    .skills
                    .iter()
                    .map(|s| normalize_label(s))
                    .filter(|s| !s.is_empty())
                    .collect();
                (entry.category.clone(), members)
            })
            .collect();

        Self { categories }
    }

    /// Category of a skill label, first declared match wins
    ///
    /// # Examples
    ///
    /// ```
    /// use job_miner::skills::SkillCategorizer;
    ///
    /// let categorizer = SkillCategorizer::from_entries(&[]);
    /// assert_eq!(categorizer.categorize("  Power   BI "), Some("BI & Visualization"));
    /// assert_eq!(categorizer.categorize("Underwater basket weaving"), None);
    /// ```
    pub fn categorize(&self, label: &str) -> Option<&str> {
        let needle = normalize_label(label);
        if needle.is_empty() {
            return None;
        }

        self.categories
            .iter()
            .find(|(_, members)| members.contains(&needle))
            .map(|(category, _)| category.as_str())
    }

    /// Category names in declaration order
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|(name, _)| name.as_str())
    }

    /// Number of skills in a category, 0 if unknown
    pub fn category_size(&self, category: &str) -> usize {
        self.categories
            .iter()
            .find(|(name, _)| name == category)
            .map_or(0, |(_, members)| members.len())
    }
}
