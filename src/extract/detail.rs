//! Detail page extraction
//!
//! A `DetailExtractor` is built from a set of ordered CSS selector lists, one
//! list per field. For every field the selectors are tried in order and the
//! first element with non-empty text wins. Only the title is required.

use crate::extract::fields::{
    normalize_text, or_not_available, parse_company, parse_employment_type, parse_salary,
    parse_work_type, parse_years_of_experience,
};
use crate::model::{DetailIdentifier, JobRecord};
use crate::state::ListingStatus;
use crate::url::UrlDeduplicator;
use crate::MinerError;
use chrono::Utc;
use scraper::{ElementRef, Html, Selector};

/// CSS selectors for each detail page field, most specific first
#[derive(Debug, Clone, Default)]
pub struct DetailSelectors {
    pub title: Vec<String>,
    pub company: Vec<String>,
    pub location: Vec<String>,
    pub operating_mode: Vec<String>,
    pub contract: Vec<String>,
    pub experience_level: Vec<String>,
    pub salary: Vec<String>,
    pub offer_id: Vec<String>,
    pub requirements: Vec<String>,
    pub skills: Vec<String>,
}

/// Selector lists compiled once at construction
struct CompiledSelectors {
    title: Vec<Selector>,
    company: Vec<Selector>,
    location: Vec<Selector>,
    operating_mode: Vec<Selector>,
    contract: Vec<Selector>,
    experience_level: Vec<Selector>,
    salary: Vec<Selector>,
    offer_id: Vec<Selector>,
    requirements: Vec<Selector>,
    skills: Vec<Selector>,
}

/// A record plus the raw skill labels found on its page
#[derive(Debug, Clone)]
pub struct ExtractedJob {
    pub record: JobRecord,
    pub skill_labels: Vec<String>,
}

/// Parses detail pages of one site into `JobRecord`s
pub struct DetailExtractor {
    source: String,
    selectors: CompiledSelectors,
}

impl DetailExtractor {
    /// Compiles the selectors
    ///
    /// # Returns
    ///
    /// * `Ok(DetailExtractor)` - Every selector parsed
    /// * `Err(MinerError::Selector)` - A selector is not valid CSS
    pub fn new(source: impl Into<String>, selectors: &DetailSelectors) -> Result<Self, MinerError> {
        Ok(Self {
            source: source.into(),
            selectors: CompiledSelectors {
                title: compile_all(&selectors.title)?,
                company: compile_all(&selectors.company)?,
                location: compile_all(&selectors.location)?,
                operating_mode: compile_all(&selectors.operating_mode)?,
                contract: compile_all(&selectors.contract)?,
                experience_level: compile_all(&selectors.experience_level)?,
                salary: compile_all(&selectors.salary)?,
                offer_id: compile_all(&selectors.offer_id)?,
                requirements: compile_all(&selectors.requirements)?,
                skills: compile_all(&selectors.skills)?,
            },
        })
    }

    /// Extracts one posting
    ///
    /// Missing fields degrade to `"N/A"` or `None`. Returns `None` only when
    /// no title can be found, which means the page is not a posting at all.
    ///
    /// # Arguments
    ///
    /// * `html` - Detail page body
    /// * `source_url` - The URL the body was fetched from
    /// * `dedup` - Used to derive the identifier when the page shows no numeric id
    pub fn extract(
        &self,
        html: &str,
        source_url: &str,
        dedup: &UrlDeduplicator,
    ) -> Option<ExtractedJob> {
        let document = Html::parse_document(html);
        let s = &self.selectors;

        let Some(title) = first_text(&document, &s.title, " ") else {
            tracing::warn!("No title found on {}, skipping", source_url);
            return None;
        };

        let company = first_text(&document, &s.company, " ").and_then(|t| parse_company(&t));
        let contract = first_text(&document, &s.contract, " ");
        let work_type = contract.as_deref().and_then(parse_work_type);
        let employment_type = contract.as_deref().and_then(parse_employment_type);
        let salary = first_text(&document, &s.salary, " ").and_then(|t| parse_salary(&t));

        let bullets = all_texts(&document, &s.requirements);
        let years_of_experience = parse_years_of_experience(bullets.iter().map(String::as_str));

        let offer_id = first_text(&document, &s.offer_id, "");
        let id = dedup.canonicalize(source_url, offer_id.as_deref());
        if !matches!(id, DetailIdentifier::Numeric(_)) {
            tracing::debug!("No numeric offer id on {}, using {} identifier", source_url, id.kind());
        }

        let mut skill_labels = all_texts(&document, &s.skills);
        let mut seen = std::collections::HashSet::new();
        skill_labels.retain(|label| seen.insert(label.to_lowercase()));

        let record = JobRecord {
            id,
            source: self.source.clone(),
            title,
            company: or_not_available(company),
            url: source_url.to_string(),
            salary,
            location: or_not_available(first_text(&document, &s.location, " ")),
            operating_mode: or_not_available(first_text(&document, &s.operating_mode, ", ")),
            work_type: or_not_available(work_type),
            experience_level: or_not_available(first_text(&document, &s.experience_level, ", ")),
            employment_type: or_not_available(employment_type),
            years_of_experience,
            scraped_at: Utc::now(),
            status: ListingStatus::Active,
        };

        Some(ExtractedJob {
            record,
            skill_labels,
        })
    }
}

fn compile_all(selectors: &[String]) -> Result<Vec<Selector>, MinerError> {
    selectors
        .iter()
        .map(|raw| {
            Selector::parse(raw).map_err(|e| MinerError::Selector {
                selector: raw.clone(),
                message: format!("{:?}", e),
            })
        })
        .collect()
}

/// Text of an element, text nodes joined by `separator` then normalized
fn element_text(element: ElementRef<'_>, separator: &str) -> String {
    let joined = element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(separator);
    normalize_text(&joined)
}

/// First non-empty text matched by the selector list, in selector order
fn first_text(document: &Html, selectors: &[Selector], separator: &str) -> Option<String> {
    selectors.iter().find_map(|selector| {
        document
            .select(selector)
            .map(|el| element_text(el, separator))
            .find(|text| !text.is_empty())
    })
}

/// All non-empty texts matched by the first selector that matches anything
fn all_texts(document: &Html, selectors: &[Selector]) -> Vec<String> {
    for selector in selectors {
        let texts: Vec<String> = document
            .select(selector)
            .map(|el| element_text(el, " "))
            .filter(|text| !text.is_empty())
            .collect();
        if !texts.is_empty() {
            return texts;
        }
    }
    Vec::new()
}
