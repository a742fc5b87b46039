//! Structured-field extraction from job detail pages
//!
//! - `detail`: selector-driven `DetailExtractor`
//! - `fields`: tolerant parsers for salary, years of experience, contract labels

mod detail;
mod fields;

pub use detail::{DetailExtractor, DetailSelectors, ExtractedJob};
pub use fields::{
    normalize_text, or_not_available, parse_company, parse_employment_type, parse_salary,
    parse_work_type, parse_years_of_experience, MAX_PLAUSIBLE_YEARS, NOT_AVAILABLE,
};
