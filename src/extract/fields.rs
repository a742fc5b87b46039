//! Field-level parsers shared by detail extractors
//!
//! All of these take already-extracted element text and never fail: a value
//! that cannot be read comes back as `None`.

use crate::model::SalaryRange;
use regex::Regex;
use std::sync::LazyLock;

/// Placeholder stored for text fields that could not be read
pub const NOT_AVAILABLE: &str = "N/A";

/// Years-of-experience values above this describe something else
/// (company tenure, product age) and are rejected.
pub const MAX_PLAUSIBLE_YEARS: u32 = 8;

/// Mis-decoded or decorative separators that should read as a comma
const SEPARATOR_ARTIFACTS: &[&str] = &["â€¢", "Â·", "•", "·"];

/// Phrases marking a sentence about the employer's own history
const TENURE_MARKERS: &[&str] = &[
    "na rynku",
    "firma istnieje",
    "istniejemy",
    "od lat",
    "on the market",
    "of the company",
    "in business",
    "company has",
    "years of history",
];

static DIGIT_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("hardcoded regex pattern is valid"));

static PARENTHESIZED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(([^)]+)\)").expect("hardcoded regex pattern is valid"));

static YEARS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d{1,3})(?:\s*[-–]\s*\d{1,3})?\s*\+?\s*(?:lat|lata|roku|rok|years?|yrs?)\b")
        .expect("hardcoded regex pattern is valid")
});

static SENTENCE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.;!](?:\s+|$)").expect("hardcoded regex pattern is valid"));

static REPEATED_COMMAS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*,(?:\s*,)*\s*").expect("hardcoded regex pattern is valid"));

/// Collapses whitespace and rewrites separator artifacts to commas
///
/// # Examples
///
/// ```
/// use job_miner::extract::normalize_text;
///
/// assert_eq!(normalize_text("  junior â€¢ mid  "), "junior, mid");
/// assert_eq!(normalize_text("Warszawa\n   Mokotów"), "Warszawa Mokotów");
/// ```
pub fn normalize_text(raw: &str) -> String {
    let mut text = raw.to_string();
    for artifact in SEPARATOR_ARTIFACTS {
        text = text.replace(artifact, ",");
    }

    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let commas = REPEATED_COMMAS.replace_all(&collapsed, ", ");

    commas
        .trim_matches(|c: char| c == ',' || c.is_whitespace())
        .to_string()
}

/// Returns the text or the `N/A` placeholder
pub fn or_not_available(value: Option<String>) -> String {
    value
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// Company name from a company link label such as "Company: Acme S.A."
pub fn parse_company(text: &str) -> Option<String> {
    let name = text.rsplit(':').next().unwrap_or(text).trim();
    (!name.is_empty()).then(|| name.to_string())
}

/// Work type: the parenthesized qualifier of a contract label, else the label
///
/// "umowa o pracę (full-time)" -> "full-time"; "B2B" -> "B2B".
pub fn parse_work_type(contract: &str) -> Option<String> {
    let contract = contract.trim();
    if let Some(inner) = PARENTHESIZED.captures(contract).and_then(|c| c.get(1)) {
        let inner = inner.as_str().trim();
        if !inner.is_empty() {
            return Some(inner.to_string());
        }
    }
    (!contract.is_empty()).then(|| contract.to_string())
}

/// Employment type: the contract label without its parenthesized qualifier
///
/// "umowa o pracę (full-time)" -> "umowa o pracę".
pub fn parse_employment_type(contract: &str) -> Option<String> {
    let stripped = PARENTHESIZED.replace_all(contract, "");
    let stripped = normalize_text(&stripped);
    (!stripped.is_empty()).then_some(stripped)
}

/// Removes whitespace runs that sit between two digits ("12 000" -> "12000")
fn strip_thousands_separators(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    while i < chars.len() {
        if !chars[i].is_whitespace() {
            out.push(chars[i]);
            i += 1;
            continue;
        }

        let run_end = chars[i..]
            .iter()
            .position(|c| !c.is_whitespace())
            .map_or(chars.len(), |offset| i + offset);
        let between_digits = out.chars().last().is_some_and(|c| c.is_ascii_digit())
            && chars.get(run_end).is_some_and(|c| c.is_ascii_digit());
        if !between_digits {
            out.extend(&chars[i..run_end]);
        }
        i = run_end;
    }

    out
}

/// Parses a salary label into a range
///
/// Two or more numbers give `(first, second)`, a single number gives
/// `(n, n)`, and no number gives `None`.
///
/// # Examples
///
/// ```
/// use job_miner::extract::parse_salary;
///
/// let range = parse_salary("12 000 – 18 000 zł netto (+ VAT) / mies.").unwrap();
/// assert_eq!((range.min, range.max), (12000, 18000));
/// assert!(parse_salary("do negocjacji").is_none());
/// ```
pub fn parse_salary(text: &str) -> Option<SalaryRange> {
    let compact = strip_thousands_separators(text);
    let numbers: Vec<i64> = DIGIT_RUN
        .find_iter(&compact)
        .filter_map(|m| m.as_str().parse().ok())
        .collect();

    match numbers.as_slice() {
        [] => None,
        [only] => Some(SalaryRange::new(*only, *only)),
        [first, second, ..] => Some(SalaryRange::new(*first, *second)),
    }
}

/// Returns true if a requirement sentence talks about the employer, not the candidate
fn is_tenure_sentence(sentence: &str) -> bool {
    let lower = sentence.to_lowercase();
    TENURE_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// Scans requirement bullets for a required number of years of experience
///
/// Each bullet is split into sentences and sentences about company tenure
/// are skipped. The first integer followed by a year unit that does not
/// exceed `MAX_PLAUSIBLE_YEARS` wins; implausible values are ignored and the
/// scan moves on.
pub fn parse_years_of_experience<'a, I>(bullets: I) -> Option<u32>
where
    I: IntoIterator<Item = &'a str>,
{
    let sentences = bullets
        .into_iter()
        .flat_map(|bullet| SENTENCE_BREAK.split(bullet))
        .filter(|sentence| !sentence.trim().is_empty());

    for sentence in sentences {
        if is_tenure_sentence(sentence) {
            tracing::trace!("Skipping tenure sentence: {}", sentence);
            continue;
        }

        for caps in YEARS.captures_iter(sentence) {
            let Some(years) = caps.get(1).and_then(|m| m.as_str().parse::<u32>().ok()) else {
                continue;
            };
            if years <= MAX_PLAUSIBLE_YEARS {
                return Some(years);
            }
            tracing::trace!("Rejecting implausible experience value {} in: {}", years, sentence);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_text_artifacts() {
        assert_eq!(normalize_text("junior • mid • senior"), "junior, mid, senior");
        assert_eq!(normalize_text("junior â€¢ mid"), "junior, mid");
        assert_eq!(normalize_text(" , junior ,, mid , "), "junior, mid");
        assert_eq!(normalize_text("   "), "");
    }

    #[test]
    fn test_or_not_available() {
        assert_eq!(or_not_available(None), "N/A");
        assert_eq!(or_not_available(Some(String::new())), "N/A");
        assert_eq!(or_not_available(Some("Warszawa".to_string())), "Warszawa");
    }

    #[test]
    fn test_parse_company() {
        assert_eq!(parse_company("Firma: Acme S.A.").as_deref(), Some("Acme S.A."));
        assert_eq!(parse_company("Acme").as_deref(), Some("Acme"));
        assert_eq!(parse_company("Company:  "), None);
    }

    #[test]
    fn test_parse_work_type() {
        assert_eq!(
            parse_work_type("umowa o pracę (full-time)").as_deref(),
            Some("full-time")
        );
        assert_eq!(parse_work_type("B2B").as_deref(), Some("B2B"));
        assert_eq!(parse_work_type(""), None);
    }

    #[test]
    fn test_parse_employment_type() {
        assert_eq!(
            parse_employment_type("umowa o pracę (full-time)").as_deref(),
            Some("umowa o pracę")
        );
        assert_eq!(parse_employment_type("(full-time)"), None);
    }

    #[test]
    fn test_salary_range() {
        assert_eq!(parse_salary("5000-8000 PLN"), Some(SalaryRange { min: 5000, max: 8000 }));
    }

    #[test]
    fn test_salary_single_value() {
        assert_eq!(parse_salary("5000 PLN"), Some(SalaryRange { min: 5000, max: 5000 }));
    }

    #[test]
    fn test_salary_no_digits() {
        assert_eq!(parse_salary("PLN / month"), None);
        assert_eq!(parse_salary(""), None);
    }

    #[test]
    fn test_salary_thousands_separators() {
        assert_eq!(
            parse_salary("12 000 - 18 000 zł"),
            Some(SalaryRange { min: 12000, max: 18000 })
        );
        assert_eq!(
            parse_salary("12\u{a0}000–18\u{202f}000 PLN"),
            Some(SalaryRange { min: 12000, max: 18000 })
        );
    }

    #[test]
    fn test_salary_reversed_bounds() {
        assert_eq!(parse_salary("8000 - 5000"), Some(SalaryRange { min: 5000, max: 8000 }));
    }

    #[test]
    fn test_years_skip_company_tenure() {
        assert_eq!(parse_years_of_experience(["Firma na rynku 10 lat"]), None);
        assert_eq!(
            parse_years_of_experience(["Firma na rynku 5 lat", "Min. 2 lata doświadczenia"]),
            Some(2)
        );
    }

    #[test]
    fn test_years_tenure_sentence_inside_bullet() {
        assert_eq!(
            parse_years_of_experience(["Firma na rynku 10 lat. Min. 3 lata doświadczenia w SQL"]),
            Some(3)
        );
        assert_eq!(
            parse_years_of_experience(["We are on the market for 6 years; 2 years of Python"]),
            Some(2)
        );
        assert_eq!(parse_years_of_experience(["Istniejemy od lat! Firma na rynku 7 lat."]), None);
    }

    #[test]
    fn test_years_min_experience() {
        assert_eq!(parse_years_of_experience(["Min. 3 lata doświadczenia"]), Some(3));
        assert_eq!(parse_years_of_experience(["At least 2 years of experience"]), Some(2));
        assert_eq!(parse_years_of_experience(["1 rok doświadczenia w SQL"]), Some(1));
    }

    #[test]
    fn test_years_above_ceiling_rejected() {
        assert_eq!(parse_years_of_experience(["12 lat doświadczenia"]), None);
    }

    #[test]
    fn test_years_first_match_wins() {
        let bullets = ["Znajomość SQL", "3+ years with Python", "5 lat doświadczenia"];
        assert_eq!(parse_years_of_experience(bullets), Some(3));
    }

    #[test]
    fn test_years_range_takes_lower_bound() {
        assert_eq!(parse_years_of_experience(["2-3 lata doświadczenia"]), Some(2));
    }

    #[test]
    fn test_years_no_unit() {
        assert_eq!(parse_years_of_experience(["Python 3", "Power BI"]), None);
    }
}
