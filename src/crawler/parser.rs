//! HTML parser for listing pages
//!
//! This module handles parsing search result pages to extract:
//! - Detail page hrefs (anchors whose href carries the site's id separator)
//! - The structured total result count, when the page embeds one
//! - The highest page number offered by the pagination controls

use regex::Regex;
use scraper::{Html, Selector};
use std::sync::LazyLock;
use url::Url;

/// JSON keys that carry the total number of results in embedded state
const COUNT_KEYS: &[&str] = &["totalCount", "offersCount", "totalOffers", "numberOfItems"];

/// Query parameters that carry a page number in pagination links
const PAGE_QUERY_KEYS: &[&str] = &["page", "pageNumber"];

/// Containers of pagination controls, most specific first
const PAGINATION_SELECTORS: &[&str] = &[
    r#"[data-test*="pagination"] a"#,
    r#"[data-test*="pagination"] button"#,
    r#"nav[aria-label*="agination"] a"#,
    ".pagination a",
    ".pagination button",
];

/// Relative controls that only point at a neighbouring page
const RELATIVE_RELS: &[&str] = &["next", "prev"];

static JSON_COUNT: LazyLock<Regex> = LazyLock::new(|| {
    let keys = COUNT_KEYS.join("|");
    Regex::new(&format!(r#""(?:{})"\s*:\s*"?(\d+)"#, keys))
        .expect("hardcoded regex pattern is valid")
});

static TEXT_COUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:results|wyniki)\s*\(\s*(\d+)\s*\)")
        .expect("hardcoded regex pattern is valid")
});

static ANCHOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("hardcoded selector is valid"));

/// Extracts the hrefs of detail page links, in page order
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` whose href contains `id_separator`
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` links and data URIs
///
/// Repeated hrefs are kept here; the caller dedupes by identifier.
///
/// # Example
///
/// ```
/// use job_miner::crawler::extract_detail_hrefs;
///
/// let html = r#"<a href="/praca/x,oferta,1">Job</a><a href="/about">About</a>"#;
/// assert_eq!(extract_detail_hrefs(html, ",oferta,"), vec!["/praca/x,oferta,1"]);
/// ```
pub fn extract_detail_hrefs(html: &str, id_separator: &str) -> Vec<String> {
    let document = Html::parse_document(html);

    document
        .select(&ANCHOR)
        .filter(|element| element.value().attr("download").is_none())
        .filter_map(|element| element.value().attr("href"))
        .map(str::trim)
        .filter(|href| is_followable(href) && href.contains(id_separator))
        .map(str::to_string)
        .collect()
}

/// Returns false for hrefs that never point at a page
fn is_followable(href: &str) -> bool {
    !(href.is_empty()
        || href.starts_with('#')
        || href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:"))
}

/// Total number of results the page claims to have
///
/// Looks at embedded JSON state first, then at a "Results (N)" or
/// "Wyniki (N)" text. Zero counts are skipped as inconclusive.
pub fn structured_total_count(html: &str) -> Option<u64> {
    let from_json = JSON_COUNT
        .captures_iter(html)
        .filter_map(|caps| caps.get(1)?.as_str().parse::<u64>().ok())
        .find(|n| *n > 0);
    if from_json.is_some() {
        return from_json;
    }

    let document = Html::parse_document(html);
    let text = document.root_element().text().collect::<Vec<_>>().join(" ");
    TEXT_COUNT
        .captures_iter(&text)
        .filter_map(|caps| caps.get(1)?.as_str().parse::<u64>().ok())
        .find(|n| *n > 0)
}

/// Highest page number shown by the pagination controls
///
/// A control counts if its text is a bare number or if its href carries a
/// `page` / `pageNumber` query parameter.
pub fn max_pagination_page(html: &str, base_url: &Url) -> Option<u32> {
    let document = Html::parse_document(html);
    let mut max_page: Option<u32> = None;

    for raw in PAGINATION_SELECTORS {
        let Ok(selector) = Selector::parse(raw) else {
            continue;
        };

        for element in document.select(&selector) {
            let relative = element
                .value()
                .attr("rel")
                .is_some_and(|rel| rel.split_whitespace().any(|r| RELATIVE_RELS.contains(&r)));
            if relative {
                continue;
            }

            let text = element.text().collect::<String>();
            let from_text = text.trim().parse::<u32>().ok();
            let from_href = element
                .value()
                .attr("href")
                .and_then(|href| page_from_href(href, base_url));

            for page in [from_text, from_href].into_iter().flatten() {
                max_page = Some(max_page.map_or(page, |m| m.max(page)));
            }
        }
    }

    max_page.filter(|p| *p > 0)
}

/// Page number carried in an href's query string
fn page_from_href(href: &str, base_url: &Url) -> Option<u32> {
    let url = base_url.join(href.trim()).ok()?;
    url.query_pairs()
        .find(|(key, _)| PAGE_QUERY_KEYS.contains(&key.as_ref()))
        .and_then(|(_, value)| value.parse().ok())
}
