//! URL handling module for Job-Miner
//!
//! This module provides URL normalization, href resolution, and the
//! detail-page deduplicator shared by all crawl workers.

mod dedup;
mod normalize;

// Re-export main functions
pub use dedup::UrlDeduplicator;
pub use normalize::{canonical_key, normalize_parsed, normalize_url, resolve_href};

use url::Url;

/// Builds the URL of a 1-based listing page
///
/// Page 1 is requested with the parameter as well, so every listing page
/// has the same shape. An existing value of the parameter is replaced.
///
/// # Examples
///
/// ```
/// use job_miner::url::listing_page_url;
/// use url::Url;
///
/// let search = Url::parse("https://theprotocol.it/filtry/big-data-science;p/warszawa;wp").unwrap();
/// let page = listing_page_url(&search, "pageNumber", 3);
/// assert_eq!(page.as_str(), "https://theprotocol.it/filtry/big-data-science;p/warszawa;wp?pageNumber=3");
/// ```
pub fn listing_page_url(search_url: &Url, page_param: &str, page: u32) -> Url {
    let mut url = search_url.clone();
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != page_param)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    {
        let mut pairs = url.query_pairs_mut();
        pairs.clear();
        for (k, v) in &kept {
            pairs.append_pair(k, v);
        }
        pairs.append_pair(page_param, &page.to_string());
    }

    url
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_page_url_appends_param() {
        let search = Url::parse("https://theprotocol.it/filtry/big-data-science;wp").unwrap();
        assert_eq!(
            listing_page_url(&search, "pageNumber", 1).as_str(),
            "https://theprotocol.it/filtry/big-data-science;wp?pageNumber=1"
        );
    }

    #[test]
    fn test_listing_page_url_replaces_existing_param() {
        let search = Url::parse("https://theprotocol.it/filtry?sort=date&page=7").unwrap();
        assert_eq!(
            listing_page_url(&search, "page", 2).as_str(),
            "https://theprotocol.it/filtry?sort=date&page=2"
        );
    }
}
