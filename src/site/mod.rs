//! Job board capabilities
//!
//! A `JobSite` knows how a particular board lays out its listing and detail
//! pages. The crawl pipeline is written against this trait only.

mod theprotocol;

pub use theprotocol::TheProtocol;

use crate::config::Config;
use crate::crawler::extract_detail_hrefs;
use crate::extract::ExtractedJob;
use crate::model::{DetailLink, ListingPage};
use crate::url::UrlDeduplicator;
use crate::MinerError;
use std::sync::Arc;
use url::Url;

/// Site-specific knowledge used by the crawl pipeline
pub trait JobSite: Send + Sync {
    /// Source tag stored on every record
    fn source(&self) -> &str;

    /// Site root used to resolve relative links
    fn base_url(&self) -> &Url;

    /// Literal path fragment preceding a posting's token in detail URLs
    fn id_separator(&self) -> &str;

    /// URL of a 1-based listing page
    fn listing_url(&self, page: u32) -> String;

    /// Parses one detail page
    fn extract_detail(
        &self,
        html: &str,
        url: &str,
        dedup: &UrlDeduplicator,
    ) -> Option<ExtractedJob>;

    /// Builds a `ListingPage` from a fetched listing body
    ///
    /// Links that cannot be resolved to an absolute URL are dropped. Repeated
    /// identifiers on the page are collapsed.
    fn parse_listing(
        &self,
        index: u32,
        url: &str,
        html: &str,
        dedup: &UrlDeduplicator,
    ) -> ListingPage {
        let links = extract_detail_hrefs(html, self.id_separator())
            .into_iter()
            .filter_map(|href| {
                let absolute = dedup.absolute_url(&href)?;
                Some(DetailLink {
                    id: dedup.canonicalize(&href, None),
                    url: absolute,
                })
            })
            .collect();

        ListingPage::new(index, url, links)
    }
}

/// Builds the site implementation named in the configuration
///
/// # Returns
///
/// * `Ok(Arc<dyn JobSite>)` - The configured site
/// * `Err(MinerError::UnknownSite)` - No implementation with that name
pub fn site_for(config: &Config) -> Result<Arc<dyn JobSite>, MinerError> {
    match config.source.site.to_lowercase().as_str() {
        "theprotocol" | "theprotocol.it" => Ok(Arc::new(TheProtocol::new(&config.source)?)),
        other => Err(MinerError::UnknownSite(other.to_string())),
    }
}
