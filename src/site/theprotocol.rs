//! theprotocol.it
//!
//! Detail pages mark every field with a `data-test` attribute; detail URLs
//! look like `/szczegoly/praca/<slug>,oferta,<uuid>`.

use super::JobSite;
use crate::config::SourceConfig;
use crate::extract::{DetailExtractor, DetailSelectors, ExtractedJob};
use crate::url::{listing_page_url, UrlDeduplicator};
use crate::MinerError;
use url::Url;

const ID_SEPARATOR: &str = ",oferta,";

fn selectors() -> DetailSelectors {
    let list = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();

    DetailSelectors {
        title: list(&[r#"h1[data-test="text-offerTitle"]"#, "h1"]),
        company: list(&[
            r#"a[data-test="anchor-company-link"]"#,
            r#"[data-test="text-offerEmployer"]"#,
        ]),
        location: list(&[
            r#"span[data-test="text-primaryLocation"]"#,
            r#"[data-test="text-workplaceAddress"]"#,
        ]),
        operating_mode: list(&[r#"span[data-test="content-workModes"]"#]),
        contract: list(&[
            r#"span[data-test="text-contractName"]"#,
            r#"[data-test="section-contract"] [data-test="text-contractName"]"#,
        ]),
        experience_level: list(&[r#"span[data-test="content-positionLevels"]"#]),
        salary: list(&[r#"span[data-test="text-contractSalary"]"#]),
        offer_id: list(&[r#"span[data-test="text-offerId"]"#]),
        requirements: list(&[
            r#"[data-test="section-requirements"] li"#,
            r#"[data-test="section-requirements-expected"] li"#,
        ]),
        skills: list(&[
            r#"[data-test="chip-technology"]"#,
            r#"[data-test="chip-expectedTechnology"]"#,
        ]),
    }
}

pub struct TheProtocol {
    source: String,
    base_url: Url,
    search_url: Url,
    page_param: String,
    extractor: DetailExtractor,
}

impl TheProtocol {
    pub fn new(config: &SourceConfig) -> Result<Self, MinerError> {
        Ok(Self {
            source: config.name.clone(),
            base_url: Url::parse(&config.base_url)?,
            search_url: Url::parse(&config.search_url)?,
            page_param: config.page_param.clone(),
            extractor: DetailExtractor::new(config.name.clone(), &selectors())?,
        })
    }
}

impl JobSite for TheProtocol {
    fn source(&self) -> &str {
        &self.source
    }

    fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn id_separator(&self) -> &str {
        ID_SEPARATOR
    }

    fn listing_url(&self, page: u32) -> String {
        listing_page_url(&self.search_url, &self.page_param, page).to_string()
    }

    fn extract_detail(
        &self,
        html: &str,
        url: &str,
        dedup: &UrlDeduplicator,
    ) -> Option<ExtractedJob> {
        self.extractor.extract(html, url, dedup)
    }
}
