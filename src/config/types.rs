use serde::Deserialize;

/// Main configuration structure for Job-Miner
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub source: SourceConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub taxonomy: Vec<TaxonomyEntry>,
}

/// The job board being crawled
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Which site implementation parses the pages (e.g. "theprotocol")
    pub site: String,

    /// Source tag stored on every record (e.g. "theprotocol.it")
    pub name: String,

    /// Site root used to resolve relative links
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Filtered search URL whose result pages are enumerated
    #[serde(rename = "search-url")]
    pub search_url: String,

    /// Query parameter carrying the 1-based page number
    #[serde(rename = "page-param", default = "default_page_param")]
    pub page_param: String,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Number of postings the site shows on a full listing page
    #[serde(rename = "page-size", default = "default_page_size")]
    pub page_size: u32,

    /// Upper bound on listing pages, whatever the site claims
    #[serde(rename = "max-pages-safety-cap", default = "default_safety_cap")]
    pub max_pages_safety_cap: u32,

    /// Number of concurrent detail-page workers
    #[serde(rename = "worker-count", default = "default_worker_count")]
    pub worker_count: u32,

    /// Pagination detection strategy
    #[serde(default)]
    pub pagination: PaginationMode,

    /// Lower bound of the pause between listing pages (milliseconds)
    #[serde(rename = "polite-delay-min-ms", default = "default_polite_min")]
    pub polite_delay_min_ms: u64,

    /// Upper bound of the pause between listing pages (milliseconds)
    #[serde(rename = "polite-delay-max-ms", default = "default_polite_max")]
    pub polite_delay_max_ms: u64,
}

/// Which pagination strategy the resolver runs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaginationMode {
    /// Structured count, then pagination controls, then probing
    #[default]
    Auto,
    StructuredCount,
    Controls,
    Probe,
}

/// HTTP fetch and retry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    /// Per-request timeout (seconds)
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Attempts per URL before giving up
    #[serde(rename = "max-retries", default = "default_max_retries")]
    pub max_retries: u32,

    /// Base delay for pacing and exponential backoff (milliseconds)
    #[serde(rename = "base-retry-delay-ms", default = "default_base_delay")]
    pub base_retry_delay_ms: u64,
}

/// Request identification headers
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// User-Agent header value
    #[serde(default = "default_user_agent")]
    pub value: String,

    /// Accept-Language header value
    #[serde(rename = "accept-language", default = "default_accept_language")]
    pub accept_language: String,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

/// One skill category and its member keywords
#[derive(Debug, Clone, Deserialize)]
pub struct TaxonomyEntry {
    pub category: String,
    pub skills: Vec<String>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            max_pages_safety_cap: default_safety_cap(),
            worker_count: default_worker_count(),
            pagination: PaginationMode::default(),
            polite_delay_min_ms: default_polite_min(),
            polite_delay_max_ms: default_polite_max(),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            base_retry_delay_ms: default_base_delay(),
        }
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            value: default_user_agent(),
            accept_language: default_accept_language(),
        }
    }
}

fn default_page_param() -> String {
    "pageNumber".to_string()
}

fn default_page_size() -> u32 {
    50
}

fn default_safety_cap() -> u32 {
    10
}

fn default_worker_count() -> u32 {
    8
}

fn default_polite_min() -> u64 {
    1000
}

fn default_polite_max() -> u64 {
    2500
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_base_delay() -> u64 {
    1000
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/98.0.4758.102 Safari/537.36"
        .to_string()
}

fn default_accept_language() -> String {
    "en-US,en;q=0.9,pl;q=0.8".to_string()
}
