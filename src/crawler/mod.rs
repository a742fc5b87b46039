//! Crawler module for listing and detail page processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP transport and fetching with pacing and retry
//! - Listing page parsing and pagination detection
//! - The bounded detail-page worker pool
//! - Overall crawl coordination

mod dispatcher;
mod fetcher;
mod pagination;
mod parser;
mod pipeline;
mod transport;

#[cfg(test)]
mod testing;

pub use dispatcher::{DispatchContext, DispatchReport, Dispatcher, Posting};
pub use fetcher::{backoff_delay, pacing_delay, FetchPolicy, FetchResult, Fetcher};
pub use pagination::{ListingProbe, PaginationOutcome, PaginationResolver, Strategy};
pub use parser::{extract_detail_hrefs, max_pagination_page, structured_total_count};
pub use pipeline::{CrawlCounts, CrawlOutcome, PaginationSummary, Pipeline};
pub use transport::{build_http_client, HttpResponse, ReqwestTransport, Transport, TransportError};
