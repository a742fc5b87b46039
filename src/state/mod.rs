//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `ListingStatus`: lifecycle of a stored posting (active, closed)
//! - `CrawlState`: run-scoped seen identifiers and the listing page cursor
//! - `ShutdownSignal`: cooperative cancellation shared by the pipeline and its workers

mod crawl_state;
mod listing_status;

// Re-export main types
pub use crawl_state::{CrawlState, ShutdownSignal};
pub use listing_status::ListingStatus;
