//! Output module for crawl reports and database statistics
//!
//! This module handles:
//! - Printing the end-of-run crawl report
//! - Loading and displaying statistics from the record store

mod report;
pub mod stats;

pub use report::{format_crawl_report, print_crawl_report};
pub use stats::{format_statistics, load_statistics, print_statistics, StoreStatistics};
