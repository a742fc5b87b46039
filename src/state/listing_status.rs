/// Listing status definitions for stored job postings
///
/// Every posting captured by a crawl starts out `Active`.
use std::fmt;

/// Represents whether a posting is still open on the source site
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ListingStatus {
    /// Posting was visible on the site when captured
    #[default]
    Active,

    /// Posting has been taken down
    Closed,
}

impl ListingStatus {
    /// Converts the status to its database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Closed => "Closed",
        }
    }
}

impl fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}
