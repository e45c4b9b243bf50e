use std::collections::BTreeMap;
use std::fmt;

/// Status cell of a listing row
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ListingStatus {
    /// Entry added since the archive's last rollover
    New,

    /// The archive flags the entry as recently edited
    FreshlyChanged,

    /// Anything else; in practice a date such as `2026-01`
    Dated(String),
}

impl ListingStatus {
    /// Parses the trimmed text of a status cell
    pub fn parse(text: &str) -> Self {
        match text.trim() {
            "new" => Self::New,
            "freshly changed" => Self::FreshlyChanged,
            other => Self::Dated(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::New => "new",
            Self::FreshlyChanged => "freshly changed",
            Self::Dated(s) => s,
        }
    }
}

impl fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An author link from a listing row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorRef {
    pub first_name: String,
    pub last_name: String,

    /// Absolute URL of the author's profile page
    pub profile_url: String,

    /// Stable natural key for the author
    pub username: String,
}

/// One data row of a listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingRow {
    /// Zero-padded six digit archive id
    pub id: String,
    pub title: String,
    pub status: ListingStatus,

    /// Byline order, 1-based
    pub authors: BTreeMap<u32, AuthorRef>,

    /// Absolute PDF URL with the query string removed, empty if the row has none
    pub download_url: String,

    pub detail_url: String,
}
