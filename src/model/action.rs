use crate::model::ListingRow;

/// Decision taken for one listing row during a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScrapeAction {
    /// Not in the store: fetch, parse and persist everything
    FullScrape(ListingRow),

    /// The archive reports an edit: refresh the stored version
    UpdateVersion(ListingRow),

    /// Nothing to do
    Skip { row: ListingRow, reason: String },
}

impl ScrapeAction {
    pub fn row(&self) -> &ListingRow {
        match self {
            Self::FullScrape(row) | Self::UpdateVersion(row) => row,
            Self::Skip { row, .. } => row,
        }
    }

    pub fn is_skip(&self) -> bool {
        matches!(self, Self::Skip { .. })
    }

    /// Short label used in logs
    pub fn label(&self) -> &'static str {
        match self {
            Self::FullScrape(_) => "full-scrape",
            Self::UpdateVersion(_) => "update-version",
            Self::Skip { .. } => "skip",
        }
    }
}
