//! Row classification against the store
//!
//! - `freshly changed` → `UpdateVersion`, without a store lookup
//! - anything else, stored → `Skip`
//! - anything else, not stored → `FullScrape`

use crate::model::{ListingRow, ListingStatus, ScrapeAction};
use crate::storage::{lock_storage, Storage, StorageResult};
use crate::SyncError;
use std::sync::Mutex;

/// Reason attached to rows skipped because the paper is stored
pub const ALREADY_PRESENT: &str = "already present";

/// The single store query classification needs
pub trait PaperLookup {
    fn contains_paper(&self, external_id: &str) -> StorageResult<bool>;
}

impl<S: Storage> PaperLookup for Mutex<S> {
    fn contains_paper(&self, external_id: &str) -> StorageResult<bool> {
        let storage = lock_storage(self)?;
        Ok(storage.find_paper_by_external_id(external_id)?.is_some())
    }
}

/// Decides what to do with one row
pub fn classify(row: &ListingRow, lookup: &impl PaperLookup) -> Result<ScrapeAction, SyncError> {
    if row.status == ListingStatus::FreshlyChanged {
        return Ok(ScrapeAction::UpdateVersion(row.clone()));
    }

    if lookup.contains_paper(&row.id)? {
        Ok(ScrapeAction::Skip {
            row: row.clone(),
            reason: ALREADY_PRESENT.to_string(),
        })
    } else {
        Ok(ScrapeAction::FullScrape(row.clone()))
    }
}

/// Classifies every row of a page, in order
///
/// A lookup failure aborts the whole page.
pub fn classify_rows(
    rows: &[ListingRow],
    lookup: &impl PaperLookup,
) -> Result<Vec<ScrapeAction>, SyncError> {
    let actions = rows
        .iter()
        .map(|row| classify(row, lookup))
        .collect::<Result<Vec<_>, _>>()?;

    tracing::debug!(
        rows = actions.len(),
        skipped = actions.iter().filter(|a| a.is_skip()).count(),
        "Classified listing rows"
    );
    Ok(actions)
}
