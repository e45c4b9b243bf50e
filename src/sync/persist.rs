//! Paper persistence with per-relation failure isolation
//!
//! A paper row is written first and its id captured. Keyword and author
//! relations follow one by one; each failure is logged and the rest carry on.
//! The paper counts as persisted once its own row is committed.

use crate::model::{AuthorRef, ParsedPaper};
use crate::parser::{parse_author_profile, AuthorProfile};
use crate::storage::{lock_storage, NewAuthor, Storage, StorageError, StorageResult};
use crate::sync::fetcher::Fetcher;
use crate::SyncError;
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};

/// Writes parsed papers and their relations to shared storage
pub struct PersistenceEngine<S> {
    storage: Arc<Mutex<S>>,

    /// Fetches profile pages for authors seen for the first time; `None`
    /// stores new authors without enrichment
    profile_fetcher: Option<Fetcher>,
}

impl<S: Storage> PersistenceEngine<S> {
    pub fn new(storage: Arc<Mutex<S>>, profile_fetcher: Option<Fetcher>) -> Self {
        Self {
            storage,
            profile_fetcher,
        }
    }

    /// Inserts a paper and its keyword and author relations
    ///
    /// # Returns
    ///
    /// The paper's id. Relation failures are logged, not returned, except a
    /// poisoned storage lock.
    pub async fn persist(
        &self,
        paper: &ParsedPaper,
        authors: &BTreeMap<u32, AuthorRef>,
    ) -> Result<i64, SyncError> {
        let paper_id = lock_storage(&self.storage)?.insert_paper(paper)?;
        tracing::debug!(paper_id, external_id = %paper.external_id, "Inserted paper");

        self.persist_keywords(paper_id, &paper.keywords)?;

        for (position, author) in authors {
            match self.persist_author(paper_id, *position, author).await {
                Ok(()) => {}
                Err(e @ SyncError::Storage(StorageError::LockPoisoned)) => return Err(e),
                Err(e) => tracing::error!(
                    paper_id,
                    username = %author.username,
                    position,
                    error = %e,
                    "Failed to relate author"
                ),
            }
        }

        Ok(paper_id)
    }

    /// Refreshes a changed paper
    ///
    /// A stored paper gets its version columns overwritten and keeps its
    /// relations. A paper that is not stored yet is persisted in full.
    pub async fn update_version(
        &self,
        paper: &ParsedPaper,
        authors: &BTreeMap<u32, AuthorRef>,
    ) -> Result<i64, SyncError> {
        let existing = lock_storage(&self.storage)?.find_paper_by_external_id(&paper.external_id)?;

        match existing {
            Some(record) => {
                lock_storage(&self.storage)?.update_paper_version(record.id, paper)?;
                tracing::debug!(paper_id = record.id, external_id = %paper.external_id, "Updated paper version");
                Ok(record.id)
            }
            None => self.persist(paper, authors).await,
        }
    }

    /// Relates each distinct non-empty keyword; only a poisoned lock is returned
    fn persist_keywords(&self, paper_id: i64, keywords: &[String]) -> StorageResult<()> {
        let mut seen = HashSet::new();

        for keyword in keywords.iter().map(|k| k.trim()).filter(|k| !k.is_empty()) {
            if !seen.insert(keyword) {
                continue;
            }

            match self.relate_keyword(paper_id, keyword) {
                Ok(()) => {}
                Err(StorageError::LockPoisoned) => return Err(StorageError::LockPoisoned),
                Err(e) => tracing::error!(paper_id, keyword, error = %e, "Failed to relate keyword"),
            }
        }

        Ok(())
    }

    fn relate_keyword(&self, paper_id: i64, keyword: &str) -> StorageResult<()> {
        let mut storage = lock_storage(&self.storage)?;
        storage.upsert_keyword(keyword)?;
        let keyword_id = storage
            .find_keyword_id(keyword)?
            .ok_or_else(|| StorageError::NotFound(format!("Keyword '{}'", keyword)))?;
        storage.insert_keyword_paper(keyword_id, paper_id)
    }

    async fn persist_author(
        &self,
        paper_id: i64,
        position: u32,
        author: &AuthorRef,
    ) -> Result<(), SyncError> {
        if author.username.is_empty() {
            tracing::warn!(
                paper_id,
                position,
                name = %format!("{} {}", author.first_name, author.last_name),
                "Author link has no username, not relating"
            );
            return Ok(());
        }

        let existing = lock_storage(&self.storage)?.find_author_by_username(&author.username)?;

        let author_id = match existing {
            Some(record) => record.id,
            None => {
                let profile = self.fetch_profile(author).await;
                let new_author = NewAuthor {
                    username: author.username.clone(),
                    first_name: author.first_name.clone(),
                    last_name: author.last_name.clone(),
                    email: profile.email,
                    affiliation: profile.affiliation,
                    website: profile.website,
                };
                lock_storage(&self.storage)?.insert_author(&new_author)?
            }
        };

        lock_storage(&self.storage)?.insert_author_paper(author_id, paper_id, position)?;
        Ok(())
    }

    /// Profile fields for a new author, empty when enrichment is off or fails
    async fn fetch_profile(&self, author: &AuthorRef) -> AuthorProfile {
        let Some(fetcher) = &self.profile_fetcher else {
            return AuthorProfile::default();
        };
        if author.profile_url.is_empty() {
            return AuthorProfile::default();
        }

        match fetcher.get_text(&author.profile_url).await {
            Ok(html) => parse_author_profile(&html),
            Err(e) => {
                tracing::warn!(
                    username = %author.username,
                    url = %author.profile_url,
                    error = %e,
                    "Profile fetch failed, storing author without enrichment"
                );
                AuthorProfile::default()
            }
        }
    }
}
