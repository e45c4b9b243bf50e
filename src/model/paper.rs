use crate::model::PAPER_ID_LENGTH;
use thiserror::Error;
use url::Url;

/// Reasons a parsed detail page is rejected before persistence
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PaperValidationError {
    #[error("Field '{0}' is required")]
    MissingField(&'static str),

    #[error("External id '{0}' is not a six-digit id")]
    InvalidExternalId(String),

    #[error("Detail URL '{0}' is not an absolute http(s) URL")]
    InvalidDetailUrl(String),
}

/// A detail page reduced to the fields the store keeps
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPaper {
    pub external_id: String,
    pub title: String,

    /// Header date, e.g. `January 2024`; empty when the page has none
    pub date: String,
    pub published_in: String,
    pub keywords_raw: String,
    pub keywords: Vec<String>,
    pub abstract_text: String,

    /// Unsigned, so the non-negative constraint holds by construction
    pub download_count: u64,
    pub download_url: String,
    pub detail_url: String,
}

impl ParsedPaper {
    /// Checks the record against the persisted schema
    pub fn validate(&self) -> Result<(), PaperValidationError> {
        if self.external_id.len() != PAPER_ID_LENGTH
            || !self.external_id.chars().all(|c| c.is_ascii_digit())
        {
            return Err(PaperValidationError::InvalidExternalId(
                self.external_id.clone(),
            ));
        }

        if self.title.trim().is_empty() {
            return Err(PaperValidationError::MissingField("title"));
        }

        match Url::parse(&self.detail_url) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => Ok(()),
            _ => Err(PaperValidationError::InvalidDetailUrl(
                self.detail_url.clone(),
            )),
        }
    }

    /// Splits the header date into `(month, year)`
    ///
    /// `"January 2024"` gives `("January", "2024")`; missing parts are empty.
    pub fn month_and_year(&self) -> (String, String) {
        let mut parts = self.date.split(' ');
        let month = parts.next().unwrap_or_default().to_string();
        let year = parts.next().unwrap_or_default().to_string();
        (month, year)
    }

    /// Stable reference string stored alongside the paper
    pub fn reference(&self) -> String {
        format!("lingbuzz/{}", self.external_id)
    }
}
