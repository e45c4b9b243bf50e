//! Author profile page parsing

use crate::html::{selectors, text_of, Page};

/// Contact details from an author's profile page
///
/// Every field is empty when the page lacks it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorProfile {
    pub email: String,
    pub affiliation: String,
    pub website: String,
}

/// Reads email, affiliation and website off a profile page
///
/// The archive obfuscates addresses as `name @ host`; the spaces are removed.
pub fn parse_author_profile(html: &str) -> AuthorProfile {
    let page = Page::parse(html);
    let value = |selector| page.find_first(selector).map(text_of).unwrap_or_default();

    AuthorProfile {
        email: value(&selectors::PROFILE_EMAIL).replace(" @ ", "@"),
        affiliation: value(&selectors::PROFILE_AFFILIATION),
        website: value(&selectors::PROFILE_WEBSITE),
    }
}
