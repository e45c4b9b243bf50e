//! Narrow DOM capability over `scraper`
//!
//! Parsers only need a handful of operations: find the first match, list all
//! matches, read an element's text, and walk to the text that follows an
//! element. Keeping them here means the parsers never touch the `scraper`
//! node tree directly.

pub mod selectors;

use scraper::{ElementRef, Html, Selector};

/// A parsed HTML document or fragment
pub struct Page {
    document: Html,
}

impl Page {
    /// Parses a full document
    pub fn parse(html: &str) -> Self {
        Self {
            document: Html::parse_document(html),
        }
    }

    /// Parses a fragment, e.g. one line of a header block
    pub fn fragment(html: &str) -> Self {
        Self {
            document: Html::parse_fragment(html),
        }
    }

    pub fn find_first(&self, selector: &Selector) -> Option<ElementRef<'_>> {
        self.document.select(selector).next()
    }

    pub fn all_matching(&self, selector: &Selector) -> Vec<ElementRef<'_>> {
        self.document.select(selector).collect()
    }

    /// Trimmed `<title>` text, if any
    pub fn title(&self) -> Option<String> {
        self.find_first(&selectors::PAGE_TITLE).map(text_of)
    }

    /// All text in the document, trimmed
    pub fn text(&self) -> String {
        text_of(self.document.root_element())
    }
}

/// Concatenated descendant text of an element, trimmed
pub fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

pub fn find_within<'a>(element: ElementRef<'a>, selector: &Selector) -> Option<ElementRef<'a>> {
    element.select(selector).next()
}

pub fn all_within<'a>(element: ElementRef<'a>, selector: &Selector) -> Vec<ElementRef<'a>> {
    element.select(selector).collect()
}

pub fn attr<'a>(element: ElementRef<'a>, name: &str) -> Option<&'a str> {
    element.value().attr(name)
}

/// First non-blank text node among the element's following siblings
///
/// Elements in between are skipped, so `<table>..</table><br><br>text`
/// yields `text`.
pub fn following_text(element: ElementRef<'_>) -> Option<String> {
    element
        .next_siblings()
        .filter_map(|node| node.value().as_text().map(|t| String::from(&**t)))
        .find(|text| !text.trim().is_empty())
}
