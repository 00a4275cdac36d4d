//! Following "next page" links

use std::{rc::Rc, sync::Arc};

use tracing::{debug, warn};

use crate::{
    Document, DocumentFetcher, FetchRequest, PageError, QueryDocument, RecordExtractor, RecordPage,
    UrlResolver, Value,
};

/// Where the next page link lives and which page we are on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationState {
    next_link_query: String,
    base_url: String,
    page_number: usize,
}

impl PaginationState {
    /// State for the first page
    pub fn new(next_link_query: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            next_link_query: next_link_query.into(),
            base_url: base_url.into(),
            page_number: 1,
        }
    }

    /// Start counting from another page number (values below 1 become 1)
    pub fn with_page_number(mut self, page_number: usize) -> Self {
        self.page_number = page_number.max(1);
        self
    }

    /// Query locating the next-page link
    pub fn next_link_query(&self) -> &str {
        &self.next_link_query
    }

    /// URL that relative next-page links are resolved against
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Current page number, starting at 1
    pub fn page_number(&self) -> usize {
        self.page_number
    }

    /// State of the following page
    pub fn advance(&self) -> Self {
        Self {
            next_link_query: self.next_link_query.clone(),
            base_url: self.base_url.clone(),
            page_number: self.page_number + 1,
        }
    }
}

/// Locates and follows the "next page" link of a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageTraversal {
    state: PaginationState,
}

impl PageTraversal {
    pub fn new(state: PaginationState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &PaginationState {
        &self.state
    }

    pub fn page_number(&self) -> usize {
        self.state.page_number
    }

    /// Absolute URL of the next page, if the document links to one
    ///
    /// The first match of the next-link query is used: its text, or the
    /// `href` of a matched element without text.
    pub fn resolve_next_url<D: QueryDocument + ?Sized>(
        &self,
        document: &D,
    ) -> Result<Option<String>, PageError> {
        let query = self.state.next_link_query();
        let values = document.evaluate(query).map_err(|error| PageError::Query {
            query: query.to_string(),
            error,
        })?;

        let route = match values.into_iter().next() {
            Some(Value::Text(text)) => text,
            Some(Value::Node(node)) => match node.attr("href").filter(|href| !href.is_empty()) {
                Some(href) => href.to_string(),
                None => {
                    warn!(
                        query,
                        element = node.name(),
                        "next-link element has no href"
                    );
                    return Ok(None);
                }
            },
            None => {
                debug!(query, page = self.page_number(), "no next-page link");
                return Ok(None);
            }
        };

        Ok(Some(UrlResolver::resolve(&route, self.state.base_url())))
    }

    /// Fetch the page after `document` and extract its records
    ///
    /// Returns `None` when `document` has no next-page link. The new page
    /// keeps the same query and base URL, with the page number advanced.
    pub async fn fetch_next(
        &self,
        extractor: &Arc<RecordExtractor>,
        fetcher: &Arc<dyn DocumentFetcher>,
        document: &Document,
    ) -> Result<Option<RecordPage>, PageError> {
        let Some(url) = self.resolve_next_url(document)? else {
            return Ok(None);
        };

        let next_state = self.state.advance();
        debug!(url = %url, page = next_state.page_number(), "fetching next page");

        let next_document = fetcher.fetch_document(&FetchRequest::get(url)).await?;

        Ok(Some(RecordPage::new(
            Rc::new(next_document),
            extractor.clone(),
            fetcher.clone(),
            Some(PageTraversal::new(next_state)),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn traversal(query: &str, base_url: &str) -> PageTraversal {
        PageTraversal::new(PaginationState::new(query, base_url))
    }

    #[test]
    fn test_resolves_relative_href_against_base() {
        let document = Document::parse(
            "https://site.com/list",
            r#"<ul class="pager"><li class="next"><a href="/page/2">Next</a></li></ul>"#,
        );

        let url = traversal("li.next a @href", "https://site.com")
            .resolve_next_url(&document)
            .unwrap();
        assert_eq!(url.as_deref(), Some("https://site.com/page/2"));
    }

    #[test]
    fn test_element_match_uses_href() {
        let document = Document::parse(
            "https://site.com",
            r#"<a class="next" href="https://other.com/p2"><img src="arrow.png"></a>"#,
        );

        let url = traversal("a.next", "https://site.com")
            .resolve_next_url(&document)
            .unwrap();
        assert_eq!(url.as_deref(), Some("https://other.com/p2"));
    }

    #[test]
    fn test_missing_link_is_none() {
        let document = Document::parse("https://site.com", "<p>last page</p>");
        let url = traversal("li.next a @href", "https://site.com")
            .resolve_next_url(&document)
            .unwrap();
        assert_eq!(url, None);
    }

    #[test]
    fn test_broken_query_is_an_error() {
        let document = Document::parse("https://site.com", "<p></p>");
        assert!(matches!(
            traversal("li[[", "https://site.com").resolve_next_url(&document),
            Err(PageError::Query { .. })
        ));
    }

    #[test]
    fn test_advance_keeps_query_and_base() {
        let state = PaginationState::new("a.next @href", "https://site.com").with_page_number(4);
        let next = state.advance();
        assert_eq!(next.page_number(), 5);
        assert_eq!(next.next_link_query(), "a.next @href");
        assert_eq!(next.base_url(), "https://site.com");
        assert_eq!(
            PaginationState::new("q", "")
                .with_page_number(0)
                .page_number(),
            1
        );
    }
}
