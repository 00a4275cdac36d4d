//! Per-site configuration
//!
//! A site is described entirely by data: where it lives, which queries pull
//! each attribute out of a listing, how to find the next page, and where the
//! search box is. The same engine serves every site.
//!
//! # Examples
//!
//! ```ignore
//! use listmapper::SiteConfig;
//!
//! let config = SiteConfig::from_json(r#"{
//!     "base_url": "https://shop.example",
//!     "attributes": {
//!         "title": "ol#results li h2 span.title",
//!         "price": "ol#results li span.price",
//!         "url":   "ol#results li a.item-link @href",
//!         "img":   "ol#results li img"
//!     },
//!     "next_link": "li.pagination-next a @href",
//!     "search_input": "input.nav-search"
//! }"#)?;
//! ```

use serde::{Deserialize, Serialize};

use crate::{AttributeQueryMap, ConfigError, PaginationState, RecordExtractor};

/// Queries and base URL for one target site
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Site URL: search page, pagination base and prefix for form-less searches
    #[serde(default)]
    pub base_url: String,
    /// Attribute queries, first one deciding the record count
    pub attributes: AttributeQueryMap,
    /// Query for the next-page link
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_link: Option<String>,
    /// Query for the search input field
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_input: Option<String>,
}

impl SiteConfig {
    /// Create a configuration with no queries yet
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Parse and validate a JSON configuration
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Add an attribute query (declaration order is kept)
    pub fn attribute(mut self, name: impl Into<String>, query: impl Into<String>) -> Self {
        self.attributes.insert(name, query);
        self
    }

    /// Set the next-page link query
    pub fn next_link(mut self, query: impl Into<String>) -> Self {
        self.next_link = Some(query.into());
        self
    }

    /// Set the search input query
    pub fn search_input(mut self, query: impl Into<String>) -> Self {
        self.search_input = Some(query.into());
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.attributes.is_empty() {
            return Err(ConfigError::NoAttributes);
        }
        for (name, query) in self.attributes.iter() {
            if name.trim().is_empty() {
                return Err(ConfigError::EmptyAttributeName);
            }
            if query.trim().is_empty() {
                return Err(ConfigError::EmptyQuery(name.to_string()));
            }
        }
        if let Some(query) = &self.next_link
            && query.trim().is_empty()
        {
            return Err(ConfigError::EmptyQuery("next_link".to_string()));
        }
        if let Some(query) = &self.search_input
            && query.trim().is_empty()
        {
            return Err(ConfigError::EmptyQuery("search_input".to_string()));
        }
        Ok(())
    }

    /// Extractor for the configured attributes
    pub fn extractor(&self) -> RecordExtractor {
        RecordExtractor::new(self.attributes.clone())
    }

    /// Pagination state of a first page, when a next-link query is set
    pub fn pagination(&self) -> Option<PaginationState> {
        self.next_link
            .as_ref()
            .map(|query| PaginationState::new(query.clone(), self.base_url.clone()))
    }
}
