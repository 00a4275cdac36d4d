//! Declarative record extraction from paginated HTML listings.
//!
//! A [`SiteConfig`] maps attribute names to queries. [`SearchSession`] fills
//! and submits the site's search form, [`RecordPage`] holds the records of one
//! result page and links lazily to the next, and [`PageWalker`] follows that
//! chain to the end.

// Core modules
mod backend;
mod config;
mod error;
mod extract;
mod extractor;
mod fetch;
pub mod form;
mod page;
mod paginate;
mod record;
mod search;
mod urls;
pub mod walker;

// Public exports
pub use backend::{Document, NodeHandle, Query, QueryDocument, Value};
pub use config::SiteConfig;
pub use error::{
    ConfigError, ExtractionError, FetchError, PageError, ParseError, QueryError, SearchError,
    WalkError,
};
pub use extract::FromHtml;
pub use extractor::{Extraction, RecordExtractor};
pub use fetch::{DocumentFetcher, FetchRequest, FetchResponse, HttpFetcher, Method};
pub use form::{FormControl, SearchForm, SelectOption, encode_component};
pub use page::RecordPage;
pub use paginate::{PageTraversal, PaginationState};
pub use record::{AttributeQueryMap, Record};
pub use search::{SearchFormState, SearchSession};
pub use urls::UrlResolver;
pub use walker::{
    DelayLimiter, ObserverRegistry, PageObserver, PageSummary, PageWalker, PageWalkerBuilder,
    RateLimiter, RateLimiterConfig, TokenBucketLimiter, Walk, WalkStats, WalkerConfig,
};
