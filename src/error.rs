//! Error types for querying, extraction, fetching and searching
//!
//! Every component reports failures through one of the enums below. Errors
//! that the engine can recover from (a broken query for one attribute, a field
//! missing from one record) are logged and collected rather than returned, so
//! callers see them through [`Extraction::errors`](crate::Extraction).

/// Errors raised while evaluating a query against a document
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    /// The query string was empty or only whitespace
    #[error("Empty query")]
    Empty,

    /// The selector part of the query could not be parsed
    #[error("Failed to parse selector '{selector}': {error}")]
    InvalidSelector { selector: String, error: String },

    /// The query ended with `@` but named no attribute
    #[error("Query '{query}' is missing an attribute name after '@'")]
    MissingAttributeName { query: String },
}

/// Errors that can occur during record extraction
///
/// Extraction never aborts on these: each one is logged and collected while
/// the remaining attributes and records are still produced.
///
/// # Examples
///
/// ```ignore
/// use listmapper::{ExtractionError, RecordExtractor};
///
/// let extraction = extractor.extract_detailed(&document);
/// for error in extraction.errors() {
///     match error {
///         ExtractionError::MissingField { field, index, .. } => {
///             eprintln!("record {index} has no '{field}'");
///         }
///         other => eprintln!("{other}"),
///     }
/// }
/// ```
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    /// The query configured for an attribute could not be evaluated
    #[error("Query for attribute '{attribute}' failed: {error}")]
    InvalidQuery {
        attribute: String,
        query: String,
        #[source]
        error: QueryError,
    },

    /// An attribute's query produced fewer matches than the first attribute
    #[error("Field '{field}' has no match at position {index} for query '{query}'")]
    MissingField {
        field: String,
        query: String,
        index: usize,
    },

    /// Failed to parse a field value into the requested type
    #[error("Failed to parse field '{field}' from text '{text}': {error}")]
    ParseError {
        field: String,
        text: String,
        error: ParseError,
    },
}

/// Errors that can occur when parsing text into Rust types
///
/// # Examples
///
/// ```ignore
/// use listmapper::{FromHtml, ParseError};
///
/// match i32::from_text("not a number") {
///     Ok(num) => println!("Parsed: {}", num),
///     Err(ParseError::InvalidNumber { text, .. }) => {
///         eprintln!("Failed to parse '{}' as number", text);
///     }
///     Err(e) => eprintln!("Other error: {}", e),
/// }
/// ```
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// Failed to parse an integer
    #[error("Invalid number: {text}")]
    InvalidNumber {
        text: String,
        #[source]
        error: std::num::ParseIntError,
    },

    /// Failed to parse a floating point number
    #[error("Invalid float: {text}")]
    InvalidFloat {
        text: String,
        #[source]
        error: std::num::ParseFloatError,
    },

    /// Failed to parse a boolean value
    ///
    /// Valid boolean values are:
    /// - true: "true", "1", "yes", "on"
    /// - false: "false", "0", "no", "off", ""
    #[error("Invalid boolean: {text}")]
    InvalidBool { text: String },

    /// Custom parsing error for user `FromHtml` implementations
    #[error("Custom parse error: {message}")]
    Custom { message: String },
}

/// Transport failures reported by a [`DocumentFetcher`](crate::DocumentFetcher)
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The request could not be sent or its body could not be read
    #[error("Request to '{url}' failed: {error}")]
    Request {
        url: String,
        #[source]
        error: reqwest::Error,
    },

    /// The server answered with a non-success status
    #[error("Request to '{url}' returned status {status}")]
    Status { url: String, status: u16 },

    /// No document is available for the URL (used by non-HTTP fetchers)
    #[error("No document available for '{url}'")]
    NotFound { url: String },
}

impl FetchError {
    /// The URL of the request that failed
    pub fn url(&self) -> &str {
        match self {
            Self::Request { url, .. } | Self::Status { url, .. } | Self::NotFound { url } => url,
        }
    }
}

/// Errors that can occur while following a "next page" link
#[derive(Debug, thiserror::Error)]
pub enum PageError {
    /// The next-link query could not be evaluated
    #[error("Next-link query '{query}' failed: {error}")]
    Query {
        query: String,
        #[source]
        error: QueryError,
    },

    /// The next page could not be fetched
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// Errors that can occur while driving a search form
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// The search-input query could not be evaluated
    #[error("Search-input query '{query}' failed: {error}")]
    Query {
        query: String,
        #[source]
        error: QueryError,
    },

    /// The search-input query matched no element
    #[error("No search input matches '{query}'")]
    InputNotFound { query: String },

    /// The located search input has no enclosing form
    #[error("Search input '{query}' is not inside a form")]
    FormNotFound { query: String },

    /// A form-based request was requested but no form state was provided
    #[error("A search-input query is configured but no form was located")]
    MissingFormState,

    /// Form lookup was requested for a site without a search-input query
    #[error("No search-input query is configured")]
    NoSearchInput,

    /// A fetch made during the search failed
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// Errors in a site configuration or walker configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// No attribute queries were configured
    #[error("At least one attribute query is required")]
    NoAttributes,

    /// An attribute was declared with an empty name
    #[error("Attribute names must not be empty")]
    EmptyAttributeName,

    /// An attribute, next-link or search-input query was empty
    #[error("Query for '{0}' must not be empty")]
    EmptyQuery(String),

    /// The configuration document could not be parsed
    #[error("Invalid configuration document: {0}")]
    Json(#[from] serde_json::Error),

    /// Page limit must be greater than 0
    #[error("Page limit must be greater than 0, got {0}")]
    InvalidPageLimit(usize),

    /// Rate limit must be a positive, finite number of requests per second
    #[error("Rate limit must be positive, got {0}")]
    InvalidRateLimit(f64),
}

/// Error that stopped a page walk, with the page it happened on
#[derive(Debug, thiserror::Error)]
#[error("Walk stopped after page {page_number}: {error}")]
pub struct WalkError {
    /// Number of the last page that was loaded successfully
    pub page_number: usize,
    /// The failure that ended the walk
    #[source]
    pub error: PageError,
}
