//! Document transport
//!
//! The engine asks a [`DocumentFetcher`] for documents and never performs I/O
//! itself. [`HttpFetcher`] is the `reqwest`-backed implementation; tests and
//! offline replays can supply their own.

use std::fmt;

use reqwest::header::CONTENT_TYPE;
use tracing::{debug, error};

use crate::{Document, FetchError};

/// HTTP method of a request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Method {
    #[default]
    Get,
    Post,
}

impl Method {
    /// Method named by a form's `method` attribute
    ///
    /// Anything other than a case-insensitive `post` is GET, as in browsers.
    pub fn from_form_attr(value: Option<&str>) -> Self {
        match value {
            Some(value) if value.trim().eq_ignore_ascii_case("post") => Method::Post,
            _ => Method::Get,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request for one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// Absolute URL to fetch
    pub url: String,
    /// HTTP method
    pub method: Method,
    /// URL-encoded form body, sent with POST requests
    pub body: Option<String>,
}

impl FetchRequest {
    /// A GET request
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: Method::Get,
            body: None,
        }
    }

    /// A POST request with a URL-encoded form body
    pub fn post(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: Method::Post,
            body: Some(body.into()),
        }
    }
}

/// A raw response
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// Final URL after redirects
    pub url: String,
    /// HTTP status code
    pub status: u16,
    /// Response body as text
    pub body: String,
}

/// Source of documents for the extraction engine
///
/// Failures are explicit: a fetch either yields a response or a
/// [`FetchError`]; nothing half-loaded flows into extraction.
#[async_trait::async_trait]
pub trait DocumentFetcher: Send + Sync {
    /// Perform the request and return the raw response
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, FetchError>;

    /// Perform the request and parse the response body as HTML
    async fn fetch_document(&self, request: &FetchRequest) -> Result<Document, FetchError> {
        let response = self.fetch(request).await?;
        Ok(Document::parse(response.url, &response.body))
    }
}

/// [`DocumentFetcher`] over HTTP
///
/// Sends no custom headers beyond reqwest's defaults and the form content type
/// for POST bodies. Redirects are followed and caching is left to the server.
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Create a fetcher with a default client
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a fetcher on top of a preconfigured client
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl DocumentFetcher for HttpFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, FetchError> {
        debug!(url = %request.url, method = %request.method, "fetching");

        let builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self
                .client
                .post(&request.url)
                .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(request.body.clone().unwrap_or_default()),
        };

        let request_error = |error| FetchError::Request {
            url: request.url.clone(),
            error,
        };

        let response = builder.send().await.map_err(|err| {
            error!(url = %request.url, error = %err, "request failed");
            request_error(err)
        })?;

        let status = response.status();
        if !status.is_success() {
            error!(url = %request.url, status = status.as_u16(), "unexpected status");
            return Err(FetchError::Status {
                url: request.url.clone(),
                status: status.as_u16(),
            });
        }

        let url = response.url().to_string();
        let body = response.text().await.map_err(request_error)?;

        Ok(FetchResponse {
            url,
            status: status.as_u16(),
            body,
        })
    }
}
