//! Driving a site's search form
//!
//! A search runs in explicit steps, each taking the state produced by the
//! one before:
//!
//! 1. [`SearchSession::load_context`] fetches the site page,
//! 2. [`SearchSession::locate_form_elements`] finds the input and its form,
//! 3. [`SearchFormState::set_search_value`] fills the input,
//! 4. [`SearchSession::build_request`] serializes the form into a request.
//!
//! [`SearchSession::search`] chains all of them, submits the request and
//! extracts the first page of results.

use std::{rc::Rc, sync::Arc};

use tracing::{debug, info, warn};

use crate::{
    ConfigError, Document, DocumentFetcher, FetchRequest, Method, NodeHandle, PageTraversal, Query,
    QueryDocument, RecordExtractor, RecordPage, SearchError, SearchForm, SiteConfig, UrlResolver,
};

/// Located search input and form, ready to be filled and submitted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchFormState {
    input: NodeHandle,
    form: SearchForm,
    base_url: String,
    value: String,
}

impl SearchFormState {
    /// The search input element
    pub fn input(&self) -> &NodeHandle {
        &self.input
    }

    /// The enclosing form
    pub fn form(&self) -> &SearchForm {
        &self.form
    }

    /// The enclosing form, for adjusting method or action before submission
    pub fn form_mut(&mut self) -> &mut SearchForm {
        &mut self.form
    }

    /// URL of the page the form was found on
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Value that will be searched for
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Put the search value into the input field
    pub fn set_search_value(&mut self, value: &str) -> &mut Self {
        if !self.form.set_value(self.input.position(), value) {
            warn!(
                element = self.input.name(),
                "search input is not a fillable control of its form"
            );
        }
        self.value = value.to_string();
        self
    }
}

/// Runs searches against one configured site
pub struct SearchSession {
    config: SiteConfig,
    extractor: Arc<RecordExtractor>,
    fetcher: Arc<dyn DocumentFetcher>,
    context: Option<Rc<Document>>,
}

impl SearchSession {
    /// Create a session after validating the configuration
    pub fn new(config: SiteConfig, fetcher: Arc<dyn DocumentFetcher>) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            extractor: Arc::new(config.extractor()),
            config,
            fetcher,
            context: None,
        })
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    /// The document returned by the last search, if any
    pub fn context(&self) -> Option<&Document> {
        self.context.as_deref()
    }

    /// Fetch the configured site page
    pub async fn load_context(&self) -> Result<Document, SearchError> {
        debug!(url = %self.config.base_url, "loading search page");
        Ok(self
            .fetcher
            .fetch_document(&FetchRequest::get(self.config.base_url.clone()))
            .await?)
    }

    /// Find the search input and its enclosing form in `document`
    pub fn locate_form_elements<D: QueryDocument + ?Sized>(
        &self,
        document: &D,
    ) -> Result<SearchFormState, SearchError> {
        let query = self
            .config
            .search_input
            .as_deref()
            .ok_or(SearchError::NoSearchInput)?;

        let parsed = Query::parse(query).map_err(|error| SearchError::Query {
            query: query.to_string(),
            error,
        })?;
        let input = document
            .select(&parsed)
            .map_err(|error| SearchError::Query {
                query: query.to_string(),
                error,
            })?
            .into_iter()
            .next()
            .ok_or_else(|| SearchError::InputNotFound {
                query: query.to_string(),
            })?;

        let form = document
            .closest(&input, "form")
            .and_then(|node| SearchForm::from_node(document, &node))
            .ok_or_else(|| SearchError::FormNotFound {
                query: query.to_string(),
            })?;

        Ok(SearchFormState {
            value: form.value(input.position()).unwrap_or_default().to_string(),
            input,
            form,
            base_url: self.config.base_url.clone(),
        })
    }

    /// Build the search request
    ///
    /// With a search-input query the located form is submitted: its action is
    /// resolved against the site URL, GET forms carry the serialized form as
    /// query string and POST forms as body. A protocol-relative target takes
    /// the site's scheme. Without a search-input query the value is simply
    /// appended to the site URL.
    pub fn build_request(
        &self,
        state: Option<&SearchFormState>,
        value: &str,
    ) -> Result<FetchRequest, SearchError> {
        if self.config.search_input.is_none() {
            return Ok(FetchRequest::get(format!(
                "{}{}",
                self.config.base_url, value
            )));
        }

        let state = state.ok_or(SearchError::MissingFormState)?;
        let form = state.form();
        let target = UrlResolver::resolve(form.action(), state.base_url());
        let serialized = form.serialize();

        let request = match form.method() {
            Method::Get => FetchRequest::get(UrlResolver::with_scheme_of(
                &format!("{target}?{serialized}"),
                state.base_url(),
            )),
            Method::Post => FetchRequest::post(
                UrlResolver::with_scheme_of(&target, state.base_url()),
                serialized,
            ),
        };
        Ok(request)
    }

    /// Search for `value` and return the first page of results
    ///
    /// The response document becomes the session's [`context`](Self::context).
    pub async fn search(&mut self, value: &str) -> Result<RecordPage, SearchError> {
        let request = if self.config.search_input.is_some() {
            let document = self.load_context().await?;
            let mut state = self.locate_form_elements(&document)?;
            state.set_search_value(value);
            self.build_request(Some(&state), value)?
        } else {
            self.build_request(None, value)?
        };

        info!(url = %request.url, method = %request.method, "submitting search");
        let response = Rc::new(self.fetcher.fetch_document(&request).await?);

        let page = RecordPage::new(
            response.clone(),
            self.extractor.clone(),
            self.fetcher.clone(),
            self.config.pagination().map(PageTraversal::new),
        );
        debug!(records = page.len(), "search results extracted");

        self.context = Some(response);
        Ok(page)
    }
}
