//! Walking a chain of result pages
//!
//! [`PageWalker`] follows [`RecordPage::into_next_page`] from a first page
//! until the site runs out of pages, a page limit is reached, a fetch fails or
//! the walk is cancelled. Pages are fetched strictly one after another, and
//! only once the previous page has been handed over.
//!
//! # Examples
//!
//! ## Collecting every record
//!
//! ```ignore
//! use listmapper::{PageWalker, SearchSession};
//!
//! let first = session.search("lamp").await?;
//! let walker = PageWalker::builder()
//!     .max_pages(5)
//!     .rate_limit(2.0)  // 2 pages per second
//!     .build()?;
//!
//! let walk = walker.walk(first).await;
//! println!("{} records from {} pages", walk.records.len(), walk.stats.pages_visited);
//! ```
//!
//! ## Streaming page by page
//!
//! ```ignore
//! use futures_util::StreamExt;
//!
//! let mut pages = std::pin::pin!(walker.stream(first));
//! while let Some(records) = pages.next().await {
//!     for record in records? {
//!         println!("{:?}", record.text("title"));
//!     }
//! }
//! ```
//!
//! ## With Cancellation
//!
//! ```ignore
//! use tokio_util::sync::CancellationToken;
//!
//! let cancel_token = CancellationToken::new();
//! let walk = walker.walk_with_cancellation(first, cancel_token.clone()).await;
//! ```

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use futures_util::{Stream, stream};
use tokio::{
    sync::Mutex,
    time::{self, sleep},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::{ConfigError, Record, RecordPage, WalkError};

/// Trait for implementing rate limiting strategies
#[async_trait::async_trait]
pub trait RateLimiter: Send + Sync {
    /// Wait until a request is allowed under the rate limit
    async fn acquire(&self);
}

/// Token bucket rate limiter implementation
///
/// The bucket holds at least one token, so rates below one request per
/// second still let a request through every `1 / rate` seconds.
pub struct TokenBucketLimiter {
    state: Mutex<(f64, time::Instant)>,
    capacity: f64,
    refill_rate: f64, // tokens per second
}

impl TokenBucketLimiter {
    /// Create a new TokenBucketLimiter
    ///
    /// # Arguments
    /// * `requests_per_second` - Maximum number of requests allowed per second
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidRateLimit`] unless the rate is positive and finite.
    pub fn new(requests_per_second: f64) -> Result<Self, ConfigError> {
        validate_rate(requests_per_second)?;
        Ok(Self::with_rate(requests_per_second))
    }

    fn with_rate(requests_per_second: f64) -> Self {
        let capacity = requests_per_second.max(1.0);
        Self {
            state: Mutex::new((capacity, time::Instant::now())),
            capacity,
            refill_rate: requests_per_second,
        }
    }
}

fn validate_rate(requests_per_second: f64) -> Result<(), ConfigError> {
    if requests_per_second.is_finite() && requests_per_second > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidRateLimit(requests_per_second))
    }
}

#[async_trait::async_trait]
impl RateLimiter for TokenBucketLimiter {
    async fn acquire(&self) {
        loop {
            let wait_duration = {
                let mut state = self.state.lock().await;
                let (tokens, last_refill) = &mut *state;

                let now = time::Instant::now();
                let elapsed = now.duration_since(*last_refill).as_secs_f64();
                *tokens = (*tokens + elapsed * self.refill_rate).min(self.capacity);
                *last_refill = now;

                if *tokens >= 1.0 {
                    *tokens -= 1.0;
                    return;
                }

                let seconds_to_wait = (1.0 - *tokens) / self.refill_rate;
                Duration::from_secs_f64(seconds_to_wait.max(0.001))
            };

            sleep(wait_duration).await;
        }
    }
}

/// Fixed delay before every page fetch
pub struct DelayLimiter {
    delay: Duration,
}

impl DelayLimiter {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait::async_trait]
impl RateLimiter for DelayLimiter {
    async fn acquire(&self) {
        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }
    }
}

/// Configuration for rate limiting strategy
#[derive(Debug, Clone, PartialEq)]
pub enum RateLimiterConfig {
    /// Use a fixed delay between page fetches
    Delay(Duration),
    /// Use token bucket algorithm with requests per second
    TokenBucket { requests_per_second: f64 },
    /// No rate limiting
    None,
}

impl RateLimiterConfig {
    fn build(&self) -> Arc<dyn RateLimiter> {
        match self {
            RateLimiterConfig::Delay(delay) => Arc::new(DelayLimiter::new(*delay)),
            RateLimiterConfig::TokenBucket {
                requests_per_second,
            } => Arc::new(TokenBucketLimiter::with_rate(*requests_per_second)),
            RateLimiterConfig::None => Arc::new(DelayLimiter::new(Duration::ZERO)),
        }
    }
}

/// Validated configuration for the walker
#[derive(Debug, Clone, PartialEq)]
pub struct WalkerConfig {
    pub(crate) max_pages: Option<usize>,
    pub(crate) rate_limiter: RateLimiterConfig,
}

impl WalkerConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_pages == Some(0) {
            return Err(ConfigError::InvalidPageLimit(0));
        }
        if let RateLimiterConfig::TokenBucket {
            requests_per_second,
        } = self.rate_limiter
        {
            validate_rate(requests_per_second)?;
        }
        Ok(())
    }

    /// Page limit, the first page included
    pub fn max_pages(&self) -> Option<usize> {
        self.max_pages
    }

    /// Rate limiting strategy
    pub fn rate_limiter(&self) -> &RateLimiterConfig {
        &self.rate_limiter
    }

    fn limit_reached(&self, pages_visited: usize) -> bool {
        self.max_pages.is_some_and(|max| pages_visited >= max)
    }
}

/// What observers learn about a loaded page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSummary {
    pub page_number: usize,
    pub url: String,
    pub records: usize,
}

impl PageSummary {
    fn of(page: &RecordPage) -> Self {
        Self {
            page_number: page.page_number(),
            url: page.url().to_string(),
            records: page.len(),
        }
    }
}

/// Observer trait for receiving walk events
///
/// # Example
///
/// ```ignore
/// use listmapper::{PageObserver, PageSummary};
///
/// struct LoggingObserver;
///
/// #[async_trait::async_trait]
/// impl PageObserver for LoggingObserver {
///     async fn on_page_loaded(&self, page: &PageSummary) {
///         println!("page {}: {} records", page.page_number, page.records);
///     }
/// }
/// ```
#[async_trait::async_trait]
pub trait PageObserver: Send + Sync {
    /// Called for every page reached, the first one included
    async fn on_page_loaded(&self, _page: &PageSummary) {}

    /// Called when fetching the page after `_page_number` fails
    async fn on_page_error(&self, _page_number: usize, _error: &str) {}

    /// Called when the walk ends, for whatever reason
    async fn on_walk_complete(&self, _stats: &WalkStats) {}
}

/// Registry for managing multiple page observers
#[derive(Default)]
pub struct ObserverRegistry {
    observers: Vec<Arc<dyn PageObserver>>,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer to receive walk events
    pub fn register(&mut self, observer: Arc<dyn PageObserver>) {
        self.observers.push(observer);
    }

    pub async fn notify_page_loaded(&self, page: &PageSummary) {
        for observer in &self.observers {
            observer.on_page_loaded(page).await;
        }
    }

    pub async fn notify_page_error(&self, page_number: usize, error: &str) {
        for observer in &self.observers {
            observer.on_page_error(page_number, error).await;
        }
    }

    pub async fn notify_walk_complete(&self, stats: &WalkStats) {
        for observer in &self.observers {
            observer.on_walk_complete(stats).await;
        }
    }
}

/// Statistics collected during a walk
#[derive(Debug, Clone)]
pub struct WalkStats {
    /// Number of pages reached, the first one included
    pub pages_visited: usize,
    /// Number of records on those pages
    pub records_extracted: usize,
    /// Number of failed page fetches
    pub errors_encountered: usize,
    /// Whether the walk was stopped by its cancellation token
    pub cancelled: bool,
    /// When the walk started
    pub start_time: Instant,
    /// When these stats were last updated
    pub last_update: Instant,
}

impl WalkStats {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            pages_visited: 0,
            records_extracted: 0,
            errors_encountered: 0,
            cancelled: false,
            start_time: now,
            last_update: now,
        }
    }

    /// Get elapsed time since the walk started
    pub fn elapsed(&self) -> Duration {
        self.last_update.duration_since(self.start_time)
    }

    /// Calculate pages visited per second
    pub fn pages_per_second(&self) -> f64 {
        let elapsed = self.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.pages_visited as f64 / elapsed
        } else {
            0.0
        }
    }

    fn page_visited(&mut self, records: usize) {
        self.pages_visited += 1;
        self.records_extracted += records;
        self.last_update = Instant::now();
    }
}

impl Default for WalkStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of a walk: everything collected, plus why it stopped early if it did
#[derive(Debug)]
pub struct Walk {
    /// Records of every visited page, in page order
    pub records: Vec<Record>,
    /// Final statistics
    pub stats: WalkStats,
    /// The fetch failure that ended the walk, if any
    pub error: Option<WalkError>,
}

/// Sequential walker over result pages
pub struct PageWalker {
    config: WalkerConfig,
    observers: ObserverRegistry,
}

enum Step {
    Start(RecordPage),
    Advance(RecordPage, usize),
    Done,
}

impl PageWalker {
    /// Create a walker without page limit or rate limiting
    pub fn new() -> Self {
        Self {
            config: WalkerConfig {
                max_pages: None,
                rate_limiter: RateLimiterConfig::None,
            },
            observers: ObserverRegistry::new(),
        }
    }

    /// Create a walker builder for custom configuration
    pub fn builder() -> PageWalkerBuilder {
        PageWalkerBuilder::default()
    }

    pub fn config(&self) -> &WalkerConfig {
        &self.config
    }

    /// Walk from `first` until the pages run out or the limit is reached
    pub async fn walk(&self, first: RecordPage) -> Walk {
        self.walk_internal(first, None).await
    }

    /// Walk with cancellation support
    ///
    /// When the token is cancelled the pending fetch is abandoned and the
    /// records gathered so far are returned.
    pub async fn walk_with_cancellation(
        &self,
        first: RecordPage,
        cancel_token: CancellationToken,
    ) -> Walk {
        self.walk_internal(first, Some(cancel_token)).await
    }

    async fn walk_internal(
        &self,
        first: RecordPage,
        cancel_token: Option<CancellationToken>,
    ) -> Walk {
        let rate_limiter = self.config.rate_limiter.build();
        let mut stats = WalkStats::new();
        let mut records = Vec::new();
        let mut failure = None;
        let mut page = first;

        loop {
            let summary = PageSummary::of(&page);
            debug!(
                page = summary.page_number,
                url = %summary.url,
                records = summary.records,
                "page reached"
            );
            stats.page_visited(summary.records);
            self.observers.notify_page_loaded(&summary).await;
            records.extend(page.records().iter().cloned());

            if self.config.limit_reached(stats.pages_visited) {
                debug!(pages = stats.pages_visited, "page limit reached");
                break;
            }

            let page_number = page.page_number();
            let next = tokio::select! {
                biased;

                _ = async {
                    match &cancel_token {
                        Some(token) => token.cancelled().await,
                        None => std::future::pending::<()>().await,
                    }
                } => {
                    info!(page = page_number, "walk cancelled");
                    stats.cancelled = true;
                    break;
                }

                result = async {
                    rate_limiter.acquire().await;
                    page.into_next_page().await
                } => result,
            };

            match next {
                Ok(Some(next_page)) => page = next_page,
                Ok(None) => break,
                Err(err) => {
                    error!(page = page_number, error = %err, "failed to load next page");
                    stats.errors_encountered += 1;
                    self.observers
                        .notify_page_error(page_number, &err.to_string())
                        .await;
                    failure = Some(WalkError {
                        page_number,
                        error: err,
                    });
                    break;
                }
            }
        }

        stats.last_update = Instant::now();
        self.observers.notify_walk_complete(&stats).await;

        Walk {
            records,
            stats,
            error: failure,
        }
    }

    /// Stream each page's records, fetching the next page only when asked
    ///
    /// Observers are not notified by the stream. A failed fetch ends the
    /// stream after yielding the error.
    pub fn stream(
        &self,
        first: RecordPage,
    ) -> impl Stream<Item = Result<Vec<Record>, WalkError>> {
        let config = self.config.clone();
        let rate_limiter = self.config.rate_limiter.build();

        stream::unfold(Step::Start(first), move |step| {
            let config = config.clone();
            let rate_limiter = rate_limiter.clone();
            async move {
                match step {
                    Step::Start(page) => {
                        Some((Ok(page.records().to_vec()), Step::Advance(page, 1)))
                    }
                    Step::Advance(page, visited) => {
                        if config.limit_reached(visited) {
                            return None;
                        }
                        rate_limiter.acquire().await;
                        let page_number = page.page_number();
                        match page.into_next_page().await {
                            Ok(Some(next)) => Some((
                                Ok(next.records().to_vec()),
                                Step::Advance(next, visited + 1),
                            )),
                            Ok(None) => None,
                            Err(error) => Some((Err(WalkError { page_number, error }), Step::Done)),
                        }
                    }
                    Step::Done => None,
                }
            }
        })
    }
}

impl Default for PageWalker {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for configuring a PageWalker
#[derive(Default)]
pub struct PageWalkerBuilder {
    max_pages: Option<usize>,
    rate_limiter: Option<RateLimiterConfig>,
    observers: Vec<Arc<dyn PageObserver>>,
}

impl PageWalkerBuilder {
    /// Stop after this many pages, the first one included
    pub fn max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = Some(max_pages);
        self
    }

    /// Wait a fixed delay before every page fetch
    pub fn delay(mut self, delay: Duration) -> Self {
        self.rate_limiter = Some(RateLimiterConfig::Delay(delay));
        self
    }

    /// Limit page fetches with a token bucket
    ///
    /// # Arguments
    /// * `requests_per_second` - Maximum number of page fetches per second
    pub fn rate_limit(mut self, requests_per_second: f64) -> Self {
        self.rate_limiter = Some(RateLimiterConfig::TokenBucket {
            requests_per_second,
        });
        self
    }

    /// Register an observer to receive walk events
    pub fn observe_with(mut self, observer: Arc<dyn PageObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Build the PageWalker with the configured settings
    pub fn build(self) -> Result<PageWalker, ConfigError> {
        let config = WalkerConfig {
            max_pages: self.max_pages,
            rate_limiter: self.rate_limiter.unwrap_or(RateLimiterConfig::None),
        };
        config.validate()?;

        let mut observers = ObserverRegistry::new();
        for observer in self.observers {
            observers.register(observer);
        }

        Ok(PageWalker { config, observers })
    }
}
