#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use listmapper::*;

/// In-memory fetcher serving canned HTML by URL
#[derive(Default)]
pub struct MemoryFetcher {
    pages: HashMap<String, String>,
    requests: Mutex<Vec<FetchRequest>>,
    fetches: AtomicUsize,
    failures_left: AtomicUsize,
    latency: Option<Duration>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }

    /// Delay every response, so concurrent callers overlap
    pub fn latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Fail the next `count` fetches with a 503
    pub fn failing(self, count: usize) -> Self {
        self.failures_left.store(count, Ordering::SeqCst);
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<FetchRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

#[async_trait::async_trait]
impl DocumentFetcher for MemoryFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, FetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());

        match self.latency {
            Some(latency) => tokio::time::sleep(latency).await,
            None => tokio::task::yield_now().await,
        }

        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if failing {
            return Err(FetchError::Status {
                url: request.url.clone(),
                status: 503,
            });
        }

        let body = self
            .pages
            .get(&request.url)
            .ok_or_else(|| FetchError::NotFound {
                url: request.url.clone(),
            })?;

        Ok(FetchResponse {
            url: request.url.clone(),
            status: 200,
            body: body.clone(),
        })
    }
}

pub const BASE_URL: &str = "https://site.com";

pub const LISTING_PAGE_1: &str = r#"
<html><body>
  <ol id="results">
    <li>
      <h2><span class="title">Desk lamp</span></h2>
      <span class="price">19.90</span>
      <a class="item-link" href="https://site.com/item/1">open</a>
      <img src="/img/1.jpg">
    </li>
    <li>
      <h2><span class="title">Floor lamp</span></h2>
      <span class="price">49.00</span>
      <a class="item-link" href="https://site.com/item/2">open</a>
      <img src="/img/2.jpg">
    </li>
    <li>
      <h2><span class="title">Wall lamp</span></h2>
      <span class="price">25.50</span>
      <a class="item-link" href="https://site.com/item/3">open</a>
      <img src="/img/3.jpg">
    </li>
  </ol>
  <ul class="pagination"><li class="pagination-next"><a href="/page/2">Next</a></li></ul>
</body></html>
"#;

pub const LISTING_PAGE_2: &str = r#"
<html><body>
  <ol id="results">
    <li>
      <h2><span class="title">Reading lamp</span></h2>
      <span class="price">12.00</span>
      <a class="item-link" href="https://site.com/item/4">open</a>
      <img src="/img/4.jpg">
    </li>
  </ol>
  <ul class="pagination"><li class="pagination-next"><a href="/page/3">Next</a></li></ul>
</body></html>
"#;

pub const LISTING_PAGE_3: &str = r#"
<html><body>
  <ol id="results">
    <li>
      <h2><span class="title">Night lamp</span></h2>
      <span class="price">8.75</span>
      <a class="item-link" href="https://site.com/item/5">open</a>
      <img src="/img/5.jpg">
    </li>
  </ol>
</body></html>
"#;

pub fn listing_config() -> SiteConfig {
    SiteConfig::new(BASE_URL)
        .attribute("title", "ol#results li h2 span.title")
        .attribute("price", "ol#results li span.price")
        .attribute("url", "ol#results li a.item-link @href")
        .attribute("img", "ol#results li img")
        .next_link("li.pagination-next a @href")
}

pub fn listing_fetcher() -> MemoryFetcher {
    MemoryFetcher::new()
        .page(BASE_URL, LISTING_PAGE_1)
        .page("https://site.com/page/2", LISTING_PAGE_2)
        .page("https://site.com/page/3", LISTING_PAGE_3)
}

/// First listing page built straight from a document
pub fn first_page(
    config: &SiteConfig,
    fetcher: Arc<dyn DocumentFetcher>,
    html: &str,
) -> RecordPage {
    RecordPage::new(
        std::rc::Rc::new(Document::parse(config.base_url.clone(), html)),
        Arc::new(config.extractor()),
        fetcher,
        config.pagination().map(PageTraversal::new),
    )
}
