mod common;

use std::sync::Arc;

use common::*;
use listmapper::*;
use pretty_assertions::assert_eq;

const GET_FORM_PAGE: &str = r#"
<html><body>
  <form action="/s" method="get">
    <input type="hidden" name="lang" value="en">
    <input class="nav-search" type="text" name="q" placeholder="Search">
    <input type="submit" value="Go">
  </form>
</body></html>
"#;

const POST_FORM_PAGE: &str = r#"
<form action="/search" method="POST">
  <input class="nav-search" name="q">
</form>
"#;

const PROTOCOL_RELATIVE_FORM_PAGE: &str = r#"
<form action="//search.site.com/find">
  <input class="nav-search" name="q">
</form>
"#;

fn search_config() -> SiteConfig {
    listing_config().search_input("input.nav-search")
}

#[tokio::test]
async fn test_get_form_search_end_to_end() {
    let fetcher = listing_fetcher()
        .page(BASE_URL, GET_FORM_PAGE)
        .page("https://site.com/s?q=desk%20lamp&lang=en", LISTING_PAGE_1)
        .shared();
    let mut session = SearchSession::new(search_config(), fetcher.clone()).unwrap();

    let page = session.search("desk lamp").await.unwrap();

    assert_eq!(page.len(), 3);
    assert_eq!(page.page_number(), 1);
    assert_eq!(page.get(2).and_then(|r| r.text("title")), Some("Wall lamp"));
    assert_eq!(
        session.context().map(Document::url),
        Some("https://site.com/s?q=desk%20lamp&lang=en")
    );

    let second = page.next_page().await.unwrap().unwrap();
    assert_eq!(second.page_number(), 2);
    assert_eq!(second.url(), "https://site.com/page/2");

    let requests = fetcher.requests();
    assert_eq!(requests.len(), 3);
    assert_eq!(requests[0], FetchRequest::get(BASE_URL));
    assert_eq!(requests[1].method, Method::Get);
    assert_eq!(requests[1].body, None);
}

#[tokio::test]
async fn test_post_form_sends_body() {
    let fetcher = MemoryFetcher::new()
        .page(BASE_URL, POST_FORM_PAGE)
        .page("https://site.com/search", LISTING_PAGE_3)
        .shared();
    let mut session = SearchSession::new(search_config(), fetcher.clone()).unwrap();

    let page = session.search("night lamp").await.unwrap();
    assert_eq!(
        page.get(0).and_then(|r| r.text("title")),
        Some("Night lamp")
    );

    let requests = fetcher.requests();
    assert_eq!(
        requests[1],
        FetchRequest::post("https://site.com/search", "q=night%20lamp")
    );
}

#[tokio::test]
async fn test_protocol_relative_action_takes_page_scheme() {
    let fetcher = MemoryFetcher::new()
        .page(BASE_URL, PROTOCOL_RELATIVE_FORM_PAGE)
        .page("https://search.site.com/find?q=lamp", LISTING_PAGE_3)
        .shared();
    let mut session = SearchSession::new(search_config(), fetcher.clone()).unwrap();

    session.search("lamp").await.unwrap();
    assert_eq!(
        fetcher.requests()[1].url,
        "https://search.site.com/find?q=lamp"
    );
}

#[tokio::test]
async fn test_search_without_form_appends_value() {
    let config = SiteConfig::new("https://site.com/search?q=")
        .attribute("title", "span.title");
    let fetcher = MemoryFetcher::new()
        .page("https://site.com/search?q=lamp", LISTING_PAGE_1)
        .shared();
    let mut session = SearchSession::new(config, fetcher.clone()).unwrap();

    let page = session.search("lamp").await.unwrap();
    assert_eq!(page.len(), 3);
    assert_eq!(fetcher.fetch_count(), 1);
    assert!(page.next_page().await.unwrap().is_none());
}

#[tokio::test]
async fn test_step_by_step_search() {
    let fetcher = MemoryFetcher::new().page(BASE_URL, GET_FORM_PAGE).shared();
    let session = SearchSession::new(search_config(), fetcher).unwrap();

    let document = session.load_context().await.unwrap();
    let mut state = session.locate_form_elements(&document).unwrap();
    assert_eq!(state.input().attr("name"), Some("q"));
    assert_eq!(state.form().action(), "/s");
    assert_eq!(state.value(), "");

    state.set_search_value("a&b");
    state.form_mut().set_method(Method::Post);

    let request = session.build_request(Some(&state), "a&b").unwrap();
    assert_eq!(
        request,
        FetchRequest::post("https://site.com/s", "q=a%26b&lang=en")
    );
}

#[tokio::test]
async fn test_input_outside_form() {
    let fetcher = MemoryFetcher::new()
        .page(
            BASE_URL,
            r#"<div><input class="nav-search" name="q"></div>"#,
        )
        .shared();
    let mut session = SearchSession::new(search_config(), fetcher.clone()).unwrap();

    match session.search("lamp").await {
        Err(SearchError::FormNotFound { query }) => assert_eq!(query, "input.nav-search"),
        other => panic!("Expected FormNotFound, got {other:?}"),
    }
    assert_eq!(fetcher.fetch_count(), 1);
    assert!(session.context().is_none());
}

#[tokio::test]
async fn test_missing_input() {
    let fetcher = MemoryFetcher::new()
        .page(BASE_URL, "<form></form>")
        .shared();
    let mut session = SearchSession::new(search_config(), fetcher).unwrap();

    assert!(matches!(
        session.search("lamp").await,
        Err(SearchError::InputNotFound { .. })
    ));
}

#[tokio::test]
async fn test_unreachable_site() {
    let fetcher: Arc<dyn DocumentFetcher> = MemoryFetcher::new().shared();
    let mut session = SearchSession::new(search_config(), fetcher).unwrap();

    assert!(matches!(
        session.search("lamp").await,
        Err(SearchError::Fetch(FetchError::NotFound { .. }))
    ));
}

#[test]
fn test_form_request_needs_form_state() {
    let session = SearchSession::new(search_config(), MemoryFetcher::new().shared()).unwrap();
    assert!(matches!(
        session.build_request(None, "lamp"),
        Err(SearchError::MissingFormState)
    ));
}

#[test]
fn test_form_lookup_needs_search_input() {
    let session = SearchSession::new(listing_config(), MemoryFetcher::new().shared()).unwrap();
    let document = Document::parse(BASE_URL, GET_FORM_PAGE);
    assert!(matches!(
        session.locate_form_elements(&document),
        Err(SearchError::NoSearchInput)
    ));
}

#[test]
fn test_invalid_config_is_rejected() {
    let result = SearchSession::new(SiteConfig::new(BASE_URL), MemoryFetcher::new().shared());
    assert!(matches!(result, Err(ConfigError::NoAttributes)));
}
