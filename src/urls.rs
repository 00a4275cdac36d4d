//! Resolution of routes found in documents into fetchable URLs
//!
//! This is not RFC 3986 reference resolution. A route is
//! appended to a base derived from the known URL, where the base is the known
//! URL with the route stripped off its end when the route is already its
//! suffix. `../`, query strings and fragments get no special treatment.

use tracing::warn;

/// Utility for resolving routes against a known URL
pub struct UrlResolver;

impl UrlResolver {
    /// Whether a route already names a host
    pub fn is_absolute(route: &str) -> bool {
        route.starts_with("http://") || route.starts_with("https://") || route.starts_with("//")
    }

    /// Base URL to prepend to `route`
    ///
    /// Starting at the last occurrence of `route` in `url` (or at 0 when it
    /// does not occur), the bytes of `url` are compared with those of `route`.
    /// When the comparison runs to the end of `url`, the base is `url` cut at
    /// the starting point; otherwise it is `url` unchanged.
    pub fn base_url<'a>(route: &str, url: &'a str) -> &'a str {
        let start = url.rfind(route).unwrap_or(0);
        let url_bytes = url.as_bytes();
        let route_bytes = route.as_bytes();

        let mut i = start;
        while i < url_bytes.len() && route_bytes.get(i - start) == Some(&url_bytes[i]) {
            i += 1;
        }

        if i == url_bytes.len() {
            &url[..start]
        } else {
            url
        }
    }

    /// Resolve a route against a known URL
    ///
    /// # Examples
    ///
    /// ```ignore
    /// use listmapper::UrlResolver;
    ///
    /// assert_eq!(UrlResolver::resolve("/a/b", "https://site.com/a/b"), "https://site.com/a/b");
    /// assert_eq!(UrlResolver::resolve("/page/2", "https://site.com"), "https://site.com/page/2");
    /// assert_eq!(UrlResolver::resolve("//cdn.site.com/x", "https://site.com"), "//cdn.site.com/x");
    /// ```
    pub fn resolve(route: &str, url: &str) -> String {
        if Self::is_absolute(route) {
            return route.to_string();
        }
        format!("{}{}", Self::base_url(route, url), route)
    }

    /// Give a protocol-relative URL (`//host/...`) the scheme of `page_url`
    ///
    /// Other URLs are returned unchanged, as is everything when `page_url`
    /// has no parsable scheme.
    pub fn with_scheme_of(target: &str, page_url: &str) -> String {
        if !target.starts_with("//") || target.contains("://") {
            return target.to_string();
        }

        match url::Url::parse(page_url) {
            Ok(page) => format!("{}:{}", page.scheme(), target),
            Err(err) => {
                warn!(
                    target,
                    page_url,
                    error = %err,
                    "cannot borrow scheme for protocol-relative URL"
                );
                target.to_string()
            }
        }
    }
}
