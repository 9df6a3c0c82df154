//! URL handling module
//!
//! This module provides the scheme defaulting applied to catalog seeds and
//! the normalization used to key the visited set.

mod normalize;

pub use normalize::{normalize_url, visit_key};

/// Prepends `http://` to URLs that do not start with `http`
///
/// Catalogs frequently list bare host names such as `www.ente.it/l190.xml`.
///
/// # Examples
///
/// ```
/// use l190_crawler::url::with_default_scheme;
///
/// assert_eq!(with_default_scheme("ente.it/a.xml"), "http://ente.it/a.xml");
/// assert_eq!(with_default_scheme("https://ente.it"), "https://ente.it");
/// ```
pub fn with_default_scheme(url: &str) -> String {
    if url.starts_with("http") {
        url.to_string()
    } else {
        format!("http://{}", url)
    }
}
