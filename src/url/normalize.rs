use crate::UrlError;
use url::Url;

/// Normalizes a URL for identity comparison
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Accept only `http` and `https`
/// 3. Lowercase the host (done by the parser) and drop default ports
/// 4. Normalize path:
///    - Remove dot segments (. and ..) and empty segments
///    - Remove trailing slash (except for root /)
/// 5. Remove fragment
///
/// Scheme and query are kept: publishers serve different documents over
/// `http` and `https`, and query strings often select the document.
///
/// # Examples
///
/// ```
/// use l190_crawler::url::normalize_url;
///
/// let url = normalize_url("http://ENTE.example.IT:80/l190//2023/./indice.xml#top").unwrap();
/// assert_eq!(url.as_str(), "http://ente.example.it/l190/2023/indice.xml");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingHost);
    }

    let normalized_path = normalize_path(url.path());
    url.set_path(&normalized_path);
    url.set_fragment(None);

    Ok(url)
}

/// Key under which a URL is stored in the visited set
///
/// Falls back to the trimmed input when it cannot be normalized, so that an
/// unparseable link is still deduplicated against itself.
pub fn visit_key(url_str: &str) -> String {
    match normalize_url(url_str) {
        Ok(url) => url.into(),
        Err(_) => url_str.trim().to_string(),
    }
}

/// Normalizes a URL path by removing dot segments and trailing slashes
fn normalize_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }

    if segments.is_empty() {
        return "/".to_string();
    }

    format!("/{}", segments.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keeps_scheme() {
        let result = normalize_url("http://example.com/page").unwrap();
        assert_eq!(result.as_str(), "http://example.com/page");
    }

    #[test]
    fn test_lowercase_host_and_default_port() {
        let result = normalize_url("https://EXAMPLE.com:443/A.xml").unwrap();
        assert_eq!(result.as_str(), "https://example.com/A.xml");
    }

    #[test]
    fn test_remove_trailing_slash() {
        let result = normalize_url("https://example.com/page/").unwrap();
        assert_eq!(result.as_str(), "https://example.com/page");
    }

    #[test]
    fn test_root_path() {
        let result = normalize_url("https://example.com").unwrap();
        assert_eq!(result.as_str(), "https://example.com/");
    }

    #[test]
    fn test_remove_fragment_keep_query() {
        let result = normalize_url("https://example.com/get.php?id=7&anno=2023#x").unwrap();
        assert_eq!(result.as_str(), "https://example.com/get.php?id=7&anno=2023");
    }

    #[test]
    fn test_invalid_scheme() {
        assert!(matches!(
            normalize_url("ftp://example.com/a.xml"),
            Err(UrlError::InvalidScheme(_))
        ));
    }

    #[test]
    fn test_unparseable() {
        assert!(matches!(normalize_url("not a url"), Err(UrlError::Parse(_))));
    }

    #[test]
    fn test_visit_key() {
        assert_eq!(
            visit_key("http://Example.com/a/../b.xml"),
            "http://example.com/b.xml"
        );
        assert_eq!(visit_key("  garbage  "), "garbage");
        assert_eq!(visit_key("http://a.it/x.xml/"), visit_key("http://a.it/x.xml"));
    }
}
