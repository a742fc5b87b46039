use crate::UrlError;
use url::Url;

/// Query parameters that never change which posting a URL points at
const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "fbclid",
    "gclid",
    "ref",
    "s",
    "searchId",
    "sortBy",
];

/// Resolves a raw href found in a page against the site root
///
/// Handles absolute, root-relative, path-relative and protocol-relative
/// (`//host/path`) hrefs. Protocol-relative hrefs take the base's scheme.
pub fn resolve_href(base: &Url, raw_href: &str) -> Result<Url, UrlError> {
    let href = raw_href.trim();
    if href.is_empty() {
        return Err(UrlError::Malformed("empty href".to_string()));
    }

    base.join(href).map_err(|e| UrlError::Parse(e.to_string()))
}

/// Normalizes a URL so that equivalent spellings compare equal
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed or not http(s)
/// 2. Lowercase the host and remove a `www.` prefix
/// 3. Remove dot segments, repeated slashes and the trailing slash
///    (except for the root `/`)
/// 4. Remove the fragment
/// 5. Remove tracking query parameters and sort the rest
///
/// The scheme is kept; callers that need scheme-insensitive keys
/// use `canonical_key`.
///
/// # Examples
///
/// ```
/// use job_miner::url::normalize_url;
///
/// let url = normalize_url("https://WWW.THEPROTOCOL.IT/praca/x/").unwrap();
/// assert_eq!(url.as_str(), "https://theprotocol.it/praca/x");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;
    normalize_parsed(url)
}

/// Same as `normalize_url` for an already parsed URL
pub fn normalize_parsed(mut url: Url) -> Result<Url, UrlError> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    let host = url.host_str().ok_or(UrlError::MissingDomain)?.to_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host).to_string();
    url.set_host(Some(&host))
        .map_err(|e| UrlError::Malformed(format!("Failed to set host: {}", e)))?;

    let normalized_path = normalize_path(url.path());
    url.set_path(&normalized_path);

    url.set_fragment(None);

    if url.query().is_some() {
        let params = filter_and_sort_query_params(&url);
        if params.is_empty() {
            url.set_query(None);
        } else {
            let query_string = params
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join("&");
            url.set_query(Some(&query_string));
        }
    }

    Ok(url)
}

/// Scheme-insensitive comparison key for a normalized URL
///
/// `http://` and `https://` spellings of the same page map to the same key.
pub fn canonical_key(url: &Url) -> String {
    let mut url = url.clone();
    if url.scheme() == "http" {
        // Both schemes are "special" in the URL standard, so this cannot fail.
        let _ = url.set_scheme("https");
    }
    url.to_string()
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

    format!("/{}", segments.join("/"))
}

/// Filters out tracking parameters and sorts remaining query parameters
fn filter_and_sort_query_params(url: &Url) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !is_tracking_param(key))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    params.sort_by(|a, b| a.0.cmp(&b.0));
    params
}

/// Checks if a query parameter is a tracking parameter
fn is_tracking_param(key: &str) -> bool {
    TRACKING_PARAMS.contains(&key) || key.starts_with("utm_")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://theprotocol.it/filtry/big-data-science").unwrap()
    }

    #[test]
    fn test_remove_www_and_lowercase_host() {
        let result = normalize_url("https://WWW.TheProtocol.it/Praca").unwrap();
        assert_eq!(result.as_str(), "https://theprotocol.it/Praca");
    }

    #[test]
    fn test_remove_trailing_slash() {
        let result = normalize_url("https://theprotocol.it/praca/").unwrap();
        assert_eq!(result.as_str(), "https://theprotocol.it/praca");
    }

    #[test]
    fn test_keep_root_slash() {
        let result = normalize_url("https://theprotocol.it").unwrap();
        assert_eq!(result.as_str(), "https://theprotocol.it/");
    }

    #[test]
    fn test_remove_fragment_and_tracking_params() {
        let result =
            normalize_url("https://theprotocol.it/praca?utm_source=x&s=123&b=2&a=1#top").unwrap();
        assert_eq!(result.as_str(), "https://theprotocol.it/praca?a=1&b=2");
    }

    #[test]
    fn test_dot_segments_and_repeated_slashes() {
        let result = normalize_url("https://theprotocol.it//a/../b/./c//").unwrap();
        assert_eq!(result.as_str(), "https://theprotocol.it/b/c");
    }

    #[test]
    fn test_invalid_scheme() {
        let result = normalize_url("ftp://theprotocol.it/praca");
        assert!(matches!(result, Err(UrlError::InvalidScheme(_))));
    }

    #[test]
    fn test_malformed_url() {
        assert!(matches!(normalize_url("not a url"), Err(UrlError::Parse(_))));
    }

    #[test]
    fn test_resolve_relative_and_protocol_relative() {
        let root = resolve_href(&base(), "/szczegoly/praca/x").unwrap();
        assert_eq!(root.as_str(), "https://theprotocol.it/szczegoly/praca/x");

        let proto = resolve_href(&base(), "//theprotocol.it/szczegoly/praca/x").unwrap();
        assert_eq!(proto.as_str(), "https://theprotocol.it/szczegoly/praca/x");
    }

    #[test]
    fn test_resolve_empty_href() {
        assert!(resolve_href(&base(), "   ").is_err());
    }

    #[test]
    fn test_canonical_key_ignores_scheme() {
        let http = normalize_url("http://theprotocol.it/praca").unwrap();
        let https = normalize_url("https://theprotocol.it/praca").unwrap();
        assert_eq!(canonical_key(&http), canonical_key(&https));
    }
}
