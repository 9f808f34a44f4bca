use crate::{UrlError, UrlResult};
use url::Url;

/// Resolves an item href against the page it was found on
///
/// Returns None for empty hrefs, fragments and anything that does not end up
/// as an http(s) URL.
pub fn resolve_item_href(href: &str, page_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:") || href.starts_with("mailto:") || href.starts_with("data:")
    {
        return None;
    }

    let resolved = page_url.join(href).ok()?;
    match resolved.scheme() {
        "http" | "https" => Some(resolved),
        _ => None,
    }
}

/// Extracts the item identifier, the last non-empty path segment of its URL
///
/// # Examples
///
/// ```
/// use magnet_trawl::url::item_id_from_url;
/// use url::Url;
///
/// let url = Url::parse("http://example.com/ABC-123").unwrap();
/// assert_eq!(item_id_from_url(&url).unwrap(), "ABC-123");
/// ```
pub fn item_id_from_url(url: &Url) -> UrlResult<String> {
    url.path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .map(|segment| {
            urlencoding::decode(segment)
                .map(|decoded| decoded.into_owned())
                .unwrap_or_else(|_| segment.to_string())
        })
        .filter(|id| is_safe_identifier(id))
        .ok_or_else(|| UrlError::MissingIdentifier(url.to_string()))
}

/// Identifiers become directory and file names
fn is_safe_identifier(id: &str) -> bool {
    !id.is_empty() && id != "." && id != ".." && !id.contains(['/', '\\'])
}

/// File extension of the last path segment, lowercased
pub fn extension_from_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let last = parsed.path_segments()?.filter(|s| !s.is_empty()).last()?;
    let (_, ext) = last.rsplit_once('.')?;
    if ext.is_empty() || ext.len() > 5 || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}
