//! HTML parsing for catalog, detail and resolver pages
//!
//! This module extracts:
//! - Item links from catalog pages (`a.movie-box`)
//! - Item metadata (gid, uc, cover image) from detail page scripts
//! - The magnet link from the resolver response, HD preferred

use crate::url::{item_id_from_url, resolve_item_href};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use thiserror::Error;
use url::Url;

const ITEM_SELECTOR: &str = "a.movie-box[href]";
const HD_MARKER_SELECTOR: &str = r#"[title="包含高清HD的磁力連結"]"#;
const STANDARD_ANCHOR_SELECTOR: &str = r#"a[title="滑鼠右鍵點擊並選擇【複製連結網址】"][href]"#;

static GID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bgid\s*=\s*(\d+)").expect("valid gid pattern"));
static UC_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\buc\s*=\s*(\d+)").expect("valid uc pattern"));
static IMG_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\bimg\s*=\s*['"](https?://[^'"\s]+)['"]"#).expect("valid img pattern")
});

/// An item found on a catalog page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemLink {
    /// Item identifier, the last path segment of the detail URL
    pub id: String,
    /// Absolute detail page URL
    pub url: Url,
}

/// Fields needed to call the magnet resolver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemMetadata {
    pub gid: String,
    pub img: String,
    pub uc: String,
    pub lang: String,
}

/// A detail page lacked one of the required fields
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Missing {0} in detail page")]
pub struct MetadataError(pub &'static str);

/// Magnet link picked from the resolver response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMagnet {
    pub url: String,
    /// True when the link came from the high-definition anchor
    pub hd: bool,
}

/// Extracts item links from a catalog page in document order
///
/// Links that cannot be resolved to an http(s) URL with an identifier are
/// skipped. When `limit` is set, only the first `limit` links are returned.
///
/// # Example
///
/// ```
/// use magnet_trawl::crawler::extract_item_links;
/// use url::Url;
///
/// let html = r#"<a class="movie-box" href="/ABC-001">1</a><a class="movie-box" href="/ABC-002">2</a>"#;
/// let page = Url::parse("http://example.com/").unwrap();
/// let links = extract_item_links(html, &page, Some(1));
/// assert_eq!(links.len(), 1);
/// assert_eq!(links[0].id, "ABC-001");
/// ```
pub fn extract_item_links(html: &str, page_url: &Url, limit: Option<usize>) -> Vec<ItemLink> {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse(ITEM_SELECTOR) else {
        return Vec::new();
    };

    let links = document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| {
            let url = resolve_item_href(href, page_url)?;
            match item_id_from_url(&url) {
                Ok(id) => Some(ItemLink { id, url }),
                Err(e) => {
                    tracing::debug!("Skipping item link {}: {}", href, e);
                    None
                }
            }
        });

    match limit {
        Some(limit) => links.take(limit).collect(),
        None => links.collect(),
    }
}

/// Parses the resolver parameters out of a detail page
///
/// The values live in an inline script as `gid = 123`, `uc = 0` and
/// `img = 'http://...'`. `lang` is supplied by configuration. All four must be
/// present and non-empty.
///
/// Each script is searched on its own and the first one carrying all three
/// fields wins. When none does, the error names the field missing from the
/// first script that declares a `gid`.
pub fn parse_item_metadata(html: &str, lang: &str) -> Result<ItemMetadata, MetadataError> {
    let document = Html::parse_document(html);
    let scripts: Vec<String> = match Selector::parse("script") {
        Ok(selector) => document
            .select(&selector)
            .map(|element| element.text().collect::<String>())
            .collect(),
        Err(_) => Vec::new(),
    };

    let mut first_error = None;
    let mut fields = None;
    for script in &scripts {
        match script_fields(script) {
            Ok(found) => {
                fields = Some(found);
                break;
            }
            Err(MetadataError("gid")) => {}
            Err(e) => {
                first_error.get_or_insert(e);
            }
        }
    }

    let (gid, uc, img) = match fields {
        Some(found) => found,
        None => return Err(first_error.unwrap_or(MetadataError("gid"))),
    };

    let lang = lang.trim();
    if lang.is_empty() {
        return Err(MetadataError("lang"));
    }

    Ok(ItemMetadata {
        gid,
        img,
        uc,
        lang: lang.to_string(),
    })
}

/// Captures gid, uc and img from a single script body
fn script_fields(script: &str) -> Result<(String, String, String), MetadataError> {
    let capture = |pattern: &Regex, field: &'static str| {
        pattern
            .captures(script)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .filter(|value| !value.is_empty())
            .ok_or(MetadataError(field))
    };

    let gid = capture(&GID_PATTERN, "gid")?;
    let uc = capture(&UC_PATTERN, "uc")?;
    let img = capture(&IMG_PATTERN, "img")?;
    Ok((gid, uc, img))
}

/// Picks the magnet link out of the resolver response
///
/// The HD anchor wins over the standard one when both are present. Returns
/// None when neither exists, which is a valid answer for items without
/// magnets.
pub fn parse_magnet(html: &str) -> Option<ResolvedMagnet> {
    let document = Html::parse_fragment(html);

    let hd = Selector::parse(HD_MARKER_SELECTOR).ok().and_then(|selector| {
        document
            .select(&selector)
            .find_map(hd_marker_href)
    });
    if let Some(url) = hd {
        return Some(ResolvedMagnet { url, hd: true });
    }

    let standard = Selector::parse(STANDARD_ANCHOR_SELECTOR)
        .ok()
        .and_then(|selector| {
            document
                .select(&selector)
                .filter_map(|element| element.value().attr("href"))
                .map(str::trim)
                .find(|href| !href.is_empty())
                .map(str::to_string)
        });

    standard.map(|url| ResolvedMagnet { url, hd: false })
}

/// The HD marker sits inside the link it labels; the enclosing anchor's href
/// is preferred over the marker's own.
fn hd_marker_href(marker: ElementRef<'_>) -> Option<String> {
    let enclosing = marker
        .ancestors()
        .filter_map(ElementRef::wrap)
        .filter(|element| element.value().name() == "a")
        .find_map(|element| non_empty_href(&element));

    enclosing.or_else(|| non_empty_href(&marker))
}

fn non_empty_href(element: &ElementRef<'_>) -> Option<String> {
    element
        .value()
        .attr("href")
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .map(str::to_string)
}
