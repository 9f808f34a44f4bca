//! Shared fixtures for the integration tests

use magnet_trawl::config::Config;
use std::path::Path;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const COVER_BYTES: &[u8] = b"\xff\xd8\xff\xe0fake-jpeg-body";

/// Creates a test configuration pointed at a mock server
pub fn create_test_config(base_url: &str, output: &Path) -> Config {
    let mut config = Config::default();
    config.site.base_url = base_url.to_string();
    config.output.directory = output.to_string_lossy().into_owned();
    config.crawler.parallel = 2;
    config.crawler.timeout_ms = 5_000;
    config.crawler.page_attempts = 3;
    config
}

/// A catalog page listing the given item ids
pub fn listing_page(ids: &[&str]) -> String {
    let boxes: String = ids
        .iter()
        .map(|id| format!(r#"<a class="movie-box" href="/{0}"><span>{0}</span></a>"#, id))
        .collect();
    format!(
        r#"<html><body><div id="waterfall">{}</div></body></html>"#,
        boxes
    )
}

/// A detail page carrying the resolver parameters
pub fn detail_page(gid: &str, cover_url: &str) -> String {
    format!(
        r#"<html><head><script type="text/javascript">
        var gid = {};
        var uc = 0;
        var img = '{}';
        </script></head><body><h3>detail</h3></body></html>"#,
        gid, cover_url
    )
}

/// A resolver answer with a standard magnet and optionally an HD one
pub fn resolver_body(standard: &str, hd: Option<&str>) -> String {
    let mut rows = String::new();
    if let Some(hd) = hd {
        rows.push_str(&format!(
            r#"<tr><td><a href="{}">HD file <span class="btn" title="包含高清HD的磁力連結">HD</span></a></td></tr>"#,
            hd
        ));
    }
    rows.push_str(&format!(
        r#"<tr><td><a title="滑鼠右鍵點擊並選擇【複製連結網址】" href="{}">file</a></td></tr>"#,
        standard
    ));
    format!("<table>{}</table>", rows)
}

pub fn magnet_for(id: &str) -> String {
    format!("magnet:?xt=urn:btih:{}", id.to_lowercase().replace('-', ""))
}

/// Mounts detail page, resolver answer and cover image for one item
pub async fn mount_item(server: &MockServer, id: &str, gid: &str) {
    let cover_url = format!("{}/covers/{}.jpg", server.uri(), id);

    Mock::given(method("GET"))
        .and(path(format!("/{}", id)))
        .respond_with(ResponseTemplate::new(200).set_body_string(detail_page(gid, &cover_url)))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/ajax/resolve"))
        .and(query_param("gid", gid))
        .respond_with(ResponseTemplate::new(200).set_body_string(resolver_body(&magnet_for(id), None)))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/covers/{}.jpg", id)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(COVER_BYTES)
                .insert_header("content-type", "image/jpeg"),
        )
        .mount(server)
        .await;
}

/// Mounts a catalog page at `route`
pub async fn mount_listing(server: &MockServer, route: &str, ids: &[&str]) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(ids)))
        .mount(server)
        .await;
}

/// Mounts the 404 that ends pagination, expected exactly once
pub async fn mount_end_of_pages(server: &MockServer, route: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(server)
        .await;
}

/// Reads the magnet record written for an item
pub fn read_record(output: &Path, id: &str) -> String {
    std::fs::read_to_string(output.join(id).join(format!("{}.txt", id)))
        .expect("Failed to read magnet record")
}
