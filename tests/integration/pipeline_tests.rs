//! Item pipeline tests against a mock site

use crate::common::*;
use magnet_trawl::crawler::{build_http_client, fetch_text, FetchOptions, ItemLink, ItemPipeline};
use magnet_trawl::state::{CoverStatus, ItemOutcome, ItemStage};
use std::time::Duration;
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn pipeline_for(server: &MockServer, output: &TempDir) -> ItemPipeline {
    let config = create_test_config(&server.uri(), output.path());
    let client = build_http_client("TestCrawler/1.0").expect("Failed to build client");
    ItemPipeline::new(client, &config).expect("Failed to build pipeline")
}

fn link(server: &MockServer, id: &str) -> ItemLink {
    ItemLink {
        id: id.to_string(),
        url: Url::parse(&format!("{}/{}", server.uri(), id)).expect("valid url"),
    }
}

#[tokio::test]
async fn test_hd_magnet_is_preferred() {
    let mock_server = MockServer::start().await;
    let output = TempDir::new().expect("Failed to create temp dir");
    let cover_url = format!("{}/covers/hd.jpg", mock_server.uri());

    Mock::given(method("GET"))
        .and(path("/HD-001"))
        .respond_with(ResponseTemplate::new(200).set_body_string(detail_page("42", &cover_url)))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ajax/resolve"))
        .respond_with(ResponseTemplate::new(200).set_body_string(resolver_body(
            "magnet:?xt=urn:btih:standard",
            Some("magnet:?xt=urn:btih:highdef"),
        )))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/covers/hd.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(COVER_BYTES))
        .mount(&mock_server)
        .await;

    let pipeline = pipeline_for(&mock_server, &output);
    let outcome = pipeline
        .process_item(link(&mock_server, "HD-001"))
        .await
        .expect("Pipeline failed");

    assert!(matches!(outcome, ItemOutcome::Saved { hd: true, .. }));
    assert_eq!(
        read_record(output.path(), "HD-001"),
        "magnet:?xt=urn:btih:highdef\r\n"
    );
}

#[tokio::test]
async fn test_resolver_request_parameters_and_referer() {
    let mock_server = MockServer::start().await;
    let output = TempDir::new().expect("Failed to create temp dir");

    mount_item(&mock_server, "ABC-001", "555").await;

    // Stricter matcher mounted with higher priority; verified on drop
    Mock::given(method("GET"))
        .and(path("/ajax/resolve"))
        .and(query_param("gid", "555"))
        .and(query_param("uc", "0"))
        .and(query_param("lang", "zh"))
        .and(query_param(
            "img",
            format!("{}/covers/ABC-001.jpg", mock_server.uri()).as_str(),
        ))
        .and(header("referer", mock_server.uri().as_str()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(resolver_body(&magnet_for("ABC-001"), None)),
        )
        .with_priority(1)
        .expect(1)
        .mount(&mock_server)
        .await;

    let pipeline = pipeline_for(&mock_server, &output);
    let outcome = pipeline
        .process_item(link(&mock_server, "ABC-001"))
        .await
        .expect("Pipeline failed");

    assert!(matches!(outcome, ItemOutcome::Saved { hd: false, .. }));
}

#[tokio::test]
async fn test_missing_metadata_skips_resolver_and_cover() {
    let mock_server = MockServer::start().await;
    let output = TempDir::new().expect("Failed to create temp dir");

    Mock::given(method("GET"))
        .and(path("/ABC-001"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<html><script>var gid = 12; var uc = 0;</script></html>",
        ))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ajax/resolve"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let pipeline = pipeline_for(&mock_server, &output);
    let outcome = pipeline
        .process_item(link(&mock_server, "ABC-001"))
        .await
        .expect("Pipeline failed");

    match outcome {
        ItemOutcome::Failed { stage, reason, .. } => {
            assert_eq!(stage, ItemStage::Metadata);
            assert!(reason.contains("img"));
        }
        other => panic!("Expected failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_no_magnet_is_not_a_failure() {
    let mock_server = MockServer::start().await;
    let output = TempDir::new().expect("Failed to create temp dir");
    let cover_url = format!("{}/covers/none.jpg", mock_server.uri());

    Mock::given(method("GET"))
        .and(path("/ABC-001"))
        .respond_with(ResponseTemplate::new(200).set_body_string(detail_page("9", &cover_url)))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ajax/resolve"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<table></table>"))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/covers/none.jpg"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let pipeline = pipeline_for(&mock_server, &output);
    let outcome = pipeline
        .process_item(link(&mock_server, "ABC-001"))
        .await
        .expect("Pipeline failed");

    assert_eq!(outcome.failure_count(), 0);
    assert!(matches!(outcome, ItemOutcome::NoMagnet { .. }));
    assert!(!output.path().join("ABC-001").exists());
}

#[tokio::test]
async fn test_cover_failure_keeps_magnet_record() {
    let mock_server = MockServer::start().await;
    let output = TempDir::new().expect("Failed to create temp dir");
    let cover_url = format!("{}/covers/missing.jpg", mock_server.uri());

    Mock::given(method("GET"))
        .and(path("/ABC-001"))
        .respond_with(ResponseTemplate::new(200).set_body_string(detail_page("9", &cover_url)))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ajax/resolve"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(resolver_body(&magnet_for("ABC-001"), None)),
        )
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/covers/missing.jpg"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let pipeline = pipeline_for(&mock_server, &output);
    let outcome = pipeline
        .process_item(link(&mock_server, "ABC-001"))
        .await
        .expect("Pipeline failed");

    match &outcome {
        ItemOutcome::Saved { cover, .. } => assert!(matches!(cover, CoverStatus::Failed(_))),
        other => panic!("Expected saved item, got {:?}", other),
    }
    assert_eq!(outcome.failure_count(), 1);
    assert_eq!(
        read_record(output.path(), "ABC-001"),
        format!("{}\r\n", magnet_for("ABC-001"))
    );
    assert!(!output.path().join("ABC-001").join("ABC-001.jpg").exists());
}

#[tokio::test]
async fn test_redirects_are_followed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/new"))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/new"))
        .respond_with(ResponseTemplate::new(200).set_body_string("moved here"))
        .mount(&mock_server)
        .await;

    let client = build_http_client("TestCrawler/1.0").expect("Failed to build client");
    let options = FetchOptions::new(Duration::from_secs(5), 3);
    let body = fetch_text(&client, &format!("{}/old", mock_server.uri()), &options)
        .await
        .expect("Fetch failed");

    assert_eq!(body, "moved here");
}

#[tokio::test]
async fn test_redirect_limit_is_enforced() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/loop"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/loop"))
        .mount(&mock_server)
        .await;

    let client = build_http_client("TestCrawler/1.0").expect("Failed to build client");
    let options = FetchOptions::new(Duration::from_secs(5), 2);
    let error = fetch_text(&client, &format!("{}/loop", mock_server.uri()), &options)
        .await
        .expect_err("Redirect loop should fail");

    assert_eq!(error.status, None);
    assert!(error.message.contains("Too many redirects"));
}

#[tokio::test]
async fn test_request_timeout() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&mock_server)
        .await;

    let client = build_http_client("TestCrawler/1.0").expect("Failed to build client");
    let options = FetchOptions::new(Duration::from_millis(50), 0);
    let error = fetch_text(&client, &format!("{}/slow", mock_server.uri()), &options)
        .await
        .expect_err("Slow response should time out");

    assert_eq!(error.message, "Request timeout");
}

#[tokio::test]
async fn test_timeout_covers_whole_redirect_chain() {
    let mock_server = MockServer::start().await;

    for (from, to) in [("/a", "/b"), ("/b", "/c")] {
        Mock::given(method("GET"))
            .and(path(from))
            .respond_with(
                ResponseTemplate::new(302)
                    .insert_header("location", to)
                    .set_delay(Duration::from_millis(400)),
            )
            .mount(&mock_server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/c"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("late")
                .set_delay(Duration::from_millis(400)),
        )
        .mount(&mock_server)
        .await;

    let client = build_http_client("TestCrawler/1.0").expect("Failed to build client");
    let options = FetchOptions::new(Duration::from_millis(600), 2);
    let started = std::time::Instant::now();
    let error = fetch_text(&client, &format!("{}/a", mock_server.uri()), &options)
        .await
        .expect_err("Redirect chain should exceed the timeout");

    assert_eq!(error.message, "Request timeout");
    assert!(started.elapsed() < Duration::from_millis(1000));
}

#[tokio::test]
async fn test_cross_origin_redirect_drops_cookie_and_referer() {
    let origin_server = MockServer::start().await;
    let other_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/start"))
        .and(header("cookie", "existmag=mag"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("location", format!("{}/landing", other_server.uri()).as_str()),
        )
        .expect(1)
        .mount(&origin_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/landing"))
        .and(header_exists("cookie"))
        .respond_with(ResponseTemplate::new(500))
        .with_priority(1)
        .expect(0)
        .mount(&other_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/landing"))
        .and(header_exists("referer"))
        .respond_with(ResponseTemplate::new(500))
        .with_priority(1)
        .expect(0)
        .mount(&other_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/landing"))
        .respond_with(ResponseTemplate::new(200).set_body_string("landed"))
        .mount(&other_server)
        .await;

    let client = build_http_client("TestCrawler/1.0").expect("Failed to build client");
    let options = FetchOptions::new(Duration::from_secs(5), 2)
        .with_cookie("existmag=mag")
        .with_referer(origin_server.uri());
    let body = fetch_text(&client, &format!("{}/start", origin_server.uri()), &options)
        .await
        .expect("Fetch failed");

    assert_eq!(body, "landed");
}

#[tokio::test]
async fn test_same_origin_redirect_keeps_cookie() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/new"))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/new"))
        .and(header("cookie", "existmag=all"))
        .respond_with(ResponseTemplate::new(200).set_body_string("kept"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = build_http_client("TestCrawler/1.0").expect("Failed to build client");
    let options = FetchOptions::new(Duration::from_secs(5), 2).with_cookie("existmag=all");
    let body = fetch_text(&client, &format!("{}/old", mock_server.uri()), &options)
        .await
        .expect("Fetch failed");

    assert_eq!(body, "kept");
}
