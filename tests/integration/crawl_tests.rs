//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and run the real
//! HTTP fetcher and HTML link extractor through a full crawl.

use site_mapper::config::{parse_config, Config, CrawlerConfig, HttpConfig};
use site_mapper::crawler::{run_crawl, Crawler};
use site_mapper::output::{render_site_map, write_site_map, OutputFormat};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration with short timeouts
fn create_test_config(max_depth: u32, max_retries: u32) -> Config {
    Config {
        crawler: CrawlerConfig {
            max_depth,
            workers: 4,
            max_retries,
            retry_delay_ms: 10,
            progress_interval: 1,
        },
        http: HttpConfig {
            request_timeout_secs: 5,
            connect_timeout_secs: 2,
            html_only: true,
        },
        ..Default::default()
    }
}

/// An HTML page whose body is one anchor per href
fn html_page(hrefs: &[&str]) -> ResponseTemplate {
    let anchors: String = hrefs
        .iter()
        .map(|href| format!(r#"<a href="{}">{}</a>"#, href, href))
        .collect();
    ResponseTemplate::new(200).set_body_raw(
        format!(
            "<html><head><title>Test</title></head><body>{}</body></html>",
            anchors
        ),
        "text/html",
    )
}

async fn mount_page(server: &MockServer, page: &str, hrefs: &[&str]) {
    Mock::given(method("GET"))
        .and(path(page))
        .respond_with(html_page(hrefs))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_crawl_single_domain() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    // Index links to two pages, one absolutely and one relatively
    let absolute = format!("{}/page1", base_url);
    mount_page(&mock_server, "/", &[&absolute, "page2", "#top"]).await;
    mount_page(&mock_server, "/page1", &["/page2", "/"]).await;
    mount_page(&mock_server, "/page2", &["/page1?utm_source=test"]).await;

    let report = run_crawl(&create_test_config(2, 0), &base_url)
        .await
        .expect("crawl should succeed");

    assert!(!report.cancelled);
    assert_eq!(
        report.sorted_urls(),
        vec![
            format!("{}/", base_url),
            format!("{}/page1", base_url),
            format!("{}/page2", base_url),
        ]
    );
    assert_eq!(report.stats.pages_fetched, 3);
    assert_eq!(report.stats.pages_failed, 0);
}

#[tokio::test]
async fn test_other_port_is_another_site() {
    let mock_server = MockServer::start().await;
    let other_server = MockServer::start().await;

    let external = format!("{}/external", other_server.uri());
    mount_page(&mock_server, "/", &[&external]).await;

    Mock::given(method("GET"))
        .respond_with(html_page(&[]))
        .expect(0)
        .mount(&other_server)
        .await;

    let report = run_crawl(&create_test_config(3, 0), &mock_server.uri())
        .await
        .expect("crawl should succeed");

    assert_eq!(report.visited.len(), 1);
}

#[tokio::test]
async fn test_crawl_with_depth_limit() {
    let mock_server = MockServer::start().await;

    mount_page(&mock_server, "/", &["/level1"]).await;
    mount_page(&mock_server, "/level1", &["/level2"]).await;
    mount_page(&mock_server, "/level2", &["/level3"]).await;

    Mock::given(method("GET"))
        .and(path("/level3"))
        .respond_with(html_page(&[]))
        .expect(0)
        .mount(&mock_server)
        .await;

    let report = run_crawl(&create_test_config(2, 0), &mock_server.uri())
        .await
        .expect("crawl should succeed");

    assert_eq!(report.visited.len(), 3);
    assert_eq!(report.stats.depth_limited, 1);
}

#[tokio::test]
async fn test_failures_do_not_stop_crawl() {
    let mock_server = MockServer::start().await;

    mount_page(&mock_server, "/", &["/missing", "/broken", "/data.json", "/ok"]).await;
    mount_page(&mock_server, "/ok", &[]).await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&mock_server)
        .await;

    // Links inside non-HTML bodies are never followed
    Mock::given(method("GET"))
        .and(path("/data.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(r#"{"link": "<a href='/hidden'>x</a>"}"#, "application/json"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let report = run_crawl(&create_test_config(3, 0), &mock_server.uri())
        .await
        .expect("crawl should succeed");

    assert_eq!(report.visited.len(), 5);
    assert_eq!(report.stats.pages_fetched, 2);
    assert_eq!(report.stats.pages_failed, 3);
}

#[tokio::test]
async fn test_cycle_terminates() {
    let mock_server = MockServer::start().await;

    mount_page(&mock_server, "/", &["/a"]).await;
    mount_page(&mock_server, "/a", &["/b", "/"]).await;
    mount_page(&mock_server, "/b", &["/a", "/"]).await;

    let report = run_crawl(&create_test_config(10, 0), &mock_server.uri())
        .await
        .expect("crawl should succeed");

    assert_eq!(report.visited.len(), 3);
}

#[tokio::test]
async fn test_retry_on_service_unavailable() {
    let mock_server = MockServer::start().await;

    mount_page(&mock_server, "/", &["/flaky"]).await;

    // First attempt fails, the retry of the same task succeeds
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, "/flaky", &["/after"]).await;
    mount_page(&mock_server, "/after", &[]).await;

    let report = run_crawl(&create_test_config(3, 2), &mock_server.uri())
        .await
        .expect("crawl should succeed");

    assert_eq!(report.visited.len(), 3);
    assert_eq!(report.stats.pages_failed, 0);
    assert_eq!(report.stats.tasks_created, 3);
}

#[tokio::test]
async fn test_user_agent_header_sent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .and(wiremock::matchers::header(
            "user-agent",
            "TestBot/1.0.0 (+https://example.com/contact; test@example.com)",
        ))
        .respond_with(html_page(&[]))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = parse_config(
        r#"
[user-agent]
crawler-name = "TestBot"
crawler-version = "1.0.0"
contact-url = "https://example.com/contact"
contact-email = "test@example.com"
"#,
    )
    .expect("config should parse");

    let report = Crawler::from_config(&config)
        .expect("client should build")
        .crawl(&mock_server.uri(), 1, 1)
        .await
        .expect("crawl should succeed");

    assert_eq!(report.stats.pages_fetched, 1);
}

#[tokio::test]
async fn test_site_map_written_to_file() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(&mock_server, "/", &["/about"]).await;
    mount_page(&mock_server, "/about", &[]).await;

    let report = run_crawl(&create_test_config(1, 0), &base_url)
        .await
        .expect("crawl should succeed");

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let output_path = temp_dir.path().join("sitemap.txt");
    write_site_map(&report, OutputFormat::Text, Some(&output_path))
        .expect("site map should be written");

    let written = std::fs::read_to_string(&output_path).expect("Failed to read site map");
    assert_eq!(written, render_site_map(&report, OutputFormat::Text));
    assert_eq!(
        written,
        format!("--- Site Map ---\n{0}/\n{0}/about\n", base_url)
    );
}
