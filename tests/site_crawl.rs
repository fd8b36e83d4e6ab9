//! End-to-end exercises of `SiteCrawler` against a mock HTTP server,
//! covering the literal scenarios from the crawl pipeline's design.

use std::sync::Arc;

use contact_crawler::config::{Config, SiteInput};
use contact_crawler::crawler::{CrawlerDeps, SiteCrawler};
use contact_crawler::dnc::{DncList, TosList};
use contact_crawler::fetcher::{build_client, Fetcher};
use contact_crawler::metrics::Metrics;
use contact_crawler::ratelimit::RateLimiter;
use contact_crawler::{
    cache::ResponseCache,
    robots::RobotsPolicyCache,
    safety::{SafetyDecision, UrlSafetyGate},
};

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// The real `SafeUrlGate` correctly refuses to fetch a loopback address —
/// which is exactly what `wiremock` binds to. Stand in a permissive double
/// so these tests exercise the rest of the pipeline instead of re-testing
/// the SSRF gate (already covered directly in `safety.rs`).
struct AllowAll;

#[async_trait::async_trait]
impl UrlSafetyGate for AllowAll {
    async fn is_safe(&self, _url: &url::Url) -> SafetyDecision {
        SafetyDecision {
            safe: true,
            reason: None,
        }
    }
}

async fn deps_for(_server: &MockServer) -> CrawlerDeps {
    let config = Config {
        between_requests: std::time::Duration::from_millis(0),
        ..Config::default()
    };
    let client = build_client(&config).expect("client builds");
    let metrics = Metrics::standalone();

    CrawlerDeps {
        fetcher: Arc::new(Fetcher::new(client.clone(), config.max_retries, metrics.clone())),
        robots: Arc::new(RobotsPolicyCache::new(client, config.bot_name.clone())),
        rate_limiter: RateLimiter::new(8, std::time::Duration::from_millis(0), 1, std::time::Duration::from_millis(0)),
        safety: Arc::new(AllowAll),
        dnc: Arc::new(DncList::new()),
        tos: Arc::new(TosList::new()),
        cache: ResponseCache::noop(),
        metrics,
        config,
    }
}

// `SiteInput::new` normalizes away the port, which a real company site never
// has but a mock server always does — build the struct directly instead.
fn site_for(server: &MockServer) -> SiteInput {
    let uri = server.uri();
    let host = uri.trim_start_matches("http://").to_string();
    SiteInput {
        root_url: uri,
        host,
        company_name: "Acme AB".to_string(),
    }
}

#[tokio::test]
async fn happy_path_mailto_and_tel_yield_one_role_record() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html")
                .set_body_string(
                    r#"<html><body>
                        <a href="mailto:info@example.se">Email</a>
                        <a href="tel:+4684002227">Call</a>
                    </body></html>"#,
                ),
        )
        .mount(&server)
        .await;

    let deps = deps_for(&server).await;
    let crawler = SiteCrawler::new(deps);
    let site = site_for(&server);

    let result = crawler.crawl_site(&site, 1).await;

    assert_eq!(result.emails.len(), 1);
    let entry = result.emails.values().next().unwrap();
    assert_eq!(entry.email_type, contact_crawler::types::EmailType::Role);
    assert_eq!(result.phones.len(), 1);
    assert!(result.phones.contains("+4684002227"));
}

#[tokio::test]
async fn robots_disallow_all_yields_zero_records_and_no_site_level_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("User-agent: *\nDisallow: /"),
        )
        .mount(&server)
        .await;

    let deps = deps_for(&server).await;
    let crawler = SiteCrawler::new(deps);
    let site = site_for(&server);

    let result = crawler.crawl_site(&site, 1).await;

    assert!(result.emails.is_empty());
    assert!(result.errors.is_empty());
}

#[tokio::test]
async fn captcha_page_yields_zero_records_and_a_recorded_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html")
                .set_body_string("Checking your browser... Just a moment..."),
        )
        .mount(&server)
        .await;

    let deps = deps_for(&server).await;
    let crawler = SiteCrawler::new(deps);
    let site = site_for(&server);

    let result = crawler.crawl_site(&site, 1).await;

    assert!(result.emails.is_empty());
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].reason.contains("Captcha"));
}

#[tokio::test]
async fn dedup_across_pages_yields_one_record_with_multiple_sources() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html")
                .set_body_string(r#"<a href="mailto:info@acme.se">Email</a>"#),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/kontakt"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html")
                .set_body_string("<p>info@acme.se</p>"),
        )
        .mount(&server)
        .await;

    let deps = deps_for(&server).await;
    let crawler = SiteCrawler::new(deps);
    let mut site = site_for(&server);
    site.company_name = "Acme AB".to_string();

    let result = crawler.crawl_site(&site, 2).await;

    assert_eq!(result.emails.len(), 1);
    let aggregated = result.emails.values().next().unwrap();
    assert_eq!(aggregated.sources.len(), 2);
}
