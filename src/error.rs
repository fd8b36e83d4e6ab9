//! Typed error hierarchy for the crawl pipeline.
//!
//! Per-URL failures ([`PageErrorKind`]) never unwind past [`crate::crawler::SiteCrawler`];
//! they are recorded on the site's `errors` list and the crawl continues. Only
//! construction/configuration failures (building the HTTP client, a malformed
//! root URL) are returned as `Err` from the crate's public API.

use thiserror::Error;

/// The reason a single page fetch produced no usable content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageErrorKind {
    /// Blocked by the safe-URL / SSRF gate.
    Unsafe,
    /// Disallowed by robots.txt.
    RobotsDisallow,
    /// HTTP 403 or 429.
    Blocked,
    /// HTTP 404.
    NotFound,
    /// The request timed out.
    Timeout,
    /// Response content-type was not `text/html`.
    NonHtml,
    /// A captcha/challenge page was detected.
    CaptchaSkip,
    /// Any other network error, or a 5xx that survived retries.
    FetchError,
    /// HTML or JSON parsing failed; non-fatal, the page is simply skipped.
    ParseError,
}

impl PageErrorKind {
    /// The metric label used for `crawl_requests_total{status=...}`.
    pub fn metric_status(&self) -> &'static str {
        match self {
            PageErrorKind::Unsafe => "unsafe",
            PageErrorKind::RobotsDisallow => "robots-blocked",
            PageErrorKind::Blocked => "blocked",
            PageErrorKind::NotFound => "404",
            PageErrorKind::Timeout => "timeout",
            PageErrorKind::NonHtml => "non-html",
            PageErrorKind::CaptchaSkip => "captcha",
            PageErrorKind::FetchError => "error",
            PageErrorKind::ParseError => "error",
        }
    }
}

/// A recorded failure for one attempted page, attached to a site's aggregated result.
#[derive(Debug, Clone)]
pub struct PageError {
    pub url: Option<String>,
    pub reason: String,
    pub kind: PageErrorKind,
}

impl PageError {
    pub fn new(url: impl Into<String>, kind: PageErrorKind, reason: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            reason: reason.into(),
            kind,
        }
    }
}

/// Site-level outcomes that stop a crawl before any page is fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SiteGateError {
    /// The site's host is on the Do-Not-Contact list.
    Dnc,
    /// The site's host matched a Terms-of-Service restricted domain; this is a
    /// warning, not a block — the crawl proceeds.
    Tos(String),
}

/// Construction/configuration errors: the only errors that escape the crate's
/// public API as `Err`. Everything encountered *during* a crawl is data.
#[derive(Debug, Error)]
pub enum CrawlerError {
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[from] reqwest::Error),

    #[error("invalid root URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("invalid cache backend url: {0}")]
    CacheBackend(String),

    #[error("invalid audit sink path: {0}")]
    AuditSink(String),
}
