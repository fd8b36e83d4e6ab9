//! The Site Crawler: the per-site fetch/parse/extract/aggregate state
//! machine. Pages for one site are always visited sequentially, even though
//! many sites may be crawled concurrently by the job orchestrator.

use std::sync::Arc;
use std::time::Duration;

use crate::cache::ResponseCache;
use crate::captcha::detect_challenge;
use crate::config::Config;
use crate::dnc::{DncList, TosList};
use crate::email;
use crate::error::PageErrorKind;
use crate::extract;
use crate::fetcher::Fetcher;
use crate::metrics::Metrics;
use crate::phone;
use crate::ratelimit::RateLimiter;
use crate::robots::RobotsPolicyCache;
use crate::safety::UrlSafetyGate;
use crate::types::{AggregatedEmail, CrawlErrorEntry, EmailEvidence, PerUrlResult, SiteResult};

const CANDIDATE_PATHS: &[&str] = &["", "/kontakt", "/kontakta-oss", "/om", "/om-oss", "/about", "/contact"];

/// Shared, process-wide dependencies one `SiteCrawler` needs to do its job.
/// Cheap to clone — every field is itself `Arc`-backed or `Clone`.
#[derive(Clone)]
pub struct CrawlerDeps {
    pub config: Config,
    pub cache: ResponseCache,
    pub fetcher: Arc<Fetcher>,
    pub robots: Arc<RobotsPolicyCache>,
    pub rate_limiter: RateLimiter,
    pub safety: Arc<dyn UrlSafetyGate>,
    pub dnc: Arc<DncList>,
    pub tos: Arc<TosList>,
    pub metrics: Metrics,
}

pub struct SiteCrawler {
    deps: CrawlerDeps,
}

impl SiteCrawler {
    pub fn new(deps: CrawlerDeps) -> Self {
        Self { deps }
    }

    pub fn metrics(&self) -> &Metrics {
        &self.deps.metrics
    }

    /// Crawls one site end-to-end: gating, page-by-page fetch/extract, and
    /// aggregation into a `SiteResult`. Never returns `Err` — every failure
    /// mode is recorded as data on the result itself.
    #[tracing::instrument(skip(self), fields(host = %root.host))]
    pub async fn crawl_site(&self, root: &crate::config::SiteInput, max_pages: usize) -> SiteResult {
        let mut result = SiteResult::new(root.company_name.clone(), root.root_url.clone(), root.host.clone());

        if self.deps.dnc.has(&root.host) {
            tracing::info!(host = %root.host, "site is on the do-not-contact list, skipping");
            result.errors.push(CrawlErrorEntry {
                url: None,
                reason: "Domain on Do-Not-Contact list".to_string(),
            });
            return result;
        }

        if let Some(reason) = self.deps.tos.matches(&root.host) {
            tracing::info!(host = %root.host, %reason, "site matched a terms-of-service restriction, proceeding with a warning");
            result.errors.push(CrawlErrorEntry { url: None, reason });
        }

        let candidates: Vec<String> = CANDIDATE_PATHS
            .iter()
            .take(max_pages)
            .map(|path| format!("{}{}", root.root_url, path))
            .collect();

        for url in candidates {
            tokio::time::sleep(self.deps.config.between_requests).await;

            match self.crawl_url(&url, &root.host).await {
                Ok(Some(page)) => {
                    result.source_pages.insert(url.clone());
                    merge_page(&mut result, &root.host, page);
                }
                Ok(None) => {}
                Err(entry) => result.errors.push(entry),
            }
        }

        result
    }

    /// Runs the full per-URL pipeline: cache, safe-URL gate, robots, rate
    /// limiting, fetch, captcha detection, extraction, and cleaning.
    async fn crawl_url(&self, url: &str, host: &str) -> Result<Option<PerUrlResult>, CrawlErrorEntry> {
        if let Some(cached) = self.deps.cache.get(url).await {
            return Ok(Some(cached));
        }

        let parsed = match url::Url::parse(url) {
            Ok(parsed) => parsed,
            Err(error) => {
                return Err(CrawlErrorEntry {
                    url: Some(url.to_string()),
                    reason: error.to_string(),
                })
            }
        };

        let safety = self.deps.safety.is_safe(&parsed).await;
        if !safety.safe {
            let reason = safety.reason.unwrap_or_else(|| "blocked by safe-url gate".to_string());
            tracing::warn!(%url, %reason, "safe-url gate rejected request");
            self.deps
                .metrics
                .record_request(PageErrorKind::Unsafe.metric_status(), host, Duration::ZERO);
            return Err(CrawlErrorEntry {
                url: Some(url.to_string()),
                reason,
            });
        }

        let robots_decision = self.deps.robots.is_allowed(&parsed).await;
        if !robots_decision.allowed {
            self.deps.metrics.record_robots_blocked(host);
            self.deps.metrics.record_request(
                PageErrorKind::RobotsDisallow.metric_status(),
                host,
                Duration::ZERO,
            );
            tracing::debug!(%url, "robots.txt disallows this path");
            return Ok(None);
        }
        if robots_decision.crawl_delay > 0 {
            let delay = self
                .deps
                .config
                .between_requests
                .max(Duration::from_secs(robots_decision.crawl_delay));
            tokio::time::sleep(delay).await;
        }

        let _permit = self.deps.rate_limiter.acquire(host).await;

        let page = match self.deps.fetcher.fetch(url).await {
            Ok(page) => page,
            Err(error) => {
                tracing::debug!(%url, reason = %error.reason, kind = ?error.kind, "page fetch did not yield content");
                return Err(CrawlErrorEntry {
                    url: Some(url.to_string()),
                    reason: error.reason,
                });
            }
        };

        if let Some(challenge) = detect_challenge(&page.body) {
            let reason = format!("Captcha detected ({})", challenge.as_str());
            tracing::debug!(%url, %reason, "captcha detected, skipping page");
            self.deps.metrics.record_request(
                PageErrorKind::CaptchaSkip.metric_status(),
                host,
                Duration::ZERO,
            );
            return Err(CrawlErrorEntry {
                url: Some(url.to_string()),
                reason,
            });
        }

        let path = parsed.path();
        let extracted = extract::extract(&page.body, path);

        let mut emails = Vec::new();
        let mut seen = std::collections::HashSet::new();
        for evidence in extracted.emails {
            if let Some(cleaned) = email::clean(&evidence.email) {
                if seen.insert(cleaned.clone()) {
                    emails.push(EmailEvidence {
                        email: cleaned,
                        ..evidence
                    });
                }
            }
        }

        let phones = phone::parse_and_dedup(&extracted.phone_candidates);

        let result = PerUrlResult {
            emails,
            phones,
            socials: extracted.socials,
        };

        self.deps.cache.set(url, &result).await;

        Ok(Some(result))
    }
}

/// Merges one page's result into the site's running aggregate, implementing
/// I1 (classify once, append sources) and I5 (socials, first wins).
fn merge_page(result: &mut SiteResult, site_host: &str, page: PerUrlResult) {
    for evidence in page.emails {
        match result.emails.get_mut(&evidence.email) {
            Some(existing) => {
                if !existing.sources.contains(&evidence.source) {
                    existing.sources.push(evidence.source);
                }
            }
            None => {
                let email_type = email::classify(&evidence.email, site_host);
                let score = email::score(&evidence.email, email_type, site_host);
                result.emails.insert(
                    evidence.email,
                    AggregatedEmail {
                        email_type,
                        // I2: confidence is score/100, already normalized to [0,1].
                        confidence: (score as f64 / 100.0).clamp(0.0, 1.0),
                        sources: vec![evidence.source],
                        discovery_path: evidence.source,
                    },
                );
            }
        }
    }

    for phone in page.phones {
        result.phones.insert(phone);
    }

    result.socials.merge_first_wins(&page.socials);
}
