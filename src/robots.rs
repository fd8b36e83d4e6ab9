//! The Robots Policy Cache: fetches, parses, and caches `robots.txt` per origin.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use reqwest::Client;
use robotstxt::DefaultMatcher;
use url::Url;

const ROBOTS_FETCH_TIMEOUT: Duration = Duration::from_secs(5);
const ROBOTS_CACHE_TTL: Duration = Duration::from_secs(3600);
const PERMISSIVE_ROBOTS: &str = "User-agent: *\nAllow: /";

/// The decision returned for one URL: whether it may be fetched, and the
/// `Crawl-delay` (in seconds, 0 if absent) the origin has asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RobotsDecision {
    pub allowed: bool,
    pub crawl_delay: u64,
}

struct CachedPolicy {
    content: String,
    crawl_delay: u64,
    cached_at: Instant,
}

impl CachedPolicy {
    fn is_expired(&self) -> bool {
        self.cached_at.elapsed() > ROBOTS_CACHE_TTL
    }
}

/// Per-origin cache of parsed robots.txt policies.
pub struct RobotsPolicyCache {
    client: Client,
    user_agent: String,
    cache: DashMap<String, CachedPolicy>,
}

impl RobotsPolicyCache {
    pub fn new(client: Client, user_agent: impl Into<String>) -> Self {
        Self {
            client,
            user_agent: user_agent.into(),
            cache: DashMap::new(),
        }
    }

    /// Returns whether `url` may be fetched by this crawler's user-agent, and
    /// the crawl-delay the origin has requested. Any failure upstream
    /// (timeout, connection error, malformed robots.txt) resolves to an
    /// allow-everything, no-delay decision.
    pub async fn is_allowed(&self, url: &Url) -> RobotsDecision {
        let origin = url.origin().ascii_serialization();

        if let Some(cached) = self.cache.get(&origin) {
            if !cached.is_expired() {
                return self.evaluate(&cached.content, cached.crawl_delay, url);
            }
        }

        let robots_url = format!("{origin}/robots.txt");
        let content = match tokio::time::timeout(
            ROBOTS_FETCH_TIMEOUT,
            self.client.get(&robots_url).send(),
        )
        .await
        {
            Ok(Ok(response)) if response.status().is_success() => response
                .text()
                .await
                .unwrap_or_else(|_| PERMISSIVE_ROBOTS.to_string()),
            _ => PERMISSIVE_ROBOTS.to_string(),
        };

        let crawl_delay = extract_crawl_delay(&content);

        self.cache.insert(
            origin,
            CachedPolicy {
                content: content.clone(),
                crawl_delay,
                cached_at: Instant::now(),
            },
        );

        self.evaluate(&content, crawl_delay, url)
    }

    fn evaluate(&self, content: &str, crawl_delay: u64, url: &Url) -> RobotsDecision {
        let allowed = DefaultMatcher::default().one_agent_allowed_by_robots(
            content,
            self.user_agent.as_str(),
            url.as_str(),
        );
        RobotsDecision {
            allowed,
            crawl_delay,
        }
    }
}

/// Scans robots.txt content for the first `Crawl-delay` directive, in seconds.
fn extract_crawl_delay(robots_txt: &str) -> u64 {
    robots_txt
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            if line.to_lowercase().starts_with("crawl-delay:") {
                line.split(':').nth(1)?.trim().parse::<f64>().ok()
            } else {
                None
            }
        })
        .next()
        .map(|secs| secs as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_crawl_delay() {
        let txt = "User-agent: *\nCrawl-delay: 2\nDisallow: /private/";
        assert_eq!(extract_crawl_delay(txt), 2);
    }

    #[test]
    fn defaults_crawl_delay_to_zero() {
        let txt = "User-agent: *\nDisallow: /admin/";
        assert_eq!(extract_crawl_delay(txt), 0);
    }

    #[tokio::test]
    async fn disallow_all_blocks_every_path() {
        let client = Client::builder().build().unwrap();
        let cache = RobotsPolicyCache::new(client, "TestBot/1.0");
        let url = Url::parse("https://blocked.se/kontakt").unwrap();
        // Seed the cache directly to avoid a real network fetch in tests.
        cache.cache.insert(
            "https://blocked.se".to_string(),
            CachedPolicy {
                content: "User-agent: *\nDisallow: /".to_string(),
                crawl_delay: 0,
                cached_at: Instant::now(),
            },
        );
        let decision = cache.is_allowed(&url).await;
        assert!(!decision.allowed);
    }

    #[tokio::test]
    async fn permissive_policy_allows_everything() {
        let client = Client::builder().build().unwrap();
        let cache = RobotsPolicyCache::new(client, "TestBot/1.0");
        let url = Url::parse("https://open.se/kontakt").unwrap();
        cache.cache.insert(
            "https://open.se".to_string(),
            CachedPolicy {
                content: PERMISSIVE_ROBOTS.to_string(),
                crawl_delay: 0,
                cached_at: Instant::now(),
            },
        );
        let decision = cache.is_allowed(&url).await;
        assert!(decision.allowed);
    }
}
