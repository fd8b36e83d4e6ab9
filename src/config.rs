//! Environment-driven configuration and the per-job `CrawlConfig`/`SiteInput` types.
//!
//! `Config` is read once at process startup and threaded explicitly from there on —
//! there is no global mutable configuration.

use std::env;
use std::time::Duration;

const DEFAULT_BOT_NAME: &str = "CSV-Webcrawler/2.0";
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 12_000;
const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_BETWEEN_REQUESTS_MS: u64 = 150;
const DEFAULT_GLOBAL_CONCURRENCY: usize = 8;
const DEFAULT_PER_HOST_MIN_TIME_MS: u64 = 1000;
const DEFAULT_PER_HOST_MAX_CONCURRENT: usize = 1;
const DEFAULT_WORKER_CONCURRENCY: usize = 2;
const DEFAULT_AUDIT_LOG_PATH: &str = "audit.log";

pub const MAX_PAGES_UPPER_BOUND: usize = 10;
pub const MAX_PAGES_LOWER_BOUND: usize = 1;
pub const CONCURRENCY_UPPER_BOUND: usize = 8;
pub const CONCURRENCY_LOWER_BOUND: usize = 1;
pub const DEFAULT_MAX_PAGES: usize = 5;
pub const DEFAULT_CONCURRENCY: usize = 4;
pub const MAX_TAGS_LEN: usize = 100;

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

fn env_u64(name: &str, default: u64) -> u64 {
    env_var(name)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_usize(name: &str, default: usize) -> usize {
    env_var(name)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_bool(name: &str, default: bool) -> bool {
    env_var(name)
        .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}

/// Process-wide configuration, read once from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub redis_url: Option<String>,
    pub bot_name: String,
    pub request_timeout: Duration,
    pub max_retries: u32,
    pub between_requests: Duration,
    pub global_concurrency: usize,
    pub per_host_min_time: Duration,
    pub per_host_max_concurrent: usize,
    pub worker_concurrency: usize,
    pub enable_cache: bool,
    pub enable_mx_check: bool,
    pub log_level: String,
    pub audit_log_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            redis_url: None,
            bot_name: DEFAULT_BOT_NAME.to_string(),
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
            max_retries: DEFAULT_MAX_RETRIES,
            between_requests: Duration::from_millis(DEFAULT_BETWEEN_REQUESTS_MS),
            global_concurrency: DEFAULT_GLOBAL_CONCURRENCY,
            per_host_min_time: Duration::from_millis(DEFAULT_PER_HOST_MIN_TIME_MS),
            per_host_max_concurrent: DEFAULT_PER_HOST_MAX_CONCURRENT,
            worker_concurrency: DEFAULT_WORKER_CONCURRENCY,
            enable_cache: true,
            enable_mx_check: false,
            log_level: "info".to_string(),
            audit_log_path: DEFAULT_AUDIT_LOG_PATH.to_string(),
        }
    }
}

impl Config {
    /// Loads configuration from environment variables, falling back to the
    /// documented defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            redis_url: env_var("REDIS_URL"),
            bot_name: env_var("BOT_NAME").unwrap_or(defaults.bot_name),
            request_timeout: Duration::from_millis(env_u64(
                "REQUEST_TIMEOUT_MS",
                DEFAULT_REQUEST_TIMEOUT_MS,
            )),
            max_retries: env_usize("MAX_RETRIES", DEFAULT_MAX_RETRIES as usize) as u32,
            between_requests: Duration::from_millis(env_u64(
                "BETWEEN_REQUESTS_MS",
                DEFAULT_BETWEEN_REQUESTS_MS,
            )),
            global_concurrency: env_usize("GLOBAL_CONCURRENCY", DEFAULT_GLOBAL_CONCURRENCY),
            per_host_min_time: Duration::from_millis(env_u64(
                "PER_HOST_MIN_TIME_MS",
                DEFAULT_PER_HOST_MIN_TIME_MS,
            )),
            per_host_max_concurrent: env_usize(
                "PER_HOST_MAX_CONCURRENT",
                DEFAULT_PER_HOST_MAX_CONCURRENT,
            ),
            worker_concurrency: env_usize("WORKER_CONCURRENCY", DEFAULT_WORKER_CONCURRENCY),
            enable_cache: env_bool("ENABLE_CACHE", true),
            enable_mx_check: env_bool("ENABLE_MX_CHECK", false),
            log_level: env_var("LOG_LEVEL").unwrap_or(defaults.log_level),
            audit_log_path: env_var("AUDIT_LOG_PATH").unwrap_or(defaults.audit_log_path),
        }
    }
}

/// Installs the global `tracing` subscriber from `config.log_level`, with
/// `RUST_LOG` taking precedence if set. Safe to call at most once per
/// process; a second call is a no-op. Intended for the binary that embeds
/// this crate — nothing in the crawl pipeline itself logs before this runs.
pub fn init_tracing(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config.log_level.clone()));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// One company site to crawl, as handed to the core by the (out-of-scope) CSV ingress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteInput {
    pub root_url: String,
    pub host: String,
    pub company_name: String,
}

impl SiteInput {
    /// Builds a `SiteInput` from a root URL and company name, normalizing the
    /// host the way the ingress is expected to: lowercased, leading `www.` stripped.
    pub fn new(root_url: impl Into<String>, company_name: impl Into<String>) -> Option<Self> {
        let root_url = root_url.into();
        let parsed = url::Url::parse(&root_url).ok()?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return None;
        }
        let host = parsed.host_str()?.to_lowercase();
        let host = host.strip_prefix("www.").unwrap_or(&host).to_string();
        let root_url = format!("{}://{}", parsed.scheme(), host);
        Some(Self {
            root_url,
            host,
            company_name: company_name.into(),
        })
    }
}

/// Per-job crawl configuration, clamped rather than rejected when out of range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlConfig {
    pub max_pages: usize,
    pub concurrency: usize,
    pub tags: String,
    pub user: String,
}

/// A non-fatal adjustment made while clamping a `CrawlConfig`, kept for the
/// job's diagnostic trail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationWarning(pub String);

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_pages: DEFAULT_MAX_PAGES,
            concurrency: DEFAULT_CONCURRENCY,
            tags: String::new(),
            user: String::new(),
        }
    }
}

impl CrawlConfig {
    /// Builds a config from raw fields, clamping anything out of range and
    /// returning the warnings produced along the way. The core never refuses
    /// a job outright over a bad `CrawlConfig`.
    pub fn clamp(
        max_pages: usize,
        concurrency: usize,
        tags: String,
        user: String,
    ) -> (Self, Vec<ValidationWarning>) {
        let mut warnings = Vec::new();

        let clamped_max_pages = max_pages.clamp(MAX_PAGES_LOWER_BOUND, MAX_PAGES_UPPER_BOUND);
        if clamped_max_pages != max_pages {
            warnings.push(ValidationWarning(format!(
                "maxPages {max_pages} out of range [{MAX_PAGES_LOWER_BOUND},{MAX_PAGES_UPPER_BOUND}], clamped to {clamped_max_pages}"
            )));
        }

        let clamped_concurrency =
            concurrency.clamp(CONCURRENCY_LOWER_BOUND, CONCURRENCY_UPPER_BOUND);
        if clamped_concurrency != concurrency {
            warnings.push(ValidationWarning(format!(
                "concurrency {concurrency} out of range [{CONCURRENCY_LOWER_BOUND},{CONCURRENCY_UPPER_BOUND}], clamped to {clamped_concurrency}"
            )));
        }

        let sanitized_tags = sanitize_tags(&tags);
        if sanitized_tags != tags {
            warnings.push(ValidationWarning(
                "tags truncated or sanitized to fit the allowed format".to_string(),
            ));
        }

        (
            Self {
                max_pages: clamped_max_pages,
                concurrency: clamped_concurrency,
                tags: sanitized_tags,
                user,
            },
            warnings,
        )
    }
}

/// Strips control characters and truncates to `MAX_TAGS_LEN` characters.
fn sanitize_tags(tags: &str) -> String {
    let cleaned: String = tags.chars().filter(|c| !c.is_control()).collect();
    if cleaned.chars().count() > MAX_TAGS_LEN {
        cleaned.chars().take(MAX_TAGS_LEN).collect()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_tracing_does_not_panic() {
        init_tracing(&Config::default());
    }

    #[test]
    fn site_input_strips_www_and_lowercases() {
        let site = SiteInput::new("https://WWW.Example.SE/path", "Example AB").unwrap();
        assert_eq!(site.host, "example.se");
        assert_eq!(site.root_url, "https://example.se");
    }

    #[test]
    fn site_input_rejects_non_http_scheme() {
        assert!(SiteInput::new("ftp://example.se", "Example AB").is_none());
    }

    #[test]
    fn crawl_config_clamps_out_of_range_values() {
        let (config, warnings) = CrawlConfig::clamp(100, 0, "x".repeat(200), "alice".to_string());
        assert_eq!(config.max_pages, MAX_PAGES_UPPER_BOUND);
        assert_eq!(config.concurrency, CONCURRENCY_LOWER_BOUND);
        assert_eq!(config.tags.chars().count(), MAX_TAGS_LEN);
        assert_eq!(warnings.len(), 3);
    }

    #[test]
    fn crawl_config_leaves_in_range_values_untouched() {
        let (config, warnings) = CrawlConfig::clamp(5, 4, "acme".to_string(), "bob".to_string());
        assert_eq!(config, CrawlConfig::default());
        assert!(warnings.is_empty());
    }
}
