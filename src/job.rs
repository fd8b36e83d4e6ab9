//! The Job Orchestrator: fans a batch of sites out across a concurrency
//! budget, converts each site's result into contact records, and assembles
//! the job-level result. A job never fails outright — only a per-site
//! failure is recorded, and the job always moves on to the next site.

use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};

use crate::audit::{AuditEntry, AuditSink};
use crate::config::{CrawlConfig, SiteInput};
use crate::crawler::{CrawlerDeps, SiteCrawler};
use crate::record::build_records;
use crate::types::ContactRecord;

#[derive(Debug, Clone)]
pub struct JobInput {
    pub job_id: uuid::Uuid,
    pub sites: Vec<SiteInput>,
    pub config: CrawlConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JobProgress {
    pub percentage: f64,
    pub current: Option<String>,
    pub processed: usize,
    pub total: usize,
    pub found: usize,
}

#[derive(Debug, Clone)]
pub struct SiteErrorEntry {
    pub host: String,
    pub errors: Vec<crate::types::CrawlErrorEntry>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JobStats {
    pub total_sites: usize,
    pub total_records: usize,
    pub total_errors: usize,
    pub avg_records_per_site: f64,
}

#[derive(Debug, Clone)]
pub struct JobResult {
    pub records: Vec<ContactRecord>,
    pub errors: Vec<SiteErrorEntry>,
    pub stats: JobStats,
}

/// A sink for progress updates; the job orchestrator reports through this
/// after every completed site. Delivering updates over SSE is out of scope.
pub trait ProgressSink: Send + Sync {
    fn report(&self, progress: JobProgress);
}

/// A progress sink that discards every update.
pub struct NoopProgressSink;

impl ProgressSink for NoopProgressSink {
    fn report(&self, _progress: JobProgress) {}
}

/// Runs one job: DNC/TOS gating happens per-site inside the crawler itself
/// (§4.11 step 1–2); this orchestrator only bounds concurrency, aggregates
/// results, reports progress, and writes the audit trail.
pub async fn run_job(
    input: JobInput,
    deps: CrawlerDeps,
    audit: Arc<dyn AuditSink>,
    progress: Arc<dyn ProgressSink>,
) -> JobResult {
    deps.metrics.job_started();

    let total = input.sites.len();
    let crawler = Arc::new(SiteCrawler::new(deps));
    let max_pages = input.config.max_pages;
    let user = input.config.user.clone();
    let job_id = input.job_id;

    let mut in_flight = FuturesUnordered::new();
    let mut pending = input.sites.into_iter();
    let concurrency = input.config.concurrency.max(1);

    let mut records = Vec::new();
    let mut errors = Vec::new();
    let mut processed = 0usize;

    for site in pending.by_ref().take(concurrency) {
        in_flight.push(run_one_site(Arc::clone(&crawler), site, max_pages));
    }

    while let Some((site, site_result)) = in_flight.next().await {
        if let Some(next_site) = pending.next() {
            in_flight.push(run_one_site(Arc::clone(&crawler), next_site, max_pages));
        }

        processed += 1;
        let site_records = build_records(&site_result);
        let found_here = site_records.len();

        for record in &site_records {
            crawler.metrics().record_contact_found(record.email_type.as_str());
        }

        audit
            .record(AuditEntry::crawl(job_id, &site.host, found_here, &user))
            .await;

        if !site_result.errors.is_empty() {
            errors.push(SiteErrorEntry {
                host: site.host.clone(),
                errors: site_result.errors.clone(),
            });
        }

        records.extend(site_records);

        progress.report(JobProgress {
            percentage: if total == 0 { 100.0 } else { (processed as f64 / total as f64) * 100.0 },
            current: Some(site.host.clone()),
            processed,
            total,
            found: records.len(),
        });
    }

    let total_sites = total;
    let total_records = records.len();
    let total_errors = errors.len();
    let avg_records_per_site = if total_sites == 0 {
        0.0
    } else {
        total_records as f64 / total_sites as f64
    };

    crawler.metrics().job_finished();

    JobResult {
        records,
        errors,
        stats: JobStats {
            total_sites,
            total_records,
            total_errors,
            avg_records_per_site,
        },
    }
}

async fn run_one_site(
    crawler: Arc<SiteCrawler>,
    site: SiteInput,
    max_pages: usize,
) -> (SiteInput, crate::types::SiteResult) {
    let result = crawler.crawl_site(&site, max_pages).await;
    (site, result)
}
