//! Prometheus metrics surface. One [`Metrics`] handle is built at startup and
//! cloned (cheaply — it's `Arc`-backed internally via `prometheus`'s own
//! reference-counted collectors) into every component that reports a signal.

use std::time::Duration;

use prometheus::{
    HistogramVec, IntCounterVec, IntGauge, Opts, Registry,
};

const DURATION_BUCKETS: &[f64] = &[0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0];

#[derive(Clone)]
pub struct Metrics {
    requests_total: IntCounterVec,
    request_duration: HistogramVec,
    active_jobs: IntGauge,
    contacts_found_total: IntCounterVec,
    robots_blocked_total: IntCounterVec,
}

impl Metrics {
    /// Registers every collector on `registry`. Registration failures (a
    /// duplicate name, most likely in tests) are logged, not propagated — a
    /// crawl must never fail because metrics couldn't be wired up.
    pub fn new(registry: &Registry) -> Self {
        let requests_total = IntCounterVec::new(
            Opts::new("crawl_requests_total", "Total page fetch attempts by outcome"),
            &["status", "host"],
        )
        .expect("valid metric opts");
        let request_duration = HistogramVec::new(
            prometheus::HistogramOpts::new(
                "crawl_duration_seconds",
                "Page fetch duration in seconds",
            )
            .buckets(DURATION_BUCKETS.to_vec()),
            &["host"],
        )
        .expect("valid metric opts");
        let active_jobs = IntGauge::new("crawl_active_jobs", "Number of crawl jobs in flight")
            .expect("valid metric opts");
        let contacts_found_total = IntCounterVec::new(
            Opts::new("contacts_found_total", "Contact records emitted by email type"),
            &["type"],
        )
        .expect("valid metric opts");
        let robots_blocked_total = IntCounterVec::new(
            Opts::new("robots_blocked_total", "Pages skipped due to robots.txt"),
            &["host"],
        )
        .expect("valid metric opts");

        for collector in [
            Box::new(requests_total.clone()) as Box<dyn prometheus::core::Collector>,
            Box::new(request_duration.clone()),
            Box::new(active_jobs.clone()),
            Box::new(contacts_found_total.clone()),
            Box::new(robots_blocked_total.clone()),
        ] {
            if let Err(error) = registry.register(collector) {
                tracing::warn!(%error, "failed to register metric collector");
            }
        }

        Self {
            requests_total,
            request_duration,
            active_jobs,
            contacts_found_total,
            robots_blocked_total,
        }
    }

    /// Builds a standalone `Metrics` with its own private registry, for use
    /// in tests or one-off jobs that don't need a shared exporter.
    pub fn standalone() -> Self {
        Self::new(&Registry::new())
    }

    pub fn record_request(&self, status: &str, host: &str, duration: Duration) {
        self.requests_total.with_label_values(&[status, host]).inc();
        self.request_duration
            .with_label_values(&[host])
            .observe(duration.as_secs_f64());
    }

    pub fn record_robots_blocked(&self, host: &str) {
        self.robots_blocked_total.with_label_values(&[host]).inc();
    }

    pub fn record_contact_found(&self, email_type: &str) {
        self.contacts_found_total.with_label_values(&[email_type]).inc();
    }

    pub fn job_started(&self) {
        self.active_jobs.inc();
    }

    pub fn job_finished(&self) {
        self.active_jobs.dec();
    }
}
