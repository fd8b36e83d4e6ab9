//! The Audit Trail: an append-only JSON-lines record of every completed site
//! crawl. Rotation/retention and shipping to a log aggregator are the
//! collaborator's job (§1); this crate only appends.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub job_id: uuid::Uuid,
    pub host: String,
    pub records_found: usize,
    pub user: String,
    pub action: String,
}

impl AuditEntry {
    pub fn crawl(job_id: uuid::Uuid, host: impl Into<String>, records_found: usize, user: impl Into<String>) -> Self {
        Self {
            timestamp: chrono::Utc::now(),
            job_id,
            host: host.into(),
            records_found,
            user: user.into(),
            action: "crawl".to_string(),
        }
    }
}

/// A sink that durably records completed-site audit entries.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, entry: AuditEntry);
}

/// Appends each entry as one JSON-lines record to a file, opening it once
/// and reusing the handle under a mutex for the lifetime of the sink.
pub struct FileAuditSink {
    file: Mutex<tokio::fs::File>,
}

impl FileAuditSink {
    pub async fn open(path: &str) -> std::io::Result<Self> {
        let file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

#[async_trait]
impl AuditSink for FileAuditSink {
    async fn record(&self, entry: AuditEntry) {
        let Ok(mut line) = serde_json::to_string(&entry) else {
            tracing::warn!("failed to serialize audit entry, dropping it");
            return;
        };
        line.push('\n');

        let mut file = self.file.lock().await;
        if let Err(error) = file.write_all(line.as_bytes()).await {
            tracing::warn!(%error, "failed to append audit entry");
        }
    }
}

/// A sink that discards every entry, for tests and offline tooling.
pub struct NoopAuditSink;

#[async_trait]
impl AuditSink for NoopAuditSink {
    async fn record(&self, _entry: AuditEntry) {}
}
