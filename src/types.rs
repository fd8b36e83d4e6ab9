//! Shared data-model types that flow between the extractor, classifier, site
//! crawler, and record builder. Pure values — no I/O, no ownership links.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

/// Where an email was first surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiscoveryPath {
    JsonLd,
    Mailto,
    Footer,
    Inline,
}

impl DiscoveryPath {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscoveryPath::JsonLd => "json-ld",
            DiscoveryPath::Mailto => "mailto",
            DiscoveryPath::Footer => "footer",
            DiscoveryPath::Inline => "inline",
        }
    }
}

/// Classification of an email address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailType {
    Role,
    Personal,
    Generic,
    Unknown,
}

impl EmailType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmailType::Role => "role",
            EmailType::Personal => "personal",
            EmailType::Generic => "generic",
            EmailType::Unknown => "unknown",
        }
    }
}

/// One raw sighting of an email on a page, before aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailEvidence {
    pub email: String,
    pub source: DiscoveryPath,
    pub confidence: f64,
    pub context: Option<String>,
}

/// Social profile links discovered via JSON-LD `sameAs`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Socials {
    pub linkedin: Option<String>,
    pub facebook: Option<String>,
    pub x: Option<String>,
}

impl Socials {
    /// Applies `other` on top of `self`, keeping `self`'s value whenever it is
    /// already set — first non-empty value wins (I5).
    pub fn merge_first_wins(&mut self, other: &Socials) {
        if self.linkedin.is_none() {
            self.linkedin = other.linkedin.clone();
        }
        if self.facebook.is_none() {
            self.facebook = other.facebook.clone();
        }
        if self.x.is_none() {
            self.x = other.x.clone();
        }
    }

    pub fn is_empty(&self) -> bool {
        self.linkedin.is_none() && self.facebook.is_none() && self.x.is_none()
    }
}

/// The cacheable result of crawling a single URL.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerUrlResult {
    pub emails: Vec<EmailEvidence>,
    pub phones: Vec<String>,
    pub socials: Socials,
}

/// An email's aggregated state within one site's result: classified once on
/// first sighting, with sources accumulating on every later sighting (I1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedEmail {
    pub email_type: EmailType,
    pub confidence: f64,
    pub sources: Vec<DiscoveryPath>,
    pub discovery_path: DiscoveryPath,
}

/// A recorded per-URL or site-level failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlErrorEntry {
    pub url: Option<String>,
    pub reason: String,
}

/// The aggregated result of crawling one site across all attempted pages.
#[derive(Debug, Clone, Default)]
pub struct SiteResult {
    pub company_name: String,
    pub website: String,
    pub domain: String,
    pub emails: IndexMap<String, AggregatedEmail>,
    pub phones: IndexSet<String>,
    pub socials: Socials,
    pub source_pages: IndexSet<String>,
    pub errors: Vec<CrawlErrorEntry>,
}

impl SiteResult {
    pub fn new(company_name: impl Into<String>, website: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            company_name: company_name.into(),
            website: website.into(),
            domain: domain.into(),
            ..Default::default()
        }
    }
}

/// A validated, emitted contact record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactRecord {
    pub source_url: String,
    pub domain: String,
    pub email: String,
    pub email_type: EmailType,
    pub confidence: f64,
    pub discovery_path: DiscoveryPath,
    pub phone: Option<String>,
    pub contact_page: Option<String>,
    pub social: Socials,
    pub raw_evidence: Vec<String>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn socials_first_wins() {
        let mut a = Socials {
            linkedin: Some("https://linkedin.com/a".to_string()),
            facebook: None,
            x: None,
        };
        let b = Socials {
            linkedin: Some("https://linkedin.com/b".to_string()),
            facebook: Some("https://facebook.com/b".to_string()),
            x: None,
        };
        a.merge_first_wins(&b);
        assert_eq!(a.linkedin, Some("https://linkedin.com/a".to_string()));
        assert_eq!(a.facebook, Some("https://facebook.com/b".to_string()));
    }
}
