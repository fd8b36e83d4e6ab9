//! The Record Builder: turns one site's aggregated result into the
//! `ContactRecord`s that are this crate's actual product.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::{ContactRecord, SiteResult};

static CONTACT_PAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(kontakt|contact)").expect("valid regex"));

/// Picks the first source page whose path matches `/kontakt|contact/i`, per
/// §4.11 step 5.
fn pick_contact_page(site: &SiteResult) -> Option<String> {
    site.source_pages
        .iter()
        .find(|url| {
            url::Url::parse(url)
                .map(|u| CONTACT_PAGE.is_match(u.path()))
                .unwrap_or(false)
        })
        .cloned()
}

/// Builds one `ContactRecord` per aggregated email in `site`, each carrying
/// the site's first phone and the first contact-like page found.
pub fn build_records(site: &SiteResult) -> Vec<ContactRecord> {
    let phone = site.phones.iter().next().cloned();
    let contact_page = pick_contact_page(site);

    site.emails
        .iter()
        .map(|(email, aggregated)| ContactRecord {
            source_url: site.website.clone(),
            domain: site.domain.clone(),
            email: email.clone(),
            email_type: aggregated.email_type,
            confidence: aggregated.confidence,
            discovery_path: aggregated.discovery_path,
            phone: phone.clone(),
            contact_page: contact_page.clone(),
            social: site.socials.clone(),
            raw_evidence: aggregated
                .sources
                .iter()
                .map(|s| s.as_str().to_string())
                .collect(),
            timestamp: chrono::Utc::now(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AggregatedEmail, DiscoveryPath, EmailType, Socials};
    use indexmap::{IndexMap, IndexSet};

    fn sample_site() -> SiteResult {
        let mut emails = IndexMap::new();
        emails.insert(
            "info@acme.se".to_string(),
            AggregatedEmail {
                email_type: EmailType::Role,
                confidence: 0.9,
                sources: vec![DiscoveryPath::Mailto, DiscoveryPath::Inline],
                discovery_path: DiscoveryPath::Mailto,
            },
        );
        let mut phones = IndexSet::new();
        phones.insert("+4684002227".to_string());
        let mut pages = IndexSet::new();
        pages.insert("https://acme.se/".to_string());
        pages.insert("https://acme.se/kontakt".to_string());

        SiteResult {
            company_name: "Acme AB".to_string(),
            website: "https://acme.se".to_string(),
            domain: "acme.se".to_string(),
            emails,
            phones,
            socials: Socials::default(),
            source_pages: pages,
            errors: Vec::new(),
        }
    }

    #[test]
    fn builds_one_record_per_email_with_phone_and_contact_page() {
        let site = sample_site();
        let records = build_records(&site);
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.email, "info@acme.se");
        assert_eq!(record.phone.as_deref(), Some("+4684002227"));
        assert_eq!(record.contact_page.as_deref(), Some("https://acme.se/kontakt"));
        assert_eq!(record.confidence, 0.9);
        assert_eq!(record.raw_evidence.len(), 2);
    }

    #[test]
    fn empty_site_produces_no_records() {
        let mut site = sample_site();
        site.emails.clear();
        assert!(build_records(&site).is_empty());
    }
}
