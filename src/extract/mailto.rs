//! `mailto:` anchor extraction, including the footer-scoped variant.

use scraper::{Html, Selector};

use crate::types::{DiscoveryPath, EmailEvidence};

const MAILTO_CONFIDENCE: f64 = 0.85;
const FOOTER_MAILTO_CONFIDENCE: f64 = 0.60;

fn clean_mailto_href(href: &str) -> Option<String> {
    let email = href.strip_prefix("mailto:")?;
    let email = email.split('?').next().unwrap_or(email).trim();
    if email.is_empty() {
        None
    } else {
        Some(email.to_string())
    }
}

/// Extracts every `mailto:` anchor on the page, plus the footer-scoped
/// subset at the lower confidence the spec assigns footer evidence.
pub fn extract(document: &Html) -> Vec<EmailEvidence> {
    let selector = Selector::parse(r#"a[href^="mailto:"]"#).expect("valid selector");
    let footer_selector = Selector::parse("footer").expect("valid selector");

    let mut footers = document.select(&footer_selector);
    let mut evidence = Vec::new();
    let mut seen_in_footer: std::collections::HashSet<String> = std::collections::HashSet::new();

    if let Some(footer) = footers.next() {
        for anchor in footer.select(&selector) {
            if let Some(href) = anchor.value().attr("href") {
                if let Some(email) = clean_mailto_href(href) {
                    seen_in_footer.insert(email.clone());
                    evidence.push(EmailEvidence {
                        email,
                        source: DiscoveryPath::Footer,
                        confidence: FOOTER_MAILTO_CONFIDENCE,
                        context: None,
                    });
                }
            }
        }
    }

    for anchor in document.select(&selector) {
        if let Some(href) = anchor.value().attr("href") {
            if let Some(email) = clean_mailto_href(href) {
                if seen_in_footer.contains(&email) {
                    continue;
                }
                evidence.push(EmailEvidence {
                    email,
                    source: DiscoveryPath::Mailto,
                    confidence: MAILTO_CONFIDENCE,
                    context: None,
                });
            }
        }
    }

    evidence
}
