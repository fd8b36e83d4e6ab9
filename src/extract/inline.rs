//! Inline plain-text email extraction: the lowest-confidence path, used as a
//! fallback when nothing more structured is present.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;

use crate::types::{DiscoveryPath, EmailEvidence};

const CONTACT_PAGE_CONFIDENCE: f64 = 0.70;
const OTHER_PAGE_CONFIDENCE: f64 = 0.50;

static INLINE_EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,24}").expect("valid regex")
});

/// Scans the page's rendered text for bare email addresses. `contact_like`
/// raises the confidence assigned to every match on this page.
pub fn extract(document: &Html, contact_like: bool) -> Vec<EmailEvidence> {
    let confidence = if contact_like {
        CONTACT_PAGE_CONFIDENCE
    } else {
        OTHER_PAGE_CONFIDENCE
    };

    let text = document.root_element().text().collect::<Vec<_>>().join(" ");

    INLINE_EMAIL
        .find_iter(&text)
        .map(|m| EmailEvidence {
            email: m.as_str().to_string(),
            source: DiscoveryPath::Inline,
            confidence,
            context: None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_bare_email_from_body_text() {
        let document = Html::parse_document("<p>Reach us at info@example.se any time.</p>");
        let evidence = extract(&document, false);
        assert_eq!(evidence.len(), 1);
        assert_eq!(evidence[0].email, "info@example.se");
        assert_eq!(evidence[0].confidence, OTHER_PAGE_CONFIDENCE);
    }

    #[test]
    fn contact_like_pages_get_higher_confidence() {
        let document = Html::parse_document("<p>info@example.se</p>");
        let evidence = extract(&document, true);
        assert_eq!(evidence[0].confidence, CONTACT_PAGE_CONFIDENCE);
    }
}
