//! JSON-LD structured-data extraction: the highest-confidence source, since
//! these values are asserted by the site operator rather than scraped from
//! free text.

use scraper::{Html, Selector};
use serde_json::Value;

use crate::types::{DiscoveryPath, EmailEvidence, Socials};

const JSONLD_CONFIDENCE: f64 = 0.95;

const RELEVANT_TYPES: &[&str] = &[
    "Organization",
    "LocalBusiness",
    "Corporation",
    "Store",
    "ProfessionalService",
];

/// Extracts emails, phone candidates, and socials from every
/// `<script type="application/ld+json">` block on the page. Malformed JSON
/// is silently skipped.
pub fn extract(document: &Html) -> (Vec<EmailEvidence>, Vec<String>, Socials) {
    let selector = Selector::parse(r#"script[type="application/ld+json"]"#).expect("valid selector");

    let mut emails = Vec::new();
    let mut phones = Vec::new();
    let mut socials = Socials::default();

    for script in document.select(&selector) {
        let raw: String = script.text().collect();
        let Ok(value) = serde_json::from_str::<Value>(&raw) else {
            continue;
        };
        for item in flatten(&value) {
            if !is_relevant_type(item) {
                continue;
            }
            collect_from_object(item, &mut emails, &mut phones, &mut socials);
        }
    }

    (emails, phones, socials)
}

/// JSON-LD documents may be a single object, an array, or wrapped in a
/// top-level `@graph`; this normalizes all three shapes to a flat list.
fn flatten(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().collect(),
        Value::Object(map) => {
            if let Some(Value::Array(graph)) = map.get("@graph") {
                graph.iter().collect()
            } else {
                vec![value]
            }
        }
        _ => Vec::new(),
    }
}

fn is_relevant_type(value: &Value) -> bool {
    match value.get("@type") {
        Some(Value::String(t)) => RELEVANT_TYPES.contains(&t.as_str()),
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(|t| t.as_str())
            .any(|t| RELEVANT_TYPES.contains(&t)),
        _ => false,
    }
}

fn collect_from_object(
    object: &Value,
    emails: &mut Vec<EmailEvidence>,
    phones: &mut Vec<String>,
    socials: &mut Socials,
) {
    if let Some(email) = object.get("email").and_then(Value::as_str) {
        push_email(emails, email);
    }
    if let Some(phone) = object.get("telephone").and_then(Value::as_str) {
        phones.push(phone.to_string());
    }

    match object.get("sameAs") {
        Some(Value::Array(links)) => {
            for link in links.iter().filter_map(Value::as_str) {
                route_social(socials, link);
            }
        }
        Some(Value::String(link)) => route_social(socials, link),
        _ => {}
    }

    if let Some(points) = object.get("contactPoint") {
        let points = match points {
            Value::Array(items) => items.iter().collect::<Vec<_>>(),
            other => vec![other],
        };
        for point in points {
            if let Some(email) = point.get("email").and_then(Value::as_str) {
                push_email(emails, email);
            }
            if let Some(phone) = point.get("telephone").and_then(Value::as_str) {
                phones.push(phone.to_string());
            }
        }
    }
}

fn push_email(emails: &mut Vec<EmailEvidence>, email: &str) {
    emails.push(EmailEvidence {
        email: email.to_string(),
        source: DiscoveryPath::JsonLd,
        confidence: JSONLD_CONFIDENCE,
        context: None,
    });
}

fn route_social(socials: &mut Socials, link: &str) {
    let lower = link.to_lowercase();
    if lower.contains("linkedin.com") {
        socials.linkedin.get_or_insert_with(|| link.to_string());
    } else if lower.contains("facebook.com") {
        socials.facebook.get_or_insert_with(|| link.to_string());
    } else if lower.contains("x.com") || lower.contains("twitter.com") {
        socials.x.get_or_insert_with(|| link.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_email_and_sameas_from_organization() {
        let html = r#"
            <script type="application/ld+json">
            {"@type":"Organization","email":"kontakt@example.se","sameAs":["https://linkedin.com/company/x"]}
            </script>
        "#;
        let document = Html::parse_document(html);
        let (emails, _, socials) = extract(&document);
        assert_eq!(emails.len(), 1);
        assert_eq!(emails[0].email, "kontakt@example.se");
        assert_eq!(socials.linkedin, Some("https://linkedin.com/company/x".to_string()));
    }

    #[test]
    fn ignores_irrelevant_types() {
        let html = r#"
            <script type="application/ld+json">
            {"@type":"BreadcrumbList","email":"should-not-appear@example.se"}
            </script>
        "#;
        let document = Html::parse_document(html);
        let (emails, _, _) = extract(&document);
        assert!(emails.is_empty());
    }

    #[test]
    fn malformed_json_is_silently_skipped() {
        let html = r#"<script type="application/ld+json">{not valid json</script>"#;
        let document = Html::parse_document(html);
        let (emails, phones, socials) = extract(&document);
        assert!(emails.is_empty());
        assert!(phones.is_empty());
        assert!(socials.is_empty());
    }

    #[test]
    fn extracts_from_nested_contact_point() {
        let html = r#"
            <script type="application/ld+json">
            {"@type":"LocalBusiness","contactPoint":[{"email":"support@example.se","telephone":"+4684002227"}]}
            </script>
        "#;
        let document = Html::parse_document(html);
        let (emails, phones, _) = extract(&document);
        assert_eq!(emails[0].email, "support@example.se");
        assert_eq!(phones[0], "+4684002227");
    }
}
