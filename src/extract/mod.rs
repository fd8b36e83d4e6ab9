//! The Extractor: four independent sub-extractors over one parsed HTML
//! document, merged into a single set of raw evidence for a page.

mod inline;
mod jsonld;
mod mailto;

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;

use crate::types::{EmailEvidence, Socials};

const PHONE_CANDIDATE_PATTERN: &str = r"(\+?\d[\d\s().\-]{5,}\d)";

static CONTACT_LIKE_PATH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(kontakt|kontakta|about|om|team|medarbetare|personal|ledning|contact)")
        .expect("valid regex")
});

static PHONE_CANDIDATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(PHONE_CANDIDATE_PATTERN).expect("valid regex"));

/// Whether `path` looks like a contact/about page, per the key-pages regex
/// shared with the extractor's inline-text confidence rule.
pub fn is_contact_like_path(path: &str) -> bool {
    CONTACT_LIKE_PATH.is_match(path)
}

/// Everything extracted from one fetched page, before cleaning/scoring.
pub struct ExtractedPage {
    pub emails: Vec<EmailEvidence>,
    pub phone_candidates: Vec<String>,
    pub socials: Socials,
}

/// Runs all four sub-extractors over `body` and merges their output.
/// `path` is used only to decide whether inline-text evidence gets the
/// higher "contact-like" confidence.
pub fn extract(body: &str, path: &str) -> ExtractedPage {
    let document = Html::parse_document(body);
    let contact_like = is_contact_like_path(path);

    let mut emails = Vec::new();
    let (jsonld_emails, jsonld_phones, socials) = jsonld::extract(&document);
    emails.extend(jsonld_emails);
    emails.extend(mailto::extract(&document));
    emails.extend(inline::extract(&document, contact_like));

    let mut phone_candidates = jsonld_phones;
    phone_candidates.extend(tel_href_candidates(&document));
    phone_candidates.extend(body_text_phone_candidates(&document));

    ExtractedPage {
        emails,
        phone_candidates,
        socials,
    }
}

fn tel_href_candidates(document: &Html) -> Vec<String> {
    let selector = scraper::Selector::parse("a[href^=\"tel:\"]").expect("valid selector");
    document
        .select(&selector)
        .filter_map(|el| el.value().attr("href"))
        .map(|href| href.trim_start_matches("tel:").to_string())
        .collect()
}

fn body_text_phone_candidates(document: &Html) -> Vec<String> {
    let text = document.root_element().text().collect::<Vec<_>>().join(" ");
    PHONE_CANDIDATE
        .find_iter(&text)
        .map(|m| m.as_str().to_string())
        .collect()
}

const MAX_CONTACT_PAGE_LINKS: usize = 5;

/// Optional same-host contact-page discovery: collects anchor hrefs whose
/// path or visible text looks contact-like, for a caller that wants to
/// supplement the fixed candidate list rather than replace it.
pub fn discover_contact_links(body: &str, site_host: &str) -> Vec<String> {
    let document = Html::parse_document(body);
    let selector = scraper::Selector::parse("a[href]").expect("valid selector");

    let mut seen = std::collections::HashSet::new();
    let mut links = Vec::new();

    for anchor in document.select(&selector) {
        if links.len() >= MAX_CONTACT_PAGE_LINKS {
            break;
        }
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let text = anchor.text().collect::<Vec<_>>().join(" ");
        if !CONTACT_LIKE_PATH.is_match(href) && !CONTACT_LIKE_PATH.is_match(&text) {
            continue;
        }

        let Ok(url) = url::Url::parse(href).or_else(|_| {
            url::Url::parse(&format!("https://{site_host}")).and_then(|base| base.join(href))
        }) else {
            continue;
        };
        if url.host_str() != Some(site_host) {
            continue;
        }

        let normalized = url.to_string();
        if seen.insert(normalized.clone()) {
            links.push(normalized);
        }
    }

    links
}
