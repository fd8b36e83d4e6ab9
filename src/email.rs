//! The Email Classifier/Scorer: type classification, integer scoring, strict
//! format validation, and the cleaning pipeline applied before aggregation.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::EmailType;

const ALLOWED_TLDS: &[&str] = &["se", "com", "info", "nu", "org", "net"];

static ROLE_LOCALPART: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(info|kontakt|support|sales|kundtjanst|office|hej|hello|contact|admin|webmaster|inquiry|service)$",
    )
    .expect("valid regex")
});

static PERSONAL_DOMAIN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)@(gmail|hotmail|outlook|yahoo|live|icloud|protonmail|me\.com|aol|gmx|mail\.com)")
        .expect("valid regex")
});

static GENERIC_LOCALPART: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^[a-z]{1,2}$|^no-?reply").expect("valid regex"));

static NOREPLY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)noreply|no-reply|donotreply").expect("valid regex"));

static TEST_PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)test|example|placeholder").expect("valid regex"));

static REJECT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)example\.com|user@domain\.com|noreply|donotreply|no-reply|test@|placeholder|u003e")
        .expect("valid regex")
});

static STRICT_FORMAT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[a-z0-9._%+\-]+@[a-z0-9.\-]+\.[a-z]{2,24}$").expect("valid regex")
});

/// Splits `email` into `(localpart, domain)`, both lowercased. Callers must
/// have already confirmed the address matches [`is_valid_format`].
fn split(email: &str) -> Option<(&str, &str)> {
    email.split_once('@')
}

pub fn is_valid_format(email: &str) -> bool {
    STRICT_FORMAT.is_match(email)
}

/// Whether `domain` is (a substring match on) the company's own site host —
/// either side may be the longer one, per the spec's "ends with" wording.
fn is_company_domain(domain: &str, site_host: &str) -> bool {
    let domain = domain.to_lowercase();
    let site_host = site_host.to_lowercase();
    site_host.ends_with(&domain) || domain.ends_with(&site_host)
}

/// Classifies an already-format-validated email against the site it was
/// found on.
pub fn classify(email: &str, site_host: &str) -> EmailType {
    let Some((localpart, domain)) = split(email) else {
        return EmailType::Unknown;
    };

    if ROLE_LOCALPART.is_match(localpart) {
        return EmailType::Role;
    }
    if PERSONAL_DOMAIN.is_match(email) {
        return EmailType::Personal;
    }
    if is_company_domain(domain, site_host) {
        return if GENERIC_LOCALPART.is_match(localpart) {
            EmailType::Generic
        } else {
            EmailType::Role
        };
    }
    EmailType::Unknown
}

/// Computes the integer score (clamped to [0,100]) for an email, given its
/// classification and the site it was found on.
pub fn score(email: &str, email_type: EmailType, site_host: &str) -> i32 {
    let Some((localpart, domain)) = split(email) else {
        return 0;
    };

    let mut score: i32 = 50;

    if is_company_domain(domain, site_host) {
        score += 30;
    }

    match email_type {
        EmailType::Role => score += 20,
        EmailType::Personal => score -= 10,
        EmailType::Generic => score -= 20,
        EmailType::Unknown => {}
    }

    if ROLE_LOCALPART.is_match(localpart) {
        score += 10;
    }

    if NOREPLY.is_match(email) {
        score -= 50;
    }
    if TEST_PLACEHOLDER.is_match(email) {
        score -= 50;
    }

    score.clamp(0, 100)
}

/// The full cleaning pipeline applied to every raw extracted email before it
/// is allowed into a site's aggregated result. Returns `None` if the email
/// should be discarded.
pub fn clean(raw: &str) -> Option<String> {
    let email = raw.trim().to_lowercase();

    if REJECT_PATTERN.is_match(&email) {
        return None;
    }
    if !is_valid_format(&email) {
        return None;
    }

    let (_, domain) = split(&email)?;
    let tld = domain.rsplit('.').next()?.to_lowercase();
    if !ALLOWED_TLDS.contains(&tld.as_str()) {
        return None;
    }

    Some(email)
}
