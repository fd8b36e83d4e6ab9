//! The DNC/TOS Filter: two runtime-mutable domain-suppression services.
//! Reads are frequent and cheap; writes are rare and serialized behind a
//! single writer lock so a reader is never blocked by another reader.

use std::collections::HashMap;
use std::sync::RwLock;

/// Do-Not-Contact list: hosts matching a registered domain exactly, or as a
/// dot-suffix of it, are never crawled.
#[derive(Default)]
pub struct DncList {
    domains: RwLock<std::collections::HashSet<String>>,
}

impl DncList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, domain: &str) {
        self.domains.write().expect("lock poisoned").insert(domain.to_lowercase());
    }

    pub fn remove(&self, domain: &str) {
        self.domains.write().expect("lock poisoned").remove(&domain.to_lowercase());
    }

    /// Whether `host` is on the list, matching exactly or as a dot-suffix of
    /// a registered domain (so `sub.acme.se` matches a registered `acme.se`).
    pub fn has(&self, host: &str) -> bool {
        let host = host.to_lowercase();
        let domains = self.domains.read().expect("lock poisoned");
        domains
            .iter()
            .any(|domain| &host == domain || host.ends_with(&format!(".{domain}")))
    }
}

const TOS_RESTRICTED: &[(&str, &str)] = &[
    ("linkedin.com", "LinkedIn terms of service restrict automated access"),
    ("facebook.com", "Facebook terms of service restrict automated access"),
    ("instagram.com", "Instagram terms of service restrict automated access"),
    ("twitter.com", "Twitter/X terms of service restrict automated access"),
    ("x.com", "Twitter/X terms of service restrict automated access"),
];

/// Terms-of-Service advisory list: a substring hit doesn't block the crawl,
/// but is appended as a warning to the site's errors.
pub struct TosList {
    overrides: RwLock<HashMap<String, String>>,
}

impl Default for TosList {
    fn default() -> Self {
        Self {
            overrides: RwLock::new(
                TOS_RESTRICTED
                    .iter()
                    .map(|(domain, reason)| (domain.to_string(), reason.to_string()))
                    .collect(),
            ),
        }
    }
}

impl TosList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, domain: &str, reason: &str) {
        self.overrides
            .write()
            .expect("lock poisoned")
            .insert(domain.to_lowercase(), reason.to_string());
    }

    pub fn remove(&self, domain: &str) {
        self.overrides.write().expect("lock poisoned").remove(&domain.to_lowercase());
    }

    /// Returns the first matching reason if `host` contains a registered
    /// domain as a substring.
    pub fn matches(&self, host: &str) -> Option<String> {
        let host = host.to_lowercase();
        self.overrides
            .read()
            .expect("lock poisoned")
            .iter()
            .find(|(domain, _)| host.contains(domain.as_str()))
            .map(|(_, reason)| reason.clone())
    }
}
