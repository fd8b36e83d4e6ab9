//! The Captcha/Challenge Detector: a cheap substring scan over a page body
//! that skips pages we'd otherwise extract garbage (or nothing) from.

/// Which challenge vendor a page appears to present, in priority order when
/// more than one pattern matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChallengeType {
    Recaptcha,
    Hcaptcha,
    Cloudflare,
}

impl ChallengeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChallengeType::Recaptcha => "recaptcha",
            ChallengeType::Hcaptcha => "hcaptcha",
            ChallengeType::Cloudflare => "cloudflare",
        }
    }
}

const RECAPTCHA_PATTERNS: &[&str] = &["recaptcha", "g-recaptcha", "grecaptcha"];
const HCAPTCHA_PATTERNS: &[&str] = &["hcaptcha"];
const CLOUDFLARE_PATTERNS: &[&str] = &[
    "cloudflare",
    "cf-browser-verification",
    "challenge-platform",
    "just a moment",
    "attention required",
];

/// Scans `body` for known challenge-page markers, case-insensitively.
/// Returns `None` if the page looks like ordinary content.
pub fn detect_challenge(body: &str) -> Option<ChallengeType> {
    let lower = body.to_lowercase();

    if RECAPTCHA_PATTERNS.iter().any(|p| lower.contains(p)) {
        return Some(ChallengeType::Recaptcha);
    }
    if HCAPTCHA_PATTERNS.iter().any(|p| lower.contains(p)) {
        return Some(ChallengeType::Hcaptcha);
    }
    if CLOUDFLARE_PATTERNS.iter().any(|p| lower.contains(p)) {
        return Some(ChallengeType::Cloudflare);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_recaptcha() {
        let body = r#"<div class="g-recaptcha" data-sitekey="x"></div>"#;
        assert_eq!(detect_challenge(body), Some(ChallengeType::Recaptcha));
    }

    #[test]
    fn detects_hcaptcha() {
        let body = r#"<script src="https://hcaptcha.com/1/api.js"></script>"#;
        assert_eq!(detect_challenge(body), Some(ChallengeType::Hcaptcha));
    }

    #[test]
    fn detects_cloudflare_challenge_page() {
        let body = "Checking your browser before accessing... Just a moment...";
        assert_eq!(detect_challenge(body), Some(ChallengeType::Cloudflare));
    }

    #[test]
    fn recaptcha_takes_priority_over_cloudflare() {
        let body = "cloudflare g-recaptcha";
        assert_eq!(detect_challenge(body), Some(ChallengeType::Recaptcha));
    }

    #[test]
    fn ordinary_page_has_no_challenge() {
        let body = "<html><body><h1>Kontakta oss</h1></body></html>";
        assert_eq!(detect_challenge(body), None);
    }
}
