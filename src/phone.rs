//! The Phone Parser: candidate regex plus E.164 normalization against a
//! Swedish default region.

use std::str::FromStr;

use phonenumber::country::Id as CountryId;
use phonenumber::Mode;

/// Strips separators from a raw candidate and rewrites a leading national `0`
/// into the Swedish international prefix.
fn normalize_candidate(raw: &str) -> String {
    let stripped: String = raw
        .chars()
        .filter(|c| !matches!(c, '(' | ')' | ' ' | '.' | '-'))
        .collect();

    if let Some(rest) = stripped.strip_prefix('0') {
        format!("+46{rest}")
    } else {
        stripped
    }
}

fn has_long_digit_run(e164: &str) -> bool {
    let mut last = None;
    let mut run = 0;
    for c in e164.chars().filter(|c| c.is_ascii_digit()) {
        if Some(c) == last {
            run += 1;
            if run >= 7 {
                return true;
            }
        } else {
            last = Some(c);
            run = 1;
        }
    }
    false
}

/// Parses one phone candidate, accepting it only if it's a valid Swedish
/// E.164 number of plausible length with no pathological repeated digits.
pub fn parse_candidate(raw: &str) -> Option<String> {
    let normalized = normalize_candidate(raw);
    if !normalized.starts_with('+') {
        return None;
    }

    let number = phonenumber::parse(Some(CountryId::SE), &normalized).ok()?;
    if !phonenumber::is_valid(&number) {
        return None;
    }
    if number.country().id() != Some(CountryId::SE) {
        return None;
    }

    let formatted = number.format().mode(Mode::E164).to_string();
    let digit_count = formatted.chars().filter(|c| c.is_ascii_digit()).count();
    if !(9..=15).contains(&digit_count) {
        return None;
    }
    if has_long_digit_run(&formatted) {
        return None;
    }

    Some(formatted)
}

/// Parses every candidate and deduplicates the resulting E.164 numbers,
/// preserving first-seen order.
pub fn parse_and_dedup(candidates: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut result = Vec::new();
    for candidate in candidates {
        if let Some(parsed) = parse_candidate(candidate) {
            if seen.insert(parsed.clone()) {
                result.push(parsed);
            }
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_national_format_to_swedish_e164() {
        let parsed = parse_candidate("08-123 456 78");
        assert_eq!(parsed.as_deref(), Some("+46812345678"));
    }

    #[test]
    fn accepts_already_international_number() {
        let parsed = parse_candidate("+46 8 400 222 7");
        assert!(parsed.is_some());
    }

    #[test]
    fn rejects_repeated_digit_run() {
        assert_eq!(parse_candidate("+46000000000"), None);
    }

    #[test]
    fn rejects_non_swedish_number() {
        assert_eq!(parse_candidate("+1 202 555 0191"), None);
    }

    #[test]
    fn dedup_preserves_first_seen_order() {
        let candidates = vec![
            "08-123 456 78".to_string(),
            "+46812345678".to_string(),
            "08-765 432 10".to_string(),
        ];
        let parsed = parse_and_dedup(&candidates);
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0], "+46812345678");
    }
}
