//! Masking helpers applied to every log record carrying `email`/`phone` fields.
//!
//! The audit trail and the `ContactRecord`s returned to callers are unmasked by
//! design — masking applies only to the logging path.

/// Masks an email as `first 2 chars + "***@" + domain`.
pub fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => {
            let prefix: String = local.chars().take(2).collect();
            format!("{prefix}***@{domain}")
        }
        None => "***".to_string(),
    }
}

/// Masks a phone number as `first "+NN" + "****" + last 2 digits`.
pub fn mask_phone(phone: &str) -> String {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();
    if !phone.starts_with('+') || digits.len() < 4 {
        return "****".to_string();
    }
    let country: String = digits.chars().take(2).collect();
    let tail: String = digits.chars().rev().take(2).collect::<Vec<_>>().into_iter().rev().collect();
    format!("+{country}****{tail}")
}

/// Masks every element of a list of emails.
pub fn mask_emails<'a>(emails: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    emails.into_iter().map(mask_email).collect()
}

/// Masks every element of a list of phone numbers.
pub fn mask_phones<'a>(phones: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    phones.into_iter().map(mask_phone).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_email_keeping_domain() {
        assert_eq!(mask_email("info@example.se"), "in***@example.se");
    }

    #[test]
    fn masks_short_local_part() {
        assert_eq!(mask_email("a@example.se"), "a***@example.se");
    }

    #[test]
    fn masks_malformed_email_fully() {
        assert_eq!(mask_email("not-an-email"), "***");
    }

    #[test]
    fn masks_phone_keeping_country_and_tail() {
        assert_eq!(mask_phone("+46840022271"), "+46****71");
    }

    #[test]
    fn masks_non_e164_phone_fully() {
        assert_eq!(mask_phone("0840022271"), "****");
    }
}
