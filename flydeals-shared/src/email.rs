/// Trims and lower-cases an email address, returning `None` when the result
/// is not a plausible `local@domain.tld` address.
///
/// The check is deliberately shallow: one `@`, a non-empty local part, and a
/// dotted domain without empty labels or whitespace.
pub fn normalize_email(raw: &str) -> Option<String> {
    let email = raw.trim().to_lowercase();

    if email.chars().any(char::is_whitespace) {
        return None;
    }

    let (local, domain) = email.split_once('@')?;
    if local.is_empty() || domain.contains('@') {
        return None;
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|label| label.is_empty()) {
        return None;
    }

    Some(email)
}
