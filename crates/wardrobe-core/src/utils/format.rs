use chrono::{DateTime, Utc};

/// Two-letter avatar initials for an e-mail address.
///
/// The local part is split on `.`, `_` and `-`; with two or more pieces the
/// first letter of the first two is used, otherwise the first two characters
/// of the address.
pub fn initials(email: &str) -> String {
    if email.is_empty() {
        return "U".to_string();
    }
    let local = email.split_once('@').map_or(email, |(local, _)| local);
    let parts: Vec<&str> = local
        .split(|c| matches!(c, '.' | '_' | '-'))
        .filter(|p| !p.is_empty())
        .collect();

    let letters: String = match parts.as_slice() {
        [first, second, ..] => first.chars().take(1).chain(second.chars().take(1)).collect(),
        _ => email.chars().take(2).collect(),
    };
    letters.to_uppercase()
}

/// Truncate a string to a maximum length in characters, adding ellipsis if needed
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// Format a timestamp for list display
pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.format("%b %d, %Y %H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_initials() {
        assert_eq!(initials("anna.petrova@example.com"), "AP");
        assert_eq!(initials("ivan_ivanov@example.com"), "II");
        assert_eq!(initials("stylist@example.com"), "ST");
        assert_eq!(initials(""), "U");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Shirt", 10), "Shirt");
        assert_eq!(truncate("Синяя рубашка в клетку", 8), "Синяя...");
        assert_eq!(truncate("Hi", 2), "Hi");
    }

    #[test]
    fn test_format_timestamp() {
        let dt = Utc.with_ymd_and_hms(2025, 3, 1, 9, 5, 0).unwrap();
        assert_eq!(format_timestamp(&dt), "Mar 01, 2025 09:05");
    }
}
