use crate::FilterError;

/// Turns a free-form label into a URL path slug
///
/// Lowercases, drops dots, and joins whitespace-separated words with `-`.
/// Path separators are folded into `-` so a label can never add segments.
///
/// # Examples
///
/// ```
/// use internship_scout::query::slugify;
///
/// assert_eq!(slugify("Software Development"), "software-development");
/// assert_eq!(slugify(".NET Development"), "net-development");
/// ```
pub fn slugify(text: &str) -> String {
    text.to_lowercase()
        .replace('.', "")
        .replace(['/', '\\'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

/// Extracts the numeric amount from a free-form stipend filter
///
/// Returns `Ok(None)` for an empty filter (no constraint). Formatting such as
/// currency symbols or thousands separators is ignored, so `"₹10,000"` and
/// `"10000"` select the same listing page.
pub fn stipend_amount(raw: &str) -> Result<Option<String>, FilterError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let digits: String = trimmed.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return Err(FilterError::InvalidStipend(trimmed.to_string()));
    }

    Ok(Some(digits))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Accounts"), "accounts");
        assert_eq!(slugify("  Data   Science "), "data-science");
        assert_eq!(slugify("UI/UX Design"), "ui-ux-design");
    }

    #[test]
    fn test_stipend_amount() {
        assert_eq!(stipend_amount("").unwrap(), None);
        assert_eq!(stipend_amount("   ").unwrap(), None);
        assert_eq!(stipend_amount("5000").unwrap(), Some("5000".to_string()));
        assert_eq!(stipend_amount("₹10,000").unwrap(), Some("10000".to_string()));
        assert_eq!(
            stipend_amount("negotiable").unwrap_err(),
            FilterError::InvalidStipend("negotiable".to_string())
        );
    }
}
