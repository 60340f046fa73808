use regex::Regex;
use std::sync::OnceLock;

use super::ApiError;
use crate::constants::{reviews, titles, users};

fn offending_username_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^A-Za-z0-9_.@+-]").expect("Invalid regex"))
}

fn email_shape() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("Invalid regex"))
}

pub fn validate_year(year: i32) -> Result<i32, ApiError> {
    use chrono::Datelike;
    let current_year = chrono::Utc::now().year();

    if year < titles::MIN_YEAR || year > current_year {
        return Err(ApiError::validation(format!(
            "{} is not a valid year. Expected a value between {} and {}",
            year,
            titles::MIN_YEAR,
            current_year
        )));
    }
    Ok(year)
}

pub fn validate_score(score: i16) -> Result<i16, ApiError> {
    if !(reviews::MIN_SCORE..=reviews::MAX_SCORE).contains(&score) {
        return Err(ApiError::validation(format!(
            "Invalid score: {}. Score must be between {} and {}",
            score,
            reviews::MIN_SCORE,
            reviews::MAX_SCORE
        )));
    }
    Ok(score)
}

/// Check a username against the reserved list and the allowed character set.
/// The rejection message names the exact characters that were refused, not
/// just the rule.
pub fn validate_username(name: &str) -> Result<&str, ApiError> {
    if name.is_empty() {
        return Err(ApiError::validation("Username cannot be empty"));
    }

    if name.len() > users::LENGTH_NAME {
        return Err(ApiError::validation(format!(
            "Username must be {} characters or less",
            users::LENGTH_NAME
        )));
    }

    if users::RESERVED_USERNAMES
        .iter()
        .any(|reserved| name.eq_ignore_ascii_case(reserved))
    {
        return Err(ApiError::validation(format!(
            "Username '{name}' is reserved and cannot be used"
        )));
    }

    let mut offending: Vec<char> = Vec::new();
    for found in offending_username_chars().find_iter(name) {
        for c in found.as_str().chars() {
            if !offending.contains(&c) {
                offending.push(c);
            }
        }
    }
    if !offending.is_empty() {
        let listed: String = offending
            .iter()
            .map(|c| format!("'{c}'"))
            .collect::<Vec<_>>()
            .join(", ");
        return Err(ApiError::validation(format!(
            "Username contains forbidden characters: {listed}. Only letters, digits and @/./+/-/_ are allowed"
        )));
    }

    Ok(name)
}

pub fn validate_email(email: &str) -> Result<&str, ApiError> {
    if email.is_empty() {
        return Err(ApiError::validation("Email cannot be empty"));
    }

    if email.len() > users::LENGTH_EMAIL {
        return Err(ApiError::validation(format!(
            "Email must be {} characters or less",
            users::LENGTH_EMAIL
        )));
    }

    if !email_shape().is_match(email) {
        return Err(ApiError::validation(format!(
            "'{email}' is not a valid email address"
        )));
    }

    Ok(email)
}

pub fn validate_slug(slug: &str) -> Result<&str, ApiError> {
    if slug.is_empty() {
        return Err(ApiError::validation("Slug cannot be empty"));
    }

    if slug.len() > titles::LENGTH_SLUG {
        return Err(ApiError::validation(format!(
            "Slug must be {} characters or less",
            titles::LENGTH_SLUG
        )));
    }

    if !slug
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ApiError::validation(format!(
            "'{slug}' is not a valid slug. Only letters, digits, hyphens and underscores are allowed"
        )));
    }

    Ok(slug)
}

pub fn validate_name(name: &str) -> Result<&str, ApiError> {
    if name.is_empty() {
        return Err(ApiError::validation("Name cannot be empty"));
    }

    if name.len() > titles::LENGTH_NAME {
        return Err(ApiError::validation(format!(
            "Name must be {} characters or less",
            titles::LENGTH_NAME
        )));
    }

    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn error_message(err: ApiError) -> String {
        err.to_string()
    }

    #[test]
    fn test_validate_year_bounds() {
        use chrono::Datelike;
        let current_year = chrono::Utc::now().year();

        assert!(validate_year(current_year).is_ok());
        assert!(validate_year(1965).is_ok());
        assert!(validate_year(crate::constants::titles::MIN_YEAR).is_ok());
        assert!(validate_year(current_year + 1).is_err());
        assert!(validate_year(crate::constants::titles::MIN_YEAR - 1).is_err());
    }

    #[test]
    fn test_validate_score_bounds() {
        assert!(validate_score(1).is_ok());
        assert!(validate_score(10).is_ok());
        assert!(validate_score(0).is_err());
        assert!(validate_score(11).is_err());
    }

    #[test]
    fn test_validate_username_reserved() {
        for name in ["me", "Me", "ME", "mE"] {
            let err = validate_username(name).unwrap_err();
            assert!(error_message(err).contains("reserved"));
        }
    }

    #[test]
    fn test_validate_username_charset() {
        assert!(validate_username("alice").is_ok());
        assert!(validate_username("a.li_ce@x+y-z").is_ok());

        let err = validate_username("al ice!").unwrap_err();
        let msg = error_message(err);
        assert!(msg.contains("' '"));
        assert!(msg.contains("'!'"));
        assert!(!msg.contains("'a'"));
    }

    #[test]
    fn test_validate_username_lists_each_offender_once() {
        let err = validate_username("a##b##c").unwrap_err();
        let msg = error_message(err);
        assert_eq!(msg.matches("'#'").count(), 1);
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("a@x.com").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("two@@x.com").is_err());
    }

    #[test]
    fn test_validate_slug() {
        assert!(validate_slug("sci-fi").is_ok());
        assert!(validate_slug("movies_2").is_ok());
        assert!(validate_slug("").is_err());
        assert!(validate_slug("bad slug").is_err());
        assert!(validate_slug(&"a".repeat(51)).is_err());
    }
}
