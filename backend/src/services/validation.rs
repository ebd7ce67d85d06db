use once_cell::sync::Lazy;
use regex::Regex;
use shared::CollectionId;
use thiserror::Error;

pub const MAX_CONTENT_CHARS: usize = 500;
pub const MAX_ALIAS_CHARS: usize = 100;

static MARKUP_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<script|javascript:|on\w+\s*=").expect("valid markup regex")
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Invalid identifier {0:?}, use YYYY-MM-DD or copy-YYYYMMDD-<timestamp>")]
    InvalidIdentifier(String),
    #[error("Task content must not be empty")]
    EmptyContent,
    #[error("Task content must not exceed {} characters", MAX_CONTENT_CHARS)]
    ContentTooLong,
    #[error("Task content contains disallowed markup")]
    InvalidContent,
    #[error("Alias must not be empty")]
    EmptyAlias,
    #[error("Alias must not exceed {} characters", MAX_ALIAS_CHARS)]
    AliasTooLong,
    #[error("Alias contains disallowed markup")]
    InvalidAlias,
}

impl ValidationError {
    /// Stable machine-readable code reported to API clients.
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::InvalidIdentifier(_) => "invalid_identifier",
            ValidationError::EmptyContent => "empty_content",
            ValidationError::ContentTooLong => "content_too_long",
            ValidationError::InvalidContent => "invalid_content",
            ValidationError::EmptyAlias => "empty_alias",
            ValidationError::AliasTooLong => "alias_too_long",
            ValidationError::InvalidAlias => "invalid_alias",
        }
    }
}

pub fn parse_identifier(raw: &str) -> Result<CollectionId, ValidationError> {
    raw.parse()
        .map_err(|_| ValidationError::InvalidIdentifier(raw.to_string()))
}

/// Aliases may target any real date, or anything in the copy namespace.
pub fn validate_alias_target(raw: &str) -> Result<(), ValidationError> {
    let is_date = raw
        .parse::<CollectionId>()
        .map(|id| id.date().is_some())
        .unwrap_or(false);

    if is_date || raw.starts_with(CollectionId::COPY_PREFIX) {
        Ok(())
    } else {
        Err(ValidationError::InvalidIdentifier(raw.to_string()))
    }
}

/// Returns the trimmed content.
pub fn validate_content(content: &str) -> Result<String, ValidationError> {
    let content = content.trim();
    if content.is_empty() {
        return Err(ValidationError::EmptyContent);
    }
    if content.chars().count() > MAX_CONTENT_CHARS {
        return Err(ValidationError::ContentTooLong);
    }
    if MARKUP_RE.is_match(content) {
        return Err(ValidationError::InvalidContent);
    }
    Ok(content.to_string())
}

/// Returns the trimmed label.
pub fn validate_alias(alias: &str) -> Result<String, ValidationError> {
    let alias = alias.trim();
    if alias.is_empty() {
        return Err(ValidationError::EmptyAlias);
    }
    if alias.chars().count() > MAX_ALIAS_CHARS {
        return Err(ValidationError::AliasTooLong);
    }
    if MARKUP_RE.is_match(alias) {
        return Err(ValidationError::InvalidAlias);
    }
    Ok(alias.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_is_trimmed() {
        assert_eq!(validate_content("  buy milk \n").unwrap(), "buy milk");
    }

    #[test]
    fn test_content_rejections() {
        assert_eq!(validate_content("   "), Err(ValidationError::EmptyContent));
        assert_eq!(
            validate_content(&"x".repeat(MAX_CONTENT_CHARS + 1)),
            Err(ValidationError::ContentTooLong)
        );
        assert_eq!(
            validate_content("<SCRIPT>alert(1)</SCRIPT>"),
            Err(ValidationError::InvalidContent)
        );
        assert_eq!(
            validate_content("<img onerror = x>"),
            Err(ValidationError::InvalidContent)
        );
        assert_eq!(
            validate_content("javascript:void(0)"),
            Err(ValidationError::InvalidContent)
        );
    }

    #[test]
    fn test_content_limit_counts_characters() {
        let content = "任".repeat(MAX_CONTENT_CHARS);
        assert!(validate_content(&content).is_ok());
    }

    #[test]
    fn test_alias_rejections() {
        assert_eq!(validate_alias(""), Err(ValidationError::EmptyAlias));
        assert_eq!(
            validate_alias(&"a".repeat(MAX_ALIAS_CHARS + 1)),
            Err(ValidationError::AliasTooLong)
        );
        assert_eq!(
            validate_alias("<script>"),
            Err(ValidationError::InvalidAlias)
        );
        assert_eq!(validate_alias(" Work ").unwrap(), "Work");
    }

    #[test]
    fn test_alias_targets() {
        assert!(validate_alias_target("2025-07-29").is_ok());
        assert!(validate_alias_target("copy-20250729-1").is_ok());
        assert!(validate_alias_target("copy-anything").is_ok());
        assert_eq!(
            validate_alias_target("not-a-date"),
            Err(ValidationError::InvalidIdentifier("not-a-date".to_string()))
        );
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(ValidationError::EmptyContent.code(), "empty_content");
        assert_eq!(
            ValidationError::InvalidIdentifier("x".to_string()).code(),
            "invalid_identifier"
        );
        assert_eq!(ValidationError::AliasTooLong.code(), "alias_too_long");
    }

    #[test]
    fn test_parse_identifier() {
        assert!(parse_identifier("2025-07-29").is_ok());
        assert_eq!(
            parse_identifier("tomorrow"),
            Err(ValidationError::InvalidIdentifier("tomorrow".to_string()))
        );
    }
}
