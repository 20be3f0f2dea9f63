use crate::utils::error::{DeskError, Result};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

fn invalid(field_name: &str, value: impl Into<String>, reason: impl Into<String>) -> DeskError {
    DeskError::InvalidConfigValueError {
        field: field_name.to_string(),
        value: value.into(),
        reason: reason.into(),
    }
}

/// The provider endpoint: request paths are appended to it, so it may carry
/// a path prefix but no query or fragment.
pub fn validate_base_url(field_name: &str, url_str: &str) -> Result<()> {
    let url = Url::parse(url_str)
        .map_err(|e| invalid(field_name, url_str, format!("Invalid URL: {}", e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(
            field_name,
            url_str,
            format!("Unsupported URL scheme: {}", url.scheme()),
        ));
    }
    if url.cannot_be_a_base() || url.query().is_some() || url.fragment().is_some() {
        return Err(invalid(
            field_name,
            url_str,
            "Base URL must not contain a query or fragment",
        ));
    }
    Ok(())
}

/// The SQLite file; a trailing separator would name a directory.
pub fn validate_database_path(field_name: &str, path: &str) -> Result<()> {
    if path.trim().is_empty() {
        return Err(invalid(field_name, path, "Database path cannot be empty"));
    }
    if path.contains('\0') {
        return Err(invalid(field_name, path, "Path contains null bytes"));
    }
    if path.ends_with('/') || path.ends_with(std::path::MAIN_SEPARATOR) {
        return Err(invalid(field_name, path, "Database path must name a file"));
    }
    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: u64, min_value: u64) -> Result<()> {
    if value < min_value {
        return Err(invalid(
            field_name,
            value.to_string(),
            format!("Value must be at least {}", min_value),
        ));
    }
    Ok(())
}

pub fn validate_required_field<'a, T>(field_name: &str, value: &'a Option<T>) -> Result<&'a T> {
    value.as_ref().ok_or_else(|| DeskError::MissingConfigError {
        field: field_name.to_string(),
    })
}

/// Model ids and family markers: one path segment, optionally written with
/// the provider's `models/` prefix.
pub fn validate_model_name(field_name: &str, name: &str) -> Result<()> {
    let id = name.strip_prefix("models/").unwrap_or(name);
    if id.is_empty() {
        return Err(invalid(field_name, name, "Model name cannot be empty"));
    }
    if let Some(c) = id
        .chars()
        .find(|c| c.is_whitespace() || matches!(c, '/' | '?' | '#' | '%'))
    {
        return Err(invalid(
            field_name,
            name,
            format!("Model name must not contain {:?}", c),
        ));
    }
    Ok(())
}

/// Secrets are never echoed back in the error, only their shape.
pub fn validate_secret(field_name: &str, value: &str) -> Result<()> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DeskError::MissingConfigError {
            field: field_name.to_string(),
        });
    }

    if trimmed.starts_with("${") && trimmed.ends_with('}') {
        return Err(DeskError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: "<unresolved placeholder>".to_string(),
            reason: format!("environment variable {} is not set", trimmed),
        });
    }

    if trimmed.chars().any(char::is_whitespace) {
        return Err(DeskError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: "<redacted>".to_string(),
            reason: "Value must not contain whitespace".to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_base_url() {
        let field = "provider.base_url";
        assert!(validate_base_url(field, "https://generativelanguage.googleapis.com").is_ok());
        assert!(validate_base_url(field, "http://127.0.0.1:8080/proxy").is_ok());
        assert!(validate_base_url(field, "").is_err());
        assert!(validate_base_url(field, "invalid-url").is_err());
        assert!(validate_base_url(field, "ftp://example.com").is_err());
        assert!(validate_base_url(field, "https://example.com/?key=abc").is_err());
        assert!(validate_base_url(field, "https://example.com/#models").is_err());
    }

    #[test]
    fn test_validate_model_name() {
        let field = "provider.fallback_models";
        assert!(validate_model_name(field, "gemini-1.5-flash").is_ok());
        assert!(validate_model_name(field, "models/gemini-2.0-flash-lite").is_ok());
        assert!(validate_model_name(field, "").is_err());
        assert!(validate_model_name(field, "models/").is_err());
        assert!(validate_model_name(field, "gemini flash").is_err());
        assert!(validate_model_name(field, "gemini/../x").is_err());
        assert!(validate_model_name(field, "gemini?alt=sse").is_err());
    }

    #[test]
    fn test_validate_positive_number() {
        assert!(validate_positive_number("provider.timeout_seconds", 5, 1).is_ok());
        assert!(validate_positive_number("provider.timeout_seconds", 0, 1).is_err());
    }

    #[test]
    fn test_validate_required_field() {
        let present = Some("value".to_string());
        assert_eq!(validate_required_field("x", &present).unwrap(), "value");

        let missing: Option<String> = None;
        assert!(matches!(
            validate_required_field("x", &missing),
            Err(DeskError::MissingConfigError { .. })
        ));
    }

    #[test]
    fn test_validate_secret() {
        assert!(validate_secret("provider.api_key", "AIzaSyExample").is_ok());
        assert!(matches!(
            validate_secret("provider.api_key", "  "),
            Err(DeskError::MissingConfigError { .. })
        ));
        assert!(validate_secret("provider.api_key", "${GOOGLE_API_KEY}").is_err());
        assert!(validate_secret("provider.api_key", "abc def").is_err());
    }

    #[test]
    fn test_validate_database_path() {
        let field = "storage.database_path";
        assert!(validate_database_path(field, "data_comercio.db").is_ok());
        assert!(validate_database_path(field, "./data/history.db").is_ok());
        assert!(validate_database_path(field, "").is_err());
        assert!(validate_database_path(field, "a\0b").is_err());
        assert!(validate_database_path(field, "data/").is_err());
    }
}
