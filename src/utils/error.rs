use thiserror::Error;

/// Failure reported by the AI provider for a single advisory call.
///
/// The provider only gives us free text, so classification is done on the
/// message: quota exhaustion mentions `429`, a rejected model id mentions `404`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdvisoryError {
    #[error("Rate limited by provider for model {model}: {message}")]
    RateLimited { model: String, message: String },

    #[error("Model {model} is unavailable: {message}")]
    ModelUnavailable { model: String, message: String },

    #[error("Provider error with {model}: {message}")]
    Unknown { model: String, message: String },
}

impl AdvisoryError {
    pub fn classify(model: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        let model = model.to_string();

        if message.contains("429") {
            AdvisoryError::RateLimited { model, message }
        } else if message.contains("404") {
            AdvisoryError::ModelUnavailable { model, message }
        } else {
            AdvisoryError::Unknown { model, message }
        }
    }

    pub fn model(&self) -> &str {
        match self {
            AdvisoryError::RateLimited { model, .. }
            | AdvisoryError::ModelUnavailable { model, .. }
            | AdvisoryError::Unknown { model, .. } => model,
        }
    }

    pub fn raw_message(&self) -> &str {
        match self {
            AdvisoryError::RateLimited { message, .. }
            | AdvisoryError::ModelUnavailable { message, .. }
            | AdvisoryError::Unknown { message, .. } => message,
        }
    }
}

#[derive(Error, Debug)]
pub enum DeskError {
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration value: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error(transparent)]
    Advisory(#[from] AdvisoryError),

    #[error("Storage unavailable: {message}")]
    StorageUnavailable {
        message: String,
        #[source]
        source: Option<rusqlite::Error>,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Provider,
    Storage,
    Io,
    Input,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl DeskError {
    pub fn storage(context: &str, source: rusqlite::Error) -> Self {
        DeskError::StorageUnavailable {
            message: format!("{}: {}", context, source),
            source: Some(source),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            DeskError::ConfigError { .. }
            | DeskError::MissingConfigError { .. }
            | DeskError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            DeskError::Advisory(_) => ErrorCategory::Provider,
            DeskError::StorageUnavailable { .. } => ErrorCategory::Storage,
            DeskError::IoError(_) | DeskError::CsvError(_) | DeskError::SerializationError(_) => {
                ErrorCategory::Io
            }
            DeskError::ValidationError { .. } => ErrorCategory::Input,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            // Startup cannot continue without a valid key.
            ErrorCategory::Configuration => ErrorSeverity::Critical,
            ErrorCategory::Provider | ErrorCategory::Storage => ErrorSeverity::Medium,
            ErrorCategory::Io | ErrorCategory::Input => ErrorSeverity::High,
        }
    }

    pub fn is_recoverable(&self) -> bool {
        self.severity() < ErrorSeverity::Critical
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            DeskError::ConfigError { .. } | DeskError::MissingConfigError { .. } => {
                "Set GOOGLE_API_KEY or provider.api_key in the config file".to_string()
            }
            DeskError::InvalidConfigValueError { field, .. } => {
                format!("Check the value of '{}' in the config file", field)
            }
            DeskError::Advisory(AdvisoryError::RateLimited { .. }) => {
                "Wait about a minute and retry, or switch to another model".to_string()
            }
            DeskError::Advisory(AdvisoryError::ModelUnavailable { .. }) => {
                "That model did not respond. Pick another one from `customs-desk models`"
                    .to_string()
            }
            DeskError::Advisory(AdvisoryError::Unknown { .. }) => {
                "Check the provider message above and retry".to_string()
            }
            DeskError::StorageUnavailable { .. } => {
                "Make sure the history database is writable and retry".to_string()
            }
            DeskError::IoError(_) | DeskError::CsvError(_) => {
                "Check that the file path exists and is writable".to_string()
            }
            DeskError::SerializationError(_) => "Unexpected response format".to_string(),
            DeskError::ValidationError { .. } => "Correct the input and retry".to_string(),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            DeskError::Advisory(err) => format!("Error with {}: {}", err.model(), err.raw_message()),
            DeskError::StorageUnavailable { message, .. } => {
                format!("History storage unavailable ({})", message)
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DeskError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_rate_limited() {
        let err = AdvisoryError::classify("gemini-1.5-flash", "429 RESOURCE_EXHAUSTED: quota");
        assert!(matches!(err, AdvisoryError::RateLimited { .. }));
        assert_eq!(err.model(), "gemini-1.5-flash");
    }

    #[test]
    fn test_classify_model_unavailable() {
        let err = AdvisoryError::classify("gemini-x", "404 NOT_FOUND: models/gemini-x is not found");
        assert!(matches!(err, AdvisoryError::ModelUnavailable { .. }));
    }

    #[test]
    fn test_classify_prefers_rate_limit_when_both_present() {
        let err = AdvisoryError::classify("m", "429 after 404 fallback");
        assert!(matches!(err, AdvisoryError::RateLimited { .. }));
    }

    #[test]
    fn test_classify_unknown_keeps_raw_message() {
        let err = AdvisoryError::classify("m", "500 INTERNAL: boom");
        assert_eq!(
            err,
            AdvisoryError::Unknown {
                model: "m".to_string(),
                message: "500 INTERNAL: boom".to_string()
            }
        );
        assert_eq!(err.raw_message(), "500 INTERNAL: boom");
    }

    #[test]
    fn test_severity_mapping() {
        let config = DeskError::MissingConfigError {
            field: "provider.api_key".to_string(),
        };
        assert_eq!(config.severity(), ErrorSeverity::Critical);
        assert!(!config.is_recoverable());

        let advisory = DeskError::from(AdvisoryError::classify("m", "429"));
        assert_eq!(advisory.category(), ErrorCategory::Provider);
        assert!(advisory.is_recoverable());

        let storage = DeskError::StorageUnavailable {
            message: "disk full".to_string(),
            source: None,
        };
        assert_eq!(storage.severity(), ErrorSeverity::Medium);
        assert!(storage.user_friendly_message().contains("disk full"));
    }
}
