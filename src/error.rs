/// Centralized error types for release-digest using thiserror
///
/// Every fatal failure of the pipeline is one of these kinds. Non-fatal
/// degradations (truncation, diff fallback) are not errors; they travel
/// through [`crate::notice::NoticeSink`] instead.
use thiserror::Error;

/// Main error type for a digest run
#[derive(Error, Debug)]
pub enum DigestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Tag error: {0}")]
    Tag(#[from] TagError),

    #[error("Git error: {0}")]
    Git(#[from] GitError),

    #[error("Summarization error: {0}")]
    Summarize(#[from] SummarizeError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// Errors related to configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration file: {0}")]
    LoadFailed(String),

    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    #[error("Invalid configuration value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Failed to save configuration: {0}")]
    SaveFailed(String),

    #[error("Configuration file not found: {0}")]
    FileNotFound(String),
}

/// Errors raised while choosing the comparison tag
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TagError {
    #[error("No tags found in repository")]
    NoTagsFound,

    #[error("Tag not found: {0}")]
    TagNotFound(String),
}

/// Errors related to git operations
#[derive(Error, Debug)]
pub enum GitError {
    #[error("Git repository not found at: {0}")]
    RepoNotFound(String),

    #[error("Failed to open git repository: {0}")]
    OpenFailed(String),

    #[error("Failed to resolve git reference: {0}")]
    RefNotFound(String),

    #[error("git {operation} failed: {detail}")]
    QueryFailed { operation: String, detail: String },
}

/// Errors related to the remote summarization call
#[derive(Error, Debug)]
pub enum SummarizeError {
    #[error("Model returned no text for stage '{0}'")]
    EmptyModelResponse(String),

    #[error("API key environment variable {0} is not set")]
    MissingApiKey(String),

    #[error("Summarization request failed: {0}")]
    RequestFailed(String),

    #[error("Summarization endpoint returned {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Unreadable summarization response: {0}")]
    InvalidResponse(String),
}

impl GitError {
    /// Build a query failure from the operation name and the underlying diagnostic
    pub fn query(operation: impl Into<String>, detail: impl std::fmt::Display) -> Self {
        GitError::QueryFailed {
            operation: operation.into(),
            detail: detail.to_string(),
        }
    }
}

// Conversion from anyhow::Error to DigestError
impl From<anyhow::Error> for DigestError {
    fn from(err: anyhow::Error) -> Self {
        DigestError::Other(format!("{:#}", err))
    }
}

/// One-line message for an error reaching the binary edge
///
/// A [`DigestError`] already embeds its inner error's message, so only its
/// own display is used. Anything else prints its full context chain.
pub fn error_report(err: &anyhow::Error) -> String {
    match err.downcast_ref::<DigestError>() {
        Some(digest) => digest.to_string(),
        None => format!("{:#}", err),
    }
}

impl DigestError {
    /// Create a new error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        DigestError::Other(msg.into())
    }

    /// Check if this is a user error (bad input or unknown tag) vs a system error
    pub fn is_user_error(&self) -> bool {
        matches!(self, DigestError::Config(_) | DigestError::Tag(_))
    }

    /// Stage label of an empty model response, if that is what failed
    pub fn stage_label(&self) -> Option<&str> {
        match self {
            DigestError::Summarize(SummarizeError::EmptyModelResponse(stage)) => Some(stage),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DigestError::Tag(TagError::TagNotFound("v9.9.9".to_string()));
        assert_eq!(err.to_string(), "Tag error: Tag not found: v9.9.9");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: DigestError = io_err.into();
        assert!(matches!(err, DigestError::Io(_)));
    }

    #[test]
    fn test_error_from_anyhow() {
        let anyhow_err = anyhow::anyhow!("test error");
        let err: DigestError = anyhow_err.into();
        assert!(matches!(err, DigestError::Other(_)));
    }

    #[test]
    fn test_is_user_error() {
        let user_err = DigestError::Tag(TagError::NoTagsFound);
        assert!(user_err.is_user_error());

        let config_err = DigestError::Config(ConfigError::InvalidValue {
            key: "diff.max_lines".to_string(),
            reason: "must be greater than 0".to_string(),
        });
        assert!(config_err.is_user_error());

        let system_err = DigestError::Git(GitError::query("log", "broken pipe"));
        assert!(!system_err.is_user_error());
    }

    #[test]
    fn test_error_report_prints_inner_message_once() {
        let err = anyhow::Error::from(DigestError::Config(ConfigError::InvalidValue {
            key: "staging.max_stage_chars".to_string(),
            reason: "must be at least 4000, got 100".to_string(),
        }));
        let report = error_report(&err);
        assert_eq!(
            report,
            "Configuration error: Invalid configuration value for 'staging.max_stage_chars': must be at least 4000, got 100"
        );
        assert_eq!(report.matches("got 100").count(), 1);
    }

    #[test]
    fn test_error_report_keeps_context_chain() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = anyhow::Error::from(io_err).context("Failed to read context file notes.txt");
        assert_eq!(
            error_report(&err),
            "Failed to read context file notes.txt: no such file"
        );
    }

    #[test]
    fn test_query_failed_display() {
        let err = GitError::query("rev-walk", "object not found");
        assert_eq!(err.to_string(), "git rev-walk failed: object not found");
    }

    #[test]
    fn test_stage_label() {
        let err: DigestError = SummarizeError::EmptyModelResponse("batch 2/3".to_string()).into();
        assert_eq!(err.stage_label(), Some("batch 2/3"));
        assert_eq!(
            err.to_string(),
            "Summarization error: Model returned no text for stage 'batch 2/3'"
        );

        let other = DigestError::other("boom");
        assert_eq!(other.stage_label(), None);
    }

    #[test]
    fn test_http_status_display() {
        let err = SummarizeError::HttpStatus {
            status: 429,
            body: "rate limited".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Summarization endpoint returned 429: rate limited"
        );
    }

    #[test]
    fn test_config_error_invalid_value() {
        let err = ConfigError::InvalidValue {
            key: "staging.max_stage_chars".to_string(),
            reason: "must be at least 4000".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid configuration value for 'staging.max_stage_chars': must be at least 4000"
        );
    }
}
