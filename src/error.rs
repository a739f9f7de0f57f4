use thiserror::Error;

pub type Result<T> = std::result::Result<T, EmbedError>;

/// Everything `activate()` and the configuration layer can fail with.
///
/// Message routing never produces errors: untrusted origins, unknown message kinds and
/// stale ids are logged and dropped.
#[derive(Debug, Error)]
pub enum EmbedError {
    #[error("invalid configuration for `{field}`: {message}")]
    InvalidConfiguration { field: &'static str, message: String },

    #[error("no element matches selector `{selector}`")]
    ElementNotFound { selector: String },

    #[error("selector `{selector}` matches {count} elements, expected exactly one")]
    AmbiguousSelector { selector: String, count: usize },

    #[error("DOM operation failed: {0}")]
    Dom(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EmbedError {
    #[must_use]
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            field,
            message: message.into(),
        }
    }

    /// True for every failure caused by the caller's options rather than the environment.
    #[must_use]
    pub fn is_invalid_configuration(&self) -> bool {
        matches!(
            self,
            Self::InvalidConfiguration { .. } | Self::AmbiguousSelector { .. }
        )
    }
}
