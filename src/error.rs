//! Error types for the storyteller service.

use thiserror::Error;

/// Errors raised while validating, composing, or generating a story.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Provider error: {0}")]
    ProviderError(String),

    #[error("Provider request failed: {0}")]
    ProviderRequestFailed(String),

    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Provider authentication failed: {0}")]
    ProviderAuthFailed(String),

    #[error("Provider rate limit exceeded: {0}")]
    ProviderRateLimit(String),

    #[error("Provider model not found: {0}")]
    ProviderModelNotFound(String),

    #[error("Provider timed out: {0}")]
    ProviderTimeout(String),

    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    #[error("Storage error: {0}")]
    StorageError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl ApiError {
    /// True for errors caused by the caller's input rather than by this service.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ApiError::UnsupportedLanguage(_) | ApiError::InvalidRequest(_)
        )
    }

    /// True for provider failures that may succeed when attempted again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ApiError::ProviderRateLimit(_)
                | ApiError::ProviderUnavailable(_)
                | ApiError::ProviderTimeout(_)
        )
    }
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}
