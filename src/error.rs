//! Error types for inbox-assist.

use std::time::Duration;

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Gmail error: {0}")]
    Gmail(#[from] GmailError),

    #[error("Compose error: {0}")]
    Compose(#[from] ComposeError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required configuration: {key}. {hint}")]
    MissingRequired { key: String, hint: String },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// LLM provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Provider {provider} rate limited, retry after {retry_after:?}")]
    RateLimited {
        provider: String,
        retry_after: Option<Duration>,
    },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("Authentication failed for provider {provider}")]
    AuthFailed { provider: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Gmail API and token errors.
#[derive(Debug, thiserror::Error)]
pub enum GmailError {
    #[error("Gmail {operation} request failed: {reason}")]
    RequestFailed { operation: String, reason: String },

    #[error("Gmail {operation} returned {status}: {body}")]
    Api {
        operation: String,
        status: u16,
        body: String,
    },

    #[error("Invalid response for Gmail {operation}: {reason}")]
    InvalidResponse { operation: String, reason: String },

    #[error("Token refresh failed: {reason}")]
    TokenRefresh { reason: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Errors while building an outgoing MIME message.
#[derive(Debug, thiserror::Error)]
pub enum ComposeError {
    #[error("Invalid {field} address '{value}': {reason}")]
    InvalidAddress {
        field: String,
        value: String,
        reason: String,
    },

    #[error("No recipients given")]
    NoRecipients,

    #[error("Failed to build message: {0}")]
    Build(String),
}

/// Result type alias for inbox-assist.
pub type Result<T> = std::result::Result<T, Error>;
