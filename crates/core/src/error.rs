//! Error types for the lab follow-up domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for a case run.
#[derive(Debug, Error)]
pub enum Error {
    // --- FHIR repository errors ---
    #[error("FHIR error: {0}")]
    Fhir(#[from] FhirError),

    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Guideline store errors ---
    #[error("Guideline store error: {0}")]
    Store(#[from] StoreError),

    // --- Terminal pipeline failure: the reasoning step's output could not
    // be parsed into the required schema ---
    #[error("Malformed pipeline output: {reason}")]
    MalformedOutput { reason: String },

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- I/O (guideline ingestion reads documents from disk) ---
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Failures talking to the clinical-data repository.
///
/// The variants map one-to-one onto the caller-visible distinctions the
/// service boundary must preserve: not-found, upstream-error, unreachable.
#[derive(Debug, Clone, Error)]
pub enum FhirError {
    #[error("Resource not found: {resource}")]
    NotFound { resource: String },

    #[error("Upstream FHIR server returned {status_code}: {message}")]
    UpstreamStatus { status_code: u16, message: String },

    #[error("Cannot reach FHIR server: {0}")]
    Unreachable(String),

    #[error("Malformed FHIR resource: {0}")]
    MalformedResource(String),
}

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Tool execution failed: {tool_name}: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),
}
