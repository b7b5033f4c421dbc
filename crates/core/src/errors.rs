//! Error types for the branchmerge core library.
//!
//! Each subsystem has its own error type derived with `thiserror`, and a
//! top-level [`CoreError`] enum unifies them all for callers that want a
//! single error type.

use std::path::PathBuf;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Unified error type for the entire core library.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Diff(#[from] DiffError),

    #[error(transparent)]
    Merge(#[from] MergeError),

    #[error(transparent)]
    Wizard(#[from] WizardError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

// ---------------------------------------------------------------------------
// Management API errors
// ---------------------------------------------------------------------------

/// Errors from the CMS management API (transport and HTTP status).
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP-level transport error (network, TLS, etc.).
    #[error("API HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// The API returned a non-success status code.
    #[error("API error (HTTP {status}): {body}")]
    ApiError {
        status: u16,
        body: String,
    },

    /// API key or management token is missing or was rejected.
    #[error("API authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Rate limit exceeded.
    #[error("API rate limit exceeded")]
    RateLimited,

    /// The response body did not match the expected shape.
    #[error("API response parse error: {0}")]
    ParseError(String),
}

// ---------------------------------------------------------------------------
// Diff errors
// ---------------------------------------------------------------------------

/// Errors from branch comparison.
#[derive(Debug, Error)]
pub enum DiffError {
    /// The module name is not one of `content_types`, `global_fields`, `all`.
    #[error("invalid module '{0}': expected content_types, global_fields or all")]
    InvalidModule(String),

    /// A page or field-diff fetch failed; the comparison is abandoned.
    #[error("failed to fetch branch differences: {0}")]
    Fetch(#[from] ApiError),
}

// ---------------------------------------------------------------------------
// Merge errors
// ---------------------------------------------------------------------------

/// Errors from merge summary filtering and merge job execution.
#[derive(Debug, Error)]
pub enum MergeError {
    /// A strategy outside the resolution table reached summary filtering.
    #[error("invalid merge strategy '{0}'")]
    InvalidStrategy(String),

    /// The merge queue came back empty for a running job.
    #[error("No queue found with merge ID {0}")]
    NoQueue(String),

    /// The merge queue reported a status outside the known lifecycle.
    #[error("Invalid merge status '{status}' found with merge ID {uid}")]
    UnexpectedStatus {
        uid: String,
        status: String,
    },

    /// The merge job reached the `failed` terminal state.
    #[error("merge uid: {uid}")]
    JobFailed {
        uid: String,
        log_path: Option<PathBuf>,
    },

    /// Polling gave up after the configured number of attempts.
    #[error("merge {uid} still in progress after {attempts} status checks")]
    PollLimitReached {
        uid: String,
        attempts: u32,
    },

    /// Polling was cancelled before the job reached a terminal state.
    #[error("stopped waiting for merge {0}")]
    Cancelled(String),

    /// Submission or polling failed at the transport level.
    #[error("merge request failed: {0}")]
    Api(#[from] ApiError),

    /// Summary or error log could not be written or read.
    #[error("merge file error at '{path}': {detail}")]
    File {
        path: String,
        detail: String,
    },
}

// ---------------------------------------------------------------------------
// Wizard errors
// ---------------------------------------------------------------------------

/// Errors from the interactive merge settings wizard.
#[derive(Debug, Error)]
pub enum WizardError {
    /// The prompt collaborator failed (terminal closed, I/O error).
    #[error("prompt failed: {0}")]
    Prompt(String),

    /// An answer was outside the options that were offered.
    #[error("unexpected answer '{answer}' for {step}")]
    UnexpectedAnswer {
        step: String,
        answer: String,
    },

    /// Summary filtering rejected the resolved strategy.
    #[error(transparent)]
    Merge(#[from] MergeError),
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file not found.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// TOML parse error.
    #[error("configuration parse error: {0}")]
    ParseError(String),

    /// A required environment variable is not set.
    #[error("required environment variable '{var}' is not set (referenced by config field '{field}')")]
    EnvVarMissing {
        var: String,
        field: String,
    },

    /// A config value is invalid.
    #[error("invalid configuration value for '{field}': {detail}")]
    InvalidValue {
        field: String,
        detail: String,
    },

    /// Generic I/O error reading the config file.
    #[error("configuration I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
