//! Client error model
//!
//! Every failure the console can observe maps to exactly one [`ErrorKind`].
//! Transport and authorization failures are handled centrally by the API
//! wrapper; `api` and `validation` errors are returned to the caller for
//! contextual display.

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::storage::StorageError;
use crate::store::StoreError;
use crate::validation::ValidationErrors;

/// Shown when a request is aborted or exceeds its timeout window.
pub const TIMEOUT_MESSAGE: &str = "Request timed out. Please check your internet connection.";

/// Shown when the backend cannot be reached at all.
pub const NETWORK_MESSAGE: &str = "Network error. Please check your internet connection.";

/// Used whenever the backend gives us nothing better to show.
pub const FALLBACK_MESSAGE: &str = "Something went wrong!";

/// Shown when a 401 forces the user back to the login screen.
pub const SESSION_EXPIRED_MESSAGE: &str = "Session expired. Please log in again.";

/// Classification of a failure, as seen by page-level code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Timeout,
    Network,
    Unauthorized,
    Api,
    Validation,
    Storage,
    Config,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorKind::Timeout => "timeout",
            ErrorKind::Network => "network",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::Api => "api",
            ErrorKind::Validation => "validation",
            ErrorKind::Storage => "storage",
            ErrorKind::Config => "config",
        };
        f.write_str(s)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Request aborted or timed out. Never retried automatically.
    #[error("{0}")]
    Timeout(String),

    /// No connectivity to the backend. Never retried automatically.
    #[error("{0}")]
    Network(String),

    /// The backend rejected the session (HTTP 401). Local session data has
    /// already been cleared when this is returned.
    #[error("Session expired. Please log in again.")]
    Unauthorized,

    /// Backend-declared business failure.
    #[error("{message}")]
    Api { status: Option<u16>, message: String },

    /// Client-side form errors; never sent to the backend.
    #[error("{0}")]
    Validation(ValidationErrors),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ClientError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::Timeout(_) => ErrorKind::Timeout,
            ClientError::Network(_) => ErrorKind::Network,
            ClientError::Unauthorized => ErrorKind::Unauthorized,
            ClientError::Api { .. } => ErrorKind::Api,
            ClientError::Validation(_) => ErrorKind::Validation,
            ClientError::Storage(_) | ClientError::Store(_) => ErrorKind::Storage,
            ClientError::Config(_) => ErrorKind::Config,
        }
    }

    pub fn timeout() -> Self {
        ClientError::Timeout(TIMEOUT_MESSAGE.to_string())
    }

    pub fn network() -> Self {
        ClientError::Network(NETWORK_MESSAGE.to_string())
    }

    pub fn api(message: impl Into<String>) -> Self {
        ClientError::Api {
            status: None,
            message: message.into(),
        }
    }

    /// Single-field validation failure.
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        let mut errors = ValidationErrors::default();
        errors.add(field, message);
        ClientError::Validation(errors)
    }

    /// Rebuild an error from a normalized API outcome.
    ///
    /// Storage and config failures never travel through an outcome, so they
    /// collapse into `api` here.
    pub fn from_outcome(kind: ErrorKind, status: Option<u16>, message: Option<String>) -> Self {
        let message = message.unwrap_or_else(|| FALLBACK_MESSAGE.to_string());
        match kind {
            ErrorKind::Timeout => ClientError::Timeout(message),
            ErrorKind::Network => ClientError::Network(message),
            ErrorKind::Unauthorized => ClientError::Unauthorized,
            ErrorKind::Validation => ClientError::invalid("form", message),
            ErrorKind::Api | ErrorKind::Storage | ErrorKind::Config => {
                ClientError::Api { status, message }
            }
        }
    }

    /// Message suitable for a toast.
    pub fn user_message(&self) -> String {
        self.to_string()
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
