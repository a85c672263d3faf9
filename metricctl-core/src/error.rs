//! Error types for metricctl.
//!
//! All errors use `thiserror` for ergonomic error handling and proper error chains.
//! Local validation failures are `InvalidArgument`; everything the backend
//! reports keeps its original message.

use std::path::PathBuf;
use thiserror::Error;
use tonic::{Code, Status};

/// Result type alias for metricctl operations.
pub type Result<T> = std::result::Result<T, MonitoringError>;

/// Main error type for metricctl.
#[derive(Error, Debug)]
pub enum MonitoringError {
    // Local validation errors
    #[error("Invalid argument: {reason}")]
    InvalidArgument { reason: String },

    // Backend errors
    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Already exists: {message}")]
    AlreadyExists { message: String },

    #[error("Permission denied: {message}")]
    PermissionDenied { message: String },

    #[error("Unauthenticated: {message}")]
    Unauthenticated { message: String },

    #[error("Service unavailable: {message}")]
    Unavailable { message: String },

    #[error("Deadline exceeded: {message}")]
    DeadlineExceeded { message: String },

    #[error("RPC failed ({code:?}): {message}")]
    Rpc { code: Code, message: String },

    #[error("Invalid response from backend: {reason}")]
    InvalidResponse { reason: String },

    // Transport errors
    #[error("Failed to connect to {endpoint}: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: tonic::transport::Error,
    },

    // Configuration errors
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MonitoringError {
    /// Shorthand for a local validation failure.
    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        Self::InvalidArgument { reason: reason.into() }
    }

    /// Shorthand for malformed data coming back over the wire.
    pub fn invalid_response(reason: impl Into<String>) -> Self {
        Self::InvalidResponse { reason: reason.into() }
    }

    /// Whether the failure is transient on the backend or transport side.
    ///
    /// metricctl never retries on its own; callers may use this to decide.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Unavailable { .. } | Self::DeadlineExceeded { .. } | Self::Transport { .. }
        )
    }

    /// Short stable label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidArgument { .. } => "invalid_argument",
            Self::NotFound { .. } => "not_found",
            Self::AlreadyExists { .. } => "already_exists",
            Self::PermissionDenied { .. } => "permission_denied",
            Self::Unauthenticated { .. } => "unauthenticated",
            Self::Unavailable { .. } => "unavailable",
            Self::DeadlineExceeded { .. } => "deadline_exceeded",
            Self::Rpc { .. } => "rpc",
            Self::InvalidResponse { .. } => "invalid_response",
            Self::Transport { .. } => "transport",
            Self::InvalidConfig { .. } => "invalid_config",
            Self::Io { .. } => "io",
            Self::Other(_) => "other",
        }
    }

    /// Whether the failure was raised locally before any dispatch.
    pub fn is_local(&self) -> bool {
        matches!(self, Self::InvalidArgument { .. } | Self::InvalidConfig { .. })
    }
}

impl From<Status> for MonitoringError {
    fn from(status: Status) -> Self {
        let message = status.message().to_string();
        match status.code() {
            Code::NotFound => Self::NotFound { message },
            Code::AlreadyExists => Self::AlreadyExists { message },
            Code::PermissionDenied => Self::PermissionDenied { message },
            Code::Unauthenticated => Self::Unauthenticated { message },
            Code::Unavailable => Self::Unavailable { message },
            Code::DeadlineExceeded => Self::DeadlineExceeded { message },
            code => Self::Rpc { code, message },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping_keeps_message() {
        let err: MonitoringError = Status::not_found("no such metric").into();
        assert!(matches!(err, MonitoringError::NotFound { ref message } if message == "no such metric"));

        let err: MonitoringError = Status::already_exists("dup").into();
        assert!(matches!(err, MonitoringError::AlreadyExists { .. }));

        let err: MonitoringError = Status::unauthenticated("token").into();
        assert!(matches!(err, MonitoringError::Unauthenticated { .. }));

        let err: MonitoringError = Status::internal("boom").into();
        assert!(matches!(err, MonitoringError::Rpc { code: Code::Internal, .. }));
    }

    #[test]
    fn test_backend_invalid_argument_is_not_local() {
        let err = MonitoringError::from(Status::invalid_argument("value type mismatch"));
        assert!(matches!(err, MonitoringError::Rpc { code: Code::InvalidArgument, .. }));
        assert!(!err.is_local());
        assert_eq!(err.to_string(), "RPC failed (InvalidArgument): value type mismatch");
    }

    #[test]
    fn test_transient_classification() {
        assert!(MonitoringError::from(Status::unavailable("down")).is_transient());
        assert!(MonitoringError::from(Status::deadline_exceeded("slow")).is_transient());
        assert!(!MonitoringError::invalid_argument("bad").is_transient());
        assert!(!MonitoringError::from(Status::permission_denied("no")).is_transient());
    }

    #[test]
    fn test_error_display() {
        let err = MonitoringError::invalid_argument("filter must not be empty");
        assert_eq!(err.to_string(), "Invalid argument: filter must not be empty");
        assert!(err.is_local());
    }
}
