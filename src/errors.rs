use std::{fmt, io, path::PathBuf};
use thiserror::Error;

/// A failure reported by the remote storage API or the transport beneath it.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The remote answered with a non-success HTTP status.
    #[error("remote returned status {status}: {message}")]
    Status { status: u16, message: String },

    /// The request never produced a response (connect, reset, timeout).
    #[error("connection failed: {0}")]
    Connection(String),

    /// The response arrived but its body could not be understood.
    #[error("could not decode response: {0}")]
    Decode(String),

    /// The exchange broke the upload protocol, or the request could not be
    /// built (bad URL, unfollowable redirect).
    #[error("protocol violation: {0}")]
    Protocol(String),
}

impl ApiError {
    /// Shortcut for a status error.
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }

    /// HTTP status code, when the failure carried one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            ApiError::status(status.as_u16(), err.to_string())
        } else if err.is_builder() || err.is_redirect() {
            // Repeats identically on every attempt.
            ApiError::Protocol(err.to_string())
        } else if err.is_connect() || err.is_timeout() || err.is_request() || err.is_body() {
            ApiError::Connection(err.to_string())
        } else {
            ApiError::Protocol(err.to_string())
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// How a failed round-trip is treated by the upload loop.
///
/// Decided once per failure and carried as data from then on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// The resumable session itself is gone; retrying cannot help.
    SessionFatal,
    /// Rate limiting, overload, gateway trouble or a dropped connection.
    Transient,
    /// Anything without a known transient signature.
    Unclassified,
}

impl fmt::Display for FailureClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::SessionFatal => "session-fatal",
            Self::Transient => "transient",
            Self::Unclassified => "unclassified",
        };
        f.write_str(label)
    }
}

/// Final outcome of an upload that did not complete.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("source file `{}` not found or unreadable", path.display())]
    SourceNotFound {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not resolve destination folder `{folder}`")]
    FolderResolutionFailed {
        folder: String,
        #[source]
        source: ApiError,
    },

    #[error("upload session rejected after {bytes_transferred} bytes: {detail}")]
    SessionFatal {
        detail: String,
        bytes_transferred: u64,
    },

    #[error(
        "gave up after {retries} idle retries at {bytes_transferred} bytes; last failure: {last_failure}"
    )]
    RetryExhausted {
        retries: u32,
        last_failure: String,
        bytes_transferred: u64,
    },

    #[error("upload aborted on unrecognised failure after {bytes_transferred} bytes: {detail}")]
    Unclassified {
        detail: String,
        bytes_transferred: u64,
    },

    #[error("upload cancelled after {bytes_transferred} bytes")]
    Cancelled { bytes_transferred: u64 },

    #[error("reading source file failed after {bytes_transferred} bytes")]
    Io {
        bytes_transferred: u64,
        #[source]
        source: io::Error,
    },
}

impl UploadError {
    /// Bytes the remote had confirmed before the upload stopped.
    pub fn bytes_transferred(&self) -> u64 {
        match self {
            Self::SourceNotFound { .. } | Self::FolderResolutionFailed { .. } => 0,
            Self::SessionFatal {
                bytes_transferred, ..
            }
            | Self::RetryExhausted {
                bytes_transferred, ..
            }
            | Self::Unclassified {
                bytes_transferred, ..
            }
            | Self::Cancelled { bytes_transferred }
            | Self::Io {
                bytes_transferred, ..
            } => *bytes_transferred,
        }
    }

    /// Build the abort error matching a fatal classification.
    pub(crate) fn aborted(class: FailureClass, err: &ApiError, bytes_transferred: u64) -> Self {
        match class {
            FailureClass::SessionFatal => Self::SessionFatal {
                detail: err.to_string(),
                bytes_transferred,
            },
            FailureClass::Transient | FailureClass::Unclassified => Self::Unclassified {
                detail: err.to_string(),
                bytes_transferred,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_transferred_is_carried_by_abort_errors() {
        let err = UploadError::aborted(
            FailureClass::SessionFatal,
            &ApiError::status(404, "no such session"),
            2048,
        );
        assert!(matches!(err, UploadError::SessionFatal { .. }));
        assert_eq!(err.bytes_transferred(), 2048);
    }

    #[test]
    fn folder_failures_report_no_progress() {
        let err = UploadError::FolderResolutionFailed {
            folder: "backups".into(),
            source: ApiError::Connection("reset".into()),
        };
        assert_eq!(err.bytes_transferred(), 0);
        assert!(err.to_string().contains("backups"));
    }

    #[test]
    fn status_code_only_for_status_errors() {
        assert_eq!(ApiError::status(503, "busy").status_code(), Some(503));
        assert_eq!(ApiError::Decode("bad json".into()).status_code(), None);
    }
}
