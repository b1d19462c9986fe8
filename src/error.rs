//! Error types for the jsf2pdf service.
//!
//! Two distinct error types reflect two distinct layers:
//!
//! * [`ConvertError`] — the converter process could not turn a source
//!   document into an artifact (spawn failure, non-zero exit, timeout, or a
//!   success report with nothing on disk). Produced by
//!   [`crate::pipeline::invoke`] and [`crate::convert`].
//!
//! * [`ServiceError`] — everything a request handler can return. Each variant
//!   maps to exactly one HTTP status through the single [`IntoResponse`] impl
//!   at the bottom of this file, so handlers only ever use `?`.
//!
//! | Variant | Status | Client sees |
//! |---------|--------|-------------|
//! | `Validation` | 400 | the message verbatim |
//! | `SizeLimit` | 413 | the message verbatim |
//! | `NotFound` | 404 | the message verbatim |
//! | `Conversion` | 500 | `"Conversion failed"` + a summary of the diagnostics |
//! | everything else | 500 | `"Internal server error"` |

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Maximum number of diagnostic characters echoed back to a client.
///
/// The full text always goes to the server log.
pub const DIAGNOSTIC_SUMMARY_CHARS: usize = 500;

/// Failure of a single converter invocation.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// The converter executable could not be started at all.
    #[error("Failed to start converter '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The converter started but waiting for it to exit failed.
    #[error("Failed to wait for converter '{program}': {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The converter ran and exited with a non-zero status.
    ///
    /// `diagnostics` is the process's stderr (or stdout when stderr was
    /// empty), or a generic message when it printed nothing.
    #[error("{diagnostics}")]
    Failed {
        code: Option<i32>,
        diagnostics: String,
    },

    /// The converter exceeded its wall-clock budget and was killed.
    #[error("Conversion timed out after {limit:?}")]
    Timeout { limit: Duration },

    /// The converter exited with status zero but the artifact is absent.
    #[error("Converter reported success but produced no output at '{path}'")]
    MissingOutput { path: PathBuf },
}

impl ConvertError {
    /// Client-facing summary: the display text cut to
    /// [`DIAGNOSTIC_SUMMARY_CHARS`] characters.
    pub fn summary(&self) -> String {
        let full = self.to_string();
        let full = full.trim();
        if full.chars().count() <= DIAGNOSTIC_SUMMARY_CHARS {
            return full.to_string();
        }
        let mut cut: String = full.chars().take(DIAGNOSTIC_SUMMARY_CHARS).collect();
        cut.push('\u{2026}');
        cut
    }

    /// Whether this failure was caused by the timeout guard.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ConvertError::Timeout { .. })
    }
}

/// All errors surfaced by the HTTP layer and by service start-up.
#[derive(Debug, Error)]
pub enum ServiceError {
    // ── Client errors ─────────────────────────────────────────────────────
    /// Wrong extension, missing upload field, malformed name.
    #[error("{0}")]
    Validation(String),

    /// Upload larger than the configured maximum.
    #[error("{0}")]
    SizeLimit(String),

    /// Requested artifact does not exist.
    #[error("{0}")]
    NotFound(String),

    // ── Conversion errors ─────────────────────────────────────────────────
    /// The converter failed, timed out, or produced nothing.
    #[error(transparent)]
    Conversion(#[from] ConvertError),

    // ── Start-up errors ───────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Filesystem operation failed on a known path.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Anything else; details are logged, never returned to the client.
    #[error("Internal error: {0}")]
    Unexpected(String),
}

impl ServiceError {
    /// Size-limit violation for an upload capped at `limit_bytes`.
    pub fn too_large(limit_bytes: u64) -> Self {
        ServiceError::SizeLimit(format!(
            "File too large. Maximum upload size is {}",
            human_size(limit_bytes)
        ))
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ServiceError::Io {
            path: path.into(),
            source,
        }
    }

    /// HTTP status this error maps to.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::SizeLimit(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Conversion(_)
            | ServiceError::InvalidConfig(_)
            | ServiceError::Io { .. }
            | ServiceError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// `limit` in the largest unit that divides it exactly: MB, KB, or bytes.
fn human_size(limit: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = 1024 * 1024;
    if limit >= MIB && limit % MIB == 0 {
        format!("{} MB", limit / MIB)
    } else if limit >= KIB && limit % KIB == 0 {
        format!("{} KB", limit / KIB)
    } else {
        format!("{limit} bytes")
    }
}

/// JSON body of every error response: `{ "message": ..., "error"?: ... }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            error: None,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = match &self {
            ServiceError::Validation(msg) | ServiceError::SizeLimit(msg) => {
                tracing::debug!(status = status.as_u16(), "Rejected request: {}", msg);
                ErrorBody::new(msg.clone())
            }
            ServiceError::NotFound(msg) => {
                tracing::debug!("Not found: {}", msg);
                ErrorBody::new(msg.clone())
            }
            ServiceError::Conversion(e) => {
                tracing::error!(timeout = e.is_timeout(), "Conversion failed: {}", e);
                ErrorBody {
                    message: "Conversion failed".to_string(),
                    error: Some(e.summary()),
                }
            }
            ServiceError::InvalidConfig(_) | ServiceError::Io { .. } | ServiceError::Unexpected(_) => {
                tracing::error!("Internal service error: {:#}", self);
                ErrorBody::new("Internal server error")
            }
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_taxonomy() {
        assert_eq!(
            ServiceError::Validation("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServiceError::too_large(20 * 1024 * 1024).status_code(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            ServiceError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        let conv: ServiceError = ConvertError::Timeout {
            limit: Duration::from_secs(15),
        }
        .into();
        assert_eq!(conv.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            ServiceError::Unexpected("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn too_large_mentions_limit_in_megabytes() {
        let e = ServiceError::too_large(20 * 1024 * 1024);
        assert!(e.to_string().contains("20 MB"), "got: {e}");
    }

    #[test]
    fn too_large_uses_smaller_units_below_a_megabyte() {
        assert_eq!(
            ServiceError::too_large(1024).to_string(),
            "File too large. Maximum upload size is 1 KB"
        );
        assert_eq!(
            ServiceError::too_large(1500).to_string(),
            "File too large. Maximum upload size is 1500 bytes"
        );
        assert_eq!(
            ServiceError::too_large(3 * 1024 * 1024 + 512).to_string(),
            "File too large. Maximum upload size is 3146240 bytes"
        );
    }

    #[test]
    fn wait_failure_is_not_reported_as_spawn() {
        let e = ConvertError::Wait {
            program: "python3".into(),
            source: std::io::Error::other("interrupted"),
        };
        assert_eq!(
            e.to_string(),
            "Failed to wait for converter 'python3': interrupted"
        );
        assert!(!e.is_timeout());
    }

    #[test]
    fn timeout_display() {
        let e = ConvertError::Timeout {
            limit: Duration::from_secs(15),
        };
        assert_eq!(e.to_string(), "Conversion timed out after 15s");
        assert!(e.is_timeout());
    }

    #[test]
    fn failed_display_is_diagnostics() {
        let e = ConvertError::Failed {
            code: Some(1),
            diagnostics: "Conversion failed: Missing input".into(),
        };
        assert_eq!(e.to_string(), "Conversion failed: Missing input");
        assert!(!e.is_timeout());
    }

    #[test]
    fn summary_truncates_long_diagnostics() {
        let e = ConvertError::Failed {
            code: Some(2),
            diagnostics: "é".repeat(DIAGNOSTIC_SUMMARY_CHARS + 50),
        };
        let s = e.summary();
        assert_eq!(s.chars().count(), DIAGNOSTIC_SUMMARY_CHARS + 1);
        assert!(s.ends_with('\u{2026}'));
    }

    #[test]
    fn error_body_omits_absent_error_field() {
        let json = serde_json::to_value(ErrorBody::new("File not found")).unwrap();
        assert_eq!(json, serde_json::json!({ "message": "File not found" }));
    }
}
