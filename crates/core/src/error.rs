use serde::Serialize;

/// Errors raised by the fallible surfaces of the crate (manifest loading and
/// validation).
///
/// Accumulation operations never return these; they report problems as
/// [`Diagnostic`](crate::diagnostics::Diagnostic)s instead.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Invalid manifest: {0}")]
    Manifest(String),

    #[error("Malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error or denial value returned by handler and permission callbacks.
///
/// Mirrors the host's `{code, message, status}` error envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{code}: {message}")]
pub struct RestError {
    pub code: String,
    pub message: String,
    pub status: u16,
}

impl RestError {
    pub fn new(code: impl Into<String>, message: impl Into<String>, status: u16) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            status,
        }
    }

    /// The request was understood but the caller may not perform it.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new("rest_forbidden", message, 403)
    }

    /// A callback reference that never resolved to a function was invoked.
    pub fn not_callable(name: &str) -> Self {
        Self::new(
            "rest_invalid_handler",
            format!("The callback '{name}' is not callable"),
            500,
        )
    }
}
