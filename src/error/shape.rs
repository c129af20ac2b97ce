//! Result shaping error types

/// Errors raised while mapping a raw provider payload into typed data.
#[derive(Debug, thiserror::Error)]
pub enum ShapeError {
    /// The payload did not match the expected shape for the metric kind.
    #[error("Payload parse error: {message}")]
    Parse {
        /// Description of the mismatch.
        message: String,
        /// The offending payload fragment, if useful for diagnosis.
        body: Option<String>,
    },
}

impl ShapeError {
    /// Creates a new parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            body: None,
        }
    }

    /// Creates a new parse error carrying the offending payload fragment.
    pub fn parse_with_body(message: impl Into<String>, body: impl std::fmt::Display) -> Self {
        Self::Parse {
            message: message.into(),
            body: Some(body.to_string()),
        }
    }
}
