use thiserror::Error;

/// Syntax errors produced while parsing document text.
///
/// Carries the rendered parser message, which points at the offending
/// offset and names what was expected there.
#[derive(Debug, Error)]
#[error("document syntax error: {message}")]
pub struct ParseError {
    message: String,
}

impl ParseError {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
