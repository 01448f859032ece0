use thiserror::Error;

use crate::parse::ParseError;
use crate::types::DocumentError;

/// Unified error type covering document syntax, document structure, and I/O.
///
/// Returned by convenience methods like
/// [`Document::from_text()`](crate::Document::from_text) and
/// [`Document::from_file()`](crate::Document::from_file).
#[derive(Debug, Error)]
pub enum SteerError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
