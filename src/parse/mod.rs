mod error;
mod grammar;

pub use error::ParseError;

use crate::types::Node;

/// Parse policy document text into its [`Node`] tree.
///
/// # Errors
///
/// Returns [`ParseError`] if the input is not valid document syntax.
pub fn parse(input: &str) -> Result<Node, ParseError> {
    use winnow::Parser;
    grammar::parse_document
        .parse(input)
        .map_err(|e| ParseError::new(e.to_string()))
}
