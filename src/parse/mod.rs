mod error;
mod grammar;

use winnow::Parser;

use crate::Expr;

pub use error::ParseError;

/// Parse rule expression text into a syntax tree.
///
/// The tree is not yet validated: calls to unknown functions and bare names
/// are accepted here and rejected by compilation.
///
/// # Errors
///
/// Returns [`ParseError`] if the input is not a well-formed expression.
pub fn parse(input: &str) -> Result<Expr, ParseError> {
    grammar::expression.parse(input).map_err(|e| {
        let consumed = input.get(..e.offset()).unwrap_or(input);
        ParseError::new(consumed.chars().count(), e.inner().to_string())
    })
}
