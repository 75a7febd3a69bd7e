use thiserror::Error;

use crate::parse::ParseError;
use crate::CompileError;

/// Unified error type covering parsing, compilation, configuration, and I/O.
///
/// Returned by convenience methods like [`Expression::compile()`](crate::Expression::compile),
/// [`RuleSet::from_json()`](crate::RuleSet::from_json) and
/// [`RuleSet::from_file()`](crate::RuleSet::from_file).
#[derive(Debug, Error)]
pub enum DocsplitError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error("invalid rule configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
