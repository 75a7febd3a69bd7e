use thiserror::Error;

use super::expr::Predicate;

/// Errors raised while validating rules. The `UnknownFunction`,
/// `DisallowedName` and `DisallowedOperator` variants mark expressions that
/// step outside the closed grammar; a rule set containing one is refused as
/// a whole.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("call to '{function}' is not allowed; only contains, percentage and similar may be called")]
    UnknownFunction { function: String },

    #[error("name '{name}' is not allowed in a rule expression")]
    DisallowedName { name: String },

    #[error("operator '{operator}' is not allowed; combine predicates with and, or and not")]
    DisallowedOperator { operator: String },

    #[error("duplicate rule name '{name}'")]
    DuplicateRule { name: String },

    #[error("'{name}' is a built-in category and cannot name a rule")]
    ReservedName { name: String },

    #[error("rule '{rule}': {source}")]
    Rule {
        rule: String,
        #[source]
        source: Box<CompileError>,
    },
}

impl CompileError {
    /// True when the expression reached outside the closed grammar.
    #[must_use]
    pub fn is_security_violation(&self) -> bool {
        match self {
            CompileError::UnknownFunction { .. }
            | CompileError::DisallowedName { .. }
            | CompileError::DisallowedOperator { .. } => true,
            CompileError::DuplicateRule { .. } | CompileError::ReservedName { .. } => false,
            CompileError::Rule { source, .. } => source.is_security_violation(),
        }
    }

    pub(crate) fn in_rule(self, rule: &str) -> Self {
        CompileError::Rule {
            rule: rule.to_owned(),
            source: Box::new(self),
        }
    }
}

/// Errors raised while evaluating a valid expression against page text.
/// Distinct from the expression simply evaluating to `false`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("{function}() takes {expected} argument(s) but {found} were given")]
    Arity {
        function: Predicate,
        expected: usize,
        found: usize,
    },

    #[error("argument {position} of {function}() must be a {expected}, found {found}")]
    ArgumentType {
        function: Predicate,
        position: usize,
        expected: &'static str,
        found: &'static str,
    },
}
