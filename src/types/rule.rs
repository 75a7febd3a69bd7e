use crate::parse::ParseError;

use super::error::EvalError;
use super::expr::CompiledExpr;

/// A named rule: the category it assigns and the expression source text.
///
/// Rules are created via [`RuleSetBuilder`](super::RuleSetBuilder) or loaded
/// from a JSON configuration with [`RuleSet::from_json()`](super::RuleSet::from_json).
#[derive(Debug, Clone)]
pub struct Rule {
    pub name: String,
    pub source: String,
}

/// A validated rule expression, ready to evaluate against any number of pages.
///
/// Holds no reference to page data, so one instance can be shared across
/// threads and reused for every page of every document.
#[derive(Debug, Clone)]
pub struct Expression {
    source: String,
    tree: CompiledExpr,
}

impl Expression {
    pub(crate) fn new(source: String, tree: CompiledExpr) -> Self {
        Self { source, tree }
    }

    /// Parse and validate an expression.
    ///
    /// # Errors
    ///
    /// Returns [`DocsplitError::Parse`](crate::DocsplitError::Parse) for
    /// malformed text and [`DocsplitError::Compile`](crate::DocsplitError::Compile)
    /// when the expression uses anything outside the closed grammar.
    pub fn compile(source: &str) -> Result<Self, crate::DocsplitError> {
        let parsed = crate::parse::parse(source)?;
        let tree = crate::compile::validate(&parsed)?;
        Ok(Self::new(source.to_owned(), tree))
    }

    /// Evaluate against one page's text.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError`] when a predicate is called with the wrong number
    /// or type of arguments.
    pub fn evaluate(&self, text: &str) -> Result<bool, EvalError> {
        crate::evaluate::evaluate(&self.tree, text)
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Length of the source text in characters; the classifier's tie-break key.
    #[must_use]
    pub fn source_len(&self) -> usize {
        self.source.chars().count()
    }
}

/// A rule after loading. Rules whose text failed to parse are kept so they
/// can be reported, but never match.
#[derive(Debug, Clone)]
pub(crate) struct CompiledRule {
    pub(crate) name: String,
    pub(crate) body: RuleBody,
}

#[derive(Debug, Clone)]
pub(crate) enum RuleBody {
    Compiled(Expression),
    Unparseable { source: String, error: ParseError },
}

impl CompiledRule {
    pub(crate) fn source(&self) -> &str {
        match &self.body {
            RuleBody::Compiled(expr) => expr.source(),
            RuleBody::Unparseable { source, .. } => source,
        }
    }
}
