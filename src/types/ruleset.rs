use std::fmt;

use super::category::Category;
use super::error::CompileError;
use super::evaluation_report::ClassificationReport;
use super::expr::Expr;
use super::rule::{CompiledRule, Rule, RuleBody};
use crate::parse::ParseError;

/// Builder for constructing a [`RuleSet`] in code.
///
/// # Example
///
/// ```
/// use docsplit::{RuleSetBuilder, contains, similar};
///
/// let ruleset = RuleSetBuilder::new()
///     .rule("Invoice", "contains('发票')")
///     .rule_expr("Receipt", contains("收据").or(similar("收款收据", 0.75)))
///     .compile()
///     .unwrap();
/// assert_eq!(ruleset.len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct RuleSetBuilder {
    rules: Vec<Rule>,
}

impl RuleSetBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Define a rule from expression source text.
    #[must_use]
    pub fn rule(mut self, name: &str, source: impl Into<String>) -> Self {
        self.rules.push(Rule {
            name: name.to_owned(),
            source: source.into(),
        });
        self
    }

    /// Define a rule from a built expression. The stored source is the
    /// expression's rendered text, which is what the tie-break measures.
    #[must_use]
    pub fn rule_expr(self, name: &str, expr: Expr) -> Self {
        let source = expr.to_string();
        self.rule(name, source)
    }

    /// Validate every rule and build an immutable `RuleSet`.
    ///
    /// Rules whose text does not parse are kept but never match; a warning is
    /// logged for each.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError`] for duplicate names or any expression that
    /// steps outside the closed grammar.
    pub fn compile(self) -> Result<RuleSet, CompileError> {
        crate::compile::compile(self.rules)
    }
}

/// A loaded, immutable rule set. Thread-safe; share it by reference or `Arc`.
#[derive(Debug)]
pub struct RuleSet {
    pub(crate) rules: Vec<CompiledRule>,
}

impl RuleSet {
    /// Run every rule against `text` and pick a winner.
    pub fn evaluate_detailed(&self, text: &str) -> ClassificationReport {
        crate::evaluate::evaluate_rules(&self.rules, text)
    }

    /// Name of the winning rule for `text`, if any rule matched.
    #[must_use]
    pub fn best_match(&self, text: &str) -> Option<String> {
        self.evaluate_detailed(text).winner().map(str::to_owned)
    }

    /// Classify one non-blank page, applying the inheritance fallback.
    /// See [`classify`](crate::classify::classify).
    #[must_use]
    pub fn classify(&self, text: &str, previous: Option<&Category>) -> Category {
        crate::classify::classify(self, text, previous)
    }

    /// Parse a JSON rule configuration and build a `RuleSet`.
    ///
    /// Entries without a usable `expression` string are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`DocsplitError`](crate::DocsplitError) on malformed JSON or
    /// compile failure.
    pub fn from_json(input: &str) -> Result<Self, crate::DocsplitError> {
        let rules = crate::config::parse_rule_config(input)?;
        let ruleset = crate::compile::compile(rules)?;
        Ok(ruleset)
    }

    /// Read a JSON rule configuration file and build a `RuleSet`.
    ///
    /// # Errors
    ///
    /// Returns [`DocsplitError`](crate::DocsplitError) on I/O, JSON, or
    /// compile failure.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, crate::DocsplitError> {
        let input = std::fs::read_to_string(path)?;
        Self::from_json(&input)
    }

    /// Rule names in declaration order.
    #[must_use]
    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name.as_str()).collect()
    }

    /// Expression source of a rule, or `None` if no such rule exists.
    #[must_use]
    pub fn source_of(&self, rule_name: &str) -> Option<&str> {
        self.rules
            .iter()
            .find(|r| r.name == rule_name)
            .map(CompiledRule::source)
    }

    /// Names of rules whose text failed to parse.
    #[must_use]
    pub fn unparseable_rules(&self) -> Vec<&str> {
        self.rules
            .iter()
            .filter(|r| matches!(r.body, RuleBody::Unparseable { .. }))
            .map(|r| r.name.as_str())
            .collect()
    }

    /// Why a rule failed to parse, or `None` if it parsed or does not exist.
    #[must_use]
    pub fn parse_error_of(&self, rule_name: &str) -> Option<&ParseError> {
        self.rules
            .iter()
            .find(|r| r.name == rule_name)
            .and_then(|r| match &r.body {
                RuleBody::Unparseable { error, .. } => Some(error),
                RuleBody::Compiled(_) => None,
            })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl fmt::Display for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RuleSet({} rules, {} unparseable)",
            self.rules.len(),
            self.unparseable_rules().len(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{contains, percentage};

    #[test]
    fn builder_collects_rules_in_order() {
        let builder = RuleSetBuilder::new()
            .rule("Invoice", "contains('发票')")
            .rule("Receipt", "contains('收据')")
            .rule_expr("Tax", percentage("税", 5_i64));

        assert_eq!(builder.rules.len(), 3);
        assert_eq!(builder.rules[0].name, "Invoice");
        assert_eq!(builder.rules[2].name, "Tax");
        assert_eq!(builder.rules[2].source, "percentage('税', 5)");
    }

    #[test]
    fn compiled_ruleset_accessors() {
        let ruleset = RuleSetBuilder::new()
            .rule("Invoice", "contains('发票')")
            .rule("Garbled", "contains('发票'")
            .compile()
            .unwrap();

        assert_eq!(ruleset.len(), 2);
        assert!(!ruleset.is_empty());
        assert_eq!(ruleset.rule_names(), vec!["Invoice", "Garbled"]);
        assert_eq!(ruleset.source_of("Invoice"), Some("contains('发票')"));
        assert_eq!(ruleset.source_of("Missing"), None);
        assert_eq!(ruleset.unparseable_rules(), vec!["Garbled"]);
        assert_eq!(ruleset.to_string(), "RuleSet(2 rules, 1 unparseable)");
    }

    #[test]
    fn rule_expr_round_trips_through_parser() {
        let ruleset = RuleSetBuilder::new()
            .rule_expr("Invoice", contains("发票").and(!contains("收据")))
            .compile()
            .unwrap();
        assert!(ruleset.unparseable_rules().is_empty());
        assert_eq!(ruleset.best_match("增值税发票"), Some("Invoice".to_owned()));
        assert_eq!(ruleset.best_match("发票 收据"), None);
    }

    #[test]
    fn ruleset_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RuleSet>();
    }
}
