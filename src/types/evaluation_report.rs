use std::fmt;
use std::time::Duration;

use super::error::EvalError;

/// How a single rule fared against one page.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleOutcome {
    Matched,
    NotMatched,
    /// The expression is valid but its evaluation failed.
    Failed(EvalError),
    /// The rule text never parsed; it cannot match.
    Unparseable,
}

impl RuleOutcome {
    #[must_use]
    pub fn is_match(&self) -> bool {
        matches!(self, RuleOutcome::Matched)
    }

    /// True for outcomes that mean the rule is broken rather than not matching.
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, RuleOutcome::Failed(_) | RuleOutcome::Unparseable)
    }
}

/// Detailed result of running every rule against one page, returned by
/// [`RuleSet::evaluate_detailed()`](super::ruleset::RuleSet::evaluate_detailed).
#[derive(Debug, Clone)]
#[must_use]
pub struct ClassificationReport {
    winner: Option<String>,
    outcomes: Vec<(String, RuleOutcome)>,
    duration: Duration,
}

impl ClassificationReport {
    pub(crate) fn new(
        winner: Option<String>,
        outcomes: Vec<(String, RuleOutcome)>,
        duration: Duration,
    ) -> Self {
        Self {
            winner,
            outcomes,
            duration,
        }
    }

    /// The winning rule: the matching rule with the longest expression source,
    /// earliest declared on ties. `None` when nothing matched.
    #[must_use]
    pub fn winner(&self) -> Option<&str> {
        self.winner.as_deref()
    }

    /// Every rule's outcome, in declaration order.
    #[must_use]
    pub fn outcomes(&self) -> &[(String, RuleOutcome)] {
        &self.outcomes
    }

    /// Names of rules that matched, in declaration order.
    pub fn matched(&self) -> impl Iterator<Item = &str> {
        self.outcomes
            .iter()
            .filter(|(_, o)| o.is_match())
            .map(|(name, _)| name.as_str())
    }

    /// Rules that could not be evaluated, with their outcome.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &RuleOutcome)> {
        self.outcomes
            .iter()
            .filter(|(_, o)| o.is_error())
            .map(|(name, o)| (name.as_str(), o))
    }

    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.winner {
            Some(w) => write!(f, "winner: {w}")?,
            None => write!(f, "winner: none")?,
        }
        let matched: Vec<&str> = self.matched().collect();
        write!(f, ", matched: [{}]", matched.join(", "))?;
        let failed: Vec<&str> = self.failures().map(|(name, _)| name).collect();
        if !failed.is_empty() {
            write!(f, ", failed: [{}]", failed.join(", "))?;
        }
        write!(f, ", duration: {:?}", self.duration)?;
        Ok(())
    }
}
