//! Per-page classification with the inheritance fallback.
//!
//! Page `i + 1` depends on the resolved category of page `i`, so a document
//! is classified as a fold over its pages with [`ClassifierState`] as the
//! accumulator.

use crate::{Category, PageClassification, PageObservation, RuleOutcome, RuleSet};

/// Classify one non-blank page.
///
/// The winning rule is the matching rule with the longest expression source.
/// When nothing matches, the page inherits `previous` unless it is absent or
/// [`Category::Blank`], in which case it is [`Category::Other`]. Rules that
/// fail to evaluate count as non-matching and are logged.
#[must_use]
pub fn classify(ruleset: &RuleSet, text: &str, previous: Option<&Category>) -> Category {
    let report = ruleset.evaluate_detailed(text);
    for (rule, outcome) in report.failures() {
        match outcome {
            RuleOutcome::Failed(error) => {
                tracing::warn!(rule, %error, "rule evaluation failed; treated as no match");
            }
            _ => tracing::debug!(rule, "unparseable rule skipped"),
        }
    }

    match report.winner() {
        Some(name) => Category::rule(name),
        None => match previous {
            Some(prev) if !prev.is_blank() => prev.clone(),
            _ => Category::Other,
        },
    }
}

/// Fold accumulator: the category of the most recent blank or readable page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassifierState {
    previous: Option<Category>,
}

impl ClassifierState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn previous(&self) -> Option<&Category> {
        self.previous.as_ref()
    }

    /// Classify `page` and return the next state along with the result.
    /// Blank pages bypass the rules and reset the fallback.
    #[must_use]
    pub fn step(self, ruleset: &RuleSet, page: &PageObservation) -> (Self, PageClassification) {
        let category = if page.is_blank {
            tracing::info!(page = page.index + 1, "blank page");
            Category::Blank
        } else {
            let category = classify(ruleset, &page.text, self.previous.as_ref());
            tracing::info!(page = page.index + 1, %category, "page classified");
            category
        };
        let next = Self {
            previous: Some(category.clone()),
        };
        (next, PageClassification::new(page.index, category))
    }

    /// A page whose text could not be obtained is `Other` and leaves the
    /// state untouched, so the next page can still inherit across it.
    #[must_use]
    pub fn step_unreadable(self, index: usize) -> (Self, PageClassification) {
        (self, PageClassification::new(index, Category::Other))
    }
}

/// Classify a document's pages in order.
pub fn classify_pages<'a, I>(ruleset: &RuleSet, pages: I) -> Vec<PageClassification>
where
    I: IntoIterator<Item = &'a PageObservation>,
{
    let (_, classified) = pages.into_iter().fold(
        (ClassifierState::new(), Vec::new()),
        |(state, mut out), page| {
            let (next, classification) = state.step(ruleset, page);
            out.push(classification);
            (next, out)
        },
    );
    classified
}
