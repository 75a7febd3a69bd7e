#![allow(dead_code)]

use docsplit::{
    Category, Expr, PageClassification, PageObservation, RuleSet, RuleSetBuilder, contains,
    percentage, similar,
};
use proptest::prelude::*;

// --- Fixed vocabulary ---
// Keywords start with a complete sub-token, so the fuzzy anchor is always a
// prefix of the keyword.

pub const KEYWORDS: &[&str] = &["发票", "收据", "增值税", "合同", "invoice", "税"];
const FILLERS: &[&str] = &["金额", "日期", "续页", "No", "123", "专用", "发"];

/// A keyword from the fixed vocabulary.
pub fn arb_keyword() -> impl Strategy<Value = &'static str> {
    prop::sample::select(KEYWORDS)
}

/// Page text built from keywords and fillers, joined by single spaces.
pub fn arb_page_text() -> impl Strategy<Value = String> {
    let word = prop_oneof![
        prop::sample::select(KEYWORDS),
        prop::sample::select(FILLERS),
    ];
    prop::collection::vec(word, 0..8).prop_map(|words| words.join(" "))
}

/// Generate a single predicate call.
fn arb_leaf_expr() -> impl Strategy<Value = Expr> {
    prop_oneof![
        arb_keyword().prop_map(contains),
        (arb_keyword(), 0_i64..=100).prop_map(|(k, t)| percentage(k, t)),
        (arb_keyword(), 0.0_f64..=1.0).prop_map(|(k, t)| similar(k, t)),
    ]
}

/// Generate a composite expression tree (and, or, not of calls), bounded depth.
pub fn arb_expr(max_depth: u32) -> impl Strategy<Value = Expr> {
    arb_leaf_expr().prop_recursive(max_depth, 16, 2, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(a, b)| a.and(b)),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| a.or(b)),
            inner.prop_map(|e| !e),
        ]
    })
}

/// A generated rule (name + expression).
#[derive(Debug, Clone)]
pub struct GenRule {
    pub name: String,
    pub expr: Expr,
}

#[derive(Debug, Clone)]
pub struct GenRuleSet {
    pub rules: Vec<GenRule>,
}

impl GenRuleSet {
    /// Compile into an actual `RuleSet`.
    ///
    /// # Panics
    ///
    /// Panics if the generated rules fail to compile (should not happen with
    /// these generators).
    #[must_use]
    pub fn compile(&self) -> RuleSet {
        self.rules
            .iter()
            .fold(RuleSetBuilder::new(), |builder, rule| {
                builder.rule_expr(&rule.name, rule.expr.clone())
            })
            .compile()
            .expect("generated rules should compile")
    }

    /// Same rules, declared in reverse order.
    #[must_use]
    pub fn reversed(&self) -> Self {
        Self {
            rules: self.rules.iter().rev().cloned().collect(),
        }
    }
}

/// 1..=6 rules with distinct names.
pub fn arb_ruleset() -> impl Strategy<Value = GenRuleSet> {
    prop::collection::vec(arb_expr(2), 1..=6).prop_map(|exprs| GenRuleSet {
        rules: exprs
            .into_iter()
            .enumerate()
            .map(|(i, expr)| GenRule {
                name: format!("rule_{i}"),
                expr,
            })
            .collect(),
    })
}

/// A document of up to 30 pages, roughly one in five blank.
pub fn arb_pages() -> impl Strategy<Value = Vec<PageObservation>> {
    prop::collection::vec((prop::bool::weighted(0.2), arb_page_text()), 0..30).prop_map(
        |pages| {
            pages
                .into_iter()
                .enumerate()
                .map(|(i, (blank, text))| {
                    if blank {
                        PageObservation::blank(i)
                    } else {
                        PageObservation::text(i, text)
                    }
                })
                .collect()
        },
    )
}

/// Arbitrary per-page categories for grouping, drawn from a small set.
pub fn arb_classifications() -> impl Strategy<Value = Vec<PageClassification>> {
    let category = prop_oneof![
        Just(Category::Blank),
        Just(Category::Other),
        Just(Category::rule("A")),
        Just(Category::rule("B")),
    ];
    prop::collection::vec(category, 0..40).prop_map(|categories| {
        categories
            .into_iter()
            .enumerate()
            .map(|(i, c)| PageClassification::new(i, c))
            .collect()
    })
}
