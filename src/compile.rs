use std::collections::HashSet;

use crate::types::{CompiledExpr, CompiledRule, RuleBody};
use crate::{Category, CompileError, Expr, Expression, Predicate, Rule, RuleSet};

pub(crate) fn compile(rules: Vec<Rule>) -> Result<RuleSet, CompileError> {
    check_names(&rules)?;

    let mut compiled = Vec::with_capacity(rules.len());
    for rule in rules {
        let body = match crate::parse::parse(&rule.source) {
            Ok(parsed) => {
                let tree = validate(&parsed).map_err(|e| e.in_rule(&rule.name))?;
                RuleBody::Compiled(Expression::new(rule.source, tree))
            }
            Err(error) => {
                tracing::warn!(
                    rule = %rule.name,
                    expression = %rule.source,
                    %error,
                    "rule expression does not parse; rule will never match"
                );
                RuleBody::Unparseable {
                    source: rule.source,
                    error,
                }
            }
        };
        compiled.push(CompiledRule {
            name: rule.name,
            body,
        });
    }

    tracing::debug!(rules = compiled.len(), "compiled rule set");
    Ok(RuleSet { rules: compiled })
}

/// Rule names must be unique and must not shadow the fallback categories.
fn check_names(rules: &[Rule]) -> Result<(), CompileError> {
    let mut seen = HashSet::new();
    for rule in rules {
        if Category::is_reserved(&rule.name) {
            return Err(CompileError::ReservedName {
                name: rule.name.clone(),
            });
        }
        if !seen.insert(&rule.name) {
            return Err(CompileError::DuplicateRule {
                name: rule.name.clone(),
            });
        }
    }
    Ok(())
}

/// Lower a parsed tree into the closed grammar. Every node is checked;
/// nothing outside `Literal`, `And`, `Or`, `Not` and the three predicate
/// calls survives.
pub(crate) fn validate(expr: &Expr) -> Result<CompiledExpr, CompileError> {
    match expr {
        Expr::Literal(value) => Ok(CompiledExpr::Literal(value.clone())),
        Expr::And(a, b) => Ok(CompiledExpr::And(
            Box::new(validate(a)?),
            Box::new(validate(b)?),
        )),
        Expr::Or(a, b) => Ok(CompiledExpr::Or(
            Box::new(validate(a)?),
            Box::new(validate(b)?),
        )),
        Expr::Not(inner) => Ok(CompiledExpr::Not(Box::new(validate(inner)?))),
        Expr::Call { function, args } => {
            let predicate =
                Predicate::from_name(function).ok_or_else(|| CompileError::UnknownFunction {
                    function: function.clone(),
                })?;
            let args = args
                .iter()
                .map(validate)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(CompiledExpr::Call(predicate, args))
        }
        Expr::Name(name) => Err(CompileError::DisallowedName { name: name.clone() }),
        Expr::Operator { operator, .. } => Err(CompileError::DisallowedOperator {
            operator: operator.clone(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use crate::parse::parse;
    use crate::types::CompiledExpr;
    use crate::{CompileError, Predicate, RuleSetBuilder, Value};

    use super::validate;

    #[test]
    fn compile_simple_ruleset() {
        let ruleset = RuleSetBuilder::new()
            .rule("Invoice", "contains('发票')")
            .compile()
            .unwrap();
        assert_eq!(ruleset.rules.len(), 1);
        assert_eq!(ruleset.rules[0].name, "Invoice");
    }

    #[test]
    fn compile_duplicate_rule() {
        let result = RuleSetBuilder::new()
            .rule("Invoice", "contains('发票')")
            .rule("Invoice", "contains('增值税')")
            .compile();
        assert!(matches!(result, Err(CompileError::DuplicateRule { .. })));
    }

    #[test]
    fn compile_empty_ruleset() {
        let ruleset = RuleSetBuilder::new().compile().unwrap();
        assert!(ruleset.is_empty());
    }

    #[test]
    fn validate_lowers_closed_grammar() {
        let tree = validate(&parse("not contains('a') and percentage('b', 5)").unwrap()).unwrap();
        match tree {
            CompiledExpr::And(left, right) => {
                assert!(matches!(*left, CompiledExpr::Not(_)));
                assert_eq!(
                    *right,
                    CompiledExpr::Call(
                        Predicate::Percentage,
                        vec![
                            CompiledExpr::Literal(Value::String("b".into())),
                            CompiledExpr::Literal(Value::Int(5)),
                        ]
                    )
                );
            }
            other => panic!("expected And, got {other:?}"),
        }
    }

    #[test]
    fn unknown_function_is_rejected() {
        let err = validate(&parse("eval('1')").unwrap()).unwrap_err();
        assert!(matches!(err, CompileError::UnknownFunction { function } if function == "eval"));
    }

    #[test]
    fn attribute_call_is_rejected() {
        let err = validate(&parse("os.system('rm')").unwrap()).unwrap_err();
        assert!(err.is_security_violation());
    }

    #[test]
    fn bare_name_is_rejected_even_when_nested() {
        let err = validate(&parse("contains('a') or contains(__builtins__)").unwrap()).unwrap_err();
        assert!(matches!(err, CompileError::DisallowedName { name } if name == "__builtins__"));
    }

    #[test]
    fn security_violation_fails_whole_ruleset() {
        let result = RuleSetBuilder::new()
            .rule("Invoice", "contains('发票')")
            .rule("Evil", "contains('x') or __import__('os')")
            .compile();
        match result {
            Err(err @ CompileError::Rule { .. }) => {
                assert!(err.is_security_violation());
                assert!(err.to_string().starts_with("rule 'Evil': "));
            }
            other => panic!("expected Rule error, got {other:?}"),
        }
    }

    #[test]
    fn unparseable_rule_is_kept_but_flagged() {
        let ruleset = RuleSetBuilder::new()
            .rule("Invoice", "contains('发票')")
            .rule("Garbled", "contains('发票' and")
            .compile()
            .unwrap();
        assert_eq!(ruleset.len(), 2);
        assert_eq!(ruleset.unparseable_rules(), vec!["Garbled"]);
    }

    #[test]
    fn builtin_category_names_are_refused() {
        for name in ["Other", "Blank"] {
            let result = RuleSetBuilder::new()
                .rule("Invoice", "contains('发票')")
                .rule(name, "contains('x')")
                .compile();
            assert!(
                matches!(result, Err(CompileError::ReservedName { name: ref n }) if n == name),
                "{name}"
            );
        }
    }

    #[test]
    fn operators_are_rejected() {
        for (source, operator) in [
            ("contains('a') == True", "=="),
            ("1 + 2", "+"),
            ("not percentage('a', 1) < 5", "<"),
            ("contains('a'[0])", "[]"),
        ] {
            let err = validate(&parse(source).unwrap()).unwrap_err();
            assert!(
                matches!(err, CompileError::DisallowedOperator { operator: ref op } if op == operator),
                "{source}: {err:?}"
            );
            assert!(err.is_security_violation());
        }
    }

    #[test]
    fn deep_nesting_is_an_unparseable_rule() {
        let deep = format!("{}contains('a'){}", "(".repeat(5000), ")".repeat(5000));
        let ruleset = RuleSetBuilder::new()
            .rule("Invoice", "contains('a')")
            .rule("Deep", deep)
            .compile()
            .unwrap();
        assert_eq!(ruleset.unparseable_rules(), vec!["Deep"]);
        assert_eq!(ruleset.best_match("a").as_deref(), Some("Invoice"));
    }
}
