use std::time::Instant;

use crate::predicate;
use crate::types::{CompiledExpr, CompiledRule, RuleBody};
use crate::{ClassificationReport, EvalError, Predicate, RuleOutcome, Value};

pub(crate) fn evaluate(expr: &CompiledExpr, text: &str) -> Result<bool, EvalError> {
    eval_expr(expr, text).map(|v| v.is_truthy())
}

pub(crate) fn evaluate_rules(rules: &[CompiledRule], text: &str) -> ClassificationReport {
    let start = Instant::now();
    let mut outcomes = Vec::with_capacity(rules.len());
    let mut winner: Option<(&str, usize)> = None;

    for rule in rules {
        let outcome = match &rule.body {
            RuleBody::Compiled(expr) => {
                let outcome = match expr.evaluate(text) {
                    Ok(true) => RuleOutcome::Matched,
                    Ok(false) => RuleOutcome::NotMatched,
                    Err(e) => RuleOutcome::Failed(e),
                };
                if outcome.is_match() {
                    let len = expr.source_len();
                    // Strictly longer wins, so the earliest rule keeps a tie.
                    if winner.map_or(true, |(_, best)| len > best) {
                        winner = Some((rule.name.as_str(), len));
                    }
                }
                outcome
            }
            RuleBody::Unparseable { .. } => RuleOutcome::Unparseable,
        };
        tracing::debug!(rule = %rule.name, ?outcome, "rule evaluated");
        outcomes.push((rule.name.clone(), outcome));
    }

    ClassificationReport::new(
        winner.map(|(name, _)| name.to_owned()),
        outcomes,
        start.elapsed(),
    )
}

fn eval_expr(expr: &CompiledExpr, text: &str) -> Result<Value, EvalError> {
    match expr {
        CompiledExpr::Literal(value) => Ok(value.clone()),
        CompiledExpr::And(a, b) => {
            let result = eval_expr(a, text)?.is_truthy() && eval_expr(b, text)?.is_truthy();
            Ok(Value::Bool(result))
        }
        CompiledExpr::Or(a, b) => {
            let result = eval_expr(a, text)?.is_truthy() || eval_expr(b, text)?.is_truthy();
            Ok(Value::Bool(result))
        }
        CompiledExpr::Not(inner) => Ok(Value::Bool(!eval_expr(inner, text)?.is_truthy())),
        CompiledExpr::Call(function, args) => call(*function, args, text).map(Value::Bool),
    }
}

fn call(function: Predicate, args: &[CompiledExpr], text: &str) -> Result<bool, EvalError> {
    if args.len() != function.arity() {
        return Err(EvalError::Arity {
            function,
            expected: function.arity(),
            found: args.len(),
        });
    }
    let values = args
        .iter()
        .map(|arg| eval_expr(arg, text))
        .collect::<Result<Vec<_>, _>>()?;

    let keyword = string_arg(function, &values, 0)?;
    Ok(match function {
        Predicate::Contains => predicate::contains(text, keyword),
        Predicate::Percentage => {
            predicate::percentage(text, keyword, number_arg(function, &values, 1)?)
        }
        Predicate::Similar => predicate::similar(text, keyword, number_arg(function, &values, 1)?),
    })
}

fn string_arg(function: Predicate, values: &[Value], index: usize) -> Result<&str, EvalError> {
    values[index]
        .as_str()
        .ok_or_else(|| EvalError::ArgumentType {
            function,
            position: index + 1,
            expected: "string",
            found: values[index].type_name(),
        })
}

fn number_arg(function: Predicate, values: &[Value], index: usize) -> Result<f64, EvalError> {
    values[index]
        .as_f64()
        .ok_or_else(|| EvalError::ArgumentType {
            function,
            position: index + 1,
            expected: "number",
            found: values[index].type_name(),
        })
}
