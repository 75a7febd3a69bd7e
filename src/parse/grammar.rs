use winnow::ascii::dec_int;
use winnow::combinator::{alt, cut_err, fail, opt, preceded, repeat, separated, terminated};
use winnow::error::{ErrMode, ModalResult, StrContext, StrContextValue};
use winnow::prelude::*;
use winnow::token::{any, take_while};

use crate::{Expr, Value};

// -- Whitespace -------------------------------------------------------------

fn ws(input: &mut &str) -> ModalResult<()> {
    take_while(0.., char::is_whitespace)
        .void()
        .parse_next(input)
}

// -- Identifiers & keywords -------------------------------------------------

/// An identifier, possibly a dotted attribute path (`os.path`).
fn ident<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    (
        take_while(1.., |c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(0.., |c: char| {
            c.is_ascii_alphanumeric() || c == '_' || c == '.'
        }),
    )
        .take()
        .parse_next(input)
}

fn is_keyword(word: &str) -> bool {
    matches!(word, "and" | "AND" | "or" | "OR" | "not" | "NOT")
}

/// Match `word` in lower or upper case as a whole identifier, so that
/// `android` never reads as `and`.
fn keyword(word: &'static str) -> impl FnMut(&mut &str) -> ModalResult<()> {
    move |input: &mut &str| {
        ws.parse_next(input)?;
        let checkpoint = input.checkpoint();
        let found = ident.parse_next(input)?;
        if found == word || found == word.to_ascii_uppercase() {
            Ok(())
        } else {
            input.reset(&checkpoint);
            Err(ErrMode::from_input(input))
        }
    }
}

// -- Literals ---------------------------------------------------------------

fn string_literal(input: &mut &str) -> ModalResult<String> {
    let quote: char = alt(('\'', '"')).parse_next(input)?;
    let mut s = String::new();
    loop {
        let ch: char = cut_err(any)
            .context(StrContext::Expected(StrContextValue::Description(
                "closing quote",
            )))
            .parse_next(input)?;
        match ch {
            c if c == quote => return Ok(s),
            '\\' => {
                let esc: char = cut_err(any).parse_next(input)?;
                match esc {
                    '\'' => s.push('\''),
                    '"' => s.push('"'),
                    '\\' => s.push('\\'),
                    'n' => s.push('\n'),
                    't' => s.push('\t'),
                    other => {
                        s.push('\\');
                        s.push(other);
                    }
                }
            }
            c => s.push(c),
        }
    }
}

fn negative_number(input: &mut &str) -> ModalResult<Value> {
    let neg_str = (
        '-',
        take_while(1.., |c: char| c.is_ascii_digit() || c == '.'),
    )
        .take()
        .parse_next(input)?;
    if neg_str.contains('.') {
        let f: f64 = neg_str
            .parse()
            .map_err(|_| ErrMode::from_input(input).cut())?;
        Ok(Value::Float(f))
    } else {
        let i: i64 = neg_str
            .parse()
            .map_err(|_| ErrMode::from_input(input).cut())?;
        Ok(Value::Int(i))
    }
}

fn float_literal(input: &mut &str) -> ModalResult<f64> {
    // Only match floats that contain a decimal point
    (
        take_while(1.., |c: char| c.is_ascii_digit()),
        '.',
        take_while(1.., |c: char| c.is_ascii_digit()),
    )
        .take()
        .try_map(|s: &str| s.parse::<f64>())
        .parse_next(input)
}

fn literal(input: &mut &str) -> ModalResult<Value> {
    alt((
        string_literal.map(Value::String),
        negative_number,
        float_literal.map(Value::Float),
        dec_int::<_, i64, _>.map(Value::Int),
    ))
    .parse_next(input)
}

// -- Nesting ----------------------------------------------------------------

/// Deepest descent into brackets, call arguments and `not`.
const MAX_DEPTH: usize = 64;

/// Tallest syntax tree accepted; long `and`/`or` chains grow the tree
/// without descending.
const MAX_HEIGHT: usize = 1024;

/// A parsed subtree and its height.
type Node = (Expr, usize);

fn refuse<O>(input: &mut &str, limit: &'static str) -> ModalResult<O> {
    cut_err(fail)
        .context(StrContext::Expected(StrContextValue::Description(limit)))
        .parse_next(input)
}

fn height_within(input: &mut &str, height: usize) -> ModalResult<usize> {
    if height > MAX_HEIGHT {
        refuse(input, "an expression at most 1024 levels tall")
    } else {
        Ok(height)
    }
}

// -- Names & calls ----------------------------------------------------------

fn arguments(input: &mut &str, level: usize) -> ModalResult<(Vec<Expr>, usize)> {
    let args: Vec<Node> =
        separated(0.., |i: &mut &str| expr(i, level), (ws, ',')).parse_next(input)?;
    ws.parse_next(input)?;
    opt(',').parse_next(input)?;
    ws.parse_next(input)?;
    ')'.context(StrContext::Expected(StrContextValue::CharLiteral(')')))
        .parse_next(input)?;
    let height = args.iter().map(|(_, h)| *h).max().unwrap_or(0);
    Ok((args.into_iter().map(|(e, _)| e).collect(), height))
}

fn name_or_call(input: &mut &str, level: usize) -> ModalResult<Node> {
    let start = input.checkpoint();
    let name = ident.parse_next(input)?;
    if is_keyword(name) {
        input.reset(&start);
        return Err(ErrMode::from_input(input));
    }
    match name {
        "true" | "True" => return Ok((Expr::Literal(Value::Bool(true)), 0)),
        "false" | "False" => return Ok((Expr::Literal(Value::Bool(false)), 0)),
        _ => {}
    }

    let checkpoint = input.checkpoint();
    ws.parse_next(input)?;
    if opt('(').parse_next(input)?.is_some() {
        let (args, height) = cut_err(|i: &mut &str| arguments(i, level + 1)).parse_next(input)?;
        let height = height_within(input, height + 1)?;
        Ok((
            Expr::Call {
                function: name.to_owned(),
                args,
            },
            height,
        ))
    } else {
        input.reset(&checkpoint);
        Ok((Expr::Name(name.to_owned()), 0))
    }
}

// -- Expressions (precedence: OR < AND < NOT < operator < primary) ----------

fn primary(input: &mut &str, level: usize) -> ModalResult<Node> {
    ws.parse_next(input)?;
    alt((
        preceded(
            '(',
            cut_err(terminated(|i: &mut &str| expr(i, level + 1), (ws, ')'))),
        ),
        literal.map(|value| (Expr::Literal(value), 0)),
        |i: &mut &str| name_or_call(i, level),
    ))
    .context(StrContext::Expected(StrContextValue::Description(
        "expression",
    )))
    .parse_next(input)
}

/// Subscripts such as `x[0]`. Accepted only so validation can reject them.
fn postfix(input: &mut &str, level: usize) -> ModalResult<Node> {
    let mut node = primary(input, level)?;
    loop {
        let checkpoint = input.checkpoint();
        ws.parse_next(input)?;
        if opt('[').parse_next(input)?.is_none() {
            input.reset(&checkpoint);
            return Ok(node);
        }
        let (index, height) =
            cut_err(terminated(|i: &mut &str| expr(i, level + 1), (ws, ']'))).parse_next(input)?;
        let height = height_within(input, node.1.max(height) + 1)?;
        node = (
            Expr::Operator {
                operator: "[]".to_owned(),
                left: Box::new(node.0),
                right: Box::new(index),
            },
            height,
        );
    }
}

/// Comparison and arithmetic operators. None of them may appear in a rule;
/// they are parsed so the rule is refused with the operator named.
fn operator<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    preceded(
        ws,
        alt((
            "==", "!=", "<=", ">=", "**", "//", "<", ">", "+", "-", "*", "/", "%",
        )),
    )
    .parse_next(input)
}

fn operation(input: &mut &str, level: usize) -> ModalResult<Node> {
    let first = postfix(input, level)?;
    let rest: Vec<(&str, Node)> =
        repeat(0.., (operator, cut_err(|i: &mut &str| postfix(i, level)))).parse_next(input)?;
    let mut acc = first;
    for (operator, (right, height)) in rest {
        let height = height_within(input, acc.1.max(height) + 1)?;
        acc = (
            Expr::Operator {
                operator: operator.to_owned(),
                left: Box::new(acc.0),
                right: Box::new(right),
            },
            height,
        );
    }
    Ok(acc)
}

fn unary(input: &mut &str, level: usize) -> ModalResult<Node> {
    if level > MAX_DEPTH {
        return refuse(input, "brackets nested at most 64 levels deep");
    }
    if opt(keyword("not")).parse_next(input)?.is_some() {
        let (inner, height) = cut_err(|i: &mut &str| unary(i, level + 1)).parse_next(input)?;
        let height = height_within(input, height + 1)?;
        Ok((Expr::Not(Box::new(inner)), height))
    } else {
        operation(input, level)
    }
}

/// Left-fold a chain of operands, refusing trees taller than [`MAX_HEIGHT`].
fn chain(
    input: &mut &str,
    first: Node,
    rest: Vec<Node>,
    join: fn(Box<Expr>, Box<Expr>) -> Expr,
) -> ModalResult<Node> {
    let mut acc = first;
    for (right, height) in rest {
        let height = height_within(input, acc.1.max(height) + 1)?;
        acc = (join(Box::new(acc.0), Box::new(right)), height);
    }
    Ok(acc)
}

fn and_expr(input: &mut &str, level: usize) -> ModalResult<Node> {
    let first = unary(input, level)?;
    let rest: Vec<Node> = repeat(
        0..,
        preceded(keyword("and"), cut_err(|i: &mut &str| unary(i, level))),
    )
    .parse_next(input)?;
    chain(input, first, rest, Expr::And)
}

fn or_expr(input: &mut &str, level: usize) -> ModalResult<Node> {
    let first = and_expr(input, level)?;
    let rest: Vec<Node> = repeat(
        0..,
        preceded(keyword("or"), cut_err(|i: &mut &str| and_expr(i, level))),
    )
    .parse_next(input)?;
    chain(input, first, rest, Expr::Or)
}

fn expr(input: &mut &str, level: usize) -> ModalResult<Node> {
    ws.parse_next(input)?;
    or_expr(input, level)
}

// -- Top-level parser -------------------------------------------------------

pub fn expression(input: &mut &str) -> ModalResult<Expr> {
    let (parsed, _) = expr(input, 0)?;
    ws.parse_next(input)?;
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use crate::parse::parse;

    use super::*;

    fn call(function: &str, args: Vec<Value>) -> Expr {
        Expr::Call {
            function: function.to_owned(),
            args: args.into_iter().map(Expr::Literal).collect(),
        }
    }

    #[test]
    fn parse_single_call() {
        let expr = parse("contains('发票')").unwrap();
        assert_eq!(expr, call("contains", vec![Value::String("发票".into())]));
    }

    #[test]
    fn parse_double_quoted_string() {
        let expr = parse(r#"contains("收据")"#).unwrap();
        assert_eq!(expr, call("contains", vec![Value::String("收据".into())]));
    }

    #[test]
    fn parse_two_argument_call() {
        let expr = parse("percentage('税', 5)").unwrap();
        assert_eq!(
            expr,
            call(
                "percentage",
                vec![Value::String("税".into()), Value::Int(5)]
            )
        );
        let expr = parse("similar('发票号码', 0.8)").unwrap();
        assert_eq!(
            expr,
            call(
                "similar",
                vec![Value::String("发票号码".into()), Value::Float(0.8)]
            )
        );
    }

    #[test]
    fn parse_trailing_comma_and_spacing() {
        let expr = parse("  similar( 'a' , 0.5 , )  ").unwrap();
        assert_eq!(
            expr,
            call("similar", vec![Value::String("a".into()), Value::Float(0.5)])
        );
    }

    #[test]
    fn parse_empty_argument_list() {
        let expr = parse("contains()").unwrap();
        assert_eq!(expr, call("contains", vec![]));
    }

    #[test]
    fn parse_and_expression() {
        let expr = parse("contains('a') and contains('b')").unwrap();
        assert!(matches!(expr, Expr::And(_, _)));
    }

    #[test]
    fn parse_uppercase_keywords() {
        let expr = parse("NOT contains('a') OR contains('b') AND contains('c')").unwrap();
        assert!(matches!(expr, Expr::Or(_, _)));
    }

    #[test]
    fn parse_not_expression() {
        let expr = parse("not contains('a')").unwrap();
        assert!(matches!(expr, Expr::Not(_)));
    }

    #[test]
    fn parse_precedence_and_before_or() {
        let expr = parse("contains('a') or contains('b') and contains('c')").unwrap();
        match expr {
            Expr::Or(left, right) => {
                assert!(matches!(left.as_ref(), Expr::Call { .. }));
                assert!(matches!(right.as_ref(), Expr::And(_, _)));
            }
            other => panic!("expected Or, got {other:?}"),
        }
    }

    #[test]
    fn parse_parenthesized_grouping() {
        let expr = parse("(contains('a') or contains('b')) and contains('c')").unwrap();
        match expr {
            Expr::And(left, right) => {
                assert!(matches!(left.as_ref(), Expr::Or(_, _)));
                assert!(matches!(right.as_ref(), Expr::Call { .. }));
            }
            other => panic!("expected And, got {other:?}"),
        }
    }

    #[test]
    fn parse_keyword_prefix_is_a_name() {
        let expr = parse("android").unwrap();
        assert_eq!(expr, Expr::Name("android".into()));
        assert!(parse("contains('a') andcontains('b')").is_err());
    }

    #[test]
    fn parse_literals() {
        let cases = [
            ("42", Value::Int(42)),
            ("-5", Value::Int(-5)),
            ("3.5", Value::Float(3.5)),
            ("-0.25", Value::Float(-0.25)),
            ("true", Value::Bool(true)),
            ("False", Value::Bool(false)),
            ("'hi'", Value::String("hi".into())),
        ];
        for (text, expected) in cases {
            assert_eq!(parse(text).unwrap(), Expr::Literal(expected), "failed for {text}");
        }
    }

    #[test]
    fn parse_string_with_escapes() {
        let expr = parse(r#"contains('a\'b\\c\n')"#).unwrap();
        assert_eq!(
            expr,
            call("contains", vec![Value::String("a'b\\c\n".into())])
        );
    }

    #[test]
    fn parse_names_and_attribute_calls() {
        assert_eq!(parse("x").unwrap(), Expr::Name("x".into()));
        assert_eq!(
            parse("os.system('ls')").unwrap(),
            call("os.system", vec![Value::String("ls".into())])
        );
    }

    #[test]
    fn parse_nested_call_argument() {
        let expr = parse("contains(not contains('a'))").unwrap();
        match expr {
            Expr::Call { function, args } => {
                assert_eq!(function, "contains");
                assert!(matches!(args[0], Expr::Not(_)));
            }
            other => panic!("expected Call, got {other:?}"),
        }
    }

    #[test]
    fn parse_errors() {
        for bad in [
            "",
            "contains('a'",
            "contains('a) and x",
            "contains('a') and",
            "not",
            "(contains('a')",
            "contains('a') contains('b')",
            "x = 1",
            "import os",
            "99999999999999999999",
            "-1.2.3",
        ] {
            assert!(parse(bad).is_err(), "expected parse error for {bad:?}");
        }
    }

    #[test]
    fn parse_operators_as_nodes() {
        let expr = parse("contains('a') == True").unwrap();
        assert_eq!(
            expr,
            Expr::Operator {
                operator: "==".into(),
                left: Box::new(call("contains", vec![Value::String("a".into())])),
                right: Box::new(Expr::Literal(Value::Bool(true))),
            }
        );
        assert!(matches!(parse("x[0]").unwrap(), Expr::Operator { ref operator, .. } if operator == "[]"));
        assert!(matches!(parse("1 + 2 * 3").unwrap(), Expr::Operator { .. }));
        assert!(parse("contains('a') +").is_err());
    }

    #[test]
    fn nesting_within_limit_parses() {
        let source = format!("{}contains('a'){}", "(".repeat(40), ")".repeat(40));
        assert_eq!(
            parse(&source).unwrap(),
            call("contains", vec![Value::String("a".into())])
        );
        let chain = vec!["contains('a')"; 300].join(" or ");
        assert!(matches!(parse(&chain).unwrap(), Expr::Or(_, _)));
    }

    #[test]
    fn deep_nesting_is_refused() {
        for depth in [MAX_DEPTH + 1, 500, 5000] {
            let brackets = format!("{}contains('a'){}", "(".repeat(depth), ")".repeat(depth));
            assert!(parse(&brackets).is_err(), "brackets {depth}");

            let negations = format!("{}contains('a')", "not ".repeat(depth));
            assert!(parse(&negations).is_err(), "not {depth}");

            let calls = format!("{}'a'{}", "contains(".repeat(depth), ")".repeat(depth));
            assert!(parse(&calls).is_err(), "calls {depth}");
        }
        let chain = vec!["contains('a')"; MAX_HEIGHT + 2].join(" and ");
        assert!(parse(&chain).is_err());
    }
}
