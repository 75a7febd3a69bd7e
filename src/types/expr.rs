use std::fmt;
use std::ops::Not;

use super::Value;

/// The three text predicates a rule expression may call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Predicate {
    /// `contains(keyword)`
    Contains,
    /// `percentage(keyword, threshold)`
    Percentage,
    /// `similar(keyword, threshold)`
    Similar,
}

impl Predicate {
    /// Resolve a called function name. Anything outside the three predicates
    /// is rejected during validation.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "contains" => Some(Predicate::Contains),
            "percentage" => Some(Predicate::Percentage),
            "similar" => Some(Predicate::Similar),
            _ => None,
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Predicate::Contains => "contains",
            Predicate::Percentage => "percentage",
            Predicate::Similar => "similar",
        }
    }

    #[must_use]
    pub fn arity(self) -> usize {
        match self {
            Predicate::Contains => 1,
            Predicate::Percentage | Predicate::Similar => 2,
        }
    }
}

/// Syntax tree produced by the parser.
///
/// This is wider than what may be evaluated: `Name` and calls to unknown
/// functions are accepted syntactically so that validation can reject them as
/// configuration errors. Lowered into [`CompiledExpr`] by compilation.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
    Call { function: String, args: Vec<Expr> },
    /// A bare identifier or dotted attribute path.
    Name(String),
    /// A comparison, arithmetic operator or subscript (`[]`).
    Operator {
        operator: String,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

/// Validated expression restricted to the closed grammar.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum CompiledExpr {
    Literal(Value),
    And(Box<CompiledExpr>, Box<CompiledExpr>),
    Or(Box<CompiledExpr>, Box<CompiledExpr>),
    Not(Box<CompiledExpr>),
    Call(Predicate, Vec<CompiledExpr>),
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(value) => write!(f, "{value}"),
            Expr::And(a, b) => write!(f, "({a} and {b})"),
            Expr::Or(a, b) => write!(f, "({a} or {b})"),
            Expr::Not(inner) => write!(f, "(not {inner})"),
            Expr::Call { function, args } => {
                write!(f, "{function}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(")")
            }
            Expr::Name(name) => f.write_str(name),
            Expr::Operator {
                operator,
                left,
                right,
            } if operator == "[]" => write!(f, "{left}[{right}]"),
            Expr::Operator {
                operator,
                left,
                right,
            } => write!(f, "({left} {operator} {right})"),
        }
    }
}

impl Expr {
    #[must_use]
    pub fn and(self, other: Expr) -> Expr {
        Expr::And(Box::new(self), Box::new(other))
    }

    #[must_use]
    pub fn or(self, other: Expr) -> Expr {
        Expr::Or(Box::new(self), Box::new(other))
    }
}

impl Not for Expr {
    type Output = Expr;

    fn not(self) -> Expr {
        Expr::Not(Box::new(self))
    }
}

fn call(predicate: Predicate, args: Vec<Value>) -> Expr {
    Expr::Call {
        function: predicate.name().to_owned(),
        args: args.into_iter().map(Expr::Literal).collect(),
    }
}

/// `contains(keyword)`: substring test.
#[must_use]
pub fn contains(keyword: &str) -> Expr {
    call(Predicate::Contains, vec![keyword.into()])
}

/// `percentage(keyword, threshold)`: keyword frequency per whitespace token, in percent.
#[must_use]
pub fn percentage(keyword: &str, threshold: impl Into<Value>) -> Expr {
    call(Predicate::Percentage, vec![keyword.into(), threshold.into()])
}

/// `similar(keyword, threshold)`: fuzzy containment with a similarity ratio in `[0, 1]`.
#[must_use]
pub fn similar(keyword: &str, threshold: impl Into<Value>) -> Expr {
    call(Predicate::Similar, vec![keyword.into(), threshold.into()])
}
