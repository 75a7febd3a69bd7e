mod category;
mod error;
mod evaluation_report;
mod expr;
mod page;
mod rule;
mod ruleset;
mod value;

pub use category::Category;
pub use error::{CompileError, EvalError};
pub use evaluation_report::{ClassificationReport, RuleOutcome};
pub(crate) use expr::CompiledExpr;
pub use expr::{Expr, Predicate, contains, percentage, similar};
pub use page::{DocumentGroup, PageClassification, PageObservation};
pub(crate) use rule::{CompiledRule, RuleBody};
pub use rule::{Expression, Rule};
pub use ruleset::{RuleSet, RuleSetBuilder};
pub use value::Value;
