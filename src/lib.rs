//! Rule-driven classification and splitting of scanned multi-page documents.
//!
//! Each page's OCR text is checked against a set of named rule expressions.
//! The page takes the category of the matching rule with the longest
//! expression, inherits the previous page's category when nothing matches,
//! and consecutive pages of one category are grouped for output.
//!
//! ```
//! use docsplit::{classify_pages, group_pages, Category, PageObservation, RuleSetBuilder};
//!
//! let rules = RuleSetBuilder::new()
//!     .rule("Invoice", "contains('发票')")
//!     .rule("Receipt", "contains('收据') or percentage('收款', 50)")
//!     .compile()
//!     .unwrap();
//!
//! let pages = [
//!     PageObservation::text(0, "增值税 发票"),
//!     PageObservation::text(1, "明细"),
//!     PageObservation::blank(2),
//!     PageObservation::text(3, "收据"),
//! ];
//! let groups = group_pages(&classify_pages(&rules, &pages));
//! assert_eq!(groups.len(), 2);
//! assert_eq!(groups[0].category, Category::rule("Invoice"));
//! assert_eq!(groups[0].page_indices, vec![0, 1]);
//! ```

mod compile;
mod error;
mod evaluate;
mod types;

pub mod assemble;
pub mod batch;
pub mod classify;
pub mod config;
pub mod group;
pub mod parse;
pub mod predicate;
pub mod source;
pub mod text;

pub use assemble::{Manifest, ManifestAssembler};
pub use batch::{
    BatchReport, BatchRunner, DocumentAssembler, DocumentOutcome, PageRead, PageSource,
    process_document,
};
pub use classify::{ClassifierState, classify, classify_pages};
pub use config::BatchConfig;
pub use error::DocsplitError;
pub use group::{Grouper, group_pages};
pub use source::{JsonPageSource, MemoryPageSource};
pub use types::{
    Category, ClassificationReport, CompileError, DocumentGroup, EvalError, Expr, Expression,
    PageClassification, PageObservation, Predicate, Rule, RuleOutcome, RuleSet, RuleSetBuilder,
    Value, contains, percentage, similar,
};
