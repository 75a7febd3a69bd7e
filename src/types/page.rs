use serde::Serialize;

use super::category::Category;

/// One page as delivered by the OCR collaborator. `text` is expected to be
/// whitespace-normalized already.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageObservation {
    pub index: usize,
    pub text: String,
    pub is_blank: bool,
}

impl PageObservation {
    pub fn text(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            text: text.into(),
            is_blank: false,
        }
    }

    #[must_use]
    pub fn blank(index: usize) -> Self {
        Self {
            index,
            text: String::new(),
            is_blank: true,
        }
    }
}

/// The resolved category of one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageClassification {
    pub index: usize,
    pub category: Category,
}

impl PageClassification {
    #[must_use]
    pub fn new(index: usize, category: Category) -> Self {
        Self { index, category }
    }
}

/// A run of consecutive non-blank pages sharing one category.
///
/// `page_indices` is never empty and strictly increasing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentGroup {
    pub category: Category,
    pub page_indices: Vec<usize>,
}

impl DocumentGroup {
    #[must_use]
    pub fn new(category: Category, page_indices: Vec<usize>) -> Self {
        Self {
            category,
            page_indices,
        }
    }
}
