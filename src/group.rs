//! Turns a document's per-page categories into output groups.
//!
//! A change of category closes the pending group. Blank pages are a change
//! of category that contributes no page, so the pages after a blank always
//! open a new group even when their category matches the one before it.

use crate::{Category, DocumentGroup, PageClassification};

/// Streaming grouping state machine.
#[derive(Debug, Default)]
pub struct Grouper {
    current: Option<Category>,
    pending: Vec<usize>,
}

impl Grouper {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next page. Returns the group that this page closed, if any.
    pub fn push(&mut self, page: &PageClassification) -> Option<DocumentGroup> {
        let mut closed = None;
        if self.current.as_ref() != Some(&page.category) {
            closed = self.flush();
            self.current = Some(page.category.clone());
        }
        if !page.category.is_blank() {
            self.pending.push(page.index);
        }
        closed
    }

    /// Close the last group.
    #[must_use]
    pub fn finish(mut self) -> Option<DocumentGroup> {
        self.flush()
    }

    fn flush(&mut self) -> Option<DocumentGroup> {
        if self.pending.is_empty() {
            return None;
        }
        let category = self.current.clone()?;
        Some(DocumentGroup::new(category, std::mem::take(&mut self.pending)))
    }
}

/// Group a whole document's classifications.
#[must_use]
pub fn group_pages(pages: &[PageClassification]) -> Vec<DocumentGroup> {
    let mut grouper = Grouper::new();
    let mut groups: Vec<DocumentGroup> = pages.iter().filter_map(|p| grouper.push(p)).collect();
    groups.extend(grouper.finish());
    groups
}
