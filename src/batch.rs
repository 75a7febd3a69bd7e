//! Drives whole documents through acquisition, classification, grouping and
//! assembly, and fans a batch of documents out over a fixed worker pool.
//!
//! Logging goes to an explicit [`Dispatch`] that each worker installs for
//! itself, so a batch never depends on process-global logger state.

use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use thiserror::Error;
use tracing::Dispatch;

use crate::classify::ClassifierState;
use crate::config::BatchConfig;
use crate::group::group_pages;
use crate::{DocumentGroup, PageClassification, PageObservation, RuleSet};

/// One page as returned by a [`PageSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageRead {
    Observed(PageObservation),
    /// The page exists but its text could not be extracted.
    Unreadable { index: usize, reason: String },
}

/// Failure to obtain a document's pages. Fatal for that document only.
#[derive(Debug, Error)]
pub enum AcquisitionError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed page data in {}: {source}", path.display())]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("unknown document {}", path.display())]
    NotFound { path: PathBuf },
}

/// Failure to hand a document's groups to the assembler.
#[derive(Debug, Error)]
pub enum AssemblyError {
    #[error("cannot write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot encode manifest: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error(transparent)]
    Acquisition(#[from] AcquisitionError),

    #[error(transparent)]
    Assembly(#[from] AssemblyError),

    /// A collaborator panicked while handling this document.
    #[error("document processing panicked")]
    WorkerPanicked,
}

/// Supplies page text for a document (the OCR side).
pub trait PageSource: Sync {
    /// Every page of `document`, in page order.
    ///
    /// # Errors
    ///
    /// Returns [`AcquisitionError`] when the document as a whole cannot be read.
    fn read_pages(&self, document: &Path) -> Result<Vec<PageRead>, AcquisitionError>;
}

/// Receives the groups produced for a document (the output side).
pub trait DocumentAssembler: Sync {
    /// # Errors
    ///
    /// Returns [`AssemblyError`] when the output cannot be produced.
    fn assemble(&self, document: &Path, groups: &[DocumentGroup]) -> Result<(), AssemblyError>;
}

/// What happened to one document.
#[derive(Debug)]
pub struct DocumentOutcome {
    pub document: PathBuf,
    pub result: Result<Vec<DocumentGroup>, DocumentError>,
}

impl DocumentOutcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    #[must_use]
    pub fn groups(&self) -> Option<&[DocumentGroup]> {
        self.result.as_deref().ok()
    }
}

/// Outcomes of a batch, in the order the documents were given.
#[derive(Debug)]
pub struct BatchReport {
    pub outcomes: Vec<DocumentOutcome>,
}

impl BatchReport {
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }
}

/// Classify pages as returned by a source. Unreadable pages become `Other`
/// without disturbing the fallback chain.
pub fn classify_reads(ruleset: &RuleSet, pages: &[PageRead]) -> Vec<PageClassification> {
    let (_, classified) = pages.iter().fold(
        (ClassifierState::new(), Vec::with_capacity(pages.len())),
        |(state, mut out), read| {
            let (next, classification) = match read {
                PageRead::Observed(page) => state.step(ruleset, page),
                PageRead::Unreadable { index, reason } => {
                    tracing::warn!(page = index + 1, %reason, "page text unavailable; classified as Other");
                    state.step_unreadable(*index)
                }
            };
            out.push(classification);
            (next, out)
        },
    );
    classified
}

/// Run one document end to end. Never panics on bad input; failures are
/// logged and returned in the outcome.
pub fn process_document<S, A>(
    ruleset: &RuleSet,
    source: &S,
    assembler: &A,
    document: &Path,
) -> DocumentOutcome
where
    S: PageSource + ?Sized,
    A: DocumentAssembler + ?Sized,
{
    let span = tracing::info_span!("document", path = %document.display());
    let _entered = span.enter();
    tracing::info!("processing document");

    let result = run_document(ruleset, source, assembler, document);
    match &result {
        Ok(groups) => tracing::info!(groups = groups.len(), "document done"),
        Err(error) => tracing::error!(%error, "document skipped"),
    }
    DocumentOutcome {
        document: document.to_path_buf(),
        result,
    }
}

fn run_document<S, A>(
    ruleset: &RuleSet,
    source: &S,
    assembler: &A,
    document: &Path,
) -> Result<Vec<DocumentGroup>, DocumentError>
where
    S: PageSource + ?Sized,
    A: DocumentAssembler + ?Sized,
{
    let pages = source.read_pages(document)?;
    let classified = classify_reads(ruleset, &pages);
    let groups = group_pages(&classified);
    for group in &groups {
        let pages: Vec<usize> = group.page_indices.iter().map(|i| i + 1).collect();
        tracing::info!(category = %group.category, ?pages, "group formed");
    }
    assembler.assemble(document, &groups)?;
    Ok(groups)
}

/// Processes documents concurrently on a fixed number of scoped threads.
/// The rule set is shared read-only; nothing else is shared between workers.
pub struct BatchRunner<'a, S: ?Sized, A: ?Sized> {
    ruleset: &'a RuleSet,
    source: &'a S,
    assembler: &'a A,
    config: BatchConfig,
    dispatch: Dispatch,
}

impl<'a, S, A> BatchRunner<'a, S, A>
where
    S: PageSource + ?Sized,
    A: DocumentAssembler + ?Sized,
{
    /// Create a runner that logs to the caller's current dispatcher.
    pub fn new(ruleset: &'a RuleSet, source: &'a S, assembler: &'a A) -> Self {
        Self {
            ruleset,
            source,
            assembler,
            config: BatchConfig::default(),
            dispatch: tracing::dispatcher::get_default(Dispatch::clone),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: BatchConfig) -> Self {
        self.config = config;
        self
    }

    /// Send every worker's logs to `dispatch`.
    #[must_use]
    pub fn with_dispatch(mut self, dispatch: Dispatch) -> Self {
        self.dispatch = dispatch;
        self
    }

    /// Process `documents` and return one outcome per document, in input order.
    pub fn run(&self, documents: &[PathBuf]) -> BatchReport {
        let workers = self.config.effective_workers().min(documents.len()).max(1);
        let cursor = AtomicUsize::new(0);
        let mut slots: Vec<Option<DocumentOutcome>> = documents.iter().map(|_| None).collect();

        thread::scope(|scope| {
            let handles: Vec<_> = (0..workers)
                .map(|_| scope.spawn(|| self.worker(documents, &cursor)))
                .collect();
            for handle in handles {
                // Panics are caught per document; a worker that still dies
                // leaves its slots empty and they are reported below.
                if let Ok(done) = handle.join() {
                    for (i, outcome) in done {
                        slots[i] = Some(outcome);
                    }
                }
            }
        });

        let outcomes: Vec<DocumentOutcome> = slots
            .into_iter()
            .zip(documents)
            .map(|(slot, document)| {
                slot.unwrap_or_else(|| DocumentOutcome {
                    document: document.clone(),
                    result: Err(DocumentError::WorkerPanicked),
                })
            })
            .collect();
        let report = BatchReport { outcomes };

        tracing::dispatcher::with_default(&self.dispatch, || {
            tracing::info!(
                documents = documents.len(),
                succeeded = report.succeeded(),
                failed = report.failed(),
                "batch finished"
            );
        });
        report
    }

    fn worker(&self, documents: &[PathBuf], cursor: &AtomicUsize) -> Vec<(usize, DocumentOutcome)> {
        tracing::dispatcher::with_default(&self.dispatch, || {
            let mut done = Vec::new();
            loop {
                let i = cursor.fetch_add(1, Ordering::Relaxed);
                let Some(document) = documents.get(i) else {
                    break;
                };
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                    process_document(self.ruleset, self.source, self.assembler, document)
                }))
                .unwrap_or_else(|_| {
                    tracing::error!(path = %document.display(), "document processing panicked");
                    DocumentOutcome {
                        document: document.clone(),
                        result: Err(DocumentError::WorkerPanicked),
                    }
                });
                done.push((i, outcome));
            }
            done
        })
    }
}
