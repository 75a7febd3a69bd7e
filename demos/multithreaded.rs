use std::path::{Path, PathBuf};
use std::sync::Mutex;

use docsplit::batch::AssemblyError;
use docsplit::{
    BatchConfig, BatchRunner, DocumentAssembler, DocumentGroup, MemoryPageSource,
    PageObservation, RuleSetBuilder,
};

/// Prints each document's groups instead of writing files.
#[derive(Default)]
struct Printer {
    lines: Mutex<Vec<String>>,
}

impl DocumentAssembler for Printer {
    fn assemble(&self, document: &Path, groups: &[DocumentGroup]) -> Result<(), AssemblyError> {
        let summary: Vec<String> = groups
            .iter()
            .map(|g| format!("{}x{}", g.category, g.page_indices.len()))
            .collect();
        self.lines
            .lock()
            .unwrap()
            .push(format!("{}: {}", document.display(), summary.join(", ")));
        Ok(())
    }
}

fn main() {
    tracing_subscriber::fmt().with_env_filter("docsplit=info").init();

    let ruleset = RuleSetBuilder::new()
        .rule("Invoice", "contains('发票')")
        .rule("Receipt", "contains('收据')")
        .compile()
        .expect("failed to compile ruleset");

    let mut source = MemoryPageSource::new();
    let documents: Vec<PathBuf> = (0..8)
        .map(|i| {
            let path = PathBuf::from(format!("scan{i}.pdf"));
            let pages = (0..6)
                .map(|p| match (i + p) % 4 {
                    0 => PageObservation::text(p, "发票"),
                    1 => PageObservation::text(p, "续页"),
                    2 => PageObservation::blank(p),
                    _ => PageObservation::text(p, "收据"),
                })
                .collect();
            source.insert(path.clone(), pages);
            path
        })
        .collect();

    let printer = Printer::default();
    let report = BatchRunner::new(&ruleset, &source, &printer)
        .with_config(BatchConfig::default().with_workers(4))
        .run(&documents);

    for line in printer.lines.lock().unwrap().iter() {
        println!("{line}");
    }
    println!("{} succeeded, {} failed", report.succeeded(), report.failed());
}
