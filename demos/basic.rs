use docsplit::{PageObservation, RuleSet, classify_pages, group_pages};

fn main() {
    let ruleset = RuleSet::from_json(
        r#"{
            "Invoice": {"expression": "contains('发票')"},
            "VatInvoice": {"expression": "contains('发票') and contains('增值税')"},
            "Receipt": {"expression": "contains('收据') or similar('收款收据', 0.75)"}
        }"#,
    )
    .expect("failed to load rules");

    println!("{ruleset}");

    let pages = [
        PageObservation::text(0, "增值税专用发票 No. 0042"),
        PageObservation::text(1, "货物明细 续页"),
        PageObservation::blank(2),
        PageObservation::text(3, "收款收据"),
        PageObservation::text(4, "备注"),
    ];

    let classified = classify_pages(&ruleset, &pages);
    for page in &classified {
        println!("page {}: {}", page.index + 1, page.category);
    }
    for group in group_pages(&classified) {
        let pages: Vec<usize> = group.page_indices.iter().map(|i| i + 1).collect();
        println!("{} -> pages {pages:?}", group.category);
    }
}
