use docsplit::RuleSetBuilder;

fn main() {
    let ruleset = RuleSetBuilder::new()
        .rule("Invoice", "contains('发票')")
        .rule("Tax", "percentage('税', 10)")
        .rule("Misconfigured", "similar('发票')")
        .rule("Garbled", "contains('发票' and")
        .compile()
        .expect("failed to compile ruleset");

    let report = ruleset.evaluate_detailed("增值税 发票 税额 税率");
    println!("{report}");

    for (name, outcome) in report.outcomes() {
        println!("  {name}: {outcome:?}");
    }
    for (name, outcome) in report.failures() {
        println!("  broken rule {name}: {outcome:?}");
    }
    println!("winner: {:?} in {:?}", report.winner(), report.duration());
}
