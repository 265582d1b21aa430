//! Cross-crate properties of the generate/link pipeline

use std::fs;

use vorg_core::{
    CatalogStore, EvalContext, LinkMaterializer, MemoryTransactionLog, RuleSet, ViewAggregator,
    ViewEngine,
};
use vorg_fs::NormalizedPath;
use vorg_test_utils::{CatalogRow, TestCatalog};

const RULES: &str = r#"
views:
  ByKind:
    rules:
      - condition: "size >= 1000"
        target: "Large/{category}/{name}"
      - condition: { category: "/doc/" }
        target: "Docs/{name}"
      - condition: {}
        target: "Other/{name}"
  Broken:
    rules:
      - condition: { name: "/[unclosed/" }
        target: "Never/{name}"
"#;

fn setup() -> (TestCatalog, RuleSet) {
    let catalog = TestCatalog::new();
    let big = catalog.add_file("big.iso", "x");
    let doc = catalog.add_file("doc.pdf", "x");
    let other = catalog.add_file("other.txt", "x");
    catalog.insert(&CatalogRow::new(&big).size(5000).category("Archives"));
    catalog.insert(&CatalogRow::new(&doc).size(10).category("Documents"));
    catalog.insert(&CatalogRow::new(&other).size(10));
    let rules_path = catalog.write_rules(RULES);
    let rules = RuleSet::load(&NormalizedPath::new(rules_path)).unwrap();
    (catalog, rules)
}

#[test]
fn generation_is_deterministic_across_store_handles() {
    let (catalog, rules) = setup();
    let ctx = EvalContext::at(1_700_000_000.0);

    let first = {
        let store = CatalogStore::open(&catalog.db_path()).unwrap();
        ViewAggregator::new(ViewEngine::new(&rules, &store).with_context(ctx)).generate_all_views()
    };
    let second = {
        let store = CatalogStore::open(&catalog.db_path()).unwrap();
        ViewAggregator::new(ViewEngine::new(&rules, &store).with_context(ctx)).generate_all_views()
    };
    assert_eq!(first, second);
}

#[test]
fn first_match_wins_and_each_record_maps_once() {
    let (catalog, rules) = setup();
    let store = CatalogStore::open(&catalog.db_path()).unwrap();
    let mappings = ViewEngine::new(&rules, &store).generate_view("ByKind").unwrap();

    let targets: Vec<_> = mappings.iter().map(|m| m.target_path.as_str()).collect();
    assert_eq!(targets, vec!["Large/Archives/big.iso", "Docs/doc.pdf", "Other/other.txt"]);
}

#[test]
fn invalid_pattern_only_disables_its_rule() {
    let (catalog, rules) = setup();
    let store = CatalogStore::open(&catalog.db_path()).unwrap();
    let all = ViewAggregator::new(ViewEngine::new(&rules, &store)).generate_all_views();

    assert!(all["Broken"].is_empty());
    assert_eq!(all["ByKind"].len(), 3);
}

#[test]
fn preview_report_summarizes_all_views() {
    let (catalog, rules) = setup();
    let store = CatalogStore::open(&catalog.db_path()).unwrap();
    let report = ViewAggregator::new(ViewEngine::new(&rules, &store)).preview();

    assert_eq!(report.total_links, 3);
    assert_eq!(report.unique_sources, 3);

    let path = NormalizedPath::new(catalog.root().join("report.txt"));
    report.write(&path).unwrap();
    let text = fs::read_to_string(path.to_native()).unwrap();
    assert!(text.contains("== Broken (0 files) =="));
}

#[test]
fn directory_and_file_sources_in_one_batch() {
    let (catalog, _) = setup();
    let project = catalog.add_dir("projects/apollo");
    fs::write(project.join("plan.txt"), "plan").unwrap();
    let file = catalog.library().join("doc.pdf");

    let mappings = vec![
        vorg_core::Mapping::new(project.to_string_lossy(), "Projects/apollo", "Mixed"),
        vorg_core::Mapping::new(file.to_string_lossy(), "Files/doc.pdf", "Mixed"),
    ];
    let mut log = MemoryTransactionLog::new();
    let report = LinkMaterializer::new(catalog.views_root(), &mut log)
        .create_links(&mappings, "Mixed", false)
        .unwrap();

    if cfg!(unix) {
        assert_eq!((report.created, report.errors), (2, 0));
        assert_eq!(
            fs::read_to_string(catalog.views_root().join("Mixed/Projects/apollo/plan.txt"))
                .unwrap(),
            "plan"
        );
    }
    assert_eq!(log.len(), 2);
}
