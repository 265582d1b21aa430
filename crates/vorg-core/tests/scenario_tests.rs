//! Rule evaluation scenarios against a real catalog database

use chrono::{Local, NaiveDate, TimeZone};
use pretty_assertions::assert_eq;
use vorg_core::{CatalogStore, EvalContext, Mapping, RecordSource, RuleSet, ViewEngine};
use vorg_fs::NormalizedPath;
use vorg_test_utils::{CatalogRow, TestCatalog};

fn local_noon(year: i32, month: u32, day: u32) -> f64 {
    let naive = NaiveDate::from_ymd_opt(year, month, day)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap();
    Local.from_local_datetime(&naive).single().unwrap().timestamp() as f64
}

fn generate(catalog: &TestCatalog, rules: &str, view: &str) -> Vec<Mapping> {
    let rules_path = catalog.write_rules(rules);
    let rules = RuleSet::load(&NormalizedPath::new(rules_path)).unwrap();
    let store = CatalogStore::open(&catalog.db_path()).unwrap();
    ViewEngine::new(&rules, &store)
        .with_context(EvalContext::at(local_noon(2024, 6, 1)))
        .generate_view(view)
        .unwrap()
}

mod concrete_scenarios {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn date_template_renders_year_and_month_name() {
        let catalog = TestCatalog::new();
        let source = catalog.add_file("a.pdf", "x");
        catalog.insert(&CatalogRow::new(&source).created(local_noon(2024, 3, 5)));

        let rules = r#"
views:
  ByDate:
    rules:
      - target: "{year}/{month_name}/{name}"
"#;
        let mappings = generate(&catalog, rules, "ByDate");
        assert_eq!(mappings.len(), 1);
        assert_eq!(mappings[0].target_path, "2024/March/a.pdf");
    }

    #[test]
    fn category_match_is_case_insensitive() {
        let catalog = TestCatalog::new();
        let source = catalog.add_file("r.pdf", "x");
        catalog.insert(&CatalogRow::new(&source).category("documents"));

        let rules = r#"
views:
  ByCategory:
    rules:
      - condition: { category: Documents }
        target: "Docs/{name}"
"#;
        let mappings = generate(&catalog, rules, "ByCategory");
        assert_eq!(mappings[0].target_path, "Docs/r.pdf");
    }

    #[test]
    fn size_threshold_selects_large_files() {
        let catalog = TestCatalog::new();
        let small = catalog.add_file("small.bin", "x");
        let large = catalog.add_file("large.bin", "x");
        catalog.insert(&CatalogRow::new(&small).size(50_000));
        catalog.insert(&CatalogRow::new(&large).size(200_000));

        let rules = r#"
views:
  BySize:
    rules:
      - condition: { size: ">= 102400" }
        target: "Large/{name}"
"#;
        let mappings = generate(&catalog, rules, "BySize");
        assert_eq!(mappings.len(), 1);
        assert_eq!(mappings[0].source_path, large.to_string_lossy());
    }
}

mod catalog_reading {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn extra_columns_and_nulls_are_available_to_rules() {
        let catalog = TestCatalog::new();
        let with_project = catalog.add_file("apollo/plan.txt", "x");
        let without = catalog.add_file("misc/note.txt", "x");
        catalog.insert(&CatalogRow::new(&with_project).project("Apollo"));
        catalog.insert(&CatalogRow::new(&without));

        let rules = r#"
views:
  ByProject:
    rules:
      - condition: { project: null }
        target: "Unassigned/{name}"
      - target: "{project}/{name}"
"#;
        let mappings = generate(&catalog, rules, "ByProject");
        let targets: Vec<_> = mappings.iter().map(|m| m.target_path.as_str()).collect();
        assert_eq!(targets, vec!["Apollo/plan.txt", "Unassigned/note.txt"]);
    }

    #[test]
    fn records_come_back_in_insertion_order() {
        let catalog = TestCatalog::new();
        for name in ["c.txt", "a.txt", "b.txt"] {
            let path = catalog.add_file(name, "x");
            catalog.insert(&CatalogRow::new(&path));
        }
        let store = CatalogStore::open(&catalog.db_path()).unwrap();
        let names: Vec<_> = store.records().unwrap().into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["c.txt", "a.txt", "b.txt"]);
        assert_eq!(store.record_count().unwrap(), 3);
    }

    #[test]
    fn recent_files_relative_to_now() {
        let catalog = TestCatalog::new();
        let recent = catalog.add_file("recent.txt", "x");
        let stale = catalog.add_file("stale.txt", "x");
        catalog.insert(&CatalogRow::new(&recent).modified(local_noon(2024, 5, 20)));
        catalog.insert(&CatalogRow::new(&stale).modified(local_noon(2023, 1, 1)));

        let rules = r#"
views:
  Recent:
    rules:
      - condition: { modified: ">= now - 30 days" }
        target: "{name}"
"#;
        let mappings = generate(&catalog, rules, "Recent");
        assert_eq!(mappings.len(), 1);
        assert_eq!(mappings[0].target_path, "recent.txt");
    }

    #[test]
    fn missing_catalog_is_reported() {
        let catalog = TestCatalog::new();
        let missing = catalog.root().join("nope.db");
        let err = CatalogStore::open(&missing).err().unwrap();
        assert!(matches!(err, vorg_core::Error::CatalogNotFound { .. }));
    }
}
