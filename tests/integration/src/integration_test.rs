//! End-to-end integration test for the organizer
//!
//! Exercises the complete flow: rules file -> catalog -> mappings file ->
//! links -> transaction log -> rollback.

use std::fs;

use rusqlite::Connection;
use vorg_core::{
    CatalogStore, LinkMaterializer, Operation, RollbackManager, RuleSet, SqliteTransactionLog,
    TransactionLog, ViewEngine, load_mappings, save_mappings,
};
use vorg_fs::{NormalizedPath, ViewsLock};
use vorg_test_utils::{CatalogRow, TestCatalog};

const JSON_RULES: &str = r#"{
  "views": {
    "ByProject": {
      "rules": [
        { "condition": { "project": "*" , "category": ["Documents", "Images"] },
          "target": "{project}/{category}/{name}" },
        { "condition": { "any_of": [ { "name": "/readme/" }, { "extension": ".md" } ] },
          "target": "Docs/{name}" }
      ]
    }
  }
}"#;

fn populated() -> TestCatalog {
    let catalog = TestCatalog::new();
    for (file, category, project) in [
        ("apollo/plan.pdf", "Documents", Some("Apollo")),
        ("apollo/logo.png", "Images", Some("Apollo")),
        ("gemini/notes.md", "Text", Some("Gemini")),
        ("README.txt", "Text", None),
        ("misc/data.bin", "Binary", None),
    ] {
        let path = catalog.add_file(file, file);
        let mut row = CatalogRow::new(&path).category(category);
        if let Some(project) = project {
            row = row.project(project);
        }
        catalog.insert(&row);
    }
    catalog
}

#[test]
fn json_rules_through_mapping_file_to_links() {
    let catalog = populated();
    let rules_path = catalog.root().join("views.json");
    fs::write(&rules_path, JSON_RULES).unwrap();

    let rules = RuleSet::load(&NormalizedPath::new(&rules_path)).unwrap();
    let store = CatalogStore::open(&catalog.db_path()).unwrap();
    let mappings = ViewEngine::new(&rules, &store).generate_view("ByProject").unwrap();

    let targets: Vec<_> = mappings.iter().map(|m| m.target_path.as_str()).collect();
    assert_eq!(
        targets,
        vec![
            "Apollo/Documents/plan.pdf",
            "Apollo/Images/logo.png",
            "Docs/notes.md",
            "Docs/README.txt",
        ]
    );

    let mapping_file = NormalizedPath::new(catalog.root().join("mappings.json"));
    save_mappings(&mapping_file, &mappings).unwrap();
    let reloaded = load_mappings(&mapping_file).unwrap();
    assert_eq!(reloaded, mappings);

    let mut log = SqliteTransactionLog::open(&catalog.db_path()).unwrap();
    let report = LinkMaterializer::new(catalog.views_root(), &mut log)
        .create_links(&reloaded, "ByProject", false)
        .unwrap();
    assert_eq!((report.created, report.errors), (4, 0));
    assert_eq!(
        fs::read_to_string(catalog.views_root().join("ByProject/Docs/notes.md")).unwrap(),
        "gemini/notes.md"
    );

    let rollback = RollbackManager::new(catalog.views_root(), &mut log)
        .rollback_view("ByProject")
        .unwrap();
    assert_eq!(rollback.deleted, 4);
    assert_eq!(
        log.query("ByProject", Some(Operation::Rollback)).unwrap().len(),
        1
    );
    assert!(catalog.library().join("apollo/plan.pdf").exists());
}

#[cfg(unix)]
#[test]
fn links_logged_by_older_versions_can_be_rolled_back() {
    let catalog = populated();
    let views = catalog.views_root();
    let link = views.join("Legacy/Docs/plan.pdf");
    fs::create_dir_all(link.parent().unwrap()).unwrap();
    std::os::unix::fs::symlink(catalog.library().join("apollo/plan.pdf"), &link).unwrap();

    {
        let conn = Connection::open(catalog.db_path()).unwrap();
        conn.execute_batch(
            "CREATE TABLE link_transactions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp TEXT NOT NULL,
                operation TEXT NOT NULL,
                view_name TEXT NOT NULL,
                source_path TEXT NOT NULL,
                link_path TEXT NOT NULL,
                success INTEGER DEFAULT 0,
                error TEXT
            )",
        )
        .unwrap();
        conn.execute(
            "INSERT INTO link_transactions
                (timestamp, operation, view_name, source_path, link_path, success, error)
             VALUES ('2024-03-15T12:00:00.000001', 'create', 'Legacy', ?1, ?2, 1, NULL)",
            rusqlite::params![
                catalog.library().join("apollo/plan.pdf").to_string_lossy().into_owned(),
                link.to_string_lossy().into_owned()
            ],
        )
        .unwrap();
    }

    let mut log = SqliteTransactionLog::open(&catalog.db_path()).unwrap();
    let report = RollbackManager::new(&views, &mut log)
        .rollback_view("Legacy")
        .unwrap();

    assert_eq!(report.deleted, 1);
    assert!(!views.join("Legacy").exists());
    assert_eq!(catalog.transaction_count(), 2);
}

#[test]
fn second_materializer_is_locked_out() {
    let catalog = populated();
    let first = ViewsLock::acquire(&catalog.views_root()).unwrap();
    assert!(ViewsLock::acquire(&catalog.views_root()).is_err());
    drop(first);
    assert!(ViewsLock::acquire(&catalog.views_root()).is_ok());
}
