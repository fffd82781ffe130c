//! End-to-end scenarios for the literal S1–S6 cases in the design notes:
//! one exported call, a cross-file reference, a caller inside a class, an
//! import cycle, a syntax error that doesn't blank the rest of the file, and
//! a watcher reindex.

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use codeintel::{ProjectIndex, SymbolKind};
use tempfile::TempDir;

fn write(dir: &std::path::Path, rel: &str, content: &str) {
    if let Some(parent) = std::path::Path::new(rel).parent() {
        fs::create_dir_all(dir.join(parent)).unwrap();
    }
    fs::write(dir.join(rel), content).unwrap();
}

#[test]
fn s1_single_file_exported_function_calling_console_log() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "greet.js",
        "export function greet(name) {\n    console.log(name);\n}\n",
    );

    let index = ProjectIndex::new(dir.path());
    let stats = index.index_project().unwrap();
    assert_eq!(stats.files_indexed, 1);
    assert!(stats.symbols_indexed >= 1);

    let results = index.search_symbols("greet", None, 10).unwrap();
    assert_eq!(results.results.len(), 1);
    assert_eq!(results.results[0].kind, SymbolKind::Function);

    let callees = index.get_callees(std::path::Path::new("greet.js"), "greet");
    assert!(callees.iter().any(|c| c.line_text.contains("log(")));
}

#[test]
fn s2_cross_file_reference_with_definition_sorted_first() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a.js", "export function helper() {\n    return 1;\n}\n");
    write(
        dir.path(),
        "b.js",
        "import { helper } from './a.js';\n\nfunction caller() {\n    helper();\n}\n",
    );

    let index = ProjectIndex::new(dir.path());
    index.index_project().unwrap();

    let refs = index.find_references("helper");
    assert_eq!(refs.len(), 2);
    assert!(refs[0].is_definition);
    assert!(!refs[1].is_definition);
}

#[test]
fn s3_class_method_caller_excludes_the_class_declaration() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "widget.js",
        "class Widget {\n    start() {\n        this.run();\n    }\n\n    run() {\n        return 1;\n    }\n\n    stop() {\n        return 0;\n    }\n}\n",
    );

    let index = ProjectIndex::new(dir.path());
    index.index_project().unwrap();

    let callers = index.get_callers("run");
    assert_eq!(callers.len(), 1);
    assert_eq!(callers[0].caller_qualified_name, "Widget::start");
}

#[test]
fn s4_mutual_import_reports_exactly_one_cycle() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a.js", "import './b.js';\nexport function fromA() {}\n");
    write(dir.path(), "b.js", "import './a.js';\nexport function fromB() {}\n");

    let index = ProjectIndex::new(dir.path());
    index.index_project().unwrap();

    let analysis = index.analyze_dependencies();
    assert_eq!(analysis.cycles.len(), 1);
    assert_eq!(analysis.cycles[0].files.len(), 2);
}

#[test]
fn s5_syntax_error_does_not_blank_the_rest_of_the_file() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "broken.rs",
        "fn before() {}\n\nfn broken( {\n\nfn after() {}\n",
    );

    let index = ProjectIndex::new(dir.path());
    index.index_project().unwrap();

    let tree = index.get_file_symbols(std::path::Path::new("broken.rs")).unwrap();
    assert!(!tree.errors.is_empty());
    let names: Vec<_> = tree.visible_symbols().map(|s| s.name.as_str()).collect();
    assert!(names.contains(&"before"));
}

#[test]
fn s6_watcher_reindexes_a_newly_created_file_within_one_debounce_window() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "existing.rs", "fn existing() {}\n");

    let index = Arc::new(ProjectIndex::new(dir.path()));
    index.index_project().unwrap();
    index.start_watching().unwrap();

    write(dir.path(), "fresh.rs", "fn freshly_added() {}\n");

    let mut found = false;
    for _ in 0..50 {
        std::thread::sleep(Duration::from_millis(100));
        let results = index.search_symbols("freshly_added", None, 10).unwrap();
        if !results.results.is_empty() {
            found = true;
            break;
        }
    }
    assert!(found, "expected freshly_added to be indexed after a debounce window");
    index.stop_watching();
}
