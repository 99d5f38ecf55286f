//! Integration tests for notebook renumbering

use std::path::PathBuf;

use pretty_assertions::assert_eq;
use serde_json::Value;
use tagrefsort::notebook::CellSource;
use tagrefsort::{update_notebook, Notebook, RenumberError, RenumberOptions};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn scratch_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("tagrefsort-{}-{}", std::process::id(), name))
}

#[test]
fn test_fixture_is_renumbered() {
    let mut notebook = Notebook::read(fixture("sample.ipynb")).unwrap();
    let report = update_notebook(&mut notebook, RenumberOptions::default()).unwrap();

    assert_eq!(report.cells, 3);
    assert_eq!(report.tags_assigned, 3);
    assert!(report.is_clean());
    let pairs: Vec<_> = report
        .label_map
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    assert_eq!(pairs, vec![("energy", "1"), ("old", "3")]);

    assert_eq!(
        notebook.source(0).unwrap(),
        CellSource::Lines(vec![
            "# Energy\n".into(),
            "\n".into(),
            "$$ E = mc^2 \\tag{1} $$\n".into(),
        ])
    );
    assert_eq!(
        notebook.source(1).unwrap(),
        CellSource::Lines(vec!["x = 1".into()])
    );
    assert_eq!(
        notebook.source(2).unwrap().text(),
        "$$\n\\begin{align}\na &= b \\tag{2}\\\\\nc &= d \\tag{3}\n\\end{align}\n$$\n\nCombining $(1)$ with $(3)$ gives $x=y$."
    );
    assert_eq!(
        notebook.source(3).unwrap(),
        CellSource::Text("$$ f \\notag $$".into())
    );
}

#[test]
fn test_untouched_fields_survive_round_trip() {
    let mut notebook = Notebook::read(fixture("sample.ipynb")).unwrap();
    update_notebook(&mut notebook, RenumberOptions::default()).unwrap();

    let path = scratch_path("round-trip.ipynb");
    notebook.write(&path).unwrap();
    let written = std::fs::read_to_string(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert!(written.ends_with("}\n"));
    assert!(written.starts_with("{\n \"cells\": [\n  {\n"));

    let value: Value = serde_json::from_str(&written).unwrap();
    assert_eq!(value["nbformat"], 4);
    assert_eq!(value["nbformat_minor"], 5);
    assert_eq!(value["metadata"]["kernelspec"]["name"], "python3");
    assert_eq!(value["cells"][1]["outputs"], serde_json::json!([]));
    assert_eq!(value["cells"][1]["execution_count"], Value::Null);
}

#[test]
fn test_second_run_is_stable() {
    let mut notebook = Notebook::read(fixture("sample.ipynb")).unwrap();
    update_notebook(&mut notebook, RenumberOptions::default()).unwrap();
    let once = notebook.to_json_string().unwrap();

    let mut again = Notebook::from_json_str(&once).unwrap();
    let report = update_notebook(&mut again, RenumberOptions::default()).unwrap();
    assert_eq!(again.to_json_string().unwrap(), once);
    assert_eq!(report.tags_assigned, 3);
}

#[test]
fn test_start_number_and_no_refs() {
    let mut notebook = Notebook::read(fixture("sample.ipynb")).unwrap();
    let options = RenumberOptions {
        first_tag: 10,
        rewrite_refs: false,
        ..RenumberOptions::default()
    };
    let report = update_notebook(&mut notebook, options).unwrap();
    assert_eq!(report.tags_assigned, 3);
    assert_eq!(report.label_map.get("old").map(String::as_str), Some("12"));
    assert!(notebook
        .source(2)
        .unwrap()
        .text()
        .ends_with("Combining $(energy)$ with $(old)$ gives $x=y$."));
}

#[test]
fn test_missing_file_is_io_error() {
    let err = Notebook::read(fixture("does-not-exist.ipynb")).unwrap_err();
    assert!(matches!(err, RenumberError::IoError { .. }));
}
