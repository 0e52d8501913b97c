use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};
use std::path::Path;
use tempfile::TempDir;

fn bulkops(dataset: &Path) -> Command {
    let mut cmd = Command::cargo_bin("bulkops").unwrap();
    cmd.env("NO_COLOR", "1")
        .env_remove("BULKOPS_HOME")
        .env_remove("RUST_LOG")
        .arg("--dataset")
        .arg(dataset);
    cmd
}

fn seeded() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let docs = json!([
        {"_id": "post-1", "_type": "post", "title": "Rust in production", "status": "draft"},
        {"_id": "post-2", "_type": "post", "title": "Writing parsers", "status": "draft"},
        {"_id": "post-3", "_type": "post", "title": "Rust tooling", "status": "draft"},
        {"_id": "author-1", "_type": "author", "name": "Ada"}
    ]);
    std::fs::write(
        dir.path().join("dataset.json"),
        serde_json::to_string_pretty(&docs).unwrap(),
    )
    .unwrap();
    dir
}

fn dataset(dir: &Path) -> Vec<Value> {
    let raw = std::fs::read_to_string(dir.join("dataset.json")).unwrap();
    serde_json::from_str(&raw).unwrap()
}

fn doc<'a>(docs: &'a [Value], id: &str) -> &'a Value {
    docs.iter().find(|d| d["_id"] == id).unwrap()
}

#[test]
fn init_creates_dataset_and_config() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("store");

    bulkops(&root)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized dataset"));

    assert!(root.join("dataset.json").exists());
    assert!(root.join("config.json").exists());

    bulkops(&root)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already initialized"));
}

#[test]
fn search_by_type_and_text() {
    let dir = seeded();

    bulkops(dir.path())
        .args(["search", "-t", "post", "-s", "rust"])
        .assert()
        .success()
        .stdout(predicate::str::contains("post-1"))
        .stdout(predicate::str::contains("post-3"))
        .stdout(predicate::str::contains("post-2").not())
        .stdout(predicate::str::contains("Found 2 documents"));
}

#[test]
fn search_with_raw_query() {
    let dir = seeded();

    bulkops(dir.path())
        .args(["search", "-q", "*[_type == \"author\"]"])
        .assert()
        .success()
        .stdout(predicate::str::contains("author-1"))
        .stdout(predicate::str::contains("Found 1 documents"));
}

#[test]
fn malformed_query_fails_with_search_error() {
    let dir = seeded();

    bulkops(dir.path())
        .args(["search", "-q", "*[_type == "])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Search error"));
}

#[test]
fn oversized_slice_in_raw_query_is_a_search_error() {
    let dir = seeded();

    bulkops(dir.path())
        .args(["search", "-q", "*[defined(_id)][0..99999999999999999999]"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Search error"));
}

#[test]
fn modify_sets_field_on_every_match() {
    let dir = seeded();

    bulkops(dir.path())
        .args(["modify", "-t", "post", "--field", "status", "--value", "published"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Processing bulk modifications..."))
        .stdout(predicate::str::contains(
            "Bulk modification complete: 3 documents processed",
        ));

    let docs = dataset(dir.path());
    for id in ["post-1", "post-2", "post-3"] {
        assert_eq!(doc(&docs, id)["status"], "published");
    }
    assert!(doc(&docs, "author-1").get("status").is_none());
}

#[test]
fn dry_run_leaves_dataset_untouched() {
    let dir = seeded();
    let before = std::fs::read_to_string(dir.path().join("dataset.json")).unwrap();

    bulkops(dir.path())
        .args([
            "--dry-run", "modify", "-t", "post", "--field", "status", "--value", "published",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Would modify 3/3 documents..."))
        .stdout(predicate::str::contains(
            "Dry run complete: 3 documents processed",
        ));

    let after = std::fs::read_to_string(dir.path().join("dataset.json")).unwrap();
    assert_eq!(before, after);
}

#[test]
fn modify_reports_json_outcome() {
    let dir = seeded();

    let output = bulkops(dir.path())
        .args([
            "--json",
            "modify",
            "-q",
            "*[_type == \"post\"][0...2]",
            "--field",
            "priority",
            "--value",
            "5",
            "--json-value",
        ])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let outcome: Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(outcome["operation"], "modify");
    assert_eq!(outcome["processed"], 2);
    assert_eq!(outcome["errors"], json!([]));

    let docs = dataset(dir.path());
    assert_eq!(doc(&docs, "post-1")["priority"], 5);
    assert!(doc(&docs, "post-3").get("priority").is_none());
}

#[test]
fn small_batches_report_each_checkpoint() {
    let dir = seeded();

    bulkops(dir.path())
        .args([
            "--batch-size", "2", "modify", "-t", "post", "--field", "status", "--value", "x",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Modified 2/3 documents..."))
        .stdout(predicate::str::contains("Modified 3/3 documents..."));
}

#[test]
fn zero_batch_size_is_rejected() {
    let dir = seeded();

    bulkops(dir.path())
        .args(["--batch-size", "0", "search"])
        .assert()
        .failure();
}

#[test]
fn create_from_inline_template() {
    let dir = seeded();

    bulkops(dir.path())
        .args([
            "create",
            "-t",
            "post",
            "--template",
            r#"[{"title": "First"}, {"title": "Second"}]"#,
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Creating documents..."))
        .stdout(predicate::str::contains(
            "Bulk creation complete: 2 documents processed",
        ));

    let docs = dataset(dir.path());
    assert_eq!(docs.len(), 6);
    let created: Vec<&Value> = docs.iter().filter(|d| d["title"] == "First").collect();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0]["_type"], "post");
    assert!(created[0]["_id"].as_str().is_some_and(|id| !id.is_empty()));
}

#[test]
fn create_reads_template_from_file_and_stdin() {
    let dir = seeded();
    let template = dir.path().join("template.json");
    std::fs::write(&template, r#"{"name": "Grace"}"#).unwrap();

    bulkops(dir.path())
        .args(["create", "-t", "author", "--file"])
        .arg(&template)
        .assert()
        .success();

    bulkops(dir.path())
        .args(["create", "-t", "author"])
        .write_stdin(r#"{"name": "Linus"}"#)
        .assert()
        .success();

    let docs = dataset(dir.path());
    let authors: Vec<&Value> = docs.iter().filter(|d| d["_type"] == "author").collect();
    assert_eq!(authors.len(), 3);
}

#[test]
fn malformed_template_fails_without_writing() {
    let dir = seeded();
    let before = std::fs::read_to_string(dir.path().join("dataset.json")).unwrap();

    bulkops(dir.path())
        .args(["create", "-t", "post", "--template", "{not json"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Operation error"));

    let after = std::fs::read_to_string(dir.path().join("dataset.json")).unwrap();
    assert_eq!(before, after);
}

#[test]
fn config_set_and_show() {
    let dir = tempfile::tempdir().unwrap();

    bulkops(dir.path())
        .args(["config", "batch-size", "25"])
        .assert()
        .success()
        .stdout(predicate::str::contains("batch-size set to 25"));

    bulkops(dir.path())
        .args(["config", "batch-size"])
        .assert()
        .success()
        .stdout(predicate::str::contains("batch-size = 25"));

    bulkops(dir.path())
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("max-documents = 1000"));

    bulkops(dir.path())
        .args(["config", "batch-size", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Config error"));
}

#[test]
fn configured_document_types_restrict_search() {
    let dir = seeded();

    bulkops(dir.path())
        .args(["config", "document-types", "post"])
        .assert()
        .success();

    bulkops(dir.path())
        .args(["search", "-t", "author"])
        .assert()
        .failure();

    bulkops(dir.path())
        .args(["search", "-t", "post"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Found 3 documents"));
}
