use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

const PAGE: &str = r#"{
  "elements": [
    {
      "tag": "main", "id": "app",
      "attributes": { "data-source-file": "/src/App.tsx", "data-source-line": "4" },
      "children": [
        { "tag": "button", "id": "save",
          "attributes": { "data-source-file": "src/components/Button.tsx", "data-source-line": "12" } },
        { "tag": "button", "id": "cancel",
          "attributes": { "data-source-file": "src/components/Button.tsx", "data-source-line": "3" } },
        { "tag": "input", "id": "name" }
      ]
    }
  ],
  "inert_markup": ["<div data-source-line='2' data-source-file='vendor/Lazy.tsx'></div>"]
}"#;

#[allow(deprecated)]
fn lens() -> Command {
    Command::cargo_bin("lens").expect("binary")
}

fn setup_project() -> tempfile::TempDir {
    let temp = tempdir().unwrap();
    let root = temp.path();
    fs::write(root.join("page.json"), PAGE).unwrap();
    fs::create_dir_all(root.join("src/components")).unwrap();
    fs::write(root.join("src/App.tsx"), "import Button from './components/Button';\n").unwrap();
    let button: String = (1..=20)
        .map(|n| if n == 12 { "  onSave();\n".to_string() } else { format!("// {n}\n") })
        .collect();
    fs::write(root.join("src/components/Button.tsx"), button).unwrap();
    temp
}

fn json_stdout(cmd: &mut Command) -> Value {
    let output = cmd.output().expect("command run");
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("valid json")
}

fn replay(root: &Path, script: &str) -> Value {
    fs::write(root.join("script.txt"), script).unwrap();
    json_stdout(
        lens()
            .current_dir(root)
            .args(["replay", "page.json", "script.txt", "--json"]),
    )
}

#[test]
fn scan_prints_tree_with_raw_only_files() {
    let temp = setup_project();
    lens()
        .current_dir(temp.path())
        .args(["scan", "page.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("src/"))
        .stdout(predicate::str::contains("Button.tsx  [3, 12]"))
        .stdout(predicate::str::contains("Lazy.tsx  [2]"))
        .stdout(predicate::str::contains("3 files, 4 locations (1 raw-only)"));
}

#[test]
fn scan_json_applies_path_filters() {
    let temp = setup_project();
    let body = json_stdout(
        lens()
            .current_dir(temp.path())
            .args(["scan", "page.json", "--json", "--exclude", "vendor"]),
    );
    let files = body["files"].as_object().expect("files");
    assert_eq!(files.len(), 2);
    assert_eq!(body["files"]["src/components/Button.tsx"], serde_json::json!([3, 12]));
    assert_eq!(body["tree"]["kind"], "directory");
}

#[test]
fn scan_of_unannotated_page_reports_no_files() {
    let temp = tempdir().unwrap();
    fs::write(temp.path().join("empty.json"), r#"{"elements":[{"tag":"p"}]}"#).unwrap();
    lens()
        .current_dir(temp.path())
        .args(["scan", "empty.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No annotated source files found."));
}

#[test]
fn search_wraps_around() {
    let temp = tempdir().unwrap();
    let text: String = (1..=12)
        .map(|n| match n {
            3 => "foo foo\n".to_string(),
            7 | 10 => "foo\n".to_string(),
            _ => "-\n".to_string(),
        })
        .collect();
    fs::write(temp.path().join("a.txt"), text).unwrap();

    let body = json_stdout(lens().current_dir(temp.path()).args([
        "search", "a.txt", "--term", "FOO", "--click", "10", "--next", "1", "--json",
    ]));
    assert_eq!(body["total"], 4);
    assert_eq!(body["active"]["line"], 3);
    assert_eq!(body["counter"], "1/4");

    lens()
        .current_dir(temp.path())
        .args(["search", "a.txt", "--term", "foo", "--click", "3", "--previous", "1"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("4/4 10:1"));
}

#[test]
fn replay_locks_an_element_and_loads_its_source() {
    let temp = setup_project();
    let body = replay(temp.path(), "hover save\nkey l\nsearch onsave\n");
    assert_eq!(body["lock"], "element save");
    assert_eq!(body["highlights"]["locked"], serde_json::json!(["save"]));
    assert_eq!(body["highlights"]["hover"], serde_json::json!([]));
    assert_eq!(body["displayed"]["path"], "src/components/Button.tsx");
    assert_eq!(body["displayed"]["focus_line"], 12);
    assert_eq!(body["panel"]["status"], "showing");
    assert_eq!(body["search_counter"], "1/1");
}

#[test]
fn replay_file_lock_marks_every_element_of_the_file() {
    let temp = setup_project();
    let body = replay(temp.path(), "select /src/components/Button.tsx\n");
    assert_eq!(body["lock"], "file src/components/Button.tsx");
    assert_eq!(
        body["highlights"]["file_match"],
        serde_json::json!(["save", "cancel"])
    );
    assert_eq!(body["displayed"]["focus_line"], 3);
}

#[test]
fn replay_disable_clears_state() {
    let temp = setup_project();
    let body = replay(temp.path(), "hover save\nkey l\ndisable\n");
    assert_eq!(body["enabled"], false);
    assert_eq!(body["lock"], "idle");
    assert_eq!(body["files"], 0);
    assert_eq!(body["displayed"], Value::Null);
    assert_eq!(body["highlights"]["locked"], serde_json::json!([]));
}

#[test]
fn replay_missing_source_is_reported_inline() {
    let temp = setup_project();
    let body = replay(temp.path(), "select vendor/Lazy.tsx\n");
    assert_eq!(body["panel"]["status"], "load_failed");
    assert_eq!(body["panel"]["path"], "vendor/Lazy.tsx");
}

#[test]
fn replay_lock_key_is_ignored_while_typing() {
    let temp = setup_project();
    let body = replay(temp.path(), "hover save\nfocus name\nkey l\n");
    assert_eq!(body["lock"], "idle");
    assert_eq!(body["hovered"], "save");
}

#[test]
fn config_changes_the_attribute_names() {
    let temp = tempdir().unwrap();
    fs::write(
        temp.path().join("page.json"),
        r#"{"elements":[{"attributes":{"data-f":"x/y.rs","data-l":"9"}}]}"#,
    )
    .unwrap();
    fs::write(
        temp.path().join("lens.toml"),
        "file_attribute = \"data-f\"\nline_attribute = \"data-l\"\n",
    )
    .unwrap();

    lens()
        .current_dir(temp.path())
        .args(["scan", "page.json", "--config", "lens.toml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("y.rs  [9]"));
}

#[test]
fn invalid_script_fails_with_line_number() {
    let temp = setup_project();
    fs::write(temp.path().join("bad.txt"), "hover save\njump\n").unwrap();
    lens()
        .current_dir(temp.path())
        .args(["replay", "page.json", "bad.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("script line 2"));
}

#[test]
fn blank_filter_prefixes_keep_every_file() {
    let temp = setup_project();
    let body = json_stdout(lens().current_dir(temp.path()).args([
        "scan", "page.json", "--json", "--include", "./", "--exclude", "/",
    ]));
    assert_eq!(body["files"].as_object().expect("files").len(), 3);
}
