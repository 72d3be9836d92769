//! E2E workflow tests for `tk`: build, link, remove, and inspect a snapshot.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::path::Path;
use tempfile::TempDir;

fn tk_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("tk"));
    cmd.current_dir(dir);
    cmd.env("THICKET_LOG", "error");
    cmd.env("XDG_CONFIG_HOME", dir.join(".config"));
    cmd.env("HOME", dir);
    cmd.env_remove("FORMAT");
    cmd
}

fn tk_json(dir: &Path, args: &[&str]) -> Value {
    let output = tk_cmd(dir)
        .args(args)
        .arg("--json")
        .output()
        .expect("tk should not crash");
    assert!(
        output.status.success(),
        "tk {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("valid JSON")
}

fn init(dir: &Path) {
    tk_cmd(dir).arg("init").assert().success();
}

fn add(dir: &Path, name: &str, parent: Option<&str>) -> String {
    let mut args = vec!["add", name];
    if let Some(parent) = parent {
        args.extend(["--parent", parent]);
    }
    tk_json(dir, &args)["uid"]
        .as_str()
        .expect("uid must exist")
        .to_string()
}

fn uids(value: &Value) -> Vec<String> {
    value
        .as_array()
        .expect("array")
        .iter()
        .map(|r| r["uid"].as_str().expect("uid").to_string())
        .collect()
}

/// root → project → src → {main, lib}, with `lib` also under `project`.
fn fixture(dir: &Path) {
    init(dir);
    add(dir, "project", None);
    add(dir, "src", Some("project"));
    add(dir, "main", Some("src"));
    add(dir, "lib", Some("src"));
    tk_cmd(dir).args(["link", "lib", "project"]).assert().success();
}

#[test]
fn init_creates_snapshot_and_refuses_to_overwrite() {
    let dir = TempDir::new().expect("tempdir");
    init(dir.path());
    assert!(dir.path().join("thicket.json").exists());

    tk_cmd(dir.path())
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));
    tk_cmd(dir.path()).args(["init", "--force"]).assert().success();
}

#[test]
fn commands_without_snapshot_suggest_init() {
    let dir = TempDir::new().expect("tempdir");
    tk_cmd(dir.path())
        .arg("tree")
        .assert()
        .failure()
        .stderr(predicate::str::contains("tk init"));
}

#[test]
fn tree_shows_shared_record_under_both_parents() {
    let dir = TempDir::new().expect("tempdir");
    fixture(dir.path());

    tk_cmd(dir.path())
        .args(["tree", "project"])
        .assert()
        .success()
        .stdout("project\n├── src\n│   ├── main\n│   └── lib *\n└── lib *\n");

    let parents = tk_json(dir.path(), &["parents", "lib"]);
    assert_eq!(uids(&parents), vec!["src", "project"]);
}

#[test]
fn colliding_names_get_distinct_uids() {
    let dir = TempDir::new().expect("tempdir");
    tk_cmd(dir.path())
        .args(["init", "--disambiguate", "type"])
        .assert()
        .success();

    let first = tk_json(dir.path(), &["add", "log", "--field", "type=object"]);
    let second = tk_json(dir.path(), &["add", "log", "--field", "type=function"]);
    let third = tk_json(dir.path(), &["add", "log", "--field", "type=function"]);

    assert_eq!(first["uid"], "log");
    assert_eq!(second["uid"], "log_function");
    assert_eq!(third["uid"], "log_1");
    assert_eq!(second["fields"]["type"], "function");
}

#[test]
fn requested_uid_is_kept_when_free() {
    let dir = TempDir::new().expect("tempdir");
    init(dir.path());
    let added = tk_json(dir.path(), &["add", "Main Menu", "--uid", "menu"]);
    assert_eq!(added["uid"], "menu");
    let generated = tk_json(dir.path(), &["add", "Main Menu", "--uid", "menu"]);
    assert_eq!(generated["uid"], "Main_Menu");
}

#[test]
fn rm_cascades_through_children() {
    let dir = TempDir::new().expect("tempdir");
    fixture(dir.path());

    let out = tk_json(dir.path(), &["rm", "src"]);
    assert_eq!(out["removed"], serde_json::json!(["main", "lib", "src"]));

    let children = tk_json(dir.path(), &["children", "project"]);
    assert!(uids(&children).is_empty());
}

#[test]
fn rm_promote_relinks_children_to_grandparents() {
    let dir = TempDir::new().expect("tempdir");
    fixture(dir.path());

    let out = tk_json(dir.path(), &["rm", "src", "--promote"]);
    assert_eq!(out["removed"], serde_json::json!(["src"]));

    let children = tk_json(dir.path(), &["children", "project"]);
    assert_eq!(uids(&children), vec!["lib", "main"]);
    let lib = tk_json(dir.path(), &["show", "lib"]);
    assert_eq!(lib["parents"], serde_json::json!(["project"]));
}

#[test]
fn unresolvable_link_is_a_reported_no_op() {
    let dir = TempDir::new().expect("tempdir");
    fixture(dir.path());

    let out = tk_json(dir.path(), &["link", "main", "ghost"]);
    assert_eq!(out["changed"], false);
    assert_eq!(out["parents"], serde_json::json!(["src"]));

    tk_cmd(dir.path())
        .args(["--format", "pretty", "unlink", "ghost", "src"])
        .assert()
        .success()
        .stdout(predicate::str::contains("nothing changed"));
}

#[test]
fn relinking_an_existing_parent_changes_nothing() {
    let dir = TempDir::new().expect("tempdir");
    fixture(dir.path());
    let snapshot = dir.path().join("thicket.json");
    let before = std::fs::read_to_string(&snapshot).expect("read");

    let out = tk_json(dir.path(), &["link", "lib", "project"]);
    assert_eq!(out["resolved"], true);
    assert_eq!(out["changed"], false);
    assert_eq!(out["parents"], serde_json::json!(["src", "project"]));
    assert_eq!(std::fs::read_to_string(&snapshot).expect("read"), before);

    tk_cmd(dir.path())
        .args(["--format", "pretty", "link", "lib", "src"])
        .assert()
        .success()
        .stdout(predicate::str::contains("nothing changed: lib already linked under src"));
}

#[test]
fn link_with_clear_moves_record() {
    let dir = TempDir::new().expect("tempdir");
    fixture(dir.path());

    let out = tk_json(dir.path(), &["link", "lib", "main", "--clear"]);
    assert_eq!(out["changed"], true);
    assert_eq!(out["parents"], serde_json::json!(["main"]));

    let src = tk_json(dir.path(), &["children", "src"]);
    assert_eq!(uids(&src), vec!["main"]);
}

#[test]
fn show_unknown_record_fails_with_code() {
    let dir = TempDir::new().expect("tempdir");
    init(dir.path());
    tk_cmd(dir.path())
        .args(["show", "ghost"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error[E2002]"));
}

#[test]
fn add_under_unknown_parent_fails_without_writing() {
    let dir = TempDir::new().expect("tempdir");
    init(dir.path());
    tk_cmd(dir.path())
        .args(["add", "orphan", "--parent", "ghost"])
        .assert()
        .failure();

    let all = tk_json(dir.path(), &["find", "name=orphan"]);
    assert!(uids(&all).is_empty());
}

#[test]
fn schema_named_field_is_refused_and_snapshot_stays_loadable() {
    let dir = TempDir::new().expect("tempdir");
    init(dir.path());
    add(dir.path(), "a", None);

    for key in ["name", "uid", "children", "parents"] {
        tk_cmd(dir.path())
            .args(["add", "b", "--field", &format!("{key}=x")])
            .assert()
            .failure()
            .stderr(predicate::str::contains("error[E2001]"));
    }

    tk_cmd(dir.path()).arg("check").assert().success();
    let all = tk_json(dir.path(), &["children", "root"]);
    assert_eq!(uids(&all), vec!["a"]);
}

#[test]
fn find_matches_payload_fields() {
    let dir = TempDir::new().expect("tempdir");
    init(dir.path());
    tk_json(dir.path(), &["add", "a", "-f", "kind=file"]);
    tk_json(dir.path(), &["add", "b", "-f", "kind=dir"]);
    tk_json(dir.path(), &["add", "c", "-f", "kind=file"]);

    let found = tk_json(dir.path(), &["find", "kind=file"]);
    assert_eq!(uids(&found), vec!["a", "c"]);
}

#[test]
fn check_passes_on_a_clean_snapshot() {
    let dir = TempDir::new().expect("tempdir");
    fixture(dir.path());
    let out = tk_json(dir.path(), &["check"]);
    assert_eq!(out["ok"], true);
    assert_eq!(out["records"], 4);
}

#[test]
fn check_reports_broken_links() {
    let dir = TempDir::new().expect("tempdir");
    let snapshot = serde_json::json!({
        "version": 1,
        "root": ["a"],
        "records": [
            {"name": "a", "uid": "a", "parents": ["root"], "children": ["ghost"]},
        ],
    });
    std::fs::write(dir.path().join("thicket.json"), snapshot.to_string()).expect("write");

    tk_cmd(dir.path())
        .arg("check")
        .assert()
        .failure()
        .stdout(predicate::str::contains("'a' lists missing child 'ghost'"))
        .stderr(predicate::str::contains("error[E3004]"));
}

#[test]
fn project_config_sets_disambiguation() {
    let dir = TempDir::new().expect("tempdir");
    std::fs::write(
        dir.path().join("thicket.toml"),
        "[store]\ndisambiguate = [\"lang\"]\n",
    )
    .expect("write config");
    init(dir.path());

    tk_json(dir.path(), &["add", "util", "-f", "lang=rust"]);
    let second = tk_json(dir.path(), &["add", "util", "-f", "lang=go"]);
    assert_eq!(second["uid"], "util_go");
}

#[test]
fn malformed_project_config_is_reported() {
    let dir = TempDir::new().expect("tempdir");
    std::fs::write(dir.path().join("thicket.toml"), "[store\n").expect("write config");
    tk_cmd(dir.path())
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error[E1001]"));
}

#[test]
fn file_flag_selects_snapshot() {
    let dir = TempDir::new().expect("tempdir");
    let nested = dir.path().join("nested");
    std::fs::create_dir(&nested).expect("mkdir");
    let file = nested.join("store.json");
    let file = file.to_str().expect("utf8 path");

    tk_cmd(dir.path())
        .args(["--file", file, "init"])
        .assert()
        .success();
    tk_cmd(dir.path())
        .args(["--file", file, "add", "x"])
        .assert()
        .success()
        .stdout("x\n");
    assert!(!dir.path().join("thicket.json").exists());
}

#[test]
fn verbose_flag_emits_debug_logs() {
    let dir = TempDir::new().expect("tempdir");
    init(dir.path());

    tk_cmd(dir.path())
        .env_remove("THICKET_LOG")
        .env_remove("DEBUG")
        .args(["add", "a"])
        .assert()
        .success()
        .stderr(predicate::str::contains("record added").not());

    tk_cmd(dir.path())
        .env_remove("THICKET_LOG")
        .env_remove("DEBUG")
        .args(["add", "b", "--verbose"])
        .assert()
        .success()
        .stderr(predicate::str::contains("record added"));
}

#[test]
fn completions_generate_for_bash() {
    let dir = TempDir::new().expect("tempdir");
    tk_cmd(dir.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("tk"));
}
