use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

const BIN: &str = env!("CARGO_BIN_EXE_command-router");

/// Small registry definition used by most tests.
fn write_registry(dir: &Path) -> PathBuf {
    let yaml = r#"
version: "3"
commands:
  - name: search
    description: Search the index
    handler: search
    aliases: [find]
    args:
      - name: query
        kind: string
        position: 0
      - name: limit
        kind: number
        short: l
        default: 10
        max: 100
      - name: tag
        kind: { array: string }
        optional: true
  - name: remote
    description: Manage remotes
    subcommands:
      - name: add
        description: Add a remote
        handler: remote_add
        args:
          - name: name
            kind: string
            position: 0
"#;
    let path = dir.join("commands.yaml");
    fs::write(&path, yaml).expect("failed to write registry");
    path
}

fn run(args: &[&str]) -> Output {
    Command::new(BIN)
        .args(args)
        .output()
        .expect("failed to run command-router")
}

fn stdout_json(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

// ---------------------------------------------------------------------------
// tokenize
// ---------------------------------------------------------------------------

#[test]
fn tokenize_prints_json_tokens() {
    let output = run(&["tokenize", r#"search "hello world" --tag 'a b'"#]);
    assert!(output.status.success());
    assert_eq!(
        stdout_json(&output),
        serde_json::json!(["search", "hello world", "--tag", "a b"])
    );
}

#[test]
fn tokenize_unclosed_quote_prints_error_record() {
    let output = run(&["tokenize", "echo 'oops"]);
    assert!(!output.status.success());

    let record = stdout_json(&output);
    assert_eq!(record["code"], "PARSE_ERROR");
    assert!(String::from_utf8_lossy(&output.stderr).contains("error:"));
}

#[test]
fn tokenize_strict_rejects_metacharacters() {
    let literal = run(&["tokenize", "a;b"]);
    assert!(literal.status.success());
    assert_eq!(stdout_json(&literal), serde_json::json!(["a;b"]));

    let strict = run(&["tokenize", "--strict", "a;b"]);
    assert!(!strict.status.success());
    assert_eq!(stdout_json(&strict)["code"], "PARSE_ERROR");
}

// ---------------------------------------------------------------------------
// route / parse
// ---------------------------------------------------------------------------

#[test]
fn route_reports_path_and_remaining() {
    let dir = tempfile::tempdir().unwrap();
    let registry = write_registry(dir.path());

    let output = run(&[
        "route",
        "--registry",
        registry.to_str().unwrap(),
        "remote add origin --fetch",
    ]);
    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["path"], serde_json::json!(["remote", "add"]));
    assert_eq!(json["remaining"], serde_json::json!(["origin", "--fetch"]));
}

#[test]
fn parse_prints_invocation() {
    let dir = tempfile::tempdir().unwrap();
    let registry = write_registry(dir.path());

    let output = run(&[
        "parse",
        "--registry",
        registry.to_str().unwrap(),
        "find 'rust lang' -l 5 --tag a --tag b",
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let json = stdout_json(&output);
    assert_eq!(json["path"], serde_json::json!(["search"]));
    assert_eq!(json["handler"], "search");
    assert_eq!(json["args"]["query"], "rust lang");
    assert_eq!(json["args"]["limit"], 5.0);
    assert_eq!(json["args"]["tag"], serde_json::json!(["a", "b"]));
}

#[test]
fn parse_failures_print_error_records() {
    let dir = tempfile::tempdir().unwrap();
    let registry = write_registry(dir.path());
    let registry = registry.to_str().unwrap();

    let cases = [
        ("deploy now", "COMMAND_NOT_FOUND"),
        ("remote", "SUBCOMMAND_REQUIRED"),
        ("search rust --limit 500", "VALIDATION_ERROR"),
        ("search", "VALIDATION_ERROR"),
    ];
    for (input, code) in cases {
        let output = run(&["parse", "--registry", registry, input]);
        assert!(!output.status.success(), "{input} should fail");
        assert_eq!(stdout_json(&output)["code"], code, "input: {input}");
    }

    let output = run(&["parse", "--registry", registry, "search"]);
    let record = stdout_json(&output);
    assert_eq!(record["path"], "query");
    assert!(record["hint"].as_str().unwrap().contains("--query <value>"));
}

#[test]
fn parse_with_missing_registry_fails() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.yaml");

    let output = run(&["parse", "--registry", missing.to_str().unwrap(), "search x"]);
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to load"));
}

// ---------------------------------------------------------------------------
// list / check
// ---------------------------------------------------------------------------

#[test]
fn list_prints_every_node() {
    let dir = tempfile::tempdir().unwrap();
    let registry = write_registry(dir.path());

    let output = run(&["list", "--registry", registry.to_str().unwrap()]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(
        lines,
        vec![
            "search\tSearch the index",
            "remote\tManage remotes",
            "remote add\tAdd a remote",
        ]
    );
}

#[test]
fn check_prints_fingerprint() {
    let dir = tempfile::tempdir().unwrap();
    let registry = write_registry(dir.path());

    let output = run(&["check", "--registry", registry.to_str().unwrap()]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Validated 3 command(s)"));
    assert!(stdout.contains("version 3"));

    let fingerprint = stdout
        .lines()
        .find_map(|line| line.strip_prefix("fingerprint: "))
        .expect("fingerprint line");
    assert_eq!(fingerprint.len(), 64);
}

#[test]
fn check_rejects_invalid_definition() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.json");
    fs::write(
        &path,
        r#"{"commands": [{"name": "x", "description": "X"}, {"name": "x", "description": "Y"}]}"#,
    )
    .unwrap();

    let output = run(&["check", "--registry", path.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("duplicate command"));
}
