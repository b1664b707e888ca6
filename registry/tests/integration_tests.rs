use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use command_router_registry::{LoadError, RegistryDefinition, RegistryHandle};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const SEARCH_YAML: &str = r#"
version: "1"
commands:
  - name: search
    description: Search the index
    handler: search
    args:
      - name: query
        kind: string
        position: 0
      - name: limit
        kind: number
        short: l
        default: 10
"#;

const DEPLOY_YAML: &str = r#"
version: "2"
commands:
  - name: deploy
    description: Deploy a service
    handler: deploy
    args:
      - name: env
        kind: string
        choices: [staging, production]
"#;

fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    let mut f = std::fs::File::create(&path).unwrap();
    f.write_all(contents.as_bytes()).unwrap();
    f.flush().unwrap();
    path
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

#[test]
fn test_load_yaml_and_json_agree() {
    let dir = tempfile::tempdir().unwrap();
    let yaml_path = write_file(dir.path(), "commands.yaml", SEARCH_YAML);

    let from_yaml = RegistryDefinition::load(&yaml_path).unwrap();
    let json = serde_json::to_string_pretty(&from_yaml).unwrap();
    let json_path = write_file(dir.path(), "commands.json", &json);
    let from_json = RegistryDefinition::load(&json_path).unwrap();

    assert_eq!(from_yaml.commands, from_json.commands);
    assert_ne!(from_yaml.fingerprint(), from_json.fingerprint());

    let registry = from_json.into_registry().unwrap();
    let invocation = registry.resolve("search rust -l 3").unwrap();
    assert_eq!(invocation.args.get_number("limit"), Some(3.0));
}

#[test]
fn test_load_rejects_unknown_extension() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "commands.toml", SEARCH_YAML);

    let err = RegistryDefinition::load(&path).unwrap_err();
    assert!(matches!(err, LoadError::UnsupportedFormat(_)));
}

#[test]
fn test_load_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = RegistryDefinition::load(dir.path().join("absent.yaml")).unwrap_err();
    assert!(matches!(err, LoadError::IoError(_)));
}

#[test]
fn test_load_malformed_yaml() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "broken.yml", "commands: [\n");
    let err = RegistryDefinition::load(&path).unwrap_err();
    assert!(matches!(err, LoadError::YamlError(_)));
}

// ---------------------------------------------------------------------------
// Reloading
// ---------------------------------------------------------------------------

#[test]
fn test_reload_swaps_only_on_change() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "commands.yaml", SEARCH_YAML);

    let handle = RegistryHandle::load(&path).unwrap();
    let first = handle.fingerprint();
    assert!(first.is_some());
    assert!(!handle.reload_from(&path).unwrap());

    write_file(dir.path(), "commands.yaml", DEPLOY_YAML);
    assert!(handle.reload_from(&path).unwrap());
    assert_ne!(handle.fingerprint(), first);

    let invocation = handle.resolve("deploy --env staging").unwrap();
    assert_eq!(invocation.path, vec!["deploy"]);
    assert_eq!(handle.resolve("search x").unwrap_err().code(), "COMMAND_NOT_FOUND");
}

#[test]
fn test_failed_reload_keeps_previous_registry() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "commands.yaml", SEARCH_YAML);
    let handle = RegistryHandle::load(&path).unwrap();
    let before = handle.fingerprint();

    write_file(
        dir.path(),
        "commands.yaml",
        r#"
commands:
  - name: search
    description: Search
    args:
      - name: a
        kind: string
        position: 0
      - name: b
        kind: string
        position: 0
"#,
    );
    let err = handle.reload_from(&path).unwrap_err();
    assert!(matches!(err, LoadError::InvalidDefinition(_)));
    assert_eq!(handle.fingerprint(), before);
    assert!(handle.resolve("search rust").is_ok());
}

#[test]
fn test_snapshots_survive_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "commands.yaml", SEARCH_YAML);
    let handle = Arc::new(RegistryHandle::load(&path).unwrap());

    let snapshot = handle.snapshot();
    write_file(dir.path(), "commands.yaml", DEPLOY_YAML);
    assert!(handle.reload_from(&path).unwrap());

    assert!(snapshot.resolve("search rust").is_ok());
    assert!(handle.snapshot().resolve("search rust").is_err());

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let handle = Arc::clone(&handle);
            std::thread::spawn(move || handle.resolve("deploy --env production").is_ok())
        })
        .collect();
    for reader in readers {
        assert!(reader.join().unwrap());
    }
}
