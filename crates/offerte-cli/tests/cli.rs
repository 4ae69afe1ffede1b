use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn offerte(config: &Path) -> Command {
    let mut cmd = Command::cargo_bin("offerte").unwrap();
    cmd.arg("--config").arg(config).env_remove("RUST_LOG");
    cmd
}

/// Temp dir with a config file pointing the store inside it.
fn workspace(extra: serde_json::Value) -> (TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let mut config = serde_json::json!({
        "store": { "path": dir.path().join("offerte.db") }
    });
    if let (Some(base), Some(extra)) = (config.as_object_mut(), extra.as_object()) {
        for (k, v) in extra {
            base.insert(k.clone(), v.clone());
        }
    }
    let config_path = dir.path().join("config.json");
    fs::write(&config_path, config.to_string()).unwrap();
    (dir, config_path)
}

fn created_id(output: &[u8]) -> String {
    String::from_utf8_lossy(output)
        .split_whitespace()
        .last()
        .unwrap()
        .to_string()
}

const DRAFT: &str = r#"{
  "projectDetails": { "clientName": "Jansen", "projectAddress": "Dam 1", "invoiceNumber": "2024-7" },
  "sections": [
    { "id": "0.00", "title": "Voorwaarden", "items": [] },
    { "id": "01.00", "title": "Sloopwerk", "items": [
      { "id": 1, "description": "Wand", "quantity": 2, "price": 100, "vatRate": 21 },
      { "id": 2, "description": "Afvoer", "quantity": 1, "price": 50, "vatRate": 9 }
    ]}
  ]
}"#;

#[test]
fn test_help_lists_commands() {
    Command::cargo_bin("offerte")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("invoice"))
        .stdout(predicate::str::contains("calc"));
}

#[test]
fn test_calc_items() {
    let (dir, config) = workspace(serde_json::json!({}));
    let input = dir.path().join("items.json");
    fs::write(
        &input,
        r#"[
            { "id": 1, "quantity": 2, "price": 100, "vatRate": 21 },
            { "id": 2, "quantity": 1, "price": 50, "vatRate": 9 }
        ]"#,
    )
    .unwrap();

    offerte(&config)
        .arg("calc")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("€ 250.00"))
        .stdout(predicate::str::contains("21%: € 42.00"))
        .stdout(predicate::str::contains("€ 296.50"));
}

#[test]
fn test_calc_draft_json() {
    let (dir, config) = workspace(serde_json::json!({}));
    let input = dir.path().join("draft.json");
    fs::write(&input, DRAFT).unwrap();

    offerte(&config)
        .args(["calc", "--json"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"grand\""))
        .stdout(predicate::str::contains("\"sectionId\": \"01.00\""));
}

#[test]
fn test_calc_missing_file() {
    let (dir, config) = workspace(serde_json::json!({}));

    offerte(&config)
        .arg("calc")
        .arg(dir.path().join("nope.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file not found"));
}

#[test]
fn test_invoice_lifecycle() {
    let (dir, config) = workspace(serde_json::json!({}));
    let input = dir.path().join("draft.json");
    fs::write(&input, DRAFT).unwrap();

    let output = offerte(&config)
        .args(["invoice", "new", "--from"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("Created invoice"))
        .get_output()
        .stdout
        .clone();
    let id = created_id(&output);

    offerte(&config)
        .args(["invoice", "list", "--format", "csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains(id.as_str()))
        .stdout(predicate::str::contains("Jansen"));

    offerte(&config)
        .args(["invoice", "show", id.as_str()])
        .assert()
        .success()
        .stdout(predicate::str::contains("€ 296.50"));

    offerte(&config)
        .args(["invoice", "render", id.as_str(), "--output"])
        .arg(dir.path())
        .assert()
        .success();

    let report = dir.path().join("dam-1-2024-7.html");
    let html = fs::read_to_string(&report).unwrap();
    assert!(html.contains("OFFERTE"));
    assert!(html.contains("VAT (21%):"));

    offerte(&config)
        .args(["invoice", "delete", id.as_str()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted invoice"));

    offerte(&config)
        .args(["invoice", "show", id.as_str()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_attach_oversized_image_warns() {
    let (dir, config) = workspace(serde_json::json!({
        "media": { "max_inline_image_bytes": 16 }
    }));
    let image = dir.path().join("tegel.png");
    fs::write(&image, [0u8; 64]).unwrap();

    let output = offerte(&config)
        .args(["invoice", "new", "--client", "Bakker"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let id = created_id(&output);

    offerte(&config)
        .args(["invoice", "attach-image", id.as_str()])
        .arg(&image)
        .args(["--header", "0"])
        .assert()
        .success()
        .stderr(predicate::str::contains("was not saved"));
}

#[test]
fn test_config_get_and_set() {
    let (_dir, config) = workspace(serde_json::json!({}));

    offerte(&config)
        .args(["config", "set", "server.port", "8080"])
        .assert()
        .success();

    offerte(&config)
        .args(["config", "get", "server.port"])
        .assert()
        .success()
        .stdout(predicate::str::contains("8080"));

    offerte(&config)
        .args(["config", "get", "server.nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration key not found"));
}
