// CLI integration tests for the table-document streaming flows.
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use serde_json::Value;

const WIDGETS: &str = r#"{
  "columns": [
    {"name": "widget_id", "type": "VARCHAR"},
    {"name": "name", "type": "VARCHAR"},
    {"name": "data_json", "type": "BLOB"}
  ],
  "rows": [
    ["abc123", "First One", "{\"description\":\"This is abc123, the first one.\"}"],
    ["def456", "Next One", ""]
  ]
}"#;

fn cmd() -> Command {
    let exe = env!("CARGO_BIN_EXE_sqljson");
    Command::new(exe)
}

fn parse_json(value: &[u8]) -> Value {
    serde_json::from_slice(value).expect("valid json")
}

fn write_fixture(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).expect("write fixture");
    path
}

#[test]
fn array_mode_streams_valid_json() {
    let temp = tempfile::tempdir().expect("tempdir");
    let input = write_fixture(&temp, "widgets.json", WIDGETS);

    let out = cmd()
        .arg(input.to_str().unwrap())
        .output()
        .expect("run");
    assert!(out.status.success());
    let text = std::str::from_utf8(&out.stdout).expect("utf8");
    assert!(text.starts_with("[\n{"));
    assert!(text.ends_with("}\n]\n"));

    let rows = parse_json(&out.stdout);
    let rows = rows.as_array().expect("array");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["widget_id"], "abc123");
    assert_eq!(
        rows[0]["data_json"]["description"],
        "This is abc123, the first one."
    );
    assert!(rows[1]["data_json"].is_null());
}

#[test]
fn stdin_comma_rows_with_omit_and_empty_raw_quirk() {
    let mut child = cmd()
        .args([
            "--mode",
            "comma-rows",
            "--omit",
            "name",
            "--empty-raw-as-array",
        ])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .expect("spawn");
    child
        .stdin
        .take()
        .expect("stdin")
        .write_all(WIDGETS.as_bytes())
        .expect("write stdin");
    let out = child.wait_with_output().expect("wait");
    assert!(out.status.success());

    let text = String::from_utf8(out.stdout).expect("utf8");
    assert_eq!(
        text,
        "{\"widget_id\":\"abc123\",\"data_json\":{\"description\":\"This is abc123, the first one.\"}}\n,{\"widget_id\":\"def456\",\"data_json\":[]}\n"
    );
}

#[test]
fn config_file_forces_text_for_unsigned_ids() {
    let temp = tempfile::tempdir().expect("tempdir");
    let input = write_fixture(
        &temp,
        "hashes.json",
        r#"{"columns":[{"name":"sku_hash","type":"BIGINT"}],"rows":[[18446744073709551615]]}"#,
    );
    let config = write_fixture(
        &temp,
        "writer.json",
        r#"{"scan_overrides":[{"pattern":{"suffix":"_hash"},"kind":"text"}]}"#,
    );

    let out = cmd()
        .args([
            "--mode",
            "rows",
            "--config",
            config.to_str().unwrap(),
            input.to_str().unwrap(),
        ])
        .output()
        .expect("run");
    assert!(out.status.success());
    assert_eq!(
        std::str::from_utf8(&out.stdout).expect("utf8"),
        "{\"sku_hash\":\"18446744073709551615\"}\n"
    );
}

#[test]
fn scan_failure_exit_code_and_error_json() {
    let temp = tempfile::tempdir().expect("tempdir");
    let input = write_fixture(
        &temp,
        "hashes.json",
        r#"{"columns":[{"name":"sku_hash","type":"BIGINT"}],"rows":[[18446744073709551615]]}"#,
    );

    let out = cmd()
        .arg(input.to_str().unwrap())
        .output()
        .expect("run");
    assert_eq!(out.status.code().unwrap(), 4);
    let err = parse_json(&out.stderr);
    assert_eq!(err["error"]["kind"], "Scan");
    assert!(err["error"]["causes"][0]
        .as_str()
        .unwrap()
        .contains("sku_hash"));
}

#[test]
fn unsupported_type_exit_code() {
    let temp = tempfile::tempdir().expect("tempdir");
    let input = write_fixture(
        &temp,
        "shapes.json",
        r#"{"columns":[{"name":"shape","type":"GEOMETRY"}],"rows":[["POINT(1 2)"]]}"#,
    );

    let out = cmd()
        .arg(input.to_str().unwrap())
        .output()
        .expect("run");
    assert_eq!(out.status.code().unwrap(), 6);
    let err = parse_json(&out.stderr);
    assert_eq!(err["error"]["column"], "shape");

    let fixed = cmd()
        .args(["--as-text", "shape", input.to_str().unwrap()])
        .output()
        .expect("run");
    assert!(fixed.status.success());
    let rows = parse_json(&fixed.stdout);
    assert_eq!(rows[0]["shape"], "POINT(1 2)");
}

#[test]
fn usage_exit_code() {
    let out = cmd().args(["--mode", "sideways"]).output().expect("run");
    assert_eq!(out.status.code().unwrap(), 2);

    let temp = tempfile::tempdir().expect("tempdir");
    let missing = temp.path().join("missing.json");
    let out = cmd()
        .arg(missing.to_str().unwrap())
        .output()
        .expect("run");
    assert_eq!(out.status.code().unwrap(), 2);
}
