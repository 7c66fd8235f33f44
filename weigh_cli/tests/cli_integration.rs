use assert_cmd::prelude::*;
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

// Minimal config for the simulated scale; `weights` is a TOML array body.
fn write_sim_config(dir: &tempfile::TempDir, weights: &str, timeout_ms: u64) -> PathBuf {
    let toml = format!(
        r#"
[port]
path = "sim"

[stability]
consecutive = 5

[session]
timeout_ms = {timeout_ms}

[sim]
weights = [{weights}]
interval_ms = 2
repeat = true
"#
    );
    let path = dir.path().join("cfg.toml");
    fs::write(&path, toml).unwrap();
    path
}

const SETTLING: &str = r#""12.0", "48.5", "50.0", "50.0", "50.0", "50.0", "50.0""#;
const DRIFTING: &str = r#""50.0", "50.1""#;

#[rstest]
#[case(&["--help"], 0, "Usage:", "stdout")]
#[case(&["read"], 0, "stable weight: 50.0", "stdout")]
#[case(&["read", "--repeat", "2"], 0, "stable weight: 50.0", "stdout")]
#[case(&["self-check"], 0, "ok: sim", "stdout")]
#[case(&["read", "--repeat", "0"], 2, "invalid value", "stderr")]
fn cli_table_cases(
    #[case] args: &[&str],
    #[case] exit_code: i32,
    #[case] needle: &str,
    #[case] stream: &str,
) {
    let dir = tempdir().unwrap();
    let cfg = write_sim_config(&dir, SETTLING, 5000);

    let mut cmd = Command::cargo_bin("weigh").unwrap();
    cmd.arg("--config").arg(&cfg);
    for a in args {
        cmd.arg(a);
    }

    let assert = cmd.assert().code(exit_code);
    match stream {
        "stdout" => assert.stdout(predicate::str::contains(needle)),
        _ => assert.stderr(predicate::str::contains(needle)),
    };
}

#[test]
fn never_settling_scale_times_out_with_code_3() {
    let dir = tempdir().unwrap();
    let cfg = write_sim_config(&dir, DRIFTING, 300);

    let mut cmd = Command::cargo_bin("weigh").unwrap();
    cmd.arg("--config").arg(&cfg).arg("read");
    cmd.assert()
        .code(3)
        .stderr(predicate::str::contains("What happened: No stable weight within 300 ms"));
}

#[test]
fn timeout_flag_overrides_config() {
    let dir = tempdir().unwrap();
    let cfg = write_sim_config(&dir, DRIFTING, 60_000);

    let mut cmd = Command::cargo_bin("weigh").unwrap();
    cmd.arg("--config")
        .arg(&cfg)
        .arg("read")
        .arg("--timeout-ms")
        .arg("150");
    cmd.assert()
        .code(3)
        .stderr(predicate::str::contains("150 ms"));
}

#[test]
fn missing_port_exits_with_code_2() {
    let dir = tempdir().unwrap();
    let cfg = write_sim_config(&dir, SETTLING, 500);

    let mut cmd = Command::cargo_bin("weigh").unwrap();
    cmd.arg("--config")
        .arg(&cfg)
        .arg("read")
        .arg("--port")
        .arg("/dev/weigh-test-missing");
    cmd.assert()
        .code(2)
        .stderr(predicate::str::contains("serial port could not be opened"));
}

#[test]
fn invalid_config_is_reported() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    fs::write(&path, "[port]\npath = \"sim\"\n[stability]\nconsecutive = 0\n").unwrap();

    let mut cmd = Command::cargo_bin("weigh").unwrap();
    cmd.arg("--config").arg(&path).arg("read");
    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("stability.consecutive must be >= 1"));
}
