use std::io::Write;

use assert_cmd::Command;

#[test]
fn start_on_a_ticket_free_workspace_completes_and_exits_zero() {
    let workspace = tempfile::tempdir().unwrap();

    let mut cmd = Command::cargo_bin("oj-worker").unwrap();
    cmd.arg("--workspace").arg(workspace.path()).arg("start");
    let output = cmd.output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Completed"), "unexpected stdout: {stdout}");
}

#[test]
fn malformed_config_exits_with_the_preflight_error_code() {
    let workspace = tempfile::tempdir().unwrap();
    let state_dir = workspace.path().join(".codex-autorunner");
    std::fs::create_dir_all(&state_dir).unwrap();
    let mut config = std::fs::File::create(state_dir.join("config.yml")).unwrap();
    writeln!(config, "max_total_turns: [not, a, number]").unwrap();

    let mut cmd = Command::cargo_bin("oj-worker").unwrap();
    cmd.arg("--workspace").arg(workspace.path()).arg("start");
    cmd.assert().code(2);
}

#[test]
fn an_unknown_run_id_for_status_exits_nonzero() {
    let workspace = tempfile::tempdir().unwrap();

    let mut cmd = Command::cargo_bin("oj-worker").unwrap();
    cmd.arg("--workspace")
        .arg(workspace.path())
        .arg("status")
        .arg("00000000-0000-0000-0000-000000000000");
    cmd.assert().code(1);
}
