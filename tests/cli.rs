// ABOUTME: Integration tests for the stagegate CLI commands.
// ABOUTME: Validates --help output, dry-run command rendering, and config errors.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;

fn stagegate_cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("stagegate"))
}

#[test]
fn help_shows_commands() {
    stagegate_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("promote"))
        .stdout(predicate::str::contains("wait-deployment"))
        .stdout(predicate::str::contains("wait-approval"));
}

#[test]
fn dry_run_promote_prints_command_without_config() {
    let temp_dir = tempfile::tempdir().unwrap();

    stagegate_cmd()
        .current_dir(temp_dir.path())
        .args([
            "promote",
            "--product",
            "qlarius",
            "--baseline",
            "bl 1",
            "--stage",
            "test",
            "--deploy",
            "--areas",
            "web;db",
            "--comment",
            "release",
            "--token",
            "req-1",
            "--dry-run",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "PMBL \"QLARIUS:BL 1\" /COMMENT=\"release[req-1]\" /STAGE=\"TEST\" /DEPLOY /AREA_LIST=(WEB,DB)",
        ));
}

#[test]
fn dry_run_rollback_area_with_version() {
    stagegate_cmd()
        .args([
            "rollback-area",
            "--area",
            "web",
            "--version",
            "3",
            "--dry-run",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("SRAV WEB;3 /COMMENT=\"\""));
}

#[test]
fn dry_run_create_baseline_renders_attributes() {
    stagegate_cmd()
        .args([
            "create-baseline",
            "--product",
            "qlarius",
            "--project",
            "main",
            "--baseline",
            "bl_9",
            "--type",
            "RELEASE",
            "--attributes",
            "owner=ops\ntier=1",
            "--dry-run",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "CBL QLARIUS:BL_9 /WORKSET=QLARIUS:MAIN /TYPE=\"RELEASE\" /ATTRIBUTES=(OWNER=ops,TIER=1)",
        ));
}

#[test]
fn malformed_attribute_line_is_rejected() {
    stagegate_cmd()
        .args([
            "create-baseline",
            "--product",
            "p",
            "--project",
            "q",
            "--baseline",
            "b",
            "--type",
            "RELEASE",
            "--attributes",
            "no equals sign",
            "--dry-run",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid attributes"));
}

#[test]
fn dry_run_action_on_project() {
    stagegate_cmd()
        .args([
            "action",
            "--product",
            "qlarius",
            "--type",
            "Project",
            "--name",
            "java_brancha",
            "--state",
            "closed",
            "--dry-run",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "AWS QLARIUS:JAVA_BRANCHA /STATUS=\"CLOSED\" /COMMENT=\"\"",
        ));
}

#[test]
fn action_rejects_unknown_entity_type() {
    stagegate_cmd()
        .args([
            "action", "--product", "p", "--type", "request", "--name", "n", "--state", "s",
            "--dry-run",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no such entity type"));
}

#[test]
fn json_dry_run_emits_result_event() {
    stagegate_cmd()
        .args([
            "--json",
            "demote",
            "--product",
            "p",
            "--baseline",
            "b",
            "--token",
            "t",
            "--dry-run",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"event\":\"result\""))
        .stdout(predicate::str::contains("DMBL P:B"));
}

#[test]
fn blank_token_is_a_missing_parameter() {
    stagegate_cmd()
        .args([
            "promote",
            "--product",
            "p",
            "--baseline",
            "b",
            "--token",
            " ",
            "--dry-run",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing required parameter: token"));
}

#[test]
fn stages_without_config_fails() {
    let temp_dir = tempfile::tempdir().unwrap();

    stagegate_cmd()
        .current_dir(temp_dir.path())
        .arg("stages")
        .assert()
        .failure()
        .stderr(predicate::str::contains("configuration file not found"));
}

#[test]
fn missing_section_is_reported() {
    let temp_dir = tempfile::tempdir().unwrap();
    fs::write(
        temp_dir.path().join("stagegate.yml"),
        "approval:\n  max_polls: 3\n",
    )
    .unwrap();

    stagegate_cmd()
        .current_dir(temp_dir.path())
        .arg("stages")
        .assert()
        .failure()
        .stderr(predicate::str::contains("'engine'"));
}

#[cfg(unix)]
#[test]
fn wait_deployment_exit_code_follows_status() {
    let temp_dir = tempfile::tempdir().unwrap();
    let gateway = temp_dir.path().join("gateway.sh");
    fs::write(
        &gateway,
        r#"case "$1" in
  history) echo '[{"comment":"ship[r9]","job_name":"JOB_3","result":"3"}]' ;;
esac
"#,
    )
    .unwrap();
    fs::write(
        temp_dir.path().join("stagegate.yml"),
        format!(
            "engine:\n  program: sh\n  args: [\"{}\"]\ndeployment:\n  poll_interval: 10ms\n",
            gateway.display()
        ),
    )
    .unwrap();

    stagegate_cmd()
        .current_dir(temp_dir.path())
        .args(["wait-deployment", "--entity", "p:b", "--token", "r9"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("JOB_3"));
}
