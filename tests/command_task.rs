// tests/command_task.rs

#![cfg(unix)]

use std::fs;

use tempfile::TempDir;
use treerun::dag::Package;
use treerun::engine::TaskOutcome;
use treerun::exec::{CommandTask, PackageTask, TaskKind};
use treerun_test_utils::{init_tracing, with_timeout};

fn package_in(dir: &TempDir, name: &str) -> Package {
    let path = dir.path().join(name);
    fs::create_dir_all(&path).unwrap();
    Package::new(name, path)
}

fn install(cmd: &str) -> CommandTask {
    CommandTask::new(TaskKind::Install {
        cmd: cmd.to_string(),
    })
}

#[tokio::test]
async fn zero_exit_is_success() {
    init_tracing();
    let dir = TempDir::new().unwrap();

    let outcome = with_timeout(install("true").run(package_in(&dir, "a"))).await;
    assert_eq!(outcome, TaskOutcome::Success);
}

#[tokio::test]
async fn non_zero_exit_carries_the_code() {
    init_tracing();
    let dir = TempDir::new().unwrap();

    let outcome = with_timeout(install("exit 3").run(package_in(&dir, "a"))).await;
    assert_eq!(outcome, TaskOutcome::Failed(3));
}

#[tokio::test]
async fn runs_inside_the_package_directory_with_its_name() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let package = package_in(&dir, "web");

    let task = install("pwd > where.txt && echo \"$TREERUN_PACKAGE_NAME\" > who.txt");
    let outcome = with_timeout(task.run(package.clone())).await;
    assert_eq!(outcome, TaskOutcome::Success);

    let where_ = fs::read_to_string(package.path.join("where.txt")).unwrap();
    assert_eq!(
        fs::canonicalize(where_.trim()).unwrap(),
        fs::canonicalize(&package.path).unwrap()
    );
    let who = fs::read_to_string(package.path.join("who.txt")).unwrap();
    assert_eq!(who.trim(), "web");
}

#[tokio::test]
async fn run_script_uses_the_package_script() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let mut package = package_in(&dir, "lib");
    package
        .scripts
        .insert("build".to_string(), "echo built > out.txt".to_string());

    let task = CommandTask::new(TaskKind::RunScript {
        script: "build".to_string(),
    });
    let outcome = with_timeout(task.run(package.clone())).await;

    assert_eq!(outcome, TaskOutcome::Success);
    assert_eq!(
        fs::read_to_string(package.path.join("out.txt")).unwrap().trim(),
        "built"
    );
}

#[tokio::test]
async fn missing_script_is_a_no_op_success() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let package = package_in(&dir, "docs");

    let task = CommandTask::new(TaskKind::RunScript {
        script: "build".to_string(),
    });
    let outcome = with_timeout(task.run(package.clone())).await;

    assert_eq!(outcome, TaskOutcome::Success);
    assert_eq!(fs::read_dir(&package.path).unwrap().count(), 0);
}

#[tokio::test]
async fn exec_spawns_the_program_directly() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let package = package_in(&dir, "a");

    let task = CommandTask::new(TaskKind::Exec {
        argv: vec!["touch".to_string(), "marker".to_string()],
    });
    let outcome = with_timeout(task.run(package.clone())).await;

    assert_eq!(outcome, TaskOutcome::Success);
    assert!(package.path.join("marker").exists());
}

#[tokio::test]
async fn unknown_program_fails_instead_of_erroring() {
    init_tracing();
    let dir = TempDir::new().unwrap();

    let task = CommandTask::new(TaskKind::Exec {
        argv: vec!["definitely-not-a-real-program-xyz".to_string()],
    });
    let outcome = with_timeout(task.run(package_in(&dir, "a"))).await;

    assert_eq!(outcome, TaskOutcome::Failed(-1));
}
