// src/exec/task_runner.rs

//! Production package task: run a process inside the package directory.

use std::future::Future;
use std::pin::Pin;
use std::process::Stdio;

use anyhow::{bail, Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, error, info};

use crate::dag::Package;
use crate::engine::TaskOutcome;

use super::backend::{PackageTask, TaskKind};

/// Environment variable carrying the current package's name into the task.
pub const PACKAGE_NAME_ENV: &str = "TREERUN_PACKAGE_NAME";

/// Runs a [`TaskKind`] as an OS process in each package directory.
///
/// - `Install` and `RunScript` go through the platform shell.
/// - `Exec` spawns the program directly.
/// - A package without the requested script succeeds without running
///   anything (it can only be selected through dependency expansion).
///
/// Output lines are forwarded to `tracing` tagged with the package name.
#[derive(Debug, Clone)]
pub struct CommandTask {
    kind: TaskKind,
}

impl CommandTask {
    pub fn new(kind: TaskKind) -> Self {
        Self { kind }
    }

    pub fn kind(&self) -> &TaskKind {
        &self.kind
    }
}

impl PackageTask for CommandTask {
    fn run(&self, package: Package) -> Pin<Box<dyn Future<Output = TaskOutcome> + Send + '_>> {
        Box::pin(async move {
            match run_in_package(&self.kind, &package).await {
                Ok(outcome) => outcome,
                Err(err) => {
                    error!(
                        package = %package.name,
                        error = %format!("{err:#}"),
                        "package task execution error"
                    );
                    TaskOutcome::Failed(-1)
                }
            }
        })
    }
}

async fn run_in_package(kind: &TaskKind, package: &Package) -> Result<TaskOutcome> {
    let Some(mut cmd) = build_command(kind, package)? else {
        info!(
            package = %package.name,
            script = kind.script().unwrap_or_default(),
            "script not defined for package; nothing to run"
        );
        return Ok(TaskOutcome::Success);
    };

    info!(
        package = %package.name,
        path = %package.path.display(),
        task = %kind.describe(),
        "starting package process"
    );

    cmd.current_dir(&package.path)
        .env(PACKAGE_NAME_ENV, &package.name)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd
        .spawn()
        .with_context(|| format!("spawning process for package '{}'", package.name))?;

    let mut forwarders = Vec::new();

    if let Some(stdout) = child.stdout.take() {
        let name = package.name.clone();
        forwarders.push(tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                info!(package = %name, "{}", line);
            }
        }));
    }

    // Always consume stderr so buffers don't fill; log at debug.
    if let Some(stderr) = child.stderr.take() {
        let name = package.name.clone();
        forwarders.push(tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                debug!(package = %name, "stderr: {}", line);
            }
        }));
    }

    let status = child
        .wait()
        .await
        .with_context(|| format!("waiting for process of package '{}'", package.name))?;

    for forwarder in forwarders {
        let _ = forwarder.await;
    }

    let code = status.code().unwrap_or(-1);
    info!(
        package = %package.name,
        exit_code = code,
        success = status.success(),
        "package process exited"
    );

    Ok(if status.success() {
        TaskOutcome::Success
    } else {
        TaskOutcome::Failed(code)
    })
}

/// Build the process for `kind`, or `None` when the package lacks the script.
fn build_command(kind: &TaskKind, package: &Package) -> Result<Option<Command>> {
    let cmd = match kind {
        TaskKind::Install { cmd } => Some(shell_command(cmd)),
        TaskKind::RunScript { script } => package.script(script).map(shell_command),
        TaskKind::Exec { argv } => {
            let Some((program, args)) = argv.split_first() else {
                bail!("exec requires a program to run");
            };
            let mut c = Command::new(program);
            c.args(args);
            Some(c)
        }
    };
    Ok(cmd)
}

/// Build a shell command appropriate for the platform.
fn shell_command(line: &str) -> Command {
    if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(line);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(line);
        c
    }
}
