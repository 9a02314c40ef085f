//! Subprocess execution seam.
//!
//! Every external program (nvidia-smi, git, pip, python) is launched through
//! [`CommandRunner`] so the pipeline stages can be driven by a fake in tests.

use std::{fmt, path::PathBuf, process::Stdio};

use async_trait::async_trait;
use tokio::process::Command;

/// A program invocation: executable, ordered arguments, optional working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Program followed by its arguments.
    pub fn argv(&self) -> Vec<&str> {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect()
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.argv().join(" "))
    }
}

/// Captured result of a finished subprocess.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code; `None` when the child was terminated by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run to completion, capturing stdout and stderr.
    async fn output(&self, spec: &CommandSpec) -> std::io::Result<CommandOutput>;

    /// Run to completion with inherited stdio, returning the exit code.
    ///
    /// Returns `ErrorKind::Interrupted` when the parent received Ctrl+C or
    /// SIGTERM; the child is killed first.
    async fn status(&self, spec: &CommandSpec) -> std::io::Result<Option<i32>>;
}

/// Runs commands on the host via `tokio::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl SystemRunner {
    fn command(spec: &CommandSpec) -> Command {
        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args);
        if let Some(ref dir) = spec.cwd {
            cmd.current_dir(dir);
        }
        cmd
    }
}

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn output(&self, spec: &CommandSpec) -> std::io::Result<CommandOutput> {
        tracing::debug!("Running: {}", spec);

        let output = Self::command(spec)
            .stdin(Stdio::null())
            .output()
            .await?;

        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    async fn status(&self, spec: &CommandSpec) -> std::io::Result<Option<i32>> {
        tracing::debug!("Spawning: {}", spec);

        let mut child = Self::command(spec).spawn()?;

        tokio::select! {
            status = child.wait() => Ok(status?.code()),
            _ = shutdown_signal() => {
                tracing::warn!("Interrupted, stopping {}", spec.program);
                if let Err(e) = child.kill().await {
                    tracing::error!("Failed to kill {}: {}", spec.program, e);
                }
                Err(std::io::Error::new(
                    std::io::ErrorKind::Interrupted,
                    "interrupted by signal",
                ))
            }
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_renders_as_shell_line() {
        let spec = CommandSpec::new("git")
            .arg("clone")
            .args(["https://example.com/repo.git", "duo"]);
        assert_eq!(spec.to_string(), "git clone https://example.com/repo.git duo");
        assert_eq!(spec.argv(), vec!["git", "clone", "https://example.com/repo.git", "duo"]);
        assert!(spec.cwd.is_none());
    }

    #[test]
    fn output_success_requires_zero_exit() {
        let mut out = CommandOutput::default();
        assert!(!out.success());
        out.code = Some(1);
        assert!(!out.success());
        out.code = Some(0);
        assert!(out.success());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn system_runner_captures_output() {
        let spec = CommandSpec::new("sh").args(["-c", "echo hello; echo oops >&2; exit 3"]);
        let out = SystemRunner.output(&spec).await.unwrap();
        assert_eq!(out.code, Some(3));
        assert_eq!(out.stdout.trim(), "hello");
        assert_eq!(out.stderr.trim(), "oops");
    }

    #[tokio::test]
    async fn system_runner_reports_missing_program() {
        let spec = CommandSpec::new("definitely-not-a-real-program-duo");
        let err = SystemRunner.output(&spec).await.unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }
}
