//! Batched dependency installation.
//!
//! Failures here are tolerated: most packages are preinstalled on Kaggle
//! images, so a non-zero exit only produces a warning.

use crate::config::InstallConfig;
use crate::error::Result;
use crate::process::{CommandRunner, CommandSpec};

/// Upper bound on installer stderr echoed back to the user.
pub const STDERR_EXCERPT_CHARS: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    Installed,
    /// Installer ran (or failed to start) without success.
    Failed { excerpt: String },
}

pub fn install_command(config: &InstallConfig) -> CommandSpec {
    CommandSpec::new(&config.program)
        .args(["install", "-q"])
        .args(config.packages.iter().cloned())
}

pub async fn install_packages(
    config: &InstallConfig,
    runner: &dyn CommandRunner,
) -> Result<InstallOutcome> {
    let spec = install_command(config);

    let outcome = match runner.output(&spec).await {
        Ok(output) if output.success() => InstallOutcome::Installed,
        Ok(output) => InstallOutcome::Failed {
            excerpt: excerpt(&output.stderr, STDERR_EXCERPT_CHARS),
        },
        Err(e) => InstallOutcome::Failed {
            excerpt: format!("failed to run {}: {}", config.program, e),
        },
    };

    if let InstallOutcome::Failed { ref excerpt } = outcome {
        tracing::warn!("Package installation failed: {}", excerpt);
    }

    Ok(outcome)
}

/// First `max_chars` characters of `text`.
fn excerpt(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{CommandOutput, MockCommandRunner};

    #[test]
    fn command_batches_all_packages() {
        let config = InstallConfig {
            program: "pip".to_string(),
            packages: vec!["torch".to_string(), "hydra-core".to_string()],
        };
        let spec = install_command(&config);
        assert_eq!(spec.to_string(), "pip install -q torch hydra-core");
    }

    #[tokio::test]
    async fn failure_is_tolerated_and_truncated() {
        let mut runner = MockCommandRunner::new();
        runner.expect_output().times(1).returning(|_| {
            Ok(CommandOutput {
                code: Some(1),
                stdout: String::new(),
                stderr: "é".repeat(800),
            })
        });

        let outcome = install_packages(&InstallConfig::default(), &runner)
            .await
            .unwrap();
        match outcome {
            InstallOutcome::Failed { excerpt } => {
                assert_eq!(excerpt.chars().count(), STDERR_EXCERPT_CHARS)
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_installer_is_not_fatal() {
        let mut runner = MockCommandRunner::new();
        runner
            .expect_output()
            .returning(|_| Err(std::io::Error::from(std::io::ErrorKind::NotFound)));

        let outcome = install_packages(&InstallConfig::default(), &runner)
            .await
            .unwrap();
        assert!(matches!(outcome, InstallOutcome::Failed { .. }));
    }

    #[tokio::test]
    async fn zero_exit_is_installed() {
        let mut runner = MockCommandRunner::new();
        runner.expect_output().returning(|_| {
            Ok(CommandOutput {
                code: Some(0),
                ..Default::default()
            })
        });

        let outcome = install_packages(&InstallConfig::default(), &runner)
            .await
            .unwrap();
        assert_eq!(outcome, InstallOutcome::Installed);
    }
}
