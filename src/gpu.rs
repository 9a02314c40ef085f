//! GPU availability probe via `nvidia-smi`.

use std::io::ErrorKind;

use crate::error::{DuoError, Result};
use crate::process::{CommandRunner, CommandSpec};

pub const NVIDIA_SMI: &str = "nvidia-smi";

/// Number of leading `nvidia-smi` lines echoed to the console.
const HEADER_LINES: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GpuStatus {
    /// Non-blank lines from the head of the `nvidia-smi` report.
    pub header: Vec<String>,
}

/// Run `nvidia-smi` and fail unless it exits successfully.
pub async fn probe_gpu(runner: &dyn CommandRunner) -> Result<GpuStatus> {
    let output = match runner.output(&CommandSpec::new(NVIDIA_SMI)).await {
        Ok(output) => output,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(DuoError::ToolMissing(format!(
                "{NVIDIA_SMI} not found. GPU may not be available."
            )));
        }
        Err(e) => return Err(e.into()),
    };

    if !output.success() {
        return Err(DuoError::GpuUnavailable(
            "Please enable GPU in Kaggle settings.".to_string(),
        ));
    }

    let header = output
        .stdout
        .lines()
        .take(HEADER_LINES)
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect();

    Ok(GpuStatus { header })
}
