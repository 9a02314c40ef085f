//! Persisting the run's artifacts into the output directory.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::collect::{Artifacts, Checkpoint};
use crate::config::RunConfig;
use crate::error::Result;

pub const FINAL_CHECKPOINT: &str = "final_model.ckpt";
pub const METRICS_COPY: &str = "metrics.csv";
pub const SUMMARY_FILE: &str = "config.json";

/// Written to `config.json`; `checkpoint` is null when training left none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub subset_size: u64,
    pub batch_size: u32,
    pub sequence_length: u32,
    pub max_steps: u64,
    pub precision: u32,
    pub checkpoint: Option<String>,
}

impl RunSummary {
    pub fn new(run: &RunConfig, checkpoint: Option<&Checkpoint>) -> Self {
        Self {
            subset_size: run.subset_size,
            batch_size: run.batch_size,
            sequence_length: run.sequence_length,
            max_steps: run.max_steps,
            precision: run.precision,
            checkpoint: checkpoint.map(|c| c.rel.clone()),
        }
    }
}

/// Where each saved artifact ended up.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SavedResults {
    pub checkpoint: Option<PathBuf>,
    pub metrics: Option<PathBuf>,
    pub summary: PathBuf,
}

/// Copy the chosen checkpoint and metrics into `output_dir` and write the summary.
///
/// The directory is created if needed; existing files are overwritten.
pub fn save_results(
    output_dir: &Path,
    summary: &RunSummary,
    latest: Option<&Checkpoint>,
    artifacts: &Artifacts,
) -> Result<SavedResults> {
    fs::create_dir_all(output_dir)?;

    let checkpoint = match latest {
        Some(ckpt) => {
            let dest = output_dir.join(FINAL_CHECKPOINT);
            fs::copy(&ckpt.path, &dest)?;
            Some(dest)
        }
        None => None,
    };

    let metrics = match artifacts.metrics_file() {
        Some((_, path)) => {
            let dest = output_dir.join(METRICS_COPY);
            fs::copy(path, &dest)?;
            Some(dest)
        }
        None => None,
    };

    let summary_path = output_dir.join(SUMMARY_FILE);
    fs::write(&summary_path, serde_json::to_string_pretty(summary)?)?;
    tracing::info!("Wrote run summary to {}", summary_path.display());

    Ok(SavedResults {
        checkpoint,
        metrics,
        summary: summary_path,
    })
}
