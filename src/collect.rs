//! Discovery of checkpoints and metrics written by PyTorch Lightning.
//!
//! Mirrors the globs `lightning_logs/*/checkpoints/*.ckpt` and
//! `lightning_logs/*/metrics.csv` relative to the DUO checkout. As with shell
//! globs, `*` never matches names starting with a dot.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tabled::{builder::Builder, settings::Style, Tabled};

use crate::config::LatestBy;
use crate::error::Result;

pub const LOGS_DIR: &str = "lightning_logs";
pub const CHECKPOINTS_DIR: &str = "checkpoints";
pub const CHECKPOINT_EXT: &str = "ckpt";
pub const METRICS_FILE: &str = "metrics.csv";

/// Rows of `metrics.csv` shown after training.
pub const METRICS_TAIL_ROWS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkpoint {
    /// Path relative to the checkout root, as the glob would print it.
    pub rel: String,
    pub path: PathBuf,
    pub size_bytes: u64,
    pub modified: Option<SystemTime>,
}

impl Checkpoint {
    pub fn size_mb(&self) -> f64 {
        self.size_bytes as f64 / (1024.0 * 1024.0)
    }
}

#[derive(Debug, Tabled)]
struct CheckpointRow {
    checkpoint: String,
    size: String,
}

#[derive(Debug, Clone, Default)]
pub struct Artifacts {
    /// Sorted by relative path.
    pub checkpoints: Vec<Checkpoint>,
    /// Sorted by relative path.
    pub metrics: Vec<(String, PathBuf)>,
}

impl Artifacts {
    pub fn discover(root: &Path) -> std::io::Result<Self> {
        let mut checkpoints = Vec::new();
        let mut metrics = Vec::new();

        for version in visible_entries(&root.join(LOGS_DIR))? {
            let version_path = root.join(LOGS_DIR).join(&version);
            if !version_path.is_dir() {
                continue;
            }

            let metrics_path = version_path.join(METRICS_FILE);
            if metrics_path.is_file() {
                metrics.push((format!("{LOGS_DIR}/{version}/{METRICS_FILE}"), metrics_path));
            }

            let ckpt_dir = version_path.join(CHECKPOINTS_DIR);
            for name in visible_entries(&ckpt_dir)? {
                let path = ckpt_dir.join(&name);
                let is_ckpt = Path::new(&name)
                    .extension()
                    .is_some_and(|ext| ext == CHECKPOINT_EXT);
                if !is_ckpt {
                    continue;
                }
                let meta = match fs::metadata(&path) {
                    Ok(meta) if meta.is_file() => meta,
                    _ => continue,
                };
                checkpoints.push(Checkpoint {
                    rel: format!("{LOGS_DIR}/{version}/{CHECKPOINTS_DIR}/{name}"),
                    path,
                    size_bytes: meta.len(),
                    modified: meta.modified().ok(),
                });
            }
        }

        checkpoints.sort_by(|a, b| a.rel.cmp(&b.rel));
        metrics.sort();

        Ok(Self {
            checkpoints,
            metrics,
        })
    }

    pub fn latest_checkpoint(&self, by: LatestBy) -> Option<&Checkpoint> {
        select_latest(&self.checkpoints, by)
    }

    /// First metrics file in path order.
    pub fn metrics_file(&self) -> Option<&(String, PathBuf)> {
        self.metrics.first()
    }

    pub fn checkpoint_table(&self) -> String {
        let rows: Vec<CheckpointRow> = self
            .checkpoints
            .iter()
            .map(|c| CheckpointRow {
                checkpoint: c.rel.clone(),
                size: format!("{:.1} MB", c.size_mb()),
            })
            .collect();
        let mut table = tabled::Table::new(rows);
        table.with(Style::psql());
        table.to_string()
    }
}

/// Pick the "latest" checkpoint.
///
/// `Name` is the greatest relative path as a string, which is only
/// chronological when the trainer zero-pads its step counters. `Modified`
/// uses mtime and falls back to the name on ties or missing timestamps.
pub fn select_latest(checkpoints: &[Checkpoint], by: LatestBy) -> Option<&Checkpoint> {
    match by {
        LatestBy::Name => checkpoints.iter().max_by(|a, b| a.rel.cmp(&b.rel)),
        LatestBy::Modified => checkpoints
            .iter()
            .max_by(|a, b| a.modified.cmp(&b.modified).then_with(|| a.rel.cmp(&b.rel))),
    }
}

/// Names in `dir`, skipping dotfiles. A missing directory yields nothing.
fn visible_entries(dir: &Path) -> std::io::Result<Vec<String>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let name = entry?.file_name().to_string_lossy().into_owned();
        if !name.starts_with('.') {
            names.push(name);
        }
    }
    Ok(names)
}

/// Header plus the last `rows` records of a CSV file, rendered as a table.
///
/// Quoted fields may contain commas. Returns `None` for an empty file.
pub fn metrics_tail(path: &Path, rows: usize) -> Result<Option<String>> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;

    let header = reader.headers()?.clone();
    if header.is_empty() {
        return Ok(None);
    }
    let records = reader.records().collect::<std::result::Result<Vec<_>, _>>()?;
    let start = records.len().saturating_sub(rows);

    let mut builder = Builder::default();
    builder.push_record(header.iter().map(str::to_string));
    for record in &records[start..] {
        builder.push_record(record.iter().map(str::to_string));
    }

    let mut table = builder.build();
    table.with(Style::psql());
    Ok(Some(table.to_string()))
}
