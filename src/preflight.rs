//! Read-only checks against the DUO checkout before training starts.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Dataloader patched for OpenWebText subset loading.
pub const DATALOADER: &str = "dataloader.py";

/// Literal snippets the subset-loading patch introduces into `dataloader.py`.
pub const SUBSET_MARKERS: [&str; 4] = [
    "OWT_SUBSET_NUM",
    "os.getenv(\"OWT_SUBSET_NUM\")",
    "subset_split",
    "Using OpenWebText subset",
];

/// Files the bootstrap refuses to train without.
pub const TRAIN_REQUIRED_FILES: [&str; 3] = ["main.py", "dataloader.py", "configs/config.yaml"];

/// Files the verifier expects, including the Hydra configs selected on the command line.
pub const CONFIG_FILES: [&str; 5] = [
    "main.py",
    "dataloader.py",
    "configs/config.yaml",
    "configs/data/openwebtext-split.yaml",
    "configs/algo/duo_base.yaml",
];

/// Result of searching one file for marker substrings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkerReport {
    FileMissing { path: PathBuf },
    Scanned { path: PathBuf, found: Vec<(String, bool)> },
}

impl MarkerReport {
    pub fn all_found(&self) -> bool {
        match self {
            Self::FileMissing { .. } => false,
            Self::Scanned { found, .. } => found.iter().all(|(_, present)| *present),
        }
    }

    pub fn missing(&self) -> Vec<&str> {
        match self {
            Self::FileMissing { .. } => Vec::new(),
            Self::Scanned { found, .. } => found
                .iter()
                .filter(|(_, present)| !present)
                .map(|(marker, _)| marker.as_str())
                .collect(),
        }
    }
}

/// Search `path` for each marker as an exact, case-sensitive substring.
///
/// The file is searched as bytes, so non-UTF-8 content is still scanned.
/// A missing file is reported, not raised; other read errors propagate.
pub fn scan_markers(path: &Path, markers: &[&str]) -> std::io::Result<MarkerReport> {
    let content = match std::fs::read(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Ok(MarkerReport::FileMissing {
                path: path.to_path_buf(),
            });
        }
        Err(e) => return Err(e),
    };

    let found = markers
        .iter()
        .map(|marker| (marker.to_string(), contains_bytes(&content, marker.as_bytes())))
        .collect();

    Ok(MarkerReport::Scanned {
        path: path.to_path_buf(),
        found,
    })
}

fn contains_bytes(haystack: &[u8], needle: &[u8]) -> bool {
    needle.is_empty() || haystack.windows(needle.len()).any(|w| w == needle)
}

/// Presence of each relative path under a root directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub entries: Vec<(String, bool)>,
}

impl FileReport {
    pub fn all_found(&self) -> bool {
        self.entries.iter().all(|(_, exists)| *exists)
    }

    pub fn missing(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|(_, exists)| !exists)
            .map(|(path, _)| path.clone())
            .collect()
    }
}

pub fn check_files(root: &Path, paths: &[&str]) -> FileReport {
    let entries = paths
        .iter()
        .map(|rel| (rel.to_string(), root.join(rel).exists()))
        .collect();
    FileReport { entries }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const PATCHED: &str = r#"
import os
subset_num = os.getenv("OWT_SUBSET_NUM")
if subset_num:
    subset_split = int(subset_num) * 9 // 10
    print("Using OpenWebText subset")
"#;

    #[test]
    fn patched_dataloader_has_every_marker() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(DATALOADER);
        std::fs::write(&path, PATCHED).unwrap();

        let report = scan_markers(&path, &SUBSET_MARKERS).unwrap();
        assert!(report.all_found());
        assert!(report.missing().is_empty());
    }

    #[test]
    fn markers_are_case_sensitive_and_exact() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(DATALOADER);
        std::fs::write(
            &path,
            "owt_subset_num = os.getenv('OWT_SUBSET_NUM')\n# using openwebtext subset\n",
        )
        .unwrap();

        let report = scan_markers(&path, &SUBSET_MARKERS).unwrap();
        assert!(!report.all_found());
        // single quotes do not satisfy the double-quoted getenv marker
        assert_eq!(
            report.missing(),
            vec![
                "os.getenv(\"OWT_SUBSET_NUM\")",
                "subset_split",
                "Using OpenWebText subset"
            ]
        );
    }

    #[test]
    fn missing_file_is_reported_not_raised() {
        let dir = tempdir().unwrap();
        let report = scan_markers(&dir.path().join(DATALOADER), &SUBSET_MARKERS).unwrap();
        assert!(matches!(report, MarkerReport::FileMissing { .. }));
        assert!(!report.all_found());
    }

    #[test]
    fn non_utf8_dataloader_is_still_scanned() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(DATALOADER);
        let mut content = PATCHED.as_bytes().to_vec();
        content.extend_from_slice(b"# caf\xe9\n");
        std::fs::write(&path, content).unwrap();

        let report = scan_markers(&path, &SUBSET_MARKERS).unwrap();
        assert!(report.all_found());
    }

    #[test]
    fn file_check_reports_each_path() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("main.py"), "").unwrap();
        std::fs::create_dir_all(dir.path().join("configs")).unwrap();
        std::fs::write(dir.path().join("configs/config.yaml"), "").unwrap();

        let report = check_files(dir.path(), &TRAIN_REQUIRED_FILES);
        assert!(!report.all_found());
        assert_eq!(report.missing(), vec!["dataloader.py".to_string()]);
        assert_eq!(report.entries.len(), 3);
    }
}
