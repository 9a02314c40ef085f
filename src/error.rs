use thiserror::Error;

/// Main error type for the Kaggle bootstrap and verifier
#[derive(Error, Debug)]
pub enum DuoError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid configuration: {}", .0.join("; "))]
    InvalidConfig(Vec<String>),

    // Environment errors
    #[error("GPU not detected: {0}")]
    GpuUnavailable(String),

    #[error("Required tool not found: {0}")]
    ToolMissing(String),

    // Acquisition errors
    #[error("Failed to clone {url}: {stderr}")]
    CloneFailed { url: String, stderr: String },

    // Verification errors
    #[error("Required files missing: {}", .0.join(", "))]
    MissingFiles(Vec<String>),

    // Training subprocess errors
    #[error("Training failed: {0}")]
    TrainingFailed(String),

    // Serialization errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias for DuoError
pub type Result<T> = std::result::Result<T, DuoError>;

impl DuoError {
    /// Process exit code reported for this error.
    pub fn exit_code(&self) -> i32 {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_files_lists_every_path() {
        let err = DuoError::MissingFiles(vec!["main.py".into(), "configs/config.yaml".into()]);
        assert_eq!(
            err.to_string(),
            "Required files missing: main.py, configs/config.yaml"
        );
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn invalid_config_joins_problems() {
        let err = DuoError::InvalidConfig(vec!["a".into(), "b".into()]);
        assert_eq!(err.to_string(), "Invalid configuration: a; b");
    }
}
