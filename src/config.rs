use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Remote DUO repository cloned when no local copy is available.
pub const DEFAULT_REPO_URL: &str = "https://github.com/kuleshov-group/discrete-diffusion-guidance.git";

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub run: RunConfig,
    #[serde(default)]
    pub repo: RepoConfig,
    #[serde(default)]
    pub install: InstallConfig,
    #[serde(default)]
    pub trainer: TrainerConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Training run parameters handed to the external trainer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RunConfig {
    /// Total OpenWebText documents (90% train, 10% val)
    pub subset_size: u64,
    pub batch_size: u32,
    pub sequence_length: u32,
    pub max_steps: u64,
    /// Trainer numeric precision (16, 32 or 64)
    pub precision: u32,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            subset_size: 11000,
            batch_size: 2,
            sequence_length: 512,
            max_steps: 500,
            precision: 16,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RepoConfig {
    /// Git URL cloned when neither the cwd nor the input dir holds DUO
    pub url: String,
    /// Directory name under `working_dir` for the copy or clone
    pub clone_dir: String,
    /// Mounted Kaggle dataset holding a patched DUO tree
    pub input_dir: PathBuf,
    /// Writable Kaggle working directory
    pub working_dir: PathBuf,
}

impl Default for RepoConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_REPO_URL.to_string(),
            clone_dir: "duo".to_string(),
            input_dir: PathBuf::from("/kaggle/input/duo"),
            working_dir: PathBuf::from("/kaggle/working"),
        }
    }
}

impl RepoConfig {
    /// Destination of the local copy or clone.
    pub fn checkout_dir(&self) -> PathBuf {
        self.working_dir.join(&self.clone_dir)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct InstallConfig {
    /// Installer executable, invoked as `<program> install -q <packages...>`
    pub program: String,
    pub packages: Vec<String>,
}

impl Default for InstallConfig {
    fn default() -> Self {
        let packages = [
            "torch",
            "torchvision",
            "torchaudio",
            "transformers",
            "datasets",
            "tokenizers",
            "pytorch-lightning",
            "hydra-core",
            "omegaconf",
            "wandb",
            "fsspec",
            "aiohttp",
            "scipy",
            "numpy",
            "matplotlib",
        ];
        Self {
            program: "pip".to_string(),
            packages: packages.iter().map(|p| p.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TrainerConfig {
    /// Python interpreter used for training and import probes
    pub python: String,
    pub entry_point: String,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            python: "python".to_string(),
            entry_point: "main.py".to_string(),
        }
    }
}

/// How the "latest" checkpoint is chosen among discovered files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LatestBy {
    /// Lexicographically greatest path
    #[default]
    Name,
    /// Most recent modification time, path as tie-break
    Modified,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub latest_by: LatestBy,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("/kaggle/working/duo_results"),
            latest_by: LatestBy::Name,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Enable JSON formatted logs
    #[serde(default)]
    pub json: bool,
    /// Directory for rolling file logs (disabled when unset)
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
            dir: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AppConfig {
    /// Load configuration from a specific directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();
        let profile = std::env::var("DUO_ENV").unwrap_or_else(|_| "kaggle".to_string());

        let builder = Config::builder()
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            // Load default config file
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Load profile-specific config (e.g., config/kaggle.toml)
            .add_source(File::from(config_dir.join(format!("{profile}.toml"))).required(false))
            // Override with environment variables (DUO_RUN__SUBSET_SIZE, etc.)
            .add_source(
                Environment::with_prefix("DUO")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.run.subset_size == 0 {
            errors.push("run.subset_size must be positive".to_string());
        }
        if self.run.batch_size == 0 {
            errors.push("run.batch_size must be positive".to_string());
        }
        if self.run.sequence_length == 0 {
            errors.push("run.sequence_length must be positive".to_string());
        }
        if self.run.max_steps == 0 {
            errors.push("run.max_steps must be positive".to_string());
        }
        if ![16, 32, 64].contains(&self.run.precision) {
            errors.push(format!(
                "run.precision must be 16, 32 or 64 (got {})",
                self.run.precision
            ));
        }

        if self.install.packages.is_empty() {
            errors.push("install.packages must list at least one package".to_string());
        }

        if self.repo.clone_dir.trim().is_empty() {
            errors.push("repo.clone_dir must not be empty".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Render the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn defaults_match_kaggle_run() {
        let config = AppConfig::default();
        assert_eq!(config.run.subset_size, 11000);
        assert_eq!(config.run.batch_size, 2);
        assert_eq!(config.run.sequence_length, 512);
        assert_eq!(config.run.max_steps, 500);
        assert_eq!(config.run.precision, 16);
        assert_eq!(config.install.packages.len(), 15);
        assert_eq!(config.repo.checkout_dir(), PathBuf::from("/kaggle/working/duo"));
        assert_eq!(config.output.latest_by, LatestBy::Name);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn load_from_empty_dir_uses_defaults() {
        let dir = tempdir().unwrap();
        let config = AppConfig::load_from(dir.path()).unwrap();
        assert_eq!(config.run, RunConfig::default());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn load_from_reads_default_toml() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("default.toml"),
            "[run]\nsubset_size = 5000\nmax_steps = 42\n\n[output]\nlatest_by = \"modified\"\n",
        )
        .unwrap();

        let config = AppConfig::load_from(dir.path()).unwrap();
        assert_eq!(config.run.subset_size, 5000);
        assert_eq!(config.run.max_steps, 42);
        // untouched keys keep their defaults
        assert_eq!(config.run.batch_size, 2);
        assert_eq!(config.output.latest_by, LatestBy::Modified);
    }

    #[test]
    fn validate_collects_every_problem() {
        let mut config = AppConfig::default();
        config.run.batch_size = 0;
        config.run.precision = 8;
        config.install.packages.clear();

        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.iter().any(|e| e.contains("batch_size")));
        assert!(errors.iter().any(|e| e.contains("precision")));
    }

    #[test]
    fn toml_rendering_reloads() {
        let rendered = AppConfig::default().to_toml().unwrap();
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("default.toml"), &rendered).unwrap();

        let config = AppConfig::load_from(dir.path()).unwrap();
        assert_eq!(config.run, RunConfig::default());
        assert_eq!(config.repo.url, DEFAULT_REPO_URL);
    }
}
