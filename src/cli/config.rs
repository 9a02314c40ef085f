//! Configuration management commands
//!
//! duo-kaggle config show - Show the effective configuration
//! duo-kaggle config init - Write a default configuration file

use anyhow::{Context, Result};
use clap::Subcommand;
use std::path::{Path, PathBuf};

use crate::config::AppConfig;

/// Configuration-related commands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the effective configuration (defaults, files and DUO_* env merged)
    Show,

    /// Write default.toml into the configuration directory
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

impl ConfigCommands {
    pub fn run(self, config_dir: &Path, config: &AppConfig) -> Result<()> {
        match self {
            Self::Show => show_config(config_dir, config),
            Self::Init { force } => init_config(config_dir, force).map(|_| ()),
        }
    }
}

fn show_config(config_dir: &Path, config: &AppConfig) -> Result<()> {
    println!("# config dir: {}", config_dir.display());
    print!("{}", config.to_toml().context("Failed to render configuration")?);

    if let Err(problems) = config.validate() {
        println!();
        for problem in problems {
            println!("\x1b[33m⚠ {problem}\x1b[0m");
        }
    }
    Ok(())
}

/// Write the built-in defaults to `<config_dir>/default.toml`.
pub fn init_config(config_dir: &Path, force: bool) -> Result<PathBuf> {
    let path = config_dir.join("default.toml");

    if path.exists() && !force {
        println!(
            "\x1b[33m⚠ {} already exists (use --force to overwrite)\x1b[0m",
            path.display()
        );
        return Ok(path);
    }

    std::fs::create_dir_all(config_dir)
        .with_context(|| format!("Failed to create {}", config_dir.display()))?;
    let rendered = AppConfig::default()
        .to_toml()
        .context("Failed to render default configuration")?;
    std::fs::write(&path, rendered).with_context(|| format!("Failed to write {}", path.display()))?;

    println!("\x1b[32m✓ Wrote {}\x1b[0m", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn init_writes_loadable_defaults() {
        let dir = tempdir().unwrap();
        let config_dir = dir.path().join("config");

        let path = init_config(&config_dir, false).unwrap();
        assert!(path.exists());

        let loaded = AppConfig::load_from(&config_dir).unwrap();
        assert_eq!(loaded.run.subset_size, 11000);
    }

    #[test]
    fn init_keeps_existing_file_without_force() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("default.toml"), "[run]\nmax_steps = 7\n").unwrap();

        init_config(dir.path(), false).unwrap();
        let kept = std::fs::read_to_string(dir.path().join("default.toml")).unwrap();
        assert_eq!(kept, "[run]\nmax_steps = 7\n");

        init_config(dir.path(), true).unwrap();
        let loaded = AppConfig::load_from(dir.path()).unwrap();
        assert_eq!(loaded.run.max_steps, 500);
    }
}
