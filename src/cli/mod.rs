//! duo-kaggle CLI
//!
//! Commands:
//! - `duo-kaggle train` - Bootstrap and run a DUO training job
//! - `duo-kaggle verify` - Pre-flight checks for a DUO checkout
//! - `duo-kaggle config` - Configuration management

pub mod config;
pub mod train;
pub mod verify;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::AppConfig;

/// DUO on Kaggle: setup, training and result collection
#[derive(Parser, Debug)]
#[command(name = "duo-kaggle")]
#[command(author, version, about = "Bootstrap and verify DUO training runs on Kaggle")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration directory (default.toml, <DUO_ENV>.toml)
    #[arg(short, long, global = true, env = "DUO_CONFIG_DIR", default_value = "config")]
    pub config: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check GPU, prepare the repository, install deps, train and save results
    Train(TrainArgs),

    /// Verify the DUO checkout and Python environment before training
    Verify {
        /// DUO repository root (defaults to the current directory)
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },

    /// Configuration management
    #[command(subcommand)]
    Config(config::ConfigCommands),
}

#[derive(Args, Debug, Clone, Default)]
pub struct TrainArgs {
    /// Continue with an unpatched clone without asking
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Skip the package installation step
    #[arg(long)]
    pub skip_install: bool,

    /// Total OpenWebText documents (overrides run.subset_size)
    #[arg(long)]
    pub subset_size: Option<u64>,

    #[arg(long)]
    pub batch_size: Option<u32>,

    #[arg(long)]
    pub sequence_length: Option<u32>,

    #[arg(long)]
    pub max_steps: Option<u64>,

    /// Trainer precision: 16, 32 or 64
    #[arg(long)]
    pub precision: Option<u32>,
}

impl TrainArgs {
    /// Layer command-line overrides on top of the loaded configuration.
    pub fn apply(&self, config: &mut AppConfig) {
        let run = &mut config.run;
        if let Some(v) = self.subset_size {
            run.subset_size = v;
        }
        if let Some(v) = self.batch_size {
            run.batch_size = v;
        }
        if let Some(v) = self.sequence_length {
            run.sequence_length = v;
        }
        if let Some(v) = self.max_steps {
            run.max_steps = v;
        }
        if let Some(v) = self.precision {
            run.precision = v;
        }
    }
}
