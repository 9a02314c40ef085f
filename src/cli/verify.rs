//! `duo-kaggle verify`

use std::path::PathBuf;

use crate::config::AppConfig;
use crate::error::Result;
use crate::process::SystemRunner;
use crate::verify::{Verifier, VerifyReport};

pub async fn run_verify(config: &AppConfig, dir: Option<PathBuf>) -> Result<VerifyReport> {
    let root = match dir {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };
    let runner = SystemRunner;

    Verifier::new(root, config.trainer.python.clone(), &runner)
        .run()
        .await
}
