//! Training command assembly and invocation.

use std::io::ErrorKind;
use std::path::Path;

use crate::config::{RunConfig, TrainerConfig};
use crate::error::{DuoError, Result};
use crate::process::{CommandRunner, CommandSpec};

/// Hydra overrides for an OpenWebText-subset DUO run on one GPU.
pub fn hydra_overrides(run: &RunConfig) -> Vec<String> {
    vec![
        "mode=train".to_string(),
        "data=openwebtext-split".to_string(),
        "algo=duo_base".to_string(),
        "algo.backbone=hf_dit".to_string(),
        format!("loader.batch_size={}", run.batch_size),
        format!("loader.global_batch_size={}", run.batch_size),
        format!("loader.eval_batch_size={}", run.batch_size),
        format!("model.length={}", run.sequence_length),
        format!("trainer.max_steps={}", run.max_steps),
        "trainer.devices=1".to_string(),
        "trainer.accelerator=gpu".to_string(),
        format!("trainer.precision={}", run.precision),
        "trainer.log_every_n_steps=50".to_string(),
        "trainer.val_check_interval=0.2".to_string(),
        "+wandb.offline=true".to_string(),
    ]
}

pub fn training_command(trainer: &TrainerConfig, run: &RunConfig, root: &Path) -> CommandSpec {
    CommandSpec::new(&trainer.python)
        .arg(&trainer.entry_point)
        .args(hydra_overrides(run))
        .current_dir(root)
}

/// One token per line, continued with a trailing backslash.
pub fn render_multiline(spec: &CommandSpec) -> String {
    spec.argv().join(" \\\n  ")
}

/// Run the trainer with inherited stdio and fail on any non-zero exit.
pub async fn run_training(spec: &CommandSpec, runner: &dyn CommandRunner) -> Result<()> {
    let code = match runner.status(spec).await {
        Ok(code) => code,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(DuoError::ToolMissing(spec.program.clone()));
        }
        Err(e) if e.kind() == ErrorKind::Interrupted => {
            return Err(DuoError::TrainingFailed("interrupted".to_string()));
        }
        Err(e) => return Err(e.into()),
    };

    match code {
        Some(0) => Ok(()),
        Some(code) => Err(DuoError::TrainingFailed(format!("exit code {code}"))),
        None => Err(DuoError::TrainingFailed("terminated by signal".to_string())),
    }
}
