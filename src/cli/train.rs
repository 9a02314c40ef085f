//! `duo-kaggle train`

use crate::bootstrap::{Bootstrap, BootstrapOutcome};
use crate::config::AppConfig;
use crate::error::Result;
use crate::process::SystemRunner;
use crate::prompt::{AssumeYes, Confirm, StdinConfirm};

use super::TrainArgs;

pub async fn run_train(config: &AppConfig, args: &TrainArgs) -> Result<BootstrapOutcome> {
    let start_dir = std::env::current_dir()?;
    let runner = SystemRunner;
    let confirm: &dyn Confirm = if args.yes { &AssumeYes } else { &StdinConfirm };

    Bootstrap::new(config, start_dir, &runner, confirm)
        .skip_install(args.skip_install)
        .run()
        .await
}
