use clap::Parser;
use duo_kaggle::bootstrap::BootstrapOutcome;
use duo_kaggle::cli::{self, Cli, Commands};
use duo_kaggle::config::AppConfig;
use duo_kaggle::error::{DuoError, Result};
use std::process::ExitCode;
use tracing::{error, info};

mod main_runtime;

// Single-threaded: the bootstrap exports env vars for the trainer it spawns.
#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match AppConfig::load_from(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("\x1b[31m✗ Configuration error: {e}\x1b[0m");
            return ExitCode::FAILURE;
        }
    };
    if let Commands::Train(ref args) = cli.command {
        args.apply(&mut config);
    }

    main_runtime::init_logging(&config.logging);

    match run(cli, config).await {
        Ok(code) => code,
        Err(e) => {
            error!("{}", e);
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

async fn run(cli: Cli, config: AppConfig) -> Result<ExitCode> {
    match cli.command {
        Commands::Train(args) => {
            config.validate().map_err(DuoError::InvalidConfig)?;
            let outcome = cli::train::run_train(&config, &args).await?;
            match outcome {
                BootstrapOutcome::Completed(ref report) => {
                    info!("Run finished, results in {}", report.saved.summary.display());
                }
                BootstrapOutcome::Aborted => info!("Run aborted by user"),
            }
            Ok(ExitCode::from(outcome.exit_code() as u8))
        }
        Commands::Verify { dir } => {
            let report = cli::verify::run_verify(&config, dir).await?;
            if !report.all_passed() {
                info!("Failed checks: {}", report.failed().join(", "));
            }
            Ok(ExitCode::from(report.exit_code() as u8))
        }
        Commands::Config(cmd) => {
            cmd.run(&cli.config, &config)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
