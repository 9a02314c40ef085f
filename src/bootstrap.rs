//! End-to-end Kaggle training bootstrap.
//!
//! Stages run strictly in order and each one either continues or stops the
//! run. Installer failures, missing patch markers and missing artifacts are
//! only warnings; everything else is fatal.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::collect::{self, Artifacts, METRICS_TAIL_ROWS};
use crate::config::AppConfig;
use crate::console;
use crate::environment::{TrainingEnv, SUBSET_ENV_VAR};
use crate::error::{DuoError, Result};
use crate::gpu;
use crate::install::{self, InstallOutcome};
use crate::preflight::{self, MarkerReport, DATALOADER, TRAIN_REQUIRED_FILES};
use crate::process::CommandRunner;
use crate::prompt::Confirm;
use crate::repo::{self, Acquisition, RepoSource};
use crate::results::{self, RunSummary, SavedResults};
use crate::split::split_counts;
use crate::trainer;

/// What a finished bootstrap produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub root: PathBuf,
    pub source: RepoSource,
    /// `None` when installation was skipped.
    pub install: Option<InstallOutcome>,
    /// Dataloader carries the subset-loading patch.
    pub subset_patched: bool,
    pub summary: RunSummary,
    pub saved: SavedResults,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapOutcome {
    Completed(Box<RunReport>),
    /// Declined to continue with an unpatched clone.
    Aborted,
}

impl BootstrapOutcome {
    /// Process exit code. A declined prompt is a deliberate stop, not a failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Completed(_) | Self::Aborted => 0,
        }
    }
}

pub struct Bootstrap<'a> {
    config: &'a AppConfig,
    start_dir: PathBuf,
    runner: &'a dyn CommandRunner,
    confirm: &'a dyn Confirm,
    skip_install: bool,
}

impl<'a> Bootstrap<'a> {
    pub fn new(
        config: &'a AppConfig,
        start_dir: impl Into<PathBuf>,
        runner: &'a dyn CommandRunner,
        confirm: &'a dyn Confirm,
    ) -> Self {
        Self {
            config,
            start_dir: start_dir.into(),
            runner,
            confirm,
            skip_install: false,
        }
    }

    pub fn skip_install(mut self, skip: bool) -> Self {
        self.skip_install = skip;
        self
    }

    pub async fn run(&self) -> Result<BootstrapOutcome> {
        console::banner("DUO Training on Kaggle");
        println!();
        self.print_configuration();

        self.check_gpu().await?;

        let (root, source) = match self.setup_repository().await? {
            Acquisition::Ready { root, source } => (root, source),
            Acquisition::Aborted => {
                info!("Bootstrap aborted at repository confirmation");
                return Ok(BootstrapOutcome::Aborted);
            }
        };

        let install = self.install_dependencies().await?;
        let subset_patched = self.verify_setup(&root)?;
        self.configure_environment();
        self.train(&root).await?;

        let artifacts = self.check_results(&root)?;
        let (summary, saved) = self.save_results(&artifacts)?;
        self.print_summary();

        Ok(BootstrapOutcome::Completed(Box::new(RunReport {
            root,
            source,
            install,
            subset_patched,
            summary,
            saved,
        })))
    }

    fn print_configuration(&self) {
        let run = &self.config.run;
        let (train, val) = split_counts(run.subset_size);

        println!("Configuration:");
        console::detail(format!("Subset size: {} documents", run.subset_size));
        console::detail(format!("Expected train: ~{train} examples"));
        console::detail(format!("Expected val: ~{val} examples"));
        console::detail(format!("Batch size: {}", run.batch_size));
        console::detail(format!("Sequence length: {}", run.sequence_length));
        console::detail(format!("Max steps: {}", run.max_steps));
        console::detail(format!("Precision: FP{}", run.precision));
        println!();
    }

    async fn check_gpu(&self) -> Result<()> {
        println!("Step 1: Checking GPU availability...");
        match gpu::probe_gpu(self.runner).await {
            Ok(status) => {
                console::ok("GPU detected");
                for line in &status.header {
                    console::detail(line);
                }
                println!();
                Ok(())
            }
            Err(e) => {
                console::fail(e.to_string());
                Err(e)
            }
        }
    }

    async fn setup_repository(&self) -> Result<Acquisition> {
        println!("Step 2: Setting up repository...");
        println!();
        console::warn("IMPORTANT: This bootstrap expects the modified DUO code to be uploaded");
        console::detail(format!(
            "  to your Kaggle notebook as a Dataset at {}",
            self.config.repo.input_dir.display()
        ));
        println!();
        console::detail("The code needs the following modifications:");
        console::detail("1. dataloader.py - OpenWebText subset support");
        console::detail("2. models/dit.py - FlashAttention made optional");
        println!();
        console::detail("If you haven't uploaded the modified code, please do one of:");
        console::detail("a) Upload the patched DUO directory as a Kaggle Dataset");
        console::detail("b) Clone from your own fork with modifications");
        console::detail("c) Apply the patches manually after cloning");
        println!();

        let acquisition =
            repo::acquire(&self.start_dir, &self.config.repo, self.runner, self.confirm).await;
        if let Err(ref e) = acquisition {
            console::fail(e.to_string());
        }
        println!();
        acquisition
    }

    async fn install_dependencies(&self) -> Result<Option<InstallOutcome>> {
        println!("Step 3: Installing dependencies...");
        if self.skip_install {
            console::warn("Skipping installation (--skip-install)");
            println!();
            return Ok(None);
        }

        println!("(This may take 5-10 minutes)");
        println!(
            "Installing {} packages...",
            self.config.install.packages.len()
        );

        let outcome = install::install_packages(&self.config.install, self.runner).await?;
        match outcome {
            InstallOutcome::Installed => console::ok("All packages installed"),
            InstallOutcome::Failed { ref excerpt } => {
                console::warn("Some packages may have failed");
                if !excerpt.is_empty() {
                    println!("{excerpt}");
                }
            }
        }
        println!();
        Ok(Some(outcome))
    }

    /// Returns whether the dataloader carries the subset patch.
    fn verify_setup(&self, root: &Path) -> Result<bool> {
        println!("Step 4: Verifying setup...");

        let subset_patched = match preflight::scan_markers(&root.join(DATALOADER), &[SUBSET_ENV_VAR]) {
            Ok(MarkerReport::FileMissing { .. }) => {
                console::fail(format!("{DATALOADER} not found"));
                return Err(DuoError::MissingFiles(vec![DATALOADER.to_string()]));
            }
            Ok(report) if report.all_found() => {
                console::ok("Dataloader supports subset loading");
                true
            }
            Err(e) => {
                console::warn(format!("Could not read {DATALOADER}: {e}"));
                warn!("Skipping subset-patch check: {}", e);
                false
            }
            Ok(_) => {
                console::warn("Dataloader may need modification for subset loading");
                console::detail("The training will still work but will use full dataset");
                warn!("{} lacks the subset-loading patch", DATALOADER);
                false
            }
        };

        let files = preflight::check_files(root, &TRAIN_REQUIRED_FILES);
        for (path, exists) in &files.entries {
            if *exists {
                console::ok(path);
            } else {
                console::fail(format!("{path} not found"));
            }
        }

        if !files.all_found() {
            console::fail("Required files missing");
            return Err(DuoError::MissingFiles(files.missing()));
        }

        println!();
        Ok(subset_patched)
    }

    fn configure_environment(&self) {
        println!("Step 5: Configuring environment...");
        let env = TrainingEnv::from_run(&self.config.run);
        env.apply();
        for (key, value) in env.vars() {
            console::ok(format!("{key}={value}"));
        }
        println!();
    }

    async fn train(&self, root: &Path) -> Result<()> {
        console::banner("Step 6: Starting training...");
        println!();

        let spec = trainer::training_command(&self.config.trainer, &self.config.run, root);
        println!("Command:");
        println!("{}", trainer::render_multiline(&spec));
        println!();

        info!("Starting training in {}", root.display());
        if let Err(e) = trainer::run_training(&spec, self.runner).await {
            println!();
            console::fail(format!("Training failed ({e})"));
            return Err(e);
        }

        println!();
        console::ok("Training completed!");
        println!();
        Ok(())
    }

    fn check_results(&self, root: &Path) -> Result<Artifacts> {
        console::banner("Step 7: Checking results...");
        println!();

        let artifacts = Artifacts::discover(root)?;

        if artifacts.checkpoints.is_empty() {
            console::warn("No checkpoints found");
            warn!("No checkpoints under {}", root.join(collect::LOGS_DIR).display());
        } else {
            console::ok(format!(
                "Found {} checkpoint(s):",
                artifacts.checkpoints.len()
            ));
            println!("{}", artifacts.checkpoint_table());
            if let Some(latest) = artifacts.latest_checkpoint(self.config.output.latest_by) {
                println!();
                println!("Latest checkpoint: {}", latest.rel);
            }
        }
        println!();

        match artifacts.metrics_file() {
            Some((rel, path)) => {
                console::ok(format!("Found metrics file: {rel}"));
                match collect::metrics_tail(path, METRICS_TAIL_ROWS) {
                    Ok(Some(table)) => {
                        println!();
                        println!("Last {METRICS_TAIL_ROWS} training steps:");
                        println!("{table}");
                    }
                    Ok(None) => console::detail("(metrics file is empty)"),
                    Err(e) => warn!("Could not read {}: {}", rel, e),
                }
            }
            None => console::warn("No metrics file found"),
        }
        println!();

        Ok(artifacts)
    }

    fn save_results(&self, artifacts: &Artifacts) -> Result<(RunSummary, SavedResults)> {
        console::banner("Step 8: Saving results...");
        println!();

        let latest = artifacts.latest_checkpoint(self.config.output.latest_by);
        let summary = RunSummary::new(&self.config.run, latest);
        let output_dir = &self.config.output.dir;
        let saved = results::save_results(output_dir, &summary, latest, artifacts)?;

        if let Some(ref path) = saved.checkpoint {
            console::ok(format!("Checkpoint saved to: {}", path.display()));
        }
        if let Some(ref path) = saved.metrics {
            console::ok(format!("Metrics saved to: {}", path.display()));
        }
        console::ok(format!("Configuration saved to: {}", saved.summary.display()));
        println!();

        Ok((summary, saved))
    }

    fn print_summary(&self) {
        let run = &self.config.run;
        let output_dir = self.config.output.dir.display();

        console::banner("TRAINING COMPLETE!");
        println!();
        println!("Summary:");
        console::detail(format!("Total steps: {}", run.max_steps));
        console::detail(format!(
            "Dataset: OpenWebText subset ({} documents)",
            run.subset_size
        ));
        console::detail(format!("Results saved to: {output_dir}"));
        println!();
        println!("Next steps:");
        console::detail("1. Evaluate: python main.py mode=ppl_eval ...");
        console::detail("2. Generate: python main.py mode=sample_eval ...");
        console::detail(format!("3. Download checkpoint from {output_dir}/"));
        println!();
        console::rule();
    }
}
