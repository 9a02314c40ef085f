//! Locate, copy or clone the DUO training repository.
//!
//! Resolution order:
//! 1. the starting directory, when it already holds `main.py` and `dataloader.py`
//! 2. a mounted Kaggle dataset (`repo.input_dir`), copied into the working dir
//! 3. an earlier checkout at `<working_dir>/<clone_dir>`
//! 4. a fresh `git clone`, which needs manual patching and therefore a confirmation

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::config::RepoConfig;
use crate::console;
use crate::error::{DuoError, Result};
use crate::process::{CommandRunner, CommandSpec};
use crate::prompt::Confirm;

/// Files whose presence marks a directory as a DUO checkout.
pub const MARKER_FILES: [&str; 2] = ["main.py", "dataloader.py"];

/// Where the usable checkout came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoSource {
    AlreadyPresent,
    CopiedFromInput { from: PathBuf },
    ExistingCheckout,
    Cloned,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Acquisition {
    Ready { root: PathBuf, source: RepoSource },
    /// The user declined to continue with an unpatched clone.
    Aborted,
}

pub fn is_duo_root(dir: &Path) -> bool {
    MARKER_FILES.iter().all(|marker| dir.join(marker).exists())
}

pub async fn acquire(
    start_dir: &Path,
    repo: &RepoConfig,
    runner: &dyn CommandRunner,
    confirm: &dyn Confirm,
) -> Result<Acquisition> {
    if is_duo_root(start_dir) {
        console::ok("Already in DUO directory");
        console::detail(format!("Working directory: {}", start_dir.display()));
        return Ok(Acquisition::Ready {
            root: start_dir.to_path_buf(),
            source: RepoSource::AlreadyPresent,
        });
    }

    let dest = repo.checkout_dir();

    if repo.input_dir.exists() {
        console::ok(format!("Found DUO in {}", repo.input_dir.display()));
        if dest.exists() {
            warn!("{} already exists, reusing it", dest.display());
            console::detail(format!("Reusing existing copy at {}", dest.display()));
        } else {
            console::step("Copying to working directory...");
            copy_dir_recursive(&repo.input_dir, &dest)?;
            info!("Copied {} to {}", repo.input_dir.display(), dest.display());
        }
        console::ok(format!("Working directory: {}", dest.display()));
        return Ok(Acquisition::Ready {
            root: dest,
            source: RepoSource::CopiedFromInput {
                from: repo.input_dir.clone(),
            },
        });
    }

    console::warn("Cloning original repository (requires manual patching)");

    if dest.exists() {
        info!("Using existing checkout at {}", dest.display());
        console::ok(format!("Working directory: {}", dest.display()));
        return Ok(Acquisition::Ready {
            root: dest,
            source: RepoSource::ExistingCheckout,
        });
    }

    console::step(format!("Cloning {}", repo.url));
    fs::create_dir_all(&repo.working_dir)?;
    clone(repo, runner).await?;

    console::ok("Repository cloned");
    println!();
    console::warn("IMPORTANT: You need to apply the modifications:");
    console::detail(" 1. Update dataloader.py for subset support");
    console::detail(" 2. Update models/dit.py to make FlashAttention optional");
    println!();

    if !confirm.confirm("Continue anyway?")? {
        println!("Exiting. Please apply modifications and run again.");
        return Ok(Acquisition::Aborted);
    }

    console::ok(format!("Working directory: {}", dest.display()));
    Ok(Acquisition::Ready {
        root: dest,
        source: RepoSource::Cloned,
    })
}

async fn clone(repo: &RepoConfig, runner: &dyn CommandRunner) -> Result<()> {
    let spec = CommandSpec::new("git")
        .args(["clone", repo.url.as_str(), repo.clone_dir.as_str()])
        .current_dir(&repo.working_dir);

    info!("Cloning {} into {}", repo.url, repo.checkout_dir().display());

    let output = match runner.output(&spec).await {
        Ok(output) => output,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(DuoError::ToolMissing("git".to_string()));
        }
        Err(e) => return Err(e.into()),
    };

    if !output.success() {
        console::fail("Failed to clone repository");
        println!("{}", output.stderr);
        return Err(DuoError::CloneFailed {
            url: repo.url.clone(),
            stderr: output.stderr.trim().to_string(),
        });
    }

    Ok(())
}

/// Copy `src` into a new directory `dst`.
///
/// Symlinks are recreated as links and never followed, so a link cycle in
/// the mounted dataset cannot recurse forever.
pub fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    fs::create_dir_all(dst)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let path = entry.path();
        let target = dst.join(entry.file_name());
        let file_type = entry.file_type()?;
        if file_type.is_symlink() {
            copy_symlink(&path, &target)?;
        } else if file_type.is_dir() {
            copy_dir_recursive(&path, &target)?;
        } else {
            fs::copy(&path, &target)?;
        }
    }
    Ok(())
}

#[cfg(unix)]
fn copy_symlink(link: &Path, target: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(fs::read_link(link)?, target)
}

#[cfg(not(unix))]
fn copy_symlink(link: &Path, _target: &Path) -> std::io::Result<()> {
    warn!("Skipping symlink {}", link.display());
    Ok(())
}
