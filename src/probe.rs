//! Python package importability checks.

use crate::process::{CommandRunner, CommandSpec};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Package {
    /// Importable module name
    pub module: &'static str,
    pub display: &'static str,
    pub required: bool,
}

impl Package {
    const fn required(module: &'static str, display: &'static str) -> Self {
        Self {
            module,
            display,
            required: true,
        }
    }

    const fn optional(module: &'static str, display: &'static str) -> Self {
        Self {
            module,
            display,
            required: false,
        }
    }
}

/// Packages the DUO trainer imports. FlashAttention has a fallback path.
pub const TRAINING_PACKAGES: [Package; 7] = [
    Package::required("torch", "PyTorch"),
    Package::required("transformers", "HuggingFace Transformers"),
    Package::required("datasets", "HuggingFace Datasets"),
    Package::required("pytorch_lightning", "PyTorch Lightning"),
    Package::required("hydra", "Hydra"),
    Package::required("omegaconf", "OmegaConf"),
    Package::optional("flash_attn", "Flash Attention"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportResult {
    pub package: Package,
    pub available: bool,
}

/// True unless a required package failed to import.
pub fn required_available(results: &[ImportResult]) -> bool {
    results
        .iter()
        .all(|r| r.available || !r.package.required)
}

/// Try `<python> -c "import <module>"` for each package.
///
/// A probe that cannot even start counts as unavailable.
pub async fn probe_imports(
    python: &str,
    packages: &[Package],
    runner: &dyn CommandRunner,
) -> Vec<ImportResult> {
    let mut results = Vec::with_capacity(packages.len());
    for &package in packages {
        let spec = CommandSpec::new(python).args(["-c".to_string(), format!("import {}", package.module)]);
        let available = match runner.output(&spec).await {
            Ok(output) => output.success(),
            Err(e) => {
                tracing::debug!("Import probe for {} failed to start: {}", package.module, e);
                false
            }
        };
        results.push(ImportResult { package, available });
    }
    results
}
