//! Environment variables consumed by the DUO dataloader and wandb.

use crate::config::RunConfig;

/// Subset size read by the patched dataloader.
pub const SUBSET_ENV_VAR: &str = "OWT_SUBSET_NUM";
pub const WANDB_MODE_VAR: &str = "WANDB_MODE";
pub const WANDB_OFFLINE: &str = "offline";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainingEnv {
    pub subset_num: String,
    pub wandb_mode: String,
}

impl TrainingEnv {
    pub fn from_run(run: &RunConfig) -> Self {
        Self {
            subset_num: run.subset_size.to_string(),
            wandb_mode: WANDB_OFFLINE.to_string(),
        }
    }

    pub fn vars(&self) -> [(&'static str, &str); 2] {
        [
            (SUBSET_ENV_VAR, self.subset_num.as_str()),
            (WANDB_MODE_VAR, self.wandb_mode.as_str()),
        ]
    }

    /// Export into this process so spawned children inherit the values.
    ///
    /// Must run before any worker threads are started; the CLI uses a
    /// current-thread runtime.
    pub fn apply(&self) {
        for (key, value) in self.vars() {
            std::env::set_var(key, value);
            tracing::debug!("Exported {}={}", key, value);
        }
    }
}

/// Set `OWT_SUBSET_NUM` and confirm the same string reads back.
pub fn subset_roundtrip(value: &str) -> Option<String> {
    std::env::set_var(SUBSET_ENV_VAR, value);
    std::env::var(SUBSET_ENV_VAR).ok().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_run_formats_decimal_subset() {
        let run = RunConfig {
            subset_size: 11000,
            ..RunConfig::default()
        };
        let env = TrainingEnv::from_run(&run);
        assert_eq!(
            env.vars(),
            [("OWT_SUBSET_NUM", "11000"), ("WANDB_MODE", "offline")]
        );
    }

    #[test]
    fn roundtrip_returns_exact_string() {
        for value in ["1", "1000", "11000", "18446744073709551615"] {
            assert_eq!(subset_roundtrip(value).as_deref(), Some(value));
        }
    }
}
