pub mod bootstrap;
pub mod cli;
pub mod collect;
pub mod config;
pub mod console;
pub mod environment;
pub mod error;
pub mod gpu;
pub mod install;
pub mod preflight;
pub mod probe;
pub mod process;
pub mod prompt;
pub mod repo;
pub mod results;
pub mod split;
pub mod trainer;
pub mod verify;

pub use bootstrap::{Bootstrap, BootstrapOutcome, RunReport};
pub use config::AppConfig;
pub use error::{DuoError, Result};
pub use process::{CommandOutput, CommandRunner, CommandSpec, SystemRunner};
pub use prompt::{AssumeYes, Confirm, StdinConfirm};
pub use verify::{Verifier, VerifyReport};
