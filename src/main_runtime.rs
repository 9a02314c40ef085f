use std::path::{Path, PathBuf};

use duo_kaggle::config::LoggingConfig;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

pub fn init_logging(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},duo_kaggle={}", logging.level, logging.level)));

    // File logging is opt-in: logging.dir or DUO_LOG_DIR.
    let log_dir = logging
        .dir
        .clone()
        .or_else(|| std::env::var("DUO_LOG_DIR").ok().map(PathBuf::from));

    let file_layer = log_dir.as_deref().and_then(|dir| {
        if !dir_is_writable(dir) {
            eprintln!(
                "Warning: Could not write to log directory {}, file logging disabled",
                dir.display()
            );
            return None;
        }

        let file_appender = tracing_appender::rolling::daily(dir, "duo-kaggle.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        // Keep the guard alive for the rest of the process
        Box::leak(Box::new(guard));

        Some(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false) // No color codes in file
                .with_target(true),
        )
    });

    // Status lines own stdout; diagnostics go to stderr.
    let (json_layer, console_layer) = if logging.json {
        (
            Some(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            ),
            None,
        )
    } else {
        (
            None,
            Some(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            ),
        )
    };

    let file_logging_enabled = file_layer.is_some();
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(json_layer)
        .with(file_layer)
        .try_init();

    if let (true, Some(dir)) = (file_logging_enabled, log_dir) {
        eprintln!("Logging to: {}/duo-kaggle.log", dir.display());
    }
}

// `tracing_appender::rolling::daily` panics if it cannot create the initial
// file, so probe writability first.
fn dir_is_writable(dir: &Path) -> bool {
    if std::fs::create_dir_all(dir).is_err() {
        return false;
    }
    let test_path = dir.join(".duo_write_test");
    match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&test_path)
    {
        Ok(_) => {
            let _ = std::fs::remove_file(&test_path);
            true
        }
        Err(_) => false,
    }
}
