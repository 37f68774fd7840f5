// Logging setup shared by the server and CLI binaries
//
// Console layer plus an optional daily-rolling file layer, both non-blocking.
// The returned guards must stay alive for the life of the process or buffered
// log lines are lost on exit.

use anyhow::Result;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

pub const DEFAULT_FILTER: &str = "solscan=info,tower_http=info";
pub const LOG_FILE_NAME: &str = "solscan.log";

/// Keeps the non-blocking writers flushing
pub struct LogGuards {
    _guards: Vec<WorkerGuard>,
}

/// `RUST_LOG` if it parses, otherwise `fallback`
pub fn env_filter(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

pub fn init_logging(config: &LoggingConfig) -> Result<LogGuards> {
    let (console_writer, console_guard) = non_blocking(std::io::stdout());
    let console_layer = fmt::layer()
        .with_writer(console_writer)
        .with_target(false)
        .with_ansi(true);

    let mut guards = vec![console_guard];

    let file_layer = if config.file_logging {
        match std::fs::create_dir_all(&config.directory) {
            Ok(()) => {
                let appender = rolling::daily(&config.directory, LOG_FILE_NAME);
                let (file_writer, file_guard) = non_blocking(appender);
                guards.push(file_guard);
                Some(
                    fmt::layer()
                        .with_writer(file_writer)
                        .with_target(true)
                        .with_ansi(false)
                        .with_file(true)
                        .with_line_number(true),
                )
            }
            Err(e) => {
                eprintln!(
                    "Failed to create log directory {}: {} (file logging disabled)",
                    config.directory.display(),
                    e
                );
                None
            }
        }
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(env_filter(DEFAULT_FILTER))
        .with(console_layer)
        .with(file_layer)
        .try_init()?;

    Ok(LogGuards { _guards: guards })
}
