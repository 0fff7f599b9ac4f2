use crate::error::ProbeError;
use std::path::Path;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

/// Log file name inside the log directory
pub const LOG_FILE_NAME: &str = "visionprobe.log";

/// Transport crates that are noisy at debug level
const QUIET_TARGETS: &[&str] = &["hyper", "reqwest", "h2", "actix_server", "mio"];

/// Filter directives for a base level, keeping transport internals at warn
pub fn filter_directives(log_level: &str) -> String {
    let level = match log_level.trim().to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" | "off" => log_level.trim().to_lowercase(),
        "warning" => "warn".to_string(),
        _ => "info".to_string(),
    };

    let mut directives = vec![level];
    directives.extend(QUIET_TARGETS.iter().map(|t| format!("{}=warn", t)));
    directives.join(",")
}

fn env_filter(log_level: &str) -> EnvFilter {
    // RUST_LOG takes precedence
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter_directives(log_level)))
}

/// Initialize logging for the UI server
///
/// Console output goes to stderr, a plain-text copy is appended to
/// `<log_dir>/visionprobe.log`.
pub fn setup_logging(log_dir: &Path, log_level: &str) -> Result<(), ProbeError> {
    std::fs::create_dir_all(log_dir).map_err(|e| {
        ProbeError::config(format!(
            "Failed to create log directory {}: {}",
            log_dir.display(),
            e
        ))
    })?;

    let log_file_path = log_dir.join(LOG_FILE_NAME);
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file_path)
        .map_err(|e| {
            ProbeError::config(format!(
                "Failed to open log file {}: {}",
                log_file_path.display(),
                e
            ))
        })?;

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .with_filter(env_filter(log_level));

    let file_layer = fmt::layer()
        .with_writer(log_file)
        .with_target(true)
        .with_thread_ids(true)
        .with_ansi(false)
        .with_span_events(FmtSpan::CLOSE)
        .with_filter(env_filter(log_level));

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| ProbeError::config(format!("Failed to initialize logging: {}", e)))?;

    tracing::info!("Logging initialized: level={}, log_file={}", log_level, log_file_path.display());

    Ok(())
}

/// Console-only logging for one-shot CLI commands
///
/// Writes to stderr so command output on stdout stays clean.
pub fn setup_console_logging(log_level: &str) -> Result<(), ProbeError> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .with_env_filter(env_filter(log_level))
        .try_init()
        .map_err(|e| ProbeError::config(format!("Failed to initialize logging: {}", e)))?;

    Ok(())
}
