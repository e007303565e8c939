use super::config::{LogFormat, LogLevel};
use std::sync::Once;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("Invalid log filter '{filter}': {source}")]
    InvalidFilter {
        filter: String,
        #[source]
        source: tracing_subscriber::filter::ParseError,
    },
    #[error("Failed to set global tracing subscriber: {0}")]
    SetGlobal(#[from] tracing::subscriber::SetGlobalDefaultError),
    #[error("Logging system initialization failed")]
    AlreadyFailed,
}

/// Dependencies whose own logs are kept at `warn` unless overridden.
const QUIET_TARGETS: &[&str] = &["hyper", "hyper_util", "reqwest", "h2", "rustls"];

/// Filter string: the default level followed by one directive per quiet target.
pub fn build_filter_string(level: LogLevel) -> String {
    let mut parts = Vec::with_capacity(QUIET_TARGETS.len() + 1);
    parts.push(level.as_str().to_string());
    for target in QUIET_TARGETS {
        parts.push(format!("{target}=warn"));
    }
    parts.join(",")
}

/// Installs the global subscriber once. `RUST_LOG` takes precedence over the
/// configured level when set.
pub fn setup_logging(level: LogLevel, format: LogFormat) -> Result<(), LoggingError> {
    static INIT: Once = Once::new();
    static INIT_SUCCESS: AtomicBool = AtomicBool::new(false);

    let mut result = Ok(());
    INIT.call_once(|| {
        result = install(level, format);
        INIT_SUCCESS.store(result.is_ok(), Ordering::SeqCst);
    });

    match result {
        Err(e) => Err(e),
        Ok(()) if INIT_SUCCESS.load(Ordering::SeqCst) => Ok(()),
        Ok(()) => Err(LoggingError::AlreadyFailed),
    }
}

fn install(level: LogLevel, format: LogFormat) -> Result<(), LoggingError> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => {
            let filter = build_filter_string(level);
            EnvFilter::try_new(&filter)
                .map_err(|source| LoggingError::InvalidFilter { filter, source })?
        }
    };

    let (compact, json) = match format {
        LogFormat::Compact => (
            Some(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            ),
            None,
        ),
        LogFormat::Json => (
            None,
            Some(
                fmt::layer()
                    .with_target(true)
                    .with_writer(std::io::stderr)
                    .json(),
            ),
        ),
    };

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(compact)
        .with(json);

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_filter_string() {
        let filter = build_filter_string(LogLevel::Debug);

        assert!(filter.starts_with("debug,"));
        assert!(filter.contains("hyper=warn"));
        assert!(filter.contains("reqwest=warn"));
        assert!(EnvFilter::try_new(&filter).is_ok());
    }
}
