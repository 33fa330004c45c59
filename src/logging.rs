// src/logging.rs

use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;
use crate::error::DirectoryError;

/// Подключить подписчика tracing. `RUST_LOG` важнее уровня из конфига.
/// Логи идут в stderr или в `log_file`, если он задан.
pub fn init(config: &LoggingConfig) -> Result<(), DirectoryError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.level.to_lowercase()))
        .map_err(|e| DirectoryError::Config(format!("bad log filter '{}': {}", config.level, e)))?;

    let writer = match &config.log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            BoxMakeWriter::new(Mutex::new(file))
        }
        None => BoxMakeWriter::new(std::io::stderr),
    };

    let (json, plain) = if config.enable_json_output {
        (
            Some(fmt::layer().json().with_target(true).flatten_event(true).with_writer(writer)),
            None,
        )
    } else {
        (None, Some(fmt::layer().with_target(false).with_writer(writer)))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(plain)
        .try_init()
        .map_err(|e| DirectoryError::Config(e.to_string()))?;

    tracing::debug!(level = %config.level, json = config.enable_json_output, "logging initialized");
    Ok(())
}

#[cfg(test)]
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("debug")
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_twice() {
        init_test_logging();
        init_test_logging();
    }
}
