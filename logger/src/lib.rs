use std::io;
use std::path::PathBuf;

use thiserror::Error;
use tracing::Subscriber;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::fmt;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::EnvFilter;

pub use config_loader::logging::{LogFormat, LoggingConfig};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoggerError {
    /// The configured filter directive did not parse.
    #[error("invalid log filter '{directive}'")]
    InvalidFilter {
        directive: String,
        #[source]
        source: tracing_subscriber::filter::ParseError,
    },

    /// A global subscriber was already installed, by us or by someone else.
    #[error("a global subscriber is already installed")]
    AlreadyInitialized {
        #[source]
        source: tracing::subscriber::SetGlobalDefaultError,
    },

    #[error("failed to prepare log directory {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Neither the `stdout` nor the `file` destination is available.
    #[error("no log destination enabled")]
    NoDestination,
}

/// Keeps the non-blocking writer's worker alive. Dropping it flushes
/// buffered output, so hold it for the lifetime of the program.
#[derive(Debug)]
pub struct LogGuard {
    _worker: WorkerGuard,
}

/// Build and install the global subscriber.
pub fn init(config: &LoggingConfig) -> Result<LogGuard, LoggerError> {
    let (subscriber, guard) = subscriber(config)?;
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|source| LoggerError::AlreadyInitialized { source })?;
    Ok(guard)
}

/// Build a subscriber without installing it. Useful for scoped setups and
/// tests, where a global default would leak across cases.
pub fn subscriber(
    config: &LoggingConfig,
) -> Result<(Box<dyn Subscriber + Send + Sync>, LogGuard), LoggerError> {
    let filter = build_filter(config)?;
    let (writer, worker) = make_writer(config)?;

    let timer = UtcTime::new(time::macros::format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:3]"
    ));

    let registry = tracing_subscriber::registry().with(filter);
    let subscriber: Box<dyn Subscriber + Send + Sync> =
        match config.format.unwrap_or(LogFormat::Compact) {
            LogFormat::Compact => Box::new(
                registry.with(fmt::layer().compact().with_timer(timer).with_writer(writer)),
            ),
            LogFormat::Pretty => Box::new(
                registry.with(fmt::layer().pretty().with_timer(timer).with_writer(writer)),
            ),
            LogFormat::Json => Box::new(
                registry.with(fmt::layer().json().with_timer(timer).with_writer(writer)),
            ),
        };

    Ok((subscriber, LogGuard { _worker: worker }))
}

fn build_filter(config: &LoggingConfig) -> Result<EnvFilter, LoggerError> {
    match &config.level {
        Some(directive) => {
            EnvFilter::try_new(directive).map_err(|source| LoggerError::InvalidFilter {
                directive: directive.clone(),
                source,
            })
        }
        None => Ok(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))),
    }
}

fn make_writer(config: &LoggingConfig) -> Result<(NonBlocking, WorkerGuard), LoggerError> {
    #[cfg(feature = "file")]
    if let Some(directory) = &config.directory {
        std::fs::create_dir_all(directory).map_err(|source| LoggerError::Io {
            path: directory.clone(),
            source,
        })?;

        let prefix = config.file_prefix.as_deref().unwrap_or("app");
        let appender = tracing_appender::rolling::daily(directory, prefix);
        return Ok(tracing_appender::non_blocking(appender));
    }

    #[cfg(feature = "stdout")]
    return Ok(tracing_appender::non_blocking(io::stdout()));

    #[allow(unreachable_code)]
    {
        let _ = config;
        Err(LoggerError::NoDestination)
    }
}
