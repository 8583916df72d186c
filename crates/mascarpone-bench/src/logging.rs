use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::dispatcher::SetGlobalDefaultError;
use tracing::{Dispatch, Level};
use tracing_appender::non_blocking::{NonBlockingBuilder, WorkerGuard};
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::{LoggingConfig, ResolvedOutputs};

/// Crates whose events are written to the telemetry file unless `RUST_LOG` says otherwise.
const TELEMETRY_TARGETS: [&str; 3] = ["mascarpone_core", "mascarpone_bot", "mascarpone_bench"];

const TELEMETRY_FILE: &str = "telemetry.jsonl";

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("failed to create telemetry directory {path}: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to create telemetry file {path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid tracing filter: {0}")]
    Filter(#[from] ParseError),
    #[error("another tracing subscriber is installed; nothing would reach {path}")]
    AlreadyInstalled {
        path: PathBuf,
        #[source]
        source: SetGlobalDefaultError,
    },
}

/// Open telemetry file. Dropping it flushes the background writer.
pub struct TelemetryLog {
    _guard: WorkerGuard,
    pub path: PathBuf,
}

/// Routes engine, bot and bench events to `telemetry.jsonl` beside the summary.
pub fn init_logging(
    logging: &LoggingConfig,
    outputs: &ResolvedOutputs,
) -> Result<Option<TelemetryLog>, LoggingError> {
    if !logging.enable_structured {
        return Ok(None);
    }

    let filter = telemetry_filter(logging)?;
    let (dispatch, log) = telemetry_dispatch(filter, outputs)?;
    tracing::dispatcher::set_global_default(dispatch).map_err(|source| {
        LoggingError::AlreadyInstalled {
            path: log.path.clone(),
            source,
        }
    })?;
    Ok(Some(log))
}

/// `RUST_LOG` wins when set; otherwise only the mascarpone crates are kept, at the
/// configured level.
pub fn telemetry_filter(logging: &LoggingConfig) -> Result<EnvFilter, LoggingError> {
    match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(directives) if !directives.trim().is_empty() => Ok(EnvFilter::try_new(directives)?),
        _ => Ok(target_filter(logging.level().unwrap_or(Level::INFO))?),
    }
}

pub fn target_filter(level: Level) -> Result<EnvFilter, ParseError> {
    let level = level.as_str().to_ascii_lowercase();
    let directives = TELEMETRY_TARGETS
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",");
    EnvFilter::try_new(directives)
}

fn telemetry_dispatch(
    filter: EnvFilter,
    outputs: &ResolvedOutputs,
) -> Result<(Dispatch, TelemetryLog), LoggingError> {
    let dir = outputs
        .summary_md
        .parent()
        .map(Path::to_path_buf)
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from("."));
    fs::create_dir_all(&dir).map_err(|source| LoggingError::Directory {
        path: dir.clone(),
        source,
    })?;

    let path = dir.join(TELEMETRY_FILE);
    let file = File::create(&path).map_err(|source| LoggingError::File {
        path: path.clone(),
        source,
    })?;
    let (writer, guard) = NonBlockingBuilder::default().lossy(false).finish(file);

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .json()
        .with_current_span(false)
        .with_span_events(FmtSpan::NONE)
        .with_writer(writer)
        .finish();

    Ok((
        Dispatch::new(subscriber),
        TelemetryLog {
            _guard: guard,
            path,
        },
    ))
}
