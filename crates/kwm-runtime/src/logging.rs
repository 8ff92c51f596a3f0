#![forbid(unsafe_code)]

//! Optional global subscriber for hosts that have none of their own.
//!
//! Every module logs through `tracing` under `kwm.*` targets. Embedding
//! applications usually install their own subscriber; [`init`] is a
//! convenience for tools and demos. The filter comes from `KWM_LOG`
//! (falling back to `RUST_LOG`, then [`DEFAULT_FILTER`]).

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Filter used when neither `KWM_LOG` nor `RUST_LOG` is set.
pub const DEFAULT_FILTER: &str = "warn,kwm=info";

/// Output format of the installed subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human readable, one line per event.
    #[default]
    Compact,
    /// Newline-delimited JSON.
    Json,
}

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("invalid log filter: {0}")]
    Filter(#[from] tracing_subscriber::filter::ParseError),
    #[error("a global subscriber is already installed")]
    AlreadyInstalled(#[from] tracing_subscriber::util::TryInitError),
}

/// Resolve the filter directive from the environment.
#[must_use]
pub fn filter_directive() -> String {
    std::env::var("KWM_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| DEFAULT_FILTER.to_string())
}

/// Install a global subscriber writing to stderr.
pub fn init(format: LogFormat) -> Result<(), LoggingError> {
    init_with_filter(format, &filter_directive())
}

/// Like [`init`] with an explicit filter directive.
pub fn init_with_filter(format: LogFormat, directive: &str) -> Result<(), LoggingError> {
    let filter = EnvFilter::try_new(directive)?;
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Compact => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_writer(std::io::stderr),
            )
            .try_init()?,
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init()?,
    }
    tracing::debug!(target: "kwm.logging", ?format, directive, "subscriber installed");
    Ok(())
}
