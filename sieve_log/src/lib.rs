//! Process-wide tracing setup for sieve binaries.
use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::Level;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{fmt, layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter, Registry};

/// Handle for changing the active filter after [`init`].
pub type LevelHandle = reload::Handle<EnvFilter, Registry>;

/// Log file prefix inside the log directory.
pub const LOG_FILE: &str = "sieve.log";

fn filter_for(level: Level) -> EnvFilter {
    EnvFilter::default().add_directive(level.into())
}

/// Install structured JSON logging. With `dir` set, events go to an hourly
/// rolling file there; otherwise to stderr.
pub fn init(dir: Option<&Path>, level: Level) -> Result<LevelHandle> {
    let writer = match dir {
        Some(dir) => {
            let appender = RollingFileAppender::builder()
                .rotation(Rotation::HOURLY)
                .filename_prefix(LOG_FILE)
                .build(dir)
                .with_context(|| format!("open log directory {}", dir.display()))?;
            BoxMakeWriter::new(appender)
        }
        None => BoxMakeWriter::new(io::stderr),
    };
    let (filter, handle) = reload::Layer::new(filter_for(level));
    let fmt_layer = fmt::layer()
        .with_writer(writer)
        .json()
        .with_current_span(false)
        .with_span_list(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .context("tracing subscriber already installed")?;
    Ok(handle)
}

/// Swap the level at runtime.
pub fn set_level(handle: &LevelHandle, level: Level) -> Result<()> {
    handle.reload(filter_for(level)).context("reload log filter")
}
