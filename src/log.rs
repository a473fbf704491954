// src/log.rs
// File logging for a run: `tracing` events go to `<namespace>/debug.log`,
// stamped with time since start-up. `RUST_LOG` overrides the default `info`.

use std::{
    fs::OpenOptions,
    io,
    path::{Path, PathBuf},
    sync::Mutex,
    time::Instant,
};

use thiserror::Error;
use tracing_subscriber::{
    fmt::{format::Writer, layer, time::FormatTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

use crate::{config::consts::LOG_FILE, file::ensure_directory};

#[derive(Debug, Error)]
pub enum LogError {
    #[error("cannot open log file {path}: {source}")]
    Open { path: PathBuf, source: io::Error },
    #[error("logging already initialized: {0}")]
    Install(String),
}

fn fmt_elapsed(ms: u128) -> String {
    let total_ms = ms as u64;
    let h = total_ms / 3_600_000;
    let m = (total_ms % 3_600_000) / 60_000;
    let s = (total_ms % 60_000) / 1_000;
    let ms = total_ms % 1_000;
    format!("{h:02}:{m:02}:{s:02}.{ms:03}")
}

/// `hh:mm:ss.mmm` since the subscriber was installed.
struct Uptime(Instant);

impl FormatTime for Uptime {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        write!(w, "[{}]", fmt_elapsed(self.0.elapsed().as_millis()))
    }
}

/// Install the global subscriber. Returns the log file path.
pub fn init(namespace: &Path) -> Result<PathBuf, LogError> {
    let path = namespace.join(LOG_FILE);
    let open = |source: io::Error| LogError::Open { path: path.clone(), source };

    ensure_directory(namespace).map_err(open)?;
    let file = OpenOptions::new().create(true).append(true).open(&path).map_err(open)?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let file_layer = layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .with_timer(Uptime(Instant::now()))
        .with_filter(filter);

    tracing_subscriber::registry()
        .with(file_layer)
        .try_init()
        .map_err(|e| LogError::Install(e.to_string()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_is_zero_padded() {
        assert_eq!(fmt_elapsed(0), "00:00:00.000");
        assert_eq!(fmt_elapsed(3_723_004), "01:02:03.004");
    }
}
