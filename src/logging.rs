//! Tracing subscriber setup.
//!
//! The terminal belongs to the UI, so log output goes to a file.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_FILTER: &str = "info";

/// `<cache_dir>/bt/bt.log`, if the platform has a cache directory.
pub fn default_log_path() -> Option<PathBuf> {
    dirs::cache_dir().map(|d| d.join("bt").join("bt.log"))
}

/// Install the global subscriber writing to `path` (or the default location).
///
/// Returns the log file path on success. Any failure leaves logging disabled.
pub fn init(path: Option<&Path>) -> Option<PathBuf> {
    let path = path.map(Path::to_path_buf).or_else(default_log_path)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).ok()?;
    }
    let file = File::create(&path).ok()?;
    build_subscriber(file).try_init().ok()?;
    Some(path)
}

/// Subscriber writing plain-text events to `log_file`, filtered by `RUST_LOG`.
pub fn build_subscriber(log_file: File) -> impl tracing::Subscriber + Send + Sync {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let fmt_layer = fmt::layer()
        .with_writer(Arc::new(log_file))
        .with_ansi(false);

    tracing_subscriber::registry().with(fmt_layer).with(env_filter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn events_are_written_to_file() {
        let log_file = NamedTempFile::new().unwrap();
        let subscriber = build_subscriber(log_file.reopen().unwrap());

        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!(path = "/tmp/x", "reload failed");
        });

        let contents = fs::read_to_string(log_file.path()).unwrap();
        assert!(contents.contains("WARN"));
        assert!(contents.contains("reload failed"));
        assert!(!contents.contains("\u{1b}["));
    }

    #[test]
    fn default_path_ends_with_app_dir() {
        if let Some(path) = default_log_path() {
            assert!(path.ends_with("bt/bt.log"));
        }
    }
}
