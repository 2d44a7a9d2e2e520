use std::path::{Path, PathBuf};

use directories::BaseDirs;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const LOG_FILE: &str = "vitals.log";

/// Keeps the background log writer alive; drop it last.
pub struct LoggingGuard {
    _guard: WorkerGuard,
}

/// The terminal is in raw mode while we run, so everything goes to a file.
/// `level` wins over `RUST_LOG`, which wins over `fallback`.
pub fn init(level: Option<&str>, fallback: &str, log_file: Option<&Path>) -> Option<LoggingGuard> {
    let log_path = match log_file {
        Some(path) => path.to_path_buf(),
        None => default_log_dir()?.join(LOG_FILE),
    };
    let dir = match log_path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).ok()?;
    let file_name = log_path.file_name()?;

    let file_appender = tracing_appender::rolling::never(dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = match level {
        Some(level) => EnvFilter::new(filter_for(level)),
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(filter_for(fallback))),
    };

    let subscriber = tracing_subscriber::registry().with(env_filter).with(
        tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_target(true)
            .with_line_number(true),
    );

    if subscriber.try_init().is_err() {
        return None;
    }

    tracing::info!(log_path = %log_path.display(), "tracing initialized");

    Some(LoggingGuard { _guard: guard })
}

/// A bare level applies to this crate only; anything else is passed
/// through as a filter directive.
fn filter_for(level: &str) -> String {
    match level.to_ascii_lowercase().as_str() {
        l @ ("trace" | "debug" | "info" | "warn" | "error" | "off") => format!("vitals={l}"),
        _ => level.to_string(),
    }
}

fn default_log_dir() -> Option<PathBuf> {
    let preferred = BaseDirs::new().map(|dirs| dirs.cache_dir().join("vitals"));
    let fallback = std::env::temp_dir().join("vitals");
    preferred
        .into_iter()
        .chain(std::iter::once(fallback))
        .find(|dir| std::fs::create_dir_all(dir).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("debug", "vitals=debug")]
    #[case("WARN", "vitals=warn")]
    #[case("vitals::input=trace", "vitals::input=trace")]
    fn test_filter_for(#[case] level: &str, #[case] expected: &str) {
        assert_eq!(filter_for(level), expected);
    }
}
