use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// `RUST_LOG` directives when given and valid, else everything from debug up
fn build_filter(directives: Option<String>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new("debug"))
}

/// Initialize file logging when YTFETCH_DEBUG is set.
///
/// The terminal belongs to the interactive prompts, so logs only ever go to
/// `<data_dir>/ytfetch/ytfetch.log.<date>`. Keep the guard alive until exit.
pub fn init_logging() -> Option<WorkerGuard> {
    std::env::var_os("YTFETCH_DEBUG")?;

    let log_dir = dirs::data_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("ytfetch");
    let _ = std::fs::create_dir_all(&log_dir);

    let file_appender = tracing_appender::rolling::daily(&log_dir, "ytfetch.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_env_filter(build_filter(std::env::var("RUST_LOG").ok()))
        .init();

    tracing::info!(dir = %log_dir.display(), "ytfetch logging initialized");
    Some(guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::filter::LevelFilter;

    #[test]
    fn test_rust_log_level_is_respected() {
        assert_eq!(build_filter(Some("warn".to_string())).max_level_hint(), Some(LevelFilter::WARN));
        assert_eq!(build_filter(Some("info".to_string())).max_level_hint(), Some(LevelFilter::INFO));
    }

    #[test]
    fn test_defaults_to_debug() {
        assert_eq!(build_filter(None).max_level_hint(), Some(LevelFilter::DEBUG));
    }
}
