use once_cell::sync::OnceCell;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Environment variable controlling the log filter, such as
/// `SFNAV_LOG=sfnav=debug`.
pub const LOG_ENV: &str = "SFNAV_LOG";

static INITIALIZED: OnceCell<()> = OnceCell::new();

/// Install the global tracing subscriber. With a log directory, output goes
/// to a daily-rolled file through a non-blocking writer; keep the returned
/// guard alive for the life of the process or buffered lines are lost.
/// Subsequent calls are no-ops.
pub fn init(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    if INITIALIZED.set(()).is_err() {
        return None;
    }

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

    if let Some(dir) = log_dir {
        if let Err(e) = std::fs::create_dir_all(dir) {
            eprintln!(
                "Warning: cannot create log directory {}: {e}; logging to stderr",
                dir.display()
            );
        } else {
            let appender = tracing_appender::rolling::daily(dir, "helper.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();
            return Some(guard);
        }
    }

    tracing_subscriber::fmt().with_env_filter(filter).init();
    None
}
