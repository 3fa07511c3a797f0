//! Logging setup
//!
//! The terminal UI owns the terminal, so in that mode logs go to a daily rolling
//! file instead of stderr. Headless mode logs to stderr and keeps stdout for
//! state output.

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::config::LogConfig;

const LOG_FILE_PREFIX: &str = "eqplayer";
const DEFAULT_FILTER: &str = "eqplayer=debug,symphonia=warn,warn";

/// Initialize the logging system.
///
/// File logs land in `<dir>/eqplayer.YYYY-MM-DD.log`. The level can be
/// controlled via the `RUST_LOG` environment variable.
///
/// Default log levels:
/// - `eqplayer` modules: DEBUG
/// - `symphonia`: WARN (it is chatty about probing)
/// - Other crates: WARN
pub fn init_logging(config: &LogConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    if config.to_file {
        std::fs::create_dir_all(&config.dir)?;
        let file_appender = RollingFileAppender::new(Rotation::DAILY, &config.dir, LOG_FILE_PREFIX);

        // Non-blocking so a slow disk never stalls the runtime
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        // The guard flushes on drop; keep it for the life of the process
        Box::leak(Box::new(guard));

        let fmt_layer = fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_target(true)
            .with_span_events(FmtSpan::CLOSE);

        tracing_subscriber::registry().with(filter).with(fmt_layer).try_init()?;
        tracing::info!("Logging initialized - logs written to {}/", config.dir.display());
    } else {
        let fmt_layer = fmt::layer().with_writer(std::io::stderr).with_target(true);
        tracing_subscriber::registry().with(filter).with(fmt_layer).try_init()?;
        tracing::debug!("Logging initialized on stderr");
    }

    Ok(())
}

/// Log the outcome of an orchestrator command
#[macro_export]
macro_rules! log_command_result {
    ($command:expr, $result:expr) => {
        match &$result {
            Ok(_) => tracing::debug!(command = %$command, "Command applied"),
            Err(e) => tracing::warn!(command = %$command, error = %e, "Command rejected"),
        }
    };
}
