use std::path::Path;

use anyhow::Result;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Initialize the logging system with tracing.
///
/// `RUST_LOG` wins when set. Otherwise `verbose` picks debug or info for
/// the piano crates. If `log_dir` is provided, logs also go to a daily file.
pub fn init_logging(log_dir: Option<&Path>, verbose: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("cam_piano=debug,piano_keys=debug,hand_pose=debug,warn")
        } else {
            EnvFilter::new("cam_piano=info,piano_keys=info,hand_pose=info,warn")
        }
    });

    let registry = tracing_subscriber::registry().with(filter);

    if let Some(dir) = log_dir {
        let file_appender = RollingFileAppender::new(Rotation::DAILY, dir, "cam_piano.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        // The writer thread must outlive main; init_logging runs once.
        std::mem::forget(guard);

        registry
            .with(fmt::layer().with_target(true))
            .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
            .try_init()?;
    } else {
        registry.with(fmt::layer().with_target(true)).try_init()?;
    }

    Ok(())
}
