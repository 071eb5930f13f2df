//! rotolog CLI - demo driver for the rotating log file writer
//!
//! Pumps a stream of generated log lines through a [`RotatingWriter`] so the
//! rotation behavior can be observed on disk: run it, then look at the target
//! directory to see the live file plus the numbered backups
//! (`test_1.log`, `test_2.log`, ...) produced as the size limit is hit.
//!
//! ## Examples
//!
//! ```bash
//! # A thousand lines into logs/test.log, rotating every 3 KiB, keeping 15 backups
//! rotolog
//!
//! # Custom target and limits
//! rotolog --path /tmp/demo/app.log --max-size-kb 1 --max-backups 4 --lines 200
//!
//! # Take the writer settings from a config file instead
//! rotolog --config rotolog.yaml
//! ```

use anyhow::Result;
use clap::Parser;
use rotolog::{Config, RotatingWriter, KILOBYTE};
use std::path::PathBuf;
use tracing::{debug, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Demo driver for the rotating log file writer", long_about = None)]
struct Cli {
    /// Path of the live log file
    #[arg(long, default_value = "logs/test.log")]
    path: String,

    /// Maximum file size in KiB before rotation
    #[arg(long, default_value_t = 3)]
    max_size_kb: u64,

    /// Number of numbered backups to retain
    #[arg(long, default_value_t = 15)]
    max_backups: u64,

    /// Number of log lines to emit
    #[arg(long, default_value_t = 1000)]
    lines: usize,

    /// Load writer settings from a JSON or YAML file (overrides the flags above)
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config {
            path: cli.path.clone(),
            max_size: cli.max_size_kb * KILOBYTE,
            max_backups: cli.max_backups,
        },
    };

    let writer = RotatingWriter::new(config)?;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer.clone()),
        )
        .init();

    for i in 0..cli.lines {
        // Vary level and length a little so rotation points move around.
        match i % 7 {
            0 => warn!(id = i, "something worth a second look happened"),
            1 | 2 => debug!(id = i, "verbose detail line padding out the file with extra text"),
            _ => info!(id = i, "steady stream of application output"),
        }
    }

    writer.close()?;
    Ok(())
}
