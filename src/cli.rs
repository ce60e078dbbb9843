//! CLI definitions for Courier.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Courier CLI.
#[derive(Parser)]
#[command(name = "courier")]
#[command(about = "Notification service with deferred delivery")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "COURIER_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Run the scheduler in foreground (default)
    ///
    /// Recovers persisted postponements and delivers them when due. Creating,
    /// postponing and deleting messages goes through the `courier-core`
    /// library; this command does not accept requests.
    Run {
        /// Log scheduler counters every N seconds (0 disables)
        #[arg(long, default_value_t = 300)]
        stats_interval: u64,
    },

    /// List messages waiting for deferred delivery
    Pending {
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Validate the configuration file
    CheckConfig,
}

#[derive(Clone, Copy, ValueEnum)]
pub(crate) enum OutputFormat {
    Table,
    Json,
}
