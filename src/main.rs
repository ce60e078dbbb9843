//! Courier - notification service with deferred delivery
//!
//! Main entry point for the Courier CLI and scheduler host.

use std::path::{Path, PathBuf};

use clap::Parser;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use courier_config::{Config, ConfigLoader, LoggingConfig};

mod cli;
mod cmd_check;
mod cmd_pending;
mod cmd_run;

use cli::{Cli, Commands};

const DEFAULT_CONFIG: &str = "config/courier.toml";

/// Resolve the configuration file: the explicit path, then
/// `config/courier.toml`, then `~/.courier/courier.toml`.
fn config_path(explicit: Option<PathBuf>) -> PathBuf {
    if let Some(path) = explicit {
        return path;
    }
    let local = PathBuf::from(DEFAULT_CONFIG);
    if local.exists() {
        return local;
    }
    dirs::home_dir()
        .map(|home| home.join(".courier").join("courier.toml"))
        .filter(|path| path.exists())
        .unwrap_or(local)
}

fn load_config(path: &Path) -> Result<Config, Box<dyn std::error::Error>> {
    Ok(ConfigLoader::load_or_default(path)?)
}

/// Initialize tracing with console and file output.
///
/// `RUST_LOG` overrides `logging.level`. Files rotate daily under `logging.dir`.
fn init_tracing(logging: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    let log_dir = ConfigLoader::expand_path(&logging.dir);
    std::fs::create_dir_all(&log_dir)?;

    let mut builder = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("courier")
        .filename_suffix("log");
    if logging.max_log_files > 0 {
        builder = builder.max_log_files(logging.max_log_files);
    }
    let file_appender = builder.build(&log_dir)?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
        std::sync::OnceLock::new();
    let _ = GUARD.set(guard);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true).with_ansi(true))
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let path = config_path(cli.config);

    match cli.command {
        Some(Commands::CheckConfig) => cmd_check::check_config(&path),
        Some(Commands::Pending { format }) => {
            let config = load_config(&path)?;
            cmd_pending::list_pending(&config, format).await
        }
        Some(Commands::Run { stats_interval }) => {
            let config = load_config(&path)?;
            init_tracing(&config.logging)?;
            cmd_run::run(config, stats_interval).await
        }
        None => {
            let config = load_config(&path)?;
            init_tracing(&config.logging)?;
            cmd_run::run(config, 300).await
        }
    }
}
