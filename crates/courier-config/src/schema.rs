//! Configuration schema definitions.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub scheduler: SchedulerConfig,

    #[serde(default)]
    pub stream: StreamConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Message database configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite database file. `~` and `${VAR}` are expanded.
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> String {
    "~/.courier/courier.db".to_string()
}

/// Deferred-delivery scheduler configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Upper bound on timers pending at once; further schedule requests fail.
    #[serde(default = "default_max_pending_jobs")]
    pub max_pending_jobs: usize,

    /// Re-register postponed messages from the database at startup.
    #[serde(default = "default_true")]
    pub recover_on_start: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_pending_jobs: default_max_pending_jobs(),
            recover_on_start: true,
        }
    }
}

fn default_max_pending_jobs() -> usize {
    100_000
}

fn default_true() -> bool {
    true
}

/// Live push configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Per-user broadcast buffer; slow subscribers lag past this many messages.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
        }
    }
}

fn default_channel_capacity() -> usize {
    64
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Directory for rotated log files.
    #[serde(default = "default_log_dir")]
    pub dir: String,

    #[serde(default = "default_max_log_files")]
    pub max_log_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            dir: default_log_dir(),
            max_log_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_dir() -> String {
    "~/.courier/logs".to_string()
}

fn default_max_log_files() -> usize {
    14
}
