//! `run` subcommand: host the scheduler until interrupted.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use courier_config::{Config, ConfigLoader, ConfigValidator};
use courier_scheduler::Scheduler;
use courier_store::SqliteMessageStore;
use courier_stream::StreamHub;

/// Open the store, recover pending deliveries and serve until Ctrl-C.
pub(crate) async fn run(config: Config, stats_interval: u64) -> Result<(), Box<dyn std::error::Error>> {
    info!("Starting Courier v{}", env!("CARGO_PKG_VERSION"));

    let validation = ConfigValidator::validate(&config);
    for warning in &validation.warnings {
        warn!("Config {}: {}", warning.path, warning.message);
    }
    if let Some(error) = validation.errors.first() {
        return Err(format!("Invalid config {}: {}", error.path, error.message).into());
    }

    let db_path = ConfigLoader::expand_path(&config.database.path);
    let store = Arc::new(SqliteMessageStore::open(&db_path).await?);
    info!("Message store opened at {}", db_path.display());

    let hub = Arc::new(StreamHub::new(config.stream.channel_capacity));
    let scheduler = Scheduler::with_tokio_engine(
        store.clone(),
        store.clone(),
        hub.clone(),
        config.scheduler.max_pending_jobs,
    );

    if config.scheduler.recover_on_start {
        let report = scheduler.recover_all().await?;
        info!(
            "Recovered {} postponed message(s) ({} failed, {} overdue skipped)",
            report.scheduled, report.failed, report.overdue_skipped
        );
    } else {
        warn!("Startup recovery disabled, persisted postponements are not scheduled");
    }

    info!("Courier ready, press Ctrl-C to stop");
    wait_for_shutdown(&scheduler, &hub, stats_interval).await;

    scheduler.shutdown();
    info!("Courier stopped");
    Ok(())
}

async fn wait_for_shutdown(scheduler: &Scheduler, hub: &StreamHub, stats_interval: u64) {
    if stats_interval == 0 {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
        }
        return;
    }

    let mut ticker = tokio::time::interval(Duration::from_secs(stats_interval));
    ticker.tick().await;
    loop {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    warn!("Failed to listen for Ctrl-C: {}", e);
                }
                info!("Shutdown signal received");
                return;
            }
            _ = ticker.tick() => {
                let stats = scheduler.stats();
                let stream = hub.stats();
                info!(
                    "Scheduler: {} pending, {} delivered, {} cancelled, {} failed; streams: {} user(s), {} pushed, {} dropped",
                    scheduler.pending_jobs(),
                    stats.delivered,
                    stats.cancelled,
                    stats.failed,
                    stream.users,
                    stream.delivered,
                    stream.dropped
                );
            }
        }
    }
}
