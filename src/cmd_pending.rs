//! `pending` subcommand.

use chrono::Utc;

use courier_config::{Config, ConfigLoader};
use courier_protocols::MessageStore;
use courier_store::SqliteMessageStore;

use crate::cli::OutputFormat;

/// Print the messages recovery would schedule, plus the overdue count.
pub(crate) async fn list_pending(
    config: &Config,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = SqliteMessageStore::open(ConfigLoader::expand_path(&config.database.path)).await?;
    let now = Utc::now();
    let pending = store.list_due_at_or_after(now).await?;
    let overdue = store.count_overdue(now).await?;

    match format {
        OutputFormat::Json => {
            let out = serde_json::json!({
                "pending": pending,
                "overdue": overdue,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputFormat::Table => {
            println!("{:<10} {:<8} {:<27} TITLE", "ID", "APP", "DUE");
            for message in &pending {
                let due = message
                    .postponed_at
                    .map(|at| at.to_rfc3339())
                    .unwrap_or_default();
                println!(
                    "{:<10} {:<8} {:<27} {}",
                    message.id, message.application_id, due, message.title
                );
            }
            println!();
            println!("{} pending, {} overdue", pending.len(), overdue);
        }
    }

    Ok(())
}
