//! SQLite message store.

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use tokio_rusqlite::Connection;
use tracing::debug;

use courier_protocols::{
    Application, ApplicationDirectory, ApplicationId, DirectoryError, Extras, Message, MessageId,
    MessageStore, NewMessage, StoreError, UserId,
};

use crate::schema::init_schema;

const MESSAGE_COLUMNS: &str =
    "id, application_id, title, message, priority, extras, date, postponed_at";

/// SQLite-backed message store and application directory.
pub struct SqliteMessageStore {
    conn: Connection,
}

impl SqliteMessageStore {
    /// Create a new in-memory database.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| StoreError::ConnectionError(e.to_string()))?;
        Self::init(conn).await
    }

    /// Open (or create) a file-backed database.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::ConnectionError(e.to_string()))?;
        }
        debug!("Opening message store at {}", path.display());
        let conn = Connection::open(path)
            .await
            .map_err(|e| StoreError::ConnectionError(e.to_string()))?;
        Self::init(conn).await
    }

    async fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.call(|conn| Ok(init_schema(conn)?))
            .await
            .map_err(|e| StoreError::QueryError(e.to_string()))?;
        Ok(Self { conn })
    }

    /// Register an application, replacing one with the same id.
    pub async fn add_application(&self, application: Application) -> Result<(), StoreError> {
        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT OR REPLACE INTO applications (id, user_id, name, default_priority)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![
                        application.id.get() as i64,
                        application.user_id.get() as i64,
                        application.name,
                        application.default_priority
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(|e| StoreError::QueryError(e.to_string()))
    }

    /// Forget an application. Its messages are kept.
    pub async fn remove_application(&self, id: ApplicationId) -> Result<bool, StoreError> {
        self.conn
            .call(move |conn| {
                let removed = conn.execute("DELETE FROM applications WHERE id = ?1", [id.get() as i64])?;
                Ok(removed > 0)
            })
            .await
            .map_err(|e| StoreError::QueryError(e.to_string()))
    }

    async fn query_messages(
        &self,
        filter: &'static str,
        arg: i64,
    ) -> Result<Vec<Message>, StoreError> {
        let rows = self
            .conn
            .call(move |conn| {
                let sql = format!("SELECT {} FROM messages WHERE {}", MESSAGE_COLUMNS, filter);
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt
                    .query_map([arg], MessageRow::from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(|e| StoreError::QueryError(e.to_string()))?;

        rows.into_iter().map(MessageRow::into_message).collect()
    }
}

/// A `messages` row before timestamps and extras are decoded.
struct MessageRow {
    id: i64,
    application_id: i64,
    title: String,
    message: String,
    priority: i32,
    extras: Option<String>,
    date: i64,
    postponed_at: Option<i64>,
}

impl MessageRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            application_id: row.get(1)?,
            title: row.get(2)?,
            message: row.get(3)?,
            priority: row.get(4)?,
            extras: row.get(5)?,
            date: row.get(6)?,
            postponed_at: row.get(7)?,
        })
    }

    fn into_message(self) -> Result<Message, StoreError> {
        let extras = self
            .extras
            .map(|raw| serde_json::from_str::<Extras>(&raw))
            .transpose()?;
        let postponed_at = self.postponed_at.map(from_millis).transpose()?;

        Ok(Message {
            id: MessageId(self.id as u64),
            application_id: ApplicationId(self.application_id as u64),
            title: self.title,
            message: self.message,
            priority: self.priority,
            extras,
            date: from_millis(self.date)?,
            postponed_at,
        })
    }
}

fn from_millis(millis: i64) -> Result<DateTime<Utc>, StoreError> {
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| StoreError::SerializationError(format!("timestamp out of range: {}", millis)))
}

fn application_from_row(row: &Row<'_>) -> rusqlite::Result<Application> {
    let id: i64 = row.get(0)?;
    let user_id: i64 = row.get(1)?;
    Ok(Application {
        id: ApplicationId(id as u64),
        user_id: UserId(user_id as u64),
        name: row.get(2)?,
        default_priority: row.get(3)?,
    })
}

#[async_trait]
impl MessageStore for SqliteMessageStore {
    async fn get(&self, id: MessageId) -> Result<Option<Message>, StoreError> {
        let row = self
            .conn
            .call(move |conn| {
                let sql = format!("SELECT {} FROM messages WHERE id = ?1", MESSAGE_COLUMNS);
                let row = conn
                    .query_row(&sql, [id.get() as i64], MessageRow::from_row)
                    .optional()?;
                Ok(row)
            })
            .await
            .map_err(|e| StoreError::QueryError(e.to_string()))?;

        row.map(MessageRow::into_message).transpose()
    }

    async fn list_due_at_or_after(&self, instant: DateTime<Utc>) -> Result<Vec<Message>, StoreError> {
        self.query_messages(
            "postponed_at IS NOT NULL AND postponed_at >= ?1 ORDER BY postponed_at, id",
            instant.timestamp_millis(),
        )
        .await
    }

    async fn count_overdue(&self, instant: DateTime<Utc>) -> Result<u64, StoreError> {
        let millis = instant.timestamp_millis();
        self.conn
            .call(move |conn| {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM messages WHERE postponed_at IS NOT NULL AND postponed_at < ?1",
                    [millis],
                    |row| row.get(0),
                )?;
                Ok(count as u64)
            })
            .await
            .map_err(|e| StoreError::QueryError(e.to_string()))
    }

    async fn list_by_application(&self, application_id: ApplicationId) -> Result<Vec<Message>, StoreError> {
        self.query_messages("application_id = ?1 ORDER BY id", application_id.get() as i64)
            .await
    }

    async fn set_postponement(
        &self,
        id: MessageId,
        postponed_at: Option<DateTime<Utc>>,
    ) -> Result<(), StoreError> {
        let millis = postponed_at.map(|at| at.timestamp_millis());
        let updated = self
            .conn
            .call(move |conn| {
                let updated = conn.execute(
                    "UPDATE messages SET postponed_at = ?1 WHERE id = ?2",
                    params![millis, id.get() as i64],
                )?;
                Ok(updated)
            })
            .await
            .map_err(|e| StoreError::QueryError(e.to_string()))?;

        if updated == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn create(
        &self,
        application_id: ApplicationId,
        message: NewMessage,
        date: DateTime<Utc>,
    ) -> Result<Message, StoreError> {
        let extras = message.extras.as_ref().map(serde_json::to_string).transpose()?;
        let priority = message.priority.unwrap_or_default();
        let postponed_at = message.postponed_at.map(|at| at.timestamp_millis());
        let title = message.title.clone();
        let body = message.message.clone();

        let id = self
            .conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO messages (application_id, title, message, priority, extras, date, postponed_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    params![
                        application_id.get() as i64,
                        title,
                        body,
                        priority,
                        extras,
                        date.timestamp_millis(),
                        postponed_at
                    ],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await
            .map_err(|e| StoreError::QueryError(e.to_string()))?;

        // Read back so callers see the stored precision.
        self.get(MessageId(id as u64))
            .await?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn delete(&self, id: MessageId) -> Result<(), StoreError> {
        self.conn
            .call(move |conn| {
                conn.execute("DELETE FROM messages WHERE id = ?1", [id.get() as i64])?;
                Ok(())
            })
            .await
            .map_err(|e| StoreError::QueryError(e.to_string()))
    }

    async fn delete_by_application(&self, application_id: ApplicationId) -> Result<u64, StoreError> {
        self.conn
            .call(move |conn| {
                let removed = conn.execute(
                    "DELETE FROM messages WHERE application_id = ?1",
                    [application_id.get() as i64],
                )?;
                Ok(removed as u64)
            })
            .await
            .map_err(|e| StoreError::QueryError(e.to_string()))
    }
}

#[async_trait]
impl ApplicationDirectory for SqliteMessageStore {
    async fn applications_owned_by(&self, user_id: UserId) -> Result<Vec<Application>, DirectoryError> {
        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, user_id, name, default_priority
                     FROM applications WHERE user_id = ?1 ORDER BY id",
                )?;
                let apps = stmt
                    .query_map([user_id.get() as i64], application_from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(apps)
            })
            .await
            .map_err(|e| DirectoryError::LookupFailed(e.to_string()))
    }

    async fn get_application(
        &self,
        application_id: ApplicationId,
    ) -> Result<Option<Application>, DirectoryError> {
        self.conn
            .call(move |conn| {
                let app = conn
                    .query_row(
                        "SELECT id, user_id, name, default_priority FROM applications WHERE id = ?1",
                        [application_id.get() as i64],
                        application_from_row,
                    )
                    .optional()?;
                Ok(app)
            })
            .await
            .map_err(|e| DirectoryError::LookupFailed(e.to_string()))
    }
}

#[cfg(test)]
#[path = "sqlite_tests.rs"]
mod tests;
