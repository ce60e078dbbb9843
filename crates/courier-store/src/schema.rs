//! Database schema management.

use rusqlite::Connection;
use tokio_rusqlite::Error;

/// Initialize the database schema.
pub fn init_schema(conn: &Connection) -> Result<(), Error> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

// Instants are stored as milliseconds since the Unix epoch.
const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS applications (
    id INTEGER PRIMARY KEY,
    user_id INTEGER NOT NULL,
    name TEXT NOT NULL,
    default_priority INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS messages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    application_id INTEGER NOT NULL,
    title TEXT NOT NULL,
    message TEXT NOT NULL,
    priority INTEGER NOT NULL DEFAULT 0,
    extras TEXT,
    date INTEGER NOT NULL,
    postponed_at INTEGER
);

CREATE INDEX IF NOT EXISTS idx_applications_user ON applications(user_id);
CREATE INDEX IF NOT EXISTS idx_messages_application ON messages(application_id);
CREATE INDEX IF NOT EXISTS idx_messages_postponed ON messages(postponed_at)
    WHERE postponed_at IS NOT NULL;
"#;
