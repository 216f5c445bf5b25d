use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use log::info;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};

use crate::live::{MessageMode, StreamConfig};
use crate::storage::errors::StorageError;
use crate::storage::models::StoredStreamConfig;

/// Keeps the history of stream configs so the last one can be offered again.
pub struct StorageClient {
    conn: Mutex<Connection>,
}

impl StorageClient {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let conn = Connection::open(&path)?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StorageError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS stream_configs (
                id INTEGER PRIMARY KEY,
                viewer_target INTEGER NOT NULL,
                message_mode TEXT NOT NULL,
                custom_message_style TEXT NOT NULL DEFAULT '',
                purpose TEXT NOT NULL,
                location TEXT NOT NULL,
                activity_description TEXT NOT NULL,
                host_name TEXT NOT NULL,
                saved_at INTEGER NOT NULL
            )",
            [],
        )?;

        info!("Database schema created or updated successfully");

        Ok(StorageClient {
            conn: Mutex::new(conn),
        })
    }

    pub fn save_stream_config(&self, config: &StreamConfig) -> Result<i64, StorageError> {
        let query = "INSERT INTO stream_configs
                     (viewer_target, message_mode, custom_message_style, purpose, location, activity_description, host_name, saved_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)";

        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(query)?;
        stmt.execute(params![
            config.viewer_target,
            config.message_mode.to_string(),
            config.custom_message_style,
            config.purpose,
            config.location,
            config.activity_description,
            config.host_name,
            Utc::now().timestamp(),
        ])?;
        Ok(conn.last_insert_rowid())
    }

    pub fn last_stream_config(&self) -> Result<Option<StoredStreamConfig>, StorageError> {
        let query = "SELECT id, viewer_target, message_mode, custom_message_style, purpose, location, activity_description, host_name, saved_at
                     FROM stream_configs ORDER BY id DESC LIMIT 1";

        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(query)?;
        let row = stmt
            .query_row([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, u32>(1)?,
                    row.get::<_, String>(2)?,
                    StreamConfig {
                        viewer_target: 0,
                        message_mode: MessageMode::Positive,
                        custom_message_style: row.get(3)?,
                        purpose: row.get(4)?,
                        location: row.get(5)?,
                        activity_description: row.get(6)?,
                        host_name: row.get(7)?,
                    },
                    row.get::<_, i64>(8)?,
                ))
            })
            .optional()?;

        let Some((id, viewer_target, mode, mut config, saved_at)) = row else {
            return Ok(None);
        };

        config.viewer_target = viewer_target;
        config.message_mode = MessageMode::from_str(&mode)
            .map_err(|_| StorageError::InvalidValue { column: "message_mode", value: mode.clone() })?;

        Ok(Some(StoredStreamConfig {
            id,
            config,
            saved_at: DateTime::from_timestamp(saved_at, 0).unwrap_or_else(Utc::now),
        }))
    }
}
