//! SQLite-backed user and chat store.
//!
//! Tables:
//! - `users`: email (primary key), name, password_hash, salt, auth_method, created_at
//! - `user_activity`: append-only audit log (login/logout/chat_saved)
//! - `chat_messages`: per-user chat history keyed by (user_email, chat_id)
//!
//! The `users.email` primary key uses SQLite's default BINARY collation, so
//! uniqueness is case-sensitive — `Child@example.com` and `child@example.com`
//! are distinct accounts.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::Connection;
use std::path::Path;

use crate::chat::{ChatMessage, ChatStore, ChatSummary, Role};
use crate::store::{AuthMethod, EventKind, StoreError, UserRecord, UserStore};

/// SQLite store. One connection guarded by a mutex; WAL mode keeps
/// concurrent readers cheap.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database at the given path.
    pub fn open(db_path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(db_path)?;

        // WAL mode for concurrent reads + crash safety
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys = ON;",
        )?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS users (
                email TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                password_hash TEXT NOT NULL,
                salt TEXT NOT NULL,
                auth_method TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS user_activity (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_email TEXT NOT NULL,
                activity_type TEXT NOT NULL,
                metadata TEXT NOT NULL,
                timestamp TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_activity_user ON user_activity(user_email);

            CREATE TABLE IF NOT EXISTS chat_messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_email TEXT NOT NULL,
                chat_id TEXT NOT NULL,
                role TEXT NOT NULL,
                content TEXT NOT NULL,
                timestamp TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_chat_user ON chat_messages(user_email, chat_id);",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Count registered users.
    pub fn user_count(&self) -> Result<u64, StoreError> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Recorded activity for a user, newest first (admin/debug use).
    pub fn activity(&self, email: &str) -> Result<Vec<(String, serde_json::Value)>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT activity_type, metadata FROM user_activity
             WHERE user_email = ?1 ORDER BY id DESC",
        )?;
        let rows = stmt
            .query_map(rusqlite::params![email], |row| {
                let kind: String = row.get(0)?;
                let metadata: String = row.get(1)?;
                Ok((kind, metadata))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows
            .into_iter()
            .map(|(kind, metadata)| {
                let value =
                    serde_json::from_str(&metadata).unwrap_or(serde_json::Value::Null);
                (kind, value)
            })
            .collect())
    }
}

impl UserStore for SqliteStore {
    fn put_user(&self, record: &UserRecord) -> Result<(), StoreError> {
        let conn = self.conn.lock();
        let result = conn.execute(
            "INSERT INTO users (email, name, password_hash, salt, auth_method, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                record.email,
                record.name,
                record.password_hash,
                record.salt,
                record.auth_method.as_str(),
                record.created_at,
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(StoreError::DuplicateEmail(record.email.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn get_user(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        let conn = self.conn.lock();
        let row = conn.query_row(
            "SELECT email, name, password_hash, salt, auth_method, created_at
             FROM users WHERE email = ?1",
            rusqlite::params![email],
            |row| {
                let auth_method: String = row.get(4)?;
                Ok(UserRecord {
                    email: row.get(0)?,
                    name: row.get(1)?,
                    password_hash: row.get(2)?,
                    salt: row.get(3)?,
                    auth_method: AuthMethod::from_str_lossy(&auth_method),
                    created_at: row.get(5)?,
                })
            },
        );

        match row {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn record_event(
        &self,
        email: &str,
        kind: EventKind,
        metadata: serde_json::Value,
    ) -> Result<(), StoreError> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO user_activity (user_email, activity_type, metadata, timestamp)
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![email, kind.as_str(), metadata.to_string(), Utc::now()],
        )?;
        Ok(())
    }
}

impl ChatStore for SqliteStore {
    fn save_message(
        &self,
        email: &str,
        chat_id: &str,
        message: &ChatMessage,
    ) -> Result<(), StoreError> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO chat_messages (user_email, chat_id, role, content, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
                email,
                chat_id,
                message.role.as_str(),
                message.content,
                message.timestamp,
            ],
        )?;
        Ok(())
    }

    fn chat_history(&self, email: &str, chat_id: &str) -> Result<Vec<ChatMessage>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT role, content, timestamp FROM chat_messages
             WHERE user_email = ?1 AND chat_id = ?2 ORDER BY id ASC",
        )?;
        let messages = stmt
            .query_map(rusqlite::params![email, chat_id], |row| {
                let role: String = row.get(0)?;
                Ok(ChatMessage {
                    role: Role::from_str_lossy(&role),
                    content: row.get(1)?,
                    timestamp: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(messages)
    }

    fn list_chats(&self, email: &str) -> Result<Vec<ChatSummary>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT chat_id, MAX(timestamp) FROM chat_messages
             WHERE user_email = ?1 GROUP BY chat_id ORDER BY MAX(timestamp) DESC",
        )?;
        let chats = stmt
            .query_map(rusqlite::params![email], |row| {
                let last_activity: DateTime<Utc> = row.get(1)?;
                Ok(ChatSummary {
                    chat_id: row.get(0)?,
                    last_activity,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(chats)
    }

    fn delete_chat(&self, email: &str, chat_id: &str) -> Result<(), StoreError> {
        let conn = self.conn.lock();
        conn.execute(
            "DELETE FROM chat_messages WHERE user_email = ?1 AND chat_id = ?2",
            rusqlite::params![email, chat_id],
        )?;
        Ok(())
    }
}
