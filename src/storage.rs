use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use crate::error::{Result, ServiceError};
use crate::models::{Document, UserId};

pub const SCHEMA_VERSION: i64 = 1;

/// On-device key/value store backing the persisted slice of client state.
pub struct Storage {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl Storage {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    ServiceError::OperationFailed(format!(
                        "cannot create {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }
        let conn = Connection::open(path)?;
        let storage = Self {
            conn: Mutex::new(conn),
            path: Some(path.to_path_buf()),
        };
        storage.init()?;
        Ok(storage)
    }

    pub fn open_in_memory() -> Result<Self> {
        let storage = Self {
            conn: Mutex::new(Connection::open_in_memory()?),
            path: None,
        };
        storage.init()?;
        Ok(storage)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        // A poisoned lock only means another call panicked mid-statement;
        // SQLite itself is still consistent.
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn init(&self) -> Result<()> {
        let conn = self.conn();
        let version: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
        if version > SCHEMA_VERSION {
            return Err(ServiceError::OperationFailed(format!(
                "storage schema v{} is newer than supported v{}",
                version, SCHEMA_VERSION
            )));
        }

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE IF NOT EXISTS documents (
                user_id INTEGER PRIMARY KEY,
                file_name TEXT NOT NULL,
                data BLOB NOT NULL,
                uploaded_at TEXT NOT NULL
            );

            PRAGMA user_version = 1;
            "#,
        )?;
        Ok(())
    }

    // --- Key/value operations ---

    pub fn get_raw(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn()
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    pub fn set_raw(&self, key: &str, value: &str) -> Result<()> {
        self.conn().execute(
            "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, datetime('now'))
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get_raw(key)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        self.set_raw(key, &raw)
    }

    pub fn remove(&self, key: &str) -> Result<()> {
        self.conn().execute("DELETE FROM kv WHERE key = ?1", [key])?;
        Ok(())
    }

    // --- Documents ---

    pub fn put_document(&self, doc: &Document) -> Result<()> {
        self.conn().execute(
            "INSERT INTO documents (user_id, file_name, data, uploaded_at) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(user_id) DO UPDATE SET
                file_name = excluded.file_name,
                data = excluded.data,
                uploaded_at = excluded.uploaded_at",
            params![
                doc.user_id,
                doc.file_name,
                doc.data,
                doc.uploaded_at.to_rfc3339()
            ],
        )?;
        Ok(())
    }

    pub fn get_document(&self, user_id: UserId) -> Result<Option<Document>> {
        let row = self
            .conn()
            .query_row(
                "SELECT user_id, file_name, data, uploaded_at FROM documents WHERE user_id = ?1",
                [user_id],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, Vec<u8>>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?;

        let Some((user_id, file_name, data, uploaded_at)) = row else {
            return Ok(None);
        };
        let uploaded_at = chrono::DateTime::parse_from_rfc3339(&uploaded_at)
            .map_err(|e| ServiceError::OperationFailed(format!("bad document timestamp: {}", e)))?
            .with_timezone(&chrono::Utc);

        Ok(Some(Document {
            user_id,
            file_name,
            data,
            uploaded_at,
        }))
    }

    pub fn delete_document(&self, user_id: UserId) -> Result<bool> {
        let n = self
            .conn()
            .execute("DELETE FROM documents WHERE user_id = ?1", [user_id])?;
        Ok(n > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn json_values_round_trip_and_overwrite() {
        let storage = Storage::open_in_memory().unwrap();
        assert_eq!(storage.get_json::<Vec<i64>>("favorites").unwrap(), None);

        storage.set_json("favorites", &vec![1_i64, 2]).unwrap();
        storage.set_json("favorites", &vec![3_i64]).unwrap();
        assert_eq!(
            storage.get_json::<Vec<i64>>("favorites").unwrap(),
            Some(vec![3])
        );

        storage.remove("favorites").unwrap();
        assert_eq!(storage.get_raw("favorites").unwrap(), None);
    }

    #[test]
    fn corrupt_json_is_a_serialization_error() {
        let storage = Storage::open_in_memory().unwrap();
        storage.set_raw("session.identity", "{not json").unwrap();
        let err = storage
            .get_json::<crate::models::Identity>("session.identity")
            .unwrap_err();
        assert!(matches!(err, ServiceError::Serialization(_)));
    }

    #[test]
    fn documents_replace_per_user() {
        let storage = Storage::open_in_memory().unwrap();
        let mut doc = Document {
            user_id: 4,
            file_name: "cv.pdf".to_string(),
            data: vec![0x25, 0x50, 0x44, 0x46],
            uploaded_at: Utc::now(),
        };
        storage.put_document(&doc).unwrap();
        doc.file_name = "cv-v2.pdf".to_string();
        storage.put_document(&doc).unwrap();

        let stored = storage.get_document(4).unwrap().unwrap();
        assert_eq!(stored.file_name, "cv-v2.pdf");
        assert_eq!(stored.data, doc.data);
        assert!(storage.get_document(5).unwrap().is_none());
        assert!(storage.delete_document(4).unwrap());
    }

    #[test]
    fn reopening_a_file_keeps_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stagehub.db");
        {
            let storage = Storage::open(&path).unwrap();
            storage.set_raw("session.token", "abc").unwrap();
        }
        let storage = Storage::open(&path).unwrap();
        assert_eq!(storage.get_raw("session.token").unwrap().as_deref(), Some("abc"));
        assert_eq!(storage.path(), Some(path.as_path()));
    }
}
