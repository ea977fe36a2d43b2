//! Saved connection records
//!
//! The console core never owns connection configuration: it only reads
//! records through the [`ConnectionStore`] trait, fresh on every lookup, so
//! edits and deletions made elsewhere are observed immediately.
//!
//! Two stores are provided:
//! - [`FileConnectionStore`]: a JSON array on disk, re-read on every call
//! - [`MemoryConnectionStore`]: an in-process list, for embedding and tests

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::debug;

use crate::error::{ConfigError, MongoConsoleError, Result};

/// A saved connection as persisted by the console's configuration store.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionRecord {
    /// Stable identifier used to key pooled clients
    pub id: String,

    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Server host (ignored when `uri` is set)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    /// Server port, 27017 when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    /// Username for authentication
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Password for authentication
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Authentication database
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_database: Option<String>,

    /// Full connection URI, preferred over the individual fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,

    /// Extra URI options appended to the query string
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub options: BTreeMap<String, String>,

    /// Whether the UI should connect on startup
    #[serde(default)]
    pub auto_connect: bool,
}

impl ConnectionRecord {
    /// Record addressed by host and port.
    pub fn with_host(id: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            id: id.into(),
            host: Some(host.into()),
            port: Some(port),
            ..Default::default()
        }
    }

    /// Record addressed by a full connection URI.
    pub fn with_uri(id: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            uri: Some(uri.into()),
            ..Default::default()
        }
    }

    /// Check that the record can be turned into a connection URI.
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(ConfigError::MissingField("id".to_string()).into());
        }

        let has_uri = self.uri.as_deref().is_some_and(|u| !u.trim().is_empty());
        let has_host = self.host.as_deref().is_some_and(|h| !h.trim().is_empty());
        if !has_uri && !has_host {
            return Err(ConfigError::MissingField(format!("{}: uri or host", self.id)).into());
        }

        Ok(())
    }

    /// Name for display, falling back to the id.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

impl fmt::Debug for ConnectionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionRecord")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("auth_database", &self.auth_database)
            .field("uri", &self.uri.as_ref().map(|u| crate::connection::sanitize_uri(u)))
            .field("options", &self.options)
            .field("auto_connect", &self.auto_connect)
            .finish()
    }
}

/// Source of saved connection records.
///
/// Implementations must return the current state on every call; the pool
/// relies on this to notice deleted and edited records.
#[async_trait]
pub trait ConnectionStore: Send + Sync {
    /// Load every saved connection record.
    async fn load_connections(&self) -> Result<Vec<ConnectionRecord>>;

    /// Find one record by id.
    async fn find(&self, id: &str) -> Result<Option<ConnectionRecord>> {
        let records = self.load_connections().await?;
        Ok(records.into_iter().find(|r| r.id == id))
    }
}

/// Connection records stored as a JSON array in a file.
#[derive(Debug, Clone)]
pub struct FileConnectionStore {
    path: PathBuf,
}

impl FileConnectionStore {
    /// Create a store reading from `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ConnectionStore for FileConnectionStore {
    async fn load_connections(&self) -> Result<Vec<ConnectionRecord>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Connection store {} does not exist", self.path.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(MongoConsoleError::Io(e)),
        };

        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&content).map_err(|e| {
            ConfigError::InvalidFormat(format!("{}: {}", self.path.display(), e)).into()
        })
    }
}

/// Connection records held in memory.
#[derive(Debug, Default)]
pub struct MemoryConnectionStore {
    records: RwLock<Vec<ConnectionRecord>>,
}

impl MemoryConnectionStore {
    /// Create a store holding the given records
    pub fn new(records: Vec<ConnectionRecord>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }

    /// Insert or replace a record with the same id
    pub fn upsert(&self, record: ConnectionRecord) {
        let mut records = self.records.write().unwrap_or_else(|e| e.into_inner());
        match records.iter_mut().find(|r| r.id == record.id) {
            Some(existing) => *existing = record,
            None => records.push(record),
        }
    }

    /// Remove a record, returning whether it existed
    pub fn remove(&self, id: &str) -> bool {
        let mut records = self.records.write().unwrap_or_else(|e| e.into_inner());
        let before = records.len();
        records.retain(|r| r.id != id);
        records.len() != before
    }
}

#[async_trait]
impl ConnectionStore for MemoryConnectionStore {
    async fn load_connections(&self) -> Result<Vec<ConnectionRecord>> {
        Ok(self
            .records
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_deserialize_camel_case() {
        let json = r#"{
            "id": "local",
            "host": "localhost",
            "port": 27017,
            "username": "admin",
            "password": "secret",
            "authDatabase": "admin",
            "options": { "replicaSet": "rs0" },
            "autoConnect": true
        }"#;

        let record: ConnectionRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.id, "local");
        assert_eq!(record.auth_database.as_deref(), Some("admin"));
        assert_eq!(record.options.get("replicaSet").map(String::as_str), Some("rs0"));
        assert!(record.auto_connect);
        assert!(record.validate().is_ok());
    }

    #[test]
    fn test_validate_requires_uri_or_host() {
        let record = ConnectionRecord {
            id: "x".to_string(),
            ..Default::default()
        };
        assert!(record.validate().is_err());

        assert!(ConnectionRecord::with_uri("x", "mongodb://h").validate().is_ok());
        assert!(ConnectionRecord::with_host("x", "h", 27017).validate().is_ok());
    }

    #[test]
    fn test_debug_hides_credentials() {
        let mut record = ConnectionRecord::with_uri("x", "mongodb://bob:hunter2@db:27017");
        record.password = Some("hunter2".to_string());
        let rendered = format!("{:?}", record);
        assert!(!rendered.contains("hunter2"));
        assert!(!rendered.contains("bob"));
    }

    #[tokio::test]
    async fn test_memory_store_upsert_and_remove() {
        let store = MemoryConnectionStore::default();
        store.upsert(ConnectionRecord::with_host("a", "h1", 27017));
        store.upsert(ConnectionRecord::with_host("a", "h2", 27017));

        let found = store.find("a").await.unwrap().unwrap();
        assert_eq!(found.host.as_deref(), Some("h2"));
        assert_eq!(store.load_connections().await.unwrap().len(), 1);

        assert!(store.remove("a"));
        assert!(!store.remove("a"));
        assert!(store.find("a").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_file_store_reads_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("connections.json");
        let store = FileConnectionStore::new(&path);

        assert!(store.load_connections().await.unwrap().is_empty());

        std::fs::write(&path, r#"[{"id": "one", "host": "localhost"}]"#).unwrap();
        assert!(store.find("one").await.unwrap().is_some());

        std::fs::write(&path, "[]").unwrap();
        assert!(store.find("one").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_file_store_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("connections.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = FileConnectionStore::new(&path);
        let err = store.load_connections().await.unwrap_err();
        assert!(err.to_string().contains("Invalid config format"));
    }
}
