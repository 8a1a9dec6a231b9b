// ── Credential store ──
//
// Two append-only JSON-document files on disk, one document per line.
// Opening replays the file with last-record-per-key-wins, so updates
// are appended rather than rewritten; a compaction rewrite happens on
// load when stale versions were replayed. Writes are flushed before
// the operation resolves.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, warn};

// ── Records ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub email: String,
    /// Packed credential, `hash::salt` (see the password module).
    pub password: String,
    pub thermostat_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThermostatRecord {
    pub id: String,
    pub registered: bool,
}

// ── Errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record already exists")]
    AlreadyExists,

    #[error("record not found")]
    NotFound,

    #[error("store IO failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("record serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

// ── Generic line-document store ──────────────────────────────────────

struct DocumentStore<T> {
    path: PathBuf,
    records: Mutex<HashMap<String, T>>,
    key_of: fn(&T) -> String,
}

impl<T: Serialize + DeserializeOwned + Clone> DocumentStore<T> {
    /// Replay the file into memory. Undecodable lines are skipped with
    /// a warning; when stale versions were replayed the file is
    /// rewritten compacted.
    async fn open(path: PathBuf, key_of: fn(&T) -> String) -> Result<Self, StoreError> {
        let mut records = HashMap::new();
        let mut replayed = 0usize;

        match tokio::fs::read_to_string(&path).await {
            Ok(body) => {
                for line in body.lines().filter(|l| !l.trim().is_empty()) {
                    match serde_json::from_str::<T>(line) {
                        Ok(record) => {
                            replayed += 1;
                            records.insert(key_of(&record), record);
                        }
                        Err(e) => {
                            warn!(path = %path.display(), error = %e, "skipping corrupt record");
                        }
                    }
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(StoreError::Io(e)),
        }

        let store = Self {
            path,
            records: Mutex::new(records),
            key_of,
        };

        if replayed > store.records.lock().await.len() {
            store.compact().await?;
        }
        Ok(store)
    }

    /// Rewrite the file with exactly one line per live record.
    async fn compact(&self) -> Result<(), StoreError> {
        let records = self.records.lock().await;
        let mut body = String::new();
        for record in records.values() {
            body.push_str(&serde_json::to_string(record)?);
            body.push('\n');
        }
        tokio::fs::write(&self.path, body).await?;
        debug!(path = %self.path.display(), records = records.len(), "store compacted");
        Ok(())
    }

    /// Append one record and flush before resolving.
    async fn append(&self, record: &T) -> Result<(), StoreError> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    async fn insert(&self, record: T) -> Result<(), StoreError> {
        let mut records = self.records.lock().await;
        let key = (self.key_of)(&record);
        if records.contains_key(&key) {
            return Err(StoreError::AlreadyExists);
        }
        self.append(&record).await?;
        records.insert(key, record);
        Ok(())
    }

    /// Append the new version of an existing record; last wins on
    /// replay.
    async fn update(&self, record: T) -> Result<(), StoreError> {
        let mut records = self.records.lock().await;
        let key = (self.key_of)(&record);
        if !records.contains_key(&key) {
            return Err(StoreError::NotFound);
        }
        self.append(&record).await?;
        records.insert(key, record);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<T, StoreError> {
        self.records
            .lock()
            .await
            .get(key)
            .cloned()
            .ok_or(StoreError::NotFound)
    }
}

// ── CredentialStore ──────────────────────────────────────────────────

/// The server's only cross-request shared state: users and thermostats,
/// each in its own document file under the data directory.
pub struct CredentialStore {
    users: DocumentStore<UserRecord>,
    thermostats: DocumentStore<ThermostatRecord>,
}

impl CredentialStore {
    pub async fn open(data_dir: &Path) -> Result<Self, StoreError> {
        tokio::fs::create_dir_all(data_dir).await?;
        Ok(Self {
            users: DocumentStore::open(data_dir.join("users.db"), |u: &UserRecord| {
                u.email.clone()
            })
            .await?,
            thermostats: DocumentStore::open(
                data_dir.join("thermostats.db"),
                |t: &ThermostatRecord| t.id.clone(),
            )
            .await?,
        })
    }

    pub async fn insert_user(
        &self,
        email: &str,
        packed_password: &str,
        thermostat_id: &str,
    ) -> Result<UserRecord, StoreError> {
        let record = UserRecord {
            email: email.to_owned(),
            password: packed_password.to_owned(),
            thermostat_id: thermostat_id.to_owned(),
        };
        self.users.insert(record.clone()).await?;
        Ok(record)
    }

    pub async fn get_user(&self, email: &str) -> Result<UserRecord, StoreError> {
        self.users.get(email).await
    }

    pub async fn insert_thermostat(&self, id: &str) -> Result<ThermostatRecord, StoreError> {
        let record = ThermostatRecord {
            id: id.to_owned(),
            registered: false,
        };
        self.thermostats.insert(record.clone()).await?;
        Ok(record)
    }

    pub async fn get_thermostat(&self, id: &str) -> Result<ThermostatRecord, StoreError> {
        self.thermostats.get(id).await
    }

    /// Flip `registered` to true. The route layer gates this behind a
    /// pre-check so it runs at most once per id.
    pub async fn register_thermostat(&self, id: &str) -> Result<(), StoreError> {
        let mut record = self.thermostats.get(id).await?;
        record.registered = true;
        self.thermostats.update(record).await
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use pretty_assertions::assert_eq;

    use super::*;

    #[tokio::test]
    async fn insert_and_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::open(dir.path()).await.unwrap();

        store.insert_thermostat("t-1").await.unwrap();
        store.insert_user("a@x", "h::s", "t-1").await.unwrap();

        let user = store.get_user("a@x").await.unwrap();
        assert_eq!(user.password, "h::s");
        assert_eq!(user.thermostat_id, "t-1");
        assert!(!store.get_thermostat("t-1").await.unwrap().registered);

        assert!(matches!(
            store.get_user("b@x").await,
            Err(StoreError::NotFound)
        ));
        assert!(matches!(
            store.insert_user("a@x", "x::y", "t-2").await,
            Err(StoreError::AlreadyExists)
        ));
        assert!(matches!(
            store.insert_thermostat("t-1").await,
            Err(StoreError::AlreadyExists)
        ));
    }

    #[tokio::test]
    async fn records_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = CredentialStore::open(dir.path()).await.unwrap();
            store.insert_thermostat("t-1").await.unwrap();
            store.register_thermostat("t-1").await.unwrap();
            store.insert_user("a@x", "h::s", "t-1").await.unwrap();
        }

        let store = CredentialStore::open(dir.path()).await.unwrap();
        assert!(store.get_thermostat("t-1").await.unwrap().registered);
        assert_eq!(store.get_user("a@x").await.unwrap().thermostat_id, "t-1");
    }

    #[tokio::test]
    async fn reopen_compacts_stale_versions() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = CredentialStore::open(dir.path()).await.unwrap();
            store.insert_thermostat("t-1").await.unwrap();
            store.register_thermostat("t-1").await.unwrap();
        }

        // Two lines on disk for one record until the replay compacts.
        let path = dir.path().join("thermostats.db");
        let before = std::fs::read_to_string(&path).unwrap();
        assert_eq!(before.lines().count(), 2);

        let store = CredentialStore::open(dir.path()).await.unwrap();
        assert!(store.get_thermostat("t-1").await.unwrap().registered);

        let after = std::fs::read_to_string(&path).unwrap();
        assert_eq!(after.lines().count(), 1);
    }

    #[tokio::test]
    async fn corrupt_lines_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("thermostats.db"),
            "{\"id\":\"t-1\",\"registered\":false}\nnot json\n",
        )
        .unwrap();

        let store = CredentialStore::open(dir.path()).await.unwrap();
        assert!(!store.get_thermostat("t-1").await.unwrap().registered);
    }
}
