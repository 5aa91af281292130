//! Durable holder of the committed session snapshot.
//!
//! The store is a thin atomic cell: one committed value, replaced or
//! cleared as a whole, mirrored to durable storage and published to
//! subscribers through a watch channel. It has no error surface — storage
//! failures are logged and degrade to "no session" (fail safe, never fail
//! open).

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use ledgerdesk_auth::{CredentialPair, Identity};

/// The unit of commit: a credential pair and the identity it was issued
/// for, never one without the other.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub credentials: CredentialPair,
    pub identity: Identity,
}

/// Durable backing of the token store.
///
/// One record per process profile under a fixed namespace. Implementations
/// must never panic or propagate IO failures: a snapshot that cannot be
/// loaded is treated as absent.
pub trait SnapshotStorage: Send + Sync {
    fn load(&self) -> Option<SessionSnapshot>;
    fn persist(&self, snapshot: &SessionSnapshot);
    fn wipe(&self);
}

// ─────────────────────────────────────────────────────────────────────────────
// In-memory storage (tests/dev)
// ─────────────────────────────────────────────────────────────────────────────

/// In-memory storage for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    slot: Mutex<Option<SessionSnapshot>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotStorage for MemoryStorage {
    fn load(&self) -> Option<SessionSnapshot> {
        self.slot.lock().unwrap().clone()
    }

    fn persist(&self, snapshot: &SessionSnapshot) {
        *self.slot.lock().unwrap() = Some(snapshot.clone());
    }

    fn wipe(&self) {
        *self.slot.lock().unwrap() = None;
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// JSON file storage
// ─────────────────────────────────────────────────────────────────────────────

/// File-backed storage: one JSON document at a fixed path.
///
/// Writes go through a temp file + rename so a crash mid-write leaves either
/// the old snapshot or an unreadable file — and an unreadable file loads as
/// "no session".
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Storage under the platform data directory
    /// (`<data_dir>/ledgerdesk/session.json`).
    pub fn default_profile() -> Option<Self> {
        let dir = dirs::data_dir()?;
        Some(Self::at(dir.join("ledgerdesk").join("session.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotStorage for JsonFileStorage {
    fn load(&self) -> Option<SessionSnapshot> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return None,
            Err(err) => {
                tracing::warn!(path = %self.path.display(), error = %err, "failed to read session file");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(snapshot) => Some(snapshot),
            Err(err) => {
                tracing::warn!(path = %self.path.display(), error = %err, "session file is unreadable; starting unauthenticated");
                None
            }
        }
    }

    fn persist(&self, snapshot: &SessionSnapshot) {
        if let Err(err) = self.try_persist(snapshot) {
            tracing::error!(path = %self.path.display(), error = %err, "failed to persist session snapshot");
        }
    }

    fn wipe(&self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => {
                tracing::error!(path = %self.path.display(), error = %err, "failed to remove session file");
            }
        }
    }
}

impl JsonFileStorage {
    fn try_persist(&self, snapshot: &SessionSnapshot) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(snapshot)
            .map_err(|err| std::io::Error::other(err.to_string()))?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, raw)?;
        std::fs::rename(&tmp, &self.path)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Token store
// ─────────────────────────────────────────────────────────────────────────────

/// Process-local holder of the current session snapshot.
///
/// # Invariants
/// - Readers always observe a whole committed snapshot; there is no state in
///   which an old access token is visible next to a new refresh token or a
///   foreign identity.
/// - Exactly one component writes: the store is moved into the
///   `SessionManager`, everyone else reads through queries or [`subscribe`].
///
/// [`subscribe`]: TokenStore::subscribe
pub struct TokenStore {
    storage: Arc<dyn SnapshotStorage>,
    state: watch::Sender<Option<SessionSnapshot>>,
}

impl TokenStore {
    /// Open the store, restoring the persisted snapshot if one exists.
    pub fn open(storage: Arc<dyn SnapshotStorage>) -> Self {
        let initial = storage.load();
        let (state, _) = watch::channel(initial);
        Self { storage, state }
    }

    /// Ephemeral store for tests and dev shells.
    pub fn in_memory() -> Self {
        Self::open(Arc::new(MemoryStorage::new()))
    }

    /// Latest committed value. Non-blocking.
    pub fn read(&self) -> Option<SessionSnapshot> {
        self.state.borrow().clone()
    }

    /// Atomically replace the committed snapshot and notify subscribers.
    pub fn commit(&self, snapshot: SessionSnapshot) {
        self.storage.persist(&snapshot);
        self.state.send_replace(Some(snapshot));
    }

    /// Atomically remove the snapshot, durable copy included.
    pub fn clear(&self) {
        self.storage.wipe();
        self.state.send_replace(None);
    }

    /// Watch the committed value. The receiver sees every commit/clear.
    pub fn subscribe(&self) -> watch::Receiver<Option<SessionSnapshot>> {
        self.state.subscribe()
    }
}

impl core::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenStore")
            .field("committed", &self.state.borrow().is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerdesk_auth::{Role, UserId};

    fn snapshot(access: &str) -> SessionSnapshot {
        SessionSnapshot {
            credentials: CredentialPair::new(access, format!("{access}-refresh")),
            identity: Identity {
                id: UserId::new(),
                username: "testuser".to_string(),
                email: "test@example.com".to_string(),
                first_name: "Test".to_string(),
                last_name: "User".to_string(),
                roles: vec![Role::new("USER")],
                is_active: true,
                created_at: None,
                updated_at: None,
            },
        }
    }

    #[test]
    fn commit_then_read_round_trips_whole_snapshot() {
        let store = TokenStore::in_memory();
        assert!(store.read().is_none());

        let committed = snapshot("a1");
        store.commit(committed.clone());
        assert_eq!(store.read(), Some(committed));
    }

    #[test]
    fn clear_removes_durable_copy() {
        let storage = Arc::new(MemoryStorage::new());
        let store = TokenStore::open(Arc::clone(&storage) as Arc<dyn SnapshotStorage>);

        store.commit(snapshot("a1"));
        assert!(storage.load().is_some());

        store.clear();
        assert!(store.read().is_none());
        assert!(storage.load().is_none());
    }

    #[test]
    fn subscribers_see_commits_and_clears() {
        let store = TokenStore::in_memory();
        let mut rx = store.subscribe();

        store.commit(snapshot("a1"));
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().is_some());

        store.clear();
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().is_none());
    }

    #[test]
    fn reopening_restores_persisted_snapshot() {
        let dir = std::env::temp_dir().join(format!("ledgerdesk-test-{}", uuid::Uuid::now_v7()));
        let storage = JsonFileStorage::at(dir.join("session.json"));

        {
            let store = TokenStore::open(Arc::new(storage.clone()));
            store.commit(snapshot("persisted"));
        }

        let reopened = TokenStore::open(Arc::new(storage.clone()));
        let restored = reopened.read().expect("snapshot should survive reopen");
        assert_eq!(restored.credentials.access_token, "persisted");

        reopened.clear();
        assert!(TokenStore::open(Arc::new(storage)).read().is_none());

        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn readers_never_observe_a_torn_snapshot() {
        // Credentials and identity are tagged with the same marker; a torn
        // read would pair a tag from one commit with a tag from another.
        fn tagged(n: usize) -> SessionSnapshot {
            let mut tagged = snapshot(&format!("access-{n}"));
            tagged.identity.username = format!("user-{n}");
            tagged
        }

        let store = Arc::new(TokenStore::in_memory());

        let writer = {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                for n in 0..200 {
                    store.commit(tagged(n));
                    tokio::task::yield_now().await;
                }
            })
        };

        let reader = {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                for _ in 0..500 {
                    if let Some(observed) = store.read() {
                        let access_tag = observed
                            .credentials
                            .access_token
                            .strip_prefix("access-")
                            .expect("unexpected access token")
                            .to_string();
                        assert_eq!(observed.identity.username, format!("user-{access_tag}"));
                    }
                    tokio::task::yield_now().await;
                }
            })
        };

        writer.await.unwrap();
        reader.await.unwrap();
    }

    #[test]
    fn corrupt_session_file_degrades_to_unauthenticated() {
        let dir = std::env::temp_dir().join(format!("ledgerdesk-test-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("session.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store = TokenStore::open(Arc::new(JsonFileStorage::at(&path)));
        assert!(store.read().is_none());

        let _ = std::fs::remove_dir_all(dir);
    }
}
