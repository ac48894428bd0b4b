//! Per-session graph checkpoints.
//!
//! After every step the graph engine writes the full state plus the name of
//! the node that runs next. A checkpoint with `next == None` marks a session
//! whose last run reached the end of the graph.
//!
//! Two stores are provided: [`FileCheckpointStore`] (one JSON document per
//! session, replaced atomically via rename) and [`MemoryCheckpointStore`]
//! for tests and ephemeral runs.

use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use lg_domain::error::{Error, Result};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Durable snapshot of one session's graph run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub session_id: String,
    /// Serialized graph state.
    pub state: serde_json::Value,
    /// Node that runs next; `None` once the run reached the end.
    #[serde(default)]
    pub next: Option<String>,
    /// Number of node executions recorded for this session.
    pub step: usize,
    pub updated_at: DateTime<Utc>,
}

impl Checkpoint {
    pub fn new(
        session_id: impl Into<String>,
        state: serde_json::Value,
        next: Option<String>,
        step: usize,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            state,
            next,
            step,
            updated_at: Utc::now(),
        }
    }

    /// True when the recorded run was interrupted before reaching the end.
    pub fn is_pending(&self) -> bool {
        self.next.is_some()
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Store trait
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[async_trait::async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Prepare backing storage. Idempotent.
    async fn setup(&self) -> Result<()>;

    /// Latest checkpoint for a session, if any.
    async fn get(&self, session_id: &str) -> Result<Option<Checkpoint>>;

    /// Replace the checkpoint for `checkpoint.session_id`.
    async fn put(&self, checkpoint: Checkpoint) -> Result<()>;

    /// All known checkpoints, most recently updated first.
    async fn list(&self) -> Result<Vec<Checkpoint>>;

    /// Release the store. Writes after close fail with a persistence error.
    async fn close(&self) -> Result<()>;
}

/// Run `f` against a freshly set-up store and always close it afterwards,
/// whether `f` succeeded or not. The first error wins.
pub async fn scoped<S, F, Fut, T>(store: Arc<S>, f: F) -> Result<T>
where
    S: CheckpointStore + ?Sized,
    F: FnOnce(Arc<S>) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    store.setup().await?;
    let outcome = f(store.clone()).await;
    let closed = store.close().await;
    match (outcome, closed) {
        (Ok(value), Ok(())) => Ok(value),
        (Err(e), _) => Err(e),
        (Ok(_), Err(e)) => Err(e),
    }
}

fn validate_session_id(session_id: &str) -> Result<()> {
    let ok = !session_id.is_empty()
        && session_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        && session_id != "."
        && session_id != "..";
    if ok {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!(
            "invalid session id '{session_id}'"
        )))
    }
}

fn sort_recent_first(list: &mut [Checkpoint]) {
    list.sort_by(|a, b| {
        b.updated_at
            .cmp(&a.updated_at)
            .then_with(|| a.session_id.cmp(&b.session_id))
    });
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// File-backed store
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Stores `<session_id>.json` files under a state directory with a
/// write-through cache so repeated reads never touch disk.
pub struct FileCheckpointStore {
    base_dir: PathBuf,
    cache: RwLock<HashMap<String, Checkpoint>>,
    closed: AtomicBool,
}

impl FileCheckpointStore {
    pub fn new(base_dir: &Path) -> Self {
        Self {
            base_dir: base_dir.to_path_buf(),
            cache: RwLock::new(HashMap::new()),
            closed: AtomicBool::new(false),
        }
    }

    fn path_for(&self, session_id: &str) -> PathBuf {
        self.base_dir.join(format!("{session_id}.json"))
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(Error::Persistence("checkpoint store is closed".into()));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl CheckpointStore for FileCheckpointStore {
    async fn setup(&self) -> Result<()> {
        let dir = self.base_dir.clone();
        tokio::task::spawn_blocking(move || std::fs::create_dir_all(&dir))
            .await
            .map_err(|e| Error::Other(format!("spawn_blocking join: {e}")))?
            .map_err(|e| Error::Persistence(format!("creating state dir: {e}")))?;
        self.closed.store(false, Ordering::Release);
        tracing::debug!(dir = %self.base_dir.display(), "checkpoint store ready");
        Ok(())
    }

    async fn get(&self, session_id: &str) -> Result<Option<Checkpoint>> {
        validate_session_id(session_id)?;
        if let Some(cp) = self.cache.read().get(session_id) {
            return Ok(Some(cp.clone()));
        }

        let path = self.path_for(session_id);
        let loaded = tokio::task::spawn_blocking(move || read_checkpoint(&path))
            .await
            .map_err(|e| Error::Other(format!("spawn_blocking join: {e}")))??;

        if let Some(ref cp) = loaded {
            self.cache.write().insert(session_id.to_owned(), cp.clone());
        }
        Ok(loaded)
    }

    async fn put(&self, checkpoint: Checkpoint) -> Result<()> {
        self.ensure_open()?;
        validate_session_id(&checkpoint.session_id)?;

        let path = self.path_for(&checkpoint.session_id);
        let body = serde_json::to_vec_pretty(&checkpoint)?;

        // Write to disk first; the cache only reflects durable state.
        tokio::task::spawn_blocking(move || write_atomic(&path, &body))
            .await
            .map_err(|e| Error::Other(format!("spawn_blocking join: {e}")))??;

        self.cache
            .write()
            .insert(checkpoint.session_id.clone(), checkpoint);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Checkpoint>> {
        let dir = self.base_dir.clone();
        let mut all = tokio::task::spawn_blocking(move || -> Result<Vec<Checkpoint>> {
            let entries = match std::fs::read_dir(&dir) {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
                Err(e) => return Err(Error::Persistence(format!("listing state dir: {e}"))),
            };
            let mut out = Vec::new();
            for entry in entries.flatten() {
                let path = entry.path();
                if path.extension().and_then(|e| e.to_str()) != Some("json") {
                    continue;
                }
                match read_checkpoint(&path) {
                    Ok(Some(cp)) => out.push(cp),
                    Ok(None) => {}
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "skipping unreadable checkpoint");
                    }
                }
            }
            Ok(out)
        })
        .await
        .map_err(|e| Error::Other(format!("spawn_blocking join: {e}")))??;

        sort_recent_first(&mut all);
        Ok(all)
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::Release);
        self.cache.write().clear();
        Ok(())
    }
}

fn read_checkpoint(path: &Path) -> Result<Option<Checkpoint>> {
    match std::fs::read(path) {
        Ok(bytes) => serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| Error::Persistence(format!("corrupt checkpoint {}: {e}", path.display()))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::Persistence(format!(
            "reading {}: {e}",
            path.display()
        ))),
    }
}

fn write_atomic(path: &Path, body: &[u8]) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, body)
        .and_then(|()| std::fs::rename(&tmp, path))
        .map_err(|e| Error::Persistence(format!("writing {}: {e}", path.display())))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// In-memory store
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Default)]
pub struct MemoryCheckpointStore {
    entries: RwLock<HashMap<String, Checkpoint>>,
    closed: AtomicBool,
}

impl MemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl CheckpointStore for MemoryCheckpointStore {
    async fn setup(&self) -> Result<()> {
        self.closed.store(false, Ordering::Release);
        Ok(())
    }

    async fn get(&self, session_id: &str) -> Result<Option<Checkpoint>> {
        Ok(self.entries.read().get(session_id).cloned())
    }

    async fn put(&self, checkpoint: Checkpoint) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(Error::Persistence("checkpoint store is closed".into()));
        }
        self.entries
            .write()
            .insert(checkpoint.session_id.clone(), checkpoint);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Checkpoint>> {
        let mut all: Vec<Checkpoint> = self.entries.read().values().cloned().collect();
        sort_recent_first(&mut all);
        Ok(all)
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn file_store_roundtrips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCheckpointStore::new(dir.path());
        store.setup().await.unwrap();

        let cp = Checkpoint::new("s1", json!({"leads": []}), Some("screener".into()), 3);
        store.put(cp.clone()).await.unwrap();

        // A second instance has an empty cache and must read the file.
        let fresh = FileCheckpointStore::new(dir.path());
        let loaded = fresh.get("s1").await.unwrap().unwrap();
        assert_eq!(loaded, cp);
        assert!(loaded.is_pending());
        assert!(!dir.path().join("s1.json.tmp").exists());
    }

    #[tokio::test]
    async fn missing_session_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCheckpointStore::new(dir.path());
        assert!(store.get("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn put_replaces_previous_checkpoint() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCheckpointStore::new(dir.path());
        store.setup().await.unwrap();
        store
            .put(Checkpoint::new("s1", json!(1), Some("chatbot".into()), 1))
            .await
            .unwrap();
        store
            .put(Checkpoint::new("s1", json!(2), None, 2))
            .await
            .unwrap();

        let list = store.list().await.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].step, 2);
        assert!(!list[0].is_pending());
    }

    #[tokio::test]
    async fn rejects_path_like_session_ids() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCheckpointStore::new(dir.path());
        store.setup().await.unwrap();
        let err = store
            .put(Checkpoint::new("../escape", json!({}), None, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn corrupt_file_is_persistence_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.json"), b"{not json").unwrap();
        let store = FileCheckpointStore::new(dir.path());
        let err = store.get("bad").await.unwrap_err();
        assert!(err.is_fatal_persistence());
    }

    #[tokio::test]
    async fn scoped_closes_even_on_error() {
        let store = Arc::new(MemoryCheckpointStore::new());
        let result: Result<()> = scoped(store.clone(), |s| async move {
            s.put(Checkpoint::new("s1", json!({}), None, 1)).await?;
            Err(Error::Other("boom".into()))
        })
        .await;
        assert!(matches!(result, Err(Error::Other(_))));

        // Closed: further writes fail, reads still work.
        let err = store
            .put(Checkpoint::new("s2", json!({}), None, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Persistence(_)));
        assert!(store.get("s1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn scoped_works_with_trait_objects() {
        let dir = tempfile::tempdir().unwrap();
        let store: Arc<dyn CheckpointStore> = Arc::new(FileCheckpointStore::new(dir.path()));
        let n = scoped(store, |s| async move {
            s.put(Checkpoint::new("a", json!({}), None, 1)).await?;
            s.put(Checkpoint::new("b", json!({}), None, 1)).await?;
            Ok(s.list().await?.len())
        })
        .await
        .unwrap();
        assert_eq!(n, 2);
    }
}
