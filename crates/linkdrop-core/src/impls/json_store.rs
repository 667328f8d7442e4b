//! JSON-file-backed store, durable across process restarts.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, watch};

use crate::domain::{CompletedRecord, ItemId, QueueItem};
use crate::error::EngineError;
use crate::ports::QueueStore;

#[derive(Debug, Default, Serialize, Deserialize)]
struct Persisted {
    queue: Vec<QueueItem>,
    completed: Vec<CompletedRecord>,
}

/// Store backed by a single JSON document on disk.
///
/// Design:
/// - The whole document is rewritten after every mutation; the collections
///   stay small (one page worth of images).
/// - Writes go to a sibling temp file first, then rename over the target, so
///   a crash mid-write never leaves a torn document.
/// - Mutations run under one lock; the in-memory copy and the file move
///   together.
#[derive(Debug)]
pub struct JsonStore {
    path: PathBuf,
    state: Mutex<Persisted>,
    revision: watch::Sender<u64>,
}

impl JsonStore {
    /// Open the store at `path`, creating an empty one if the file is absent.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, EngineError> {
        let path = path.into();
        let state = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| EngineError::Store(format!("corrupt store file: {e}")))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Persisted::default(),
            Err(e) => return Err(EngineError::Store(e.to_string())),
        };
        Ok(Self {
            path,
            state: Mutex::new(state),
            revision: watch::Sender::new(0),
        })
    }

    async fn persist(&self, state: &Persisted) -> Result<(), EngineError> {
        let bytes =
            serde_json::to_vec_pretty(state).map_err(|e| EngineError::Store(e.to_string()))?;
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|e| EngineError::Store(e.to_string()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| EngineError::Store(e.to_string()))?;
        self.revision.send_modify(|rev| *rev += 1);
        Ok(())
    }
}

#[async_trait]
impl QueueStore for JsonStore {
    async fn queue(&self) -> Result<Vec<QueueItem>, EngineError> {
        Ok(self.state.lock().await.queue.clone())
    }

    async fn set_queue(&self, items: Vec<QueueItem>) -> Result<(), EngineError> {
        let mut state = self.state.lock().await;
        state.queue = items;
        self.persist(&state).await
    }

    async fn get(&self, id: ItemId) -> Result<Option<QueueItem>, EngineError> {
        let state = self.state.lock().await;
        Ok(state.queue.iter().find(|item| item.id == id).cloned())
    }

    async fn upsert(&self, item: QueueItem) -> Result<(), EngineError> {
        let mut state = self.state.lock().await;
        match state.queue.iter_mut().find(|slot| slot.id == item.id) {
            Some(slot) => *slot = item,
            None => state.queue.push(item),
        }
        self.persist(&state).await
    }

    async fn remove(&self, id: ItemId) -> Result<bool, EngineError> {
        let mut state = self.state.lock().await;
        let before = state.queue.len();
        state.queue.retain(|item| item.id != id);
        if state.queue.len() == before {
            return Ok(false);
        }
        self.persist(&state).await?;
        Ok(true)
    }

    async fn completed(&self) -> Result<Vec<CompletedRecord>, EngineError> {
        Ok(self.state.lock().await.completed.clone())
    }

    async fn set_completed(&self, records: Vec<CompletedRecord>) -> Result<(), EngineError> {
        let mut state = self.state.lock().await;
        state.completed = records;
        self.persist(&state).await
    }

    async fn push_completed(&self, record: CompletedRecord) -> Result<(), EngineError> {
        let mut state = self.state.lock().await;
        state.completed.push(record);
        self.persist(&state).await
    }

    async fn remove_completed(&self, id: ItemId) -> Result<bool, EngineError> {
        let mut state = self.state.lock().await;
        let before = state.completed.len();
        state.completed.retain(|record| record.id != id);
        if state.completed.len() == before {
            return Ok(false);
        }
        self.persist(&state).await?;
        Ok(true)
    }

    fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }
}
