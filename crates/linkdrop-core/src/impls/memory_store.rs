//! In-memory store implementation (tests and development).

use async_trait::async_trait;
use tokio::sync::{Mutex, watch};

use crate::domain::{CompletedRecord, ItemId, QueueItem};
use crate::error::EngineError;
use crate::ports::QueueStore;

#[derive(Default)]
struct State {
    queue: Vec<QueueItem>,
    completed: Vec<CompletedRecord>,
}

/// In-memory store.
///
/// Per-item operations run under a single lock, so concurrent item runs
/// updating disjoint entries never lose writes. `Vec` keeps insertion order,
/// which the dispatcher's batch selection relies on.
pub struct InMemoryStore {
    state: Mutex<State>,
    revision: watch::Sender<u64>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
            revision: watch::Sender::new(0),
        }
    }

    fn bump(&self) {
        self.revision.send_modify(|rev| *rev += 1);
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QueueStore for InMemoryStore {
    async fn queue(&self) -> Result<Vec<QueueItem>, EngineError> {
        Ok(self.state.lock().await.queue.clone())
    }

    async fn set_queue(&self, items: Vec<QueueItem>) -> Result<(), EngineError> {
        self.state.lock().await.queue = items;
        self.bump();
        Ok(())
    }

    async fn get(&self, id: ItemId) -> Result<Option<QueueItem>, EngineError> {
        let state = self.state.lock().await;
        Ok(state.queue.iter().find(|item| item.id == id).cloned())
    }

    async fn upsert(&self, item: QueueItem) -> Result<(), EngineError> {
        {
            let mut state = self.state.lock().await;
            match state.queue.iter_mut().find(|slot| slot.id == item.id) {
                Some(slot) => *slot = item,
                None => state.queue.push(item),
            }
        }
        self.bump();
        Ok(())
    }

    async fn remove(&self, id: ItemId) -> Result<bool, EngineError> {
        let removed = {
            let mut state = self.state.lock().await;
            let before = state.queue.len();
            state.queue.retain(|item| item.id != id);
            state.queue.len() != before
        };
        if removed {
            self.bump();
        }
        Ok(removed)
    }

    async fn completed(&self) -> Result<Vec<CompletedRecord>, EngineError> {
        Ok(self.state.lock().await.completed.clone())
    }

    async fn set_completed(&self, records: Vec<CompletedRecord>) -> Result<(), EngineError> {
        self.state.lock().await.completed = records;
        self.bump();
        Ok(())
    }

    async fn push_completed(&self, record: CompletedRecord) -> Result<(), EngineError> {
        self.state.lock().await.completed.push(record);
        self.bump();
        Ok(())
    }

    async fn remove_completed(&self, id: ItemId) -> Result<bool, EngineError> {
        let removed = {
            let mut state = self.state.lock().await;
            let before = state.completed.len();
            state.completed.retain(|record| record.id != id);
            state.completed.len() != before
        };
        if removed {
            self.bump();
        }
        Ok(removed)
    }

    fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ItemStatus, NewItem};
    use ulid::Ulid;

    fn item() -> QueueItem {
        QueueItem::new(ItemId::from_ulid(Ulid::new()), NewItem::default())
    }

    #[tokio::test]
    async fn upsert_replaces_instead_of_duplicating() {
        let store = InMemoryStore::new();
        let mut it = item();

        store.upsert(it.clone()).await.unwrap();
        it.mark_preparing();
        store.upsert(it.clone()).await.unwrap();

        let queue = store.queue().await.unwrap();
        assert_eq!(queue.len(), 1);
        assert_eq!(queue[0].status, ItemStatus::Preparing);
    }

    #[tokio::test]
    async fn remove_reports_whether_anything_was_removed() {
        let store = InMemoryStore::new();
        let it = item();
        store.upsert(it.clone()).await.unwrap();

        assert!(store.remove(it.id).await.unwrap());
        assert!(!store.remove(it.id).await.unwrap());
        assert!(store.queue().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn mutations_bump_the_revision_signal() {
        let store = InMemoryStore::new();
        let rx = store.subscribe();
        let before = *rx.borrow();

        store.upsert(item()).await.unwrap();
        store.set_queue(Vec::new()).await.unwrap();

        assert!(*rx.borrow() > before);
    }

    #[tokio::test]
    async fn queue_preserves_insertion_order() {
        let store = InMemoryStore::new();
        let a = item();
        let b = item();
        store.upsert(a.clone()).await.unwrap();
        store.upsert(b.clone()).await.unwrap();

        let queue = store.queue().await.unwrap();
        assert_eq!(queue[0].id, a.id);
        assert_eq!(queue[1].id, b.id);
    }
}
