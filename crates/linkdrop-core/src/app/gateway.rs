//! Enqueue/Finalize gateway.
//!
//! The only code path that adds items to the work queue or moves them into
//! the completed list. User commands from the presentation layer also land
//! here; each one is a single store mutation followed by the store's own
//! "state changed" signal.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::{CompletedRecord, ItemId, NewItem, QueueItem};
use crate::error::EngineError;
use crate::ports::{Clock, IdGenerator, QueueStore};

pub struct Gateway {
    store: Arc<dyn QueueStore>,
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
}

impl Gateway {
    pub fn new(
        store: Arc<dyn QueueStore>,
        ids: Arc<dyn IdGenerator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { store, ids, clock }
    }

    /// Append a batch of collected images, then collapse duplicate inline
    /// payloads (first occurrence wins).
    ///
    /// Items without an inline payload are never deduplicated against each
    /// other; two "no payload" submissions are distinct jobs.
    pub async fn enqueue(&self, inputs: Vec<NewItem>) -> Result<(), EngineError> {
        let mut queue = self.store.queue().await?;
        for input in inputs {
            let id = self.ids.next_item_id();
            debug!(%id, src_url = ?input.src_url, "enqueue");
            queue.push(QueueItem::new(id, input));
        }
        dedup_by_data_url(&mut queue);
        self.store.set_queue(queue).await
    }

    /// Queue + completed snapshot for the presentation layer.
    pub async fn snapshot(&self) -> Result<(Vec<QueueItem>, Vec<CompletedRecord>), EngineError> {
        Ok((self.store.queue().await?, self.store.completed().await?))
    }

    pub async fn pause_item(&self, id: ItemId) -> Result<(), EngineError> {
        self.set_paused(id, true).await
    }

    pub async fn resume_item(&self, id: ItemId) -> Result<(), EngineError> {
        self.set_paused(id, false).await
    }

    async fn set_paused(&self, id: ItemId, paused: bool) -> Result<(), EngineError> {
        if let Some(mut item) = self.store.get(id).await? {
            item.paused = paused;
            self.store.upsert(item).await?;
        }
        Ok(())
    }

    /// Cancel-and-remove: dropping the queue entry is the user's intent; an
    /// in-flight run notices the removal at its next checkpoint and exits
    /// silently.
    pub async fn remove_item(&self, id: ItemId) -> Result<(), EngineError> {
        self.store.remove(id).await.map(|_| ())
    }

    pub async fn clear_queue(&self) -> Result<(), EngineError> {
        self.store.set_queue(Vec::new()).await
    }

    pub async fn remove_completed(&self, id: ItemId) -> Result<(), EngineError> {
        self.store.remove_completed(id).await.map(|_| ())
    }

    pub async fn clear_completed(&self) -> Result<(), EngineError> {
        self.store.set_completed(Vec::new()).await
    }

    /// Move a finished item into the completed list, success path.
    pub async fn finalize_success(&self, item: &QueueItem) -> Result<(), EngineError> {
        self.finalize(item, CompletedRecord::success(item, self.clock.now()))
            .await
    }

    /// Move a finished item into the completed list, failure path.
    pub async fn finalize_failure(&self, item: &QueueItem) -> Result<(), EngineError> {
        self.finalize(item, CompletedRecord::failure(item, self.clock.now()))
            .await
    }

    /// Queue removal happens first and doubles as the idempotence guard: if
    /// another call already removed the item, no record is appended.
    async fn finalize(&self, item: &QueueItem, record: CompletedRecord) -> Result<(), EngineError> {
        if !self.store.remove(item.id).await? {
            debug!(id = %item.id, "finalize skipped: item already gone");
            return Ok(());
        }
        info!(id = %item.id, ok = record.dropbox_url.is_some(), "finalized");
        self.store.push_completed(record).await
    }
}

/// Keep the first occurrence of each present `data_url`. Absent payloads are
/// not comparable, so they are always kept.
fn dedup_by_data_url(queue: &mut Vec<QueueItem>) {
    let mut seen = HashSet::new();
    queue.retain(|item| match &item.data_url {
        Some(payload) => seen.insert(payload.clone()),
        None => true,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ItemStatus;
    use crate::impls::InMemoryStore;
    use crate::ports::{SystemClock, UlidGenerator};
    use rstest::rstest;

    fn gateway() -> (Arc<InMemoryStore>, Gateway) {
        let store = Arc::new(InMemoryStore::new());
        let gateway = Gateway::new(
            store.clone(),
            Arc::new(UlidGenerator::new(SystemClock)),
            Arc::new(SystemClock),
        );
        (store, gateway)
    }

    fn with_payload(data_url: Option<&str>) -> NewItem {
        NewItem {
            data_url: data_url.map(str::to_string),
            ..NewItem::default()
        }
    }

    #[tokio::test]
    async fn enqueued_items_start_queued_with_fresh_ids() {
        let (store, gateway) = gateway();
        gateway
            .enqueue(vec![with_payload(None), with_payload(None)])
            .await
            .unwrap();

        let queue = store.queue().await.unwrap();
        assert_eq!(queue.len(), 2);
        assert_ne!(queue[0].id, queue[1].id);
        assert!(queue.iter().all(|item| item.status == ItemStatus::Queued));
        assert!(queue.iter().all(|item| item.tries == 0));
    }

    #[rstest]
    #[case::identical_payloads(Some("data:,a"), Some("data:,a"), 1)]
    #[case::distinct_payloads(Some("data:,a"), Some("data:,b"), 2)]
    #[case::both_absent(None, None, 2)]
    #[case::one_absent(Some("data:,a"), None, 2)]
    #[tokio::test]
    async fn dedup_law(
        #[case] first: Option<&str>,
        #[case] second: Option<&str>,
        #[case] expected: usize,
    ) {
        let (store, gateway) = gateway();
        gateway
            .enqueue(vec![with_payload(first), with_payload(second)])
            .await
            .unwrap();

        assert_eq!(store.queue().await.unwrap().len(), expected);
    }

    #[tokio::test]
    async fn dedup_keeps_the_first_occurrence() {
        let (store, gateway) = gateway();
        gateway.enqueue(vec![with_payload(Some("data:,a"))]).await.unwrap();
        let original = store.queue().await.unwrap()[0].id;

        gateway.enqueue(vec![with_payload(Some("data:,a"))]).await.unwrap();

        let queue = store.queue().await.unwrap();
        assert_eq!(queue.len(), 1);
        assert_eq!(queue[0].id, original);
    }

    #[tokio::test]
    async fn finalize_twice_produces_one_record() {
        let (store, gateway) = gateway();
        gateway.enqueue(vec![with_payload(None)]).await.unwrap();
        let item = store.queue().await.unwrap().remove(0);

        gateway.finalize_failure(&item).await.unwrap();
        gateway.finalize_failure(&item).await.unwrap();

        assert!(store.queue().await.unwrap().is_empty());
        assert_eq!(store.completed().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn pause_and_resume_toggle_the_flag_in_place() {
        let (store, gateway) = gateway();
        gateway.enqueue(vec![with_payload(None)]).await.unwrap();
        let id = store.queue().await.unwrap()[0].id;

        gateway.pause_item(id).await.unwrap();
        assert!(store.get(id).await.unwrap().unwrap().paused);

        gateway.resume_item(id).await.unwrap();
        assert!(!store.get(id).await.unwrap().unwrap().paused);
    }

    #[tokio::test]
    async fn completed_list_commands() {
        let (store, gateway) = gateway();
        gateway.enqueue(vec![with_payload(None), with_payload(None)]).await.unwrap();
        let queue = store.queue().await.unwrap();
        gateway.finalize_failure(&queue[0]).await.unwrap();
        gateway.finalize_failure(&queue[1]).await.unwrap();

        gateway.remove_completed(queue[0].id).await.unwrap();
        assert_eq!(store.completed().await.unwrap().len(), 1);

        gateway.clear_completed().await.unwrap();
        assert!(store.completed().await.unwrap().is_empty());
    }
}
