//! QueueStore port: durable home of the work queue and the completed list.

use async_trait::async_trait;
use tokio::sync::watch;

use crate::domain::{CompletedRecord, ItemId, QueueItem};
use crate::error::EngineError;

/// Durable key-value home of the two collections.
///
/// Design:
/// - The store is the single source of truth. No component keeps an
///   authoritative copy of an item across a suspension point; runs re-read
///   via `get` before acting.
/// - Per-item operations (`get` / `upsert` / `remove`) are atomic with
///   respect to each other, so concurrent runs updating disjoint items never
///   clobber one another. Whole-collection reads/writes remain for snapshots
///   and clear-style commands.
/// - Every mutation bumps a revision observable through `subscribe`. This is
///   a best-effort display signal, not part of the correctness contract.
/// - A read or write that cannot complete surfaces as `EngineError::Store`;
///   there is no retry at this layer.
#[async_trait]
pub trait QueueStore: Send + Sync {
    async fn queue(&self) -> Result<Vec<QueueItem>, EngineError>;

    async fn set_queue(&self, items: Vec<QueueItem>) -> Result<(), EngineError>;

    async fn get(&self, id: ItemId) -> Result<Option<QueueItem>, EngineError>;

    /// Replace the entry with a matching id, or append if absent.
    async fn upsert(&self, item: QueueItem) -> Result<(), EngineError>;

    /// Remove by id; reports whether an entry was actually removed.
    async fn remove(&self, id: ItemId) -> Result<bool, EngineError>;

    async fn completed(&self) -> Result<Vec<CompletedRecord>, EngineError>;

    async fn set_completed(&self, records: Vec<CompletedRecord>) -> Result<(), EngineError>;

    async fn push_completed(&self, record: CompletedRecord) -> Result<(), EngineError>;

    async fn remove_completed(&self, id: ItemId) -> Result<bool, EngineError>;

    /// Observe the revision counter (bumped after every mutation).
    fn subscribe(&self) -> watch::Receiver<u64>;
}
