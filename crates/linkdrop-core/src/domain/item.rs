//! Queue item: one in-flight upload job.

use serde::{Deserialize, Serialize};

use super::ItemId;

/// Lifecycle status of a queue item.
///
/// Transitions:
/// - Queued -> Preparing -> Uploading -> CreatingLink -> Done
/// - any step -> Error -> (re-selected next cycle, until the try ceiling)
///
/// Done never persists in the work queue: reaching it finalizes the item
/// into the completed list in the same step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Queued,
    Preparing,
    Uploading,
    CreatingLink,
    Done,
    Error,
}

impl ItemStatus {
    /// Is a state-machine run currently working this item?
    ///
    /// In-flight items are excluded from the next cycle's selection so two
    /// runs never work the same item concurrently.
    pub fn is_in_flight(self) -> bool {
        matches!(
            self,
            ItemStatus::Preparing | ItemStatus::Uploading | ItemStatus::CreatingLink
        )
    }
}

/// Raw input produced by the image collector, before an id is assigned.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewItem {
    pub src_url: Option<String>,
    pub filename: Option<String>,
    pub data_url: Option<String>,
    pub thumb_data_url: Option<String>,
}

/// One upload job tracked through its lifecycle.
///
/// Design:
/// - Lives in exactly one of {work queue, completed list}. The store owns
///   both collections; every state-machine step re-reads the item from the
///   store before acting, so a copy held across a suspension point is never
///   treated as authoritative.
/// - `paused` and `cancelled` are cooperative flags: the dispatcher skips
///   flagged items, and in-flight runs check them at fixed checkpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueItem {
    pub id: ItemId,

    /// Origin URL of the image; absent when only inline bytes exist.
    pub src_url: Option<String>,

    /// Display name, informational only.
    pub filename: Option<String>,

    pub status: ItemStatus,

    /// Reserved for per-item progress reporting; not load-bearing today.
    pub progress: u8,

    /// Inline byte payload as a data URL; the preferred byte source.
    pub data_url: Option<String>,

    /// Small preview payload, carried through for display, never uploaded.
    pub thumb_data_url: Option<String>,

    /// Resulting shared link, set only on success.
    pub dropbox_url: Option<String>,

    /// Count of failed attempts; drives the retry ceiling.
    pub tries: u32,

    /// Last failure message.
    pub error: Option<String>,

    /// Skipped by the dispatcher while set, but retained in the queue.
    pub paused: bool,

    /// Cooperative cancellation flag, checked between steps.
    pub cancelled: bool,
}

impl QueueItem {
    pub fn new(id: ItemId, input: NewItem) -> Self {
        Self {
            id,
            src_url: input.src_url,
            filename: input.filename,
            status: ItemStatus::Queued,
            progress: 0,
            data_url: input.data_url,
            thumb_data_url: input.thumb_data_url,
            dropbox_url: None,
            tries: 0,
            error: None,
            paused: false,
            cancelled: false,
        }
    }

    /// Eligible for selection by a drain cycle?
    pub fn is_eligible(&self) -> bool {
        !self.paused && !self.cancelled && !self.status.is_in_flight()
    }

    pub fn mark_preparing(&mut self) {
        self.status = ItemStatus::Preparing;
    }

    pub fn mark_uploading(&mut self) {
        self.status = ItemStatus::Uploading;
    }

    pub fn mark_creating_link(&mut self) {
        self.status = ItemStatus::CreatingLink;
    }

    pub fn mark_done(&mut self, shared_link: String) {
        self.status = ItemStatus::Done;
        self.dropbox_url = Some(shared_link);
    }

    /// Count a failed attempt and remember the message.
    pub fn record_failure(&mut self, message: String) {
        self.tries += 1;
        self.status = ItemStatus::Error;
        self.error = Some(message);
    }
}
