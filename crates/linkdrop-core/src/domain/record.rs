//! Completed record: terminal snapshot of a finished item.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ItemId, QueueItem};

/// Terminal snapshot, created exactly once per item by the finalize step and
/// never mutated afterwards (the completed list is append-only; entries leave
/// it only through an explicit user command).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletedRecord {
    pub id: ItemId,
    pub src_url: Option<String>,

    /// None on failure.
    pub dropbox_url: Option<String>,

    pub thumb_data_url: Option<String>,
    pub error: Option<String>,
    pub finished_at: DateTime<Utc>,
}

impl CompletedRecord {
    pub fn success(item: &QueueItem, finished_at: DateTime<Utc>) -> Self {
        Self {
            id: item.id,
            src_url: item.src_url.clone(),
            dropbox_url: item.dropbox_url.clone(),
            thumb_data_url: item.thumb_data_url.clone(),
            error: None,
            finished_at,
        }
    }

    pub fn failure(item: &QueueItem, finished_at: DateTime<Utc>) -> Self {
        Self {
            id: item.id,
            src_url: item.src_url.clone(),
            dropbox_url: None,
            thumb_data_url: item.thumb_data_url.clone(),
            error: Some(item.error.clone().unwrap_or_else(|| "failed".to_string())),
            finished_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ItemStatus, NewItem};
    use ulid::Ulid;

    #[test]
    fn failure_record_carries_the_last_error_or_a_fallback() {
        let mut item = QueueItem::new(ItemId::from_ulid(Ulid::new()), NewItem::default());
        let now = Utc::now();

        let record = CompletedRecord::failure(&item, now);
        assert_eq!(record.error.as_deref(), Some("failed"));
        assert!(record.dropbox_url.is_none());

        item.record_failure("download failed: 404".to_string());
        let record = CompletedRecord::failure(&item, now);
        assert_eq!(record.error.as_deref(), Some("download failed: 404"));
    }

    #[test]
    fn success_record_keeps_the_shared_link() {
        let mut item = QueueItem::new(ItemId::from_ulid(Ulid::new()), NewItem::default());
        item.mark_done("https://dropbox.test/s/abc".to_string());
        assert_eq!(item.status, ItemStatus::Done);

        let record = CompletedRecord::success(&item, Utc::now());
        assert_eq!(record.dropbox_url.as_deref(), Some("https://dropbox.test/s/abc"));
        assert!(record.error.is_none());
    }
}
