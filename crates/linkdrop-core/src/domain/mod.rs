//! Domain model: queue items, completed records, ids, data-URL decoding.

pub mod data_url;
pub mod ids;
pub mod item;
pub mod record;

pub use ids::ItemId;
pub use item::{ItemStatus, NewItem, QueueItem};
pub use record::CompletedRecord;
