//! Concrete adapters for the ports.

pub mod dropbox;
pub mod json_store;
pub mod memory_store;

pub use dropbox::{DropboxAuth, DropboxClient, DropboxTokenProvider};
pub use json_store::JsonStore;
pub use memory_store::InMemoryStore;
