//! linkdrop-core
//!
//! Upload orchestration engine: a durable, resumable pipeline that carries
//! candidate images from a web page into a remote object store and publishes
//! a shareable link per image.
//!
//! Module map:
//! - **domain**: queue items, completed records, ids, data-URL decoding
//! - **ports**: trait seams (QueueStore, TokenProvider, RemoteStore,
//!   SourceFetcher, Clock, IdGenerator)
//! - **impls**: in-memory store, JSON-file store, Dropbox adapters
//! - **app**: enqueue/finalize gateway, batch dispatcher, periodic scheduler
//! - **config**: engine tunables
//! - **error**: the engine-wide error type

pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod impls;
pub mod ports;
