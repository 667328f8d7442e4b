//! Ports: trait seams between the engine and its collaborators.
//!
//! Each trait hides an external system (persistent storage, the authorization
//! endpoint, the remote object store, the network) so the pipeline can be
//! exercised end to end against in-memory stubs.

pub mod clock;
pub mod fetch;
pub mod id_generator;
pub mod remote;
pub mod store;
pub mod token;

pub use clock::{Clock, FixedClock, SystemClock};
pub use fetch::{HttpFetcher, SourceFetcher};
pub use id_generator::{IdGenerator, UlidGenerator};
pub use remote::RemoteStore;
pub use store::QueueStore;
pub use token::TokenProvider;
