//! Application layer: enqueue/finalize gateway, batch dispatcher, scheduler.

pub mod dispatcher;
pub mod gateway;
pub mod scheduler;

pub use dispatcher::Dispatcher;
pub use gateway::Gateway;
pub use scheduler::Scheduler;
