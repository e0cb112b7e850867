//! In-memory store service for tests/dev.
//!
//! - No IO / no real payments
//! - Synchronous completion delivery (deterministic tests)
//! - Transactions settle only when a driver method is called

pub mod store;

pub use store::MemoryStore;
