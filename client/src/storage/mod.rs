//! Storage module
//!
//! Local, durable client state that is not a plain repository row.

pub mod lock_store;

pub use lock_store::{ClassLocks, LockKind, LockStore};
