//! Persisted slot storage.
//!
//! Defines the `SlotStore` trait, namespaced slot keys, and an in-memory
//! implementation. The SQLite implementation lives in lexdesk-infra.

pub mod keys;
pub mod memory;
pub mod slot_store;
