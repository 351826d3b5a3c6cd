//! SQLite storage layer.
//!
//! Slot storage backed by SQLite with WAL mode and split read/write
//! connection pools.

pub mod pool;
pub mod slot;
