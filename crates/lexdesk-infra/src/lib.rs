//! Infrastructure layer for LexDesk.
//!
//! Contains the SQLite implementation of the `SlotStore` trait defined in
//! `lexdesk-core`, the `config.toml` loader, and data directory resolution.

pub mod config;
pub mod filesystem;
pub mod sqlite;
