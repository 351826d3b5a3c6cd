//! Shared domain types for LexDesk.
//!
//! This crate contains the domain types used across the LexDesk stores:
//! clients, messages and chat threads, chatbot sessions, persisted slot
//! documents, configuration, and their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

#[macro_use]
mod id;

pub mod chatbot;
pub mod client;
pub mod config;
pub mod error;
pub mod message;
pub mod storage;
