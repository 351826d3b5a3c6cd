//! Store logic and storage trait definitions for LexDesk.
//!
//! This crate defines the `SlotStore` port that the infrastructure layer
//! implements, plus the stores built on top of it: the client entity store,
//! the messaging store, and the chatbot session manager. It depends only on
//! `lexdesk-types` -- never on `lexdesk-infra` or any database crate.

pub mod chatbot;
pub mod latency;
pub mod messaging;
pub mod storage;
pub mod store;
