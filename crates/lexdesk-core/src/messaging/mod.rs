//! Messaging store: messages plus a participant-pair thread index.

pub mod store;
