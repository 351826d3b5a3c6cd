//! Entity stores.
//!
//! `EntityStore` is the generic CRUD store; `ClientStore` pins it to
//! law-firm clients and adds client-specific queries.

pub mod client;
pub mod entity;
