//! Chatbot session management and reply generation.
//!
//! `SessionManager` owns session ids and history; a `ReplyGenerator`
//! produces the assistant side of each exchange.

pub mod reply;
pub mod rules;
pub mod session;
