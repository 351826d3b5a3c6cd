//! Chatbot session and message types.
//!
//! A chatbot session is the visitor-facing conversation with the intake
//! assistant. Its identifier is persisted so a returning visitor resumes it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

uuid_id! {
    /// Unique identifier for a chatbot session.
    SessionId
}

/// Who authored a chatbot message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatbotRole {
    User,
    Assistant,
}

impl fmt::Display for ChatbotRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatbotRole::User => write!(f, "user"),
            ChatbotRole::Assistant => write!(f, "assistant"),
        }
    }
}

impl FromStr for ChatbotRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(ChatbotRole::User),
            "assistant" => Ok(ChatbotRole::Assistant),
            other => Err(format!("invalid chatbot role: '{other}'")),
        }
    }
}

/// A single entry in a chatbot session's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatbotMessage {
    pub role: ChatbotRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    /// Injected by the UI (e.g. "viewing case 42") rather than typed by the visitor.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_context: bool,
}

impl ChatbotMessage {
    pub fn user(content: impl Into<String>, is_context: bool) -> Self {
        Self {
            role: ChatbotRole::User,
            content: content.into(),
            timestamp: Utc::now(),
            is_context,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatbotRole::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
            is_context: false,
        }
    }
}

/// A chatbot conversation and its full ordered history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatbotSession {
    pub id: SessionId,
    #[serde(default)]
    pub messages: Vec<ChatbotMessage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChatbotSession {
    /// Mint a fresh session with empty history.
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: SessionId::new(),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn push(&mut self, message: ChatbotMessage) {
        self.updated_at = self.updated_at.max(message.timestamp);
        self.messages.push(message);
    }
}

impl Default for ChatbotSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Lifecycle of the session manager.
///
/// `Uninitialized -> Active -> (Cleared -> Active)*`. `clear_session`
/// passes through `Cleared` and lands back in `Active` with a new id, so
/// callers only ever observe `Uninitialized` or `Active`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum SessionLifecycle {
    #[default]
    Uninitialized,
    Active { session_id: SessionId },
    Cleared { previous: SessionId },
}

impl SessionLifecycle {
    pub fn active_session(&self) -> Option<SessionId> {
        match self {
            SessionLifecycle::Active { session_id } => Some(*session_id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_roundtrip() {
        for role in [ChatbotRole::User, ChatbotRole::Assistant] {
            let parsed: ChatbotRole = role.to_string().parse().unwrap();
            assert_eq!(parsed, role);
        }
        assert!("system".parse::<ChatbotRole>().is_err());
    }

    #[test]
    fn test_context_flag_omitted_when_false() {
        let json = serde_json::to_string(&ChatbotMessage::assistant("hello")).unwrap();
        assert!(!json.contains("is_context"));
        assert!(json.contains("\"role\":\"assistant\""));

        let json = serde_json::to_string(&ChatbotMessage::user("case 42", true)).unwrap();
        assert!(json.contains("\"is_context\":true"));
    }

    #[test]
    fn test_new_session_is_empty() {
        let session = ChatbotSession::new();
        assert!(session.messages.is_empty());
        assert_eq!(session.created_at, session.updated_at);
    }

    #[test]
    fn test_lifecycle_serde() {
        let id = SessionId::new();
        let json = serde_json::to_string(&SessionLifecycle::Active { session_id: id }).unwrap();
        assert!(json.contains("\"state\":\"active\""));
        assert_eq!(SessionLifecycle::default(), SessionLifecycle::Uninitialized);
        assert_eq!(
            SessionLifecycle::Active { session_id: id }.active_session(),
            Some(id)
        );
    }
}
