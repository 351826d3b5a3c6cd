//! Messaging domain types: messages, channel kinds, and participant-pair threads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

uuid_id! {
    /// Unique identifier for a message.
    MessageId
}

uuid_id! {
    /// Unique identifier for a chat thread.
    ThreadId
}

/// Identifier of a message sender or recipient (attorney, client, staff).
///
/// Always non-empty and trimmed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
    /// Parse a participant id, rejecting blank input.
    pub fn parse(raw: &str, field: &'static str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyField(field));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An unordered pair of participants.
///
/// Stored in canonical (sorted) order so that `{a, b}` and `{b, a}` compare
/// and hash equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParticipantPair {
    low: ParticipantId,
    high: ParticipantId,
}

impl ParticipantPair {
    pub fn new(a: ParticipantId, b: ParticipantId) -> Self {
        if a <= b {
            Self { low: a, high: b }
        } else {
            Self { low: b, high: a }
        }
    }

    pub fn contains(&self, participant: &ParticipantId) -> bool {
        &self.low == participant || &self.high == participant
    }

    /// Both participants in canonical order.
    pub fn members(&self) -> (&ParticipantId, &ParticipantId) {
        (&self.low, &self.high)
    }
}

impl fmt::Display for ParticipantPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <-> {}", self.low, self.high)
    }
}

/// The medium a message travelled over.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    #[default]
    DirectChat,
    Email,
    Sms,
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelKind::DirectChat => write!(f, "direct_chat"),
            ChannelKind::Email => write!(f, "email"),
            ChannelKind::Sms => write!(f, "sms"),
        }
    }
}

impl FromStr for ChannelKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "direct_chat" | "direct-chat" | "chat" => Ok(ChannelKind::DirectChat),
            "email" | "e-mail" => Ok(ChannelKind::Email),
            "sms" | "short-message" => Ok(ChannelKind::Sms),
            other => Err(format!("invalid channel kind: '{other}'")),
        }
    }
}

/// A single message between two participants.
///
/// `timestamp` is fixed at creation. `read` only ever goes false -> true.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub sender_id: ParticipantId,
    pub recipient_id: ParticipantId,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub read: bool,
    pub channel: ChannelKind,
}

impl Message {
    /// The unordered pair this message belongs to.
    pub fn participants(&self) -> ParticipantPair {
        ParticipantPair::new(self.sender_id.clone(), self.recipient_id.clone())
    }
}

/// A conversation between exactly one unordered pair of participants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatThread {
    pub id: ThreadId,
    pub participants: ParticipantPair,
    /// Message references, append-only, in chronological order.
    pub message_ids: Vec<MessageId>,
    /// Timestamp of the most recently appended message.
    pub updated_at: DateTime<Utc>,
}

impl ChatThread {
    /// Start a thread whose first message is `message`.
    pub fn start(message: &Message) -> Self {
        Self {
            id: ThreadId::new(),
            participants: message.participants(),
            message_ids: vec![message.id],
            updated_at: message.timestamp,
        }
    }

    pub fn append(&mut self, message: &Message) {
        self.message_ids.push(message.id);
        self.updated_at = message.timestamp;
    }
}
