//! Chatbot session manager.
//!
//! Keeps every session's history in one slot and the visitor's current
//! session id in another, so a later run resumes where the visitor left off.
//! Each session has its own turn lock, held across reply generation: sends to
//! one session are serialized and each user message is immediately followed by
//! its reply. The shared state lock is released while a generator runs, so a
//! slow reply never blocks other sessions or readers.

use std::sync::Arc;

use dashmap::DashMap;
use lexdesk_types::chatbot::{ChatbotMessage, ChatbotSession, SessionId, SessionLifecycle};
use lexdesk_types::error::{ChatbotError, StorageError, ValidationError};
use lexdesk_types::storage::{Durability, Write};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::reply::ReplyGenerator;
use crate::latency::Latency;
use crate::storage::keys::SlotKeys;
use crate::storage::slot_store::{SlotStore, load_collection, save_collection};

#[derive(Debug, Default)]
struct ChatbotState {
    sessions: Vec<ChatbotSession>,
    current: Option<SessionId>,
    lifecycle: SessionLifecycle,
}

impl ChatbotState {
    fn position(&self, id: SessionId) -> Result<usize, ChatbotError> {
        self.sessions
            .iter()
            .position(|s| s.id == id)
            .ok_or(ChatbotError::SessionNotFound(id))
    }

    /// Mint an empty session and make it current.
    fn start_session(&mut self) -> ChatbotSession {
        let session = ChatbotSession::new();
        self.sessions.push(session.clone());
        self.current = Some(session.id);
        self.lifecycle = SessionLifecycle::Active {
            session_id: session.id,
        };
        session
    }
}

/// Owns chatbot sessions and sequences user/assistant exchanges.
pub struct SessionManager<S: SlotStore, R: ReplyGenerator> {
    slots: S,
    sessions_key: String,
    current_key: String,
    replies: R,
    state: Mutex<ChatbotState>,
    turns: DashMap<SessionId, Arc<Mutex<()>>>,
    latency: Latency,
}

impl<S: SlotStore, R: ReplyGenerator> SessionManager<S, R> {
    /// Open the manager, loading stored sessions and the current session id.
    ///
    /// An unreadable current-session slot is logged and ignored; the next
    /// `get_or_create_session` then mints a fresh session.
    pub async fn open(
        slots: S,
        keys: &SlotKeys,
        replies: R,
        latency: Latency,
    ) -> Result<Self, StorageError> {
        let sessions_key = keys.chatbot_sessions();
        let current_key = keys.chatbot_current_session();

        let sessions: Vec<ChatbotSession> = load_collection(&slots, &sessions_key).await?;
        let current = match slots.load(&current_key).await {
            Ok(Some(value)) => match serde_json::from_value::<SessionId>(value) {
                Ok(id) => Some(id),
                Err(e) => {
                    warn!(key = %current_key, error = %e, "Ignoring malformed current session id");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(key = %current_key, error = %e, "Failed to read current session id");
                None
            }
        };

        info!(
            sessions = sessions.len(),
            resumable = current.is_some(),
            generator = replies.name(),
            "Chatbot session manager opened"
        );

        Ok(Self {
            slots,
            sessions_key,
            current_key,
            replies,
            state: Mutex::new(ChatbotState {
                sessions,
                current,
                lifecycle: SessionLifecycle::Uninitialized,
            }),
            turns: DashMap::new(),
            latency,
        })
    }

    pub async fn lifecycle(&self) -> SessionLifecycle {
        self.state.lock().await.lifecycle
    }

    /// The stored id a returning visitor would resume, if any.
    pub async fn current_session_id(&self) -> Option<SessionId> {
        self.state.lock().await.current
    }

    pub async fn get_session(&self, id: SessionId) -> Option<ChatbotSession> {
        self.latency.simulate().await;
        self.state
            .lock()
            .await
            .sessions
            .iter()
            .find(|s| s.id == id)
            .cloned()
    }

    /// Resume a known session or start a new one.
    ///
    /// With `existing`, that session is returned if it is known and a new one
    /// is minted otherwise. Without it, the stored current session is resumed
    /// if it still resolves.
    pub async fn get_or_create_session(
        &self,
        existing: Option<SessionId>,
    ) -> Write<ChatbotSession> {
        self.latency.simulate().await;

        let mut state = self.state.lock().await;
        let resumed = existing
            .or(state.current)
            .and_then(|id| state.sessions.iter().find(|s| s.id == id))
            .cloned();

        if let Some(session) = resumed {
            state.lifecycle = SessionLifecycle::Active {
                session_id: session.id,
            };
            if state.current == Some(session.id) {
                debug!(session_id = %session.id, "Chatbot session resumed");
                return Write::persisted(session);
            }
            state.current = Some(session.id);
            info!(session_id = %session.id, "Chatbot session switched");
            let durability = self.persist(&state).await;
            return Write {
                value: session,
                durability,
            };
        }

        if let Some(stale) = existing {
            debug!(session_id = %stale, "Requested chatbot session not found; starting new");
        }
        let session = state.start_session();
        info!(session_id = %session.id, "Chatbot session created");

        let durability = self.persist(&state).await;
        Write {
            value: session,
            durability,
        }
    }

    /// Append a user message, generate the assistant reply, and append it.
    ///
    /// If the generator fails, the user message stays in history and
    /// `ChatbotError::Reply` carries whether it was written back.
    pub async fn send_message(
        &self,
        session_id: SessionId,
        content: &str,
        is_context: bool,
    ) -> Result<Write<()>, ChatbotError> {
        self.latency.simulate().await;

        self.state.lock().await.position(session_id)?;
        if content.trim().is_empty() {
            return Err(ValidationError::EmptyField("content").into());
        }

        let turn = self.turn(session_id);
        let _turn = turn.lock().await;

        let history = {
            let mut state = self.state.lock().await;
            let idx = state.position(session_id)?;
            state.sessions[idx].push(ChatbotMessage::user(content, is_context));
            state.sessions[idx].messages.clone()
        };
        let reply = self.replies.reply(&history).await;

        let mut state = self.state.lock().await;
        let idx = state.position(session_id)?;
        match reply {
            Ok(text) => {
                state.sessions[idx].push(ChatbotMessage::assistant(text));
                debug!(
                    session_id = %session_id,
                    history = state.sessions[idx].messages.len(),
                    "Chatbot exchange recorded"
                );
                let durability = self.persist(&state).await;
                Ok(Write {
                    value: (),
                    durability,
                })
            }
            Err(source) => {
                warn!(
                    session_id = %session_id,
                    generator = self.replies.name(),
                    error = %source,
                    "Reply generation failed"
                );
                // Keep the user message even though nothing answered it.
                let durability = self.persist(&state).await;
                Err(ChatbotError::Reply { source, durability })
            }
        }
    }

    /// Full ordered history, context messages included.
    pub async fn get_session_messages(
        &self,
        session_id: SessionId,
    ) -> Result<Vec<ChatbotMessage>, ChatbotError> {
        self.latency.simulate().await;
        let state = self.state.lock().await;
        let idx = state.position(session_id)?;
        Ok(state.sessions[idx].messages.clone())
    }

    /// History as the visitor sees it, without UI-injected context.
    pub async fn visible_messages(
        &self,
        session_id: SessionId,
    ) -> Result<Vec<ChatbotMessage>, ChatbotError> {
        let mut messages = self.get_session_messages(session_id).await?;
        messages.retain(|m| !m.is_context);
        Ok(messages)
    }

    /// Discard a session and its history, then start and return a new one.
    pub async fn clear_session(
        &self,
        session_id: SessionId,
    ) -> Result<Write<ChatbotSession>, ChatbotError> {
        self.latency.simulate().await;

        self.state.lock().await.position(session_id)?;
        let turn = self.turn(session_id);
        let _turn = turn.lock().await;

        let mut state = self.state.lock().await;
        let idx = state.position(session_id)?;
        let cleared = state.sessions.remove(idx);
        self.turns.remove(&session_id);
        state.lifecycle = SessionLifecycle::Cleared {
            previous: cleared.id,
        };
        info!(
            session_id = %cleared.id,
            discarded = cleared.messages.len(),
            "Chatbot session cleared"
        );

        let session = state.start_session();
        info!(session_id = %session.id, previous = %cleared.id, "Chatbot session created");

        let durability = self.persist(&state).await;
        Ok(Write {
            value: session,
            durability,
        })
    }

    /// The lock serializing sends to one session.
    fn turn(&self, session_id: SessionId) -> Arc<Mutex<()>> {
        Arc::clone(&self.turns.entry(session_id).or_default())
    }

    /// Write sessions and the current id to their slots again.
    pub async fn flush(&self) -> Result<(), StorageError> {
        let state = self.state.lock().await;
        self.write_back(&state).await
    }

    async fn write_back(&self, state: &ChatbotState) -> Result<(), StorageError> {
        save_collection(&self.slots, &self.sessions_key, state.sessions.as_slice()).await?;
        match state.current {
            Some(id) => {
                self.slots
                    .save(&self.current_key, &serde_json::json!(id))
                    .await
            }
            None => self.slots.remove(&self.current_key).await,
        }
    }

    async fn persist(&self, state: &ChatbotState) -> Durability {
        match self.write_back(state).await {
            Ok(()) => Durability::Persisted,
            Err(err) => {
                warn!(error = %err, "Chatbot write-back failed; change kept in memory only");
                Durability::MemoryOnly(err)
            }
        }
    }
}
