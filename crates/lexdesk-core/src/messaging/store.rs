//! Message and chat-thread store.
//!
//! Owns the flat message collection and the thread index derived from it.
//! Sending a message resolves its thread with a find-or-create that runs
//! under the same lock as the append, so concurrent senders for one pair can
//! never produce two threads.

use std::collections::HashSet;

use chrono::Utc;
use lexdesk_types::error::{StorageError, StoreError, ValidationError};
use lexdesk_types::message::{
    ChannelKind, ChatThread, Message, MessageId, ParticipantId, ParticipantPair, ThreadId,
};
use lexdesk_types::storage::{Durability, Write};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::latency::Latency;
use crate::storage::keys::SlotKeys;
use crate::storage::slot_store::{SlotStore, load_collection, save_collection};

#[derive(Debug, Default)]
struct MessagingState {
    messages: Vec<Message>,
    threads: Vec<ChatThread>,
}

impl MessagingState {
    /// Append `message` to the thread for its pair, creating it if needed.
    fn resolve_thread(&mut self, message: &Message) -> ThreadId {
        let pair = message.participants();
        if let Some(thread) = self.threads.iter_mut().find(|t| t.participants == pair) {
            thread.append(message);
            return thread.id;
        }
        let thread = ChatThread::start(message);
        let id = thread.id;
        info!(thread_id = %id, participants = %pair, "Chat thread created");
        self.threads.push(thread);
        id
    }

    /// Whether every message is filed under some thread.
    fn index_covers(messages: &[Message], threads: &[ChatThread]) -> bool {
        let indexed: HashSet<MessageId> = threads
            .iter()
            .flat_map(|t| t.message_ids.iter().copied())
            .collect();
        messages.iter().all(|m| indexed.contains(&m.id))
    }

    fn rebuild_threads(messages: &[Message]) -> Vec<ChatThread> {
        let mut state = MessagingState::default();
        for message in messages {
            state.resolve_thread(message);
        }
        state.threads
    }
}

/// Store for messages and their participant-pair threads.
pub struct MessagingStore<S: SlotStore> {
    slots: S,
    messages_key: String,
    threads_key: String,
    state: Mutex<MessagingState>,
    latency: Latency,
}

impl<S: SlotStore> MessagingStore<S> {
    /// Open the store, loading messages and threads from their slots.
    ///
    /// The two collections live in separate slots. If the stored thread
    /// index is missing or older than the messages, it is rebuilt from them.
    pub async fn open(
        slots: S,
        keys: &SlotKeys,
        latency: Latency,
    ) -> Result<Self, StorageError> {
        let messages_key = keys.messages();
        let threads_key = keys.threads();

        let messages: Vec<Message> = load_collection(&slots, &messages_key).await?;
        let mut threads: Vec<ChatThread> = load_collection(&slots, &threads_key).await?;
        if !MessagingState::index_covers(&messages, &threads) {
            let stale = threads.len();
            threads = MessagingState::rebuild_threads(&messages);
            warn!(
                stale,
                rebuilt = threads.len(),
                "Thread index out of date; rebuilt from messages"
            );
        }

        info!(
            messages = messages.len(),
            threads = threads.len(),
            "Messaging store opened"
        );
        Ok(Self::with_state(slots, keys, messages, threads, latency))
    }

    /// Build a store from injected initial state without reading any slot.
    pub fn with_state(
        slots: S,
        keys: &SlotKeys,
        messages: Vec<Message>,
        threads: Vec<ChatThread>,
        latency: Latency,
    ) -> Self {
        Self {
            slots,
            messages_key: keys.messages(),
            threads_key: keys.threads(),
            state: Mutex::new(MessagingState { messages, threads }),
            latency,
        }
    }

    /// An empty store.
    pub fn empty(slots: S, keys: &SlotKeys, latency: Latency) -> Self {
        Self::with_state(slots, keys, Vec::new(), Vec::new(), latency)
    }

    /// All messages in creation order, optionally limited to one channel.
    pub async fn list_messages(&self, channel: Option<ChannelKind>) -> Vec<Message> {
        self.latency.simulate().await;
        self.state
            .lock()
            .await
            .messages
            .iter()
            .filter(|m| channel.is_none_or(|c| m.channel == c))
            .cloned()
            .collect()
    }

    pub async fn get_message(&self, id: MessageId) -> Option<Message> {
        self.latency.simulate().await;
        self.state
            .lock()
            .await
            .messages
            .iter()
            .find(|m| m.id == id)
            .cloned()
    }

    /// Send a message and file it under the thread for its participant pair.
    ///
    /// Blank sender, recipient, or content is rejected before anything is
    /// stored. Sending to yourself is allowed and forms a self-thread.
    pub async fn send_message(
        &self,
        sender_id: &str,
        recipient_id: &str,
        content: &str,
        channel: ChannelKind,
    ) -> Result<Write<Message>, StoreError> {
        self.latency.simulate().await;

        let sender_id = ParticipantId::parse(sender_id, "sender_id")?;
        let recipient_id = ParticipantId::parse(recipient_id, "recipient_id")?;
        if content.trim().is_empty() {
            return Err(ValidationError::EmptyField("content").into());
        }

        let mut state = self.state.lock().await;
        let message = Message {
            id: MessageId::new(),
            sender_id,
            recipient_id,
            content: content.to_string(),
            timestamp: Utc::now(),
            read: false,
            channel,
        };
        state.messages.push(message.clone());
        let thread_id = state.resolve_thread(&message);
        debug!(
            message_id = %message.id,
            thread_id = %thread_id,
            channel = %channel,
            "Message sent"
        );

        let durability = self.persist(&state).await;
        Ok(Write {
            value: message,
            durability,
        })
    }

    /// Mark a message read.
    ///
    /// The value is `true` only when the flag actually flipped. Already-read
    /// and unknown ids report `false` without writing.
    pub async fn mark_read(&self, id: MessageId) -> Write<bool> {
        self.latency.simulate().await;

        let mut state = self.state.lock().await;
        let Some(message) = state.messages.iter_mut().find(|m| m.id == id) else {
            return Write::persisted(false);
        };
        if message.read {
            return Write::persisted(false);
        }
        message.read = true;
        debug!(message_id = %id, "Message marked read");

        let durability = self.persist(&state).await;
        Write {
            value: true,
            durability,
        }
    }

    /// All threads. Callers must not rely on the order.
    pub async fn list_threads(&self) -> Vec<ChatThread> {
        self.latency.simulate().await;
        self.state.lock().await.threads.clone()
    }

    pub async fn get_thread(&self, id: ThreadId) -> Option<ChatThread> {
        self.latency.simulate().await;
        self.state
            .lock()
            .await
            .threads
            .iter()
            .find(|t| t.id == id)
            .cloned()
    }

    /// The thread between `a` and `b`, in either order.
    pub async fn get_thread_by_participants(&self, a: &str, b: &str) -> Option<ChatThread> {
        self.latency.simulate().await;
        let (Ok(a), Ok(b)) = (
            ParticipantId::parse(a, "participant"),
            ParticipantId::parse(b, "participant"),
        ) else {
            return None;
        };
        let pair = ParticipantPair::new(a, b);
        self.state
            .lock()
            .await
            .threads
            .iter()
            .find(|t| t.participants == pair)
            .cloned()
    }

    /// A thread's messages in chronological order.
    pub async fn thread_messages(&self, thread_id: ThreadId) -> Option<Vec<Message>> {
        self.latency.simulate().await;
        let state = self.state.lock().await;
        let thread = state.threads.iter().find(|t| t.id == thread_id)?;
        Some(
            thread
                .message_ids
                .iter()
                .filter_map(|id| state.messages.iter().find(|m| m.id == *id))
                .cloned()
                .collect(),
        )
    }

    /// Number of unread messages addressed to `participant`.
    pub async fn unread_count(&self, participant: &str) -> usize {
        self.latency.simulate().await;
        let participant = participant.trim();
        self.state
            .lock()
            .await
            .messages
            .iter()
            .filter(|m| !m.read && m.recipient_id.as_str() == participant)
            .count()
    }

    /// Write both collections to their slots again.
    pub async fn flush(&self) -> Result<(), StorageError> {
        let state = self.state.lock().await;
        save_collection(&self.slots, &self.messages_key, state.messages.as_slice()).await?;
        save_collection(&self.slots, &self.threads_key, state.threads.as_slice()).await
    }

    async fn persist(&self, state: &MessagingState) -> Durability {
        let result: Result<(), StorageError> = async {
            save_collection(&self.slots, &self.messages_key, state.messages.as_slice()).await?;
            save_collection(&self.slots, &self.threads_key, state.threads.as_slice()).await
        }
        .await;

        match result {
            Ok(()) => Durability::Persisted,
            Err(err) => {
                warn!(error = %err, "Messaging write-back failed; change kept in memory only");
                Durability::MemoryOnly(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemorySlotStore;
    use std::sync::Arc;

    fn store() -> (MessagingStore<MemorySlotStore>, MemorySlotStore) {
        let slots = MemorySlotStore::new();
        let store = MessagingStore::empty(slots.clone(), &SlotKeys::default(), Latency::none());
        (store, slots)
    }

    /// Memory slots whose thread slot cannot be written.
    struct ThreadsReadOnly(MemorySlotStore);

    impl SlotStore for ThreadsReadOnly {
        async fn load(&self, key: &str) -> Result<Option<serde_json::Value>, StorageError> {
            self.0.load(key).await
        }

        async fn save(&self, key: &str, value: &serde_json::Value) -> Result<(), StorageError> {
            if key.ends_with(".threads") {
                return Err(StorageError::Backend("threads slot is read-only".to_string()));
            }
            self.0.save(key, value).await
        }

        async fn remove(&self, key: &str) -> Result<(), StorageError> {
            self.0.remove(key).await
        }

        async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
            self.0.list_keys(prefix).await
        }
    }

    async fn send<S: SlotStore>(
        store: &MessagingStore<S>,
        from: &str,
        to: &str,
        text: &str,
    ) -> Message {
        store
            .send_message(from, to, text, ChannelKind::DirectChat)
            .await
            .unwrap()
            .into_inner()
    }

    #[tokio::test]
    async fn test_reply_lands_in_same_thread() {
        let (store, _) = store();
        let hi = send(&store, "u1", "u2", "hi").await;
        let hello = send(&store, "u2", "u1", "hello").await;

        let threads = store.list_threads().await;
        assert_eq!(threads.len(), 1);
        assert_eq!(threads[0].message_ids, vec![hi.id, hello.id]);
        assert_eq!(threads[0].updated_at, hello.timestamp);

        let ab = store.get_thread_by_participants("u1", "u2").await.unwrap();
        let ba = store.get_thread_by_participants("u2", "u1").await.unwrap();
        assert_eq!(ab, ba);

        let history = store.thread_messages(ab.id).await.unwrap();
        let contents: Vec<&str> = history.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["hi", "hello"]);
    }

    #[tokio::test]
    async fn test_distinct_pairs_get_distinct_threads() {
        let (store, _) = store();
        send(&store, "u1", "u2", "a").await;
        send(&store, "u1", "u3", "b").await;
        send(&store, "u3", "u1", "c").await;

        assert_eq!(store.list_threads().await.len(), 2);
        let t13 = store.get_thread_by_participants("u3", "u1").await.unwrap();
        assert_eq!(t13.message_ids.len(), 2);
        assert!(store.get_thread_by_participants("u2", "u3").await.is_none());
    }

    #[tokio::test]
    async fn test_concurrent_sends_create_one_thread() {
        let (store, _) = store();
        let store = Arc::new(store);

        let mut handles = Vec::new();
        for i in 0..32 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                let (from, to) = if i % 2 == 0 { ("u1", "u2") } else { ("u2", "u1") };
                store
                    .send_message(from, to, &format!("msg {i}"), ChannelKind::Sms)
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let threads = store.list_threads().await;
        assert_eq!(threads.len(), 1);
        assert_eq!(threads[0].message_ids.len(), 32);
        assert_eq!(store.list_messages(None).await.len(), 32);
    }

    #[tokio::test]
    async fn test_send_validates_input() {
        let (store, slots) = store();
        for (from, to, text, field) in [
            ("", "u2", "hi", "sender_id"),
            ("u1", "  ", "hi", "recipient_id"),
            ("u1", "u2", "   ", "content"),
        ] {
            let err = store
                .send_message(from, to, text, ChannelKind::Email)
                .await
                .unwrap_err();
            assert_eq!(err, StoreError::Validation(ValidationError::EmptyField(field)));
        }
        assert!(store.list_messages(None).await.is_empty());
        assert!(store.list_threads().await.is_empty());
        assert!(slots.is_empty());
    }

    #[tokio::test]
    async fn test_list_messages_filters_by_channel() {
        let (store, _) = store();
        store.send_message("u1", "u2", "chat", ChannelKind::DirectChat).await.unwrap();
        store.send_message("u1", "u2", "mail", ChannelKind::Email).await.unwrap();
        store.send_message("u2", "u1", "text", ChannelKind::Sms).await.unwrap();

        let all = store.list_messages(None).await;
        let contents: Vec<&str> = all.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["chat", "mail", "text"]);

        let email = store.list_messages(Some(ChannelKind::Email)).await;
        assert_eq!(email.len(), 1);
        assert_eq!(email[0].content, "mail");
        // Channel does not split threads.
        assert_eq!(store.list_threads().await.len(), 1);
    }

    #[tokio::test]
    async fn test_mark_read_is_idempotent() {
        let (store, _) = store();
        let msg = send(&store, "u1", "u2", "hi").await;
        assert!(!msg.read);
        assert_eq!(store.unread_count("u2").await, 1);

        assert!(store.mark_read(msg.id).await.into_inner());
        assert!(store.get_message(msg.id).await.unwrap().read);

        assert!(!store.mark_read(msg.id).await.into_inner());
        assert!(store.get_message(msg.id).await.unwrap().read);
        assert_eq!(store.unread_count("u2").await, 0);

        assert!(!store.mark_read(MessageId::new()).await.into_inner());
    }

    #[tokio::test]
    async fn test_reopen_restores_messages_and_threads() {
        let (store, slots) = store();
        send(&store, "u1", "u2", "hi").await;
        send(&store, "u2", "u1", "hello").await;

        let reopened = MessagingStore::open(slots, &SlotKeys::default(), Latency::none())
            .await
            .unwrap();
        assert_eq!(reopened.list_messages(None).await.len(), 2);
        assert_eq!(reopened.list_threads().await, store.list_threads().await);
    }

    #[tokio::test]
    async fn test_open_rebuilds_missing_thread_index() {
        let (store, slots) = store();
        send(&store, "u1", "u2", "hi").await;
        send(&store, "u2", "u1", "hello").await;
        send(&store, "u1", "u3", "other").await;
        slots.remove(&SlotKeys::default().threads()).await.unwrap();

        let reopened = MessagingStore::open(slots, &SlotKeys::default(), Latency::none())
            .await
            .unwrap();
        assert_eq!(reopened.list_threads().await.len(), 2);
        let thread = reopened.get_thread_by_participants("u2", "u1").await.unwrap();
        assert_eq!(thread.message_ids.len(), 2);
    }

    #[tokio::test]
    async fn test_open_rebuilds_thread_index_older_than_messages() {
        let (store, slots) = store();
        send(&store, "u1", "u3", "first").await;
        drop(store);

        let keys = SlotKeys::default();
        let partial = MessagingStore::open(ThreadsReadOnly(slots.clone()), &keys, Latency::none())
            .await
            .unwrap();
        let write = partial
            .send_message("u1", "u2", "hi", ChannelKind::DirectChat)
            .await
            .unwrap();
        assert!(!write.is_durable());
        let hi = write.into_inner();
        drop(partial);

        let reopened = MessagingStore::open(slots, &keys, Latency::none()).await.unwrap();
        assert_eq!(reopened.list_messages(None).await.len(), 2);
        assert_eq!(reopened.list_threads().await.len(), 2);
        let thread = reopened.get_thread_by_participants("u1", "u2").await.unwrap();
        assert_eq!(thread.message_ids, vec![hi.id]);

        let hello = send(&reopened, "u2", "u1", "hello").await;
        let thread = reopened.get_thread_by_participants("u2", "u1").await.unwrap();
        assert_eq!(thread.message_ids, vec![hi.id, hello.id]);
    }

    #[tokio::test]
    async fn test_failed_write_back_reports_memory_only() {
        let (store, slots) = store();
        slots.set_fail_writes(true);

        let write = store
            .send_message("u1", "u2", "hi", ChannelKind::DirectChat)
            .await
            .unwrap();
        assert!(!write.is_durable());
        assert_eq!(store.list_threads().await.len(), 1);

        slots.set_fail_writes(false);
        store.flush().await.unwrap();
        let reopened = MessagingStore::open(slots, &SlotKeys::default(), Latency::none())
            .await
            .unwrap();
        assert_eq!(reopened.list_messages(None).await.len(), 1);
    }
}
