//! ReplyGenerator trait definition.
//!
//! The session manager does not care where replies come from: a keyword
//! rule engine, a remote completion service, or a canned echo for tests.

use lexdesk_types::chatbot::{ChatbotMessage, ChatbotRole};
use lexdesk_types::error::ReplyError;

/// Trait for assistant reply backends.
///
/// Uses RPITIT (native async fn in traits, Rust 2024 edition).
pub trait ReplyGenerator: Send + Sync {
    /// Human-readable generator name for log lines.
    fn name(&self) -> &str;

    /// Produce the assistant reply to the latest user message in `history`.
    fn reply(
        &self,
        history: &[ChatbotMessage],
    ) -> impl std::future::Future<Output = Result<String, ReplyError>> + Send;
}

/// The most recent user-authored message, if any.
pub fn last_user_message(history: &[ChatbotMessage]) -> Option<&ChatbotMessage> {
    history.iter().rev().find(|m| m.role == ChatbotRole::User)
}

/// Replies with the visitor's own words. Useful in tests and demos.
#[derive(Debug, Clone, Default)]
pub struct EchoResponder;

impl ReplyGenerator for EchoResponder {
    fn name(&self) -> &str {
        "echo"
    }

    async fn reply(&self, history: &[ChatbotMessage]) -> Result<String, ReplyError> {
        let last = last_user_message(history).ok_or(ReplyError::NothingToReply)?;
        Ok(format!("You said: {}", last.content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_echo_uses_latest_user_message() {
        let history = vec![
            ChatbotMessage::user("first", false),
            ChatbotMessage::assistant("ok"),
            ChatbotMessage::user("second", false),
        ];
        let reply = EchoResponder.reply(&history).await.unwrap();
        assert_eq!(reply, "You said: second");
    }

    #[tokio::test]
    async fn test_echo_without_user_message_fails() {
        let history = vec![ChatbotMessage::assistant("welcome")];
        assert_eq!(
            EchoResponder.reply(&history).await,
            Err(ReplyError::NothingToReply)
        );
        assert!(last_user_message(&[]).is_none());
    }
}
