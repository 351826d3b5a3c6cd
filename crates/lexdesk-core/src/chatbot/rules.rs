//! Keyword rule engine for the intake assistant.

use lexdesk_types::chatbot::ChatbotMessage;
use lexdesk_types::config::{ChatbotConfig, ReplyRule};
use lexdesk_types::error::ReplyError;

use super::reply::{ReplyGenerator, last_user_message};

const DEFAULT_FALLBACK: &str = "I'm not sure I understood. I can help with appointments, \
     fees, office hours, documents, and case updates. For anything else, a member of \
     our team will follow up.";

const CONTEXT_ACK: &str = "Thanks, I've noted that.";

/// Built-in rules, checked in order.
pub fn default_rules() -> Vec<ReplyRule> {
    let rule = |keywords: &[&str], reply: &str| ReplyRule {
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
        reply: reply.to_string(),
    };

    vec![
        rule(
            &["appointment", "consultation", "schedule", "meeting", "book"],
            "I can help you book a consultation. Please share a few dates and times that \
             work for you and a short description of your matter.",
        ),
        rule(
            &["fee", "fees", "cost", "price", "rate", "billing", "invoice", "retainer"],
            "Initial consultations are free. After that, most matters are billed hourly or \
             on a flat fee agreed in your engagement letter.",
        ),
        rule(
            &["hours", "open", "closed", "weekend", "holiday"],
            "Our office is open Monday to Friday, 9:00 to 17:30.",
        ),
        rule(
            &["document", "documents", "upload", "file", "paperwork"],
            "You can send documents through the client portal or by email to your \
             attorney. Please don't send originals by post unless asked.",
        ),
        rule(
            &["case", "status", "progress", "update", "hearing"],
            "Your attorney will share case updates through the portal. If you have a \
             hearing coming up, you'll get a reminder two days before.",
        ),
        rule(
            &["hello", "hi", "hey", "good morning", "good afternoon"],
            "Hello! How can I help you today?",
        ),
    ]
}

/// Replies by matching keywords in the visitor's latest message.
///
/// Single-word keywords match whole words; multi-word keywords match as
/// phrases. The first matching rule wins.
#[derive(Debug, Clone)]
pub struct RuleBasedResponder {
    rules: Vec<ReplyRule>,
    fallback: String,
}

impl RuleBasedResponder {
    pub fn new(rules: Vec<ReplyRule>, fallback: impl Into<String>) -> Self {
        Self {
            rules,
            fallback: fallback.into(),
        }
    }

    /// Configured rules, or the built-in set when none are configured.
    pub fn from_config(config: &ChatbotConfig) -> Self {
        let rules = if config.rules.is_empty() {
            default_rules()
        } else {
            config.rules.clone()
        };
        let fallback = config
            .fallback_reply
            .clone()
            .unwrap_or_else(|| DEFAULT_FALLBACK.to_string());
        Self::new(rules, fallback)
    }

    pub fn rules(&self) -> &[ReplyRule] {
        &self.rules
    }

    /// The reply for one visitor utterance.
    pub fn respond_to(&self, text: &str) -> &str {
        let normalized = normalize(text);
        let words: Vec<&str> = normalized.split(' ').collect();

        self.rules
            .iter()
            .find(|rule| rule.keywords.iter().any(|k| keyword_matches(k, &normalized, &words)))
            .map(|rule| rule.reply.as_str())
            .unwrap_or(&self.fallback)
    }
}

impl Default for RuleBasedResponder {
    fn default() -> Self {
        Self::from_config(&ChatbotConfig::default())
    }
}

impl ReplyGenerator for RuleBasedResponder {
    fn name(&self) -> &str {
        "rules"
    }

    async fn reply(&self, history: &[ChatbotMessage]) -> Result<String, ReplyError> {
        let last = last_user_message(history).ok_or(ReplyError::NothingToReply)?;
        if last.is_context {
            return Ok(CONTEXT_ACK.to_string());
        }
        Ok(self.respond_to(&last.content).to_string())
    }
}

/// Lowercase and collapse every non-alphanumeric run into a single space.
fn normalize(text: &str) -> String {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn keyword_matches(keyword: &str, normalized: &str, words: &[&str]) -> bool {
    let keyword = normalize(keyword);
    if keyword.is_empty() {
        return false;
    }
    if keyword.contains(' ') {
        format!(" {normalized} ").contains(&format!(" {keyword} "))
    } else {
        words.contains(&keyword.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rules_match_keywords() {
        let bot = RuleBasedResponder::default();
        assert!(bot.respond_to("Can I book an appointment?").contains("consultation"));
        assert!(bot.respond_to("What are your FEES").contains("billed"));
        assert!(bot.respond_to("Are you open on the weekend?").contains("Monday"));
        assert!(bot.respond_to("hi there").starts_with("Hello"));
    }

    #[test]
    fn test_whole_word_matching() {
        let bot = RuleBasedResponder::default();
        // "this" contains "hi" but is not the word "hi".
        assert_eq!(bot.respond_to("this is about something else"), DEFAULT_FALLBACK);
    }

    #[test]
    fn test_phrase_keywords() {
        let bot = RuleBasedResponder::new(
            vec![ReplyRule {
                keywords: vec!["power of attorney".to_string()],
                reply: "We draft those.".to_string(),
            }],
            "fallback",
        );
        assert_eq!(bot.respond_to("I need a Power-of-Attorney!"), "We draft those.");
        assert_eq!(bot.respond_to("attorney power"), "fallback");
    }

    #[test]
    fn test_from_config_overrides() {
        let config = ChatbotConfig {
            rules: vec![ReplyRule {
                keywords: vec!["parking".to_string()],
                reply: "Level 2.".to_string(),
            }],
            fallback_reply: Some("Call us.".to_string()),
        };
        let bot = RuleBasedResponder::from_config(&config);
        assert_eq!(bot.rules().len(), 1);
        assert_eq!(bot.respond_to("where is parking"), "Level 2.");
        assert_eq!(bot.respond_to("hello"), "Call us.");
    }

    #[tokio::test]
    async fn test_reply_acknowledges_context_messages() {
        let bot = RuleBasedResponder::default();
        let history = vec![ChatbotMessage::user("Viewing case 2024-117", true)];
        assert_eq!(bot.reply(&history).await.unwrap(), CONTEXT_ACK);
    }

    #[tokio::test]
    async fn test_reply_requires_user_message() {
        let bot = RuleBasedResponder::default();
        assert_eq!(bot.reply(&[]).await, Err(ReplyError::NothingToReply));
    }
}
