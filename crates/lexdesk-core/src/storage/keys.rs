//! Namespaced slot keys.

/// Slot names under one namespace.
///
/// Every store reads and writes only its own keys, so two stores (or two
/// deployments with different namespaces) never collide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotKeys {
    namespace: String,
}

impl SlotKeys {
    pub fn new(namespace: impl Into<String>) -> Self {
        let namespace = namespace.into();
        let namespace = namespace.trim().trim_end_matches('.').to_string();
        Self { namespace }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Prefix shared by every key in this namespace.
    pub fn prefix(&self) -> String {
        format!("{}.", self.namespace)
    }

    pub fn clients(&self) -> String {
        self.key("clients")
    }

    pub fn messages(&self) -> String {
        self.key("messages")
    }

    pub fn threads(&self) -> String {
        self.key("threads")
    }

    pub fn chatbot_sessions(&self) -> String {
        self.key("chatbot.sessions")
    }

    pub fn chatbot_current_session(&self) -> String {
        self.key("chatbot.current_session")
    }

    fn key(&self, name: &str) -> String {
        format!("{}.{name}", self.namespace)
    }
}

impl Default for SlotKeys {
    fn default() -> Self {
        Self::new("lexdesk")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_namespace() {
        let keys = SlotKeys::default();
        assert_eq!(keys.clients(), "lexdesk.clients");
        assert_eq!(keys.chatbot_current_session(), "lexdesk.chatbot.current_session");
        assert_eq!(keys.prefix(), "lexdesk.");
    }

    #[test]
    fn test_namespace_is_trimmed() {
        let keys = SlotKeys::new(" firm-a. ");
        assert_eq!(keys.namespace(), "firm-a");
        assert_eq!(keys.threads(), "firm-a.threads");
    }

    #[test]
    fn test_keys_are_distinct() {
        let keys = SlotKeys::default();
        let all = [
            keys.clients(),
            keys.messages(),
            keys.threads(),
            keys.chatbot_sessions(),
            keys.chatbot_current_session(),
        ];
        for (i, a) in all.iter().enumerate() {
            for b in &all[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
