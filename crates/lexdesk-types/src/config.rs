//! Configuration types for LexDesk.
//!
//! `LexdeskConfig` represents the top-level `config.toml` in the data
//! directory. Every field has a default so an empty file is valid.

use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LexdeskConfig {
    /// Prefix for every slot key, so several deployments can share a backend.
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Artificial delay applied to every store operation, in milliseconds.
    #[serde(default)]
    pub simulated_latency_ms: u64,

    /// SQLite file name inside the data directory.
    #[serde(default = "default_database_file")]
    pub database_file: String,

    #[serde(default)]
    pub chatbot: ChatbotConfig,
}

fn default_namespace() -> String {
    "lexdesk".to_string()
}

fn default_database_file() -> String {
    "lexdesk.db".to_string()
}

impl Default for LexdeskConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            simulated_latency_ms: 0,
            database_file: default_database_file(),
            chatbot: ChatbotConfig::default(),
        }
    }
}

/// Settings for the rule-based intake assistant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatbotConfig {
    /// Replaces the built-in rule set when non-empty.
    #[serde(default)]
    pub rules: Vec<ReplyRule>,

    /// Reply used when no rule matches. Built-in text when unset.
    #[serde(default)]
    pub fallback_reply: Option<String>,
}

/// A keyword rule: if any keyword appears in the visitor's message, reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplyRule {
    pub keywords: Vec<String>,
    pub reply: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default_values() {
        let config = LexdeskConfig::default();
        assert_eq!(config.namespace, "lexdesk");
        assert_eq!(config.simulated_latency_ms, 0);
        assert_eq!(config.database_file, "lexdesk.db");
        assert!(config.chatbot.rules.is_empty());
    }

    #[test]
    fn test_config_deserialize_empty() {
        let config: LexdeskConfig = toml::from_str("").unwrap();
        assert_eq!(config, LexdeskConfig::default());
    }

    #[test]
    fn test_config_deserialize_with_values() {
        let toml_str = r#"
namespace = "firm-a"
simulated_latency_ms = 250

[chatbot]
fallback_reply = "Please call the front desk."

[[chatbot.rules]]
keywords = ["parking", "garage"]
reply = "Visitor parking is on level 2."
"#;
        let config: LexdeskConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.namespace, "firm-a");
        assert_eq!(config.simulated_latency_ms, 250);
        assert_eq!(config.database_file, "lexdesk.db");
        assert_eq!(config.chatbot.rules.len(), 1);
        assert_eq!(config.chatbot.rules[0].keywords, vec!["parking", "garage"]);
        assert_eq!(
            config.chatbot.fallback_reply.as_deref(),
            Some("Please call the front desk.")
        );
    }
}
