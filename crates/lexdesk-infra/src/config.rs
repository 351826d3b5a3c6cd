//! Configuration loader for LexDesk.
//!
//! Reads `config.toml` from the data directory (`~/.lexdesk/` in production)
//! and deserializes it into [`LexdeskConfig`]. Falls back to defaults when
//! the file is missing or malformed.

use std::path::Path;

use lexdesk_types::config::LexdeskConfig;

/// Load configuration from `{data_dir}/config.toml`.
///
/// - If the file does not exist, returns [`LexdeskConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and returns the default.
pub async fn load_config(data_dir: &Path) -> LexdeskConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return LexdeskConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return LexdeskConfig::default();
        }
    };

    match toml::from_str::<LexdeskConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            LexdeskConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_config_missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).await;
        assert_eq!(config, LexdeskConfig::default());
        assert_eq!(config.namespace, "lexdesk");
    }

    #[tokio::test]
    async fn load_config_valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(
            tmp.path().join("config.toml"),
            r#"
namespace = "smith_and_co"
simulated_latency_ms = 250

[chatbot]
fallback_reply = "Please call the front desk."

[[chatbot.rules]]
keywords = ["parking"]
reply = "Visitor parking is on level 2."
"#,
        )
        .await
        .unwrap();

        let config = load_config(tmp.path()).await;
        assert_eq!(config.namespace, "smith_and_co");
        assert_eq!(config.simulated_latency_ms, 250);
        assert_eq!(config.database_file, "lexdesk.db");
        assert_eq!(config.chatbot.rules.len(), 1);
        assert_eq!(
            config.chatbot.fallback_reply.as_deref(),
            Some("Please call the front desk.")
        );
    }

    #[tokio::test]
    async fn load_config_invalid_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join("config.toml"), "this is not { valid toml !!!")
            .await
            .unwrap();

        let config = load_config(tmp.path()).await;
        assert_eq!(config, LexdeskConfig::default());
    }
}
