//! CLI command definitions and dispatch for the `lexdesk` binary.
//!
//! Uses clap derive macros for argument parsing. The CLI follows a
//! noun-verb pattern (e.g., `lexdesk client create`, `lexdesk chat send`).

pub mod chat;
pub mod client;
pub mod message;
pub mod status;

use clap::{Parser, Subcommand};

/// Clients, messages, and the intake chatbot for a small law practice.
#[derive(Parser)]
#[command(name = "lexdesk", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for info, -vv for debug, -vvv for trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Emit log events as JSON lines on stderr.
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Export spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true, env = "LEXDESK_OTEL")]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage clients (create, list, show, update, delete, search).
    Client {
        #[command(subcommand)]
        action: client::ClientCommand,
    },

    /// Send and browse messages and their threads.
    #[command(alias = "msg")]
    Message {
        #[command(subcommand)]
        action: message::MessageCommand,
    },

    /// Talk to the intake assistant.
    Chat {
        #[command(subcommand)]
        action: chat::ChatCommand,
    },

    /// Store and database status dashboard.
    Status,
}

// --- Formatting helpers shared by the subcommands ---

pub(crate) fn format_relative_time(dt: &chrono::DateTime<chrono::Utc>) -> String {
    let now = chrono::Utc::now();
    let diff = now - *dt;

    if diff.num_minutes() < 1 {
        "just now".to_string()
    } else if diff.num_hours() < 1 {
        format!("{}m ago", diff.num_minutes())
    } else if diff.num_days() < 1 {
        format!("{}h ago", diff.num_hours())
    } else if diff.num_days() < 30 {
        format!("{}d ago", diff.num_days())
    } else {
        dt.format("%Y-%m-%d").to_string()
    }
}

/// Shorten `text` to at most `max_chars` characters, marking the cut with `...`.
pub(crate) fn truncate(text: &str, max_chars: usize) -> String {
    let single_line = text.replace('\n', " ");
    if single_line.chars().count() <= max_chars {
        return single_line;
    }
    let kept: String = single_line.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{kept}...")
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_message_send() {
        let cli = Cli::try_parse_from([
            "lexdesk", "--json", "message", "send", "--from", "u1", "--to", "u2", "--channel",
            "email", "Hello there",
        ])
        .unwrap();
        assert!(cli.json);
        match cli.command {
            Commands::Message {
                action: message::MessageCommand::Send { from, to, channel, content },
            } => {
                assert_eq!(from, "u1");
                assert_eq!(to, "u2");
                assert_eq!(channel, lexdesk_types::message::ChannelKind::Email);
                assert_eq!(content, "Hello there");
            }
            _ => panic!("expected message send"),
        }
    }

    #[test]
    fn test_parse_rejects_unknown_channel() {
        let parsed = Cli::try_parse_from([
            "lexdesk", "message", "send", "--from", "u1", "--to", "u2", "--channel", "fax", "hi",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_verbosity_counts() {
        let cli = Cli::try_parse_from(["lexdesk", "-vv", "status"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Commands::Status));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("line one\nline two", 40), "line one line two");
        assert_eq!(truncate("abcdefghijkl", 8), "abcde...");
        assert_eq!(truncate("ééééééé", 5), "éé...");
    }
}
