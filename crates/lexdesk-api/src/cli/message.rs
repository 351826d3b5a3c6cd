//! Messaging CLI subcommands: send, list, read, threads, thread, unread.

use anyhow::{Context, Result};
use clap::Subcommand;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use lexdesk_types::message::{ChannelKind, ChatThread, Message, MessageId, ThreadId};

use super::{format_relative_time, truncate};
use crate::state::AppState;

/// Messaging subcommands.
#[derive(Subcommand)]
pub enum MessageCommand {
    /// Send a message; it is filed under the thread for its participant pair.
    Send {
        /// Sender participant ID.
        #[arg(long)]
        from: String,

        /// Recipient participant ID.
        #[arg(long)]
        to: String,

        /// Channel: direct_chat, email, or sms.
        #[arg(long, default_value = "direct_chat")]
        channel: ChannelKind,

        /// Message body.
        content: String,
    },

    /// List messages, oldest first.
    #[command(alias = "ls")]
    List {
        /// Only messages sent over this channel.
        #[arg(long)]
        channel: Option<ChannelKind>,

        /// Only unread messages addressed to this participant.
        #[arg(long)]
        unread_for: Option<String>,
    },

    /// Mark a message read.
    Read {
        /// Message ID.
        id: String,
    },

    /// List every chat thread, most recently active first.
    Threads,

    /// Show a thread's messages, by thread ID or by participant pair.
    Thread {
        /// Thread ID.
        #[arg(required_unless_present = "between", conflicts_with = "between")]
        id: Option<String>,

        /// The two participants of the thread, in either order.
        #[arg(long, num_args = 2, value_names = ["A", "B"])]
        between: Option<Vec<String>>,
    },

    /// Count unread messages addressed to a participant.
    Unread {
        participant: String,
    },
}

/// Handle a messaging subcommand.
pub async fn handle_message_command(
    cmd: MessageCommand,
    state: &AppState,
    json: bool,
) -> Result<()> {
    match cmd {
        MessageCommand::Send {
            from,
            to,
            channel,
            content,
        } => send_message(state, &from, &to, channel, &content, json).await,
        MessageCommand::List {
            channel,
            unread_for,
        } => list_messages(state, channel, unread_for.as_deref(), json).await,
        MessageCommand::Read { id } => mark_read(state, &id, json).await,
        MessageCommand::Threads => list_threads(state, json).await,
        MessageCommand::Thread { id, between } => {
            show_thread(state, id.as_deref(), between, json).await
        }
        MessageCommand::Unread { participant } => unread_count(state, &participant, json).await,
    }
}

async fn send_message(
    state: &AppState,
    from: &str,
    to: &str,
    channel: ChannelKind,
    content: &str,
    json: bool,
) -> Result<()> {
    let message = state
        .messaging
        .send_message(from, to, content, channel)
        .await?
        .durable()
        .context("Message was not saved")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&message)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} Sent to {} via {}",
        style("✓").green().bold(),
        style(&message.recipient_id).cyan(),
        message.channel,
    );
    println!("  {} {}", style("ID:").bold(), style(message.id).dim());
    println!();

    Ok(())
}

async fn list_messages(
    state: &AppState,
    channel: Option<ChannelKind>,
    unread_for: Option<&str>,
    json: bool,
) -> Result<()> {
    let mut messages = state.messaging.list_messages(channel).await;
    if let Some(participant) = unread_for {
        let participant = participant.trim();
        messages.retain(|m| !m.read && m.recipient_id.as_str() == participant);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&messages)?);
        return Ok(());
    }

    if messages.is_empty() {
        println!();
        println!("  {} No messages.", style("i").blue().bold());
        println!("     Send one with: lexdesk message send --from <id> --to <id> <text>");
        println!();
        return Ok(());
    }

    println!();
    println!("{}", message_table(&messages));
    println!("  {} message(s)", messages.len());
    println!();

    Ok(())
}

async fn mark_read(state: &AppState, raw_id: &str, json: bool) -> Result<()> {
    let id: MessageId = raw_id
        .trim()
        .parse()
        .with_context(|| format!("'{raw_id}' is not a valid message ID"))?;

    if state.messaging.get_message(id).await.is_none() {
        anyhow::bail!("Message '{id}' not found");
    }

    let changed = state
        .messaging
        .mark_read(id)
        .await
        .durable()
        .context("Read flag was not saved")?;

    if json {
        println!(
            "{}",
            serde_json::json!({"id": id.to_string(), "read": true, "changed": changed})
        );
    } else if changed {
        println!("  {} Message marked read.", style("✓").green().bold());
    } else {
        println!("  {} Message was already read.", style("i").blue().bold());
    }

    Ok(())
}

async fn list_threads(state: &AppState, json: bool) -> Result<()> {
    let mut threads = state.messaging.list_threads().await;
    threads.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

    if json {
        println!("{}", serde_json::to_string_pretty(&threads)?);
        return Ok(());
    }

    if threads.is_empty() {
        println!();
        println!("  {} No threads yet.", style("i").blue().bold());
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("ID").fg(Color::White),
        Cell::new("Participants").fg(Color::White),
        Cell::new("Messages").fg(Color::White),
        Cell::new("Last activity").fg(Color::White),
    ]);

    for thread in &threads {
        table.add_row(vec![
            Cell::new(thread.id.to_string()).fg(Color::DarkGrey),
            Cell::new(thread.participants.to_string()).fg(Color::Cyan),
            Cell::new(thread.message_ids.len()),
            Cell::new(format_relative_time(&thread.updated_at)).fg(Color::DarkGrey),
        ]);
    }

    println!();
    println!("{table}");
    println!();

    Ok(())
}

async fn show_thread(
    state: &AppState,
    raw_id: Option<&str>,
    between: Option<Vec<String>>,
    json: bool,
) -> Result<()> {
    let thread = resolve_thread(state, raw_id, between).await?;
    let messages = state
        .messaging
        .thread_messages(thread.id)
        .await
        .with_context(|| format!("Thread '{}' not found", thread.id))?;

    if json {
        let result = serde_json::json!({
            "thread": thread,
            "messages": messages,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!();
    println!(
        "  Thread {} ({} messages)",
        style(&thread.participants).cyan().bold(),
        messages.len()
    );
    println!();
    for message in &messages {
        let marker = if message.read {
            style("·").dim()
        } else {
            style("●").yellow()
        };
        println!(
            "  {} {} {} {}",
            marker,
            style(message.timestamp.format("%Y-%m-%d %H:%M")).dim(),
            style(format!("{}:", message.sender_id)).bold(),
            message.content
        );
    }
    println!();

    Ok(())
}

async fn resolve_thread(
    state: &AppState,
    raw_id: Option<&str>,
    between: Option<Vec<String>>,
) -> Result<ChatThread> {
    if let Some(raw_id) = raw_id {
        let id: ThreadId = raw_id
            .trim()
            .parse()
            .with_context(|| format!("'{raw_id}' is not a valid thread ID"))?;
        return state
            .messaging
            .get_thread(id)
            .await
            .with_context(|| format!("Thread '{id}' not found"));
    }

    match between.as_deref() {
        Some([a, b]) => state
            .messaging
            .get_thread_by_participants(a, b)
            .await
            .with_context(|| format!("No thread between '{a}' and '{b}'")),
        _ => anyhow::bail!("Pass a thread ID or --between <A> <B>"),
    }
}

async fn unread_count(state: &AppState, participant: &str, json: bool) -> Result<()> {
    let count = state.messaging.unread_count(participant).await;

    if json {
        println!(
            "{}",
            serde_json::json!({"participant": participant.trim(), "unread": count})
        );
    } else {
        println!(
            "  {} unread message(s) for {}",
            style(count).bold(),
            style(participant.trim()).cyan()
        );
    }

    Ok(())
}

fn message_table(messages: &[Message]) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("ID").fg(Color::White),
        Cell::new("From").fg(Color::White),
        Cell::new("To").fg(Color::White),
        Cell::new("Channel").fg(Color::White),
        Cell::new("Content").fg(Color::White),
        Cell::new("Sent").fg(Color::White),
    ]);

    for m in messages {
        let content = Cell::new(truncate(&m.content, 50));
        let content = if m.read { content } else { content.fg(Color::Yellow) };
        table.add_row(vec![
            Cell::new(m.id.to_string()).fg(Color::DarkGrey),
            Cell::new(m.sender_id.as_str()).fg(Color::Cyan),
            Cell::new(m.recipient_id.as_str()),
            Cell::new(m.channel.to_string()),
            content,
            Cell::new(format_relative_time(&m.timestamp)).fg(Color::DarkGrey),
        ]);
    }

    table
}
