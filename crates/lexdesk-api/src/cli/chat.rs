//! Chatbot CLI subcommands: send, history, clear, session.
//!
//! Every subcommand works on the visitor's current session unless
//! `--session` names another one.

use anyhow::{Context, Result};
use clap::Subcommand;
use console::style;
use dialoguer::Confirm;

use lexdesk_types::chatbot::{ChatbotMessage, ChatbotRole, ChatbotSession, SessionId};

use crate::state::AppState;

/// Chatbot subcommands.
#[derive(Subcommand)]
pub enum ChatCommand {
    /// Send a message to the assistant and print its reply.
    Send {
        /// What to say.
        content: String,

        /// Session to use instead of the current one.
        #[arg(long)]
        session: Option<String>,

        /// Attach as UI context (hidden from the visible history).
        #[arg(long)]
        context: bool,
    },

    /// Show the conversation so far.
    History {
        #[arg(long)]
        session: Option<String>,

        /// Include context messages.
        #[arg(long)]
        all: bool,
    },

    /// Discard the conversation and start a new session.
    Clear {
        #[arg(long)]
        session: Option<String>,

        /// Skip confirmation prompt.
        #[arg(long)]
        force: bool,
    },

    /// Show the current session.
    Session,
}

/// Handle a chatbot subcommand.
pub async fn handle_chat_command(cmd: ChatCommand, state: &AppState, json: bool) -> Result<()> {
    match cmd {
        ChatCommand::Send {
            content,
            session,
            context,
        } => send(state, &content, session.as_deref(), context, json).await,
        ChatCommand::History { session, all } => {
            history(state, session.as_deref(), all, json).await
        }
        ChatCommand::Clear { session, force } => {
            clear(state, session.as_deref(), force, json).await
        }
        ChatCommand::Session => show_session(state, json).await,
    }
}

fn parse_session_id(raw: Option<&str>) -> Result<Option<SessionId>> {
    raw.map(|raw| {
        raw.trim()
            .parse::<SessionId>()
            .with_context(|| format!("'{raw}' is not a valid session ID"))
    })
    .transpose()
}

/// Resume the requested or current session, starting one if neither resolves.
async fn acquire_session(state: &AppState, raw: Option<&str>) -> Result<ChatbotSession> {
    let requested = parse_session_id(raw)?;
    let session = state
        .chatbot
        .get_or_create_session(requested)
        .await
        .durable()
        .context("Chat session was not saved")?;

    if let Some(requested) = requested {
        if requested != session.id {
            tracing::warn!(
                requested = %requested,
                session_id = %session.id,
                "Requested session not found; started a new one"
            );
        }
    }
    Ok(session)
}

async fn send(
    state: &AppState,
    content: &str,
    session: Option<&str>,
    context: bool,
    json: bool,
) -> Result<()> {
    let session = acquire_session(state, session).await?;

    state
        .chatbot
        .send_message(session.id, content, context)
        .await?
        .durable()
        .context("Chat history was not saved")?;

    let history = state.chatbot.get_session_messages(session.id).await?;
    let reply = history
        .iter()
        .rev()
        .find(|m| m.role == ChatbotRole::Assistant)
        .context("Assistant did not reply")?;

    if json {
        let result = serde_json::json!({
            "session_id": session.id.to_string(),
            "reply": reply,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!();
    print_message(reply);
    println!();

    Ok(())
}

async fn history(state: &AppState, session: Option<&str>, all: bool, json: bool) -> Result<()> {
    let session = acquire_session(state, session).await?;
    let messages = if all {
        state.chatbot.get_session_messages(session.id).await?
    } else {
        state.chatbot.visible_messages(session.id).await?
    };

    if json {
        let result = serde_json::json!({
            "session_id": session.id.to_string(),
            "messages": messages,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!();
    println!(
        "  Session {} ({} messages)",
        style(session.id).dim(),
        messages.len()
    );
    println!();
    if messages.is_empty() {
        println!("  {} Nothing yet. Try: lexdesk chat send \"hello\"", style("i").blue().bold());
        println!();
        return Ok(());
    }
    for message in &messages {
        print_message(message);
    }
    println!();

    Ok(())
}

async fn clear(state: &AppState, session: Option<&str>, force: bool, json: bool) -> Result<()> {
    let session = acquire_session(state, session).await?;

    if !force && !json && !session.messages.is_empty() {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Discard {} message(s) and start a new conversation?",
                session.messages.len()
            ))
            .default(false)
            .interact()?;

        if !confirmed {
            println!("  Cancelled.");
            return Ok(());
        }
    }

    let fresh = state
        .chatbot
        .clear_session(session.id)
        .await?
        .durable()
        .context("New chat session was not saved")?;

    if json {
        println!(
            "{}",
            serde_json::json!({
                "cleared": session.id.to_string(),
                "session_id": fresh.id.to_string(),
            })
        );
    } else {
        println!("  {} Conversation cleared.", style("✓").green().bold());
        println!("  New session: {}", style(fresh.id).dim());
    }

    Ok(())
}

async fn show_session(state: &AppState, json: bool) -> Result<()> {
    let session = acquire_session(state, None).await?;
    let lifecycle = state.chatbot.lifecycle().await;

    if json {
        let result = serde_json::json!({
            "session_id": session.id.to_string(),
            "lifecycle": lifecycle,
            "messages": session.messages.len(),
            "created_at": session.created_at,
            "updated_at": session.updated_at,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!();
    println!("  {:<9} {}", style("Session:").bold(), style(session.id).cyan());
    println!("  {:<9} {}", style("Messages:").bold(), session.messages.len());
    println!(
        "  {:<9} {}",
        style("Started:").bold(),
        session.created_at.format("%Y-%m-%d %H:%M UTC")
    );
    println!(
        "  {:<9} {}",
        style("Updated:").bold(),
        session.updated_at.format("%Y-%m-%d %H:%M UTC")
    );
    println!();

    Ok(())
}

fn print_message(message: &ChatbotMessage) {
    let who = match (message.role, message.is_context) {
        (ChatbotRole::User, true) => style("context").dim(),
        (ChatbotRole::User, false) => style("you").green().bold(),
        (ChatbotRole::Assistant, _) => style("assistant").cyan().bold(),
    };
    println!(
        "  {} {} {}",
        style(message.timestamp.format("%H:%M")).dim(),
        who,
        message.content
    );
}
