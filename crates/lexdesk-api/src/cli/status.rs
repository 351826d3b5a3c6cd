//! Status dashboard command.

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use super::format_relative_time;
use crate::state::AppState;

/// Display record counts, the chatbot session, and per-slot storage usage.
pub async fn status(state: &AppState, json: bool) -> Result<()> {
    let clients = state.clients.len().await;
    let messages = state.messaging.list_messages(None).await;
    let unread = messages.iter().filter(|m| !m.read).count();
    let threads = state.messaging.list_threads().await.len();
    let current_session = state.chatbot.current_session_id().await;
    let slots = state.slots.describe(&state.keys.prefix()).await?;

    if json {
        let slot_entries: Vec<serde_json::Value> = slots
            .iter()
            .map(|s| {
                serde_json::json!({"key": s.key, "bytes": s.bytes, "updated_at": s.updated_at})
            })
            .collect();
        let status = serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
            "data_dir": state.data_dir.display().to_string(),
            "namespace": state.keys.namespace(),
            "clients": clients,
            "messages": {
                "total": messages.len(),
                "unread": unread,
                "threads": threads,
            },
            "chatbot": {
                "current_session": current_session.map(|id| id.to_string()),
            },
            "slots": slot_entries,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!();
    println!("  {} LexDesk v{}", style("§").bold(), env!("CARGO_PKG_VERSION"));
    println!();

    println!("  {}", style("── Records ──").dim());
    println!("  Clients:  {}", style(clients).bold());
    println!("  Messages: {}", style(messages.len()).bold());
    if unread > 0 {
        println!("  Unread:   {}", style(unread).yellow());
    }
    println!("  Threads:  {}", threads);
    println!();

    println!("  {}", style("── Chatbot ──").dim());
    match current_session {
        Some(id) => println!("  Session:  {}", style(id).dim()),
        None => println!("  Session:  {}", style("none").dim()),
    }
    println!();

    println!("  {}", style("── Storage ──").dim());
    if slots.is_empty() {
        println!("  No slots written yet.");
    } else {
        let mut table = Table::new();
        table.load_preset(presets::UTF8_FULL_CONDENSED);
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(vec![
            Cell::new("Slot").fg(Color::White),
            Cell::new("Size").fg(Color::White),
            Cell::new("Saved").fg(Color::White),
        ]);
        for slot in &slots {
            table.add_row(vec![
                Cell::new(&slot.key).fg(Color::Cyan),
                Cell::new(format_bytes(slot.bytes)),
                Cell::new(format_relative_time(&slot.updated_at)).fg(Color::DarkGrey),
            ]);
        }
        println!("{table}");
    }
    println!();

    println!("  {}", style("── System ──").dim());
    println!("  Data dir:  {}", style(state.data_dir.display()).dim());
    let database = format!("{} (SQLite, WAL mode)", state.config.database_file);
    println!("  Database:  {}", style(database).dim());
    println!("  Namespace: {}", style(state.keys.namespace()).dim());
    if state.config.simulated_latency_ms > 0 {
        println!("  Latency:   {} ms simulated", state.config.simulated_latency_ms);
    }
    println!();

    Ok(())
}

fn format_bytes(n: usize) -> String {
    if n >= 1_048_576 {
        format!("{:.1} MiB", n as f64 / 1_048_576.0)
    } else if n >= 1_024 {
        format!("{:.1} KiB", n as f64 / 1_024.0)
    } else {
        format!("{n} B")
    }
}
