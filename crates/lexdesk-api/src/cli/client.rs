//! Client CLI subcommands: create, list, show, update, delete, search.

use anyhow::{Context, Result};
use clap::Subcommand;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use dialoguer::{Confirm, Input};

use lexdesk_types::client::{Client, ClientId, ClientPatch, NewClient};

use super::{format_relative_time, truncate};
use crate::state::AppState;

/// Client subcommands.
#[derive(Subcommand)]
pub enum ClientCommand {
    /// Create a client (prompts for the name when omitted).
    Create {
        /// Full name.
        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        phone: Option<String>,

        #[arg(long)]
        address: Option<String>,

        #[arg(long)]
        company: Option<String>,

        /// Tag to attach (repeatable).
        #[arg(short, long = "tag")]
        tags: Vec<String>,

        #[arg(long, default_value = "")]
        notes: String,
    },

    /// List clients, optionally only those carrying a tag.
    #[command(alias = "ls")]
    List {
        #[arg(long)]
        tag: Option<String>,
    },

    /// Show one client.
    Show {
        /// Client ID.
        id: String,
    },

    /// Update fields of a client. An empty value clears an optional field.
    Update {
        /// Client ID.
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        phone: Option<String>,

        #[arg(long)]
        address: Option<String>,

        #[arg(long)]
        company: Option<String>,

        /// Replace the tag list (repeatable).
        #[arg(short, long = "tag")]
        tags: Vec<String>,

        /// Remove every tag.
        #[arg(long, conflicts_with = "tags")]
        clear_tags: bool,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Delete a client.
    #[command(alias = "rm")]
    Delete {
        /// Client ID.
        id: String,

        /// Skip confirmation prompt.
        #[arg(long)]
        force: bool,
    },

    /// Search clients by name, email, company, or tag.
    Search {
        query: String,
    },
}

/// Handle a client subcommand.
pub async fn handle_client_command(cmd: ClientCommand, state: &AppState, json: bool) -> Result<()> {
    match cmd {
        ClientCommand::Create {
            name,
            email,
            phone,
            address,
            company,
            tags,
            notes,
        } => {
            let full_name = match name {
                Some(n) => n,
                None => Input::<String>::new()
                    .with_prompt("Client full name")
                    .interact_text()?,
            };
            let draft = NewClient {
                full_name,
                email,
                phone,
                address,
                company,
                tags,
                notes,
            };
            create_client(state, draft, json).await
        }
        ClientCommand::List { tag } => list_clients(state, tag.as_deref(), json).await,
        ClientCommand::Show { id } => show_client(state, &id, json).await,
        ClientCommand::Update {
            id,
            name,
            email,
            phone,
            address,
            company,
            tags,
            clear_tags,
            notes,
        } => {
            let tags = if clear_tags {
                Some(Vec::new())
            } else if tags.is_empty() {
                None
            } else {
                Some(tags)
            };
            let patch = ClientPatch {
                full_name: name,
                email,
                phone,
                address,
                company,
                tags,
                notes,
            };
            update_client(state, &id, patch, json).await
        }
        ClientCommand::Delete { id, force } => delete_client(state, &id, force, json).await,
        ClientCommand::Search { query } => search_clients(state, &query, json).await,
    }
}

fn parse_client_id(raw: &str) -> Result<ClientId> {
    raw.trim()
        .parse::<ClientId>()
        .with_context(|| format!("'{raw}' is not a valid client ID"))
}

async fn find_client(state: &AppState, raw_id: &str) -> Result<Client> {
    let id = parse_client_id(raw_id)?;
    state
        .clients
        .get_by_id(id)
        .await
        .with_context(|| format!("Client '{id}' not found"))
}

async fn create_client(state: &AppState, draft: NewClient, json: bool) -> Result<()> {
    let client = state
        .clients
        .create(draft)
        .await?
        .durable()
        .context("Client was not saved")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&client)?);
        return Ok(());
    }

    println!();
    println!("  {} Client created.", style("✓").green().bold());
    println!();
    print_client_details(&client);
    println!();

    Ok(())
}

async fn list_clients(state: &AppState, tag: Option<&str>, json: bool) -> Result<()> {
    let clients = match tag {
        Some(tag) => state.clients.with_tag(tag).await,
        None => state.clients.get_all().await,
    };
    print_client_list(&clients, json, || match tag {
        Some(tag) => format!("No clients tagged '{tag}'."),
        None => "No clients yet. Create one with: lexdesk client create".to_string(),
    })
}

async fn search_clients(state: &AppState, query: &str, json: bool) -> Result<()> {
    let clients = state.clients.search(query).await;
    print_client_list(&clients, json, || format!("No clients match '{query}'."))
}

async fn show_client(state: &AppState, raw_id: &str, json: bool) -> Result<()> {
    let client = find_client(state, raw_id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&client)?);
        return Ok(());
    }

    println!();
    print_client_details(&client);
    if !client.notes.is_empty() {
        println!();
        println!("  {}", style("Notes").bold());
        for line in client.notes.lines() {
            println!("    {line}");
        }
    }
    println!();

    Ok(())
}

async fn update_client(
    state: &AppState,
    raw_id: &str,
    patch: ClientPatch,
    json: bool,
) -> Result<()> {
    if patch.is_empty() {
        anyhow::bail!("Nothing to update. Pass at least one field, e.g. --email or --tag.");
    }
    let id = parse_client_id(raw_id)?;

    let client = state
        .clients
        .update(id, patch)
        .await?
        .with_context(|| format!("Client '{id}' not found"))?
        .durable()
        .context("Client update was not saved")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&client)?);
        return Ok(());
    }

    println!();
    println!("  {} Client updated.", style("✓").green().bold());
    println!();
    print_client_details(&client);
    println!();

    Ok(())
}

async fn delete_client(state: &AppState, raw_id: &str, force: bool, json: bool) -> Result<()> {
    let client = find_client(state, raw_id).await?;

    if !force && !json {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Permanently delete client '{}'?",
                style(&client.full_name).red().bold()
            ))
            .default(false)
            .interact()?;

        if !confirmed {
            println!("  Cancelled.");
            return Ok(());
        }
    }

    let deleted = state
        .clients
        .delete(client.id)
        .await
        .durable()
        .context("Deletion was not saved")?;

    if json {
        println!(
            "{}",
            serde_json::json!({"deleted": deleted, "id": client.id.to_string()})
        );
    } else {
        println!(
            "  {} Client '{}' deleted.",
            style("✓").red().bold(),
            client.full_name
        );
    }

    Ok(())
}

// --- Formatting helpers ---

fn print_client_list(
    clients: &[Client],
    json: bool,
    empty_message: impl FnOnce() -> String,
) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(clients)?);
        return Ok(());
    }

    if clients.is_empty() {
        println!();
        println!("  {} {}", style("i").blue().bold(), empty_message());
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("ID").fg(Color::White),
        Cell::new("Name").fg(Color::White),
        Cell::new("Email").fg(Color::White),
        Cell::new("Company").fg(Color::White),
        Cell::new("Tags").fg(Color::White),
        Cell::new("Updated").fg(Color::White),
    ]);

    for client in clients {
        table.add_row(vec![
            Cell::new(client.id.to_string()).fg(Color::DarkGrey),
            Cell::new(&client.full_name).fg(Color::Cyan),
            Cell::new(client.email.as_deref().unwrap_or("-")),
            Cell::new(client.company.as_deref().unwrap_or("-")),
            Cell::new(truncate(&client.tags.join(", "), 30)),
            Cell::new(format_relative_time(&client.updated_at)).fg(Color::DarkGrey),
        ]);
    }

    println!();
    println!("{table}");
    println!("  {} client(s)", clients.len());
    println!();

    Ok(())
}

fn print_client_details(client: &Client) {
    let field = |label: &str, value: Option<&str>| {
        if let Some(value) = value {
            println!("  {:<10} {}", style(label).bold(), value);
        }
    };

    println!("  {:<10} {}", style("Name:").bold(), style(&client.full_name).cyan());
    field("Email:", client.email.as_deref());
    field("Phone:", client.phone.as_deref());
    field("Company:", client.company.as_deref());
    field("Address:", client.address.as_deref());
    if !client.tags.is_empty() {
        println!("  {:<10} {}", style("Tags:").bold(), client.tags.join(", "));
    }
    println!("  {:<10} {}", style("ID:").bold(), style(client.id).dim());
    println!(
        "  {:<10} {}",
        style("Created:").bold(),
        client.created_at.format("%Y-%m-%d %H:%M UTC")
    );
    println!(
        "  {:<10} {}",
        style("Updated:").bold(),
        client.updated_at.format("%Y-%m-%d %H:%M UTC")
    );
}
