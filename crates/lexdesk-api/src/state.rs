//! Application state wiring all stores together.
//!
//! The stores are generic over `SlotStore` and `ReplyGenerator`; AppState
//! pins them to the SQLite slot store and the rule-based responder.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use lexdesk_core::chatbot::rules::RuleBasedResponder;
use lexdesk_core::chatbot::session::SessionManager;
use lexdesk_core::latency::Latency;
use lexdesk_core::messaging::store::MessagingStore;
use lexdesk_core::storage::keys::SlotKeys;
use lexdesk_core::store::client::ClientStore;
use lexdesk_infra::config::load_config;
use lexdesk_infra::filesystem::{ensure_data_dir, resolve_data_dir};
use lexdesk_infra::sqlite::pool::{DatabasePool, database_url};
use lexdesk_infra::sqlite::slot::SqliteSlotStore;
use lexdesk_types::config::LexdeskConfig;

/// Concrete type aliases for the store generics pinned to infra implementations.
pub type ConcreteClientStore = ClientStore<SqliteSlotStore>;

pub type ConcreteMessagingStore = MessagingStore<SqliteSlotStore>;

pub type ConcreteSessionManager = SessionManager<SqliteSlotStore, RuleBasedResponder>;

/// Shared application state holding all stores.
#[derive(Clone)]
pub struct AppState {
    pub clients: Arc<ConcreteClientStore>,
    pub messaging: Arc<ConcreteMessagingStore>,
    pub chatbot: Arc<ConcreteSessionManager>,
    pub slots: SqliteSlotStore,
    pub keys: SlotKeys,
    pub config: LexdeskConfig,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Initialize the application state: load config, open DB, load stores.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        ensure_data_dir(&data_dir)
            .await
            .with_context(|| format!("failed to create data dir {}", data_dir.display()))?;

        let config = load_config(&data_dir).await;

        let db_url = database_url(&data_dir, &config.database_file);
        let db_pool = DatabasePool::new(&db_url)
            .await
            .with_context(|| format!("failed to open database {db_url}"))?;
        let slots = SqliteSlotStore::new(db_pool);

        let keys = SlotKeys::new(config.namespace.clone());
        let latency = Latency::from_millis(config.simulated_latency_ms);

        let clients = ClientStore::open(slots.clone(), keys.clients(), latency)
            .await
            .context("failed to load clients")?;
        let messaging = MessagingStore::open(slots.clone(), &keys, latency)
            .await
            .context("failed to load messages")?;
        let responder = RuleBasedResponder::from_config(&config.chatbot);
        let chatbot = SessionManager::open(slots.clone(), &keys, responder, latency)
            .await
            .context("failed to load chatbot sessions")?;

        tracing::debug!(
            data_dir = %data_dir.display(),
            namespace = keys.namespace(),
            "Application state ready"
        );

        Ok(Self {
            clients: Arc::new(clients),
            messaging: Arc::new(messaging),
            chatbot: Arc::new(chatbot),
            slots,
            keys,
            config,
            data_dir,
        })
    }
}
