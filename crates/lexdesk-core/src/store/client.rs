//! Client entity store.

use chrono::{DateTime, Utc};
use lexdesk_types::client::{Client, ClientId, ClientPatch, NewClient};
use lexdesk_types::error::ValidationError;

use super::entity::{Entity, EntityStore};
use crate::storage::slot_store::SlotStore;

impl Entity for Client {
    type Id = ClientId;
    type Draft = NewClient;
    type Patch = ClientPatch;

    const KIND: &'static str = "client";

    fn new_id() -> ClientId {
        ClientId::new()
    }

    fn id(&self) -> ClientId {
        self.id
    }

    fn validate_draft(draft: &NewClient) -> Result<(), ValidationError> {
        draft.validate()
    }

    fn validate_patch(patch: &ClientPatch) -> Result<(), ValidationError> {
        patch.validate()
    }

    fn from_draft(id: ClientId, draft: NewClient, now: DateTime<Utc>) -> Self {
        Client::from_draft(id, draft, now)
    }

    fn apply_patch(&mut self, patch: ClientPatch) {
        Client::apply_patch(self, patch);
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn set_updated_at(&mut self, at: DateTime<Utc>) {
        self.updated_at = at;
    }
}

/// Store for law-firm clients.
pub type ClientStore<S> = EntityStore<Client, S>;

impl<S: SlotStore> EntityStore<Client, S> {
    /// Clients whose name, email, company, or tags contain `query`.
    pub async fn search(&self, query: &str) -> Vec<Client> {
        self.filter(|c| c.matches(query)).await
    }

    /// Clients carrying `tag` (case-insensitive).
    pub async fn with_tag(&self, tag: &str) -> Vec<Client> {
        self.filter(|c| c.has_tag(tag)).await
    }
}
