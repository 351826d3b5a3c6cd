//! Client records managed by the client entity store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

uuid_id! {
    /// Unique identifier for a client, wrapping a UUID v7.
    ClientId
}

/// A law-firm client.
///
/// `id` and `created_at` never change after creation. `updated_at` is
/// non-decreasing across every mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    pub full_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    /// Free-form tags. Deduplicated, first occurrence wins the position.
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Client {
    /// Build a client from a validated draft.
    pub fn from_draft(id: ClientId, draft: NewClient, now: DateTime<Utc>) -> Self {
        Self {
            id,
            full_name: draft.full_name.trim().to_string(),
            email: non_blank(draft.email),
            phone: non_blank(draft.phone),
            address: non_blank(draft.address),
            company: non_blank(draft.company),
            tags: normalize_tags(draft.tags),
            notes: draft.notes,
            created_at: now,
            updated_at: now,
        }
    }

    /// Merge the provided patch fields onto this client.
    ///
    /// An empty string clears an optional contact field.
    pub fn apply_patch(&mut self, patch: ClientPatch) {
        if let Some(name) = patch.full_name {
            self.full_name = name.trim().to_string();
        }
        if let Some(email) = patch.email {
            self.email = non_blank(Some(email));
        }
        if let Some(phone) = patch.phone {
            self.phone = non_blank(Some(phone));
        }
        if let Some(address) = patch.address {
            self.address = non_blank(Some(address));
        }
        if let Some(company) = patch.company {
            self.company = non_blank(Some(company));
        }
        if let Some(tags) = patch.tags {
            self.tags = normalize_tags(tags);
        }
        if let Some(notes) = patch.notes {
            self.notes = notes;
        }
    }

    /// Case-insensitive substring match over name, email, company, and tags.
    pub fn matches(&self, query: &str) -> bool {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        let hit = |field: &str| field.to_lowercase().contains(&needle);

        hit(&self.full_name)
            || self.email.as_deref().is_some_and(hit)
            || self.company.as_deref().is_some_and(hit)
            || self.tags.iter().any(|t| hit(t.as_str()))
    }

    /// Whether the client carries `tag` (case-insensitive).
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag.trim()))
    }
}

/// Data required to create a client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewClient {
    pub full_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub notes: String,
}

impl NewClient {
    /// Shorthand for a draft carrying only a name.
    pub fn named(full_name: impl Into<String>) -> Self {
        Self {
            full_name: full_name.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.full_name.trim().is_empty() {
            return Err(ValidationError::EmptyField("full_name"));
        }
        validate_email(self.email.as_deref())
    }
}

/// Partial update for a client. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientPatch {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl ClientPatch {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(name) = &self.full_name {
            if name.trim().is_empty() {
                return Err(ValidationError::EmptyField("full_name"));
            }
        }
        validate_email(self.email.as_deref())
    }

    /// True when the patch sets no field at all.
    pub fn is_empty(&self) -> bool {
        self.full_name.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.address.is_none()
            && self.company.is_none()
            && self.tags.is_none()
            && self.notes.is_none()
    }
}

fn validate_email(email: Option<&str>) -> Result<(), ValidationError> {
    match email.map(str::trim) {
        Some(e) if !e.is_empty() => {
            let valid = e
                .split_once('@')
                .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
            if valid {
                Ok(())
            } else {
                Err(ValidationError::InvalidEmail(e.to_string()))
            }
        }
        _ => Ok(()),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Trim, drop empties, and deduplicate tags case-insensitively.
pub fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if tag.is_empty() || out.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
            continue;
        }
        out.push(tag.to_string());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Client {
        let draft = NewClient {
            full_name: "  Ada Lovelace ".to_string(),
            email: Some("ada@analytical.org".to_string()),
            company: Some("Analytical Engines Ltd".to_string()),
            tags: vec!["vip".into(), "VIP".into(), " probate ".into(), "".into()],
            ..NewClient::default()
        };
        Client::from_draft(ClientId::new(), draft, Utc::now())
    }

    #[test]
    fn test_from_draft_normalizes() {
        let client = sample();
        assert_eq!(client.full_name, "Ada Lovelace");
        assert_eq!(client.tags, vec!["vip", "probate"]);
        assert_eq!(client.created_at, client.updated_at);
        assert!(client.phone.is_none());
    }

    #[test]
    fn test_apply_patch_only_touches_given_fields() {
        let mut client = sample();
        client.apply_patch(ClientPatch {
            phone: Some("555-0100".to_string()),
            company: Some("".to_string()),
            ..ClientPatch::default()
        });
        assert_eq!(client.phone.as_deref(), Some("555-0100"));
        assert!(client.company.is_none());
        assert_eq!(client.full_name, "Ada Lovelace");
        assert_eq!(client.email.as_deref(), Some("ada@analytical.org"));
    }

    #[test]
    fn test_matches_and_tags() {
        let client = sample();
        assert!(client.matches("lovelace"));
        assert!(client.matches("ANALYTICAL"));
        assert!(client.matches("prob"));
        assert!(!client.matches("babbage"));
        assert!(client.has_tag("Vip"));
        assert!(!client.has_tag("litigation"));
    }

    #[test]
    fn test_validation() {
        assert!(matches!(
            NewClient::named("   ").validate(),
            Err(ValidationError::EmptyField("full_name"))
        ));
        let bad_email = NewClient {
            email: Some("not-an-email".into()),
            ..NewClient::named("Grace")
        };
        assert!(matches!(
            bad_email.validate(),
            Err(ValidationError::InvalidEmail(_))
        ));
        assert!(NewClient::named("Grace").validate().is_ok());
        assert!(ClientPatch::default().is_empty());
    }

    #[test]
    fn test_client_id_parse_roundtrip() {
        let id = ClientId::new();
        let parsed: ClientId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }
}
