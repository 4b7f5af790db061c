use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Persistent credential record, stored as the JSON token file.
///
/// Invariant: `granting_ticket` and `granted_at` are both present or both
/// absent. Only `set_ticket`/`clear_ticket` mutate the pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    pub api_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub granting_ticket: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub granted_at: Option<DateTime<Utc>>,
}

impl Credential {
    /// Empty record, as written by the `init` command.
    pub fn empty() -> Self {
        Self {
            api_key: String::new(),
            granting_ticket: None,
            granted_at: None,
        }
    }

    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            granting_ticket: None,
            granted_at: None,
        }
    }

    pub fn set_ticket(&mut self, ticket: String) {
        self.granting_ticket = Some(ticket);
        self.granted_at = Some(Utc::now());
    }

    pub fn clear_ticket(&mut self) {
        self.granting_ticket = None;
        self.granted_at = None;
    }

    pub fn has_ticket(&self) -> bool {
        self.granting_ticket.is_some() && self.granted_at.is_some()
    }
}

/// Short-lived, single-use ticket authorizing one retrieval call. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceTicket(String);

impl ServiceTicket {
    pub fn new(ticket: impl Into<String>) -> Self {
        Self(ticket.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Normalized in-memory model of one retrieved value set.
///
/// Transient: built per fetch-and-convert operation and discarded after emission.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalValueSet {
    pub id: String,
    pub title: Option<String>,
    pub groups: Vec<CodeSystemGroup>,
}

/// Concepts sharing one (raw code system, raw version) pair, in encounter order.
#[derive(Debug, Clone, PartialEq)]
pub struct CodeSystemGroup {
    pub system: String,
    pub version: String,
    pub concepts: Vec<Concept>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Concept {
    pub code: String,
    pub display: String,
}
