//! Audit metadata stamped onto every accepted write.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity of the caller performing a write.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Actor {
    pub username: String,
}

impl Actor {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
        }
    }
}

/// Audit fields carried by every stored document.
///
/// Serialized with the document's own field names so it can be flattened into
/// the record. Callers never set these directly; only [`Stamp::apply`] does.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Stamp {
    #[serde(rename = "_stamp")]
    pub token: String,
    #[serde(rename = "_createdBy")]
    pub created_by: String,
    #[serde(rename = "_createdDate")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "_createdAgent")]
    pub created_agent: String,
    #[serde(rename = "_updatedBy")]
    pub updated_by: String,
    #[serde(rename = "_updatedDate")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(rename = "_updatedAgent")]
    pub updated_agent: String,
}

impl Stamp {
    /// Record `actor` acting through `agent` at `at`.
    ///
    /// The `created*` fields are written only on the first stamp; `updated*`
    /// and the token change on every call.
    pub fn apply(&mut self, actor: &Actor, agent: &str, at: DateTime<Utc>) {
        if self.created_by.is_empty() {
            self.created_by = actor.username.clone();
            self.created_at = Some(at);
            self.created_agent = agent.to_string();
        }
        self.updated_by = actor.username.clone();
        self.updated_at = Some(at);
        self.updated_agent = agent.to_string();
        self.token = Uuid::now_v7().to_string();
    }

    pub fn is_stamped(&self) -> bool {
        !self.token.is_empty()
    }
}

/// Records that carry a [`Stamp`].
pub trait Stamped {
    fn stamp_info(&self) -> &Stamp;
    fn stamp_info_mut(&mut self) -> &mut Stamp;

    /// Stamp the record in place with the current time.
    fn stamp(&mut self, actor: &Actor, agent: &str) {
        self.stamp_info_mut().apply(actor, agent, Utc::now());
    }
}
