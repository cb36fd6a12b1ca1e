//! Entity traits: identity, soft deletion, and document storage.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::id::EntityId;

/// Entity marker + minimal interface.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the identifier, or `None` for a record that was never stored.
    fn id(&self) -> Option<&Self::Id>;

    /// Assign the identifier (done once, on first insert).
    fn set_id(&mut self, id: Self::Id);
}

/// Records that are logically deleted by flag instead of being removed.
pub trait SoftDelete {
    fn is_deleted(&self) -> bool;
    fn mark_deleted(&mut self);
}

/// Document field holding the identifier.
pub const ID_FIELD: &str = "_id";

/// Document field holding the soft-delete flag.
pub const DELETED_FIELD: &str = "_deleted";

/// A record stored as a document in a named collection.
///
/// Serialized documents must expose the identifier under [`ID_FIELD`] and the
/// soft-delete flag under [`DELETED_FIELD`].
pub trait Document:
    Entity<Id = EntityId> + SoftDelete + Clone + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Collection (table/namespace) the documents live in.
    const COLLECTION: &'static str;
}
