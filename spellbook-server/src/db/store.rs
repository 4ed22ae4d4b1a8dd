//! Store seam between the repositories and the database

use std::time::Duration;

use async_trait::async_trait;
use sqlx::FromRow;

use crate::models::{
    ClassId, LevelBound, SpellAttributes, SpellEdit, SpellId, SpellList, SpellSearch,
    SpellSummary, User,
};

pub type DbResult<T> = Result<T, DbError>;

/// Database error type
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// No connection could be acquired from the pool
    #[error("connection unavailable: {0}")]
    Connection(#[source] sqlx::Error),

    /// The statement was sent but failed
    #[error("query '{op}' failed: {source}")]
    Query {
        op: &'static str,
        #[source]
        source: sqlx::Error,
    },

    /// The statement did not finish within the configured timeout
    #[error("query '{op}' timed out after {after:?}")]
    Timeout { op: &'static str, after: Duration },

    /// A stored spell list is not a JSON array of integers
    #[error("spell list of user '{user}' is malformed: {source}")]
    Decode {
        user: String,
        #[source]
        source: serde_json::Error,
    },
}

impl DbError {
    /// Short machine-readable kind, used in logs and strict error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Connection(_) => "connection_error",
            Self::Query { .. } => "query_error",
            Self::Timeout { .. } => "timeout",
            Self::Decode { .. } => "decode_error",
        }
    }
}

/// Raw `users` row before the spell list is decoded
#[derive(Debug, Clone, FromRow)]
pub(crate) struct UserRow {
    pub id: i32,
    pub name: String,
    pub spells: Option<String>,
}

impl UserRow {
    pub fn into_user(self) -> DbResult<User> {
        match SpellList::decode(self.spells.as_deref()) {
            Ok(spells) => Ok(User {
                id: self.id,
                name: self.name,
                spells,
            }),
            Err(source) => Err(DbError::Decode {
                user: self.name,
                source,
            }),
        }
    }
}

/// Every query the service issues, one method per statement shape.
///
/// "Not found" is `None` or an empty `Vec`; failures are `DbError`.
#[async_trait]
pub trait SpellStore: Send + Sync {
    /// Cheap round trip used by health checks.
    async fn ping(&self) -> DbResult<()>;

    /// All class ids, in store order.
    async fn class_ids(&self) -> DbResult<Vec<ClassId>>;

    async fn class_name(&self, id: ClassId) -> DbResult<Option<String>>;

    /// All spell ids, in store order.
    async fn spell_ids(&self) -> DbResult<Vec<SpellId>>;

    /// Spells whose name matches `search`, ordered by name.
    async fn search_spells(&self, search: &SpellSearch) -> DbResult<Vec<SpellSummary>>;

    async fn spell(&self, id: SpellId) -> DbResult<Option<SpellAttributes>>;

    /// Distinct levels at which `class` gains any spell, ascending.
    async fn class_levels(&self, class: ClassId) -> DbResult<Vec<i32>>;

    /// Spell ids `class` gains within `bound`, ordered by spell name.
    async fn class_spells(&self, class: ClassId, bound: LevelBound) -> DbResult<Vec<SpellId>>;

    async fn user_names(&self) -> DbResult<Vec<String>>;

    /// Case-insensitive lookup by name; at most one user.
    async fn find_user(&self, name: &str) -> DbResult<Option<User>>;

    /// Return the user, creating them with an empty list if absent.
    /// An existing list is never touched.
    async fn get_or_create_user(&self, name: &str) -> DbResult<User>;

    /// Set the user's list to empty, creating the user if absent.
    async fn reset_spells(&self, name: &str) -> DbResult<User>;

    /// Apply `edit` to the user's list as one atomic read-modify-write.
    ///
    /// Returns `None` without creating anything when the user does not exist.
    async fn edit_spells(&self, name: &str, edit: SpellEdit) -> DbResult<Option<User>>;
}
