use async_trait::async_trait;
use serde_json::Value;
use twilight_model::id::{marker::GuildMarker, Id};

use crate::{document::GuildDocument, error::BackendError, tier::Tier};

pub mod db_id;
pub mod memory;
pub mod postgres;

/// Persistent storage for guild documents.
///
/// Writes address a single setting inside a single tier, `set` and `list_add`
/// create the document when it doesn't exist yet.
#[async_trait]
pub trait SettingsBackend: Send + Sync {
    async fn find_one(&self, guild_id: Id<GuildMarker>)
        -> Result<Option<GuildDocument>, BackendError>;

    async fn set(
        &self,
        guild_id: Id<GuildMarker>,
        tier: Tier,
        name: &str,
        value: &Value,
    ) -> Result<(), BackendError>;

    async fn unset(&self, guild_id: Id<GuildMarker>, tier: Tier, name: &str)
        -> Result<(), BackendError>;

    async fn list_add(
        &self,
        guild_id: Id<GuildMarker>,
        tier: Tier,
        name: &str,
        item: &Value,
    ) -> Result<(), BackendError>;

    async fn list_remove(
        &self,
        guild_id: Id<GuildMarker>,
        tier: Tier,
        name: &str,
        item: &Value,
    ) -> Result<(), BackendError>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    Replace(Value),
    Delete,
    ListAdd(Value),
    ListRemove(Value),
}

impl WriteOp {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Replace(_) => "replace",
            Self::Delete => "delete",
            Self::ListAdd(_) => "list_add",
            Self::ListRemove(_) => "list_remove",
        }
    }

    pub(crate) async fn apply(
        &self,
        backend: &dyn SettingsBackend,
        guild_id: Id<GuildMarker>,
        tier: Tier,
        name: &str,
    ) -> Result<(), BackendError> {
        match self {
            Self::Replace(value) => backend.set(guild_id, tier, name, value).await,
            Self::Delete => backend.unset(guild_id, tier, name).await,
            Self::ListAdd(item) => backend.list_add(guild_id, tier, name, item).await,
            Self::ListRemove(item) => backend.list_remove(guild_id, tier, name, item).await,
        }
    }
}
