use serde::de::DeserializeOwned;
use serde_json::Value;
use twilight_model::id::{
    marker::{ChannelMarker, GuildMarker},
    Id,
};

use crate::{backend::WriteOp, error::SettingsError, store::SettingsStore};

/// New value for a setting override.
///
/// `Default` removes the override so the next tier shows through again, which
/// is different from storing an explicit `null`.
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    Set(Value),
    Default,
}

impl From<Value> for Change {
    fn from(value: Value) -> Self {
        Self::Set(value)
    }
}

impl From<Option<Value>> for Change {
    fn from(value: Option<Value>) -> Self {
        match value {
            Some(value) => Self::Set(value),
            None => Self::Default,
        }
    }
}

/// A named setting bound to a guild and channel.
///
/// Only channel and guild overrides can be changed through this, reads fall
/// back to the global defaults.
#[derive(Clone, Copy)]
pub struct Setting<'a> {
    store: &'a SettingsStore,
    name: &'a str,
    guild_id: Option<Id<GuildMarker>>,
    channel_id: Option<Id<ChannelMarker>>,
}

impl<'a> Setting<'a> {
    pub(crate) fn new(
        store: &'a SettingsStore,
        name: &'a str,
        guild_id: Option<Id<GuildMarker>>,
        channel_id: Option<Id<ChannelMarker>>,
    ) -> Self {
        Self {
            store,
            name,
            guild_id,
            channel_id,
        }
    }

    pub fn name(&self) -> &str {
        self.name
    }

    pub async fn read(&self) -> Result<Value, SettingsError> {
        self.store
            .resolve(self.name, self.guild_id, self.channel_id)
            .await
    }

    pub async fn read_as<T: DeserializeOwned>(&self) -> Result<T, SettingsError> {
        serde_json::from_value(self.read().await?).map_err(|source| SettingsError::InvalidValue {
            name: self.name.to_string(),
            source,
        })
    }

    /// Whether the effective value is a list containing `item`.
    pub async fn contains(&self, item: impl Into<Value>) -> Result<bool, SettingsError> {
        let item = item.into();
        Ok(match self.read().await? {
            Value::Array(items) => items.contains(&item),
            _ => false,
        })
    }

    pub async fn change(&self, value: impl Into<Change>) -> Result<(), SettingsError> {
        let op = match value.into() {
            Change::Set(value) => WriteOp::Replace(value),
            Change::Default => WriteOp::Delete,
        };
        self.write(op).await
    }

    pub async fn delete(&self) -> Result<(), SettingsError> {
        self.write(WriteOp::Delete).await
    }

    pub async fn push(&self, item: impl Into<Value>) -> Result<(), SettingsError> {
        self.write(WriteOp::ListAdd(item.into())).await
    }

    pub async fn pop(&self, item: impl Into<Value>) -> Result<(), SettingsError> {
        self.write(WriteOp::ListRemove(item.into())).await
    }

    async fn write(&self, op: WriteOp) -> Result<(), SettingsError> {
        self.store
            .write(self.name, self.guild_id, self.channel_id, op)
            .await
    }
}
