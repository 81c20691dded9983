use serde_json::Value;
use twilight_model::id::{
    marker::{ChannelMarker, GuildMarker, UserMarker},
    Id,
};

use freesmiley_settings::{SettingsError, SettingsStore};

use super::{ENABLED, MUTED_USERS};

/// Whether smileys are dealt in the channel, blacklisting stores `false`.
pub(crate) async fn is_enabled(
    settings: &SettingsStore,
    guild_id: Option<Id<GuildMarker>>,
    channel_id: Option<Id<ChannelMarker>>,
) -> Result<bool, SettingsError> {
    if guild_id.is_none() {
        return Ok(true);
    }

    let enabled = settings.setting(ENABLED, guild_id, channel_id).read().await?;
    Ok(enabled != Value::Bool(false))
}

pub(crate) async fn is_muted(
    settings: &SettingsStore,
    guild_id: Option<Id<GuildMarker>>,
    channel_id: Option<Id<ChannelMarker>>,
    user_id: Id<UserMarker>,
) -> Result<bool, SettingsError> {
    if guild_id.is_none() {
        return Ok(false);
    }

    settings
        .setting(MUTED_USERS, guild_id, channel_id)
        .contains(user_id.get())
        .await
}
