use serde_json::{json, Value};
use twilight_model::id::{
    marker::{ChannelMarker, GuildMarker, UserMarker},
    Id,
};
use twilight_util::builder::embed::{EmbedBuilder, EmbedFieldBuilder};

use freesmiley_settings::{SettingsError, SettingsOverview, SettingsStore, Tier};

use super::MAX_SMILEYS_LIMIT;
use crate::{
    context::{CommandContext, Error},
    modules::smiley::{shared::Mode, ENABLED, MAX_SMILEYS, MODE, MUTED_USERS},
};

// embed field values are capped at 1024 characters
const FIELD_VALUE_LIMIT: usize = 1024;

fn target_name(channel_id: Option<Id<ChannelMarker>>) -> String {
    match channel_id {
        Some(channel_id) => format!("<#{}>", channel_id),
        None => "Server default".into(),
    }
}

/// Tier a reset falls back to.
fn inherited_name(channel_id: Option<Id<ChannelMarker>>) -> &'static str {
    match channel_id {
        Some(_) => "server default",
        None => "global default",
    }
}

pub(crate) async fn cmd_mode(ctx: &CommandContext) -> Result<(), Error> {
    let guild_id = ctx.guild_id();
    let channel_id = ctx.get_arg_channel_optional("channel")?;
    let mode = match ctx.get_arg_string("mode")?.as_str() {
        "default" => None,
        mode => Some(mode.parse::<Mode>()?),
    };

    let setting = ctx.services().settings.setting(MODE, guild_id, channel_id);
    setting.change(mode.map(Value::from)).await?;

    let message = match mode {
        Some(mode) => format!(
            ":white_check_mark: {} mode set to `{}`.",
            target_name(channel_id),
            mode
        ),
        None => {
            let inherited: Mode = setting.read_as().await?;
            format!(
                ":white_check_mark: {} mode returned to {} `{}`.",
                target_name(channel_id),
                inherited_name(channel_id),
                inherited
            )
        }
    };

    ctx.reply(message).await?;
    Ok(())
}

pub(crate) async fn cmd_max_smileys(ctx: &CommandContext) -> Result<(), Error> {
    let guild_id = ctx.guild_id();
    let channel_id = ctx.get_arg_channel_optional("channel")?;
    let count = ctx.get_arg_integer_optional("count")?;

    if let Some(count) = count {
        if !(1..=MAX_SMILEYS_LIMIT).contains(&count) {
            ctx.reply(format!(
                ":x: **Max smileys must be between 1 and {}.**",
                MAX_SMILEYS_LIMIT
            ))
            .await?;
            return Ok(());
        }
    }

    let setting = ctx
        .services()
        .settings
        .setting(MAX_SMILEYS, guild_id, channel_id);
    setting.change(count.map(Value::from)).await?;

    let message = match count {
        Some(count) => format!(
            ":white_check_mark: {} max smileys set to `{}`.",
            target_name(channel_id),
            count
        ),
        None => {
            let inherited = setting.read().await?;
            format!(
                ":white_check_mark: {} max smileys returned to {} `{}`.",
                target_name(channel_id),
                inherited_name(channel_id),
                inherited
            )
        }
    };

    ctx.reply(message).await?;
    Ok(())
}

/// `/blacklist` and `/whitelist`, either one channel or the whole server.
pub(crate) async fn cmd_set_enabled(ctx: &CommandContext, enabled: bool) -> Result<(), Error> {
    let guild_id = ctx.guild_id();
    let all = ctx.get_arg_bool_optional("all")?.unwrap_or(false);
    let channel_id = if all {
        None
    } else {
        ctx.get_arg_channel_optional("channel")?
            .or_else(|| ctx.channel_id())
    };

    ctx.services()
        .settings
        .setting(ENABLED, guild_id, channel_id)
        .change(json!(enabled))
        .await?;

    let (emoji, action) = if enabled {
        (":speaker:", "whitelisted")
    } else {
        (":mute:", "blacklisted")
    };
    let message = match channel_id {
        Some(channel_id) => format!("{} <#{}> has been {}.", emoji, channel_id, action),
        None => format!("{} All channels have been {}.", emoji, action),
    };

    ctx.reply(message).await?;
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MuteOutcome {
    Muted,
    AlreadyMuted,
    Unmuted,
    NotMuted,
    /// muted through the server wide list, a channel unmute leaves that alone
    MutedServerWide,
}

/// Adds `user_id` to or removes it from the mute list of one tier, looking
/// only at that tier's own list.
pub(crate) async fn toggle_mute(
    settings: &SettingsStore,
    guild_id: Option<Id<GuildMarker>>,
    channel_id: Option<Id<ChannelMarker>>,
    user_id: Id<UserMarker>,
    mute: bool,
) -> Result<MuteOutcome, SettingsError> {
    let guild_id = guild_id.ok_or(SettingsError::MissingGuildId)?;
    let user = json!(user_id.get());

    let doc = settings.guild_document(guild_id).await?;
    let listed = doc
        .as_deref()
        .and_then(|doc| doc.get(MUTED_USERS, &Tier::from(channel_id)))
        .and_then(Value::as_array)
        .is_some_and(|items| items.contains(&user));

    let setting = settings.setting(MUTED_USERS, Some(guild_id), channel_id);
    Ok(match (mute, listed) {
        (true, true) => MuteOutcome::AlreadyMuted,
        (true, false) => {
            setting.push(user).await?;
            MuteOutcome::Muted
        }
        (false, true) => {
            setting.pop(user).await?;
            MuteOutcome::Unmuted
        }
        (false, false) if setting.contains(user.clone()).await? => MuteOutcome::MutedServerWide,
        (false, false) => MuteOutcome::NotMuted,
    })
}

fn mute_message(
    outcome: MuteOutcome,
    user_id: Id<UserMarker>,
    channel_id: Option<Id<ChannelMarker>>,
) -> String {
    let where_ = match channel_id {
        Some(channel_id) => format!("in <#{}>", channel_id),
        None => "server wide".into(),
    };

    match outcome {
        MuteOutcome::AlreadyMuted => format!(":mute: <@{}> is already muted {}.", user_id, where_),
        MuteOutcome::Muted => format!(":mute: <@{}> has been muted {}.", user_id, where_),
        MuteOutcome::Unmuted => format!(":speaker: <@{}> has been unmuted {}.", user_id, where_),
        MuteOutcome::NotMuted => format!(":speaker: <@{}> isn't muted {}.", user_id, where_),
        MuteOutcome::MutedServerWide => format!(
            ":mute: <@{}> is muted server wide, use `/unmute` without a channel to unmute them.",
            user_id
        ),
    }
}

/// `/mute` and `/unmute`, server wide unless a channel is given.
pub(crate) async fn cmd_mute(ctx: &CommandContext, mute: bool) -> Result<(), Error> {
    let user_id = ctx.get_arg_user("user")?;
    let channel_id = ctx.get_arg_channel_optional("channel")?;

    let outcome = toggle_mute(
        &ctx.services().settings,
        ctx.guild_id(),
        channel_id,
        user_id,
        mute,
    )
    .await?;

    ctx.reply(mute_message(outcome, user_id, channel_id)).await?;
    Ok(())
}

pub(crate) async fn cmd_settings(ctx: &CommandContext) -> Result<(), Error> {
    let guild_id = ctx
        .guild_id()
        .ok_or(SettingsError::MissingGuildId)?;
    let overview = ctx.services().settings.overview(guild_id).await?;

    ctx.reply_embed(overview_embed(&overview)).await?;
    Ok(())
}

fn overview_embed(overview: &SettingsOverview) -> twilight_model::channel::message::Embed {
    let mut embed = EmbedBuilder::new().title(":gear: Smiley settings").field(
        EmbedFieldBuilder::new(
            "Global defaults",
            field_value(format_settings(overview.global.iter())),
        )
        .build(),
    );

    if let Some(guild_default) = &overview.guild_default {
        embed = embed.field(
            EmbedFieldBuilder::new(
                "Server default",
                field_value(format_settings(guild_default.iter())),
            )
            .build(),
        );
    }

    // discord allows 25 fields per embed
    for (channel_id, settings) in overview.channels.iter().take(23) {
        embed = embed.field(
            EmbedFieldBuilder::new(
                format!("Channel {}", channel_id),
                field_value(format!(
                    "<#{}>\n{}",
                    channel_id,
                    format_settings(settings.iter())
                )),
            )
            .build(),
        );
    }

    embed.build()
}

fn format_settings<'a>(settings: impl Iterator<Item = (&'a String, &'a Value)>) -> String {
    let lines: Vec<String> = settings
        .map(|(name, value)| format!("**{}**: {}", name, format_value(name, value)))
        .collect();

    if lines.is_empty() {
        return "*nothing set*".into();
    }

    lines.join("\n")
}

fn field_value(mut text: String) -> String {
    if text.chars().count() > FIELD_VALUE_LIMIT {
        let end = text
            .char_indices()
            .nth(FIELD_VALUE_LIMIT - 1)
            .map_or(text.len(), |(index, _)| index);
        text.truncate(end);
        text.push('…');
    }

    text
}

fn format_value(name: &str, value: &Value) -> String {
    match value {
        Value::Array(items) if name == MUTED_USERS => {
            if items.is_empty() {
                return "nobody".into();
            }

            items
                .iter()
                .map(|item| match item.as_u64().and_then(Id::<UserMarker>::new_checked) {
                    Some(user_id) => format!("<@{}>", user_id),
                    None => item.to_string(),
                })
                .collect::<Vec<String>>()
                .join(", ")
        }
        Value::String(string) => format!("`{}`", string),
        Value::Bool(true) => "yes".into(),
        Value::Bool(false) => "no".into(),
        value => format!("`{}`", value),
    }
}
