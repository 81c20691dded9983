pub mod commands;

use twilight_model::{
    application::{
        command::{Command, CommandType},
        interaction::InteractionContextType,
    },
    channel::ChannelType,
    guild::Permissions,
};
use twilight_util::builder::command::{
    BooleanBuilder, ChannelBuilder, CommandBuilder, IntegerBuilder, StringBuilder, UserBuilder,
};

use freesmiley_settings::SettingsError;

use crate::context::{CommandContext, Error};

pub(crate) const MAX_SMILEYS_LIMIT: i64 = 20;

fn channel_option(description: &str) -> ChannelBuilder {
    ChannelBuilder::new("channel", description).channel_types([
        ChannelType::GuildText,
        ChannelType::GuildAnnouncement,
        ChannelType::PublicThread,
        ChannelType::PrivateThread,
    ])
}

fn settings_command(name: &str, description: &str) -> CommandBuilder {
    CommandBuilder::new(name, description, CommandType::ChatInput)
        .default_member_permissions(Permissions::MANAGE_CHANNELS)
        .contexts([InteractionContextType::Guild])
}

pub fn commands() -> Vec<Command> {
    vec![
        settings_command("mode", "How smileys are dealt")
            .option(
                StringBuilder::new("mode", "The new mode")
                    .required(true)
                    .choices([
                        ("Simple", "simple"),
                        ("Title", "title"),
                        ("Reaction", "reaction"),
                        ("Default", "default"),
                    ])
                    .build(),
            )
            .option(channel_option("Channel to change, the whole server if not given").build())
            .build(),
        settings_command("maxsmileys", "Most smileys dealt for a single message")
            .option(
                IntegerBuilder::new("count", "Number of smileys, the default if not given")
                    .min_value(1)
                    .max_value(MAX_SMILEYS_LIMIT)
                    .build(),
            )
            .option(channel_option("Channel to change, the whole server if not given").build())
            .build(),
        settings_command("blacklist", "Stop dealing smileys in a channel")
            .option(channel_option("Channel to blacklist, this channel if not given").build())
            .option(BooleanBuilder::new("all", "Blacklist the whole server").build())
            .build(),
        settings_command("whitelist", "Deal smileys in a channel again")
            .option(channel_option("Channel to whitelist, this channel if not given").build())
            .option(BooleanBuilder::new("all", "Whitelist the whole server").build())
            .build(),
        settings_command("mute", "Stop dealing smileys to a user")
            .option(
                UserBuilder::new("user", "User to mute")
                    .required(true)
                    .build(),
            )
            .option(channel_option("Only mute in this channel").build())
            .build(),
        settings_command("unmute", "Deal smileys to a user again")
            .option(
                UserBuilder::new("user", "User to unmute")
                    .required(true)
                    .build(),
            )
            .option(channel_option("Only unmute in this channel").build())
            .build(),
        settings_command("settings", "Show the smiley settings for this server").build(),
    ]
}

pub async fn handle_command(ctx: CommandContext) -> Result<(), Error> {
    tracing::debug!(
        uuid = ?ctx.meta.uuid,
        guild = ?ctx.guild_id(),
        channel = ?ctx.channel_id(),
        "running /{}",
        ctx.command.name
    );

    let result = match ctx.command.name.as_str() {
        "mode" => commands::cmd_mode(&ctx).await,
        "maxsmileys" => commands::cmd_max_smileys(&ctx).await,
        "blacklist" => commands::cmd_set_enabled(&ctx, false).await,
        "whitelist" => commands::cmd_set_enabled(&ctx, true).await,
        "mute" => commands::cmd_mute(&ctx, true).await,
        "unmute" => commands::cmd_mute(&ctx, false).await,
        "settings" => commands::cmd_settings(&ctx).await,
        _ => return Ok(()),
    };

    let Err(err) = result else {
        return Ok(());
    };

    if let Some(message) = err
        .downcast_ref::<SettingsError>()
        .and_then(user_facing_error)
    {
        if let Err(reply_err) = ctx.reply(message).await {
            tracing::warn!("couldn't report error for /{}: {}", ctx.command.name, reply_err);
        }
    }

    Err(err)
}

/// Message shown to the user for errors they can do something about.
fn user_facing_error(err: &SettingsError) -> Option<&'static str> {
    match err {
        SettingsError::MissingGuildId => Some(":x: **This command only works in a server.**"),
        err if err.is_retryable() => Some(
            ":x: **Settings are temporarily unavailable, please try again in a bit.**",
        ),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use freesmiley_settings::BackendError;

    use super::*;

    #[test]
    fn command_names_test() {
        let names: Vec<String> = commands().into_iter().map(|c| c.name).collect();
        assert_eq!(
            names,
            vec![
                "mode",
                "maxsmileys",
                "blacklist",
                "whitelist",
                "mute",
                "unmute",
                "settings"
            ]
        );
    }

    #[test]
    fn commands_are_guild_only_test() {
        for command in commands() {
            assert_eq!(
                command.default_member_permissions,
                Some(Permissions::MANAGE_CHANNELS),
                "/{}",
                command.name
            );
            assert_eq!(
                command.contexts,
                Some(vec![InteractionContextType::Guild]),
                "/{}",
                command.name
            );
        }
    }

    #[test]
    fn user_facing_errors_test() {
        assert!(user_facing_error(&SettingsError::MissingGuildId).is_some());
        assert!(user_facing_error(&SettingsError::Backend(BackendError::Timeout(
            Duration::from_secs(5)
        )))
        .is_some());
        assert!(user_facing_error(&SettingsError::UnknownSetting("mode".into())).is_none());
    }
}
