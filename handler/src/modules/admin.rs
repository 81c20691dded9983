use twilight_model::{
    application::{
        command::{Command, CommandType},
        interaction::InteractionContextType,
    },
    guild::Permissions,
    id::{marker::GuildMarker, Id},
};
use twilight_util::builder::command::CommandBuilder;

use crate::context::{CommandContext, Error};

pub(crate) const RELOAD: &str = "reload";

pub fn commands() -> Vec<Command> {
    vec![CommandBuilder::new(
        RELOAD,
        "Reload smileys, titles and default settings",
        CommandType::ChatInput,
    )
    .default_member_permissions(Permissions::ADMINISTRATOR)
    .contexts([InteractionContextType::Guild])
    .build()]
}

/// Admin commands only run in the configured admin guild.
fn is_admin_guild(
    admin_guild_id: Option<Id<GuildMarker>>,
    guild_id: Option<Id<GuildMarker>>,
) -> bool {
    admin_guild_id.is_some() && admin_guild_id == guild_id
}

pub async fn handle_command(ctx: CommandContext) -> Result<(), Error> {
    if !is_admin_guild(ctx.context.admin_guild_id, ctx.guild_id()) {
        tracing::warn!(
            uuid = ?ctx.meta.uuid,
            guild = ?ctx.guild_id(),
            "/{} used outside the admin guild",
            ctx.command.name
        );
        ctx.reply(":x: **This command isn't available here.**").await?;
        return Ok(());
    }

    tracing::info!(uuid = ?ctx.meta.uuid, "reloading static data on request");
    let message = match ctx.services().reload_static_data().await {
        Ok(()) => {
            let static_data = ctx.services().static_data.load();
            format!(
                ":white_check_mark: Reloaded {} smileys and {} titles.",
                static_data.smileys.len(),
                static_data.titles.len()
            )
        }
        Err(err) => {
            tracing::warn!("couldn't reload static data: {}", err);
            ":x: **Couldn't reload static data, the current data stays.**".into()
        }
    };

    ctx.reply(message).await?;
    Ok(())
}
