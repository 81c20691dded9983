use std::{path::PathBuf, sync::Arc};

use arc_swap::ArcSwap;
use twilight_http::{client::InteractionClient, response::marker::EmptyBody, Client};
use twilight_model::{
    application::interaction::application_command::{CommandData, CommandOptionValue},
    channel::message::Embed,
    gateway::payload::incoming::InteractionCreate,
    http::interaction::{InteractionResponse, InteractionResponseType},
    id::{
        marker::{ApplicationMarker, ChannelMarker, GuildMarker, UserMarker},
        Id,
    },
};
use twilight_util::builder::InteractionResponseDataBuilder;

use freesmiley_settings::SettingsStore;
use freesmiley_shared::DiscordEventMeta;

use crate::{modules::smiley::cooldown::Cooldowns, static_data::StaticData};

pub type Error = Box<dyn std::error::Error + Send + Sync>;

#[derive(Clone)]
pub struct Services {
    pub settings: Arc<SettingsStore>,
    pub static_data: Arc<ArcSwap<StaticData>>,
    /// file `static_data` was loaded from and gets reloaded from
    pub static_data_path: Arc<PathBuf>,
    pub cooldowns: Arc<Cooldowns>,
}

impl Services {
    pub fn new(
        settings: SettingsStore,
        static_data: StaticData,
        static_data_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            settings: Arc::new(settings),
            static_data: Arc::new(ArcSwap::from_pointee(static_data)),
            static_data_path: Arc::new(static_data_path.into()),
            cooldowns: Arc::new(Cooldowns::new()),
        }
    }

    /// Loads the static data file again and applies it, the current data
    /// stays when loading fails.
    pub async fn reload_static_data(&self) -> Result<(), Error> {
        let static_data = StaticData::load(self.static_data_path.as_path()).await?;
        tracing::info!(
            path = %self.static_data_path.display(),
            smileys = static_data.smileys.len(),
            "reloaded static data"
        );
        self.apply_static_data(static_data);
        Ok(())
    }

    /// Swaps in freshly loaded static data, global defaults included.
    pub fn apply_static_data(&self, static_data: StaticData) {
        self.settings
            .replace_defaults(static_data.default_settings.clone());
        self.static_data.store(Arc::new(static_data));
    }
}

pub struct Context {
    pub application_id: Id<ApplicationMarker>,
    /// guild allowed to run the admin commands
    pub admin_guild_id: Option<Id<GuildMarker>>,
    pub services: Services,
    pub client: Client,
}

impl Context {
    pub fn interaction(&self) -> InteractionClient<'_> {
        self.client.interaction(self.application_id)
    }
}

pub struct CommandContext {
    pub meta: DiscordEventMeta,
    pub context: Arc<Context>,
    pub command: CommandData,
    pub event: InteractionCreate,
}

impl CommandContext {
    pub fn interaction(&self) -> InteractionClient<'_> {
        self.context.interaction()
    }

    pub fn services(&self) -> &Services {
        &self.context.services
    }

    pub fn guild_id(&self) -> Option<Id<GuildMarker>> {
        self.event.guild_id
    }

    /// Channel the command was used in
    pub fn channel_id(&self) -> Option<Id<ChannelMarker>> {
        self.event.channel.as_ref().map(|channel| channel.id)
    }

    fn arg(&self, name: &str) -> Option<&CommandOptionValue> {
        self.command
            .options
            .iter()
            .find(|option| option.name == name)
            .map(|option| &option.value)
    }

    pub fn get_arg_string_optional(&self, name: &str) -> Result<Option<String>, Error> {
        match self.arg(name) {
            None => Ok(None),
            Some(CommandOptionValue::String(value)) => Ok(Some(value.clone())),
            Some(other) => Err(format!("option {} is not a string: {:?}", name, other).into()),
        }
    }

    pub fn get_arg_string(&self, name: &str) -> Result<String, Error> {
        self.get_arg_string_optional(name)?
            .ok_or_else(|| format!("missing required option {}", name).into())
    }

    pub fn get_arg_integer_optional(&self, name: &str) -> Result<Option<i64>, Error> {
        match self.arg(name) {
            None => Ok(None),
            Some(CommandOptionValue::Integer(value)) => Ok(Some(*value)),
            Some(other) => Err(format!("option {} is not an integer: {:?}", name, other).into()),
        }
    }

    pub fn get_arg_bool_optional(&self, name: &str) -> Result<Option<bool>, Error> {
        match self.arg(name) {
            None => Ok(None),
            Some(CommandOptionValue::Boolean(value)) => Ok(Some(*value)),
            Some(other) => Err(format!("option {} is not a boolean: {:?}", name, other).into()),
        }
    }

    pub fn get_arg_channel_optional(
        &self,
        name: &str,
    ) -> Result<Option<Id<ChannelMarker>>, Error> {
        match self.arg(name) {
            None => Ok(None),
            Some(CommandOptionValue::Channel(value)) => Ok(Some(*value)),
            Some(other) => Err(format!("option {} is not a channel: {:?}", name, other).into()),
        }
    }

    pub fn get_arg_user(&self, name: &str) -> Result<Id<UserMarker>, Error> {
        match self.arg(name) {
            Some(CommandOptionValue::User(value)) => Ok(*value),
            Some(other) => Err(format!("option {} is not a user: {:?}", name, other).into()),
            None => Err(format!("missing required option {}", name).into()),
        }
    }

    pub async fn response(
        &self,
        response: InteractionResponse,
    ) -> Result<twilight_http::Response<EmptyBody>, twilight_http::Error> {
        self.interaction()
            .create_response(self.event.id, &self.event.token, &response)
            .await
    }

    pub async fn reply(
        &self,
        message: impl Into<String>,
    ) -> Result<twilight_http::Response<EmptyBody>, twilight_http::Error> {
        let response = InteractionResponseDataBuilder::new()
            .content(message)
            .build();

        self.response(InteractionResponse {
            kind: InteractionResponseType::ChannelMessageWithSource,
            data: Some(response),
        })
        .await
    }

    pub async fn reply_embed(
        &self,
        embed: Embed,
    ) -> Result<twilight_http::Response<EmptyBody>, twilight_http::Error> {
        let response = InteractionResponseDataBuilder::new()
            .embeds([embed])
            .build();

        self.response(InteractionResponse {
            kind: InteractionResponseType::ChannelMessageWithSource,
            data: Some(response),
        })
        .await
    }
}
