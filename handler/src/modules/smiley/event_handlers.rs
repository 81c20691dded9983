use std::{collections::HashMap, sync::Arc, time::Instant};

use serde::de::DeserializeOwned;
use serde_json::Value;
use twilight_model::{
    channel::Message,
    gateway::payload::incoming::MessageCreate,
    id::{
        marker::{ChannelMarker, GuildMarker, MessageMarker, UserMarker},
        Id,
    },
};

use freesmiley_settings::{SettingsError, SettingsStore};

use super::{
    cooldown::Cooldown,
    gates,
    shared::{self, Mode},
    COOLDOWN, MAX_SMILEYS, MODE, RANDOM_REACTIONS_CHANCES,
};
use crate::{
    context::{Context, Error, Services},
    static_data::Smiley,
};

/// The parts of a message that decide the response.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Incoming<'a> {
    pub guild_id: Option<Id<GuildMarker>>,
    pub channel_id: Id<ChannelMarker>,
    pub message_id: Id<MessageMarker>,
    pub author_id: Id<UserMarker>,
    pub author_bot: bool,
    pub content: &'a str,
}

impl<'a> From<&'a Message> for Incoming<'a> {
    fn from(message: &'a Message) -> Self {
        Self {
            guild_id: message.guild_id,
            channel_id: message.channel_id,
            message_id: message.id,
            author_id: message.author.id,
            author_bot: message.author.bot,
            content: &message.content,
        }
    }
}

/// What to do about a message.
#[derive(Debug, PartialEq)]
pub(crate) enum Response {
    React(Vec<Smiley>),
    Send {
        title: Option<String>,
        smileys: String,
    },
}

pub async fn handle_message(ctx: Arc<Context>, event: MessageCreate) -> Result<(), Error> {
    let message = &event.0;

    let Some(response) = respond_to(&ctx.services, message.into()).await? else {
        return Ok(());
    };

    match response {
        Response::React(smileys) => {
            for smiley in &smileys {
                ctx.client
                    .create_reaction(message.channel_id, message.id, &smiley.reaction())
                    .await?;
            }
            metrics::counter!("smileys_sent_total", "mode" => Mode::Reaction.name())
                .increment(smileys.len() as u64);
        }
        Response::Send { title, smileys } => {
            let mode = if let Some(title) = title {
                ctx.client
                    .create_message(message.channel_id)
                    .content(&title)
                    .await?;
                Mode::Title
            } else {
                Mode::Simple
            };

            ctx.client
                .create_message(message.channel_id)
                .content(&smileys)
                .await?;
            metrics::counter!("smileys_sent_total", "mode" => mode.name()).increment(1);
        }
    }

    Ok(())
}

/// Works out the response to a message based on its guild and channel
/// settings, `None` when the bot should stay quiet.
pub(crate) async fn respond_to(
    services: &Services,
    message: Incoming<'_>,
) -> Result<Option<Response>, Error> {
    let Some(guild_id) = message.guild_id else {
        return Ok(None);
    };
    if message.author_bot {
        return Ok(None);
    }

    let settings = &services.settings;
    let (guild_id, channel_id) = (Some(guild_id), Some(message.channel_id));

    if !gates::is_enabled(settings, guild_id, channel_id).await? {
        tracing::trace!(channel = %message.channel_id, "smileys disabled in channel");
        return Ok(None);
    }
    if gates::is_muted(settings, guild_id, channel_id, message.author_id).await? {
        tracing::trace!(user = %message.author_id, "user is muted");
        return Ok(None);
    }

    let static_data = services.static_data.load_full();
    let max_smileys: usize = settings
        .setting(MAX_SMILEYS, guild_id, channel_id)
        .read_as()
        .await?;

    let names = shared::parse_emoji_names(message.content);
    let mut smileys = shared::pick_smileys(&static_data, &names, max_smileys);

    // without smileys a message can still trigger one by the words in it
    let from_words = smileys.is_empty();
    if from_words {
        let words = word_reactions(settings, guild_id, channel_id, message.content).await?;
        let words: Vec<&str> = words.iter().map(String::as_str).collect();
        smileys = shared::pick_smileys(&static_data, &words, max_smileys);
    }
    if smileys.is_empty() {
        return Ok(None);
    }

    let cooldown: Option<Cooldown> =
        read_optional(settings, COOLDOWN, guild_id, channel_id).await?;
    if let Some(cooldown) = cooldown {
        if !services
            .cooldowns
            .try_acquire(message.channel_id, cooldown, Instant::now())
        {
            tracing::trace!(channel = %message.channel_id, "channel on cooldown");
            return Ok(None);
        }
    }

    let mode: Mode = settings
        .setting(MODE, guild_id, channel_id)
        .read_as()
        .await?;
    tracing::debug!(mode = %mode, count = smileys.len(), from_words, "dealing smileys");

    let title = match mode {
        Mode::Title if !from_words => {
            shared::pick_title(&static_data.titles, message.message_id)
                .map(|title| format!("<@{}> {}", message.author_id, title))
        }
        _ => None,
    };

    Ok(Some(match mode {
        Mode::Reaction => Response::React(smileys.into_iter().cloned().collect()),
        Mode::Simple | Mode::Title => Response::Send {
            title,
            smileys: shared::format_smileys(&smileys),
        },
    }))
}

/// Trigger words in `content` that won their roll, none when the static data
/// has no word chances.
async fn word_reactions(
    settings: &SettingsStore,
    guild_id: Option<Id<GuildMarker>>,
    channel_id: Option<Id<ChannelMarker>>,
    content: &str,
) -> Result<Vec<String>, SettingsError> {
    // the global default decides which words count, a guild only tunes the chances
    let triggers = match settings.get_global_default(RANDOM_REACTIONS_CHANCES) {
        Ok(Value::Object(triggers)) => triggers,
        Ok(_) | Err(SettingsError::UnknownSetting(_)) => return Ok(Vec::new()),
        Err(err) => return Err(err),
    };

    let words = shared::find_trigger_words(content, &triggers);
    if words.is_empty() {
        return Ok(words);
    }

    let chances: HashMap<String, f64> = settings
        .setting(RANDOM_REACTIONS_CHANCES, guild_id, channel_id)
        .read_as()
        .await?;
    Ok(shared::roll_words(words, &chances, shared::chance))
}

/// Reads a setting the static data may leave out, `None` when it has no
/// global default.
async fn read_optional<T: DeserializeOwned>(
    settings: &SettingsStore,
    name: &str,
    guild_id: Option<Id<GuildMarker>>,
    channel_id: Option<Id<ChannelMarker>>,
) -> Result<Option<T>, SettingsError> {
    match settings.setting(name, guild_id, channel_id).read_as().await {
        Ok(value) => Ok(Some(value)),
        Err(SettingsError::UnknownSetting(_)) => Ok(None),
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use freesmiley_settings::{GlobalDefaults, MemoryBackend, StoreConfig};

    use super::*;
    use crate::{modules::smiley::MUTED_USERS, static_data::StaticData};

    const GUILD: Option<Id<GuildMarker>> = Some(Id::new(100));
    const CHANNEL: Option<Id<ChannelMarker>> = Some(Id::new(200));

    fn services() -> Services {
        let static_data: StaticData = serde_json::from_value(json!({
            "default_settings": {
                "enabled": true,
                "mode": "simple",
                "max_smileys": 2,
                "muted_users": [],
                "random_reactions_chances": { "friday": 100, "monday": 0 },
            },
            "titles": ["Free smileys!"],
            "smileys": {
                "joy": { "id": "1", "name": "free_joy" },
                "sob": { "id": "2", "name": "free_sob" },
                "party": { "id": "3", "name": "free_party", "animated": true },
                "friday": { "id": "4", "name": "free_friday" },
                "monday": { "id": "5", "name": "free_monday" },
            },
        }))
        .unwrap();

        let store = SettingsStore::new(
            Arc::new(MemoryBackend::new()),
            static_data.default_settings.clone(),
            StoreConfig::default(),
        );
        Services::new(store, static_data, "static_data.json")
    }

    fn message(content: &str, guild: bool, bot: bool) -> Incoming<'_> {
        Incoming {
            guild_id: if guild { GUILD } else { None },
            channel_id: Id::new(200),
            message_id: Id::new(7),
            author_id: Id::new(300),
            author_bot: bot,
            content,
        }
    }

    #[tokio::test]
    async fn simple_mode_test() {
        let services = services();
        let response = respond_to(&services, message("<:joy:10> <a:party:11>", true, false))
            .await
            .unwrap();

        assert_eq!(
            response,
            Some(Response::Send {
                title: None,
                smileys: "<:free_joy:1> <a:free_party:3>".into(),
            })
        );
    }

    #[tokio::test]
    async fn title_mode_test() {
        let services = services();
        services
            .settings
            .setting(MODE, GUILD, None)
            .change(Value::from(Mode::Title))
            .await
            .unwrap();

        let response = respond_to(&services, message("<:sob:10>", true, false))
            .await
            .unwrap();

        assert_eq!(
            response,
            Some(Response::Send {
                title: Some("<@300> Free smileys!".into()),
                smileys: "<:free_sob:2>".into(),
            })
        );
    }

    #[tokio::test]
    async fn reaction_mode_respects_max_smileys_test() {
        let services = services();
        services
            .settings
            .setting(MODE, GUILD, CHANNEL)
            .change(Value::from(Mode::Reaction))
            .await
            .unwrap();

        let response = respond_to(
            &services,
            message("<:joy:10> <:sob:11> <:party:12>", true, false),
        )
        .await
        .unwrap();

        let Some(Response::React(smileys)) = response else {
            panic!("expected reactions");
        };
        assert_eq!(
            smileys.iter().map(|s| s.id.get()).collect::<Vec<_>>(),
            vec![1, 2]
        );
    }

    #[tokio::test]
    async fn ignored_messages_test() {
        let services = services();

        // direct messages, bots and messages without known smileys
        for message in [
            message("<:joy:10>", false, false),
            message("<:joy:10>", true, true),
            message("<:nope:10> hello", true, false),
        ] {
            assert_eq!(respond_to(&services, message).await.unwrap(), None);
        }
    }

    #[tokio::test]
    async fn blacklisted_and_muted_test() {
        let services = services();
        let settings = &services.settings;

        settings
            .setting(MUTED_USERS, GUILD, CHANNEL)
            .push(300u64)
            .await
            .unwrap();
        assert_eq!(
            respond_to(&services, message("<:joy:10>", true, false))
                .await
                .unwrap(),
            None
        );

        settings
            .setting(MUTED_USERS, GUILD, CHANNEL)
            .pop(300u64)
            .await
            .unwrap();
        settings
            .setting("enabled", GUILD, None)
            .change(json!(false))
            .await
            .unwrap();
        assert_eq!(
            respond_to(&services, message("<:joy:10>", true, false))
                .await
                .unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn word_reactions_test() {
        let services = services();

        // monday never wins its roll
        let response = respond_to(&services, message("Friday, FRIDAY! not monday", true, false))
            .await
            .unwrap();
        assert_eq!(
            response,
            Some(Response::Send {
                title: None,
                smileys: "<:free_friday:4>".into(),
            })
        );

        // smileys take precedence over words
        let response = respond_to(&services, message("friday <:joy:10>", true, false))
            .await
            .unwrap();
        assert_eq!(
            response,
            Some(Response::Send {
                title: None,
                smileys: "<:free_joy:1>".into(),
            })
        );

        assert_eq!(
            respond_to(&services, message("just monday", true, false))
                .await
                .unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn word_reactions_follow_guild_chances_test() {
        let services = services();
        let settings = &services.settings;

        settings
            .setting(RANDOM_REACTIONS_CHANCES, GUILD, None)
            .change(json!({ "friday": 0, "monday": 100 }))
            .await
            .unwrap();
        settings
            .setting(MODE, GUILD, None)
            .change(Value::from(Mode::Title))
            .await
            .unwrap();

        assert_eq!(
            respond_to(&services, message("friday", true, false))
                .await
                .unwrap(),
            None
        );

        // words never get a title
        assert_eq!(
            respond_to(&services, message("monday", true, false))
                .await
                .unwrap(),
            Some(Response::Send {
                title: None,
                smileys: "<:free_monday:5>".into(),
            })
        );
    }

    #[tokio::test]
    async fn word_reactions_without_chances_test() {
        let services = services();
        let defaults: GlobalDefaults = services
            .settings
            .defaults()
            .iter()
            .filter(|(name, _)| name.as_str() != RANDOM_REACTIONS_CHANCES)
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        services.settings.replace_defaults(defaults);

        assert_eq!(
            respond_to(&services, message("friday", true, false))
                .await
                .unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn cooldown_test() {
        let services = services();
        let defaults: GlobalDefaults = services
            .settings
            .defaults()
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .chain([(COOLDOWN.to_string(), json!([1, 60]))])
            .collect();
        services.settings.replace_defaults(defaults);

        assert!(respond_to(&services, message("<:joy:10>", true, false))
            .await
            .unwrap()
            .is_some());
        // messages that don't get a response don't use up the window
        assert_eq!(
            respond_to(&services, message("nothing to see", true, false))
                .await
                .unwrap(),
            None
        );
        assert_eq!(
            respond_to(&services, message("<:sob:10>", true, false))
                .await
                .unwrap(),
            None
        );

        // a channel override lifts the limit
        services
            .settings
            .setting(COOLDOWN, GUILD, CHANNEL)
            .change(json!([5, 60]))
            .await
            .unwrap();
        assert!(respond_to(&services, message("<:sob:10>", true, false))
            .await
            .unwrap()
            .is_some());
    }
}
