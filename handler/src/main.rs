mod amqp;
mod config;
mod context;
mod metrics;
mod modules;
mod static_data;

use std::{sync::Arc, time::Duration};

use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions},
    ConnectOptions,
};
use tracing::log::LevelFilter;
use twilight_gateway::{Event, EventTypeFlags};
use twilight_model::application::interaction::InteractionData;

use freesmiley_settings::{PgBackend, SettingsStore};
use freesmiley_shared::{DiscordEvent, DiscordEventMeta};

use config::Config;
use context::{CommandContext, Context, Error, Services};
use static_data::StaticData;

#[tokio::main]
async fn main() -> Result<(), Error> {
    // load .env into environment vars, ignore if not found
    match dotenvy::dotenv().map(|_| ()) {
        Err(err) if err.not_found() => {
            tracing::warn!("no .env file found");
        }
        result => result?,
    };

    // create config from environment vars
    let config = Config::from_env()?;

    // set-up logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // set-up metrics
    tracing::info!("installing metrics collector and exporter...");
    metrics::install()?;

    let client = twilight_http::Client::builder()
        .proxy(config.discord_proxy.clone(), true)
        .ratelimiter(None)
        .build();

    // create postgres connection
    let connect_opts = config
        .database_url
        .parse::<PgConnectOptions>()?
        .log_statements(LevelFilter::Trace)
        .log_slow_statements(LevelFilter::Warn, Duration::from_secs(5));
    let db = PgPoolOptions::new()
        .max_connections(5)
        .connect_with(connect_opts)
        .await?;
    let backend = PgBackend::new(db);

    tracing::info!("running migrations...");
    backend.migrate().await?;

    // settings and the data they default to
    tracing::info!(path = %config.static_data_path, "loading static data...");
    let static_data = StaticData::load(&config.static_data_path).await?;
    let settings = SettingsStore::new(
        Arc::new(backend),
        static_data.default_settings.clone(),
        config.store_config(),
    );
    let services = Services::new(settings, static_data, &config.static_data_path);
    static_data::spawn_reload(config.static_data_reload_interval(), services.clone());

    let app = client.current_user_application().await?.model().await?;
    let context = Arc::new(Context {
        application_id: app.id,
        admin_guild_id: config.admin_guild_id(),
        services,
        client,
    });

    // register commands
    tracing::info!("registering commands");
    context
        .interaction()
        .set_global_commands(&modules::settings::commands())
        .await?;
    if let Some(admin_guild_id) = context.admin_guild_id {
        tracing::info!(guild = %admin_guild_id, "registering admin commands");
        context
            .interaction()
            .set_guild_commands(admin_guild_id, &modules::admin::commands())
            .await?;
    }

    let mut consumer = amqp::create(&config.rabbitmq_address, &config.rabbitmq_queue).await?;
    tracing::info!(queue = %config.rabbitmq_queue, "waiting for events");

    while let Some(message) = consumer.recv().await {
        let (meta, event) = match parse_delivery(&message) {
            Ok(Some(parsed)) => parsed,
            Ok(None) => continue,
            Err(err) => {
                tracing::error!(?err, "couldn't parse delivery");
                continue;
            }
        };

        tracing::debug!(
            event = ?event.kind(),
            uuid = ?meta.uuid,
            shard = meta.shard,
            "event received",
        );

        tokio::spawn(handle_event(context.clone(), meta, event));
    }

    tracing::warn!("consumer closed, shutting down");
    Ok(())
}

async fn handle_event(context: Arc<Context>, meta: DiscordEventMeta, event: Event) {
    match event {
        Event::InteractionCreate(event) => {
            let Some(InteractionData::ApplicationCommand(command)) = &event.data else {
                return;
            };
            let command = *command.clone();
            let name = command.name.clone();

            tracing::info!(uuid = ?meta.uuid, "processing command /{}", name);

            let command_context = CommandContext {
                meta,
                context,
                command,
                event: *event,
            };
            let result = match name.as_str() {
                modules::admin::RELOAD => modules::admin::handle_command(command_context).await,
                _ => modules::settings::handle_command(command_context).await,
            };
            if let Err(err) = result {
                tracing::warn!("error processing command /{}: {}", name, err);
            }
        }
        Event::MessageCreate(event) => {
            if let Err(err) = modules::smiley::event_handlers::handle_message(context, *event).await
            {
                tracing::warn!(uuid = ?meta.uuid, "error handling message: {}", err);
            }
        }
        e => tracing::trace!(event = ?e.kind(), "unhandled event"),
    }
}

/// Decodes a queued gateway event, `None` for events nothing handles.
fn parse_delivery(message: &[u8]) -> Result<Option<(DiscordEventMeta, Event)>, Error> {
    let discord_event = serde_json::from_slice::<DiscordEvent>(message)?;

    let Some(event) = twilight_gateway::parse(
        discord_event.payload,
        EventTypeFlags::INTERACTION_CREATE | EventTypeFlags::MESSAGE_CREATE,
    )?
    else {
        return Ok(None);
    };

    Ok(Some((discord_event.meta, Event::from(event))))
}
