use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_envfile::Error;
use twilight_model::id::{marker::GuildMarker, Id};

use freesmiley_settings::StoreConfig;

#[derive(Serialize, Deserialize, Debug)]
pub struct Config {
    pub discord_proxy: String,
    pub rabbitmq_address: String,
    #[serde(default = "default_rabbitmq_queue")]
    pub rabbitmq_queue: String,
    pub database_url: String,

    pub static_data_path: String,
    #[serde(default = "default_static_data_reload_secs")]
    pub static_data_reload_secs: u64,

    #[serde(default = "default_settings_cache_capacity")]
    pub settings_cache_capacity: usize,
    #[serde(default = "default_backend_timeout_ms")]
    pub backend_timeout_ms: u64,

    /// guild the admin commands are registered in, none without it
    #[serde(default)]
    pub admin_guild_id: Option<u64>,
}

fn default_rabbitmq_queue() -> String {
    "discord".into()
}

fn default_static_data_reload_secs() -> u64 {
    300
}

fn default_settings_cache_capacity() -> usize {
    20
}

fn default_backend_timeout_ms() -> u64 {
    5_000
}

impl Config {
    pub fn from_env() -> Result<Self, Error> {
        serde_envfile::from_env()
    }

    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            cache_capacity: self.settings_cache_capacity,
            backend_timeout: Duration::from_millis(self.backend_timeout_ms),
        }
    }

    pub fn admin_guild_id(&self) -> Option<Id<GuildMarker>> {
        self.admin_guild_id.and_then(Id::new_checked)
    }

    pub fn static_data_reload_interval(&self) -> Duration {
        Duration::from_secs(self.static_data_reload_secs)
    }
}
