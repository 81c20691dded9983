use std::{collections::HashMap, fmt::Display, path::Path, time::Duration};

use serde::Deserialize;
use twilight_http::request::channel::reaction::RequestReactionType;
use twilight_model::id::{marker::EmojiMarker, Id};

use freesmiley_settings::GlobalDefaults;

use crate::context::{Error, Services};

/// Bot wide data that isn't configurable per guild, read from a JSON file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StaticData {
    pub default_settings: GlobalDefaults,
    #[serde(default)]
    pub titles: Vec<String>,
    /// smiley name -> the custom emoji to respond with
    #[serde(default)]
    pub smileys: HashMap<String, Smiley>,
}

impl StaticData {
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let json = tokio::fs::read_to_string(path).await?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Smiley for an emoji name found in a message, case insensitive.
    pub fn smiley(&self, name: &str) -> Option<&Smiley> {
        self.smileys
            .get(name)
            .or_else(|| self.smileys.get(&name.to_lowercase()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
pub struct Smiley {
    pub id: Id<EmojiMarker>,
    pub name: String,
    #[serde(default)]
    pub animated: bool,
}

impl Smiley {
    pub fn reaction(&self) -> RequestReactionType<'_> {
        RequestReactionType::Custom {
            id: self.id,
            name: Some(&self.name),
        }
    }
}

impl Display for Smiley {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "<{}:{}:{}>",
            if self.animated { "a" } else { "" },
            self.name,
            self.id
        )
    }
}

/// Reloads the static data file every `every`, keeping the previous data
/// when the file can't be read.
pub(crate) fn spawn_reload(every: Duration, services: Services) {
    if every.is_zero() {
        tracing::info!("static data reloading disabled");
        return;
    }

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        // first tick completes immediately, the data was just loaded
        interval.tick().await;

        loop {
            interval.tick().await;

            if let Err(err) = services.reload_static_data().await {
                tracing::warn!(
                    path = %services.static_data_path.display(),
                    "couldn't reload static data, keeping old data: {}",
                    err
                );
            }
        }
    });
}
