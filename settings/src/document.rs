use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use twilight_model::id::{marker::ChannelMarker, Id};

use crate::{error::BackendError, tier::Tier};

/// Setting name to value, for a single tier.
pub type TierSettings = Map<String, Value>;

/// All overrides stored for one guild.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GuildDocument {
    #[serde(default)]
    pub settings: BTreeMap<Tier, TierSettings>,
}

impl GuildDocument {
    pub fn tier(&self, tier: &Tier) -> Option<&TierSettings> {
        self.settings.get(tier)
    }

    pub fn get(&self, name: &str, tier: &Tier) -> Option<&Value> {
        self.tier(tier).and_then(|settings| settings.get(name))
    }

    /// Looks up an override, the channel tier first then the guild default.
    pub fn lookup(&self, name: &str, channel_id: Option<Id<ChannelMarker>>) -> Option<&Value> {
        channel_id
            .and_then(|channel_id| self.get(name, &Tier::Channel(channel_id)))
            .or_else(|| self.get(name, &Tier::GuildDefault))
    }

    /// Channel tiers with at least one override.
    pub fn channels(&self) -> impl Iterator<Item = (Id<ChannelMarker>, &TierSettings)> {
        self.settings
            .iter()
            .filter_map(|(tier, settings)| match tier {
                Tier::Channel(channel_id) if !settings.is_empty() => Some((*channel_id, settings)),
                _ => None,
            })
    }

    pub fn set(&mut self, tier: Tier, name: &str, value: Value) {
        self.settings
            .entry(tier)
            .or_default()
            .insert(name.to_string(), value);
    }

    /// Removes an override, leaving the (possibly empty) tier in place.
    pub fn unset(&mut self, tier: &Tier, name: &str) {
        if let Some(settings) = self.settings.get_mut(tier) {
            settings.remove(name);
        }
    }

    /// Appends `item`, creating a single element list if there's no override yet.
    pub fn list_add(&mut self, tier: Tier, name: &str, item: Value) -> Result<(), BackendError> {
        let settings = self.settings.entry(tier).or_default();
        match settings.get_mut(name) {
            None => {
                settings.insert(name.to_string(), Value::Array(vec![item]));
                Ok(())
            }
            Some(Value::Array(items)) => {
                items.push(item);
                Ok(())
            }
            Some(_) => Err(BackendError::NotAList {
                name: name.to_string(),
            }),
        }
    }

    /// Removes every occurrence of `item`, anything that isn't a list is left alone.
    pub fn list_remove(&mut self, tier: &Tier, name: &str, item: &Value) {
        if let Some(Value::Array(items)) = self
            .settings
            .get_mut(tier)
            .and_then(|settings| settings.get_mut(name))
        {
            items.retain(|existing| existing != item);
        }
    }
}
