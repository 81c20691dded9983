use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use twilight_model::id::{marker::ChannelMarker, Id};

/// Key used for the guild-wide tier in stored documents.
pub const GUILD_DEFAULT_KEY: &str = "default";

/// Where inside a guild document an override lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Tier {
    GuildDefault,
    Channel(Id<ChannelMarker>),
}

#[derive(Debug, Error, PartialEq)]
#[error("invalid tier key `{0}`")]
pub struct ParseTierError(String);

impl From<Option<Id<ChannelMarker>>> for Tier {
    fn from(channel_id: Option<Id<ChannelMarker>>) -> Self {
        match channel_id {
            Some(channel_id) => Self::Channel(channel_id),
            None => Self::GuildDefault,
        }
    }
}

impl Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::GuildDefault => f.write_str(GUILD_DEFAULT_KEY),
            Self::Channel(channel_id) => channel_id.fmt(f),
        }
    }
}

impl FromStr for Tier {
    type Err = ParseTierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == GUILD_DEFAULT_KEY {
            return Ok(Self::GuildDefault);
        }

        Id::<ChannelMarker>::from_str(s)
            .map(Self::Channel)
            .map_err(|_| ParseTierError(s.to_string()))
    }
}

impl TryFrom<String> for Tier {
    type Error = ParseTierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Tier> for String {
    fn from(value: Tier) -> Self {
        value.to_string()
    }
}
