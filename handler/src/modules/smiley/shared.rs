use std::{collections::HashMap, fmt::Display, str::FromStr, sync::LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use twilight_model::id::{marker::MessageMarker, Id};

use crate::static_data::{Smiley, StaticData};

#[expect(clippy::expect_used, reason = "constant pattern")]
static CUSTOM_EMOJI: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<(a?):([[:word:]]+):([[:digit:]]+)>").expect("invalid custom emoji pattern")
});

#[expect(clippy::expect_used, reason = "constant pattern")]
static WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[[:word:]]+").expect("invalid word pattern"));

/// How the bot responds to a message with smileys in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Mode {
    /// just the smileys
    Simple,
    /// a mention and a title, then the smileys
    Title,
    /// react to the message instead of replying
    Reaction,
}

impl Mode {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Title => "title",
            Self::Reaction => "reaction",
        }
    }
}

impl Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "simple" => Ok(Self::Simple),
            "title" => Ok(Self::Title),
            "reaction" => Ok(Self::Reaction),
            _ => Err(format!("unknown mode {}", s)),
        }
    }
}

impl From<Mode> for Value {
    fn from(mode: Mode) -> Self {
        Value::String(mode.name().into())
    }
}

/// Names of the custom emojis used in `content`, in order of appearance.
pub(crate) fn parse_emoji_names(content: &str) -> Vec<&str> {
    CUSTOM_EMOJI
        .captures_iter(content)
        .map(|caps| {
            let (_, [_animated, name, _id]) = caps.extract();
            name
        })
        .collect()
}

/// Smileys for the emoji names, each smiley at most once and no more than `max`.
pub(crate) fn pick_smileys<'a>(
    static_data: &'a StaticData,
    names: &[&str],
    max: usize,
) -> Vec<&'a Smiley> {
    let mut smileys: Vec<&Smiley> = Vec::new();
    for smiley in names.iter().filter_map(|name| static_data.smiley(name)) {
        if smileys.len() >= max {
            break;
        }
        if !smileys.contains(&smiley) {
            smileys.push(smiley);
        }
    }

    smileys
}

pub(crate) fn format_smileys(smileys: &[&Smiley]) -> String {
    smileys
        .iter()
        .map(|smiley| smiley.to_string())
        .collect::<Vec<String>>()
        .join(" ")
}

/// Trigger words used in `content`, lowercased, each once, in order of
/// appearance. `triggers` is keyed by lowercase word.
pub(crate) fn find_trigger_words(content: &str, triggers: &Map<String, Value>) -> Vec<String> {
    let mut words: Vec<String> = Vec::new();
    for word in WORD.find_iter(content).map(|m| m.as_str().to_lowercase()) {
        if triggers.contains_key(&word) && !words.contains(&word) {
            words.push(word);
        }
    }

    words
}

/// Keeps the words that win their roll, `chance` is given the word's
/// percentage. Words without a percentage never win.
pub(crate) fn roll_words(
    words: Vec<String>,
    chances: &HashMap<String, f64>,
    mut chance: impl FnMut(f64) -> bool,
) -> Vec<String> {
    words
        .into_iter()
        .filter(|word| chances.get(word).is_some_and(|percent| chance(*percent)))
        .collect()
}

/// Succeeds `percent` times out of a hundred.
pub(crate) fn chance(percent: f64) -> bool {
    rand::random::<f64>() * 100.0 < percent
}

/// Title for a message, varies between messages but stays the same for one.
pub(crate) fn pick_title(titles: &[String], message_id: Id<MessageMarker>) -> Option<&str> {
    if titles.is_empty() {
        return None;
    }

    let index = (message_id.get() % titles.len() as u64) as usize;
    titles.get(index).map(String::as_str)
}
