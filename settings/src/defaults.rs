use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::SettingsError;

/// The weakest tier, every known setting has an entry here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GlobalDefaults(Map<String, Value>);

impl GlobalDefaults {
    pub fn new(defaults: Map<String, Value>) -> Self {
        Self(defaults)
    }

    pub fn get(&self, name: &str) -> Result<&Value, SettingsError> {
        self.0
            .get(name)
            .ok_or_else(|| SettingsError::UnknownSetting(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, Value)> for GlobalDefaults {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
