pub mod cooldown;
pub mod event_handlers;
pub mod gates;
pub mod shared;

// setting names, each has an entry in the static data's default settings
pub(crate) const ENABLED: &str = "enabled";
pub(crate) const MODE: &str = "mode";
pub(crate) const MAX_SMILEYS: &str = "max_smileys";
pub(crate) const MUTED_USERS: &str = "muted_users";

// optional, left out of the default settings to turn them off
pub(crate) const COOLDOWN: &str = "cooldown";
pub(crate) const RANDOM_REACTIONS_CHANCES: &str = "random_reactions_chances";
