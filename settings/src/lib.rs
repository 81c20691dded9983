//! Per-guild settings for the smiley dealer.
//!
//! Values resolve through three tiers: a channel override, the guild default
//! and finally the global defaults loaded from static data. Guild documents
//! are cached in a small LRU which is invalidated after every write.

pub mod backend;
pub mod cache;
pub mod defaults;
pub mod document;
pub mod error;
pub mod setting;
pub mod store;
pub mod tier;

pub use backend::{memory::MemoryBackend, postgres::PgBackend, SettingsBackend, WriteOp};
pub use defaults::GlobalDefaults;
pub use document::{GuildDocument, TierSettings};
pub use error::{BackendError, SettingsError};
pub use setting::{Change, Setting};
pub use store::{SettingsOverview, SettingsStore, StoreConfig};
pub use tier::Tier;
