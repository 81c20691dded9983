use std::{future::Future, sync::Arc, time::Duration};

use arc_swap::ArcSwap;
use serde_json::Value;
use twilight_model::id::{
    marker::{ChannelMarker, GuildMarker},
    Id,
};

use crate::{
    backend::{SettingsBackend, WriteOp},
    cache::{CachedDocument, GuildCache},
    defaults::GlobalDefaults,
    document::TierSettings,
    error::{BackendError, SettingsError},
    setting::Setting,
    tier::Tier,
};

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub cache_capacity: usize,
    pub backend_timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            cache_capacity: 20,
            backend_timeout: Duration::from_secs(5),
        }
    }
}

/// Everything configured for a guild, as shown by `/settings`.
#[derive(Debug, Clone)]
pub struct SettingsOverview {
    pub global: Arc<GlobalDefaults>,
    pub guild_default: Option<TierSettings>,
    pub channels: Vec<(Id<ChannelMarker>, TierSettings)>,
}

pub struct SettingsStore {
    backend: Arc<dyn SettingsBackend>,
    defaults: ArcSwap<GlobalDefaults>,
    cache: GuildCache,
    backend_timeout: Duration,
}

impl SettingsStore {
    pub fn new(
        backend: Arc<dyn SettingsBackend>,
        defaults: GlobalDefaults,
        config: StoreConfig,
    ) -> Self {
        Self {
            backend,
            defaults: ArcSwap::from_pointee(defaults),
            cache: GuildCache::new(config.cache_capacity),
            backend_timeout: config.backend_timeout,
        }
    }

    /// A handle for one setting in one place, `channel_id` of `None` being
    /// the guild default.
    pub fn setting<'a>(
        &'a self,
        name: &'a str,
        guild_id: Option<Id<GuildMarker>>,
        channel_id: Option<Id<ChannelMarker>>,
    ) -> Setting<'a> {
        Setting::new(self, name, guild_id, channel_id)
    }

    pub fn cache(&self) -> &GuildCache {
        &self.cache
    }

    pub fn defaults(&self) -> Arc<GlobalDefaults> {
        self.defaults.load_full()
    }

    /// Swaps in freshly loaded defaults, readers see either the old or the
    /// new set, never a mix.
    pub fn replace_defaults(&self, defaults: GlobalDefaults) {
        tracing::info!(count = defaults.len(), "replacing global default settings");
        self.defaults.store(Arc::new(defaults));
    }

    pub fn get_global_default(&self, name: &str) -> Result<Value, SettingsError> {
        self.defaults.load().get(name).cloned()
    }

    /// Effective value of `name`: the channel override, then the guild
    /// default, then the global default.
    pub async fn resolve(
        &self,
        name: &str,
        guild_id: Option<Id<GuildMarker>>,
        channel_id: Option<Id<ChannelMarker>>,
    ) -> Result<Value, SettingsError> {
        let default = self.get_global_default(name)?;

        let Some(guild_id) = guild_id else {
            return Ok(default);
        };

        let doc = self.guild_document(guild_id).await?;
        Ok(doc
            .as_deref()
            .and_then(|doc| doc.lookup(name, channel_id))
            .cloned()
            .unwrap_or(default))
    }

    pub async fn write(
        &self,
        name: &str,
        guild_id: Option<Id<GuildMarker>>,
        channel_id: Option<Id<ChannelMarker>>,
        op: WriteOp,
    ) -> Result<(), SettingsError> {
        let guild_id = guild_id.ok_or(SettingsError::MissingGuildId)?;
        if !self.defaults.load().contains(name) {
            return Err(SettingsError::UnknownSetting(name.to_string()));
        }

        let tier = Tier::from(channel_id);
        tracing::debug!(
            guild_id = guild_id.get(),
            %tier,
            setting = name,
            op = op.name(),
            "writing setting"
        );

        {
            // invalidates once the backend call is over, whatever the outcome
            let _invalidate = InvalidateOnDrop {
                cache: &self.cache,
                guild_id,
            };
            self.with_timeout(op.apply(self.backend.as_ref(), guild_id, tier, name))
                .await?;
        }

        metrics::counter!("settings_writes_total", "op" => op.name()).increment(1);
        Ok(())
    }

    /// The stored overrides for a guild, `None` if it never configured anything.
    pub async fn guild_document(
        &self,
        guild_id: Id<GuildMarker>,
    ) -> Result<CachedDocument, SettingsError> {
        Ok(self
            .cache
            .get_or_fetch(guild_id, || {
                self.with_timeout(self.backend.find_one(guild_id))
            })
            .await?)
    }

    pub async fn overview(&self, guild_id: Id<GuildMarker>) -> Result<SettingsOverview, SettingsError> {
        let doc = self.guild_document(guild_id).await?;

        let guild_default = doc
            .as_deref()
            .and_then(|doc| doc.tier(&Tier::GuildDefault))
            .filter(|settings| !settings.is_empty())
            .cloned();
        let channels = doc
            .as_deref()
            .map(|doc| {
                doc.channels()
                    .map(|(channel_id, settings)| (channel_id, settings.clone()))
                    .collect()
            })
            .unwrap_or_default();

        Ok(SettingsOverview {
            global: self.defaults(),
            guild_default,
            channels,
        })
    }

    async fn with_timeout<T>(
        &self,
        fut: impl Future<Output = Result<T, BackendError>>,
    ) -> Result<T, BackendError> {
        let result = match tokio::time::timeout(self.backend_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(BackendError::Timeout(self.backend_timeout)),
        };

        if let Err(err) = &result {
            tracing::warn!(?err, "settings backend error");
            metrics::counter!("settings_backend_errors_total").increment(1);
        }

        result
    }
}

struct InvalidateOnDrop<'a> {
    cache: &'a GuildCache,
    guild_id: Id<GuildMarker>,
}

impl Drop for InvalidateOnDrop<'_> {
    fn drop(&mut self) {
        tracing::trace!(guild_id = self.guild_id.get(), "invalidating settings cache");
        self.cache.invalidate(self.guild_id);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;
    use serde_json::json;
    use tokio::sync::Notify;

    use super::*;
    use crate::{GuildDocument, MemoryBackend};

    const GUILD: Option<Id<GuildMarker>> = Some(Id::new(100));

    fn defaults() -> GlobalDefaults {
        serde_json::from_value(json!({ "mode": "simple", "max_smileys": 10 })).unwrap()
    }

    /// Holds the first `find_one` after it has read the document, until released.
    #[derive(Default)]
    struct GatedBackend {
        inner: MemoryBackend,
        gated: AtomicBool,
        fetched: Notify,
        release: Notify,
        hang: bool,
    }

    #[async_trait]
    impl SettingsBackend for GatedBackend {
        async fn find_one(
            &self,
            guild_id: Id<GuildMarker>,
        ) -> Result<Option<GuildDocument>, BackendError> {
            if self.hang {
                tokio::time::sleep(Duration::from_secs(60)).await;
            }

            let doc = self.inner.find_one(guild_id).await?;
            if self.gated.swap(false, Ordering::SeqCst) {
                self.fetched.notify_one();
                self.release.notified().await;
            }
            Ok(doc)
        }

        async fn set(
            &self,
            guild_id: Id<GuildMarker>,
            tier: Tier,
            name: &str,
            value: &Value,
        ) -> Result<(), BackendError> {
            self.inner.set(guild_id, tier, name, value).await
        }

        async fn unset(
            &self,
            guild_id: Id<GuildMarker>,
            tier: Tier,
            name: &str,
        ) -> Result<(), BackendError> {
            self.inner.unset(guild_id, tier, name).await
        }

        async fn list_add(
            &self,
            guild_id: Id<GuildMarker>,
            tier: Tier,
            name: &str,
            item: &Value,
        ) -> Result<(), BackendError> {
            self.inner.list_add(guild_id, tier, name, item).await
        }

        async fn list_remove(
            &self,
            guild_id: Id<GuildMarker>,
            tier: Tier,
            name: &str,
            item: &Value,
        ) -> Result<(), BackendError> {
            self.inner.list_remove(guild_id, tier, name, item).await
        }
    }

    #[tokio::test]
    async fn write_during_fetch_isnt_cached_stale_test() {
        let backend = Arc::new(GatedBackend::default());
        backend.gated.store(true, Ordering::SeqCst);
        let store = Arc::new(SettingsStore::new(
            backend.clone(),
            defaults(),
            StoreConfig::default(),
        ));

        let reader = tokio::spawn({
            let store = Arc::clone(&store);
            async move { store.resolve("mode", GUILD, None).await }
        });

        // the reader has the old (missing) document in hand
        backend.fetched.notified().await;
        store
            .write("mode", GUILD, None, WriteOp::Replace(json!("title")))
            .await
            .unwrap();
        backend.release.notify_one();

        // it started before the write, so the old value is fine here
        assert_eq!(reader.await.unwrap().unwrap(), json!("simple"));
        // but it must not have been cached
        assert!(!store.cache().contains(GUILD.unwrap()));
        assert_eq!(
            store.resolve("mode", GUILD, None).await.unwrap(),
            json!("title")
        );
    }

    #[tokio::test]
    async fn timeout_is_retryable_test() {
        let backend = Arc::new(GatedBackend {
            hang: true,
            ..Default::default()
        });
        let store = SettingsStore::new(
            backend,
            defaults(),
            StoreConfig {
                backend_timeout: Duration::from_millis(20),
                ..Default::default()
            },
        );

        let err = store.resolve("mode", GUILD, None).await.unwrap_err();
        assert!(matches!(
            err,
            SettingsError::Backend(BackendError::Timeout(_))
        ));
        assert!(err.is_retryable());

        // no guild never touches the backend
        assert_eq!(
            store.resolve("mode", None, None).await.unwrap(),
            json!("simple")
        );
    }

    #[tokio::test]
    async fn replace_defaults_test() {
        let store = SettingsStore::new(
            Arc::new(MemoryBackend::new()),
            defaults(),
            StoreConfig::default(),
        );
        store
            .write("max_smileys", GUILD, None, WriteOp::Replace(json!(3)))
            .await
            .unwrap();

        store.replace_defaults(
            serde_json::from_value(json!({ "mode": "reaction", "enabled": true })).unwrap(),
        );

        assert_eq!(store.get_global_default("mode").unwrap(), json!("reaction"));
        assert_eq!(
            store.resolve("enabled", GUILD, None).await.unwrap(),
            json!(true)
        );
        // the old names are gone entirely, overrides or not
        assert!(matches!(
            store.resolve("max_smileys", GUILD, None).await,
            Err(SettingsError::UnknownSetting(_))
        ));
    }

    #[tokio::test]
    async fn overview_test() {
        let store = SettingsStore::new(
            Arc::new(MemoryBackend::new()),
            defaults(),
            StoreConfig::default(),
        );
        let guild_id = GUILD.unwrap();

        let overview = store.overview(guild_id).await.unwrap();
        assert_eq!(overview.global.get("mode").unwrap(), &json!("simple"));
        assert!(overview.guild_default.is_none());
        assert!(overview.channels.is_empty());

        store
            .write("mode", GUILD, Some(Id::new(300)), WriteOp::Replace(json!("title")))
            .await
            .unwrap();
        store
            .write("mode", GUILD, Some(Id::new(200)), WriteOp::Replace(json!("reaction")))
            .await
            .unwrap();
        store
            .write("max_smileys", GUILD, Some(Id::new(400)), WriteOp::Replace(json!(1)))
            .await
            .unwrap();
        store
            .write("max_smileys", GUILD, Some(Id::new(400)), WriteOp::Delete)
            .await
            .unwrap();

        let overview = store.overview(guild_id).await.unwrap();
        assert!(overview.guild_default.is_none());
        let channels: Vec<_> = overview.channels.iter().map(|(id, _)| id.get()).collect();
        // sorted by channel id, emptied tiers left out
        assert_eq!(channels, vec![200, 300]);
    }

    #[tokio::test]
    async fn cache_bound_test() {
        let store = SettingsStore::new(
            Arc::new(MemoryBackend::new()),
            defaults(),
            StoreConfig::default(),
        );

        for id in 1..=20 {
            store.resolve("mode", Some(Id::new(id)), None).await.unwrap();
        }
        store.resolve("mode", Some(Id::new(1)), None).await.unwrap();
        store.resolve("mode", Some(Id::new(21)), None).await.unwrap();

        assert_eq!(store.cache().len(), 20);
        assert!(store.cache().contains(Id::new(1)));
        assert!(!store.cache().contains(Id::new(2)));
    }
}
