use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use twilight_model::id::{marker::GuildMarker, Id};

use super::SettingsBackend;
use crate::{document::GuildDocument, error::BackendError, tier::Tier};

/// Keeps every document in memory, handy for tests and running without a database.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    documents: RwLock<HashMap<Id<GuildMarker>, GuildDocument>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_documents(
        documents: impl IntoIterator<Item = (Id<GuildMarker>, GuildDocument)>,
    ) -> Self {
        Self {
            documents: RwLock::new(documents.into_iter().collect()),
        }
    }

    pub fn document(&self, guild_id: Id<GuildMarker>) -> Option<GuildDocument> {
        self.documents.read().get(&guild_id).cloned()
    }
}

#[async_trait]
impl SettingsBackend for MemoryBackend {
    async fn find_one(
        &self,
        guild_id: Id<GuildMarker>,
    ) -> Result<Option<GuildDocument>, BackendError> {
        Ok(self.document(guild_id))
    }

    async fn set(
        &self,
        guild_id: Id<GuildMarker>,
        tier: Tier,
        name: &str,
        value: &Value,
    ) -> Result<(), BackendError> {
        self.documents
            .write()
            .entry(guild_id)
            .or_default()
            .set(tier, name, value.clone());
        Ok(())
    }

    async fn unset(
        &self,
        guild_id: Id<GuildMarker>,
        tier: Tier,
        name: &str,
    ) -> Result<(), BackendError> {
        if let Some(doc) = self.documents.write().get_mut(&guild_id) {
            doc.unset(&tier, name);
        }
        Ok(())
    }

    async fn list_add(
        &self,
        guild_id: Id<GuildMarker>,
        tier: Tier,
        name: &str,
        item: &Value,
    ) -> Result<(), BackendError> {
        let mut documents = self.documents.write();
        let mut doc = documents.get(&guild_id).cloned().unwrap_or_default();
        // only store when it worked so a failed push doesn't create a document
        doc.list_add(tier, name, item.clone())?;
        documents.insert(guild_id, doc);
        Ok(())
    }

    async fn list_remove(
        &self,
        guild_id: Id<GuildMarker>,
        tier: Tier,
        name: &str,
        item: &Value,
    ) -> Result<(), BackendError> {
        if let Some(doc) = self.documents.write().get_mut(&guild_id) {
            doc.list_remove(&tier, name, item);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn upsert_test() {
        let backend = MemoryBackend::new();
        let guild_id = Id::new(100);

        assert_eq!(backend.find_one(guild_id).await.unwrap(), None);

        // unset and list_remove never create a document
        backend
            .unset(guild_id, Tier::GuildDefault, "mode")
            .await
            .unwrap();
        backend
            .list_remove(guild_id, Tier::GuildDefault, "muted_users", &json!(1))
            .await
            .unwrap();
        assert_eq!(backend.find_one(guild_id).await.unwrap(), None);

        backend
            .set(guild_id, Tier::Channel(Id::new(200)), "mode", &json!("reaction"))
            .await
            .unwrap();
        let doc = backend.find_one(guild_id).await.unwrap().unwrap();
        assert_eq!(doc.lookup("mode", Some(Id::new(200))), Some(&json!("reaction")));
    }

    #[tokio::test]
    async fn failed_list_add_test() {
        let backend = MemoryBackend::new();
        let guild_id = Id::new(100);

        backend
            .set(guild_id, Tier::GuildDefault, "mode", &json!("simple"))
            .await
            .unwrap();
        let before = backend.document(guild_id);

        assert!(matches!(
            backend
                .list_add(guild_id, Tier::GuildDefault, "mode", &json!(1))
                .await,
            Err(BackendError::NotAList { .. })
        ));
        assert_eq!(backend.document(guild_id), before);
    }
}
