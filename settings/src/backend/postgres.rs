use async_trait::async_trait;
use serde_json::Value;
use sqlx::types::Json;
use twilight_model::id::{marker::GuildMarker, Id};

use super::{db_id::DbId, SettingsBackend};
use crate::{document::GuildDocument, error::BackendError, tier::Tier};

/// Guild documents in a `guild_settings` table, one `JSONB` column per guild
/// holding `{ "<tier>": { "<setting>": value } }`.
#[derive(Debug, Clone)]
pub struct PgBackend {
    pool: sqlx::PgPool,
}

impl PgBackend {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../migrations").run(&self.pool).await
    }
}

#[async_trait]
impl SettingsBackend for PgBackend {
    async fn find_one(
        &self,
        guild_id: Id<GuildMarker>,
    ) -> Result<Option<GuildDocument>, BackendError> {
        let settings: Option<Json<Value>> =
            sqlx::query_scalar("SELECT settings FROM guild_settings WHERE guild_id = $1")
                .bind(DbId(guild_id))
                .fetch_optional(&self.pool)
                .await?;

        let Some(Json(settings)) = settings else {
            return Ok(None);
        };

        Ok(Some(GuildDocument {
            settings: serde_json::from_value(settings)?,
        }))
    }

    async fn set(
        &self,
        guild_id: Id<GuildMarker>,
        tier: Tier,
        name: &str,
        value: &Value,
    ) -> Result<(), BackendError> {
        sqlx::query(
            "
                INSERT INTO guild_settings (guild_id, settings)
                VALUES ($1, jsonb_build_object($2::text, jsonb_build_object($3::text, $4::jsonb)))
                ON CONFLICT (guild_id) DO UPDATE SET settings = guild_settings.settings
                    || jsonb_build_object(
                        $2::text,
                        COALESCE(guild_settings.settings -> $2::text, '{}'::jsonb)
                            || jsonb_build_object($3::text, $4::jsonb)
                    )
            ",
        )
        .bind(DbId(guild_id))
        .bind(tier.to_string())
        .bind(name)
        .bind(Json(value))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn unset(
        &self,
        guild_id: Id<GuildMarker>,
        tier: Tier,
        name: &str,
    ) -> Result<(), BackendError> {
        sqlx::query(
            "UPDATE guild_settings SET settings = settings #- ARRAY[$2::text, $3::text] WHERE guild_id = $1",
        )
        .bind(DbId(guild_id))
        .bind(tier.to_string())
        .bind(name)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_add(
        &self,
        guild_id: Id<GuildMarker>,
        tier: Tier,
        name: &str,
        item: &Value,
    ) -> Result<(), BackendError> {
        // the WHERE on the conflict branch skips existing non-list values,
        // which shows up as zero affected rows
        let result = sqlx::query(
            "
                INSERT INTO guild_settings (guild_id, settings)
                VALUES ($1, jsonb_build_object($2::text, jsonb_build_object($3::text, jsonb_build_array($4::jsonb))))
                ON CONFLICT (guild_id) DO UPDATE SET settings = guild_settings.settings
                    || jsonb_build_object(
                        $2::text,
                        COALESCE(guild_settings.settings -> $2::text, '{}'::jsonb)
                            || jsonb_build_object(
                                $3::text,
                                COALESCE(guild_settings.settings -> $2::text -> $3::text, '[]'::jsonb)
                                    || jsonb_build_array($4::jsonb)
                            )
                    )
                WHERE jsonb_typeof(COALESCE(guild_settings.settings -> $2::text -> $3::text, '[]'::jsonb)) = 'array'
            ",
        )
        .bind(DbId(guild_id))
        .bind(tier.to_string())
        .bind(name)
        .bind(Json(item))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(BackendError::NotAList {
                name: name.to_string(),
            });
        }

        Ok(())
    }

    async fn list_remove(
        &self,
        guild_id: Id<GuildMarker>,
        tier: Tier,
        name: &str,
        item: &Value,
    ) -> Result<(), BackendError> {
        sqlx::query(
            "
                UPDATE guild_settings SET settings = jsonb_set(
                    settings,
                    ARRAY[$2::text, $3::text],
                    COALESCE(
                        (
                            SELECT jsonb_agg(elem)
                            FROM jsonb_array_elements(settings -> $2::text -> $3::text) AS elem
                            WHERE elem <> $4::jsonb
                        ),
                        '[]'::jsonb
                    )
                )
                WHERE guild_id = $1
                    AND jsonb_typeof(settings -> $2::text -> $3::text) = 'array'
            ",
        )
        .bind(DbId(guild_id))
        .bind(tier.to_string())
        .bind(name)
        .bind(Json(item))
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
