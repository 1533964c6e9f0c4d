use anyhow::Context;
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::storage::KeyValueStore;

/// Key-value entries in a single Postgres table (`kv_entries`).
#[derive(Clone)]
pub struct PgKeyValueStore {
    db: PgPool,
}

impl PgKeyValueStore {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let db = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .context("connect to database")?;

        // Run migrations if present
        if let Err(e) = sqlx::migrate!("./migrations").run(&db).await {
            tracing::warn!(error = %e, "migration failed; continuing");
        }

        Ok(Self::from_pool(db))
    }

    pub fn from_pool(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl KeyValueStore for PgKeyValueStore {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        let value = sqlx::query_scalar::<_, String>(
            r#"
            SELECT value
            FROM kv_entries
            WHERE key = $1
            "#,
        )
        .bind(key)
        .fetch_optional(&self.db)
        .await
        .with_context(|| format!("select kv entry {key}"))?;
        Ok(value)
    }

    async fn put(&self, key: &str, value: String) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO kv_entries (key, value)
            VALUES ($1, $2)
            ON CONFLICT (key) DO UPDATE
            SET value = EXCLUDED.value, updated_at = now()
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.db)
        .await
        .with_context(|| format!("upsert kv entry {key}"))?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> anyhow::Result<()> {
        sqlx::query(r#"DELETE FROM kv_entries WHERE key = $1"#)
            .bind(key)
            .execute(&self.db)
            .await
            .with_context(|| format!("delete kv entry {key}"))?;
        Ok(())
    }
}
