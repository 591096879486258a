// src/activity/sqlite.rs
//! Local SQLite activity store, for running without a Supabase project

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::SqlitePool;
use std::path::Path;
use tracing::info;
use uuid::Uuid;

use super::ActivityStore;
use crate::types::{ActivityUpdate, NewActivityRecord};

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn connect(database_path: &Path) -> Result<Self> {
        if let Some(parent) = database_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .context("Failed to create database directory")?;
        }

        let database_url = format!("sqlite:{}?mode=rwc", database_path.display());
        let pool = SqlitePool::connect(&database_url)
            .await
            .context("Failed to connect to SQLite database")?;

        let store = Self { pool };
        store.migrate().await?;
        info!("Activity database ready: {}", database_url);
        Ok(store)
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS activity_logs (
                id TEXT PRIMARY KEY,
                text_flg BOOLEAN NOT NULL,
                url_flg BOOLEAN NOT NULL,
                file_flg BOOLEAN NOT NULL,
                file_count INTEGER NOT NULL,
                result_type TEXT,
                sns_shared BOOLEAN NOT NULL DEFAULT FALSE,
                platform TEXT,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to create activity_logs table")?;

        Ok(())
    }
}

#[async_trait]
impl ActivityStore for SqliteStore {
    async fn insert(&self, record: &NewActivityRecord) -> Result<String> {
        let id = Uuid::new_v4().to_string();

        sqlx::query(
            r#"
            INSERT INTO activity_logs (id, text_flg, url_flg, file_flg, file_count, result_type)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(record.text_flg)
        .bind(record.url_flg)
        .bind(record.file_flg)
        .bind(record.file_count)
        .bind(&record.result_type)
        .execute(&self.pool)
        .await
        .context("Failed to insert activity log")?;

        Ok(id)
    }

    async fn update(&self, id: &str, fields: &ActivityUpdate) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE activity_logs
            SET result_type = COALESCE(?, result_type),
                sns_shared = COALESCE(?, sns_shared),
                platform = COALESCE(?, platform),
                updated_at = datetime('now')
            WHERE id = ?
            "#,
        )
        .bind(&fields.result_type)
        .bind(fields.sns_shared)
        .bind(&fields.platform)
        .bind(id)
        .execute(&self.pool)
        .await
        .context("Failed to update activity log")?;

        if result.rows_affected() == 0 {
            anyhow::bail!("Activity log not found: {}", id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, sqlx::FromRow)]
    struct ActivityRow {
        file_count: i64,
        result_type: Option<String>,
        sns_shared: bool,
        platform: Option<String>,
    }

    async fn fetch(store: &SqliteStore, id: &str) -> ActivityRow {
        sqlx::query_as::<_, ActivityRow>(
            "SELECT file_count, result_type, sns_shared, platform FROM activity_logs WHERE id = ?",
        )
        .bind(id)
        .fetch_one(&store.pool)
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_insert_then_partial_updates() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::connect(&dir.path().join("activity.db"))
            .await
            .unwrap();

        let id = store
            .insert(&NewActivityRecord {
                text_flg: true,
                url_flg: false,
                file_flg: true,
                file_count: 2,
                result_type: "processing".to_string(),
            })
            .await
            .unwrap();

        let row = fetch(&store, &id).await;
        assert_eq!(row.file_count, 2);
        assert_eq!(row.result_type.as_deref(), Some("processing"));
        assert!(!row.sns_shared);

        store
            .update(&id, &ActivityUpdate::finished("Explorer"))
            .await
            .unwrap();
        store.update(&id, &ActivityUpdate::shared("X")).await.unwrap();

        let row = fetch(&store, &id).await;
        assert_eq!(row.result_type.as_deref(), Some("Explorer"));
        assert!(row.sns_shared);
        assert_eq!(row.platform.as_deref(), Some("X"));
    }

    #[tokio::test]
    async fn test_update_unknown_id_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::connect(&dir.path().join("activity.db"))
            .await
            .unwrap();
        assert!(store
            .update("missing", &ActivityUpdate::finished("Explorer"))
            .await
            .is_err());
    }
}
