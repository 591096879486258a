// src/activity/supabase.rs
//! Supabase (PostgREST) activity store: insert with returned id, patch by id

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::ActivityStore;
use crate::config::ActivityConfig;
use crate::types::{ActivityUpdate, NewActivityRecord};

const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Deserialize)]
struct InsertedRow {
    id: serde_json::Value,
}

pub struct SupabaseStore {
    client: Client,
    base_url: String,
    api_key: String,
    table: String,
}

impl SupabaseStore {
    pub fn new(base_url: &str, api_key: &str, table: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            table: table.to_string(),
        })
    }

    pub fn from_config(config: &ActivityConfig) -> Result<Self> {
        let url = config
            .supabase_url
            .as_deref()
            .context("SUPABASE_URL is not set")?;
        let key = config
            .supabase_key
            .as_deref()
            .context("SUPABASE_ANON_KEY is not set")?;
        Self::new(url, key, &config.table)
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.table)
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
    }
}

#[async_trait]
impl ActivityStore for SupabaseStore {
    async fn insert(&self, record: &NewActivityRecord) -> Result<String> {
        let response = self
            .authorized(self.client.post(self.table_url()))
            .query(&[("select", "id")])
            .header("Prefer", "return=representation")
            .json(record)
            .send()
            .await
            .context("Failed to call Supabase insert")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Supabase insert failed with status {}: {}", status, error_text);
        }

        let rows: Vec<InsertedRow> = response
            .json()
            .await
            .context("Failed to parse Supabase insert response")?;
        let row = rows
            .into_iter()
            .next()
            .context("Supabase insert returned no rows")?;

        // ids may be uuid strings or bigint identities
        let id = match row.id {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        };
        debug!("Supabase row inserted: {}", id);
        Ok(id)
    }

    async fn update(&self, id: &str, fields: &ActivityUpdate) -> Result<()> {
        let response = self
            .authorized(self.client.patch(self.table_url()))
            .query(&[("id", format!("eq.{}", id))])
            .json(fields)
            .send()
            .await
            .context("Failed to call Supabase update")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Supabase update failed with status {}: {}", status, error_text);
        }
        Ok(())
    }
}
