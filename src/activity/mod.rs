// src/activity/mod.rs
//! Best-effort activity logging. Failures are logged and swallowed; they never reach the user.

pub mod sqlite;
pub mod supabase;

pub use sqlite::SqliteStore;
pub use supabase::SupabaseStore;

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::config::{ActivityBackend, ActivityConfig};
use crate::types::{ActivityUpdate, AnalysisInput, NewActivityRecord};

/// Remote store boundary: insert returns the new row id
#[async_trait]
pub trait ActivityStore: Send + Sync {
    async fn insert(&self, record: &NewActivityRecord) -> Result<String>;
    async fn update(&self, id: &str, fields: &ActivityUpdate) -> Result<()>;
}

#[derive(Clone, Default)]
pub struct ActivityRecorder {
    store: Option<Arc<dyn ActivityStore>>,
}

impl ActivityRecorder {
    pub fn new(store: Arc<dyn ActivityStore>) -> Self {
        Self { store: Some(store) }
    }

    /// Recorder without a store; every call is a silent no-op
    pub fn disabled() -> Self {
        Self { store: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.store.is_some()
    }

    /// Insert the "processing" row; `None` when logging is off or the insert failed
    pub async fn record_start(&self, input: &AnalysisInput) -> Option<String> {
        let store = self.store.as_ref()?;
        let record = NewActivityRecord::for_input(input);
        match store.insert(&record).await {
            Ok(id) => {
                debug!("Activity log created: {}", id);
                Some(id)
            }
            Err(e) => {
                error!("Failed to log activity: {:#}", e);
                None
            }
        }
    }

    pub async fn record_finish(&self, log_id: Option<&str>, result_type: &str) {
        self.update(log_id, ActivityUpdate::finished(result_type), "update activity log")
            .await;
    }

    pub async fn record_share(&self, log_id: Option<&str>, platform: &str) {
        self.update(log_id, ActivityUpdate::shared(platform), "record share")
            .await;
    }

    async fn update(&self, log_id: Option<&str>, fields: ActivityUpdate, what: &str) {
        let (Some(store), Some(id)) = (self.store.as_ref(), log_id) else {
            return;
        };
        if let Err(e) = store.update(id, &fields).await {
            error!("Failed to {}: {:#}", what, e);
        }
    }
}

/// Build the recorder for the configured backend; missing credentials disable logging
pub async fn build_recorder(config: &ActivityConfig) -> ActivityRecorder {
    match config.backend {
        ActivityBackend::None => {
            info!("Activity logging disabled");
            ActivityRecorder::disabled()
        }
        ActivityBackend::Supabase => {
            match SupabaseStore::from_config(config) {
                Ok(store) => {
                    info!("Activity logging to Supabase table {}", config.table);
                    ActivityRecorder::new(Arc::new(store))
                }
                Err(e) => {
                    warn!("Activity logging disabled: {:#}", e);
                    ActivityRecorder::disabled()
                }
            }
        }
        ActivityBackend::Sqlite => match SqliteStore::connect(&config.database_path).await {
            Ok(store) => {
                info!(
                    "Activity logging to SQLite {}",
                    config.database_path.display()
                );
                ActivityRecorder::new(Arc::new(store))
            }
            Err(e) => {
                warn!("Activity logging disabled: {:#}", e);
                ActivityRecorder::disabled()
            }
        },
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    /// In-memory store that records calls and can be told to fail
    #[derive(Default)]
    pub struct MemoryStore {
        pub fail_insert: bool,
        pub fail_update: bool,
        pub inserts: Mutex<Vec<NewActivityRecord>>,
        pub updates: Mutex<Vec<(String, ActivityUpdate)>>,
    }

    impl MemoryStore {
        pub fn failing() -> Self {
            Self {
                fail_insert: true,
                fail_update: true,
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl ActivityStore for MemoryStore {
        async fn insert(&self, record: &NewActivityRecord) -> Result<String> {
            if self.fail_insert {
                anyhow::bail!("insert refused");
            }
            let mut inserts = self.inserts.lock().unwrap();
            inserts.push(record.clone());
            Ok(format!("log-{}", inserts.len()))
        }

        async fn update(&self, id: &str, fields: &ActivityUpdate) -> Result<()> {
            if self.fail_update {
                anyhow::bail!("update refused");
            }
            self.updates
                .lock()
                .unwrap()
                .push((id.to_string(), fields.clone()));
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::MemoryStore;
    use super::*;

    fn text_input() -> AnalysisInput {
        AnalysisInput {
            text: Some("hello".to_string()),
            url: None,
            files: vec![],
        }
    }

    #[tokio::test]
    async fn test_start_and_finish_are_recorded() {
        let store = Arc::new(MemoryStore::default());
        let recorder = ActivityRecorder::new(store.clone());

        let id = recorder.record_start(&text_input()).await;
        assert_eq!(id.as_deref(), Some("log-1"));
        recorder.record_finish(id.as_deref(), "Explorer").await;

        assert_eq!(store.inserts.lock().unwrap()[0].result_type, "processing");
        let updates = store.updates.lock().unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].0, "log-1");
        assert_eq!(updates[0].1.result_type.as_deref(), Some("Explorer"));
    }

    #[tokio::test]
    async fn test_failed_insert_skips_update() {
        let store = Arc::new(MemoryStore {
            fail_insert: true,
            ..Default::default()
        });
        let recorder = ActivityRecorder::new(store.clone());

        let id = recorder.record_start(&text_input()).await;
        assert_eq!(id, None);
        recorder.record_finish(id.as_deref(), "Explorer").await;
        assert!(store.updates.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_failure_is_swallowed() {
        let store = Arc::new(MemoryStore {
            fail_update: true,
            ..Default::default()
        });
        let recorder = ActivityRecorder::new(store);
        let id = recorder.record_start(&text_input()).await;
        recorder.record_finish(id.as_deref(), "Explorer").await;
        recorder.record_share(id.as_deref(), "X").await;
    }

    #[tokio::test]
    async fn test_disabled_recorder_is_noop() {
        let recorder = ActivityRecorder::disabled();
        assert!(!recorder.is_enabled());
        assert_eq!(recorder.record_start(&text_input()).await, None);
        recorder.record_share(Some("anything"), "X").await;
    }

    #[tokio::test]
    async fn test_supabase_without_credentials_is_disabled() {
        let config = ActivityConfig {
            backend: ActivityBackend::Supabase,
            supabase_url: None,
            supabase_key: None,
            table: "activity_logs".to_string(),
            database_path: "unused.db".into(),
        };
        assert!(!build_recorder(&config).await.is_enabled());
    }
}
