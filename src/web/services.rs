// src/web/services.rs
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tracing::info;

use crate::activity::ActivityRecorder;
use crate::analysis::Analyzer;
use crate::orchestrator::Orchestrator;
use crate::render::CardExporter;

pub type SharedSession = Arc<Mutex<Orchestrator>>;

pub const DEFAULT_SESSION_IDLE_TIMEOUT: Duration = Duration::from_secs(60 * 60);

/// Collaborators shared by every session
pub struct AppServices {
    pub analyzer: Arc<dyn Analyzer>,
    pub recorder: ActivityRecorder,
    pub exporter: Arc<CardExporter>,
    pub dev_mode: bool,
    pub analysis_configured: bool,
    pub session_idle_timeout: Duration,
}

impl AppServices {
    pub fn new_orchestrator(&self) -> Orchestrator {
        Orchestrator::new(self.analyzer.clone(), self.recorder.clone(), self.dev_mode)
    }
}

struct SessionEntry {
    session: SharedSession,
    last_touched: Instant,
}

/// In-memory sessions, one orchestrator each.
///
/// Sessions untouched for longer than the idle timeout are dropped the next
/// time a session is created, unless a request still holds them.
pub struct SessionStore {
    sessions: RwLock<HashMap<String, SessionEntry>>,
    idle_timeout: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_idle_timeout(DEFAULT_SESSION_IDLE_TIMEOUT)
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_idle_timeout(idle_timeout: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            idle_timeout,
        }
    }

    pub async fn create(&self, services: &AppServices) -> (String, SharedSession) {
        self.evict_idle_at(Instant::now()).await;

        let id = uuid::Uuid::new_v4().to_string();
        let session = Arc::new(Mutex::new(services.new_orchestrator()));
        self.sessions.write().await.insert(
            id.clone(),
            SessionEntry {
                session: session.clone(),
                last_touched: Instant::now(),
            },
        );
        info!("Created session {}", id);
        (id, session)
    }

    /// Looks a session up and marks it as active
    pub async fn get(&self, id: &str) -> Option<SharedSession> {
        self.sessions.write().await.get_mut(id).map(|entry| {
            entry.last_touched = Instant::now();
            entry.session.clone()
        })
    }

    pub async fn remove(&self, id: &str) -> bool {
        let removed = self.sessions.write().await.remove(id).is_some();
        if removed {
            info!("Deleted session {}", id);
        }
        removed
    }

    /// Drops sessions idle at `now`; returns how many were dropped
    pub async fn evict_idle_at(&self, now: Instant) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, entry| {
            // a clone outside the map means a request is still using it
            Arc::strong_count(&entry.session) > 1
                || now.saturating_duration_since(entry.last_touched) < self.idle_timeout
        });
        let evicted = before - sessions.len();
        if evicted > 0 {
            info!("Evicted {} idle session(s)", evicted);
        }
        evicted
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::testing::StubAnalyzer;
    use crate::orchestrator::AppState;
    use crate::render::export::testing::exporter;
    use crate::types::analysis::sample_result;

    fn services() -> AppServices {
        AppServices {
            analyzer: StubAnalyzer::ok(sample_result()),
            recorder: ActivityRecorder::disabled(),
            exporter: Arc::new(exporter(false, false)),
            dev_mode: false,
            analysis_configured: true,
            session_idle_timeout: DEFAULT_SESSION_IDLE_TIMEOUT,
        }
    }

    #[tokio::test]
    async fn test_sessions_are_independent() {
        let services = services();
        let store = SessionStore::new();
        let (first, a) = store.create(&services).await;
        let (second, _) = store.create(&services).await;
        assert_ne!(first, second);
        assert_eq!(store.len().await, 2);

        a.lock()
            .await
            .collector_mut()
            .unwrap()
            .set_text("only in the first session");
        let b = store.get(&second).await.unwrap();
        assert!(b.lock().await.collector().is_empty());
        assert_eq!(b.lock().await.state(), &AppState::Collecting);
        assert!(store.get("missing").await.is_none());
    }

    #[tokio::test]
    async fn test_idle_sessions_are_evicted() {
        let services = services();
        let store = SessionStore::with_idle_timeout(Duration::from_secs(60));
        let (idle, _) = store.create(&services).await;
        let (busy, held) = store.create(&services).await;

        assert_eq!(store.evict_idle_at(Instant::now()).await, 0);
        assert_eq!(store.len().await, 2);

        let later = Instant::now() + Duration::from_secs(61);
        assert_eq!(store.evict_idle_at(later).await, 1);
        assert!(store.get(&idle).await.is_none());
        // still referenced by a request
        assert!(store.get(&busy).await.is_some());

        drop(held);
        let later = Instant::now() + Duration::from_secs(61);
        assert_eq!(store.evict_idle_at(later).await, 1);
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_remove_deletes_session() {
        let services = services();
        let store = SessionStore::new();
        let (id, _) = store.create(&services).await;

        assert!(store.remove(&id).await);
        assert!(store.get(&id).await.is_none());
        assert!(!store.remove(&id).await);
    }
}
