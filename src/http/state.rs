use crate::session::{SessionConfig, SessionHandle, SessionStats};
use crate::stt::SpeechToText;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Active transcription sessions (session_id → handle)
    pub sessions: Arc<RwLock<HashMap<String, SessionHandle>>>,

    /// Speech-to-text backend shared by all sessions
    pub backend: Arc<dyn SpeechToText>,

    /// Settings every new session starts with
    pub session_config: SessionConfig,
}

impl AppState {
    pub fn new(backend: Arc<dyn SpeechToText>, session_config: SessionConfig) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            backend,
            session_config,
        }
    }

    pub async fn register(&self, session: SessionHandle) {
        let mut sessions = self.sessions.write().await;
        sessions.insert(session.id().to_string(), session);
    }

    pub async fn unregister(&self, session_id: &str) -> Option<SessionHandle> {
        let mut sessions = self.sessions.write().await;
        sessions.remove(session_id)
    }

    pub async fn session_stats(&self, session_id: &str) -> Option<SessionStats> {
        let sessions = self.sessions.read().await;
        sessions.get(session_id).map(SessionHandle::stats)
    }

    pub async fn all_stats(&self) -> Vec<SessionStats> {
        let sessions = self.sessions.read().await;
        let mut stats: Vec<SessionStats> = sessions.values().map(SessionHandle::stats).collect();
        stats.sort_by_key(|s| s.started_at);
        stats
    }
}
