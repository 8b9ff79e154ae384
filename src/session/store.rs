use super::config::SessionConfig;
use super::stats::{SessionSummary, UserStats};
use crate::script::MeditationScript;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

const STATE_FILE: &str = "state.json";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("state file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("state serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// A named, replayable session configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedSession {
    pub id: Uuid,
    pub config: SessionConfig,
    /// Script from the first run, replayed without regenerating
    #[serde(default)]
    pub script: Option<MeditationScript>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub last_played_at: Option<DateTime<Utc>>,
}

impl SavedSession {
    pub fn new(config: SessionConfig, script: Option<MeditationScript>) -> Self {
        Self {
            id: Uuid::new_v4(),
            config,
            script,
            created_at: Utc::now(),
            last_played_at: None,
        }
    }
}

/// Everything persisted for the local user
///
/// Updates consume the old state and return the new one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserState {
    #[serde(default)]
    pub stats: UserStats,
    #[serde(default)]
    pub saved_sessions: Vec<SavedSession>,
}

impl UserState {
    pub fn with_saved_session(mut self, session: SavedSession) -> Self {
        self.saved_sessions.retain(|s| s.id != session.id);
        self.saved_sessions.push(session);
        self
    }

    pub fn without_saved_session(mut self, id: Uuid) -> Self {
        self.saved_sessions.retain(|s| s.id != id);
        self
    }

    pub fn with_completed_session(mut self, summary: &SessionSummary, at: DateTime<Utc>) -> Self {
        self.stats = self.stats.with_session(summary, at);
        self
    }

    pub fn with_played(mut self, id: Uuid, at: DateTime<Utc>) -> Self {
        if let Some(session) = self.saved_sessions.iter_mut().find(|s| s.id == id) {
            session.last_played_at = Some(at);
        }
        self
    }

    pub fn saved_session(&self, id: Uuid) -> Option<&SavedSession> {
        self.saved_sessions.iter().find(|s| s.id == id)
    }
}

/// JSON-file persistence for `UserState`
pub struct StateStore {
    path: PathBuf,
    state: RwLock<UserState>,
}

impl StateStore {
    /// Open `<data_dir>/state.json`, starting empty when it is missing or unreadable
    pub async fn open(data_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let data_dir = data_dir.as_ref();
        tokio::fs::create_dir_all(data_dir).await?;
        let path = data_dir.join(STATE_FILE);

        let state = match tokio::fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice::<UserState>(&bytes) {
                Ok(state) => state,
                Err(e) => {
                    warn!("Ignoring corrupt state file {}: {}", path.display(), e);
                    UserState::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => UserState::default(),
            Err(e) => return Err(e.into()),
        };

        info!(
            "State loaded from {} ({} saved sessions, {} minutes)",
            path.display(),
            state.saved_sessions.len(),
            state.stats.total_minutes
        );

        Ok(Self {
            path,
            state: RwLock::new(state),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Copy of the current state
    pub async fn snapshot(&self) -> UserState {
        self.state.read().await.clone()
    }

    /// Apply `f` and persist the result; the in-memory state only changes if the write succeeds
    pub async fn update<F>(&self, f: F) -> Result<UserState, StoreError>
    where
        F: FnOnce(UserState) -> UserState,
    {
        let mut guard = self.state.write().await;
        let next = f(guard.clone());
        self.persist(&next).await?;
        *guard = next.clone();
        Ok(next)
    }

    async fn persist(&self, state: &UserState) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(state)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}
