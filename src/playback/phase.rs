use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of a session: `Loading → Ready → Playing ⇄ Paused → Completed`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    Loading,
    Ready,
    Playing,
    Paused,
    Completed,
}

impl SessionPhase {
    pub fn is_terminal(self) -> bool {
        self == SessionPhase::Completed
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SessionPhase::Loading => "loading",
            SessionPhase::Ready => "ready",
            SessionPhase::Playing => "playing",
            SessionPhase::Paused => "paused",
            SessionPhase::Completed => "completed",
        }
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
