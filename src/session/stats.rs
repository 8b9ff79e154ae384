use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Cumulative meditation statistics for the local user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    /// Whole minutes meditated across all sessions
    pub total_minutes: u64,

    /// Sessions that reached completion (including early stops)
    pub sessions_completed: u64,

    /// When the last session completed
    pub last_session_at: Option<DateTime<Utc>>,
}

/// Outcome of one finished session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    /// Seconds of playback (paused time excluded)
    pub elapsed_secs: u64,

    /// Realized session length the timer counted toward
    pub total_secs: u64,
}

impl SessionSummary {
    /// Minutes credited to the stats: floor(elapsed / 60)
    pub fn minutes(&self) -> u64 {
        self.elapsed_secs / 60
    }

    /// Whether the timer ran to the end
    pub fn finished(&self) -> bool {
        self.elapsed_secs >= self.total_secs
    }
}

impl UserStats {
    /// Stats after crediting `summary`
    pub fn with_session(self, summary: &SessionSummary, at: DateTime<Utc>) -> Self {
        Self {
            total_minutes: self.total_minutes + summary.minutes(),
            sessions_completed: self.sessions_completed + 1,
            last_session_at: Some(at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minutes_floor() {
        for (elapsed, minutes) in [(0, 0), (59, 0), (60, 1), (137, 2), (599, 9)] {
            let summary = SessionSummary {
                elapsed_secs: elapsed,
                total_secs: 600,
            };
            assert_eq!(summary.minutes(), minutes);
        }
    }

    #[test]
    fn test_with_session_accumulates() {
        let at = Utc::now();
        let stats = UserStats::default()
            .with_session(&SessionSummary { elapsed_secs: 130, total_secs: 137 }, at)
            .with_session(&SessionSummary { elapsed_secs: 300, total_secs: 300 }, at);

        assert_eq!(stats.total_minutes, 7);
        assert_eq!(stats.sessions_completed, 2);
        assert_eq!(stats.last_session_at, Some(at));
    }
}
