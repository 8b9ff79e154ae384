//! Assessment answers and the constant tables the wizard offers
//!
//! The wizard itself lives in the client; this module only carries the
//! answers it produces and the lookups used when building the prompt.

mod catalog;

pub use catalog::{feeling_label, goal_label, wisdom_source, WisdomSource, FEELINGS, GOALS, WISDOM_SOURCES};

use serde::{Deserialize, Serialize};

/// Answers collected by the multi-step assessment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentData {
    /// Goal id (e.g. "stress-relief") or free text
    pub goal: String,

    /// How the user feels right now, in their own words
    #[serde(default)]
    pub current_state: String,

    /// Requested session length in minutes
    pub duration_minutes: f64,

    /// "beginner", "intermediate" or "experienced"
    #[serde(default = "default_experience")]
    pub experience: String,

    /// Where the user is meditating (e.g. "quiet room", "commute")
    #[serde(default)]
    pub environment: String,

    /// Wisdom source id (e.g. "stoic")
    #[serde(default = "default_wisdom_source")]
    pub wisdom_source: String,

    /// Feeling ids chosen in the wizard
    #[serde(default)]
    pub selected_feelings: Vec<String>,

    /// Optional free-text intention
    #[serde(default)]
    pub primer: Option<String>,
}

fn default_experience() -> String {
    "beginner".to_string()
}

fn default_wisdom_source() -> String {
    "mindfulness".to_string()
}

/// Longest session the generator accepts
pub const MAX_DURATION_MINUTES: f64 = 120.0;

impl AssessmentData {
    /// Reject answers the prompt cannot be built from
    pub fn validate(&self) -> Result<(), String> {
        if self.goal.trim().is_empty() {
            return Err("goal is required".to_string());
        }

        if !self.duration_minutes.is_finite() || self.duration_minutes <= 0.0 {
            return Err("durationMinutes must be greater than zero".to_string());
        }

        if self.duration_minutes > MAX_DURATION_MINUTES {
            return Err(format!(
                "durationMinutes must be at most {}",
                MAX_DURATION_MINUTES
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AssessmentData {
        AssessmentData {
            goal: "stress-relief".to_string(),
            current_state: "tense after work".to_string(),
            duration_minutes: 5.0,
            experience: "beginner".to_string(),
            environment: "quiet room".to_string(),
            wisdom_source: "stoic".to_string(),
            selected_feelings: vec!["anxious".to_string()],
            primer: None,
        }
    }

    #[test]
    fn test_validate_accepts_reasonable_answers() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_goal() {
        let mut data = sample();
        data.goal = "   ".to_string();
        assert!(data.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_durations() {
        for minutes in [0.0, -3.0, f64::NAN, 500.0] {
            let mut data = sample();
            data.duration_minutes = minutes;
            assert!(data.validate().is_err(), "{} should be rejected", minutes);
        }
    }

    #[test]
    fn test_deserialize_camel_case_with_defaults() {
        let json = r#"{"goal":"focus","durationMinutes":10}"#;
        let data: AssessmentData = serde_json::from_str(json).unwrap();

        assert_eq!(data.goal, "focus");
        assert_eq!(data.duration_minutes, 10.0);
        assert_eq!(data.experience, "beginner");
        assert_eq!(data.wisdom_source, "mindfulness");
        assert!(data.selected_feelings.is_empty());
        assert!(data.primer.is_none());
    }
}
