use super::template::TemplateValues;
use crate::assessment::{feeling_label, goal_label, wisdom_source, AssessmentData};

pub const SYSTEM_PROMPT: &str = "You write calm, safe, inclusive guided meditation scripts \
for narration by a text-to-speech voice. Never give medical advice. Reply with JSON only.";

impl TemplateValues {
    pub fn from_assessment(data: &AssessmentData, word_budget: u32) -> Self {
        let (wisdom_name, wisdom_guidance) = match wisdom_source(&data.wisdom_source) {
            Some(source) => (source.name.to_string(), source.guidance.to_string()),
            None => (data.wisdom_source.trim().to_string(), String::new()),
        };

        let feelings = data
            .selected_feelings
            .iter()
            .map(|id| feeling_label(id))
            .filter(|label| !label.is_empty())
            .collect::<Vec<_>>();

        Self {
            duration: format_minutes(data.duration_minutes),
            word_count: word_budget.to_string(),
            goal: goal_label(&data.goal),
            current_state: or_unspecified(&data.current_state),
            experience: or_unspecified(&data.experience),
            environment: or_unspecified(&data.environment),
            wisdom_source: wisdom_name,
            wisdom_guidance,
            feelings: (!feelings.is_empty()).then(|| feelings.join(", ")),
            primer: data.primer.clone(),
        }
    }
}

fn or_unspecified(value: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        "not specified".to_string()
    } else {
        value.to_string()
    }
}

/// "5" for whole minutes, "2.5" otherwise
fn format_minutes(minutes: f64) -> String {
    if minutes.fract() == 0.0 {
        format!("{}", minutes as i64)
    } else {
        format!("{:.1}", minutes)
    }
}
