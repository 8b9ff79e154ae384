use super::MeditationScript;
use serde::Deserialize;
use tracing::warn;

pub const DEFAULT_INTRO: &str =
    "Welcome. Find a comfortable position, and let your eyes gently close.";
pub const DEFAULT_MAIN: &str =
    "Breathe in slowly through your nose. <break time=\"2s\"/> And breathe out, letting your body soften.";
pub const DEFAULT_CLOSING: &str =
    "When you are ready, gently open your eyes and carry this calm with you.";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawScript {
    #[serde(default)]
    title: Option<String>,
    #[serde(default, alias = "intro")]
    intro_text: String,
    #[serde(default, alias = "main")]
    main_content: String,
    #[serde(default, alias = "closing")]
    closing_text: String,
}

/// Turn an LLM reply into a script
///
/// Accepts bare JSON, fenced JSON, or JSON embedded in prose. Anything else is
/// treated as the main content. Empty segments get default lines.
pub fn parse_script(raw: &str) -> MeditationScript {
    let body = strip_code_fence(raw.trim());

    let parsed = serde_json::from_str::<RawScript>(body)
        .ok()
        .or_else(|| embedded_object(body).and_then(|obj| serde_json::from_str(obj).ok()));

    let script = match parsed {
        Some(raw) => MeditationScript {
            title: raw.title.filter(|t| !t.trim().is_empty()),
            intro_text: raw.intro_text,
            main_content: raw.main_content,
            closing_text: raw.closing_text,
        },
        None => {
            warn!("LLM reply was not a JSON script, using it as main content");
            MeditationScript {
                title: None,
                intro_text: String::new(),
                main_content: body.to_string(),
                closing_text: String::new(),
            }
        }
    };

    script.with_defaults()
}

impl MeditationScript {
    /// Replace empty segments with safe default lines
    pub fn with_defaults(mut self) -> Self {
        fill(&mut self.intro_text, DEFAULT_INTRO, "intro");
        fill(&mut self.main_content, DEFAULT_MAIN, "main");
        fill(&mut self.closing_text, DEFAULT_CLOSING, "closing");
        self
    }

    /// Script used when generation is unavailable
    pub fn fallback() -> Self {
        Self {
            title: Some("A Moment of Calm".to_string()),
            intro_text: DEFAULT_INTRO.to_string(),
            main_content: DEFAULT_MAIN.to_string(),
            closing_text: DEFAULT_CLOSING.to_string(),
        }
    }
}

fn fill(segment: &mut String, default: &str, name: &str) {
    if segment.trim().is_empty() {
        warn!("Script {} segment is empty, substituting default line", name);
        *segment = default.to_string();
    } else {
        *segment = segment.trim().to_string();
    }
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };

    // Drop the info string ("json") on the opening fence line
    let rest = rest.split_once('\n').map_or("", |(_, body)| body);
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

fn embedded_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}
