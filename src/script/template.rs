use std::path::Path;
use tracing::{debug, warn};

pub const DEFAULT_PRIMER: &str = "No specific intention was shared.";
pub const DEFAULT_FEELINGS: &str = "No particular feelings were selected.";

/// Placeholders the assembler knows how to fill
pub const PLACEHOLDERS: &[&str] = &[
    "duration",
    "wordCount",
    "goal",
    "currentState",
    "experience",
    "environment",
    "wisdomSource",
    "wisdomGuidance",
    "feelings",
    "primer",
];

/// Used when the template resource cannot be read
pub const BUILT_IN_TEMPLATE: &str = "\
You are an experienced meditation teacher writing a spoken guided meditation.

Write a {{duration}}-minute guided meditation of about {{wordCount}} words.
The listener wants to {{goal}}. Right now they describe themselves as: {{currentState}}.
Experience level: {{experience}}. They are meditating in: {{environment}}.
Draw on {{wisdomSource}}: {{wisdomGuidance}}
Feelings they reported: {{feelings}}
Their intention for this session: {{primer}}

Write slowly paced, second-person narration. Insert pauses as <break time=\"2s\"/> markup.
Respond with JSON only, in this exact shape:
{\"title\": \"...\", \"introText\": \"...\", \"mainContent\": \"...\", \"closingText\": \"...\"}
The intro should be short, the main content should carry most of the words and the
closing should gently bring the listener back.
";

/// Replacement values, one per known placeholder
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateValues {
    pub duration: String,
    pub word_count: String,
    pub goal: String,
    pub current_state: String,
    pub experience: String,
    pub environment: String,
    pub wisdom_source: String,
    pub wisdom_guidance: String,
    pub feelings: Option<String>,
    pub primer: Option<String>,
}

impl TemplateValues {
    fn value(&self, placeholder: &str) -> Option<&str> {
        let value = match placeholder {
            "duration" => self.duration.as_str(),
            "wordCount" => self.word_count.as_str(),
            "goal" => self.goal.as_str(),
            "currentState" => self.current_state.as_str(),
            "experience" => self.experience.as_str(),
            "environment" => self.environment.as_str(),
            "wisdomSource" => self.wisdom_source.as_str(),
            "wisdomGuidance" => self.wisdom_guidance.as_str(),
            "feelings" => non_blank(self.feelings.as_deref()).unwrap_or(DEFAULT_FEELINGS),
            "primer" => non_blank(self.primer.as_deref()).unwrap_or(DEFAULT_PRIMER),
            _ => return None,
        };
        Some(value)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Replace every occurrence of every known `{{placeholder}}` in `template`.
/// Unknown placeholders are left as they are. Substituted values are not
/// scanned again.
pub fn render(template: &str, values: &TemplateValues) -> String {
    let mut rendered = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find("{{") {
        rendered.push_str(&rest[..open]);
        let after = &rest[open + 2..];

        let Some(close) = after.find("}}") else {
            rendered.push_str(&rest[open..]);
            return rendered;
        };

        match values.value(&after[..close]) {
            Some(value) => rendered.push_str(value),
            None => rendered.push_str(&rest[open..open + 2 + close + 2]),
        }
        rest = &after[close + 2..];
    }

    rendered.push_str(rest);
    rendered
}

/// The prompt template resource
#[derive(Debug, Clone, PartialEq)]
pub struct PromptTemplate {
    text: String,
    built_in: bool,
}

impl PromptTemplate {
    /// Read the template from `path`, falling back to the built-in one on any failure
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();

        match std::fs::read_to_string(path) {
            Ok(text) if !text.trim().is_empty() => {
                debug!("Loaded prompt template from {}", path.display());
                Self {
                    text,
                    built_in: false,
                }
            }
            Ok(_) => {
                warn!(
                    "Prompt template {} is empty, using built-in template",
                    path.display()
                );
                Self::built_in()
            }
            Err(e) => {
                warn!(
                    "Failed to read prompt template {}: {}. Using built-in template",
                    path.display(),
                    e
                );
                Self::built_in()
            }
        }
    }

    pub fn built_in() -> Self {
        Self {
            text: BUILT_IN_TEMPLATE.to_string(),
            built_in: true,
        }
    }

    pub fn is_built_in(&self) -> bool {
        self.built_in
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn render(&self, values: &TemplateValues) -> String {
        render(&self.text, values)
    }
}
