//! Meditation script generation
//!
//! - `duration`: word budget for a requested session length
//! - `template`: placeholder substitution into the prompt template
//! - `prompt`: assessment answers to template values
//! - `parse`: LLM reply to a `MeditationScript`
//! - `generator`: the end-to-end generator used by the API and the player

pub mod duration;
pub mod generator;
pub mod parse;
pub mod prompt;
pub mod template;

pub use duration::{word_budget, MIN_WORD_BUDGET};
pub use generator::{LlmScriptGenerator, ScriptGenerator, StaticScriptGenerator};
pub use parse::parse_script;
pub use template::{render, PromptTemplate, TemplateValues};

use serde::{Deserialize, Serialize};

/// A generated meditation, narrated in three segments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeditationScript {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub intro_text: String,
    pub main_content: String,
    pub closing_text: String,
}

impl MeditationScript {
    pub fn word_count(&self) -> usize {
        [&self.intro_text, &self.main_content, &self.closing_text]
            .iter()
            .map(|text| text.split_whitespace().count())
            .sum()
    }
}
