use super::duration::word_budget_with;
use super::parse::parse_script;
use super::prompt::SYSTEM_PROMPT;
use super::template::{PromptTemplate, TemplateValues};
use super::MeditationScript;
use crate::assessment::AssessmentData;
use crate::config::TimingConfig;
use crate::llm::{LlmClient, LlmError};
use tracing::info;

/// Produces a meditation script from assessment answers
#[async_trait::async_trait]
pub trait ScriptGenerator: Send + Sync {
    async fn generate(&self, assessment: &AssessmentData) -> Result<MeditationScript, LlmError>;
}

/// Generator backed by an LLM provider
pub struct LlmScriptGenerator {
    client: LlmClient,
    template: PromptTemplate,
    timing: TimingConfig,
}

impl LlmScriptGenerator {
    pub fn new(client: LlmClient, template: PromptTemplate, timing: TimingConfig) -> Self {
        Self {
            client,
            template,
            timing,
        }
    }

    /// The user prompt sent for `assessment`
    pub fn build_prompt(&self, assessment: &AssessmentData) -> String {
        let budget = word_budget_with(
            assessment.duration_minutes,
            self.timing.lead_in_secs as f64,
            self.timing.fade_out_secs as f64,
            self.timing.words_per_minute,
        );
        let values = TemplateValues::from_assessment(assessment, budget);
        self.template.render(&values)
    }
}

#[async_trait::async_trait]
impl ScriptGenerator for LlmScriptGenerator {
    async fn generate(&self, assessment: &AssessmentData) -> Result<MeditationScript, LlmError> {
        let prompt = self.build_prompt(assessment);

        info!(
            "Generating {:.1}-minute meditation (goal: {})",
            assessment.duration_minutes, assessment.goal
        );

        let reply = self.client.complete(SYSTEM_PROMPT, &prompt).await?;
        let script = parse_script(&reply);

        info!(
            "Script ready: {:?} ({} words)",
            script.title.as_deref().unwrap_or("untitled"),
            script.word_count()
        );

        Ok(script)
    }
}

/// Returns the same script for every request
pub struct StaticScriptGenerator {
    script: MeditationScript,
}

impl StaticScriptGenerator {
    pub fn new(script: MeditationScript) -> Self {
        Self { script }
    }
}

#[async_trait::async_trait]
impl ScriptGenerator for StaticScriptGenerator {
    async fn generate(&self, _assessment: &AssessmentData) -> Result<MeditationScript, LlmError> {
        Ok(self.script.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LlmConfig;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn assessment() -> AssessmentData {
        AssessmentData {
            goal: "focus".to_string(),
            current_state: "scattered".to_string(),
            duration_minutes: 5.0,
            experience: "beginner".to_string(),
            environment: "office".to_string(),
            wisdom_source: "stoic".to_string(),
            selected_feelings: vec![],
            primer: Some("finish my report calmly".to_string()),
        }
    }

    #[tokio::test]
    async fn test_generate_sends_rendered_prompt_and_parses_reply() {
        let server = MockServer::start().await;
        let reply = r#"{"title":"Clear Mind","introText":"Welcome.","mainContent":"Focus on the breath.","closingText":"Return."}"#;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_string_contains("about 466 words"))
            .and(body_string_contains("finish my report calmly"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"content": reply}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = LlmClient::new(&LlmConfig {
            base_url: server.uri(),
            api_key: Some("sk-test".to_string()),
            ..LlmConfig::default()
        })
        .unwrap();
        let generator =
            LlmScriptGenerator::new(client, PromptTemplate::built_in(), TimingConfig::default());

        let script = generator.generate(&assessment()).await.unwrap();

        assert_eq!(script.title.as_deref(), Some("Clear Mind"));
        assert_eq!(script.main_content, "Focus on the breath.");
    }

    #[tokio::test]
    async fn test_static_generator() {
        let generator = StaticScriptGenerator::new(MeditationScript::fallback());
        let script = generator.generate(&assessment()).await.unwrap();
        assert_eq!(script, MeditationScript::fallback());
    }
}
