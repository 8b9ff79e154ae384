use super::synthesizer::{NarrationError, NarrationRequest, NarrationSynthesizer};
use crate::audio::AudioClip;
use crate::config::NarrationConfig;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// Sentence spoken by the voice preview endpoint
pub const PREVIEW_TEXT: &str =
    "Welcome. Take a slow, deep breath, and let yourself arrive in this moment.";

#[derive(Debug, Serialize)]
struct TextToSpeechBody<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: VoiceSettings,
}

#[derive(Debug, Serialize)]
struct VoiceSettings {
    stability: f32,
    similarity_boost: f32,
    speed: f32,
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    detail: ProviderErrorDetail,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ProviderErrorDetail {
    Message { message: String },
    Text(String),
}

/// HTTP text-to-speech provider client
pub struct ProviderSynthesizer {
    http: Client,
    base_url: String,
    api_key: String,
    model_id: String,
}

impl ProviderSynthesizer {
    pub fn new(config: &NarrationConfig) -> Result<Self, NarrationError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or(NarrationError::NotConfigured)?;

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            model_id: config.model_id.clone(),
        })
    }

    /// Short fixed sample in `voice_id`
    pub async fn preview(&self, voice_id: &str) -> Result<AudioClip, NarrationError> {
        self.synthesize(&NarrationRequest {
            text: PREVIEW_TEXT.to_string(),
            voice_id: voice_id.to_string(),
            speed: 1.0,
        })
        .await
    }
}

#[async_trait::async_trait]
impl NarrationSynthesizer for ProviderSynthesizer {
    async fn synthesize(&self, request: &NarrationRequest) -> Result<AudioClip, NarrationError> {
        if request.text.trim().is_empty() {
            return Err(NarrationError::EmptyText);
        }

        let url = format!("{}/v1/text-to-speech/{}", self.base_url, request.voice_id);
        let body = TextToSpeechBody {
            text: &request.text,
            model_id: &self.model_id,
            voice_settings: VoiceSettings {
                stability: 0.6,
                similarity_boost: 0.75,
                speed: request.speed.clamp(0.7, 1.2),
            },
        };

        debug!("POST {} ({} chars)", url, request.text.len());

        let response = self
            .http
            .post(&url)
            .header("xi-api-key", &self.api_key)
            .header(reqwest::header::ACCEPT, "audio/mpeg")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<ProviderError>(&text) {
                Ok(ProviderError {
                    detail: ProviderErrorDetail::Message { message },
                }) => message,
                Ok(ProviderError {
                    detail: ProviderErrorDetail::Text(message),
                }) => message,
                Err(_) => text,
            };
            return Err(NarrationError::Status { status, message });
        }

        let mime = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("audio/mpeg")
            .to_string();
        let bytes = response.bytes().await?.to_vec();

        let clip = AudioClip::new(format!("narration:{}", request.voice_id), bytes, mime);

        info!(
            "Synthesized {} chars with voice {} ({} bytes, {:?})",
            request.text.len(),
            request.voice_id,
            clip.bytes.len(),
            clip.duration
        );

        Ok(clip)
    }

    fn name(&self) -> &str {
        "provider"
    }
}
