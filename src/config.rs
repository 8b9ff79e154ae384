use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub service: ServiceConfig,
    pub auth: AuthConfig,
    pub llm: LlmConfig,
    pub narration: NarrationConfig,
    pub session: TimingConfig,
    pub prompts: PromptConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "guided-meditation".to_string(),
            http: HttpConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 8787,
        }
    }
}

/// Bearer tokens accepted by the generation endpoint. Empty disables auth.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub api_tokens: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            temperature: 0.8,
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NarrationConfig {
    pub base_url: String,
    /// Provider credential; when absent the local speech fallback is used
    pub api_key: Option<String>,
    pub model_id: String,
    pub default_voice_id: String,
    pub speed: f32,
    /// Local TTS executable tried by the fallback (must support `--stdout`)
    pub local_command: String,
    pub timeout_secs: u64,
}

impl Default for NarrationConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.elevenlabs.io".to_string(),
            api_key: None,
            model_id: "eleven_multilingual_v2".to_string(),
            default_voice_id: "EXAVITQu4vr4xnSDxMaL".to_string(),
            speed: 0.9,
            local_command: "espeak-ng".to_string(),
            timeout_secs: 90,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Music-only lead-in before the intro narration starts
    pub lead_in_secs: u64,
    /// Music-only tail after the closing narration
    pub fade_out_secs: u64,
    /// Final seconds over which the music fades linearly to silence
    pub fade_window_secs: u64,
    pub words_per_minute: f64,
    /// Relative overshoot of the realized duration that triggers a warning
    pub duration_tolerance: f64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            lead_in_secs: 10,
            fade_out_secs: 10,
            fade_window_secs: 5,
            words_per_minute: crate::script::duration::WORDS_PER_MINUTE,
            duration_tolerance: 0.5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    pub template_path: PathBuf,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            template_path: PathBuf::from("config/prompts/meditation.txt"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
        }
    }
}

impl Config {
    /// Load `path` (extension optional, file may be absent) and apply
    /// `MEDITATION__SECTION__KEY` environment overrides.
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("MEDITATION")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to read config from {}", path))?;

        settings
            .try_deserialize()
            .context("Failed to deserialize config")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let cfg = Config::load("does/not/exist/guided-meditation").unwrap();

        assert_eq!(cfg.service.http.port, 8787);
        assert_eq!(cfg.session.lead_in_secs, 10);
        assert_eq!(cfg.session.fade_window_secs, 5);
        assert!(cfg.auth.api_tokens.is_empty());
    }

    #[test]
    fn test_load_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(
            &path,
            "[service.http]\nport = 9000\n\n[session]\nlead_in_secs = 4\n",
        )
        .unwrap();

        let cfg = Config::load(path.to_str().unwrap()).unwrap();

        assert_eq!(cfg.service.http.port, 9000);
        assert_eq!(cfg.service.http.bind, "127.0.0.1");
        assert_eq!(cfg.session.lead_in_secs, 4);
        assert_eq!(cfg.session.fade_out_secs, 10);
    }
}
