//! Narration synthesis
//!
//! The provider client speaks through a hosted TTS API. When the API key is
//! missing or a request fails, narration degrades to `LocalSpeechSynthesizer`
//! instead of failing the session.

pub mod local;
pub mod provider;
pub mod synthesizer;

pub use local::LocalSpeechSynthesizer;
pub use provider::{ProviderSynthesizer, PREVIEW_TEXT};
pub use synthesizer::{NarrationError, NarrationRequest, NarrationSynthesizer, Segment};

use crate::audio::AudioClip;
use crate::config::NarrationConfig;
use crate::script::MeditationScript;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Synthesized audio for the three segments
#[derive(Debug, Clone)]
pub struct NarrationClips {
    pub intro: AudioClip,
    pub main: AudioClip,
    pub closing: AudioClip,
    /// True when the local fallback produced the clips
    pub degraded: bool,
}

impl NarrationClips {
    pub fn get(&self, segment: Segment) -> &AudioClip {
        match segment {
            Segment::Intro => &self.intro,
            Segment::Main => &self.main,
            Segment::Closing => &self.closing,
        }
    }

    /// Measured durations in segment order
    pub fn durations(&self) -> [Option<Duration>; 3] {
        Segment::ALL.map(|segment| self.get(segment).duration)
    }
}

/// Provider when a credential is configured, local speech otherwise
pub fn select_synthesizer(config: &NarrationConfig) -> Arc<dyn NarrationSynthesizer> {
    match ProviderSynthesizer::new(config) {
        Ok(provider) => {
            info!("Narration via provider at {}", config.base_url);
            Arc::new(provider)
        }
        Err(NarrationError::NotConfigured) => {
            info!("No narration API key configured, using local speech");
            Arc::new(LocalSpeechSynthesizer::new(&config.local_command))
        }
        Err(e) => {
            warn!("Narration provider unavailable ({}), using local speech", e);
            Arc::new(LocalSpeechSynthesizer::new(&config.local_command))
        }
    }
}

fn segment_text(script: &MeditationScript, segment: Segment) -> &str {
    match segment {
        Segment::Intro => &script.intro_text,
        Segment::Main => &script.main_content,
        Segment::Closing => &script.closing_text,
    }
}

async fn synthesize_all(
    synth: &dyn NarrationSynthesizer,
    script: &MeditationScript,
    voice_id: &str,
    speed: f32,
) -> Result<[AudioClip; 3], NarrationError> {
    let request = |segment| NarrationRequest {
        text: segment_text(script, segment).to_string(),
        voice_id: voice_id.to_string(),
        speed,
    };
    let (intro_req, main_req, closing_req) =
        (request(Segment::Intro), request(Segment::Main), request(Segment::Closing));

    let (intro, main, closing) = futures::join!(
        synth.synthesize(&intro_req),
        synth.synthesize(&main_req),
        synth.synthesize(&closing_req),
    );

    let label = |mut clip: AudioClip, segment: Segment| {
        clip.label = segment.to_string();
        clip
    };

    Ok([
        label(intro?, Segment::Intro),
        label(main?, Segment::Main),
        label(closing?, Segment::Closing),
    ])
}

/// Narrate the three segments of `script` concurrently
///
/// If `primary` fails on any segment the whole set is re-rendered with
/// `fallback`, so the three clips always share one voice. Never fails.
pub async fn synthesize_set(
    primary: &dyn NarrationSynthesizer,
    fallback: &dyn NarrationSynthesizer,
    script: &MeditationScript,
    voice_id: &str,
    speed: f32,
) -> NarrationClips {
    let degraded = primary.name() == fallback.name();

    match synthesize_all(primary, script, voice_id, speed).await {
        Ok([intro, main, closing]) => NarrationClips {
            intro,
            main,
            closing,
            degraded,
        },
        Err(e) => {
            warn!(
                "Narration via {} failed ({}), falling back to {}",
                primary.name(),
                e,
                fallback.name()
            );
            match synthesize_all(fallback, script, voice_id, speed).await {
                Ok([intro, main, closing]) => NarrationClips {
                    intro,
                    main,
                    closing,
                    degraded: true,
                },
                Err(e) => {
                    warn!("Fallback narration failed ({}), using silent timing tracks", e);
                    silent_clips(script)
                }
            }
        }
    }
}

fn silent_clips(script: &MeditationScript) -> NarrationClips {
    let clip = |segment: Segment| {
        let duration = crate::script::duration::estimate_speech_duration(
            &local::strip_markup(segment_text(script, segment)),
            crate::script::duration::WORDS_PER_MINUTE,
        );
        AudioClip {
            label: segment.to_string(),
            bytes: Vec::new(),
            mime: "audio/wav".to_string(),
            duration: Some(duration),
        }
    };

    NarrationClips {
        intro: clip(Segment::Intro),
        main: clip(Segment::Main),
        closing: clip(Segment::Closing),
        degraded: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedSynth {
        name: &'static str,
        fail_on: Option<&'static str>,
        calls: AtomicUsize,
    }

    impl FixedSynth {
        fn new(name: &'static str, fail_on: Option<&'static str>) -> Self {
            Self {
                name,
                fail_on,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait::async_trait]
    impl NarrationSynthesizer for FixedSynth {
        async fn synthesize(&self, request: &NarrationRequest) -> Result<AudioClip, NarrationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_on == Some(request.text.as_str()) {
                return Err(NarrationError::Local("boom".to_string()));
            }
            let secs = request.text.len() as u64;
            Ok(AudioClip {
                label: self.name.to_string(),
                bytes: vec![0],
                mime: "audio/mpeg".to_string(),
                duration: Some(Duration::from_secs(secs)),
            })
        }

        fn name(&self) -> &str {
            self.name
        }
    }

    fn script() -> MeditationScript {
        MeditationScript {
            title: None,
            intro_text: "hello".to_string(),
            main_content: "breathe deeply".to_string(),
            closing_text: "bye".to_string(),
        }
    }

    #[tokio::test]
    async fn test_set_uses_primary_when_all_succeed() {
        let primary = FixedSynth::new("provider", None);
        let fallback = FixedSynth::new("local", None);

        let clips = synthesize_set(&primary, &fallback, &script(), "v", 1.0).await;

        assert!(!clips.degraded);
        assert_eq!(primary.calls.load(Ordering::SeqCst), 3);
        assert_eq!(fallback.calls.load(Ordering::SeqCst), 0);
        assert_eq!(clips.intro.label, "intro");
        assert_eq!(
            clips.durations(),
            [
                Some(Duration::from_secs(5)),
                Some(Duration::from_secs(14)),
                Some(Duration::from_secs(3))
            ]
        );
    }

    #[tokio::test]
    async fn test_set_falls_back_entirely_when_one_segment_fails() {
        let primary = FixedSynth::new("provider", Some("breathe deeply"));
        let fallback = FixedSynth::new("local", None);

        let clips = synthesize_set(&primary, &fallback, &script(), "v", 1.0).await;

        assert!(clips.degraded);
        assert_eq!(fallback.calls.load(Ordering::SeqCst), 3);
        assert_eq!(clips.main.label, "main");
    }

    #[tokio::test]
    async fn test_set_never_fails() {
        let primary = FixedSynth::new("provider", Some("hello"));
        let fallback = FixedSynth::new("local", Some("hello"));

        let clips = synthesize_set(&primary, &fallback, &script(), "v", 1.0).await;

        assert!(clips.degraded);
        assert!(clips.durations().iter().all(Option::is_some));
    }

    #[test]
    fn test_select_without_key_is_local() {
        let synth = select_synthesizer(&NarrationConfig::default());
        assert_eq!(synth.name(), "local");
    }

    #[test]
    fn test_select_with_key_is_provider() {
        let synth = select_synthesizer(&NarrationConfig {
            api_key: Some("xi-key".to_string()),
            ..NarrationConfig::default()
        });
        assert_eq!(synth.name(), "provider");
    }
}
