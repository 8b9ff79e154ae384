use super::coordinator::{Coordinator, NarrationSet, PreparedSession};
use super::timing::SessionTiming;
use crate::audio::{mime_for_path, AudioBackend, AudioClip};
use crate::config::TimingConfig;
use crate::narration::{synthesize_set, NarrationClips, NarrationSynthesizer, Segment};
use crate::script::{MeditationScript, ScriptGenerator};
use crate::session::SessionConfig;
use anyhow::{Context, Result};
use std::path::Path;
use tracing::{info, warn};

/// Where the loading phase gets its content
pub struct SessionLoader<'a, B> {
    pub backend: &'a B,
    pub generator: &'a dyn ScriptGenerator,
    pub narrator: &'a dyn NarrationSynthesizer,
    pub fallback: &'a dyn NarrationSynthesizer,
    pub timing: &'a TimingConfig,
    /// Speaking speed passed to the narrator
    pub speed: f32,
}

/// A session that finished loading
pub struct LoadedSession<E: crate::audio::AudioElement> {
    pub coordinator: Coordinator<E>,
    pub script: MeditationScript,
    /// Narration came from the local fallback
    pub degraded: bool,
}

impl<B: AudioBackend> SessionLoader<'_, B> {
    /// Run the loading phase for `session` and hand back a `Ready` coordinator
    ///
    /// `script` replays a saved script instead of requesting a new one.
    /// Every step degrades rather than fails.
    pub async fn load(
        &self,
        session: &SessionConfig,
        script: Option<MeditationScript>,
    ) -> LoadedSession<B::Element> {
        let layers = session.layers.clone().normalized();
        let mut timing = SessionTiming::new(self.timing, session.requested_duration_minutes);
        let mut coordinator = Coordinator::new(timing.clone(), &layers);

        info!(
            "Loading session {:?} ({:.1} min requested)",
            session.name, session.requested_duration_minutes
        );

        let script = match script {
            Some(script) => script,
            None => match self.generator.generate(&session.assessment_data).await {
                Ok(script) => script,
                Err(e) => {
                    warn!("Script request failed ({}), using the default script", e);
                    MeditationScript::fallback()
                }
            },
        };

        let clips = synthesize_set(
            self.narrator,
            self.fallback,
            &script,
            &session.voice_id,
            self.speed,
        )
        .await;

        timing.reconcile(&clips.durations());

        let music = match layers.music_file.as_deref() {
            Some(path) => match self.open_music(path).await {
                Ok(music) => Some(music),
                Err(e) => {
                    warn!("Continuing without music: {:#}", e);
                    None
                }
            },
            None => {
                if let Some(music_type) = &layers.music_type {
                    info!("No file configured for music {:?}, playing without music", music_type);
                }
                None
            }
        };

        let narration = self.open_narration(&clips);
        let degraded = clips.degraded;

        coordinator.finish_loading(PreparedSession {
            timing,
            music,
            narration,
        });

        LoadedSession {
            coordinator,
            script,
            degraded,
        }
    }

    async fn open_music(&self, path: &Path) -> Result<B::Element> {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read music file {}", path.display()))?;
        let clip = AudioClip::new("music", bytes, mime_for_path(path));

        self.backend
            .open(&clip, true)
            .with_context(|| format!("Failed to open music file {}", path.display()))
    }

    fn open_narration(&self, clips: &NarrationClips) -> NarrationSet<B::Element> {
        let open = |segment: Segment| {
            let clip = clips.get(segment);
            match self.backend.open(clip, false) {
                Ok(element) => Some(element),
                Err(e) => {
                    warn!("Narration {} could not be opened: {:#}", segment, e);
                    None
                }
            }
        };

        NarrationSet {
            intro: open(Segment::Intro),
            main: open(Segment::Main),
            closing: open(Segment::Closing),
        }
    }
}
