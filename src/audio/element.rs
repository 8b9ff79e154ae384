use anyhow::Result;
use std::time::Duration;

/// Encoded audio held in memory
#[derive(Debug, Clone, PartialEq)]
pub struct AudioClip {
    /// Short name for logging ("intro", "music", ...)
    pub label: String,
    /// Encoded bytes (MP3, WAV, ...)
    pub bytes: Vec<u8>,
    /// MIME type of `bytes`
    pub mime: String,
    /// Measured length, when the container could be probed
    pub duration: Option<Duration>,
}

impl AudioClip {
    pub fn new(label: impl Into<String>, bytes: Vec<u8>, mime: impl Into<String>) -> Self {
        let mime = mime.into();
        let duration = super::measure::clip_duration(&bytes, &mime);
        Self {
            label: label.into(),
            bytes,
            mime,
            duration,
        }
    }

    /// A clip whose length is known without decoding
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }
}

/// One playable audio resource, modelled on a media element
///
/// Implementations never block; they only flip playback state.
pub trait AudioElement: Send {
    fn play(&mut self);

    fn pause(&mut self);

    /// Pause and rewind to the start
    fn stop(&mut self);

    /// Volume in [0.0, 1.0]
    fn set_volume(&mut self, volume: f32);

    fn volume(&self) -> f32;

    /// Current playback position
    fn position(&self) -> Duration;

    /// Total length, if known
    fn duration(&self) -> Option<Duration>;

    fn is_playing(&self) -> bool;

    /// True once a non-looping element has played to its end
    fn has_ended(&self) -> bool;

    /// Started but not finished: position strictly between zero and the duration
    fn is_mid_playback(&self) -> bool {
        let position = self.position();
        position > Duration::ZERO && self.duration().map_or(true, |d| position < d)
    }
}

/// Opens clips as playable elements
pub trait AudioBackend {
    type Element: AudioElement;

    /// Open `clip` paused at position zero
    fn open(&self, clip: &AudioClip, looping: bool) -> Result<Self::Element>;

    fn name(&self) -> &str;
}
