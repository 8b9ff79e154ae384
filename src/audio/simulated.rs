// Clock-driven stand-in for an output device
//
// Positions advance with `tokio::time::Instant`, so under a paused tokio
// clock the elements move exactly as far as virtual time does.

use super::element::{AudioBackend, AudioClip, AudioElement};
use anyhow::Result;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Backend whose elements play silently in virtual time
#[derive(Debug, Default, Clone)]
pub struct SimulatedBackend;

impl SimulatedBackend {
    pub fn new() -> Self {
        Self
    }
}

impl AudioBackend for SimulatedBackend {
    type Element = SimulatedElement;

    fn open(&self, clip: &AudioClip, looping: bool) -> Result<SimulatedElement> {
        debug!(
            "Simulated element for {} ({:?}, looping={})",
            clip.label, clip.duration, looping
        );
        Ok(SimulatedElement::new(clip.label.clone(), clip.duration, looping))
    }

    fn name(&self) -> &str {
        "simulated"
    }
}

#[derive(Debug, Clone)]
pub struct SimulatedElement {
    label: String,
    duration: Option<Duration>,
    looping: bool,
    volume: f32,
    /// Position accumulated before the current play run
    banked: Duration,
    /// Start of the current play run
    playing_since: Option<Instant>,
}

impl SimulatedElement {
    pub fn new(label: impl Into<String>, duration: Option<Duration>, looping: bool) -> Self {
        Self {
            label: label.into(),
            duration,
            looping,
            volume: 1.0,
            banked: Duration::ZERO,
            playing_since: None,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    fn raw_position(&self) -> Duration {
        let running = self
            .playing_since
            .map_or(Duration::ZERO, |since| Instant::now().saturating_duration_since(since));
        self.banked + running
    }
}

impl AudioElement for SimulatedElement {
    fn play(&mut self) {
        if self.has_ended() {
            self.banked = Duration::ZERO;
        }
        if self.playing_since.is_none() {
            self.playing_since = Some(Instant::now());
        }
    }

    fn pause(&mut self) {
        if self.playing_since.is_some() {
            self.banked = self.position();
            self.playing_since = None;
        }
    }

    fn stop(&mut self) {
        self.playing_since = None;
        self.banked = Duration::ZERO;
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
    }

    fn volume(&self) -> f32 {
        self.volume
    }

    fn position(&self) -> Duration {
        let raw = self.raw_position();
        match self.duration {
            Some(d) if self.looping && !d.is_zero() => {
                Duration::from_nanos((raw.as_nanos() % d.as_nanos()) as u64)
            }
            Some(d) => raw.min(d),
            None => raw,
        }
    }

    fn duration(&self) -> Option<Duration> {
        self.duration
    }

    fn is_playing(&self) -> bool {
        self.playing_since.is_some() && !self.has_ended()
    }

    fn has_ended(&self) -> bool {
        !self.looping && self.duration.is_some_and(|d| self.raw_position() >= d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(secs: u64) -> SimulatedElement {
        SimulatedElement::new("test", Some(Duration::from_secs(secs)), false)
    }

    #[tokio::test(start_paused = true)]
    async fn test_position_advances_only_while_playing() {
        let mut el = element(30);
        tokio::time::advance(Duration::from_secs(5)).await;
        assert_eq!(el.position(), Duration::ZERO);

        el.play();
        tokio::time::advance(Duration::from_secs(4)).await;
        assert_eq!(el.position(), Duration::from_secs(4));

        el.pause();
        tokio::time::advance(Duration::from_secs(10)).await;
        assert_eq!(el.position(), Duration::from_secs(4));
        assert!(el.is_mid_playback());

        el.play();
        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(el.position(), Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_ends_at_duration() {
        let mut el = element(3);
        el.play();
        tokio::time::advance(Duration::from_secs(3)).await;

        assert!(el.has_ended());
        assert!(!el.is_playing());
        assert!(!el.is_mid_playback());
        assert_eq!(el.position(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_looping_wraps() {
        let mut el = SimulatedElement::new("music", Some(Duration::from_secs(10)), true);
        el.play();
        tokio::time::advance(Duration::from_secs(23)).await;

        assert_eq!(el.position(), Duration::from_secs(3));
        assert!(!el.has_ended());
        assert!(el.is_playing());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_rewinds() {
        let mut el = element(30);
        el.play();
        tokio::time::advance(Duration::from_secs(7)).await;
        el.stop();

        assert_eq!(el.position(), Duration::ZERO);
        assert!(!el.is_playing());
    }
}
