use super::phase::SessionPhase;
use super::timing::SessionTiming;
use crate::audio::AudioElement;
use crate::narration::Segment;
use crate::session::{clamp_volume, AudioLayers, SessionSummary};
use serde::Serialize;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Everything that can happen to a session
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlaybackEvent {
    Start,
    Pause,
    Resume,
    Stop,
    SetMusicVolume(f32),
    SetVoiceVolume(f32),
    /// One second of playback went by
    Tick,
    /// A scheduled lead-in fired; stale tokens are ignored
    LeadInElapsed { token: u64 },
    /// A narration element played to its end
    SegmentEnded(Segment),
}

/// Work the driver performs on the coordinator's behalf
#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    StartTicker,
    StopTicker,
    ScheduleLeadIn { after: Duration, token: u64 },
    CancelLeadIn,
    Completed(SessionSummary),
}

/// Point-in-time view for the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub elapsed_secs: u64,
    pub total_secs: u64,
    pub remaining_secs: u64,
    pub active_segment: Option<Segment>,
    pub music_volume: f32,
    pub voice_volume: f32,
}

/// The intro, main and closing elements; any may be missing if it failed to open
pub struct NarrationSet<E> {
    pub intro: Option<E>,
    pub main: Option<E>,
    pub closing: Option<E>,
}

impl<E> Default for NarrationSet<E> {
    fn default() -> Self {
        Self {
            intro: None,
            main: None,
            closing: None,
        }
    }
}

impl<E: AudioElement> NarrationSet<E> {
    pub fn get(&self, segment: Segment) -> Option<&E> {
        match segment {
            Segment::Intro => self.intro.as_ref(),
            Segment::Main => self.main.as_ref(),
            Segment::Closing => self.closing.as_ref(),
        }
    }

    pub fn get_mut(&mut self, segment: Segment) -> Option<&mut E> {
        match segment {
            Segment::Intro => self.intro.as_mut(),
            Segment::Main => self.main.as_mut(),
            Segment::Closing => self.closing.as_mut(),
        }
    }

    fn for_each(&mut self, mut f: impl FnMut(&mut E)) {
        for element in [&mut self.intro, &mut self.main, &mut self.closing]
            .into_iter()
            .flatten()
        {
            f(element);
        }
    }

    fn clear(&mut self) {
        self.intro = None;
        self.main = None;
        self.closing = None;
    }
}

/// Audio and timing produced by the loading phase
pub struct PreparedSession<E> {
    pub timing: SessionTiming,
    pub music: Option<E>,
    pub narration: NarrationSet<E>,
}

#[derive(Debug)]
struct LeadIn {
    /// Lead-in still to play; paused time is not counted
    remaining: Duration,
    /// When the current countdown started, if one is running
    armed_at: Option<Instant>,
    /// Identifies the current arming; bumped on every pause, re-arm and stop
    token: u64,
}

/// Owns the temporal state of one session
///
/// A synchronous state machine: every input is a `PlaybackEvent`, and the
/// only outputs are element calls and the returned `Directive`s. The phase
/// field is the one source of truth every handler checks.
pub struct Coordinator<E: AudioElement> {
    phase: SessionPhase,
    timing: SessionTiming,
    music: Option<E>,
    narration: NarrationSet<E>,
    active: Option<Segment>,
    narration_started: bool,
    elapsed_secs: u64,
    music_volume: f32,
    voice_volume: f32,
    lead_in: LeadIn,
}

impl<E: AudioElement> Coordinator<E> {
    /// New session in `Loading`
    pub fn new(timing: SessionTiming, layers: &AudioLayers) -> Self {
        let lead_in = timing.lead_in;
        Self {
            phase: SessionPhase::Loading,
            timing,
            music: None,
            narration: NarrationSet::default(),
            active: None,
            narration_started: false,
            elapsed_secs: 0,
            music_volume: clamp_volume(layers.music_volume),
            voice_volume: clamp_volume(layers.voice_volume),
            lead_in: LeadIn {
                remaining: lead_in,
                armed_at: None,
                token: 0,
            },
        }
    }

    /// Take ownership of the loaded audio and move to `Ready`
    pub fn finish_loading(&mut self, prepared: PreparedSession<E>) {
        if self.phase != SessionPhase::Loading {
            warn!("finish_loading called in phase {}", self.phase);
            return;
        }

        let PreparedSession {
            timing,
            mut music,
            mut narration,
        } = prepared;

        if let Some(music) = music.as_mut() {
            music.pause();
            music.set_volume(self.music_volume);
        }
        let voice_volume = self.voice_volume;
        narration.for_each(|element| {
            element.pause();
            element.set_volume(voice_volume);
        });

        self.lead_in.remaining = timing.lead_in;
        self.timing = timing;
        self.music = music;
        self.narration = narration;
        self.phase = SessionPhase::Ready;

        info!(
            "Session ready: {}s total, music={}",
            self.timing.total_secs,
            self.music.is_some()
        );
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn timing(&self) -> &SessionTiming {
        &self.timing
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed_secs
    }

    pub fn active_segment(&self) -> Option<Segment> {
        self.active
    }

    pub fn music_element(&self) -> Option<&E> {
        self.music.as_ref()
    }

    pub fn narration_element(&self, segment: Segment) -> Option<&E> {
        self.narration.get(segment)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.phase,
            elapsed_secs: self.elapsed_secs,
            total_secs: self.timing.total_secs,
            remaining_secs: self.timing.remaining_secs(self.elapsed_secs),
            active_segment: self.active,
            music_volume: self.music_volume,
            voice_volume: self.voice_volume,
        }
    }

    /// The active segment if its element has played to the end
    pub fn poll_ended(&self) -> Option<Segment> {
        if self.phase != SessionPhase::Playing {
            return None;
        }
        let segment = self.active?;
        self.narration
            .get(segment)
            .filter(|element| element.has_ended())
            .map(|_| segment)
    }

    pub fn handle(&mut self, event: PlaybackEvent, now: Instant) -> Vec<Directive> {
        debug!("{:?} in phase {}", event, self.phase);

        match event {
            PlaybackEvent::Start => self.start(now),
            PlaybackEvent::Pause => self.pause(now),
            PlaybackEvent::Resume => self.resume(now),
            PlaybackEvent::Stop => self.stop(),
            PlaybackEvent::SetMusicVolume(volume) => {
                self.set_music_volume(volume);
                Vec::new()
            }
            PlaybackEvent::SetVoiceVolume(volume) => {
                self.set_voice_volume(volume);
                Vec::new()
            }
            PlaybackEvent::Tick => self.tick(),
            PlaybackEvent::LeadInElapsed { token } => {
                self.lead_in_elapsed(token);
                Vec::new()
            }
            PlaybackEvent::SegmentEnded(segment) => {
                self.segment_ended(segment);
                Vec::new()
            }
        }
    }

    fn start(&mut self, now: Instant) -> Vec<Directive> {
        if self.phase != SessionPhase::Ready {
            debug!("Ignoring start in phase {}", self.phase);
            return Vec::new();
        }

        info!("Session started ({}s)", self.timing.total_secs);
        self.phase = SessionPhase::Playing;

        if let Some(music) = self.music.as_mut() {
            music.play();
        }

        let mut directives = vec![Directive::StartTicker];
        directives.extend(self.arm_lead_in(now));
        directives
    }

    fn pause(&mut self, now: Instant) -> Vec<Directive> {
        if self.phase != SessionPhase::Playing {
            debug!("Ignoring pause in phase {}", self.phase);
            return Vec::new();
        }

        self.phase = SessionPhase::Paused;

        if let Some(music) = self.music.as_mut() {
            music.pause();
        }
        self.narration.for_each(|element| {
            if element.is_playing() {
                element.pause();
            }
        });

        let mut directives = vec![Directive::StopTicker];
        if let Some(armed_at) = self.lead_in.armed_at.take() {
            let waited = now.saturating_duration_since(armed_at);
            self.lead_in.remaining = self.lead_in.remaining.saturating_sub(waited);
            self.lead_in.token += 1;
            directives.push(Directive::CancelLeadIn);
        }

        info!(
            "Session paused at {}s ({:?} lead-in left)",
            self.elapsed_secs, self.lead_in.remaining
        );

        directives
    }

    fn resume(&mut self, now: Instant) -> Vec<Directive> {
        if self.phase != SessionPhase::Paused {
            debug!("Ignoring resume in phase {}", self.phase);
            return Vec::new();
        }

        self.phase = SessionPhase::Playing;

        if let Some(music) = self.music.as_mut() {
            music.play();
        }

        let mut directives = vec![Directive::StartTicker];

        match self.resumable_segment() {
            Some(segment) => {
                if let Some(element) = self.narration.get_mut(segment) {
                    element.play();
                }
                self.active = Some(segment);
            }
            None if !self.narration_started => directives.extend(self.arm_lead_in(now)),
            // Between segments or past the closing: the ended poll or the timer takes it from here
            None => {}
        }

        info!("Session resumed at {}s", self.elapsed_secs);

        directives
    }

    fn stop(&mut self) -> Vec<Directive> {
        match self.phase {
            SessionPhase::Loading => {
                warn!("Ignoring stop while loading");
                Vec::new()
            }
            SessionPhase::Completed => Vec::new(),
            _ => self.complete(),
        }
    }

    fn tick(&mut self) -> Vec<Directive> {
        if self.phase != SessionPhase::Playing {
            return Vec::new();
        }

        self.elapsed_secs += 1;
        let remaining = self.timing.remaining_secs(self.elapsed_secs);

        if let Some(volume) = self.timing.fade_volume(remaining, self.music_volume) {
            if let Some(music) = self.music.as_mut() {
                music.set_volume(volume);
            }
        }

        if self.elapsed_secs >= self.timing.total_secs {
            return self.complete();
        }

        Vec::new()
    }

    fn lead_in_elapsed(&mut self, token: u64) {
        if self.phase != SessionPhase::Playing
            || token != self.lead_in.token
            || self.narration_started
        {
            debug!("Ignoring stale lead-in {} in phase {}", token, self.phase);
            return;
        }

        self.lead_in.remaining = Duration::ZERO;
        self.lead_in.armed_at = None;
        self.start_segment(Segment::Intro);
    }

    fn segment_ended(&mut self, segment: Segment) {
        if self.phase != SessionPhase::Playing || self.active != Some(segment) {
            debug!("Ignoring end of {} (active: {:?})", segment, self.active);
            return;
        }

        info!("Narration {} finished", segment);

        match segment.next() {
            Some(next) => self.start_segment(next),
            None => {
                self.active = None;
                info!("Narration complete, music continues");
            }
        }
    }

    fn set_music_volume(&mut self, volume: f32) {
        self.music_volume = clamp_volume(volume);
        let remaining = self.timing.remaining_secs(self.elapsed_secs);
        let applied = match self.phase {
            SessionPhase::Playing | SessionPhase::Paused => self
                .timing
                .fade_volume(remaining, self.music_volume)
                .unwrap_or(self.music_volume),
            _ => self.music_volume,
        };
        if let Some(music) = self.music.as_mut() {
            music.set_volume(applied);
        }
    }

    fn set_voice_volume(&mut self, volume: f32) {
        self.voice_volume = clamp_volume(volume);
        let voice_volume = self.voice_volume;
        self.narration
            .for_each(|element| element.set_volume(voice_volume));
    }

    fn arm_lead_in(&mut self, now: Instant) -> Option<Directive> {
        self.lead_in.token += 1;

        if self.lead_in.remaining.is_zero() {
            self.lead_in.armed_at = None;
            self.start_segment(Segment::Intro);
            return None;
        }

        self.lead_in.armed_at = Some(now);
        Some(Directive::ScheduleLeadIn {
            after: self.lead_in.remaining,
            token: self.lead_in.token,
        })
    }

    /// Play `segment`, skipping forward past segments that failed to load
    fn start_segment(&mut self, segment: Segment) {
        self.narration_started = true;
        let mut next = Some(segment);

        while let Some(segment) = next {
            if let Some(element) = self.narration.get_mut(segment) {
                element.set_volume(self.voice_volume);
                element.play();
                self.active = Some(segment);
                info!("Narration {} started at {}s", segment, self.elapsed_secs);
                return;
            }
            warn!("Narration {} has no audio, skipping", segment);
            next = segment.next();
        }

        self.active = None;
    }

    /// Segment to continue on resume: one mid-playback, else the tracked active one
    fn resumable_segment(&self) -> Option<Segment> {
        Segment::ALL
            .into_iter()
            .find(|segment| {
                self.narration
                    .get(*segment)
                    .is_some_and(|element| element.is_mid_playback())
            })
            .or_else(|| {
                self.active.filter(|segment| {
                    self.narration
                        .get(*segment)
                        .is_some_and(|element| !element.has_ended())
                })
            })
    }

    fn complete(&mut self) -> Vec<Directive> {
        self.halt_audio();
        self.active = None;
        self.lead_in.armed_at = None;
        self.lead_in.token += 1;
        self.phase = SessionPhase::Completed;

        let summary = SessionSummary {
            elapsed_secs: self.elapsed_secs,
            total_secs: self.timing.total_secs,
        };

        info!(
            "Session completed after {}s of {}s ({} min credited)",
            summary.elapsed_secs,
            summary.total_secs,
            summary.minutes()
        );

        vec![
            Directive::StopTicker,
            Directive::CancelLeadIn,
            Directive::Completed(summary),
        ]
    }

    fn halt_audio(&mut self) {
        if let Some(music) = self.music.as_mut() {
            music.stop();
        }
        self.narration.for_each(|element| element.stop());
    }
}

impl<E: AudioElement> Drop for Coordinator<E> {
    fn drop(&mut self) {
        self.halt_audio();
        self.music = None;
        self.narration.clear();
        debug!("Session torn down in phase {}", self.phase);
    }
}
