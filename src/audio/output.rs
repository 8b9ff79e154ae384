// Output-device backend (feature "playback")

use super::element::{AudioBackend, AudioClip, AudioElement};
use anyhow::{Context, Result};
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use std::io::Cursor;
use std::time::Duration;
use tracing::{debug, info};

/// Plays through the default output device
///
/// Holds the output stream, so it must outlive every element it opens.
pub struct RodioBackend {
    _stream: OutputStream,
    handle: OutputStreamHandle,
}

impl RodioBackend {
    pub fn new() -> Result<Self> {
        let (stream, handle) =
            OutputStream::try_default().context("Failed to open default audio output")?;

        info!("Audio output ready");

        Ok(Self {
            _stream: stream,
            handle,
        })
    }
}

impl AudioBackend for RodioBackend {
    type Element = RodioElement;

    fn open(&self, clip: &AudioClip, looping: bool) -> Result<RodioElement> {
        let sink = Sink::try_new(&self.handle).context("Failed to create audio sink")?;
        sink.pause();

        let decoder = Decoder::new(Cursor::new(clip.bytes.clone()))
            .with_context(|| format!("Failed to decode {} audio", clip.label))?;
        if looping {
            sink.append(decoder.repeat_infinite());
        } else {
            sink.append(decoder);
        }

        debug!("Opened {} on output device (looping={})", clip.label, looping);

        Ok(RodioElement {
            sink,
            duration: clip.duration,
            looping,
        })
    }

    fn name(&self) -> &str {
        "rodio"
    }
}

pub struct RodioElement {
    sink: Sink,
    duration: Option<Duration>,
    looping: bool,
}

impl AudioElement for RodioElement {
    fn play(&mut self) {
        self.sink.play();
    }

    fn pause(&mut self) {
        self.sink.pause();
    }

    fn stop(&mut self) {
        self.sink.pause();
        if let Err(e) = self.sink.try_seek(Duration::ZERO) {
            debug!("Rewind failed: {:?}", e);
        }
    }

    fn set_volume(&mut self, volume: f32) {
        self.sink.set_volume(volume.clamp(0.0, 1.0));
    }

    fn volume(&self) -> f32 {
        self.sink.volume()
    }

    fn position(&self) -> Duration {
        self.sink.get_pos()
    }

    fn duration(&self) -> Option<Duration> {
        self.duration
    }

    fn is_playing(&self) -> bool {
        !self.sink.is_paused() && !self.sink.empty()
    }

    fn has_ended(&self) -> bool {
        !self.looping && self.sink.empty()
    }
}
