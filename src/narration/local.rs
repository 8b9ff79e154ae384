use super::synthesizer::{NarrationError, NarrationRequest, NarrationSynthesizer};
use crate::audio::AudioClip;
use crate::script::duration::{estimate_speech_duration, WORDS_PER_MINUTE};
use std::io::Cursor;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{info, warn};

const SILENT_SAMPLE_RATE: u32 = 8000;

/// Degraded narration used when the provider is missing or failing
///
/// Tries a local TTS executable first; when that is unavailable it produces a
/// silent clip as long as the text would take to speak, so session timing
/// still holds.
pub struct LocalSpeechSynthesizer {
    command: String,
    words_per_minute: f64,
}

impl LocalSpeechSynthesizer {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            words_per_minute: WORDS_PER_MINUTE,
        }
    }

    pub fn with_words_per_minute(mut self, words_per_minute: f64) -> Self {
        self.words_per_minute = words_per_minute;
        self
    }

    async fn speak_locally(&self, text: &str, speed: f32) -> Result<Vec<u8>, NarrationError> {
        // espeak-ng rate is in words per minute
        let rate = ((self.words_per_minute * 1.6) * speed as f64).round().max(80.0) as u32;

        let output = Command::new(&self.command)
            .arg("--stdout")
            .arg("-s")
            .arg(rate.to_string())
            .arg(text)
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .await
            .map_err(|e| NarrationError::Local(format!("{}: {}", self.command, e)))?;

        if !output.status.success() || output.stdout.is_empty() {
            return Err(NarrationError::Local(format!(
                "{} exited with {}",
                self.command, output.status
            )));
        }

        Ok(output.stdout)
    }
}

#[async_trait::async_trait]
impl NarrationSynthesizer for LocalSpeechSynthesizer {
    async fn synthesize(&self, request: &NarrationRequest) -> Result<AudioClip, NarrationError> {
        let text = strip_markup(&request.text);

        match self.speak_locally(&text, request.speed).await {
            Ok(wav) => {
                let clip = AudioClip::new("narration:local", wav, "audio/wav");
                info!("Local speech rendered {} chars ({:?})", text.len(), clip.duration);
                Ok(clip)
            }
            Err(e) => {
                warn!("Local speech unavailable ({}), using silent timing track", e);
                let duration = estimate_speech_duration(&text, self.words_per_minute);
                let wav = silent_wav(duration)?;
                Ok(AudioClip::new("narration:silent", wav, "audio/wav").with_duration(duration))
            }
        }
    }

    fn name(&self) -> &str {
        "local"
    }
}

/// Remove SSML-style tags such as `<break time="2s"/>`
pub fn strip_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_tag = false;

    for ch in text.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => {
                in_tag = false;
                out.push(' ');
            }
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }

    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// 16-bit mono WAV of silence
pub fn silent_wav(duration: Duration) -> Result<Vec<u8>, NarrationError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: SILENT_SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let samples = (duration.as_secs_f64() * SILENT_SAMPLE_RATE as f64).round() as u64;
    let mut bytes = Vec::new();
    {
        let mut writer = hound::WavWriter::new(Cursor::new(&mut bytes), spec)
            .map_err(|e| NarrationError::Local(e.to_string()))?;
        for _ in 0..samples {
            writer
                .write_sample(0i16)
                .map_err(|e| NarrationError::Local(e.to_string()))?;
        }
        writer
            .finalize()
            .map_err(|e| NarrationError::Local(e.to_string()))?;
    }

    Ok(bytes)
}
