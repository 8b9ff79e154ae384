use crate::audio::AudioClip;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// The three narrated parts of a session, in playback order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Segment {
    Intro,
    Main,
    Closing,
}

impl Segment {
    pub const ALL: [Segment; 3] = [Segment::Intro, Segment::Main, Segment::Closing];

    /// Segment that follows this one, if any
    pub fn next(self) -> Option<Segment> {
        match self {
            Segment::Intro => Some(Segment::Main),
            Segment::Main => Some(Segment::Closing),
            Segment::Closing => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Segment::Intro => "intro",
            Segment::Main => "main",
            Segment::Closing => "closing",
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Text to speak and how to speak it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NarrationRequest {
    pub text: String,
    pub voice_id: String,
    #[serde(default = "default_speed")]
    pub speed: f32,
}

fn default_speed() -> f32 {
    0.9
}

#[derive(Debug, Error)]
pub enum NarrationError {
    #[error("narration provider is not configured")]
    NotConfigured,

    #[error("narration text is empty")]
    EmptyText,

    #[error("narration request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("narration provider returned {status}: {message}")]
    Status { status: StatusCode, message: String },

    #[error("local speech synthesis failed: {0}")]
    Local(String),
}

/// Turns text into speech audio
#[async_trait::async_trait]
pub trait NarrationSynthesizer: Send + Sync {
    async fn synthesize(&self, request: &NarrationRequest) -> Result<AudioClip, NarrationError>;

    /// Backend name for logging
    fn name(&self) -> &str;
}
