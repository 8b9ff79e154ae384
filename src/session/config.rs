use crate::assessment::AssessmentData;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for one meditation session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    /// Display name (e.g. "Evening wind-down")
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Length the user asked for; the realized length follows the narration
    pub requested_duration_minutes: f64,

    /// TTS voice identifier
    pub voice_id: String,

    /// Music and voice mix
    #[serde(default)]
    pub layers: AudioLayers,

    pub assessment_data: AssessmentData,
}

/// Volume mix and background music selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioLayers {
    pub music_volume: f32,
    pub voice_volume: f32,
    /// Catalog name of the music bed (e.g. "rain", "singing-bowls")
    #[serde(default)]
    pub music_type: Option<String>,
    /// Local file for the music bed
    #[serde(default)]
    pub music_file: Option<PathBuf>,
}

impl Default for AudioLayers {
    fn default() -> Self {
        Self {
            music_volume: 0.4,
            voice_volume: 0.9,
            music_type: None,
            music_file: None,
        }
    }
}

impl AudioLayers {
    /// Clamp both volumes into [0, 1]
    pub fn normalized(mut self) -> Self {
        self.music_volume = clamp_volume(self.music_volume);
        self.voice_volume = clamp_volume(self.voice_volume);
        self
    }
}

pub fn clamp_volume(volume: f32) -> f32 {
    if volume.is_nan() {
        0.0
    } else {
        volume.clamp(0.0, 1.0)
    }
}

impl SessionConfig {
    /// Session config derived from finished assessment answers
    pub fn from_assessment(name: impl Into<String>, voice_id: impl Into<String>, assessment: AssessmentData) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            requested_duration_minutes: assessment.duration_minutes,
            voice_id: voice_id.into(),
            layers: AudioLayers::default(),
            assessment_data: assessment,
        }
    }
}
