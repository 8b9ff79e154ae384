pub mod assessment;
pub mod audio;
pub mod config;
pub mod http;
pub mod llm;
pub mod narration;
pub mod playback;
pub mod script;
pub mod session;
pub mod terminal;

pub use assessment::AssessmentData;
pub use audio::{AudioBackend, AudioClip, AudioElement, SimulatedBackend};
pub use config::Config;
pub use http::{create_router, AppState};
pub use llm::{LlmClient, LlmError};
pub use narration::{
    LocalSpeechSynthesizer, NarrationError, NarrationSynthesizer, ProviderSynthesizer, Segment,
};
pub use playback::{Coordinator, PlaybackEvent, SessionHandle, SessionLoader, SessionPhase, SessionSnapshot};
pub use script::{word_budget, LlmScriptGenerator, MeditationScript, ScriptGenerator};
pub use session::{SavedSession, SessionConfig, SessionSummary, StateStore, UserState, UserStats};
