pub mod element;
pub mod measure;
pub mod simulated;

#[cfg(feature = "playback")]
pub mod output;

pub use element::{AudioBackend, AudioClip, AudioElement};
pub use measure::{clip_duration, mime_for_path};
pub use simulated::{SimulatedBackend, SimulatedElement};
