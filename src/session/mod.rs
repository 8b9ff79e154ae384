//! Session configuration and persisted user state
//!
//! This module provides:
//! - `SessionConfig`: what the assessment hands to the player
//! - `UserStats` / `SessionSummary`: cumulative meditation time
//! - `UserState` / `StateStore`: saved sessions and stats on disk

mod config;
mod stats;
mod store;

pub use config::{clamp_volume, AudioLayers, SessionConfig};
pub use stats::{SessionSummary, UserStats};
pub use store::{SavedSession, StateStore, StoreError, UserState};
