//! Session playback
//!
//! `Coordinator` is the state machine for one session, `loader` runs the
//! loading phase, and `driver` runs a coordinator on a tokio task behind a
//! `SessionHandle`.

pub mod coordinator;
pub mod driver;
pub mod loader;
mod phase;
pub mod timing;

pub use coordinator::{
    Coordinator, Directive, NarrationSet, PlaybackEvent, PreparedSession, SessionSnapshot,
};
pub use driver::{spawn, DriverError, SessionHandle};
pub use loader::{LoadedSession, SessionLoader};
pub use phase::SessionPhase;
pub use timing::SessionTiming;
