//! HTTP API for the meditation client
//!
//! - POST /api/meditations/generate - Script from assessment answers
//! - POST /api/narration - Narrate text with the hosted voice
//! - POST /api/narration/preview - Voice sample
//! - GET|POST /api/sessions, GET|DELETE /api/sessions/:id - Saved sessions
//! - GET /api/stats, POST /api/stats/sessions - Cumulative stats
//! - GET /health - Health check

mod error;
mod handlers;
mod routes;
mod state;

pub use error::{ApiError, ErrorResponse};
pub use routes::create_router;
pub use state::AppState;
