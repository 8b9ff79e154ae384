pub mod client;
pub mod messages;

pub use client::{LlmClient, LlmError};
pub use messages::{ChatCompletionRequest, ChatMessage};
