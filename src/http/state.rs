use crate::narration::ProviderSynthesizer;
use crate::script::ScriptGenerator;
use crate::session::StateStore;
use std::sync::Arc;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Script generator; `None` when no LLM credential is configured
    pub generator: Option<Arc<dyn ScriptGenerator>>,

    /// Hosted narration; `None` sends clients to local speech
    pub narration: Option<Arc<ProviderSynthesizer>>,

    /// Saved sessions and stats
    pub store: Arc<StateStore>,

    /// Accepted bearer tokens; empty disables the check
    pub api_tokens: Arc<Vec<String>>,
}

impl AppState {
    pub fn new(store: Arc<StateStore>) -> Self {
        Self {
            generator: None,
            narration: None,
            store,
            api_tokens: Arc::new(Vec::new()),
        }
    }

    pub fn with_generator(mut self, generator: Arc<dyn ScriptGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn with_narration(mut self, narration: Arc<ProviderSynthesizer>) -> Self {
        self.narration = Some(narration);
        self
    }

    pub fn with_api_tokens(mut self, tokens: Vec<String>) -> Self {
        self.api_tokens = Arc::new(tokens);
        self
    }

    /// Whether `token` may call protected endpoints
    pub fn is_authorized(&self, token: Option<&str>) -> bool {
        if self.api_tokens.is_empty() {
            return true;
        }
        token.is_some_and(|token| self.api_tokens.iter().any(|t| t == token))
    }
}
