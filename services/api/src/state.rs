//! Shared Application State
//!
//! This module defines the `AppState` struct, which holds the read-only resources
//! every handler needs: configuration, the upstream client and the clock.

use crate::config::Config;
use healthcare_core::{
    clock::{Clock, SystemClock},
    llm_client::{LLMClient, OpenAICompatibleClient},
};
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub llm_client: Arc<dyn LLMClient>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    /// Wires the production upstream client and system clock to `config`.
    pub fn from_config(config: Config) -> Self {
        let llm_client = OpenAICompatibleClient::new(config.openai_api_base.clone());
        Self {
            config: Arc::new(config),
            llm_client: Arc::new(llm_client),
            clock: Arc::new(SystemClock),
        }
    }
}
