//! Healthcare Chat Core
//!
//! Provider-independent pieces of the appointment assistant: the agent
//! specification handed to the model, the clock it is rendered against, and the
//! client that talks to the upstream provider.

pub mod agent;
pub mod clock;
pub mod llm_client;
