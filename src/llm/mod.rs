pub mod agent;
pub mod client;
#[cfg(test)]
pub(crate) mod testing;

pub use agent::{Agent, AgentEvent};
pub use client::{ChatModel, LlmClient};
