pub mod agents;
pub mod cli;
pub mod clients;
pub mod config;
pub mod error;
pub mod llm;
pub mod system_prompt;
pub mod tools;
