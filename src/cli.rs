use std::io::{self, Write};
use std::sync::Arc;

use clap::Parser;
use futures::StreamExt;
use tracing::{debug, info};

use crate::agents;
use crate::config::Config;
use crate::llm::{AgentEvent, LlmClient};

pub const NO_PROMPT_MESSAGE: &str = "No prompt provided. Exiting.";

#[derive(Parser, Debug)]
#[command(name = "maestro")]
#[command(version, about = "Ask a team of music agents to search Spotify, play tracks and find lyrics", long_about = None)]
pub struct Cli {
    /// The request, e.g. "play the first track of OK Computer"
    pub prompt: Option<String>,
}

impl Cli {
    /// The request, if one was given and is not blank.
    pub fn prompt(&self) -> Option<&str> {
        self.prompt.as_deref().filter(|p| !p.trim().is_empty())
    }
}

/// Writes one event the way the terminal shows it.
pub fn render_event<W: Write>(out: &mut W, event: &AgentEvent) -> io::Result<()> {
    match event {
        AgentEvent::Text(text) => {
            write!(out, "{}", text)?;
            out.flush()
        }
        AgentEvent::ToolUse { name, input } => {
            writeln!(out, "\nUSING TOOL: {}", name)?;
            writeln!(out, "with inputs: {}", input)?;
            writeln!(out)
        }
        AgentEvent::ToolResult { name, success } => {
            debug!("Tool {} finished (success: {})", name, success);
            Ok(())
        }
        AgentEvent::Finished { .. } => {
            writeln!(out)?;
            out.flush()
        }
    }
}

/// Sends `prompt` to the orchestrator and prints its output as it streams.
pub async fn run(prompt: &str) -> anyhow::Result<()> {
    let config = Config::from_env()?;
    debug!("Loaded config: {:?}", config);

    let model = Arc::new(LlmClient::new(&config)?);
    let orchestrator = agents::orchestrator(&config, model);
    info!("Using model {} at {}", config.llm_model, config.llm_url);

    let stream = orchestrator.stream(prompt);
    futures::pin_mut!(stream);

    let mut stdout = io::stdout();
    while let Some(event) = stream.next().await {
        render_event(&mut stdout, &event?)?;
    }
    Ok(())
}
