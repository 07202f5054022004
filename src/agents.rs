//! Static assembly of the three agents and their tool sets.

use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::clients::{
    Catalog, DuckDuckGoClient, GeniusClient, LyricsProvider, SpotifyClient, Unconfigured,
    WebSearch,
};
use crate::config::Config;
use crate::error::ToolError;
use crate::llm::{Agent, ChatModel};
use crate::system_prompt::{
    build_system_prompt, LYRICS_AGENT_PROMPT, ORCHESTRATOR_PROMPT, SPOTIFY_AGENT_PROMPT,
};
use crate::tools::builtin::{spotify_tools, DelegateTool, GeniusLyricsTool, WebSearchTool};
use crate::tools::executor::ToolExecutor;
use crate::tools::{Tool, ToolRegistry};

const SPOTIFY_DELEGATE_DESCRIPTION: &str = "\
Hands a request to the Spotify agent, which can search the Spotify catalog and control playback. \
It can search for a track by name ('Search for a track named <track> by <artist>'), \
search for an album by name ('Search for an album named <album> by <artist>'), \
list the tracks on an album ('What tracks are on the album <album>') \
and play a track on the user's account ('Play the track <track> by <artist>'). \
Returns the Spotify agent's answer.";

const LYRICS_DELEGATE_DESCRIPTION: &str = "\
Hands a request to the lyrics agent, which can look up song lyrics on Genius \
and search the web to identify a song from a fragment of its lyrics. \
Returns the lyrics agent's answer.";

fn agent(
    name: &str,
    prompt: &str,
    tools: Vec<Arc<dyn Tool>>,
    config: &Config,
    model: Arc<dyn ChatModel>,
) -> Agent {
    let registry = Arc::new(ToolRegistry::from_tools(tools));
    let executor = ToolExecutor::new(registry, Duration::from_secs(config.tool_timeout_secs));
    Agent::new(
        name,
        build_system_prompt(prompt),
        model,
        executor,
        config.agent_max_iterations,
    )
}

/// Keeps a missing credential from stopping start-up; the tools report it
/// when they are called.
fn unconfigured(service: &str, err: ToolError) -> Arc<Unconfigured> {
    warn!("{} tools unavailable: {}", service, err);
    let reason = match err {
        ToolError::Config(reason) => reason,
        other => other.to_string(),
    };
    Arc::new(Unconfigured::new(reason))
}

pub fn spotify_agent(config: &Config, model: Arc<dyn ChatModel>) -> Agent {
    let catalog: Arc<dyn Catalog> = match SpotifyClient::new(config) {
        Ok(client) => Arc::new(client),
        Err(e) => unconfigured("Spotify", e),
    };
    agent(
        "spotify",
        SPOTIFY_AGENT_PROMPT,
        spotify_tools(catalog, config.search_limit),
        config,
        model,
    )
}

pub fn lyrics_agent(config: &Config, model: Arc<dyn ChatModel>) -> Agent {
    let lyrics: Arc<dyn LyricsProvider> = match GeniusClient::new(config) {
        Ok(client) => Arc::new(client),
        Err(e) => unconfigured("Genius", e),
    };
    let search: Arc<dyn WebSearch> = match DuckDuckGoClient::new(config) {
        Ok(client) => Arc::new(client),
        Err(e) => unconfigured("Web search", e),
    };
    agent(
        "lyrics",
        LYRICS_AGENT_PROMPT,
        vec![
            Arc::new(GeniusLyricsTool::new(lyrics)),
            Arc::new(WebSearchTool::new(search, config.search_limit as usize)),
        ],
        config,
        model,
    )
}

/// The top-level agent; its only tools are the two sub-agents.
pub fn orchestrator(config: &Config, model: Arc<dyn ChatModel>) -> Agent {
    let spotify = spotify_agent(config, model.clone());
    let lyrics = lyrics_agent(config, model.clone());
    let delegate_timeout = Duration::from_secs(config.delegate_timeout_secs());

    agent(
        "orchestrator",
        ORCHESTRATOR_PROMPT,
        vec![
            Arc::new(
                DelegateTool::new("spotify", SPOTIFY_DELEGATE_DESCRIPTION, Arc::new(spotify))
                    .with_timeout(delegate_timeout),
            ),
            Arc::new(
                DelegateTool::new("lyrics", LYRICS_DELEGATE_DESCRIPTION, Arc::new(lyrics))
                    .with_timeout(delegate_timeout),
            ),
        ],
        config,
        model,
    )
}
