use std::sync::Arc;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::clients::LyricsProvider;
use crate::tools::{parse_params, schema_for, Tool, ToolOutcome};

#[derive(Deserialize, JsonSchema)]
struct LyricsParams {
    /// Song title
    title: String,
    /// Artist name, if known
    #[serde(default)]
    artist: Option<String>,
}

pub struct GeniusLyricsTool {
    provider: Arc<dyn LyricsProvider>,
}

impl GeniusLyricsTool {
    pub fn new(provider: Arc<dyn LyricsProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl Tool for GeniusLyricsTool {
    fn name(&self) -> &str {
        "genius_lyrics"
    }
    fn description(&self) -> &str {
        "Look up the full lyrics of a song on Genius by title and, optionally, artist. \
         Returns the lyrics text, or a failure when no lyrics were found."
    }
    fn parameters_schema(&self) -> Value {
        schema_for::<LyricsParams>()
    }
    async fn execute(&self, params: Value) -> ToolOutcome {
        let params: LyricsParams = match parse_params(params) {
            Ok(p) => p,
            Err(e) => return ToolOutcome::failure(e.to_string()),
        };

        let artist = params.artist.as_deref().filter(|a| !a.trim().is_empty());
        match self.provider.lyrics(&params.title, artist).await {
            Ok(Some(lyrics)) => ToolOutcome::success(lyrics),
            Ok(None) => ToolOutcome::failure(match artist {
                Some(artist) => format!("No lyrics found for '{}' by {}", params.title, artist),
                None => format!("No lyrics found for '{}'", params.title),
            }),
            Err(e) => {
                warn!("Lyrics lookup for '{}' failed: {}", params.title, e);
                ToolOutcome::failure(format!("Lyrics lookup failed: {}", e))
            }
        }
    }
}
