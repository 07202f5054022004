use std::sync::Arc;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use crate::clients::Catalog;
use crate::tools::{parse_params, schema_for, Tool, ToolOutcome};

#[derive(Deserialize, JsonSchema)]
struct SearchParams {
    /// Search query, e.g. a track or album name optionally followed by the artist
    query: String,
}

#[derive(Deserialize, JsonSchema)]
struct AlbumParams {
    /// Spotify album URI, e.g. spotify:album:4aawyAB9vmqN3uQ7FjRGTy. An
    /// open.spotify.com album link or a bare album id also works.
    album_uri: String,
}

#[derive(Deserialize, JsonSchema)]
struct PlayParams {
    /// Spotify track URI, e.g. spotify:track:6rqhFgbbKwnb9MLmUQDhG6. An
    /// open.spotify.com track link or a bare track id also works.
    track_uri: String,
}

pub struct TrackSearchTool {
    catalog: Arc<dyn Catalog>,
    limit: u32,
}

impl TrackSearchTool {
    pub fn new(catalog: Arc<dyn Catalog>, limit: u32) -> Self {
        Self { catalog, limit }
    }
}

#[async_trait]
impl Tool for TrackSearchTool {
    fn name(&self) -> &str {
        "spotify_track_search"
    }
    fn description(&self) -> &str {
        "Search the Spotify catalog for tracks (songs) whose name matches the query. \
         Returns a list of {track_uri, track_name, album, artists}."
    }
    fn parameters_schema(&self) -> Value {
        schema_for::<SearchParams>()
    }
    async fn execute(&self, params: Value) -> ToolOutcome {
        let params: SearchParams = match parse_params(params) {
            Ok(p) => p,
            Err(e) => return ToolOutcome::failure(e.to_string()),
        };
        ToolOutcome::from_result(self.catalog.search_tracks(&params.query, self.limit).await)
    }
}

pub struct AlbumSearchTool {
    catalog: Arc<dyn Catalog>,
    limit: u32,
}

impl AlbumSearchTool {
    pub fn new(catalog: Arc<dyn Catalog>, limit: u32) -> Self {
        Self { catalog, limit }
    }
}

#[async_trait]
impl Tool for AlbumSearchTool {
    fn name(&self) -> &str {
        "spotify_album_search"
    }
    fn description(&self) -> &str {
        "Search the Spotify catalog for albums whose name matches the query. \
         Only returns album information, not the tracks on them. \
         Prefer the oldest, original release unless asked otherwise. \
         Returns a list of {album_uri, album_name, total_tracks, artists}."
    }
    fn parameters_schema(&self) -> Value {
        schema_for::<SearchParams>()
    }
    async fn execute(&self, params: Value) -> ToolOutcome {
        let params: SearchParams = match parse_params(params) {
            Ok(p) => p,
            Err(e) => return ToolOutcome::failure(e.to_string()),
        };
        ToolOutcome::from_result(self.catalog.search_albums(&params.query, self.limit).await)
    }
}

pub struct AlbumTracksTool {
    catalog: Arc<dyn Catalog>,
}

impl AlbumTracksTool {
    pub fn new(catalog: Arc<dyn Catalog>) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl Tool for AlbumTracksTool {
    fn name(&self) -> &str {
        "spotify_album_tracks"
    }
    fn description(&self) -> &str {
        "List the tracks on the album with the given Spotify album URI. \
         Returns a list of {track_uri, track_name, artists}."
    }
    fn parameters_schema(&self) -> Value {
        schema_for::<AlbumParams>()
    }
    async fn execute(&self, params: Value) -> ToolOutcome {
        let params: AlbumParams = match parse_params(params) {
            Ok(p) => p,
            Err(e) => return ToolOutcome::failure(e.to_string()),
        };
        ToolOutcome::from_result(self.catalog.album_tracks(&params.album_uri).await)
    }
}

pub struct PlayTrackTool {
    catalog: Arc<dyn Catalog>,
}

impl PlayTrackTool {
    pub fn new(catalog: Arc<dyn Catalog>) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl Tool for PlayTrackTool {
    fn name(&self) -> &str {
        "spotify_play_track"
    }
    fn description(&self) -> &str {
        "Play the track with the given Spotify track URI on the user's Spotify account. \
         Returns true when playback started."
    }
    fn parameters_schema(&self) -> Value {
        schema_for::<PlayParams>()
    }
    async fn execute(&self, params: Value) -> ToolOutcome {
        let params: PlayParams = match parse_params(params) {
            Ok(p) => p,
            Err(e) => return ToolOutcome::failure(e.to_string()),
        };
        match self.catalog.start_playback(&params.track_uri).await {
            Ok(()) => ToolOutcome::success(true),
            Err(e) => ToolOutcome::failure(format!("Playback failed: {}", e)),
        }
    }
}

/// The Spotify agent's fixed tool set.
pub fn spotify_tools(catalog: Arc<dyn Catalog>, limit: u32) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(TrackSearchTool::new(catalog.clone(), limit)),
        Arc::new(AlbumSearchTool::new(catalog.clone(), limit)),
        Arc::new(AlbumTracksTool::new(catalog.clone())),
        Arc::new(PlayTrackTool::new(catalog)),
    ]
}
