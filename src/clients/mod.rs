pub mod duckduckgo;
pub mod entities;
pub mod genius;
pub mod spotify;

use async_trait::async_trait;

pub use duckduckgo::{DuckDuckGoClient, WebSearch};
pub use genius::{GeniusClient, LyricsProvider};
pub use spotify::{Catalog, SpotifyClient};

use crate::error::{Result, ToolError};
use entities::{Album, AlbumTrack, Track, WebResult};

/// Stands in for a client that could not be built (usually missing
/// credentials). Every call fails with the original reason.
pub struct Unconfigured {
    reason: String,
}

impl Unconfigured {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    fn err(&self) -> ToolError {
        ToolError::Config(self.reason.clone())
    }
}

#[async_trait]
impl Catalog for Unconfigured {
    async fn search_tracks(&self, _query: &str, _limit: u32) -> Result<Vec<Track>> {
        Err(self.err())
    }

    async fn search_albums(&self, _query: &str, _limit: u32) -> Result<Vec<Album>> {
        Err(self.err())
    }

    async fn album_tracks(&self, _album_uri: &str) -> Result<Vec<AlbumTrack>> {
        Err(self.err())
    }

    async fn start_playback(&self, _track_uri: &str) -> Result<()> {
        Err(self.err())
    }
}

#[async_trait]
impl LyricsProvider for Unconfigured {
    async fn lyrics(&self, _title: &str, _artist: Option<&str>) -> Result<Option<String>> {
        Err(self.err())
    }
}

#[async_trait]
impl WebSearch for Unconfigured {
    async fn search(&self, _query: &str, _max_results: usize) -> Result<Vec<WebResult>> {
        Err(self.err())
    }
}
