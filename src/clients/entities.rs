//! Normalized shapes handed back to the model. Each serializes to exactly
//! the keys the tool descriptions advertise.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub track_uri: String,
    pub track_name: String,
    pub album: String,
    pub artists: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Album {
    pub album_uri: String,
    pub album_name: String,
    pub total_tracks: u32,
    pub artists: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumTrack {
    pub track_uri: String,
    pub track_name: String,
    pub artists: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebResult {
    pub title: String,
    pub link: String,
    pub snippet: String,
}
