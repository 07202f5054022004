//! Spotify Web API access.
//!
//! Token handling is left to rspotify: a client-credentials grant backs the
//! catalog reads and an authorization-code grant, cached on disk, backs
//! playback. Catalog responses are decoded into local shapes so that null
//! search entries and the exact record keys stay under our control.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rspotify::model::{PlayableId, TrackId};
use rspotify::prelude::*;
use rspotify::{scopes, AuthCodeSpotify, ClientCredsSpotify, Credentials, OAuth, Token};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::clients::entities::{Album, AlbumTrack, Track};
use crate::config::{Config, SpotifyConfig};
use crate::error::{Result, ToolError};

/// Number of tracks requested from the album tracks endpoint.
const ALBUM_TRACKS_LIMIT: u32 = 50;

/// Source of the redirect URL pasted by the user. Runs on its own thread.
pub type RedirectReader = Arc<dyn Fn() -> Option<String> + Send + Sync>;

/// Catalog and playback operations the Spotify tools are built on.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Catalog: Send + Sync {
    async fn search_tracks(&self, query: &str, limit: u32) -> Result<Vec<Track>>;
    async fn search_albums(&self, query: &str, limit: u32) -> Result<Vec<Album>>;
    async fn album_tracks(&self, album_uri: &str) -> Result<Vec<AlbumTrack>>;
    async fn start_playback(&self, track_uri: &str) -> Result<()>;
}

// Web API response shapes, trimmed to the fields we normalize.
#[derive(Debug, Deserialize)]
struct SearchResponse {
    tracks: Option<Paging<ApiTrack>>,
    albums: Option<Paging<ApiAlbum>>,
}

#[derive(Debug, Deserialize)]
#[serde(bound = "T: Deserialize<'de>")]
struct Paging<T> {
    // The search endpoint occasionally returns null entries.
    #[serde(default)]
    items: Vec<Option<T>>,
}

impl<T> Paging<T> {
    fn into_items(self) -> impl Iterator<Item = T> {
        self.items.into_iter().flatten()
    }
}

#[derive(Debug, Deserialize)]
struct ApiArtist {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ApiAlbumRef {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ApiTrack {
    uri: String,
    name: String,
    album: ApiAlbumRef,
    artists: Vec<ApiArtist>,
}

#[derive(Debug, Deserialize)]
struct ApiAlbum {
    uri: String,
    name: String,
    total_tracks: u32,
    artists: Vec<ApiArtist>,
}

#[derive(Debug, Deserialize)]
struct ApiSimplifiedTrack {
    uri: String,
    name: String,
    artists: Vec<ApiArtist>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

fn artist_names(artists: Vec<ApiArtist>) -> Vec<String> {
    artists.into_iter().map(|a| a.name).collect()
}

impl From<ApiTrack> for Track {
    fn from(t: ApiTrack) -> Track {
        Track {
            track_uri: t.uri,
            track_name: t.name,
            album: t.album.name,
            artists: artist_names(t.artists),
        }
    }
}

impl From<ApiAlbum> for Album {
    fn from(a: ApiAlbum) -> Album {
        Album {
            album_uri: a.uri,
            album_name: a.name,
            total_tracks: a.total_tracks,
            artists: artist_names(a.artists),
        }
    }
}

impl From<ApiSimplifiedTrack> for AlbumTrack {
    fn from(t: ApiSimplifiedTrack) -> AlbumTrack {
        AlbumTrack {
            track_uri: t.uri,
            track_name: t.name,
            artists: artist_names(t.artists),
        }
    }
}

/// Returns the id named by a Spotify reference of the given `kind`.
///
/// Accepts `spotify:<kind>:<id>`, `https://open.spotify.com/<kind>/<id>`
/// links (query string ignored) and bare ids.
pub fn parse_uri(uri: &str, kind: &str) -> Result<String> {
    let invalid = || ToolError::InvalidUri(uri.to_string());
    let trimmed = uri.trim();

    let id = if let Some(rest) = trimmed.strip_prefix("spotify:") {
        let mut parts = rest.split(':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(k), Some(id), None) if k == kind => id.to_string(),
            _ => return Err(invalid()),
        }
    } else if trimmed.starts_with("https://") || trimmed.starts_with("http://") {
        let url = url::Url::parse(trimmed).map_err(|_| invalid())?;
        if url.host_str() != Some("open.spotify.com") {
            return Err(invalid());
        }
        let segments: Vec<&str> = url
            .path_segments()
            .map(|s| s.filter(|s| !s.is_empty()).collect())
            .unwrap_or_default();
        // Localized links carry a leading `intl-xx` segment.
        let path = match segments.split_first() {
            Some((first, rest)) if first.starts_with("intl-") => rest,
            _ => &segments[..],
        };
        match path {
            [k, id] if *k == kind => id.to_string(),
            _ => return Err(invalid()),
        }
    } else {
        trimmed.to_string()
    };

    if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(invalid());
    }
    Ok(id)
}

pub struct SpotifyClient {
    http: reqwest::Client,
    api_base: String,
    app: ClientCredsSpotify,
    user: AuthCodeSpotify,
    redirect_reader: RedirectReader,
}

impl SpotifyClient {
    pub fn new(config: &Config) -> Result<Self> {
        let spotify = config.spotify.clone().map_err(ToolError::Config)?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()?;

        Ok(Self::with_http(http, spotify))
    }

    pub fn with_http(http: reqwest::Client, config: SpotifyConfig) -> Self {
        let creds = Credentials::new(&config.client_id, &config.client_secret);
        let oauth = OAuth {
            redirect_uri: config.redirect_url.clone(),
            scopes: scopes!("user-modify-playback-state"),
            ..Default::default()
        };
        // Expired user tokens are re-authorized, never refreshed.
        let user_config = rspotify::Config {
            cache_path: config.token_cache.clone(),
            token_cached: true,
            token_refreshing: false,
            api_base_url: config.api_base.clone(),
            auth_base_url: config.accounts_base.clone(),
            ..Default::default()
        };
        // The app token must never overwrite the cached user token.
        let app_config = rspotify::Config {
            token_cached: false,
            ..user_config.clone()
        };

        Self {
            http,
            api_base: config.api_base,
            app: ClientCredsSpotify::with_config(creds.clone(), app_config),
            user: AuthCodeSpotify::with_config(creds, oauth, user_config),
            redirect_reader: Arc::new(read_stdin_line),
        }
    }

    pub fn with_redirect_reader(
        mut self,
        reader: impl Fn() -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        self.redirect_reader = Arc::new(reader);
        self
    }

    /// Client-credentials token for catalog reads, fetched lazily.
    async fn app_token(&self) -> Result<String> {
        if let Some(token) = valid_token(&self.app).await? {
            return Ok(token.access_token);
        }

        debug!("Spotify: requesting client-credentials token");
        self.app.request_token().await?;
        valid_token(&self.app)
            .await?
            .map(|token| token.access_token)
            .ok_or_else(|| ToolError::Auth("Spotify issued no client-credentials token".to_string()))
    }

    /// Makes sure the playback client holds a valid user token: the one in
    /// memory, then the cache file, then a terminal authorization.
    async fn authorize_user(&self) -> Result<()> {
        if valid_token(&self.user).await?.is_some() {
            return Ok(());
        }

        match self.user.read_token_cache(false).await {
            Ok(Some(token)) => {
                debug!("Spotify: using cached user token");
                *self.user.get_token().lock().await.map_err(|_| lock_failed())? = Some(token);
                return Ok(());
            }
            Ok(None) => info!("Spotify: no valid cached user token, authorizing"),
            Err(e) => info!("Spotify: token cache unavailable ({}), authorizing", e),
        }

        let url = self.user.get_authorize_url(false)?;
        let redirect = self.prompt_for_redirect(&url).await?;
        let code = self
            .user
            .parse_response_code(&redirect)
            .ok_or_else(|| ToolError::Auth("Redirect URL has no valid 'code' parameter".to_string()))?;
        self.user.request_token(&code).await?;

        if let Some(parent) = self.user.get_config().cache_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        if let Err(e) = self.user.write_token_cache().await {
            warn!("Spotify: failed to cache user token: {}", e);
        }
        Ok(())
    }

    /// Asks for the redirect URL. The blocking read runs on a dedicated thread
    /// so a timed-out call leaves nothing behind on the runtime.
    async fn prompt_for_redirect(&self, authorize_url: &str) -> Result<String> {
        // stdout carries the agent's answer, so the prompt goes to stderr.
        eprintln!("Spotify playback needs your authorization.");
        eprintln!("Visit this URL, approve access, then paste the URL you were redirected to:");
        eprintln!("{}", authorize_url);

        let (tx, rx) = tokio::sync::oneshot::channel();
        let reader = Arc::clone(&self.redirect_reader);
        std::thread::Builder::new()
            .name("spotify-authorize".to_string())
            .spawn(move || {
                let _ = tx.send(reader());
            })?;

        rx.await
            .ok()
            .flatten()
            .map(|line| line.trim().to_string())
            .filter(|line| !line.is_empty())
            .ok_or_else(|| ToolError::Auth("No redirect URL entered".to_string()))
    }

    async fn search(&self, query: &str, kind: &str, limit: u32) -> Result<SearchResponse> {
        let token = self.app_token().await?;
        let limit = limit.to_string();
        debug!("Spotify: searching {} for '{}'", kind, query);

        let response = self
            .http
            .get(format!("{}search", self.api_base))
            .bearer_auth(token)
            .query(&[("q", query), ("type", kind), ("limit", limit.as_str())])
            .send()
            .await?;
        let response = check_status(response).await?;
        Ok(response.json().await?)
    }
}

#[async_trait]
impl Catalog for SpotifyClient {
    async fn search_tracks(&self, query: &str, limit: u32) -> Result<Vec<Track>> {
        let response = self.search(query, "track", limit).await?;
        Ok(response
            .tracks
            .map(|page| page.into_items().map(Track::from).collect())
            .unwrap_or_default())
    }

    async fn search_albums(&self, query: &str, limit: u32) -> Result<Vec<Album>> {
        let response = self.search(query, "album", limit).await?;
        Ok(response
            .albums
            .map(|page| page.into_items().map(Album::from).collect())
            .unwrap_or_default())
    }

    async fn album_tracks(&self, album_uri: &str) -> Result<Vec<AlbumTrack>> {
        let id = parse_uri(album_uri, "album")?;
        let token = self.app_token().await?;
        let limit = ALBUM_TRACKS_LIMIT.to_string();

        let response = self
            .http
            .get(format!("{}albums/{}/tracks", self.api_base, id))
            .bearer_auth(token)
            .query(&[("limit", limit.as_str())])
            .send()
            .await?;
        let response = check_status(response).await?;
        let page: Paging<ApiSimplifiedTrack> = response.json().await?;
        Ok(page.into_items().map(AlbumTrack::from).collect())
    }

    async fn start_playback(&self, track_uri: &str) -> Result<()> {
        let id = parse_uri(track_uri, "track")?;
        let track = TrackId::from_id(id.as_str())
            .map_err(|_| ToolError::InvalidUri(track_uri.to_string()))?;
        self.authorize_user().await?;

        self.user
            .start_uris_playback([PlayableId::Track(track)], None, None, None)
            .await?;
        info!("Spotify: started playback of {}", track_uri);
        Ok(())
    }
}

/// The client's current token, unless it is missing or expired.
async fn valid_token(client: &impl BaseClient) -> Result<Option<Token>> {
    let token = client.get_token();
    let guard = token.lock().await.map_err(|_| lock_failed())?;
    Ok(guard.as_ref().filter(|t| !t.is_expired()).cloned())
}

fn lock_failed() -> ToolError {
    ToolError::Auth("Spotify token store is unavailable".to_string())
}

fn read_stdin_line() -> Option<String> {
    let mut line = String::new();
    match std::io::stdin().read_line(&mut line) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(line),
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ApiErrorBody>(&body) {
        Ok(parsed) => parsed.error.message,
        Err(_) if body.is_empty() => status.canonical_reason().unwrap_or("unknown").to_string(),
        Err(_) => body,
    };

    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Err(ToolError::Auth(message));
    }
    Err(ToolError::Upstream {
        status: status.as_u16(),
        message,
    })
}
