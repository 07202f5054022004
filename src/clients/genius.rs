//! Lyrics lookup through the Genius API.
//!
//! The API only returns song metadata, so lyrics are scraped from the song
//! page's lyric containers once the best search hit is known.

use std::time::Duration;

use async_trait::async_trait;
use scraper::{Html, Node, Selector};
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{Result, ToolError};

#[async_trait]
pub trait LyricsProvider: Send + Sync {
    /// `Ok(None)` means the lookup worked but found nothing.
    async fn lyrics(&self, title: &str, artist: Option<&str>) -> Result<Option<String>>;
}

#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    response: SearchBody,
}

#[derive(Debug, Deserialize)]
struct SearchBody {
    #[serde(default)]
    hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
struct Hit {
    #[serde(rename = "type")]
    kind: String,
    result: SongHit,
}

#[derive(Debug, Deserialize)]
struct SongHit {
    title: String,
    url: String,
    primary_artist: Option<ArtistHit>,
}

#[derive(Debug, Deserialize)]
struct ArtistHit {
    name: String,
}

pub struct GeniusClient {
    http: reqwest::Client,
    access_token: String,
    api_base: String,
}

impl GeniusClient {
    pub fn new(config: &Config) -> Result<Self> {
        let access_token = config
            .genius_access_token
            .clone()
            .ok_or_else(|| ToolError::Config("GENIUS_ACCESS_TOKEN must be set".to_string()))?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()?;

        Ok(Self::with_http(http, access_token, config.genius_api_base.clone()))
    }

    pub fn with_http(http: reqwest::Client, access_token: String, api_base: String) -> Self {
        Self {
            http,
            access_token,
            api_base,
        }
    }

    async fn search(&self, query: &str) -> Result<Vec<Hit>> {
        let response = self
            .http
            .get(format!("{}/search", self.api_base))
            .bearer_auth(&self.access_token)
            .query(&[("q", query)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ToolError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let envelope: SearchEnvelope = response.json().await?;
        Ok(envelope.response.hits)
    }

    async fn fetch_page(&self, url: &str) -> Result<String> {
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ToolError::Upstream {
                status: status.as_u16(),
                message: format!("Failed to fetch lyrics page {}", url),
            });
        }
        Ok(response.text().await?)
    }
}

#[async_trait]
impl LyricsProvider for GeniusClient {
    async fn lyrics(&self, title: &str, artist: Option<&str>) -> Result<Option<String>> {
        let query = match artist {
            Some(artist) => format!("{} {}", title, artist),
            None => title.to_string(),
        };

        let hits = self.search(&query).await?;
        let Some(song) = pick_song(hits, artist) else {
            info!("Genius: no song hit for '{}'", query);
            return Ok(None);
        };

        debug!("Genius: fetching lyrics for '{}' from {}", song.title, song.url);
        let html = self.fetch_page(&song.url).await?;
        Ok(extract_lyrics(&html))
    }
}

/// First song hit, preferring one whose primary artist matches.
fn pick_song(hits: Vec<Hit>, artist: Option<&str>) -> Option<SongHit> {
    let mut songs = hits.into_iter().filter(|h| h.kind == "song").map(|h| h.result);

    let Some(wanted) = artist.map(|a| a.to_lowercase()).filter(|a| !a.is_empty()) else {
        return songs.next();
    };

    let songs: Vec<SongHit> = songs.collect();
    let matching = songs.iter().position(|s| {
        s.primary_artist
            .as_ref()
            .map(|a| {
                let name = a.name.to_lowercase();
                name.contains(&wanted) || wanted.contains(&name)
            })
            .unwrap_or(false)
    });

    let index = matching.unwrap_or(0);
    songs.into_iter().nth(index)
}

/// Lyrics text from a Genius song page, or `None` if the page has none.
pub fn extract_lyrics(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let containers = Selector::parse(r#"div[data-lyrics-container="true"]"#).ok()?;
    // Headers and contributor blurbs rendered inside the containers
    let excluded = Selector::parse(r#"[data-exclude-from-selection="true"]"#).ok()?;

    let mut lyrics = String::new();
    for container in document.select(&containers) {
        let skipped: Vec<_> = container.select(&excluded).map(|e| e.id()).collect();

        for node in container.descendants() {
            if node.ancestors().any(|a| skipped.contains(&a.id())) || skipped.contains(&node.id()) {
                continue;
            }
            match node.value() {
                Node::Text(text) => lyrics.push_str(text),
                Node::Element(el) if el.name() == "br" => lyrics.push('\n'),
                _ => {}
            }
        }
        lyrics.push('\n');
    }

    let cleaned = lyrics
        .lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n");
    let cleaned = cleaned.trim();

    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SONG_PAGE: &str = r#"
        <html><body>
          <div data-lyrics-container="true">
            <div data-exclude-from-selection="true">12 Contributors</div>
            [Verse 1]<br>Is this the real life?<br><a href="/x"><span>Is this just fantasy?</span></a>
          </div>
          <div class="ad">Buy tickets</div>
          <div data-lyrics-container="true">Caught in a landslide<br>No escape from reality</div>
        </body></html>
    "#;

    fn hit(kind: &str, title: &str, artist: &str, url: &str) -> serde_json::Value {
        json!({
            "type": kind,
            "result": {
                "title": title,
                "url": url,
                "primary_artist": { "name": artist }
            }
        })
    }

    #[test]
    fn test_extract_lyrics_joins_containers() {
        let lyrics = extract_lyrics(SONG_PAGE).unwrap();
        assert_eq!(
            lyrics,
            "[Verse 1]\nIs this the real life?\nIs this just fantasy?\n\nCaught in a landslide\nNo escape from reality"
        );
        assert!(!lyrics.contains("Contributors"));
        assert!(!lyrics.contains("Buy tickets"));
    }

    #[test]
    fn test_extract_lyrics_empty_page() {
        assert!(extract_lyrics("<html><body><p>Not found</p></body></html>").is_none());
    }

    #[test]
    fn test_pick_song_prefers_matching_artist() {
        let hits: Vec<Hit> = serde_json::from_value(json!([
            hit("song", "Hurt", "Johnny Cash", "https://genius.com/cash"),
            hit("song", "Hurt", "Nine Inch Nails", "https://genius.com/nin"),
        ]))
        .unwrap();

        let song = pick_song(hits, Some("nine inch nails")).unwrap();
        assert_eq!(song.url, "https://genius.com/nin");
    }

    #[test]
    fn test_pick_song_skips_non_songs_and_falls_back_to_first() {
        let hits: Vec<Hit> = serde_json::from_value(json!([
            hit("album", "Hurt", "Somebody", "https://genius.com/album"),
            hit("song", "Hurt", "Johnny Cash", "https://genius.com/cash"),
        ]))
        .unwrap();

        let song = pick_song(hits, Some("Unknown Artist")).unwrap();
        assert_eq!(song.url, "https://genius.com/cash");
    }

    #[tokio::test]
    async fn test_lyrics_over_http() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("q", "Bohemian Rhapsody Queen"))
            .and(header("authorization", "Bearer token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "meta": { "status": 200 },
                "response": {
                    "hits": [hit("song", "Bohemian Rhapsody", "Queen", &format!("{}/Queen-bohemian-rhapsody-lyrics", server.uri()))]
                }
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/Queen-bohemian-rhapsody-lyrics"))
            .respond_with(ResponseTemplate::new(200).set_body_string(SONG_PAGE))
            .mount(&server)
            .await;

        let client = GeniusClient::with_http(reqwest::Client::new(), "token".to_string(), server.uri());
        let lyrics = client.lyrics("Bohemian Rhapsody", Some("Queen")).await.unwrap().unwrap();
        assert!(lyrics.starts_with("[Verse 1]"));
    }

    #[tokio::test]
    async fn test_lyrics_no_hits_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "response": { "hits": [] }
            })))
            .mount(&server)
            .await;

        let client = GeniusClient::with_http(reqwest::Client::new(), "token".to_string(), server.uri());
        assert!(client.lyrics("zzzz", None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_lyrics_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid token"))
            .mount(&server)
            .await;

        let client = GeniusClient::with_http(reqwest::Client::new(), "bad".to_string(), server.uri());
        let err = client.lyrics("Hurt", None).await.unwrap_err();
        assert!(matches!(err, ToolError::Upstream { status: 401, .. }));
    }
}
