use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;

#[derive(Clone)]
pub struct SpotifyConfig {
    pub client_id: String,
    pub client_secret: String,
    pub username: Option<String>,
    pub redirect_url: String,
    pub token_cache: PathBuf,
    pub api_base: String,
    pub accounts_base: String,
}

#[derive(Clone)]
pub struct Config {
    pub llm_url: String,
    pub llm_model: String,
    pub llm_api_key: Option<String>,
    pub llm_timeout_secs: u64,
    pub agent_max_iterations: usize,
    pub tool_timeout_secs: u64,
    pub http_timeout_secs: u64,
    pub search_limit: u32,
    /// `Err` carries the reason Spotify is unavailable.
    pub spotify: std::result::Result<SpotifyConfig, String>,
    pub genius_access_token: Option<String>,
    pub genius_api_base: String,
    pub duckduckgo_url: String,
}

pub const DEFAULT_SPOTIFY_REDIRECT_URL: &str = "http://127.0.0.1:8888/callback";
// Both base URLs end in a slash; endpoint paths are appended to them.
pub const SPOTIFY_API_BASE: &str = "https://api.spotify.com/v1/";
pub const SPOTIFY_ACCOUNTS_BASE: &str = "https://accounts.spotify.com/";
pub const GENIUS_API_BASE: &str = "https://api.genius.com";
pub const DUCKDUCKGO_HTML_URL: &str = "https://html.duckduckgo.com/html/";

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok();
        Ok(Self::build())
    }

    /// Upper bound for one full sub-agent run: every step may spend a model
    /// call plus a tool call.
    pub fn delegate_timeout_secs(&self) -> u64 {
        let steps = self.agent_max_iterations.max(1) as u64;
        steps.saturating_mul(self.llm_timeout_secs.saturating_add(self.tool_timeout_secs))
    }

    fn build() -> Self {
        Config {
            llm_url: env::var("LLM_URL")
                .unwrap_or_else(|_| "http://localhost:11434/v1".to_string()),
            llm_model: env::var("LLM_MODEL").unwrap_or_else(|_| "qwen3:1.7b".to_string()),
            llm_api_key: env::var("LLM_API_KEY").ok(),
            llm_timeout_secs: env::var("LLM_TIMEOUT_SECS")
                .unwrap_or_else(|_| "120".to_string())
                .parse()
                .unwrap_or(120),
            agent_max_iterations: env::var("AGENT_MAX_ITERATIONS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .unwrap_or(10),
            tool_timeout_secs: env::var("TOOL_TIMEOUT_SECS")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .unwrap_or(60),
            http_timeout_secs: env::var("HTTP_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .unwrap_or(30),
            search_limit: env::var("SEARCH_RESULT_LIMIT")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .unwrap_or(5),
            spotify: Self::load_spotify(),
            genius_access_token: env::var("GENIUS_ACCESS_TOKEN").ok(),
            genius_api_base: GENIUS_API_BASE.to_string(),
            duckduckgo_url: DUCKDUCKGO_HTML_URL.to_string(),
        }
    }

    /// Spotify credentials are optional as a group. A missing or half pair
    /// disables Spotify without stopping the rest of the app.
    fn load_spotify() -> std::result::Result<SpotifyConfig, String> {
        let client_id = env::var("SPOTIFY_CLIENT_ID").ok();
        let client_secret = env::var("SPOTIFY_CLIENT_SECRET").ok();

        let (client_id, client_secret) = match (client_id, client_secret) {
            (Some(id), Some(secret)) => (id, secret),
            (None, None) => {
                return Err(
                    "SPOTIFY_CLIENT_ID and SPOTIFY_CLIENT_SECRET must be set".to_string(),
                )
            }
            (Some(_), None) => {
                tracing::warn!("SPOTIFY_CLIENT_ID is set without SPOTIFY_CLIENT_SECRET");
                return Err(
                    "SPOTIFY_CLIENT_SECRET must be set together with SPOTIFY_CLIENT_ID"
                        .to_string(),
                );
            }
            (None, Some(_)) => {
                tracing::warn!("SPOTIFY_CLIENT_SECRET is set without SPOTIFY_CLIENT_ID");
                return Err(
                    "SPOTIFY_CLIENT_ID must be set together with SPOTIFY_CLIENT_SECRET"
                        .to_string(),
                );
            }
        };

        let username = env::var("SPOTIFY_USERNAME").ok();
        let token_cache = env::var("SPOTIFY_TOKEN_CACHE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_token_cache(username.as_deref()));

        Ok(SpotifyConfig {
            client_id,
            client_secret,
            username,
            redirect_url: env::var("SPOTIFY_REDIRECT_URL")
                .unwrap_or_else(|_| DEFAULT_SPOTIFY_REDIRECT_URL.to_string()),
            token_cache,
            api_base: SPOTIFY_API_BASE.to_string(),
            accounts_base: SPOTIFY_ACCOUNTS_BASE.to_string(),
        })
    }
}

fn default_token_cache(username: Option<&str>) -> PathBuf {
    let file = match username {
        Some(name) => format!("spotify_token_{}.json", name),
        None => "spotify_token.json".to_string(),
    };
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("maestro")
        .join(file)
}

impl std::fmt::Debug for SpotifyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpotifyConfig")
            .field("client_id", &"[REDACTED]")
            .field("client_secret", &"[REDACTED]")
            .field("username", &self.username)
            .field("redirect_url", &self.redirect_url)
            .field("token_cache", &self.token_cache)
            .field("api_base", &self.api_base)
            .field("accounts_base", &self.accounts_base)
            .finish()
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("llm_url", &self.llm_url)
            .field("llm_model", &self.llm_model)
            .field("llm_api_key", &self.llm_api_key.as_ref().map(|_| "[REDACTED]"))
            .field("llm_timeout_secs", &self.llm_timeout_secs)
            .field("agent_max_iterations", &self.agent_max_iterations)
            .field("tool_timeout_secs", &self.tool_timeout_secs)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field("search_limit", &self.search_limit)
            .field("spotify", &self.spotify)
            .field(
                "genius_access_token",
                &self.genius_access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("genius_api_base", &self.genius_api_base)
            .field("duckduckgo_url", &self.duckduckgo_url)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_config_logic() {
        // Env is process-global, so all env-mutating checks live in one test.
        env::remove_var("SPOTIFY_CLIENT_ID");
        env::remove_var("SPOTIFY_CLIENT_SECRET");
        env::remove_var("LLM_MODEL");
        env::remove_var("SEARCH_RESULT_LIMIT");

        // 1. Defaults
        let config = Config::build();
        assert_eq!(config.llm_model, "qwen3:1.7b");
        assert_eq!(config.search_limit, 5);
        assert!(config.spotify.is_err());

        // 2. Half a credential pair disables Spotify and keeps the reason
        env::set_var("SPOTIFY_CLIENT_ID", "client_id_value");
        let config = Config::build();
        let reason = config.spotify.as_ref().unwrap_err();
        assert!(reason.contains("SPOTIFY_CLIENT_SECRET"));
        assert_eq!(config.llm_model, "qwen3:1.7b");

        // 3. Full pair, username drives the cache file name
        env::set_var("SPOTIFY_CLIENT_SECRET", "client_secret_value");
        env::set_var("SPOTIFY_USERNAME", "alice");
        env::remove_var("SPOTIFY_TOKEN_CACHE");
        let config = Config::build();
        let spotify = config.spotify.as_ref().unwrap();
        assert_eq!(spotify.redirect_url, DEFAULT_SPOTIFY_REDIRECT_URL);
        assert!(spotify
            .token_cache
            .to_string_lossy()
            .ends_with("spotify_token_alice.json"));

        // 4. Bad numbers fall back to defaults
        env::set_var("SEARCH_RESULT_LIMIT", "lots");
        assert_eq!(Config::build().search_limit, 5);

        // 5. Debug redaction
        env::set_var("GENIUS_ACCESS_TOKEN", "genius_secret");
        let debug_output = format!("{:?}", Config::build());
        assert!(!debug_output.contains("client_secret_value"));
        assert!(!debug_output.contains("client_id_value"));
        assert!(!debug_output.contains("genius_secret"));
        assert!(debug_output.contains("[REDACTED]"));

        // 6. Delegates get a budget for a whole sub-agent run
        let mut config = Config::build();
        config.llm_timeout_secs = 5;
        config.tool_timeout_secs = 1;
        config.agent_max_iterations = 3;
        assert_eq!(config.delegate_timeout_secs(), 18);

        // Cleanup
        env::remove_var("SPOTIFY_CLIENT_ID");
        env::remove_var("SPOTIFY_CLIENT_SECRET");
        env::remove_var("SPOTIFY_USERNAME");
        env::remove_var("SEARCH_RESULT_LIMIT");
        env::remove_var("GENIUS_ACCESS_TOKEN");
    }
}
