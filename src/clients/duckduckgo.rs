use std::time::Duration;

use async_trait::async_trait;
use scraper::{Html, Selector};
use tracing::debug;

use crate::clients::entities::WebResult;
use crate::config::Config;
use crate::error::{Result, ToolError};

// The HTML endpoint rejects requests without a browser-like agent.
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";

#[async_trait]
pub trait WebSearch: Send + Sync {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<WebResult>>;
}

pub struct DuckDuckGoClient {
    http: reqwest::Client,
    endpoint: String,
}

impl DuckDuckGoClient {
    pub fn new(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self::with_http(http, config.duckduckgo_url.clone()))
    }

    pub fn with_http(http: reqwest::Client, endpoint: String) -> Self {
        Self { http, endpoint }
    }
}

#[async_trait]
impl WebSearch for DuckDuckGoClient {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<WebResult>> {
        debug!("DuckDuckGo: searching for '{}'", query);
        let response = self
            .http
            .post(&self.endpoint)
            .form(&[("q", query)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ToolError::Upstream {
                status: status.as_u16(),
                message: "DuckDuckGo search failed".to_string(),
            });
        }

        let html = response.text().await?;
        let mut results = parse_results(&html);
        results.truncate(max_results);
        debug!("DuckDuckGo: {} results for '{}'", results.len(), query);
        Ok(results)
    }
}

/// Organic results from the DuckDuckGo HTML page, in page order.
pub fn parse_results(html: &str) -> Vec<WebResult> {
    let document = Html::parse_document(html);
    let (Ok(result_sel), Ok(title_sel), Ok(snippet_sel)) = (
        Selector::parse("div.result"),
        Selector::parse("a.result__a"),
        Selector::parse(".result__snippet"),
    ) else {
        return Vec::new();
    };

    document
        .select(&result_sel)
        .filter(|r| !r.value().classes().any(|c| c == "result--ad"))
        .filter_map(|r| {
            let anchor = r.select(&title_sel).next()?;
            let title = collapse_whitespace(&anchor.text().collect::<String>());
            let link = resolve_link(anchor.value().attr("href")?)?;
            let snippet = r
                .select(&snippet_sel)
                .next()
                .map(|s| collapse_whitespace(&s.text().collect::<String>()))
                .unwrap_or_default();
            Some(WebResult {
                title,
                link,
                snippet,
            })
        })
        .collect()
}

/// Unwraps DuckDuckGo's `/l/?uddg=<target>` redirect links.
fn resolve_link(href: &str) -> Option<String> {
    let absolute = if href.starts_with("//") {
        format!("https:{}", href)
    } else if href.starts_with('/') {
        format!("https://duckduckgo.com{}", href)
    } else {
        href.to_string()
    };

    let url = url::Url::parse(&absolute).ok()?;
    if url.path() == "/l/" {
        return url
            .query_pairs()
            .find(|(k, _)| k == "uddg")
            .map(|(_, v)| v.into_owned());
    }
    Some(url.to_string())
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
