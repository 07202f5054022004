use std::sync::Arc;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use crate::clients::WebSearch;
use crate::tools::{parse_params, schema_for, Tool, ToolOutcome};

const MAX_RESULTS_CAP: usize = 10;

#[derive(Deserialize, JsonSchema)]
struct WebSearchParams {
    /// What to search the web for
    query: String,
    /// Number of results to return (1-10)
    #[serde(default)]
    max_results: Option<usize>,
}

pub struct WebSearchTool {
    search: Arc<dyn WebSearch>,
    default_results: usize,
}

impl WebSearchTool {
    pub fn new(search: Arc<dyn WebSearch>, default_results: usize) -> Self {
        Self {
            search,
            default_results: default_results.clamp(1, MAX_RESULTS_CAP),
        }
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        "web_search"
    }
    fn description(&self) -> &str {
        "Search the web with DuckDuckGo. Use it to identify a song from partial lyrics \
         or to find facts about songs and artists. Returns a list of {title, link, snippet}."
    }
    fn parameters_schema(&self) -> Value {
        schema_for::<WebSearchParams>()
    }
    async fn execute(&self, params: Value) -> ToolOutcome {
        let params: WebSearchParams = match parse_params(params) {
            Ok(p) => p,
            Err(e) => return ToolOutcome::failure(e.to_string()),
        };
        if params.query.trim().is_empty() {
            return ToolOutcome::failure("Query must not be empty");
        }

        let max_results = params
            .max_results
            .unwrap_or(self.default_results)
            .clamp(1, MAX_RESULTS_CAP);
        ToolOutcome::from_result(self.search.search(&params.query, max_results).await)
    }
}
