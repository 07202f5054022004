use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::llm::Agent;
use crate::tools::{parse_params, schema_for, Tool, ToolOutcome};

#[derive(Deserialize, JsonSchema)]
struct DelegateParams {
    /// The request to hand to the agent, in plain language
    query: String,
}

/// Exposes a whole agent as a single tool of another agent.
pub struct DelegateTool {
    name: String,
    description: String,
    agent: Arc<Agent>,
    timeout: Option<Duration>,
}

impl DelegateTool {
    pub fn new(name: impl Into<String>, description: impl Into<String>, agent: Arc<Agent>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            agent,
            timeout: None,
        }
    }

    /// Budget for a whole sub-agent run, which spans several model calls.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[async_trait]
impl Tool for DelegateTool {
    fn name(&self) -> &str {
        &self.name
    }
    fn description(&self) -> &str {
        &self.description
    }
    fn parameters_schema(&self) -> Value {
        schema_for::<DelegateParams>()
    }
    fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
    async fn execute(&self, params: Value) -> ToolOutcome {
        let params: DelegateParams = match parse_params(params) {
            Ok(p) => p,
            Err(e) => return ToolOutcome::failure(e.to_string()),
        };

        info!("Delegating to agent '{}': {}", self.agent.name(), params.query);
        match self.agent.run(&params.query).await {
            Ok(response) => ToolOutcome::success(response),
            Err(e) => {
                warn!("Agent '{}' failed: {:#}", self.agent.name(), e);
                ToolOutcome::failure(format!("Agent '{}' failed: {}", self.agent.name(), e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::{text_chunk, ScriptedModel};
    use crate::llm::ChatModel;
    use crate::tools::executor::ToolExecutor;
    use crate::tools::ToolRegistry;
    use async_openai::types::{
        ChatCompletionRequestMessage, ChatCompletionResponseStream, ChatCompletionTool,
    };
    use serde_json::json;

    struct DownModel;

    #[async_trait]
    impl ChatModel for DownModel {
        async fn stream_chat(
            &self,
            _messages: Vec<ChatCompletionRequestMessage>,
            _tools: Vec<ChatCompletionTool>,
        ) -> anyhow::Result<ChatCompletionResponseStream> {
            Err(anyhow::anyhow!("connection refused"))
        }
    }

    fn delegate(model: Arc<dyn ChatModel>) -> DelegateTool {
        let executor = ToolExecutor::new(Arc::new(ToolRegistry::new()), Duration::from_secs(5));
        let agent = Agent::new("sub", "You help.", model, executor, 3);
        DelegateTool::new("sub", "A sub-agent", Arc::new(agent))
    }

    #[tokio::test]
    async fn test_delegate_returns_sub_agent_answer() {
        let tool = delegate(Arc::new(ScriptedModel::new(vec![vec![
            text_chunk("<think>x</think>"),
            text_chunk("Done."),
        ]])));
        let outcome = tool.execute(json!({"query": "do the thing"})).await;
        assert_eq!(outcome, ToolOutcome::success("Done."));
    }

    #[tokio::test]
    async fn test_delegate_failure_is_contained() {
        let tool = delegate(Arc::new(DownModel));
        match tool.execute(json!({"query": "anything"})).await {
            ToolOutcome::Failure { reason } => assert!(reason.contains("connection refused")),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn test_delegate_schema_requires_query() {
        let tool = delegate(Arc::new(DownModel));
        assert_eq!(tool.parameters_schema()["required"], json!(["query"]));
    }

    #[tokio::test]
    async fn test_delegate_outlives_short_tool_timeout() {
        let model = ScriptedModel::new(vec![vec![text_chunk("Slow but sure.")]])
            .with_latency(Duration::from_millis(300));
        let tool: Arc<dyn Tool> =
            Arc::new(delegate(Arc::new(model)).with_timeout(Duration::from_secs(5)));
        let executor = ToolExecutor::new(
            Arc::new(ToolRegistry::from_tools(vec![tool])),
            Duration::from_millis(100),
        );

        let outcome = executor.execute_raw("sub", r#"{"query":"take your time"}"#).await;
        assert_eq!(outcome, ToolOutcome::success("Slow but sure."));
    }
}
