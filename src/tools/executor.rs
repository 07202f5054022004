use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::ToolError;
use crate::tools::{ToolOutcome, ToolRegistry};

/// Runs model-requested tool calls. Whatever goes wrong ends up as a
/// [`ToolOutcome::Failure`] so the model can react to it.
pub struct ToolExecutor {
    registry: Arc<ToolRegistry>,
    timeout: Duration,
}

impl ToolExecutor {
    pub fn new(registry: Arc<ToolRegistry>, timeout: Duration) -> Self {
        Self { registry, timeout }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Parses the raw argument string the model produced.
    pub fn parse_arguments(arguments: &str) -> Result<Value, serde_json::Error> {
        if arguments.trim().is_empty() {
            return Ok(Value::Object(Default::default()));
        }
        serde_json::from_str(arguments)
    }

    pub async fn execute(&self, name: &str, params: Value) -> ToolOutcome {
        let Some(tool) = self.registry.get(name) else {
            warn!("Tool not found: {}", name);
            return ToolOutcome::failure(format!(
                "Tool not found: {}. Available tools: {}",
                name,
                self.registry.names().join(", ")
            ));
        };

        let timeout = tool.timeout().unwrap_or(self.timeout);
        info!("Executing tool: {} with arguments: {}", name, params);
        let outcome = match tokio::time::timeout(timeout, tool.execute(params)).await {
            Ok(outcome) => outcome,
            Err(_) => ToolOutcome::failure(ToolError::Timeout(timeout.as_secs()).to_string()),
        };

        match &outcome {
            ToolOutcome::Success { value } => debug!("Tool {} returned: {}", name, value),
            ToolOutcome::Failure { reason } => warn!("Tool {} failed: {}", name, reason),
        }
        outcome
    }

    pub async fn execute_raw(&self, name: &str, arguments: &str) -> ToolOutcome {
        match Self::parse_arguments(arguments) {
            Ok(params) => self.execute(name, params).await,
            Err(e) => {
                warn!("Tool {} got malformed arguments '{}': {}", name, arguments, e);
                ToolOutcome::failure(format!("Arguments are not valid JSON: {}", e))
            }
        }
    }
}
