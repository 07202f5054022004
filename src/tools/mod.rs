use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_openai::types::{ChatCompletionTool, ChatCompletionToolType, FunctionObject};
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::ToolError;

pub mod builtin;
pub mod executor;

/// A named capability the model can invoke.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn parameters_schema(&self) -> Value;
    async fn execute(&self, params: Value) -> ToolOutcome;

    /// Replaces the executor's timeout for tools that run longer by nature.
    fn timeout(&self) -> Option<Duration> {
        None
    }
}

/// What every tool hands back to the model: a value, or the reason it
/// could not produce one.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ToolOutcome {
    Success { value: Value },
    Failure { reason: String },
}

impl ToolOutcome {
    pub fn success<T: Serialize>(value: T) -> Self {
        match serde_json::to_value(value) {
            Ok(value) => ToolOutcome::Success { value },
            Err(e) => ToolOutcome::failure(format!("Failed to serialize tool output: {}", e)),
        }
    }

    pub fn failure(reason: impl Into<String>) -> Self {
        ToolOutcome::Failure {
            reason: reason.into(),
        }
    }

    pub fn from_result<T: Serialize>(result: Result<T, ToolError>) -> Self {
        match result {
            Ok(value) => ToolOutcome::success(value),
            Err(e) => ToolOutcome::failure(e.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ToolOutcome::Success { .. })
    }

    /// Rendering used for the tool message sent back to the model.
    pub fn to_message(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| match self {
            ToolOutcome::Success { value } => value.to_string(),
            ToolOutcome::Failure { reason } => reason.clone(),
        })
    }
}

/// Deserializes tool arguments into their typed form.
pub fn parse_params<T: DeserializeOwned>(params: Value) -> Result<T, ToolError> {
    Ok(serde_json::from_value(params)?)
}

/// JSON schema for a parameter struct, as advertised to the model.
pub fn schema_for<T: JsonSchema>() -> Value {
    let schema = schemars::schema_for!(T);
    serde_json::to_value(schema).unwrap_or_else(|_| serde_json::json!({"type": "object"}))
}

pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    pub fn from_tools(tools: Vec<Arc<dyn Tool>>) -> Self {
        let mut registry = Self::new();
        for tool in tools {
            registry.register(tool);
        }
        registry
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    /// Function declarations for the chat request, sorted by name so the
    /// prompt is stable between runs.
    pub fn definitions(&self) -> Vec<ChatCompletionTool> {
        let mut tools: Vec<&Arc<dyn Tool>> = self.tools.values().collect();
        tools.sort_by(|a, b| a.name().cmp(b.name()));
        tools
            .into_iter()
            .map(|tool| ChatCompletionTool {
                r#type: ChatCompletionToolType::Function,
                function: FunctionObject {
                    name: tool.name().to_string(),
                    description: Some(tool.description().to_string()),
                    parameters: Some(tool.parameters_schema()),
                    strict: None,
                },
            })
            .collect()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct NamedTool(&'static str);

    #[async_trait]
    impl Tool for NamedTool {
        fn name(&self) -> &str {
            self.0
        }
        fn description(&self) -> &str {
            "test tool"
        }
        fn parameters_schema(&self) -> Value {
            json!({"type": "object", "properties": {}})
        }
        async fn execute(&self, _params: Value) -> ToolOutcome {
            ToolOutcome::success(self.0)
        }
    }

    #[test]
    fn test_registry_definitions_sorted() {
        let registry = ToolRegistry::from_tools(vec![
            Arc::new(NamedTool("web_search")),
            Arc::new(NamedTool("genius_lyrics")),
        ]);

        let defs = registry.definitions();
        assert_eq!(defs.len(), 2);
        assert_eq!(defs[0].function.name, "genius_lyrics");
        assert_eq!(defs[1].function.name, "web_search");
        assert!(registry.get("web_search").is_some());
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn test_outcome_serialization() {
        let ok = ToolOutcome::success(vec![1, 2]);
        assert_eq!(
            serde_json::to_value(&ok).unwrap(),
            json!({"status": "success", "value": [1, 2]})
        );

        let failed = ToolOutcome::from_result::<bool>(Err(ToolError::Config("nope".into())));
        assert!(!failed.is_success());
        assert_eq!(
            serde_json::from_str::<Value>(&failed.to_message()).unwrap(),
            json!({"status": "failure", "reason": "Configuration error: nope"})
        );
    }
}
