use std::collections::BTreeMap;
use std::sync::Arc;

use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessageArgs,
    ChatCompletionToolType, FunctionCall,
};
use futures::{Stream, StreamExt};
use serde_json::Value;

use crate::llm::client::ChatModel;
use crate::tools::executor::ToolExecutor;

/// What an agent run reports, in the order it happens.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentEvent {
    /// A fragment of model output text.
    Text(String),
    /// The model asked for a tool; emitted before the tool runs.
    ToolUse { name: String, input: Value },
    ToolResult { name: String, success: bool },
    /// Final answer with reasoning blocks removed.
    Finished { response: String },
}

/// Tool call reassembled from streamed fragments.
#[derive(Debug, Default)]
struct PendingCall {
    id: String,
    name: String,
    arguments: String,
}

pub struct Agent {
    name: String,
    system_prompt: String,
    model: Arc<dyn ChatModel>,
    executor: ToolExecutor,
    max_iterations: usize,
}

impl Agent {
    pub fn new(
        name: impl Into<String>,
        system_prompt: impl Into<String>,
        model: Arc<dyn ChatModel>,
        executor: ToolExecutor,
        max_iterations: usize,
    ) -> Self {
        Self {
            name: name.into(),
            system_prompt: system_prompt.into(),
            model,
            executor,
            max_iterations,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.executor.registry().names()
    }

    /// Runs the tool-calling loop for `query`, yielding events as the model
    /// streams them.
    pub fn stream<'a>(
        &'a self,
        query: &str,
    ) -> impl Stream<Item = anyhow::Result<AgentEvent>> + Send + 'a {
        let query = query.to_string();

        async_stream::try_stream! {
            let system = ChatCompletionRequestSystemMessageArgs::default()
                .content(self.system_prompt.clone())
                .build()?;
            let user = ChatCompletionRequestUserMessageArgs::default()
                .content(query)
                .build()?;
            let mut messages: Vec<ChatCompletionRequestMessage> = vec![system.into(), user.into()];
            let tool_definitions = self.executor.registry().definitions();

            for i in 0..self.max_iterations {
                tracing::info!("Agent '{}' iteration {}/{}", self.name, i + 1, self.max_iterations);

                let mut stream = self
                    .model
                    .stream_chat(messages.clone(), tool_definitions.clone())
                    .await?;

                let mut content = String::new();
                let mut calls: BTreeMap<u32, PendingCall> = BTreeMap::new();

                while let Some(chunk) = stream.next().await {
                    let chunk = chunk?;
                    for choice in chunk.choices {
                        if let Some(text) = choice.delta.content {
                            if !text.is_empty() {
                                content.push_str(&text);
                                yield AgentEvent::Text(text);
                            }
                        }
                        for fragment in choice.delta.tool_calls.unwrap_or_default() {
                            let call = calls.entry(fragment.index).or_default();
                            if let Some(id) = fragment.id {
                                call.id = id;
                            }
                            if let Some(function) = fragment.function {
                                if let Some(name) = function.name {
                                    call.name.push_str(&name);
                                }
                                if let Some(arguments) = function.arguments {
                                    call.arguments.push_str(&arguments);
                                }
                            }
                        }
                    }
                }

                if calls.is_empty() {
                    tracing::info!("Agent '{}' completed after {} iterations", self.name, i + 1);
                    yield AgentEvent::Finished { response: strip_reasoning(&content) };
                    return;
                }

                let tool_calls: Vec<ChatCompletionMessageToolCall> = calls
                    .into_iter()
                    .map(|(index, call)| ChatCompletionMessageToolCall {
                        id: if call.id.is_empty() { format!("call_{}", index) } else { call.id },
                        r#type: ChatCompletionToolType::Function,
                        function: FunctionCall {
                            name: call.name,
                            arguments: call.arguments,
                        },
                    })
                    .collect();
                tracing::info!("Agent '{}': LLM requested {} tool calls", self.name, tool_calls.len());

                let mut assistant = ChatCompletionRequestAssistantMessageArgs::default();
                assistant.tool_calls(tool_calls.clone());
                if !content.is_empty() {
                    assistant.content(content);
                }
                messages.push(assistant.build()?.into());

                for tool_call in tool_calls {
                    let name = tool_call.function.name;
                    let arguments = tool_call.function.arguments;
                    let input = ToolExecutor::parse_arguments(&arguments)
                        .unwrap_or_else(|_| Value::String(arguments.clone()));
                    yield AgentEvent::ToolUse { name: name.clone(), input };

                    let outcome = self.executor.execute_raw(&name, &arguments).await;
                    yield AgentEvent::ToolResult { name: name.clone(), success: outcome.is_success() };

                    messages.push(
                        ChatCompletionRequestToolMessageArgs::default()
                            .tool_call_id(tool_call.id)
                            .content(outcome.to_message())
                            .build()?
                            .into(),
                    );
                }
                // Continue the loop to let the LLM see the results
            }

            tracing::warn!(
                "Agent '{}' exceeded max iterations ({}) - potential runaway loop or recursive tool calls",
                self.name,
                self.max_iterations
            );
            Err::<(), _>(anyhow::anyhow!(
                "Agent '{}' reached its reasoning limit ({} steps) without a final answer",
                self.name,
                self.max_iterations
            ))?;
        }
    }

    /// Runs to completion and returns only the final answer.
    pub async fn run(&self, query: &str) -> anyhow::Result<String> {
        let stream = self.stream(query);
        futures::pin_mut!(stream);

        while let Some(event) = stream.next().await {
            if let AgentEvent::Finished { response } = event? {
                return Ok(response);
            }
        }
        Err(anyhow::anyhow!("Agent '{}' ended without a response", self.name))
    }
}

/// Drops `<think>...</think>` blocks emitted by reasoning models.
pub fn strip_reasoning(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find("<think>") {
        out.push_str(&rest[..start]);
        match rest[start..].find("</think>") {
            Some(end) => rest = &rest[start + end + "</think>".len()..],
            // Unterminated block: the model never left its reasoning.
            None => {
                rest = "";
                break;
            }
        }
    }
    out.push_str(rest);
    out.trim().to_string()
}
