//! Scripted chat model for exercising agents without a server.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionResponseStream, ChatCompletionTool,
    CreateChatCompletionStreamResponse,
};
use async_trait::async_trait;
use serde_json::{json, Value};

use crate::llm::ChatModel;

/// Replays canned streamed turns in order and records, per request, the
/// message count and the declared tool names.
pub struct ScriptedModel {
    turns: Mutex<VecDeque<Vec<Value>>>,
    pub requests: Mutex<Vec<(usize, Vec<String>)>>,
    latency: Duration,
}

impl ScriptedModel {
    pub fn new(turns: Vec<Vec<Value>>) -> Self {
        Self {
            turns: Mutex::new(turns.into()),
            requests: Mutex::new(Vec::new()),
            latency: Duration::ZERO,
        }
    }

    /// Delays every reply, like a slow model server.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn message_counts(&self) -> Vec<usize> {
        self.requests.lock().unwrap().iter().map(|(n, _)| *n).collect()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn stream_chat(
        &self,
        messages: Vec<ChatCompletionRequestMessage>,
        tools: Vec<ChatCompletionTool>,
    ) -> anyhow::Result<ChatCompletionResponseStream> {
        let names = tools.into_iter().map(|t| t.function.name).collect();
        self.requests.lock().unwrap().push((messages.len(), names));
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let turn = self
            .turns
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| anyhow::anyhow!("script exhausted"))?;
        let chunks = turn
            .into_iter()
            .map(serde_json::from_value::<CreateChatCompletionStreamResponse>)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Box::pin(futures::stream::iter(chunks.into_iter().map(Ok))))
    }
}

fn chunk(delta: Value) -> Value {
    json!({
        "id": "chunk",
        "object": "chat.completion.chunk",
        "created": 0,
        "model": "scripted",
        "choices": [{ "index": 0, "delta": delta }]
    })
}

pub fn text_chunk(text: &str) -> Value {
    chunk(json!({ "content": text }))
}

pub fn tool_chunk(index: u32, id: Option<&str>, name: Option<&str>, arguments: &str) -> Value {
    chunk(json!({
        "tool_calls": [{
            "index": index,
            "id": id,
            "type": "function",
            "function": { "name": name, "arguments": arguments }
        }]
    }))
}
