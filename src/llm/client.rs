use std::time::Duration;

use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionResponseStream, ChatCompletionTool,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;

use crate::config::Config;

/// A streaming chat-completion backend with tool calling.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn stream_chat(
        &self,
        messages: Vec<ChatCompletionRequestMessage>,
        tools: Vec<ChatCompletionTool>,
    ) -> anyhow::Result<ChatCompletionResponseStream>;
}

pub struct LlmClient {
    chat_client: Client<OpenAIConfig>,
    chat_model: String,
}

impl LlmClient {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let mut chat_config = OpenAIConfig::new().with_api_base(&config.llm_url);

        // Local servers ignore the key but the client insists on one.
        if let Some(key) = &config.llm_api_key {
            chat_config = chat_config.with_api_key(key);
        } else {
            chat_config = chat_config.with_api_key("unused");
        }

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.llm_timeout_secs))
            .build()?;

        Ok(Self {
            chat_client: Client::with_config(chat_config).with_http_client(http_client),
            chat_model: config.llm_model.clone(),
        })
    }
}

#[async_trait]
impl ChatModel for LlmClient {
    async fn stream_chat(
        &self,
        messages: Vec<ChatCompletionRequestMessage>,
        tools: Vec<ChatCompletionTool>,
    ) -> anyhow::Result<ChatCompletionResponseStream> {
        let mut request = CreateChatCompletionRequestArgs::default();
        request.model(&self.chat_model).messages(messages);
        // Some OpenAI-compatible servers reject an empty tool list.
        if !tools.is_empty() {
            request.tools(tools);
        }
        let request = request.build()?;

        let stream = self.chat_client.chat().create_stream(request).await?;
        Ok(stream)
    }
}
