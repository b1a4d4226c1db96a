//! OpenAiBrain implementation using the OpenAI chat completions API.

use reqwest::Client;
use tracing::{debug, warn};

use crate::api_types::{ApiError, ChatCompletionRequest, ChatCompletionResponse, ChatMessage};
use crate::config::OpenAiBrainConfig;
use crate::error::BrainError;

/// Generates nudge text via the OpenAI API.
///
/// The brain is stateless: the caller supplies the instructions and the
/// conversation history with every request, and owns persisting whatever
/// comes back. One call, one completion.
pub struct OpenAiBrain {
    client: Client,
    config: OpenAiBrainConfig,
}

impl OpenAiBrain {
    /// Create a new OpenAiBrain with the given configuration.
    pub fn new(config: OpenAiBrainConfig) -> Result<Self, BrainError> {
        let client = Client::builder().build().map_err(|e| {
            BrainError::Configuration(format!("Failed to create HTTP client: {}", e))
        })?;

        tracing::info!("OpenAiBrain initialized with model: {}", config.model);

        Ok(Self { client, config })
    }

    /// Create an OpenAiBrain from environment variables.
    ///
    /// See [`OpenAiBrainConfig::from_env`] for the variables involved.
    pub fn from_env() -> Result<Self, BrainError> {
        let config = OpenAiBrainConfig::from_env()?;
        Self::new(config)
    }

    /// Get the configuration.
    pub fn config(&self) -> &OpenAiBrainConfig {
        &self.config
    }

    /// Generate one reply from instructions, prior history, and a prompt.
    ///
    /// `instructions` become the system message (with the configured extra
    /// system prompt appended, if any); `history` is replayed in order; the
    /// `prompt` goes last as a user message.
    pub async fn generate(
        &self,
        instructions: &str,
        history: &[ChatMessage],
        prompt: &str,
    ) -> Result<String, BrainError> {
        let messages = self.build_messages(instructions, history, prompt);
        let completion = self.chat_completion(messages).await?;

        let text = completion
            .choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .map(str::to_string)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                BrainError::GenerationFailed("no output text in completion".to_string())
            })?;

        if let Some(usage) = completion.usage {
            debug!(
                "Token usage - prompt: {}, completion: {}, total: {}",
                usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
            );
        }

        Ok(text)
    }

    fn build_messages(
        &self,
        instructions: &str,
        history: &[ChatMessage],
        prompt: &str,
    ) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(history.len() + 2);

        let system = match &self.config.system_prompt {
            Some(extra) => format!("{instructions}\n\n{extra}"),
            None => instructions.to_string(),
        };
        messages.push(ChatMessage::system(system));
        messages.extend_from_slice(history);
        messages.push(ChatMessage::user(prompt));

        messages
    }

    /// Make a chat completion request to the OpenAI API.
    async fn chat_completion(
        &self,
        messages: Vec<ChatMessage>,
    ) -> Result<ChatCompletionResponse, BrainError> {
        let url = format!("{}/v1/chat/completions", self.config.api_url);

        let request = ChatCompletionRequest {
            model: self.config.model.clone(),
            messages,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        debug!("Sending request to OpenAI API: {:?}", request);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| BrainError::Network(format!("Failed to send request: {}", e)))?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();

            // Try to parse as API error
            if let Ok(api_error) = serde_json::from_str::<ApiError>(&error_text) {
                return Err(BrainError::GenerationFailed(format!(
                    "API error ({}): {}",
                    status.as_u16(),
                    api_error.error.message
                )));
            }

            return Err(BrainError::GenerationFailed(format!(
                "API error ({}): {}",
                status.as_u16(),
                error_text
            )));
        }

        let completion: ChatCompletionResponse = response.json().await.map_err(|e| {
            warn!("Failed to parse completion: {}", e);
            BrainError::GenerationFailed(format!("Failed to parse response: {}", e))
        })?;

        debug!("Received response from OpenAI API: {:?}", completion);

        Ok(completion)
    }
}
