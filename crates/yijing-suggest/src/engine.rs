use llm::builder::{LLMBackend, LLMBuilder};
use llm::chat::ChatMessage;
use thiserror::Error;

use yijing_core::AiSettings;

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("AI is not configured")]
    NotConfigured,
    #[error("unknown provider: {0}")]
    UnknownProvider(String),
    #[error("build LLM: {0}")]
    Build(String),
    #[error("chat: {0}")]
    Chat(String),
    #[error("LLM returned empty text")]
    Empty,
    #[error("LLM returned no text")]
    NoText,
}

fn map_backend(provider: &str) -> Result<LLMBackend, GenerateError> {
    match provider {
        "openai" => Ok(LLMBackend::OpenAI),
        "anthropic" => Ok(LLMBackend::Anthropic),
        "google" => Ok(LLMBackend::Google),
        "ollama" => Ok(LLMBackend::Ollama),
        "groq" => Ok(LLMBackend::Groq),
        "mistral" => Ok(LLMBackend::Mistral),
        "deepseek" => Ok(LLMBackend::DeepSeek),
        other => Err(GenerateError::UnknownProvider(other.to_string())),
    }
}

/// Output limits for one completion.
#[derive(Debug, Clone, Copy)]
pub struct Budget {
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for Budget {
    fn default() -> Self {
        Self {
            max_tokens: 1000,
            temperature: 0.7,
        }
    }
}

pub async fn generate(
    settings: &AiSettings,
    system: &str,
    user_msg: &str,
    budget: Budget,
) -> Result<String, GenerateError> {
    if !yijing_core::ai_configured(settings) {
        return Err(GenerateError::NotConfigured);
    }
    let backend = map_backend(&settings.provider)?;

    let mut builder = LLMBuilder::new()
        .backend(backend)
        .model(&settings.model)
        .system(system)
        .max_tokens(budget.max_tokens)
        .temperature(budget.temperature);

    if !settings.api_key.is_empty() {
        builder = builder.api_key(&settings.api_key);
    }

    let llm = builder.build().map_err(|e| GenerateError::Build(e.to_string()))?;

    let messages = vec![ChatMessage::user().content(user_msg).build()];

    tracing::debug!(
        provider = %settings.provider,
        model = %settings.model,
        prompt_len = user_msg.len(),
        "sending chat request"
    );
    let response = llm
        .chat(&messages)
        .await
        .map_err(|e| GenerateError::Chat(e.to_string()))?;

    match response.text() {
        Some(text) if !text.trim().is_empty() => Ok(text),
        Some(_) => Err(GenerateError::Empty),
        None => Err(GenerateError::NoText),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_known_providers() {
        assert!(matches!(map_backend("openai"), Ok(LLMBackend::OpenAI)));
        assert!(matches!(map_backend("ollama"), Ok(LLMBackend::Ollama)));
        assert!(matches!(
            map_backend("cohere"),
            Err(GenerateError::UnknownProvider(p)) if p == "cohere"
        ));
    }

    #[tokio::test]
    async fn refuses_without_configuration() {
        let err = generate(&AiSettings::default(), "sys", "msg", Budget::default())
            .await
            .unwrap_err();
        assert!(matches!(err, GenerateError::NotConfigured));
    }
}
