//! Chat collaborator interface: one synchronous call that turns an
//! ordered list of role-tagged messages into response text, plus the
//! OpenRouter-backed implementation and the retry combinator around it.

use crate::error::{Error, Result};

const OPENROUTER_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

pub const DEFAULT_MODEL: &str = "anthropic/claude-3.5-sonnet";
const DEFAULT_MAX_TOKENS: u32 = 1920;
const DEFAULT_TEMPERATURE: f32 = 0.08;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    System,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> ChatMessage {
        ChatMessage { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> ChatMessage {
        ChatMessage { role: Role::User, content: content.into() }
    }
}

/// The external text-generation collaborator.
///
/// Provider-reported failures surface as `Error::Provider` so the caller
/// can tell them apart from content that merely fails to parse.
pub trait ChatClient {
    fn chat(&self, messages: &[ChatMessage]) -> Result<String>;
}

/// Blocking OpenRouter chat-completions client.
pub struct OpenRouterClient {
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl OpenRouterClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> OpenRouterClient {
        OpenRouterClient {
            api_key: api_key.into(),
            model: model.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> OpenRouterClient {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> OpenRouterClient {
        self.temperature = temperature;
        self
    }
}

impl ChatClient for OpenRouterClient {
    fn chat(&self, messages: &[ChatMessage]) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": messages
                .iter()
                .map(|m| serde_json::json!({"role": m.role.as_str(), "content": m.content}))
                .collect::<Vec<_>>(),
            "max_tokens": self.max_tokens,
            "temperature": self.temperature,
        });

        let response: serde_json::Value = ureq::post(OPENROUTER_URL)
            .header("Authorization", &format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .send_json(&body)
            .map_err(|e| Error::Provider(format!("request failed: {e}")))?
            .body_mut()
            .read_json()
            .map_err(|e| Error::Provider(format!("unreadable response: {e}")))?;

        extract_content(&response)
    }
}

/// Pull the message text out of a chat-completions response body.
///
/// An `error` object at the top level or inside a choice is a provider
/// failure even when the HTTP status was 200.
fn extract_content(response: &serde_json::Value) -> Result<String> {
    if let Some(err) = response.get("error").filter(|e| !e.is_null()) {
        return Err(Error::Provider(err.to_string()));
    }
    let choices = response["choices"]
        .as_array()
        .ok_or_else(|| Error::Provider("response has no choices".to_string()))?;
    for choice in choices {
        if let Some(err) = choice.get("error").filter(|e| !e.is_null()) {
            return Err(Error::Provider(err.to_string()));
        }
    }
    choices
        .first()
        .and_then(|c| c["message"]["content"].as_str())
        .map(str::to_string)
        .ok_or_else(|| Error::Provider("response message is empty".to_string()))
}

/// Retry a fallible operation a bounded number of times.
///
/// Only retryable kinds (provider failures and response-format failures)
/// are re-attempted; anything else propagates immediately, and the last
/// error is returned when the budget runs out.
pub fn with_retry<T>(attempts: u32, mut call: impl FnMut() -> Result<T>) -> Result<T> {
    let mut last_err = None;
    for _ in 0..attempts.max(1) {
        match call() {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() => last_err = Some(e),
            Err(e) => return Err(e),
        }
    }
    Err(last_err.expect("at least one attempt"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct ScriptedClient {
        responses: RefCell<Vec<Result<String>>>,
        calls: RefCell<u32>,
    }

    impl ScriptedClient {
        fn new(responses: Vec<Result<String>>) -> ScriptedClient {
            ScriptedClient {
                responses: RefCell::new(responses),
                calls: RefCell::new(0),
            }
        }
    }

    impl ChatClient for ScriptedClient {
        fn chat(&self, _messages: &[ChatMessage]) -> Result<String> {
            *self.calls.borrow_mut() += 1;
            self.responses.borrow_mut().remove(0)
        }
    }

    #[test]
    fn test_retry_recovers_from_provider_error() {
        let client = ScriptedClient::new(vec![
            Err(Error::Provider("overloaded".into())),
            Ok("hello".into()),
        ]);
        let out = with_retry(3, || client.chat(&[])).unwrap();
        assert_eq!(out, "hello");
        assert_eq!(*client.calls.borrow(), 2);
    }

    #[test]
    fn test_retry_exhaustion_returns_last_error() {
        let client = ScriptedClient::new(vec![
            Err(Error::Provider("a".into())),
            Err(Error::Provider("b".into())),
            Err(Error::Provider("c".into())),
        ]);
        let err = with_retry(3, || client.chat(&[])).unwrap_err();
        assert!(matches!(err, Error::Provider(msg) if msg == "c"));
    }

    #[test]
    fn test_non_retryable_fails_immediately() {
        let client = ScriptedClient::new(vec![
            Err(Error::Segmentation("fatal".into())),
            Ok("never".into()),
        ]);
        let err = with_retry(3, || client.chat(&[])).unwrap_err();
        assert!(matches!(err, Error::Segmentation(_)));
        assert_eq!(*client.calls.borrow(), 1);
    }

    #[test]
    fn test_extract_content_happy_path() {
        let response = serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": "text"}}]
        });
        assert_eq!(extract_content(&response).unwrap(), "text");
    }

    #[test]
    fn test_extract_content_choice_error() {
        let response = serde_json::json!({
            "choices": [{"error": {"message": "upstream blew up"}}]
        });
        let err = extract_content(&response).unwrap_err();
        assert!(matches!(err, Error::Provider(_)));
    }

    #[test]
    fn test_extract_content_top_level_error() {
        let response = serde_json::json!({"error": {"message": "bad key"}});
        assert!(matches!(
            extract_content(&response).unwrap_err(),
            Error::Provider(_)
        ));
    }

    #[test]
    fn test_extract_content_missing_message() {
        let response = serde_json::json!({"choices": []});
        assert!(matches!(
            extract_content(&response).unwrap_err(),
            Error::Provider(_)
        ));
    }
}
