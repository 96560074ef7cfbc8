use std::cell::RefCell;
use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::reconcile::error::FormError;

/// Text completion service producing candidate forms.
pub trait CompletionBackend {
    fn complete(&self, system: &str, user: &str) -> Result<String, FormError>;
}

// ============================================================================
// OpenAI-compatible chat completions (Groq by default)
// ============================================================================

pub const DEFAULT_ENDPOINT: &str = "https://api.groq.com/openai/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";
pub const DEFAULT_API_KEY_ENV: &str = "GROQ_API_KEY";

pub struct ChatCompletionsBackend {
    pub endpoint: String,
    pub model: String,
    pub api_key: String,
    pub temperature: f32,
    pub top_p: f32,
}

impl ChatCompletionsBackend {
    pub fn new(endpoint: &str, model: &str, api_key: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
            temperature: 1.0,
            top_p: 1.0,
        }
    }

    /// Read the API key from `var`.
    pub fn from_env(endpoint: &str, model: &str, var: &str) -> Result<Self, FormError> {
        let api_key = std::env::var(var).map_err(|_| FormError::MissingCredential(var.to_string()))?;
        Ok(Self::new(endpoint, model, &api_key))
    }

    pub fn with_sampling(mut self, temperature: f32, top_p: f32) -> Self {
        self.temperature = temperature;
        self.top_p = top_p;
        self
    }

    /// Body of the completions request for one system/user exchange.
    pub fn build_request<'a>(&'a self, system: &'a str, user: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: self.temperature,
            top_p: self.top_p,
            stream: false,
        }
    }
}

#[derive(Serialize)]
pub struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    top_p: f32,
    stream: bool,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Pull `choices[0].message.content` out of a completions response body.
pub fn parse_chat_response(body: &str) -> Result<String, FormError> {
    let chat: ChatResponse = serde_json::from_str(body).map_err(|e| FormError::JsonParse {
        context: "chat completion response".into(),
        source: e,
    })?;

    chat.choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| FormError::Generator("response contained no message content".into()))
}

impl CompletionBackend for ChatCompletionsBackend {
    fn complete(&self, system: &str, user: &str) -> Result<String, FormError> {
        let request = self.build_request(system, user);
        let http_err = |e| FormError::Http {
            endpoint: self.endpoint.clone(),
            source: e,
        };

        let client = reqwest::blocking::Client::new();
        let response = client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .map_err(http_err)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(FormError::Generator(format!("{} returned {}: {}", self.endpoint, status, body)));
        }

        let body = response.text().map_err(http_err)?;
        parse_chat_response(&body)
    }
}

// ============================================================================
// Mock Backend (for testing without network access)
// ============================================================================

/// Replays canned responses in order and records the prompts it was sent.
#[derive(Default)]
pub struct MockBackend {
    responses: RefCell<VecDeque<String>>,
    requests: RefCell<Vec<String>>,
}

impl MockBackend {
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: RefCell::new(responses.into_iter().map(Into::into).collect()),
            requests: RefCell::new(Vec::new()),
        }
    }

    /// User messages received so far.
    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }
}

impl CompletionBackend for MockBackend {
    fn complete(&self, _system: &str, user: &str) -> Result<String, FormError> {
        self.requests.borrow_mut().push(user.to_string());
        self.responses
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| FormError::Generator("mock backend has no responses left".into()))
    }
}
