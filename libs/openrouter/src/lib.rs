use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Body, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

pub static DEFAULT_TEMPERATURE: f32 = 0.7;

#[derive(Error, Debug)]
pub enum Error {
    #[error("openrouter api key is not configured")]
    MissingApiKey,

    #[error("http request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("openrouter api error: status code: {status}, response: {body}")]
    Api { status: StatusCode, body: String },

    #[error("failed to parse openrouter response: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("openrouter did not return a non-empty completion")]
    EmptyChoices,
}

#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub temperature: f32,
    pub max_tokens: i32,
}

impl ChatCompletionRequest {
    /// Builds the two-message conversation the completion endpoint expects.
    pub fn new(
        model: String,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Self {
        Self {
            model,
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: system_prompt.to_string(),
                },
                Message {
                    role: "user".to_string(),
                    content: user_prompt.to_string(),
                },
            ],
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: 512,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl From<ChatCompletionRequest> for Body {
    fn from(val: ChatCompletionRequest) -> Self {
        let body = serde_json::to_string(&val).unwrap();
        Body::from(body)
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: String,
}

#[derive(Debug, Clone)]
pub struct Client {
    base_url: String,
    client: reqwest::Client,
}

impl Client {
    pub fn new(api_key: String, base_url: String) -> Result<Self, Error> {
        if api_key.is_empty() {
            return Err(Error::MissingApiKey);
        }

        let mut headers = HeaderMap::new();
        headers.insert("Accept", HeaderValue::from_str("*/*").unwrap());
        headers.insert(
            "Authorization",
            HeaderValue::from_str(format!("Bearer {}", api_key).as_str())
                .unwrap(),
        );

        let client = reqwest::ClientBuilder::new()
            .default_headers(headers)
            .build()?;

        Ok(Self { base_url, client })
    }

    /// Runs one chat completion and returns the first choice's content.
    pub async fn chat_completion(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<String, Error> {
        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .header("Content-Type", "application/json")
            .body(request)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            error!(
                task = "chat completion",
                status = status.as_u16(),
                body = text.as_str()
            );
            return Err(Error::Api { status, body: text });
        }

        let response = serde_json::from_str::<ChatCompletionResponse>(&text)
            .map_err(|e| {
                error!(task = "chat completion", error = e.to_string());
                Error::Parse(e)
            })?;

        let content = response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .filter(|content| !content.is_empty());
        let Some(content) = content else {
            error!(task = "chat completion", error = "no choices in response");
            return Err(Error::EmptyChoices);
        };

        Ok(content)
    }
}
