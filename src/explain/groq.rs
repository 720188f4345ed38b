use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ExplainError, Explainer, Explanation, TextModel, TokenUsage};
use crate::auth::AuthStorage;
use crate::consts::{API_KEY_ENV, DEFAULT_BASE_URL, MAX_OUTPUT_TOKENS, PROVIDER, TEMPERATURE};

/// An explainer backed by Groq's OpenAI-compatible chat completions API.
pub struct GroqExplainer {
    base_url: String,
    auth: AuthStorage,
    client: reqwest::Client,
}

impl GroqExplainer {
    pub fn new(base_url: Option<String>, auth: AuthStorage) -> Self {
        let base_url = base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        Self {
            base_url,
            auth,
            client: reqwest::Client::new(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn build_body<'a>(model: &'a str, prompt: &'a str) -> ApiRequest<'a> {
        ApiRequest {
            model,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
            temperature: TEMPERATURE,
            max_tokens: MAX_OUTPUT_TOKENS,
        }
    }

    /// Pull the first choice's text out of a response body.
    fn parse_response(body: &str) -> Result<Explanation, ExplainError> {
        let resp: ApiResponse = serde_json::from_str(body)
            .map_err(|e| ExplainError::MalformedResponse(format!("not a completion: {e}")))?;

        let text = resp
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ExplainError::MalformedResponse("no choices returned".to_string()))?
            .message
            .and_then(|m| m.content)
            .ok_or_else(|| ExplainError::MalformedResponse("first choice has no text".to_string()))?;

        let usage = resp.usage.map(|u| TokenUsage {
            input_tokens: u.prompt_tokens,
            output_tokens: u.completion_tokens,
        });

        Ok(Explanation { text, usage })
    }
}

#[async_trait]
impl Explainer for GroqExplainer {
    async fn explain(&self, model: TextModel, prompt: &str) -> Result<Explanation, ExplainError> {
        let api_key = self
            .auth
            .get_api_key(PROVIDER, API_KEY_ENV)
            .map_err(ExplainError::Credentials)?
            .ok_or(ExplainError::MissingCredential)?;

        debug!(
            model = model.id(),
            prompt_bytes = prompt.len(),
            "sending explanation request"
        );

        let body = Self::build_body(model.id(), prompt);
        let resp = self
            .client
            .post(self.endpoint())
            .bearer_auth(&api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(ExplainError::Unauthorized(error_message(&text)));
        }
        if !status.is_success() {
            return Err(ExplainError::Api {
                status: status.as_u16(),
                body: error_message(&text),
            });
        }

        let explanation = Self::parse_response(&text)?;
        if let Some(usage) = explanation.usage {
            debug!(
                input = usage.input_tokens,
                output = usage.output_tokens,
                "explanation received"
            );
        }
        Ok(explanation)
    }
}

/// Prefer the provider's `error.message` over the raw body when present.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .map(|e| e.error.message)
        .unwrap_or_else(|| body.trim().to_string())
}

// --- API types ---

#[derive(Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ApiResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}
