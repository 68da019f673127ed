use axum::{extract::State, Json};
use deepl::Lang;
use openrouter::{ChatCompletionRequest, Message};
use serde_json::Value;

pub mod request;
pub mod response;

use crate::response::{ApiResponse, IntoApiResponse};
use crate::{ApiError, ApiState};

use self::request::GenerateStoryRequest;
use self::response::GenerateStoryResponse;

static SYSTEM_PROMPT: &str =
    "Write a short fairy tale in one sentence in the style of a warm picture book.";

/// Generate a fairy tale from a Korean prompt
#[utoipa::path(
    post,
    path = "/stories",
    request_body = GenerateStoryRequest,
    responses(
        (status = 200, description = "Generate a fairy tale successfully", body = GenerateStoryResponse),
        (status = 400, description = "The prompt is missing or empty"),
        (status = 500, description = "A provider call failed")
    )
)]
pub async fn generate_story(
    State(state): State<ApiState>,
    Json(body): Json<Value>,
) -> ApiResponse<Json<GenerateStoryResponse>> {
    let prompt = body
        .get("prompt")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|prompt| !prompt.is_empty());
    let Some(prompt) = prompt else {
        return Err(ApiError::ClientError(
            "prompt is required and must be a non-empty string".to_string(),
        ));
    };

    let prompt_en = state
        .deepl
        .translate(prompt, Some(Lang::Ko), Lang::En)
        .await
        .into_response("failed to translate prompt")?;

    let request = ChatCompletionRequest {
        model: state.config.story.model.clone(),
        messages: vec![
            Message {
                role: "system".to_string(),
                content: SYSTEM_PROMPT.to_string(),
            },
            Message {
                role: "user".to_string(),
                content: format!("The theme of the story is: {}", prompt_en),
            },
        ],
        temperature: state.config.story.temperature,
        max_tokens: state.config.story.max_tokens,
    };
    let story_en = state
        .openrouter
        .chat_completion(request)
        .await
        .into_response("failed to generate story")?;

    let story = state
        .deepl
        .translate(&story_en, Some(Lang::En), Lang::Ko)
        .await
        .into_response("failed to translate story")?;

    Ok(Json(GenerateStoryResponse { story }))
}
