use axum::extract::{Multipart, State};
use axum::Json;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use deepl::Lang;
use replicate::{PredictionInput, PredictionRequest};

pub mod response;

use crate::response::{ApiResponse, IntoApiResponse};
use crate::{ApiError, ApiState};

use self::response::TransformImageResponse;

/// Transform an uploaded image with a Korean prompt
#[utoipa::path(
    post,
    path = "/images",
    responses(
        (status = 200, description = "Transform an image successfully", body = TransformImageResponse),
        (status = 400, description = "The image file or the prompt is missing"),
        (status = 500, description = "A provider call failed")
    )
)]
pub async fn transform_image(
    State(state): State<ApiState>,
    mut multipart: Multipart,
) -> ApiResponse<Json<TransformImageResponse>> {
    let mut image = None;
    let mut prompt = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        ApiError::ClientError(format!("invalid multipart form: {}", e))
    })? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("image") => {
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field.bytes().await.map_err(|e| {
                    ApiError::ClientError(format!(
                        "invalid multipart form: {}",
                        e
                    ))
                })?;
                image = Some((content_type, data));
            }
            Some("prompt") => {
                prompt = Some(field.text().await.map_err(|e| {
                    ApiError::ClientError(format!(
                        "invalid multipart form: {}",
                        e
                    ))
                })?);
            }
            _ => {}
        }
    }

    let Some((content_type, data)) = image else {
        return Err(ApiError::ClientError(
            "이미지 파일을 찾을 수 없습니다.".to_string(),
        ));
    };
    let prompt = prompt
        .as_deref()
        .map(str::trim)
        .filter(|prompt| !prompt.is_empty());
    let Some(prompt) = prompt else {
        return Err(ApiError::ClientError(
            "프롬프트를 찾을 수 없습니다.".to_string(),
        ));
    };

    let prompt_en = state
        .deepl
        .translate(prompt, Some(Lang::Ko), Lang::En)
        .await
        .into_response("failed to translate prompt")?;

    let image_data_url =
        format!("data:{};base64,{}", content_type, STANDARD.encode(&data));

    let request = PredictionRequest {
        version: state.config.image.version.clone(),
        input: PredictionInput {
            image: image_data_url,
            prompt: prompt_en,
            controlnet_conditioning_scale: state
                .config
                .image
                .controlnet_conditioning_scale,
            num_inference_steps: state.config.image.num_inference_steps,
            guidance_scale: state.config.image.guidance_scale,
        },
    };
    let output = state
        .replicate
        .run(request)
        .await
        .into_response("failed to transform image")?;

    let output = state
        .replicate
        .read_output(output)
        .await
        .into_response("failed to read transform output")?;

    Ok(Json(TransformImageResponse { output }))
}
