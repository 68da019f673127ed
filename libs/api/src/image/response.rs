use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct TransformImageResponse {
    /// Whatever the image model produced, passed through as-is.
    #[schema(value_type = Object)]
    pub output: Value,
}
