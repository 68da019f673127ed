use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct GenerateStoryRequest {
    pub prompt: String,
}
