use axum::{routing::get, routing::post, Router};

use tower_http::cors::CorsLayer;
use tracing::info;
use utoipa::OpenApi;
use utoipa_rapidoc::RapiDoc;
use utoipa_redoc::{Redoc, Servable};
use utoipa_swagger_ui::SwaggerUi;
use utoipauto::utoipauto;

pub mod healthz;
pub mod image;
pub mod not_found;
mod response;
pub mod story;

pub enum ApiError {
    ClientError(String),
    ServerError(String),
}

#[derive(Clone, Debug)]
pub struct ApiState {
    deepl: deepl::Client,
    openrouter: openrouter::Client,
    replicate: replicate::Client,
    config: Config,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub story: StoryConfig,
    pub image: ImageConfig,
}

#[derive(Clone, Debug)]
pub struct StoryConfig {
    pub model: String,
    pub max_tokens: i32,
    pub temperature: f32,
}

#[derive(Clone, Debug)]
pub struct ImageConfig {
    pub version: String,
    pub num_inference_steps: i32,
    pub guidance_scale: f32,
    pub controlnet_conditioning_scale: f32,
}

pub async fn serve(
    deepl: deepl::Client,
    openrouter: openrouter::Client,
    replicate: replicate::Client,
    config: Config,
) -> anyhow::Result<Router> {
    #[utoipauto(paths = "./libs/api/src")]
    #[derive(OpenApi)]
    #[openapi(
        tags(
            (name = "story", description = "Fairy tale generation API"),
            (name = "image", description = "Image transformation API")
        )
    )]
    struct ApiDoc;

    info!(task = "start api serving");

    let state = ApiState {
        deepl,
        openrouter,
        replicate,
        config,
    };

    let origins = ["http://localhost:3000".parse().unwrap()];

    // stories
    let story_router = Router::new()
        .route("/", post(story::generate_story))
        .fallback(not_found::get_404)
        .with_state(state.clone());

    // images
    let image_router = Router::new()
        .route("/", post(image::transform_image))
        .fallback(not_found::get_404)
        .with_state(state.clone());

    let router = Router::new()
        .merge(
            SwaggerUi::new("/swagger-ui")
                .url("/api-docs/openapi.json", ApiDoc::openapi()),
        )
        .merge(Redoc::with_url("/redoc", ApiDoc::openapi()))
        .merge(RapiDoc::new("/api-docs/openapi.json").path("/rapidoc"))
        .route("/healthz", get(healthz::get_health))
        .nest("/stories", story_router)
        .nest("/images", image_router)
        .layer(CorsLayer::new().allow_origin(origins))
        .fallback(not_found::get_404);

    Ok(router)
}
