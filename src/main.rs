use std::net::{Ipv4Addr, SocketAddr};

use anyhow::Context;
use api::{serve, Config, ImageConfig, StoryConfig};
use tokio::net::TcpListener;
use tracing::info;
use util::load_config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().init();

    let deepl_auth_key =
        std::env::var("DEEPL_API_KEY").context("DEEPL_API_KEY is not set")?;
    let openrouter_api_key = std::env::var("OPENROUTER_API_KEY")
        .context("OPENROUTER_API_KEY is not set")?;
    let replicate_api_token = std::env::var("REPLICATE_API_TOKEN")
        .context("REPLICATE_API_TOKEN is not set")?;

    let config = load_config("Config.toml")?;

    let deepl = deepl::Client::new(
        deepl_auth_key,
        config["deepl"]["base_url"].as_str().unwrap().to_string(),
    )?;
    let openrouter = openrouter::Client::new(
        openrouter_api_key,
        config["openrouter"]["base_url"].as_str().unwrap().to_string(),
    )?;
    let replicate = replicate::Client::new(
        replicate_api_token,
        config["replicate"]["base_url"].as_str().unwrap().to_string(),
    )?;

    let story = StoryConfig {
        model: config["openrouter"]["model"].as_str().unwrap().to_string(),
        max_tokens: config["openrouter"]["max_tokens"].as_integer().unwrap()
            as i32,
        temperature: config["openrouter"]["temperature"].as_float().unwrap()
            as f32,
    };
    let image = ImageConfig {
        version: config["replicate"]["version"].as_str().unwrap().to_string(),
        num_inference_steps: config["replicate"]["num_inference_steps"]
            .as_integer()
            .unwrap() as i32,
        guidance_scale: config["replicate"]["guidance_scale"]
            .as_float()
            .unwrap() as f32,
        controlnet_conditioning_scale: config["replicate"]
            ["controlnet_conditioning_scale"]
            .as_float()
            .unwrap() as f32,
    };

    let router = serve(deepl, openrouter, replicate, Config { story, image })
        .await?;

    let address = SocketAddr::from((Ipv4Addr::UNSPECIFIED, 8000));
    let listener = TcpListener::bind(&address).await?;
    info!(task = "listening", address = address.to_string());
    Ok(axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?)
}
