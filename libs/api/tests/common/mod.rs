use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::net::TcpListener;

/// One outbound provider call, in the order the routes made them.
#[derive(Clone, Debug)]
pub enum ProviderCall {
    Translate {
        text: String,
        source_lang: Option<String>,
        target_lang: String,
    },
    ChatCompletion {
        body: Value,
    },
    Prediction {
        body: Value,
    },
}

#[derive(Clone, Default)]
pub struct ProviderLog {
    calls: Arc<Mutex<Vec<ProviderCall>>>,
}

impl ProviderLog {
    fn record(&self, call: ProviderCall) {
        self.calls.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<ProviderCall> {
        self.calls.lock().unwrap().clone()
    }
}

pub struct MockOptions {
    pub translate_status: StatusCode,
    /// When set, the prediction output is the URL of a file served with
    /// these bytes; otherwise `direct_output` is returned inline.
    pub stream_output: Option<&'static [u8]>,
    pub direct_output: Value,
}

impl Default for MockOptions {
    fn default() -> Self {
        Self {
            translate_status: StatusCode::OK,
            stream_output: None,
            direct_output: json!({ "a": 1 }),
        }
    }
}

#[derive(Clone)]
struct MockState {
    log: ProviderLog,
    translate_status: StatusCode,
    output: Value,
    stream_body: &'static [u8],
}

#[derive(Deserialize)]
struct TranslateForm {
    #[allow(dead_code)]
    auth_key: String,
    text: String,
    source_lang: Option<String>,
    target_lang: String,
}

async fn translate(
    State(state): State<MockState>,
    Form(form): Form<TranslateForm>,
) -> Response {
    let target_lang = form.target_lang.clone();
    state.log.record(ProviderCall::Translate {
        text: form.text,
        source_lang: form.source_lang,
        target_lang: form.target_lang,
    });

    if state.translate_status != StatusCode::OK {
        return (state.translate_status, "quota exceeded").into_response();
    }

    let text = if target_lang == "EN" {
        "Hello story"
    } else {
        "옛날 옛적 이야기"
    };
    Json(json!({ "translations": [{ "text": text }] })).into_response()
}

async fn chat_completion(
    State(state): State<MockState>,
    Json(body): Json<Value>,
) -> Json<Value> {
    state.log.record(ProviderCall::ChatCompletion { body });
    Json(json!({
        "choices": [
            { "message": { "content": "Once upon a time, a story bloomed." } }
        ]
    }))
}

async fn prediction(
    State(state): State<MockState>,
    Json(body): Json<Value>,
) -> Json<Value> {
    let output = state.output.clone();
    state.log.record(ProviderCall::Prediction { body });
    Json(json!({ "status": "succeeded", "output": output }))
}

async fn output_file(State(state): State<MockState>) -> Vec<u8> {
    state.stream_body.to_vec()
}

pub struct TestApp {
    pub router: Router,
    pub log: ProviderLog,
}

/// Starts a mock provider server on an ephemeral port and builds the real
/// router with clients pointed at it.
pub async fn spawn_app(options: MockOptions) -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());

    let log = ProviderLog::default();
    let output = match options.stream_output {
        Some(_) => Value::String(format!("{}/files/output", base_url)),
        None => options.direct_output.clone(),
    };
    let state = MockState {
        log: log.clone(),
        translate_status: options.translate_status,
        output,
        stream_body: options.stream_output.unwrap_or(b""),
    };

    let providers = Router::new()
        .route("/v2/translate", post(translate))
        .route("/v1/chat/completions", post(chat_completion))
        .route("/v1/predictions", post(prediction))
        .route("/files/output", get(output_file))
        .with_state(state);

    tokio::spawn(async move {
        axum::serve(listener, providers).await.unwrap();
    });

    let deepl =
        deepl::Client::new("test-auth-key".to_string(), base_url.clone())
            .unwrap();
    let openrouter =
        openrouter::Client::new("test-api-key".to_string(), base_url.clone())
            .unwrap();
    let replicate =
        replicate::Client::new("test-api-token".to_string(), base_url)
            .unwrap();

    let config = api::Config {
        story: api::StoryConfig {
            model: "test-model".to_string(),
            max_tokens: 512,
            temperature: 0.7,
        },
        image: api::ImageConfig {
            version: "test-version".to_string(),
            num_inference_steps: 30,
            guidance_scale: 8.5,
            controlnet_conditioning_scale: 1.2,
        },
    };

    let router = api::serve(deepl, openrouter, replicate, config)
        .await
        .unwrap();

    TestApp { router, log }
}
