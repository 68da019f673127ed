use futures_util::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Body, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::error;

pub mod decode;

use crate::decode::Utf8Decoder;

#[derive(Error, Debug)]
pub enum Error {
    #[error("replicate api token is not configured")]
    MissingApiToken,

    #[error("http request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("replicate api error: status code: {status}, response: {body}")]
    Api { status: StatusCode, body: String },

    #[error("failed to parse replicate response: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("replicate prediction failed: {0}")]
    Prediction(String),

    #[error("failed to decode output stream: {0}")]
    StreamDecode(String),
}

#[derive(Debug, Serialize)]
pub struct PredictionRequest {
    pub version: String,
    pub input: PredictionInput,
}

#[derive(Debug, Serialize)]
pub struct PredictionInput {
    pub image: String,
    pub prompt: String,
    pub controlnet_conditioning_scale: f32,
    pub num_inference_steps: i32,
    pub guidance_scale: f32,
}

impl From<PredictionRequest> for Body {
    fn from(val: PredictionRequest) -> Self {
        let body = serde_json::to_string(&val).unwrap();
        Body::from(body)
    }
}

#[derive(Debug, Deserialize)]
struct Prediction {
    status: String,
    #[serde(default)]
    output: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct Client {
    base_url: String,
    client: reqwest::Client,
}

impl Client {
    pub fn new(api_token: String, base_url: String) -> Result<Self, Error> {
        if api_token.is_empty() {
            return Err(Error::MissingApiToken);
        }

        let mut headers = HeaderMap::new();
        headers.insert("Accept", HeaderValue::from_str("*/*").unwrap());
        // wait for the prediction instead of polling it
        headers.insert("Prefer", HeaderValue::from_str("wait").unwrap());
        headers.insert(
            "Authorization",
            HeaderValue::from_str(format!("Bearer {}", api_token).as_str())
                .unwrap(),
        );

        let client = reqwest::ClientBuilder::new()
            .default_headers(headers)
            .build()?;

        Ok(Self { base_url, client })
    }

    /// Runs one prediction to completion and returns its raw output value.
    ///
    /// The output's schema is the model's business; nothing here interprets
    /// it beyond carrying it back.
    pub async fn run(
        &self,
        request: PredictionRequest,
    ) -> Result<Value, Error> {
        let response = self
            .client
            .post(format!("{}/v1/predictions", self.base_url))
            .header("Content-Type", "application/json")
            .body(request)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            error!(
                task = "run prediction",
                status = status.as_u16(),
                body = text.as_str()
            );
            return Err(Error::Api { status, body: text });
        }

        let prediction =
            serde_json::from_str::<Prediction>(&text).map_err(|e| {
                error!(task = "run prediction", error = e.to_string());
                Error::Parse(e)
            })?;

        if prediction.status != "succeeded" {
            let detail = prediction
                .error
                .map(|e| e.to_string())
                .unwrap_or(prediction.status);
            error!(task = "run prediction", error = detail.as_str());
            return Err(Error::Prediction(detail));
        }

        let Some(output) = prediction.output else {
            error!(task = "run prediction", error = "no output in response");
            return Err(Error::Prediction(
                "prediction returned no output".to_string(),
            ));
        };

        Ok(output)
    }

    /// Resolves a prediction output into a usable JSON value.
    ///
    /// A string output pointing at a file is stream-shaped: its body is
    /// drained to completion, decoded as UTF-8 and parsed as JSON. Any other
    /// output is already usable and is returned untouched.
    pub async fn read_output(&self, output: Value) -> Result<Value, Error> {
        let url = match &output {
            Value::String(url) if url.starts_with("http") => url.clone(),
            _ => return Ok(output),
        };

        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(
                task = "read output",
                status = status.as_u16(),
                body = body.as_str()
            );
            return Err(Error::Api { status, body });
        }

        let mut stream = response.bytes_stream();
        let mut decoder = Utf8Decoder::new();
        let mut content = String::new();
        while let Some(chunk) = stream.next().await.transpose()? {
            content.push_str(&decoder.decode(&chunk)?);
        }
        decoder.finish()?;

        serde_json::from_str(&content).map_err(|e| {
            let snippet = content.chars().take(200).collect::<String>();
            error!(
                task = "read output",
                error = e.to_string(),
                content = snippet.as_str()
            );
            Error::StreamDecode(format!(
                "output stream is not valid json: {}",
                e
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_serializes_to_the_prediction_body() {
        let request = PredictionRequest {
            version: "abc123".to_string(),
            input: PredictionInput {
                image: "data:image/png;base64,AAAA".to_string(),
                prompt: "a cat in space".to_string(),
                controlnet_conditioning_scale: 1.2,
                num_inference_steps: 30,
                guidance_scale: 8.5,
            },
        };

        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["version"], "abc123");
        assert_eq!(body["input"]["num_inference_steps"], 30);
        assert_eq!(body["input"]["prompt"], "a cat in space");
    }

    #[test]
    fn rejects_an_empty_api_token() {
        let result =
            Client::new(String::new(), "https://example.com".to_string());
        assert!(matches!(result, Err(Error::MissingApiToken)));
    }

    #[tokio::test]
    async fn non_stream_output_is_returned_untouched() {
        let client = Client::new(
            "test-token".to_string(),
            "https://example.com".to_string(),
        )
        .unwrap();

        let output = json!({"diary": "text", "image_url": "not-fetched"});
        let resolved = client.read_output(output.clone()).await.unwrap();

        assert_eq!(resolved, output);
    }
}
