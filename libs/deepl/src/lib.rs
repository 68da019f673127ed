use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("deepl auth key is not configured")]
    MissingAuthKey,

    #[error("http request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("deepl api error: status code: {status}, response: {body}")]
    Api { status: StatusCode, body: String },

    #[error("failed to parse deepl response: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("deepl did not return translations")]
    EmptyTranslations,
}

/// Languages the service translates between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lang {
    Ko,
    En,
}

impl Lang {
    pub fn as_str(&self) -> &'static str {
        match self {
            Lang::Ko => "KO",
            Lang::En => "EN",
        }
    }
}

#[derive(Debug, Serialize)]
struct TranslationRequest<'a> {
    auth_key: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    source_lang: Option<&'static str>,
    target_lang: &'static str,
}

#[derive(Debug, Deserialize)]
struct TranslationResponse {
    translations: Vec<Translation>,
}

#[derive(Debug, Deserialize)]
struct Translation {
    text: String,
}

#[derive(Debug, Clone)]
pub struct Client {
    base_url: String,
    auth_key: String,
    client: reqwest::Client,
}

impl Client {
    pub fn new(auth_key: String, base_url: String) -> Result<Self, Error> {
        if auth_key.is_empty() {
            return Err(Error::MissingAuthKey);
        }

        Ok(Self {
            base_url,
            auth_key,
            client: reqwest::Client::new(),
        })
    }

    /// Translates `text` and returns the first translation result.
    pub async fn translate(
        &self,
        text: &str,
        source_lang: Option<Lang>,
        target_lang: Lang,
    ) -> Result<String, Error> {
        let request = TranslationRequest {
            auth_key: &self.auth_key,
            text,
            source_lang: source_lang.map(|lang| lang.as_str()),
            target_lang: target_lang.as_str(),
        };

        let response = self
            .client
            .post(format!("{}/v2/translate", self.base_url))
            .form(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(
                task = "translate",
                status = status.as_u16(),
                body = body.as_str()
            );
            return Err(Error::Api { status, body });
        }

        let text = response.text().await?;
        let response =
            serde_json::from_str::<TranslationResponse>(&text).map_err(
                |e| {
                    error!(task = "translate", error = e.to_string());
                    Error::Parse(e)
                },
            )?;

        let Some(translation) = response.translations.into_iter().next()
        else {
            error!(task = "translate", error = "no translations in response");
            return Err(Error::EmptyTranslations);
        };

        Ok(translation.text)
    }
}
