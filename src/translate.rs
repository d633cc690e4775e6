//! Best-effort translation over the Google Translate v2 wire contract.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::warn;

/// Returned in place of a translation whenever the backend is unreachable,
/// rejects the request, or answers with an unparseable body. The pipeline
/// keeps rendering either way.
pub const TRANSLATION_FAILED: &str = "Translation failed";

#[async_trait]
pub trait Translator: Send + Sync {
    /// Always returns a string; failures collapse to [`TRANSLATION_FAILED`].
    async fn translate(&self, text: &str) -> String;
}

#[derive(Debug, Clone)]
pub struct TranslatorGateway {
    client: reqwest::Client,
    endpoint: String,
    key: Option<String>,
    source_lang: String,
    target_lang: String,
    timeout: Duration,
}

impl TranslatorGateway {
    pub fn new(
        endpoint: impl Into<String>,
        key: Option<String>,
        source_lang: impl Into<String>,
        target_lang: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            key: key.filter(|value| !value.trim().is_empty()),
            source_lang: source_lang.into(),
            target_lang: target_lang.into(),
            timeout,
        }
    }

    pub fn target_lang(&self) -> &str {
        &self.target_lang
    }

    async fn request(&self, text: &str) -> Result<String> {
        let key = self
            .key
            .as_deref()
            .ok_or_else(|| anyhow!("no translation API key configured"))?;
        let url = format!("{}?key={}", self.endpoint, key);
        let body = json!({
            "q": text,
            "source": self.source_lang,
            "target": self.target_lang,
            "format": "text",
        });

        let response = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(anyhow!(
                "translation API error ({}): {}",
                status,
                extract_api_error(&text).unwrap_or(text)
            ));
        }
        parse_translation(&text)
    }
}

#[async_trait]
impl Translator for TranslatorGateway {
    async fn translate(&self, text: &str) -> String {
        match self.request(text).await {
            Ok(translated) => translated,
            Err(err) => {
                warn!("translation failed: {:#}", err);
                TRANSLATION_FAILED.to_string()
            }
        }
    }
}

fn parse_translation(body: &str) -> Result<String> {
    let payload: TranslateResponse = serde_json::from_str(body)
        .map_err(|err| anyhow!("failed to parse translation response JSON: {}", err))?;
    payload
        .data
        .translations
        .into_iter()
        .next()
        .map(|item| item.translated_text)
        .ok_or_else(|| anyhow!("no translations returned"))
}

fn extract_api_error(body: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: Option<ApiError>,
    }

    #[derive(Deserialize)]
    struct ApiError {
        message: Option<String>,
        status: Option<String>,
        code: Option<i32>,
    }

    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    let error = parsed.error?;
    let mut parts = Vec::new();
    if let Some(message) = error.message
        && !message.trim().is_empty()
    {
        parts.push(message);
    }
    if let Some(status) = error.status
        && !status.trim().is_empty()
    {
        parts.push(format!("status: {}", status));
    }
    if let Some(code) = error.code {
        parts.push(format!("code: {}", code));
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" | "))
    }
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    data: TranslateData,
}

#[derive(Debug, Deserialize)]
struct TranslateData {
    translations: Vec<TranslationItem>,
}

#[derive(Debug, Deserialize)]
struct TranslationItem {
    #[serde(rename = "translatedText")]
    translated_text: String,
}
