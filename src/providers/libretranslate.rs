/*!
 * LibreTranslate client.
 *
 * `POST {endpoint}` with a JSON body `{q, source, target, format, api_key}`;
 * the answer is `{"translatedText": ...}` or `{"error": ...}`.
 */

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{
    build_http_client, classify_status, classify_transport_error, meaningful_translation,
    LookupRequest, Provider,
};
use crate::errors::ProviderError;

/// LibreTranslate client
#[derive(Debug)]
pub struct LibreTranslate {
    /// Translate endpoint
    endpoint: String,
    /// HTTP client for making requests
    client: Client,
    /// API key, required by the hosted service
    api_key: Option<String>,
}

#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    #[serde(rename = "translatedText")]
    translated_text: Option<String>,
    error: Option<String>,
}

impl LibreTranslate {
    /// Create a new client
    pub fn new(endpoint: impl Into<String>, timeout: Duration, api_key: Option<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            client: build_http_client(timeout),
            api_key,
        }
    }

    /// Interpret a successful response body
    pub(crate) fn parse_body(word: &str, body: &str) -> Result<Option<String>, ProviderError> {
        let response: TranslateResponse = serde_json::from_str(body)
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        if let Some(error) = response.error {
            return Err(ProviderError::InvalidRequest(error));
        }

        Ok(response
            .translated_text
            .and_then(|text| meaningful_translation(word, &text)))
    }
}

#[async_trait]
impl Provider for LibreTranslate {
    async fn lookup(&self, request: &LookupRequest) -> Result<Option<String>, ProviderError> {
        let payload = TranslateRequest {
            q: &request.word,
            source: &request.source_language,
            target: &request.target_language,
            format: "text",
            api_key: self.api_key.as_deref(),
        };
        debug!("LibreTranslate lookup: '{}'", request.word);

        let response = self
            .client
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await.map_err(classify_transport_error)?;

        if !status.is_success() {
            return Err(classify_status(status, &headers, &body));
        }

        Self::parse_body(&request.word, &body)
    }

    fn name(&self) -> &str {
        "libretranslate"
    }
}
