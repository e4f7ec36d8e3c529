/*!
 * MyMemory client.
 *
 * `GET {endpoint}?q=<word>&langpair=<src>|<tgt>`. The service often answers
 * HTTP 200 and reports failures in the body (`responseStatus`,
 * `quotaFinished`), so the body is classified as well as the status line.
 */

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

use super::{
    build_http_client, classify_status, classify_transport_error, meaningful_translation,
    LookupRequest, Provider,
};
use crate::errors::ProviderError;

/// Prefix of the text MyMemory returns in place of a translation once the quota is used
const QUOTA_WARNING_PREFIX: &str = "MYMEMORY WARNING";

/// MyMemory client
#[derive(Debug)]
pub struct MyMemory {
    /// Lookup endpoint
    endpoint: String,
    /// HTTP client for making requests
    client: Client,
    /// Contact email (`de` parameter), raises the daily quota
    email: Option<String>,
    /// Private key (`key` parameter)
    api_key: Option<String>,
}

/// Response body
#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(rename = "responseData")]
    response_data: Option<ResponseData>,
    #[serde(rename = "responseStatus", default)]
    response_status: Option<serde_json::Value>,
    #[serde(rename = "responseDetails", default)]
    response_details: Option<serde_json::Value>,
    #[serde(rename = "quotaFinished", default)]
    quota_finished: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct ResponseData {
    #[serde(rename = "translatedText")]
    translated_text: Option<String>,
}

impl MyMemory {
    /// Create a new client
    pub fn new(
        endpoint: impl Into<String>,
        timeout: Duration,
        email: Option<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            client: build_http_client(timeout),
            email,
            api_key,
        }
    }

    /// Build the request URL
    fn request_url(&self, request: &LookupRequest) -> Result<Url, ProviderError> {
        let langpair = format!("{}|{}", request.source_language, request.target_language);
        let mut params = vec![("q", request.word.as_str()), ("langpair", langpair.as_str())];
        if let Some(email) = &self.email {
            params.push(("de", email.as_str()));
        }
        if let Some(key) = &self.api_key {
            params.push(("key", key.as_str()));
        }

        Url::parse_with_params(&self.endpoint, &params)
            .map_err(|e| ProviderError::InvalidRequest(format!("Invalid endpoint {}: {}", self.endpoint, e)))
    }

    /// Interpret a response body
    pub(crate) fn parse_body(word: &str, body: &str) -> Result<Option<String>, ProviderError> {
        let response: LookupResponse = serde_json::from_str(body)
            .map_err(|e| ProviderError::ParseError(format!("{}: {}", e, truncate(body))))?;

        let details = response
            .response_details
            .as_ref()
            .and_then(|d| d.as_str())
            .unwrap_or_default()
            .to_string();

        let translated = response
            .response_data
            .and_then(|d| d.translated_text)
            .unwrap_or_default();

        if response.quota_finished == Some(true) || translated.starts_with(QUOTA_WARNING_PREFIX) {
            let message = if details.is_empty() { translated } else { details };
            return Err(ProviderError::RateLimited {
                message,
                retry_after_secs: None,
            });
        }

        match response_status(response.response_status.as_ref()) {
            Some(200) | None => Ok(meaningful_translation(word, &translated)),
            Some(429) => Err(ProviderError::RateLimited {
                message: details,
                retry_after_secs: None,
            }),
            Some(status) if status >= 500 => Err(ProviderError::Unavailable(format!(
                "MyMemory status {}: {}",
                status, details
            ))),
            Some(status) => Err(ProviderError::InvalidRequest(format!(
                "MyMemory status {}: {}",
                status, details
            ))),
        }
    }
}

/// `responseStatus` is sent as a number or as a string
fn response_status(value: Option<&serde_json::Value>) -> Option<u16> {
    match value? {
        serde_json::Value::Number(n) => n.as_u64().and_then(|n| u16::try_from(n).ok()),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn truncate(body: &str) -> String {
    body.chars().take(200).collect()
}

#[async_trait]
impl Provider for MyMemory {
    async fn lookup(&self, request: &LookupRequest) -> Result<Option<String>, ProviderError> {
        let url = self.request_url(request)?;
        debug!("MyMemory lookup: '{}' ({}→{})", request.word, request.source_language, request.target_language);

        let response = self
            .client
            .get(url)
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
        "mymemory"
    }
}
