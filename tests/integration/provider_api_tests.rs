/*!
 * Integration tests for provider HTTP handling
 *
 * Each test serves canned responses from a local stub server, so no
 * external service is contacted.
 */

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use bilinguo::errors::{ProviderError, TranslationError};
use bilinguo::providers::{LibreTranslate, LookupRequest, MyMemory, Provider};
use bilinguo::translation::{RetryPolicy, Translator};
use crate::common;

const TIMEOUT: Duration = Duration::from_secs(5);

fn request(word: &str) -> LookupRequest {
    LookupRequest::new(word, "en", "fa")
}

/// Test a successful MyMemory lookup
#[tokio::test]
async fn test_myMemory_withTranslation_shouldReturnText() -> Result<()> {
    let url = common::spawn_stub_server(
        "200 OK",
        &[],
        r#"{"responseData":{"translatedText":"گربه"},"responseStatus":200,"responseDetails":""}"#,
    )
    .await?;
    let provider = MyMemory::new(format!("{}/get", url), TIMEOUT, None, None);

    let result = provider.lookup(&request("cat")).await;

    assert_eq!(result, Ok(Some("گربه".to_string())));
    Ok(())
}

/// Test that an echoed word counts as no translation
#[tokio::test]
async fn test_myMemory_withEchoedWord_shouldReturnNone() -> Result<()> {
    let url = common::spawn_stub_server(
        "200 OK",
        &[],
        r#"{"responseData":{"translatedText":"ZZQXNOTAWORD"},"responseStatus":200}"#,
    )
    .await?;
    let provider = MyMemory::new(url, TIMEOUT, None, None);

    assert_eq!(provider.lookup(&request("zzqxnotaword")).await, Ok(None));
    Ok(())
}

/// Test HTTP 429 with a Retry-After header
#[tokio::test]
async fn test_myMemory_withTooManyRequests_shouldCarryRetryHint() -> Result<()> {
    let url = common::spawn_stub_server("429 Too Many Requests", &[("Retry-After", "7")], "{}").await?;
    let provider = MyMemory::new(url, TIMEOUT, None, None);

    let error = provider.lookup(&request("cat")).await.unwrap_err();

    assert!(matches!(error, ProviderError::RateLimited { .. }));
    assert_eq!(error.retry_after(), Some(Duration::from_secs(7)));
    Ok(())
}

/// Test the quota warning MyMemory sends with a 200 status
#[tokio::test]
async fn test_myMemory_withQuotaWarning_shouldBeRateLimited() -> Result<()> {
    let url = common::spawn_stub_server(
        "200 OK",
        &[],
        r#"{"responseData":{"translatedText":"MYMEMORY WARNING: YOU USED ALL AVAILABLE FREE TRANSLATIONS FOR TODAY"},"quotaFinished":true,"responseStatus":429}"#,
    )
    .await?;
    let provider = MyMemory::new(url, TIMEOUT, None, None);

    let error = provider.lookup(&request("cat")).await.unwrap_err();

    assert!(matches!(error, ProviderError::RateLimited { retry_after_secs: None, .. }));
    Ok(())
}

/// Test that a server error is transient
#[tokio::test]
async fn test_libreTranslate_withServerError_shouldBeUnavailable() -> Result<()> {
    let url = common::spawn_stub_server("503 Service Unavailable", &[], "busy").await?;
    let provider = LibreTranslate::new(format!("{}/translate", url), TIMEOUT, None);

    let error = provider.lookup(&request("cat")).await.unwrap_err();

    assert!(matches!(error, ProviderError::Unavailable(_)));
    assert!(error.is_transient());
    Ok(())
}

/// Test a successful LibreTranslate lookup
#[tokio::test]
async fn test_libreTranslate_withTranslation_shouldReturnText() -> Result<()> {
    let url = common::spawn_stub_server("200 OK", &[], r#"{"translatedText":"سگ"}"#).await?;
    let provider = LibreTranslate::new(format!("{}/translate", url), TIMEOUT, Some("key".to_string()));

    assert_eq!(provider.lookup(&request("dog")).await, Ok(Some("سگ".to_string())));
    Ok(())
}

/// Test a client error is not retried and surfaces as a provider failure
#[tokio::test]
async fn test_translator_withBadRequest_shouldNotRetry() -> Result<()> {
    let url = common::spawn_stub_server("400 Bad Request", &[], r#"{"error":"bad language"}"#).await?;
    let provider = LibreTranslate::new(url, TIMEOUT, None);
    let translator = Translator::new(Arc::new(provider)).with_retry_policy(RetryPolicy::new(
        3,
        Duration::from_millis(1),
        Duration::from_secs(1),
    ));

    let result = translator.translate("cat", "en", "fa").await;

    assert!(matches!(
        result,
        Err(TranslationError::Provider(ProviderError::InvalidRequest(_)))
    ));
    Ok(())
}

/// Test an unreachable endpoint is reported as unavailable
#[tokio::test]
async fn test_myMemory_withUnreachableEndpoint_shouldBeUnavailable() {
    let provider = MyMemory::new("http://127.0.0.1:9/get", TIMEOUT, None, None);

    let error = provider.lookup(&request("cat")).await.unwrap_err();

    assert!(matches!(error, ProviderError::Unavailable(_) | ProviderError::Timeout(_)));
}
