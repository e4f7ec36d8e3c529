/*!
 * Common test utilities for the bilinguo test suite
 */

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use bilinguo::app_config::Config;
use bilinguo::app_controller::Controller;
use bilinguo::database::WordStore;
use bilinguo::providers::MockProvider;
use bilinguo::translation::{RetryPolicy, Translator};

/// Route log output through the test harness
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Configuration whose database lives in `dir`
pub fn test_config(dir: &Path) -> Config {
    Config {
        database_path: dir.join("vocabulary.db").to_string_lossy().to_string(),
        ..Config::default()
    }
}

/// Translator over a mock provider with millisecond retry backoff
pub fn test_translator(provider: MockProvider) -> Translator {
    Translator::new(Arc::new(provider)).with_retry_policy(RetryPolicy::new(
        2,
        Duration::from_millis(1),
        Duration::from_secs(1),
    ))
}

/// Controller backed by an on-disk store in `dir` and a mock provider
pub fn test_controller(dir: &Path, provider: MockProvider) -> Result<Controller> {
    let config = test_config(dir);
    let store = WordStore::open(config.resolve_database_path()?)?;
    Ok(Controller::with_components(config, store, test_translator(provider)))
}

/// Serve one canned HTTP response per connection; returns the base URL
pub async fn spawn_stub_server(
    status_line: &'static str,
    headers: &'static [(&'static str, &'static str)],
    body: &'static str,
) -> Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            if read_request(&mut socket).await.is_err() {
                continue;
            }

            let mut response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n",
                status_line,
                body.len()
            );
            for (name, value) in headers {
                response.push_str(&format!("{}: {}\r\n", name, value));
            }
            response.push_str("\r\n");
            response.push_str(body);

            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        }
    });

    Ok(format!("http://{}", addr))
}

/// Read one request: headers, then `Content-Length` bytes of body
async fn read_request(socket: &mut tokio::net::TcpStream) -> std::io::Result<()> {
    let mut received = Vec::new();
    let mut chunk = [0u8; 4096];

    loop {
        let n = socket.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        received.extend_from_slice(&chunk[..n]);

        if let Some(header_end) = received.windows(4).position(|w| w == b"\r\n\r\n") {
            let headers = String::from_utf8_lossy(&received[..header_end]).to_lowercase();
            let content_length = headers
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|value| value.trim().parse::<usize>().ok())
                .unwrap_or(0);

            if received.len() >= header_end + 4 + content_length {
                return Ok(());
            }
        }
    }
}
