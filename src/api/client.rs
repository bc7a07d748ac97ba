//! `SpeechApi` trait and the reqwest-backed implementation.
//!
//! All connection details come from [`ServerConfig`]; nothing is hardcoded.
//! Every call maps transport failures, non-2xx statuses, and malformed
//! payloads into [`ApiError`] so the UI layer only ever sees one error shape
//! per async boundary.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use bytes::Bytes;
use serde::Deserialize;
use thiserror::Error;

use crate::api::types::{SpeechRequest, SpeechResult, UploadResult};
use crate::config::ServerConfig;

// ---------------------------------------------------------------------------
// ApiError
// ---------------------------------------------------------------------------

/// Errors from a single server operation.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// The server reported a structured application error; shown verbatim.
    #[error("{0}")]
    Application(String),

    /// Non-2xx response without a structured error body.
    #[error("server responded with status {0}")]
    Status(u16),

    /// The response body could not be parsed as the expected JSON.
    #[error("failed to parse server response: {0}")]
    Parse(String),

    /// The local file to upload could not be read.
    #[error("could not read file: {0}")]
    File(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ApiError::Timeout
        } else {
            ApiError::Request(e.to_string())
        }
    }
}

/// Structured error body the server attaches to 4xx/5xx responses.
#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

// ---------------------------------------------------------------------------
// SpeechApi trait
// ---------------------------------------------------------------------------

/// Async interface to the document-to-speech server.
///
/// Implementors must be `Send + Sync` so the worker task can hold them behind
/// `Arc<dyn SpeechApi>`.
#[async_trait]
pub trait SpeechApi: Send + Sync {
    /// Upload a document for text extraction and language detection.
    async fn upload(&self, path: &Path) -> Result<UploadResult, ApiError>;

    /// Request speech synthesis for the uploaded document or direct text.
    async fn generate_speech(&self, request: &SpeechRequest) -> Result<SpeechResult, ApiError>;

    /// Fetch the most recently generated audio. The URL carries a timestamp
    /// query so repeated generations of the same logical file are never
    /// served stale from a cache.
    async fn fetch_audio(&self) -> Result<Bytes, ApiError>;

    /// Fetch the audio as a download attachment named `<filename>.mp3`.
    async fn download_audio(&self, filename: &str) -> Result<Bytes, ApiError>;
}

// ---------------------------------------------------------------------------
// HttpSpeechApi
// ---------------------------------------------------------------------------

/// reqwest-backed [`SpeechApi`].
pub struct HttpSpeechApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSpeechApi {
    /// Build a client with an explicit base URL and request timeout.
    pub fn new(base_url: impl Into<String>, timeout: std::time::Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Build a client from application config.
    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(
            config.base_url.clone(),
            std::time::Duration::from_secs(config.request_timeout_secs),
        )
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Convert a non-success response into the most specific error we can:
    /// the structured `error` field when the body is a JSON object carrying
    /// one, otherwise the bare status code.
    async fn error_from(response: reqwest::Response) -> ApiError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        match serde_json::from_str::<ErrorBody>(&body) {
            Ok(ErrorBody { error: Some(msg) }) => ApiError::Application(msg),
            _ => ApiError::Status(status),
        }
    }
}

#[async_trait]
impl SpeechApi for HttpSpeechApi {
    async fn upload(&self, path: &Path) -> Result<UploadResult, ApiError> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_owned());

        let data = tokio::fs::read(path)
            .await
            .map_err(|e| ApiError::File(e.to_string()))?;

        let part = reqwest::multipart::Part::bytes(data).file_name(file_name);
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(self.url("/upload"))
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }
        response
            .json::<UploadResult>()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))
    }

    async fn generate_speech(&self, request: &SpeechRequest) -> Result<SpeechResult, ApiError> {
        let response = self
            .client
            .post(self.url("/generate-speech"))
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }
        response
            .json::<SpeechResult>()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))
    }

    async fn fetch_audio(&self) -> Result<Bytes, ApiError> {
        let response = self
            .client
            .get(self.url("/get-audio"))
            .query(&[("t", cache_buster())])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }
        Ok(response.bytes().await?)
    }

    async fn download_audio(&self, filename: &str) -> Result<Bytes, ApiError> {
        let response = self
            .client
            .get(self.url("/download-audio"))
            .query(&[("filename", filename)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }
        Ok(response.bytes().await?)
    }
}

/// Millisecond timestamp used as the audio cache-busting token.
fn cache_buster() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
        .to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::Gender;
    use std::io::Write;

    fn api_for(server: &mockito::ServerGuard) -> HttpSpeechApi {
        HttpSpeechApi::new(server.url(), std::time::Duration::from_secs(5))
    }

    #[tokio::test]
    async fn generate_speech_selection_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/generate-speech")
            .match_body(mockito::Matcher::Json(serde_json::json!({
                "language": "de",
                "gender": "female"
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"success": true, "message": "ok", "detectedLanguage": null}"#)
            .create_async()
            .await;

        let api = api_for(&server);
        let result = api
            .generate_speech(&SpeechRequest::Selection {
                language: "de".into(),
                gender: Gender::Female,
            })
            .await
            .unwrap();

        assert!(result.success);
        assert!(result.detected_language.is_none());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn generate_speech_structured_error_is_application() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/generate-speech")
            .with_status(400)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error": "No text found. Please either upload a document or input text directly."}"#)
            .create_async()
            .await;

        let api = api_for(&server);
        let err = api
            .generate_speech(&SpeechRequest::Text {
                input_text: "hi".into(),
            })
            .await
            .unwrap_err();

        match err {
            ApiError::Application(msg) => assert!(msg.starts_with("No text found")),
            other => panic!("expected Application, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_json_error_body_falls_back_to_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/generate-speech")
            .with_status(502)
            .with_body("Bad Gateway")
            .create_async()
            .await;

        let api = api_for(&server);
        let err = api
            .generate_speech(&SpeechRequest::Text {
                input_text: "hi".into(),
            })
            .await
            .unwrap_err();

        match err {
            ApiError::Status(502) => {}
            other => panic!("expected Status(502), got {other:?}"),
        }
    }

    #[tokio::test]
    async fn upload_parses_result() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/upload")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"success": true, "text": "Hello world", "language": "en", "fullTextLength": 11}"#)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("note.txt");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(b"Hello world").unwrap();

        let api = api_for(&server);
        let result = api.upload(&path).await.unwrap();
        assert_eq!(result.text, "Hello world");
        assert_eq!(result.language.as_deref(), Some("en"));
    }

    #[tokio::test]
    async fn upload_missing_file_is_file_error() {
        let server = mockito::Server::new_async().await;
        let api = api_for(&server);
        let err = api
            .upload(Path::new("/nonexistent/never/here.txt"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::File(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn fetch_audio_sends_cache_buster() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/get-audio")
            .match_query(mockito::Matcher::Regex("t=\\d+".into()))
            .with_status(200)
            .with_body(vec![0u8, 1, 2, 3])
            .create_async()
            .await;

        let api = api_for(&server);
        let bytes = api.fetch_audio().await.unwrap();
        assert_eq!(bytes.as_ref(), &[0u8, 1, 2, 3]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn download_audio_sends_filename() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/download-audio")
            .match_query(mockito::Matcher::UrlEncoded(
                "filename".into(),
                "report.v1".into(),
            ))
            .with_status(200)
            .with_body(vec![9u8, 9])
            .create_async()
            .await;

        let api = api_for(&server);
        let bytes = api.download_audio("report.v1").await.unwrap();
        assert_eq!(bytes.len(), 2);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn fetch_audio_not_found_is_application_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/get-audio")
            .match_query(mockito::Matcher::Any)
            .with_status(404)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error": "Audio file not found. Please generate speech first."}"#)
            .create_async()
            .await;

        let api = api_for(&server);
        let err = api.fetch_audio().await.unwrap_err();
        match err {
            ApiError::Application(msg) => assert!(msg.starts_with("Audio file not found")),
            other => panic!("expected Application, got {other:?}"),
        }
    }
}
