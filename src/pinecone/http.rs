//! HTTP utilities for Pinecone control-plane calls

use super::error::{Error, Result};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Serialize;

/// Header carrying the API key on every request
pub const API_KEY_HEADER: &str = "Api-Key";

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Sanitize response body for logging
/// Truncates long responses and strips control characters
pub(crate) fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let mut end = MAX_LOG_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... [truncated, {} bytes total]", &body[..end], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// Status and raw body of a completed request
#[derive(Debug)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: String,
}

impl ApiResponse {
    /// Fail with the status code if the remote rejected the request
    pub fn error_for_status(self, operation: &'static str) -> Result<Self> {
        if self.status.as_u16() >= 400 {
            // Security: Only log sanitized/truncated error body to avoid leaking sensitive data
            tracing::error!(
                "API error: {} {} - {}",
                operation,
                self.status,
                sanitize_for_log(&self.body)
            );
            return Err(Error::Status {
                operation,
                status: self.status.as_u16(),
            });
        }
        Ok(self)
    }
}

/// HTTP client wrapper for control-plane calls
#[derive(Clone)]
pub struct PineconeHttpClient {
    client: Client,
    api_key: String,
}

impl std::fmt::Debug for PineconeHttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PineconeHttpClient")
            .field("api_key", &"***")
            .finish()
    }
}

impl PineconeHttpClient {
    /// Create a new HTTP client
    pub fn new(api_key: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("pinecone-provider/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            api_key: api_key.to_string(),
        })
    }

    /// Make a GET request
    pub async fn get(&self, url: &str, accept: &str) -> Result<ApiResponse> {
        tracing::debug!("GET {}", url);
        self.send(self.client.get(url), accept).await
    }

    /// Make a POST request with a JSON body
    pub async fn post<T: Serialize + ?Sized>(&self, url: &str, accept: &str, body: &T) -> Result<ApiResponse> {
        tracing::debug!("POST {}", url);
        let request = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(serde_json::to_vec(body)?);
        self.send(request, accept).await
    }

    /// Make a PATCH request with a JSON body
    pub async fn patch<T: Serialize + ?Sized>(&self, url: &str, accept: &str, body: &T) -> Result<ApiResponse> {
        tracing::debug!("PATCH {}", url);
        let request = self
            .client
            .patch(url)
            .header(CONTENT_TYPE, "application/json")
            .body(serde_json::to_vec(body)?);
        self.send(request, accept).await
    }

    /// Make a DELETE request
    pub async fn delete(&self, url: &str, accept: &str) -> Result<ApiResponse> {
        tracing::debug!("DELETE {}", url);
        self.send(self.client.delete(url), accept).await
    }

    async fn send(&self, request: RequestBuilder, accept: &str) -> Result<ApiResponse> {
        let response = request
            .header(ACCEPT, accept)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        tracing::debug!("-> {}", status);

        Ok(ApiResponse { status, body })
    }
}
