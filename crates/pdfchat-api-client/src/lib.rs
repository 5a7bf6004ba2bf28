//! HTTP client for the PDF Chat backend.
//!
//! Provides a minimal client with generic GET/POST helpers and the domain methods the
//! workspace consumes (list, upload, ask, page count). `ApiClient` implements the
//! `DocumentSource`, `DocumentRenderer` and `ChatResponder` traits from `pdfchat-core`.

pub mod api;

use pdfchat_core::{ClientConfig, TransportError};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

pub use api::{AskRequest, AskResponse, UploadResponse};

/// Map a reqwest failure onto the transport taxonomy.
fn transport_error(err: reqwest::Error) -> TransportError {
    if err.is_decode() {
        TransportError::Decode(err.to_string())
    } else {
        TransportError::Request(err.to_string())
    }
}

/// HTTP client for the PDF Chat backend.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Request(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, TransportError> {
        Self::new(config.api_url.clone(), config.http_timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Turn non-2xx responses into `TransportError::Status`, keeping the body for diagnostics.
    async fn ensure_success(response: Response) -> Result<Response, TransportError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        tracing::debug!(status = status.as_u16(), body = %body, "API request failed");
        Err(TransportError::Status {
            status: status.as_u16(),
            body,
        })
    }

    /// GET request. Deserializes JSON response.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, TransportError> {
        let url = self.build_url(path);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(transport_error)?;

        let response = Self::ensure_success(response).await?;
        response.json().await.map_err(transport_error)
    }

    /// POST JSON body and deserialize response.
    pub async fn post_json<T: DeserializeOwned, B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, TransportError> {
        let url = self.build_url(path);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(transport_error)?;

        let response = Self::ensure_success(response).await?;
        response.json().await.map_err(transport_error)
    }

    /// POST multipart form and deserialize response.
    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<T, TransportError> {
        let url = self.build_url(path);
        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(transport_error)?;

        let response = Self::ensure_success(response).await?;
        response.json().await.map_err(transport_error)
    }

    /// Download raw bytes from an absolute URL (document contents live outside the API).
    pub async fn download(&self, url: &str) -> Result<Vec<u8>, TransportError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(transport_error)?;

        let response = Self::ensure_success(response).await?;
        let bytes = response.bytes().await.map_err(transport_error)?;
        Ok(bytes.to_vec())
    }

    /// Raw client for custom requests.
    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_url_trims_trailing_slash() {
        let client =
            ApiClient::new("http://127.0.0.1:8000/api/v1/", Duration::from_secs(5)).unwrap();
        assert_eq!(client.base_url(), "http://127.0.0.1:8000/api/v1");
        assert_eq!(
            client.build_url("/pdfs"),
            "http://127.0.0.1:8000/api/v1/pdfs"
        );
    }

    #[test]
    fn test_from_config_uses_default_base_url() {
        let client = ApiClient::from_config(&ClientConfig::default()).unwrap();
        assert_eq!(client.base_url(), "http://127.0.0.1:8000/api/v1");
    }

    #[tokio::test]
    async fn test_get_maps_error_status() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/broken")
            .with_status(503)
            .with_body("maintenance")
            .create_async()
            .await;

        let client = ApiClient::new(server.url(), Duration::from_secs(5)).unwrap();
        let err = client.get::<Vec<String>>("/broken").await.unwrap_err();

        assert_eq!(
            err,
            TransportError::Status {
                status: 503,
                body: "maintenance".to_string()
            }
        );
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_maps_decode_failure() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/garbage")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("not json")
            .create_async()
            .await;

        let client = ApiClient::new(server.url(), Duration::from_secs(5)).unwrap();
        let err = client.get::<Vec<String>>("/garbage").await.unwrap_err();

        assert!(matches!(err, TransportError::Decode(_)));
    }

    #[tokio::test]
    async fn test_connection_refused_is_request_error() {
        // Port 9 (discard) is not expected to accept HTTP connections.
        let client = ApiClient::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        let err = client.get::<Vec<String>>("/pdfs").await.unwrap_err();
        assert!(matches!(err, TransportError::Request(_)));
    }
}
