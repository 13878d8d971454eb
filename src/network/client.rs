use crate::config::constants::HTTP_TIMEOUT_SECS;
use crate::network::errors::NetworkError;
use crate::network::identity::IdentityProfile;
use crate::network::PageSource;
use reqwest::header::HeaderMap;
use reqwest::{Client, Response};
use std::time::Duration;
use tracing::debug;

// * The HTTP engine shared by the listing scraper and the image downloader.
pub struct FastClient {
    inner: Client,
}

impl FastClient {
    // * Initializes the client with the desktop Chrome identity.
    pub fn new() -> Result<Self, NetworkError> {
        Self::with_identity(&IdentityProfile::desktop_chrome())
    }

    pub fn with_identity(identity: &IdentityProfile) -> Result<Self, NetworkError> {
        let mut headers = HeaderMap::new();
        identity.apply_to_headers(&mut headers)?;

        let client = Client::builder()
            .default_headers(headers)
            .cookie_store(true)
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()?;

        Ok(Self { inner: client })
    }

    async fn get(&self, url: &str) -> Result<Response, NetworkError> {
        let parsed = url::Url::parse(url).map_err(|_| NetworkError::InvalidUrl(url.to_string()))?;
        let resp = self.inner.get(parsed).send().await?;
        let status = resp.status();

        if !status.is_success() {
            return Err(NetworkError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        Ok(resp)
    }
}

impl PageSource for FastClient {
    // * Fetches a URL as text; an empty body is treated as a failure.
    async fn fetch_text(&self, url: &str) -> Result<String, NetworkError> {
        let body = self.get(url).await?.text().await?;

        if body.trim().is_empty() {
            return Err(NetworkError::EmptyResponse(url.to_string()));
        }

        debug!(url, bytes = body.len(), "Fetched document");
        Ok(body)
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, NetworkError> {
        let body = self.get(url).await?.bytes().await?;

        if body.is_empty() {
            return Err(NetworkError::EmptyResponse(url.to_string()));
        }

        debug!(url, bytes = body.len(), "Fetched binary payload");
        Ok(body.to_vec())
    }
}
