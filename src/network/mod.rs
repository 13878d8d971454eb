// * HTTP access for both pipelines.
// * Everything above this layer sees the network only through `PageSource`.

pub mod client;
pub mod errors;
pub mod identity;

pub use client::FastClient;
pub use errors::NetworkError;
pub use identity::IdentityProfile;

/// Fetches documents and binary payloads by URL.
#[allow(async_fn_in_trait)]
pub trait PageSource {
    async fn fetch_text(&self, url: &str) -> Result<String, NetworkError>;

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, NetworkError>;
}
