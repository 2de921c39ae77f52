use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::hls::ManifestError;
use crate::http::create_client;
use crate::{HttpConfig, PlayerError};

/// Fetches playlist documents.
#[async_trait]
pub trait ManifestLoader: Send + Sync {
    async fn load(&self, url: &Url) -> Result<String, ManifestError>;
}

/// Loads playlists over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpManifestLoader {
    client: Client,
}

impl HttpManifestLoader {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn from_config(config: &HttpConfig) -> Result<Self, PlayerError> {
        Ok(Self::new(create_client(config)?))
    }
}

#[async_trait]
impl ManifestLoader for HttpManifestLoader {
    async fn load(&self, url: &Url) -> Result<String, ManifestError> {
        debug!(url = %url, "Fetching playlist");
        let response = self.client.get(url.clone()).send().await?;

        if !response.status().is_success() {
            return Err(ManifestError::Status {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_load_returns_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/lesson/master.m3u8"))
            .respond_with(ResponseTemplate::new(200).set_body_string("#EXTM3U\n"))
            .mount(&server)
            .await;

        let loader = HttpManifestLoader::from_config(&HttpConfig::default()).unwrap();
        let url = Url::parse(&format!("{}/lesson/master.m3u8", server.uri())).unwrap();
        let body = loader.load(&url).await.unwrap();
        assert_eq!(body, "#EXTM3U\n");
    }

    #[tokio::test]
    async fn test_http_status_is_network_class() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let loader = HttpManifestLoader::from_config(&HttpConfig::default()).unwrap();
        let url = Url::parse(&format!("{}/missing.m3u8", server.uri())).unwrap();
        let err = loader.load(&url).await.unwrap_err();

        assert!(matches!(err, ManifestError::Status { status: 404, .. }));
        assert!(err.is_network());
    }
}
