use async_trait::async_trait;
use reqwest::Client;
use tracing::trace;
use url::Url;

use crate::http::create_client;
use crate::progress::{ProgressPersistError, ProgressService, ProgressUpdate};
use crate::{HttpConfig, PlayerError};

/// Persists progress by POSTing the JSON payload to an endpoint.
#[derive(Debug, Clone)]
pub struct HttpProgressService {
    client: Client,
    endpoint: Url,
}

impl HttpProgressService {
    pub fn new(client: Client, endpoint: Url) -> Self {
        Self { client, endpoint }
    }

    pub fn from_config(endpoint: &str, config: &HttpConfig) -> Result<Self, PlayerError> {
        let endpoint = Url::parse(endpoint).map_err(|e| {
            PlayerError::UnsupportedConfig(format!("Invalid progress endpoint {endpoint}: {e}"))
        })?;
        Ok(Self::new(create_client(config)?, endpoint))
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl ProgressService for HttpProgressService {
    async fn update_progress(&self, update: ProgressUpdate) -> Result<(), ProgressPersistError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&update)
            .send()
            .await?;

        let status = response.status();
        trace!(status = %status, lesson_id = %update.lesson_id, "Progress endpoint answered");
        if !status.is_success() {
            return Err(ProgressPersistError::Status {
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn update() -> ProgressUpdate {
        ProgressUpdate {
            lesson_id: "lesson-9".into(),
            progress: 42,
            last_watched_position: 126.0,
            completed: false,
        }
    }

    #[tokio::test]
    async fn test_posts_json_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/progress"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let service = HttpProgressService::from_config(
            &format!("{}/progress", server.uri()),
            &HttpConfig::default(),
        )
        .unwrap();
        service.update_progress(update()).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        let body: serde_json::Value = requests[0].body_json().unwrap();
        assert_eq!(body["lessonId"], "lesson-9");
        assert_eq!(body["progress"], 42);
        assert_eq!(body["lastWatchedPosition"], 126.0);
        assert_eq!(body["completed"], false);
    }

    #[tokio::test]
    async fn test_non_success_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let service =
            HttpProgressService::from_config(&server.uri(), &HttpConfig::default()).unwrap();
        let err = service.update_progress(update()).await.unwrap_err();
        assert!(matches!(err, ProgressPersistError::Status { status: 500 }));
    }

    #[test]
    fn test_invalid_endpoint() {
        assert!(matches!(
            HttpProgressService::from_config("not a url", &HttpConfig::default()),
            Err(PlayerError::UnsupportedConfig(_))
        ));
    }
}
