use reqwest::Client;
use tracing::debug;

use crate::{HttpConfig, PlayerError};

/// Create a reqwest Client with the provided configuration
pub fn create_client(config: &HttpConfig) -> Result<Client, PlayerError> {
    let mut client_builder = Client::builder()
        .pool_max_idle_per_host(2)
        .user_agent(&config.user_agent)
        .default_headers(config.headers.clone())
        .redirect(if config.follow_redirects {
            reqwest::redirect::Policy::limited(10)
        } else {
            reqwest::redirect::Policy::none()
        });

    if !config.timeout.is_zero() {
        client_builder = client_builder.timeout(config.timeout);
    }

    if !config.connect_timeout.is_zero() {
        client_builder = client_builder.connect_timeout(config.connect_timeout);
    }

    debug!(
        timeout_s = config.timeout.as_secs(),
        connect_timeout_s = config.connect_timeout.as_secs(),
        "Building HTTP client"
    );

    client_builder.build().map_err(PlayerError::from)
}
