pub mod http_client;

use thiserror::Error;

use crate::actuator::config::DEFAULT_PORT;

pub use http_client::SvenClient;

pub const API_HOST_ENV: &str = "NEXT_PUBLIC_SVEN_API_URL";
pub const API_PORT_ENV: &str = "SVEN_API_PORT";

/// Where the control client finds the endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
}

impl ClientConfig {
    /// Host from `NEXT_PUBLIC_SVEN_API_URL` (default `localhost`), fixed port
    /// unless `SVEN_API_PORT` overrides it.
    pub fn from_env() -> Self {
        let host = std::env::var(API_HOST_ENV).ok();
        Self::for_host(host.as_deref())
    }

    pub fn for_host(host: Option<&str>) -> Self {
        let host = host
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .unwrap_or("localhost");
        let port = std::env::var(API_PORT_ENV)
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);
        Self {
            base_url: format!("http://{}:{}", host, port),
        }
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ClientError {
    /// The request never produced a response.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success status. `message` is the body's error text, or the status
    /// reason when the body carries none.
    #[error("{message}")]
    Status { status: u16, message: String },

    #[error("malformed response: {0}")]
    Malformed(String),
}
