use crate::error::{Result, SyncError};
use reqwest::Client;
use std::time::Duration;

/// Configuration for the HTTP client with proper timeouts
pub struct NetworkConfig {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            request_timeout: Duration::from_secs(120),
            user_agent: format!("blobsync/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Create a properly configured HTTP client with timeouts
pub fn create_http_client(config: &NetworkConfig) -> Result<Client> {
    Client::builder()
        .connect_timeout(config.connect_timeout)
        .timeout(config.request_timeout)
        .user_agent(&config.user_agent)
        .build()
        .map_err(|e| SyncError::network(format!("Failed to create HTTP client: {}", e)))
}

/// Turn reqwest transport failures into user-facing messages
pub fn classify_network_error(error: &reqwest::Error, url: &str) -> SyncError {
    if error.is_timeout() {
        return SyncError::network(format!("Request to {} timed out", url));
    }

    if error.is_connect() {
        if is_dns_resolution_error(error) {
            return SyncError::network(format!(
                "Unable to resolve the host of {}. Check the URL and your network connection.",
                url
            ));
        }
        return SyncError::network(format!(
            "Failed to connect to {}. The service may be unreachable.",
            url
        ));
    }

    SyncError::network(format!("Network error when accessing {}: {}", url, error))
}

fn is_dns_resolution_error(error: &reqwest::Error) -> bool {
    let error_msg = error.to_string().to_lowercase();
    let dns_indicators = [
        "dns",
        "name resolution",
        "resolve",
        "lookup",
        "name or service not known",
        "no such host",
        "host not found",
        "getaddrinfo failed",
    ];

    dns_indicators
        .iter()
        .any(|&indicator| error_msg.contains(indicator))
}
