//! Read-only Key Vault secret client
//!
//! A single secret read over the REST API. The vault answers an
//! unauthenticated request with a Bearer challenge naming the authority and
//! resource to authenticate against; the configured credential turns those
//! into a token and the request is retried with it. This is why the CLI
//! takes no tenant argument: the tenant comes out of the challenge.

use std::fmt;
use std::sync::Arc;

use regex::Regex;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::auth::AccessTokenProvider;
use crate::error::{Result, SyncError};
use crate::utils::network::{classify_network_error, create_http_client, NetworkConfig};

const API_VERSION: &str = "7.4";

/// Authority and resource extracted from a `WWW-Authenticate` Bearer
/// challenge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BearerChallenge {
    pub authorization: String,
    pub resource: String,
}

/// Parse a Key Vault Bearer challenge header, e.g.
/// `Bearer authorization="https://login.microsoftonline.com/{tenant}",
/// resource="https://vault.azure.net"`.
///
/// Newer vaults send `scope=` instead of `resource=`; both are accepted.
pub fn parse_bearer_challenge(header: &str) -> Result<BearerChallenge> {
    let re = Regex::new(r#"(\w+)="([^"]*)""#)?;

    let mut authorization = None;
    let mut resource = None;
    for captures in re.captures_iter(header) {
        match &captures[1] {
            "authorization" | "authorization_uri" => {
                authorization = Some(captures[2].to_string())
            }
            "resource" => resource = Some(captures[2].to_string()),
            // scope is "{resource}/.default"; reduce it to the resource
            "scope" if resource.is_none() => {
                resource = Some(captures[2].trim_end_matches("/.default").to_string())
            }
            _ => {}
        }
    }

    match (authorization, resource) {
        (Some(authorization), Some(resource)) => Ok(BearerChallenge {
            authorization,
            resource,
        }),
        _ => Err(SyncError::authentication(format!(
            "Vault returned an unusable authentication challenge: {}",
            header
        ))),
    }
}

/// Client for reading secrets from one vault
pub struct VaultClient {
    vault_url: String,
    credential: Arc<dyn AccessTokenProvider>,
    http_client: Client,
}

// manual impl: the credential is a trait object and must not leak into
// debug output anyway
impl fmt::Debug for VaultClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VaultClient")
            .field("vault_url", &self.vault_url)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct SecretBundle {
    value: String,
}

impl VaultClient {
    /// Validate and normalize the vault base URL (trailing slash stripped).
    /// An unparsable URL fails here, before any network I/O.
    pub fn new(vault_url: &str, credential: Arc<dyn AccessTokenProvider>) -> Result<Self> {
        let parsed = Url::parse(vault_url)
            .map_err(|_| SyncError::InvalidVaultUrl(vault_url.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
            return Err(SyncError::InvalidVaultUrl(vault_url.to_string()));
        }

        Ok(Self {
            vault_url: parsed.as_str().trim_end_matches('/').to_string(),
            credential,
            http_client: create_http_client(&NetworkConfig::default())?,
        })
    }

    pub fn vault_url(&self) -> &str {
        &self.vault_url
    }

    /// Fetch the current value of a named secret
    pub async fn get_secret(&self, name: &str) -> Result<String> {
        let secret_url = format!(
            "{}/secrets/{}?api-version={}",
            self.vault_url, name, API_VERSION
        );

        // Unauthenticated probe; the 401 challenge tells us where to
        // authenticate.
        debug!("Requesting authentication challenge from {}", self.vault_url);
        let probe = self
            .http_client
            .get(&secret_url)
            .send()
            .await
            .map_err(|e| classify_network_error(&e, &secret_url))?;

        let response = if probe.status() == StatusCode::UNAUTHORIZED {
            let header = probe
                .headers()
                .get(reqwest::header::WWW_AUTHENTICATE)
                .and_then(|v| v.to_str().ok())
                .ok_or_else(|| {
                    SyncError::authentication(
                        "Vault returned 401 without an authentication challenge",
                    )
                })?;
            let challenge = parse_bearer_challenge(header)?;

            let token = self
                .credential
                .get_token(&challenge.authorization, &challenge.resource)
                .await?;

            self.http_client
                .get(&secret_url)
                .bearer_auth(&token)
                .send()
                .await
                .map_err(|e| classify_network_error(&e, &secret_url))?
        } else {
            probe
        };

        match response.status() {
            StatusCode::NOT_FOUND => Err(SyncError::secret_not_found(name)),
            status if !status.is_success() => {
                let error_text = response.text().await.unwrap_or_default();
                Err(SyncError::azure_api(format!(
                    "Failed to get secret '{}': HTTP {} - {}",
                    name, status, error_text
                )))
            }
            _ => {
                let bundle: SecretBundle = response.json().await.map_err(|e| {
                    SyncError::serialization(format!("Failed to parse secret response: {}", e))
                })?;
                Ok(bundle.value)
            }
        }
    }
}
