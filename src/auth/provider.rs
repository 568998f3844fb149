//! Token provider trait and credential implementations
//!
//! Two credential variants are supported, mirroring the service principal
//! flows Azure accepts: a certificate-backed client assertion and a shared
//! client secret. Only the certificate path is exercised by the sync
//! pipeline; the secret path exists for scripted use of the library.

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use time::OffsetDateTime;
use tracing::debug;

use crate::cert::LocalCertificate;
use crate::error::{Result, SyncError};
use crate::utils::network::{classify_network_error, create_http_client, NetworkConfig};

const CLIENT_ASSERTION_TYPE: &str = "urn:ietf:params:oauth:client-assertion-type:jwt-bearer";

/// Assertion lifetime; token endpoints reject anything much longer
const ASSERTION_LIFETIME_SECS: i64 = 600;

/// Trait for bearer token acquisition.
///
/// `authority` and `resource` arrive from the vault's authentication
/// challenge rather than configuration, which is why the tool needs no
/// tenant argument.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    async fn get_token(&self, authority: &str, resource: &str) -> Result<String>;
}

/// Service principal credential backed by a certificate client assertion
pub struct CertificateCredential {
    client_id: String,
    certificate: LocalCertificate,
    http_client: Client,
}

impl CertificateCredential {
    pub fn new(client_id: String, certificate: LocalCertificate) -> Result<Self> {
        Ok(Self {
            client_id,
            certificate,
            http_client: create_http_client(&NetworkConfig::default())?,
        })
    }
}

#[async_trait]
impl AccessTokenProvider for CertificateCredential {
    async fn get_token(&self, authority: &str, resource: &str) -> Result<String> {
        require("authority", authority)?;
        require("resource", resource)?;
        require("client-id", &self.client_id)?;

        let endpoint = token_endpoint(authority);
        let assertion = build_client_assertion(&self.client_id, &self.certificate, &endpoint)?;

        debug!(
            "Requesting token for {} from {} with certificate {}",
            resource, endpoint, self.certificate.thumbprint
        );

        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("resource", resource),
            ("client_assertion_type", CLIENT_ASSERTION_TYPE),
            ("client_assertion", assertion.as_str()),
        ];
        request_token(&self.http_client, &endpoint, &form).await
    }
}

/// Service principal credential backed by a shared client secret
pub struct ClientSecretCredential {
    client_id: String,
    client_secret: String,
    http_client: Client,
}

impl ClientSecretCredential {
    pub fn new(client_id: String, client_secret: String) -> Result<Self> {
        Ok(Self {
            client_id,
            client_secret,
            http_client: create_http_client(&NetworkConfig::default())?,
        })
    }
}

#[async_trait]
impl AccessTokenProvider for ClientSecretCredential {
    async fn get_token(&self, authority: &str, resource: &str) -> Result<String> {
        require("authority", authority)?;
        require("resource", resource)?;
        require("client-id", &self.client_id)?;
        require("client-secret", &self.client_secret)?;

        let endpoint = token_endpoint(authority);
        debug!("Requesting token for {} from {}", resource, endpoint);

        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("resource", resource),
            ("client_secret", self.client_secret.as_str()),
        ];
        request_token(&self.http_client, &endpoint, &form).await
    }
}

#[derive(Debug, Serialize)]
struct AssertionClaims {
    aud: String,
    iss: String,
    sub: String,
    jti: String,
    nbf: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Client-credentials token endpoint for an authority URL
pub fn token_endpoint(authority: &str) -> String {
    format!("{}/oauth2/token", authority.trim_end_matches('/'))
}

/// Build the signed JWT the token endpoint accepts in place of a secret.
///
/// The `x5t` header carries the certificate thumbprint so the authority can
/// match the assertion against the registered certificate.
pub fn build_client_assertion(
    client_id: &str,
    certificate: &LocalCertificate,
    audience: &str,
) -> Result<String> {
    let key_pem = certificate.private_key_pem.as_deref().ok_or_else(|| {
        SyncError::authentication(format!(
            "Certificate {} has no private key; add the key to its PEM file in the store",
            certificate.thumbprint
        ))
    })?;

    let mut header = Header::new(Algorithm::RS256);
    header.x5t = Some(URL_SAFE_NO_PAD.encode(Sha1::digest(&certificate.der)));

    let now = OffsetDateTime::now_utc().unix_timestamp();
    let claims = AssertionClaims {
        aud: audience.to_string(),
        iss: client_id.to_string(),
        sub: client_id.to_string(),
        jti: uuid::Uuid::new_v4().to_string(),
        nbf: now,
        exp: now + ASSERTION_LIFETIME_SECS,
    };

    let key = EncodingKey::from_rsa_pem(key_pem.as_bytes()).map_err(|e| {
        SyncError::authentication(format!(
            "Private key for certificate {} is not a usable RSA key: {}",
            certificate.thumbprint, e
        ))
    })?;

    encode(&header, &claims, &key)
        .map_err(|e| SyncError::authentication(format!("Failed to sign client assertion: {}", e)))
}

async fn request_token(client: &Client, endpoint: &str, form: &[(&str, &str)]) -> Result<String> {
    let response = client
        .post(endpoint)
        .form(form)
        .send()
        .await
        .map_err(|e| classify_network_error(&e, endpoint))?;

    if !response.status().is_success() {
        let status = response.status();
        let error_text = response.text().await.unwrap_or_default();
        return Err(SyncError::authentication(format!(
            "Token request failed: HTTP {} - {}",
            status, error_text
        )));
    }

    let token: TokenResponse = response.json().await.map_err(|e| {
        SyncError::serialization(format!("Failed to parse token response: {}", e))
    })?;

    Ok(token.access_token)
}

fn require(name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(SyncError::invalid_argument(format!(
            "{} must not be empty",
            name
        )));
    }
    Ok(())
}
