//! SAS connection string parsing and source URL construction
//!
//! The vault secret must be a storage account connection string of the
//! `BlobEndpoint=...;SharedAccessSignature=...` shape. The SAS must grant at
//! least Read + List on the Blob service; an insufficient token is not
//! detectable here and surfaces later as an authorization failure from the
//! listing call or from azcopy.

use std::collections::HashMap;

use url::Url;

use crate::error::{Result, SyncError};

/// Parsed storage account connection descriptor
#[derive(Debug, Clone)]
pub struct StorageAccount {
    blob_endpoint: Url,
    sas_token: String,
}

/// Parse a connection string into key-value pairs
pub fn parse_connection_string(connection_string: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();

    for pair in connection_string.split(';') {
        if let Some((key, value)) = pair.split_once('=') {
            params.insert(key.trim().to_string(), value.trim().to_string());
        }
    }

    params
}

impl StorageAccount {
    /// Parse the secret value fetched from the vault. `secret_name` only
    /// feeds the error messages, matching the original tool's diagnostics.
    ///
    /// Both connection string shapes count as well-formed: an explicit
    /// `BlobEndpoint=`, or `AccountName=` with the endpoint derived from
    /// the account (honoring `DefaultEndpointsProtocol`/`EndpointSuffix`).
    /// A well-formed string without a SAS is the distinct missing-SAS
    /// error, not a parse error.
    pub fn parse(secret_name: &str, connection_string: &str) -> Result<Self> {
        let params = parse_connection_string(connection_string);
        let invalid = || SyncError::InvalidConnectionString {
            name: secret_name.to_string(),
        };

        let endpoint = if let Some(endpoint) = params.get("BlobEndpoint").filter(|v| !v.is_empty())
        {
            endpoint.clone()
        } else if let Some(account) = params.get("AccountName").filter(|v| !v.is_empty()) {
            let protocol = params
                .get("DefaultEndpointsProtocol")
                .filter(|v| !v.is_empty())
                .map(String::as_str)
                .unwrap_or("https");
            let suffix = params
                .get("EndpointSuffix")
                .filter(|v| !v.is_empty())
                .map(String::as_str)
                .unwrap_or("core.windows.net");
            format!("{}://{}.blob.{}/", protocol, account, suffix)
        } else {
            return Err(invalid());
        };

        let blob_endpoint = Url::parse(&endpoint)
            .ok()
            .filter(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
            .ok_or_else(invalid)?;

        let sas_token = params
            .get("SharedAccessSignature")
            .map(|v| v.trim_start_matches('?').to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| SyncError::MissingSasToken {
                name: secret_name.to_string(),
            })?;

        Ok(Self {
            blob_endpoint,
            sas_token,
        })
    }

    pub fn blob_endpoint(&self) -> &Url {
        &self.blob_endpoint
    }

    pub fn sas_token(&self) -> &str {
        &self.sas_token
    }

    /// azcopy source URL for one container: the blob endpoint with the
    /// container as path and the SAS query appended unchanged.
    pub fn source_url(&self, container: &str) -> Url {
        let mut url = self.blob_endpoint.clone();
        url.set_path(container);
        url.set_query(Some(&self.sas_token));
        url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONNECTION: &str =
        "BlobEndpoint=https://acct.blob.core.windows.net/;SharedAccessSignature=sv=2021-06-08&ss=b&srt=sco&sp=rl&sig=abc%2Bdef";

    #[test]
    fn test_parse_connection_string_pairs() {
        let params = parse_connection_string("A=1;B=x=y;C=3");
        assert_eq!(params.get("A"), Some(&"1".to_string()));
        // values may themselves contain '='
        assert_eq!(params.get("B"), Some(&"x=y".to_string()));
        assert_eq!(params.get("C"), Some(&"3".to_string()));
    }

    #[test]
    fn test_parse_valid_sas_connection_string() {
        let account = StorageAccount::parse("my-secret", CONNECTION).unwrap();
        assert_eq!(
            account.blob_endpoint().as_str(),
            "https://acct.blob.core.windows.net/"
        );
        assert_eq!(
            account.sas_token(),
            "sv=2021-06-08&ss=b&srt=sco&sp=rl&sig=abc%2Bdef"
        );
    }

    #[test]
    fn test_leading_question_mark_is_stripped_from_sas() {
        let account = StorageAccount::parse(
            "s",
            "BlobEndpoint=https://acct.blob.core.windows.net/;SharedAccessSignature=?sv=1&sig=x",
        )
        .unwrap();
        assert_eq!(account.sas_token(), "sv=1&sig=x");
    }

    #[test]
    fn test_source_url_appends_container_path_and_sas_unchanged() {
        let account = StorageAccount::parse("s", CONNECTION).unwrap();
        let url = account.source_url("logs");
        assert_eq!(
            url.as_str(),
            "https://acct.blob.core.windows.net/logs?sv=2021-06-08&ss=b&srt=sco&sp=rl&sig=abc%2Bdef"
        );
    }

    #[test]
    fn test_source_urls_differ_only_in_path_segment() {
        let account = StorageAccount::parse("s", CONNECTION).unwrap();
        let a = account.source_url("a");
        let b = account.source_url("b");
        assert_eq!(a.path(), "/a");
        assert_eq!(b.path(), "/b");
        assert_eq!(a.query(), b.query());
        assert_eq!(a.host_str(), b.host_str());
    }

    #[test]
    fn test_account_name_form_derives_the_blob_endpoint() {
        let account = StorageAccount::parse(
            "s",
            "DefaultEndpointsProtocol=https;AccountName=acct;SharedAccessSignature=sv=1&sig=x;EndpointSuffix=core.windows.net",
        )
        .unwrap();
        assert_eq!(
            account.blob_endpoint().as_str(),
            "https://acct.blob.core.windows.net/"
        );
    }

    #[test]
    fn test_account_key_string_without_sas_is_a_missing_sas_error() {
        // well-formed account connection string, wrong credential kind:
        // this is the -4 case, not the -3 parse failure
        let err = StorageAccount::parse("my-secret", "AccountName=acct;AccountKey=abc123==")
            .unwrap_err();
        assert!(matches!(err, SyncError::MissingSasToken { .. }));
        assert_eq!(err.exit_code(), -4);
    }

    #[test]
    fn test_non_connection_string_secret_fails_with_code_minus_three() {
        let err = StorageAccount::parse("my-secret", "just a password").unwrap_err();
        assert!(matches!(err, SyncError::InvalidConnectionString { .. }));
        assert_eq!(err.exit_code(), -3);
        assert!(err.to_string().contains("my-secret"));
    }

    #[test]
    fn test_invalid_endpoint_url_fails_as_connection_string_error() {
        let err =
            StorageAccount::parse("s", "BlobEndpoint=not-a-url;SharedAccessSignature=sv=1")
                .unwrap_err();
        assert!(matches!(err, SyncError::InvalidConnectionString { .. }));
    }

    #[test]
    fn test_missing_sas_fails_with_code_minus_four() {
        let err = StorageAccount::parse(
            "my-secret",
            "BlobEndpoint=https://acct.blob.core.windows.net/",
        )
        .unwrap_err();
        assert!(matches!(err, SyncError::MissingSasToken { .. }));
        assert_eq!(err.exit_code(), -4);
    }

    #[test]
    fn test_empty_sas_fails_with_code_minus_four() {
        let err = StorageAccount::parse(
            "s",
            "BlobEndpoint=https://acct.blob.core.windows.net/;SharedAccessSignature=",
        )
        .unwrap_err();
        assert!(matches!(err, SyncError::MissingSasToken { .. }));
    }
}
