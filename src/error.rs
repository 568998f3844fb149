use thiserror::Error;

/// Main error type for blobsync operations
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    #[error("Azure API error: {0}")]
    AzureApiError(String),

    #[error("Certificate not found: no certificate with thumbprint {thumbprint} in {store}")]
    CertificateNotFound { thumbprint: String, store: String },

    #[error("Certificate error: {0}")]
    CertificateError(String),

    #[error("key-vault-url is not a valid url: {0}")]
    InvalidVaultUrl(String),

    #[error("Secret not found: {name}")]
    SecretNotFound { name: String },

    #[error("KeyVault secret '{name}' is not a valid storage account connection string")]
    InvalidConnectionString { name: String },

    #[error("KeyVault secret '{name}' does not contain a valid SAS token")]
    MissingSasToken { name: String },

    #[error("Could not run {executable}. Is it in the current working directory or in the path?")]
    AzCopyNotFound { executable: String },

    #[error("azcopy sync of container '{container}' failed with exit code {code}")]
    AzCopyFailed { container: String, code: i32 },

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Regex error: {0}")]
    RegexError(#[from] regex::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl SyncError {
    pub fn authentication<S: Into<String>>(msg: S) -> Self {
        Self::AuthenticationError(msg.into())
    }

    pub fn azure_api<S: Into<String>>(msg: S) -> Self {
        Self::AzureApiError(msg.into())
    }

    pub fn certificate<S: Into<String>>(msg: S) -> Self {
        Self::CertificateError(msg.into())
    }

    pub fn certificate_not_found<S: Into<String>>(thumbprint: S, store: S) -> Self {
        Self::CertificateNotFound {
            thumbprint: thumbprint.into(),
            store: store.into(),
        }
    }

    pub fn secret_not_found<S: Into<String>>(name: S) -> Self {
        Self::SecretNotFound { name: name.into() }
    }

    pub fn network<S: Into<String>>(msg: S) -> Self {
        Self::NetworkError(msg.into())
    }

    pub fn serialization<S: Into<String>>(msg: S) -> Self {
        Self::SerializationError(msg.into())
    }

    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Process exit code for this error.
    ///
    /// The negative codes match the original StorageAccountSync tool so
    /// existing wrapper scripts keep working; `i32::MIN` marks "azcopy could
    /// not be launched at all", distinct from any azcopy exit code.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::CertificateNotFound { .. } => -1,
            Self::InvalidVaultUrl(_) => -2,
            Self::InvalidConnectionString { .. } => -3,
            Self::MissingSasToken { .. } => -4,
            Self::AzCopyNotFound { .. } => i32::MIN,
            Self::AzCopyFailed { code, .. } => *code,
            _ => 1,
        }
    }
}

/// Result type alias for blobsync operations
pub type Result<T> = std::result::Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_match_documented_contract() {
        assert_eq!(
            SyncError::certificate_not_found("AB12", "/tmp/store").exit_code(),
            -1
        );
        assert_eq!(
            SyncError::InvalidVaultUrl("not-a-url".into()).exit_code(),
            -2
        );
        assert_eq!(
            SyncError::InvalidConnectionString { name: "s".into() }.exit_code(),
            -3
        );
        assert_eq!(
            SyncError::MissingSasToken { name: "s".into() }.exit_code(),
            -4
        );
        assert_eq!(
            SyncError::AzCopyNotFound {
                executable: "azcopy".into()
            }
            .exit_code(),
            i32::MIN
        );
        assert_eq!(
            SyncError::AzCopyFailed {
                container: "logs".into(),
                code: 7
            }
            .exit_code(),
            7
        );
        assert_eq!(SyncError::authentication("denied").exit_code(), 1);
    }
}
