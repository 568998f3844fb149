//! Command-line definition and pipeline execution
//!
//! The parsed arguments are the entire run configuration: immutable,
//! created once, alive for the process lifetime.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::{debug, info};

use crate::auth::CertificateCredential;
use crate::cert::{CertificateProvider, DirectoryCertificateStore, StoreLocation};
use crate::error::Result;
use crate::storage::{collect_containers, BlobListClient, StorageAccount};
use crate::sync::{plan_jobs, SyncOrchestrator};
use crate::vault::VaultClient;

#[derive(Debug, Parser)]
#[command(name = "blobsync")]
#[command(about = "Mirror every container of a storage account to local directories via azcopy")]
#[command(version)]
pub struct Cli {
    /// The service principal client id to authenticate to KeyVault
    #[arg(short = 'c', long, env = "AZURE_CLIENT_ID")]
    pub client_id: String,

    /// The certificate thumbprint used to authenticate with client-id
    #[arg(short = 't', long, env = "AZURE_CERT_THUMBPRINT")]
    pub thumbprint: String,

    /// The URL to the KeyVault instance
    #[arg(short = 'k', long, env = "AZURE_KEY_VAULT_URL")]
    pub key_vault_url: String,

    /// The secret name in KeyVault containing the SAS connection string
    #[arg(short = 's', long)]
    pub secret_name: String,

    /// Extra options to pass to azcopy
    #[arg(short = 'a', long, allow_hyphen_values = true)]
    pub azcopy_options: Option<String>,

    /// Prints verbose messages to standard output
    #[arg(short = 'v', long, default_value_t = false)]
    pub verbose: bool,

    /// Skips running azcopy, but will display the commands it would execute
    #[arg(short = 'w', long, default_value_t = false)]
    pub what_if: bool,

    /// Certificate store directory (defaults to the per-user store)
    #[arg(long, env = "BLOBSYNC_CERT_DIR")]
    pub cert_dir: Option<PathBuf>,
}

impl Cli {
    /// Run the pipeline: locate certificate, authenticate, fetch the
    /// connection string secret, list containers, sync each one.
    pub async fn execute(self) -> Result<()> {
        if self.what_if {
            info!("What-If mode enabled, azcopy will not be run");
        }

        let store = match &self.cert_dir {
            Some(dir) => DirectoryCertificateStore::at(dir),
            None => DirectoryCertificateStore::open(StoreLocation::CurrentUser)?,
        };

        debug!("Loading certificate with thumbprint {}", self.thumbprint);
        // expired certificates are not filtered out; the authority decides
        // whether to accept them
        let certificate = store.find(&self.thumbprint, false)?;
        debug!(
            "Using certificate {} ({}), expires {}",
            certificate.thumbprint, certificate.subject, certificate.not_after
        );

        let credential = Arc::new(CertificateCredential::new(
            self.client_id.clone(),
            certificate,
        )?);

        let vault = VaultClient::new(&self.key_vault_url, credential)?;
        debug!(
            "Getting secret {} from KeyVault {}",
            self.secret_name,
            vault.vault_url()
        );
        let secret = vault.get_secret(&self.secret_name).await?;

        debug!("Parsing storage account connection string");
        let account = StorageAccount::parse(&self.secret_name, &secret)?;

        debug!("Retrieving storage account container names");
        let lister = BlobListClient::new(&account)?;
        let containers = collect_containers(&lister).await?;
        debug!("Found containers: {}", containers.join(", "));

        let jobs = plan_jobs(&account, &containers);
        let orchestrator = SyncOrchestrator::new(self.azcopy_options.as_deref(), self.what_if);
        orchestrator.run_all(&jobs).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_and_long_flags_parse() {
        let cli = Cli::try_parse_from([
            "blobsync",
            "-c",
            "client-123",
            "-t",
            "ABCD",
            "-k",
            "https://v.vault.azure.net",
            "-s",
            "sas-secret",
            "-a",
            "--recursive",
            "-v",
            "-w",
        ])
        .unwrap();

        assert_eq!(cli.client_id, "client-123");
        assert_eq!(cli.thumbprint, "ABCD");
        assert_eq!(cli.key_vault_url, "https://v.vault.azure.net");
        assert_eq!(cli.secret_name, "sas-secret");
        assert_eq!(cli.azcopy_options.as_deref(), Some("--recursive"));
        assert!(cli.verbose);
        assert!(cli.what_if);
    }

    #[test]
    fn test_azcopy_options_accept_hyphen_leading_values() {
        // azcopy pass-through options essentially always start with --
        let cli = Cli::try_parse_from([
            "blobsync",
            "--client-id",
            "c",
            "--thumbprint",
            "t",
            "--key-vault-url",
            "https://v.vault.azure.net",
            "--secret-name",
            "s",
            "--azcopy-options",
            "--recursive --log-level=INFO",
        ])
        .unwrap();

        assert_eq!(
            cli.azcopy_options.as_deref(),
            Some("--recursive --log-level=INFO")
        );
    }

    #[test]
    fn test_required_arguments_are_enforced() {
        // missing --secret-name
        let result = Cli::try_parse_from([
            "blobsync",
            "--client-id",
            "c",
            "--thumbprint",
            "t",
            "--key-vault-url",
            "https://v",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_flags_default_to_off() {
        let cli = Cli::try_parse_from([
            "blobsync",
            "--client-id",
            "c",
            "--thumbprint",
            "t",
            "--key-vault-url",
            "https://v.vault.azure.net",
            "--secret-name",
            "s",
        ])
        .unwrap();

        assert!(!cli.verbose);
        assert!(!cli.what_if);
        assert!(cli.azcopy_options.is_none());
        assert!(cli.cert_dir.is_none());
    }
}
