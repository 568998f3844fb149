//! Paginated container enumeration
//!
//! The Blob service returns container listings one service-sized page at a
//! time with an opaque continuation marker. The accumulation loop lives
//! behind the [`ListContainersApi`] trait so tests drive it with fixture
//! pages instead of a live account.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::error::{Result, SyncError};
use crate::storage::StorageAccount;
use crate::utils::network::{classify_network_error, create_http_client, NetworkConfig};

/// One page of container names plus the continuation marker, if any
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerPage {
    pub names: Vec<String>,
    pub next_marker: Option<String>,
}

/// One paged List Containers request
#[async_trait]
pub trait ListContainersApi: Send + Sync {
    async fn fetch_page(&self, marker: Option<&str>) -> Result<ContainerPage>;
}

/// Accumulate every page into the complete container list, in service
/// order. Terminates when a page carries no continuation marker; handles
/// zero, one, or many pages uniformly.
pub async fn collect_containers(api: &dyn ListContainersApi) -> Result<Vec<String>> {
    let mut names = Vec::new();
    let mut marker: Option<String> = None;

    loop {
        let page = api.fetch_page(marker.as_deref()).await?;
        names.extend(page.names);

        match page.next_marker {
            Some(next) if !next.is_empty() => marker = Some(next),
            _ => break,
        }
    }

    Ok(names)
}

// XML body of the List Containers operation

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct EnumerationResults {
    #[serde(default)]
    containers: ContainerList,
    next_marker: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ContainerList {
    #[serde(rename = "Container", default)]
    container: Vec<ContainerEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ContainerEntry {
    name: String,
}

/// Parse a List Containers response body into a page
pub fn parse_list_response(xml: &str) -> Result<ContainerPage> {
    let results: EnumerationResults = quick_xml::de::from_str(xml).map_err(|e| {
        SyncError::serialization(format!("Failed to parse container listing: {}", e))
    })?;

    Ok(ContainerPage {
        names: results
            .containers
            .container
            .into_iter()
            .map(|c| c.name)
            .collect(),
        next_marker: results.next_marker.filter(|m| !m.is_empty()),
    })
}

/// Live List Containers client over the account's blob endpoint + SAS
pub struct BlobListClient {
    account: StorageAccount,
    http_client: Client,
}

impl BlobListClient {
    pub fn new(account: &StorageAccount) -> Result<Self> {
        Ok(Self {
            account: account.clone(),
            http_client: create_http_client(&NetworkConfig::default())?,
        })
    }

    fn page_url(&self, marker: Option<&str>) -> Url {
        let mut url = self.account.blob_endpoint().clone();
        url.set_query(Some(self.account.sas_token()));
        url.query_pairs_mut().append_pair("comp", "list");
        if let Some(marker) = marker {
            url.query_pairs_mut().append_pair("marker", marker);
        }
        url
    }
}

#[async_trait]
impl ListContainersApi for BlobListClient {
    async fn fetch_page(&self, marker: Option<&str>) -> Result<ContainerPage> {
        let url = self.page_url(marker);
        debug!("Listing containers from {}", self.account.blob_endpoint());

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| classify_network_error(&e, self.account.blob_endpoint().as_str()))?;

        match response.status() {
            StatusCode::FORBIDDEN | StatusCode::UNAUTHORIZED => {
                Err(SyncError::azure_api(
                    "Container listing was refused. The SAS token must allow the Blob service \
                     with Read and List permissions on Service, Container and Object resources."
                        .to_string(),
                ))
            }
            status if !status.is_success() => {
                let error_text = response.text().await.unwrap_or_default();
                Err(SyncError::azure_api(format!(
                    "Failed to list containers: HTTP {} - {}",
                    status, error_text
                )))
            }
            _ => {
                let body = response.text().await.map_err(|e| {
                    SyncError::network(format!("Failed to read container listing: {}", e))
                })?;
                parse_list_response(&body)
            }
        }
    }
}
