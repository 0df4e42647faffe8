//! Remote authority boundary.

use async_trait::async_trait;
use std::time::Duration;
use url::Url;

use crate::sync::types::{Credential, Snapshot, SyncError};

/// The authoritative ledger service.
///
/// One request/response exchange per call. Retries and batching are left to
/// implementations.
#[async_trait]
pub trait RemoteAuthority: Send + Sync {
    /// Send the local snapshot and receive the authority's view.
    async fn exchange(
        &self,
        user_id: &str,
        snapshot: &Snapshot,
        credential: &Credential,
    ) -> Result<Snapshot, SyncError>;
}

/// JSON-over-HTTP authority.
///
/// POSTs the snapshot to `{endpoint}/users/{user_id}/ledger/sync` with bearer
/// auth and expects a snapshot back.
pub struct HttpAuthority {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpAuthority {
    /// # Errors
    /// Returns an error if `endpoint` is not a valid base URL or the HTTP
    /// client cannot be built.
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, SyncError> {
        let endpoint = Url::parse(endpoint)?;
        if endpoint.cannot_be_a_base() {
            return Err(SyncError::InvalidEndpoint(endpoint.to_string()));
        }
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, endpoint })
    }

    fn sync_url(&self, user_id: &str) -> Result<Url, SyncError> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| SyncError::InvalidEndpoint(self.endpoint.to_string()))?
            .pop_if_empty()
            .extend(["users", user_id, "ledger", "sync"]);
        Ok(url)
    }
}

#[async_trait]
impl RemoteAuthority for HttpAuthority {
    async fn exchange(
        &self,
        user_id: &str,
        snapshot: &Snapshot,
        credential: &Credential,
    ) -> Result<Snapshot, SyncError> {
        let url = self.sync_url(user_id)?;
        tracing::debug!(%url, total_xp = snapshot.total_xp, "sending ledger snapshot");

        let response = self
            .client
            .post(url)
            .bearer_auth(credential.expose())
            .json(snapshot)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}
