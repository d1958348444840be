use super::{
    expiration_from_now, CloudFrontClient, InvalidationClient, PathResolver, UrlSigner,
};
use crate::models::{DistributionConfig, InvalidationRequest, InvalidationStatus};
use crate::paths::{compute_path, join_url};
use crate::{Error, Result};
use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{error, info, warn};

/// Serves assets through a CloudFront distribution, optionally as signed
/// expiring links, and evicts changed paths from its caches.
pub struct DistributionAdapter {
    config: DistributionConfig,
    signer: Option<UrlSigner>,
    client: OnceCell<Box<dyn InvalidationClient>>,
}

impl DistributionAdapter {
    /// Fails only when signing key material is present but unusable. The
    /// CloudFront client is built on first use.
    pub fn new(config: DistributionConfig) -> Result<Self> {
        let signer = Self::build_signer(&config)?;
        Ok(Self {
            config,
            signer,
            client: OnceCell::new(),
        })
    }

    pub fn with_client(
        config: DistributionConfig,
        client: Box<dyn InvalidationClient>,
    ) -> Result<Self> {
        let signer = Self::build_signer(&config)?;
        Ok(Self {
            config,
            signer,
            client: OnceCell::from(client),
        })
    }

    fn build_signer(config: &DistributionConfig) -> Result<Option<UrlSigner>> {
        let private_key = config.private_key.as_deref().filter(|k| !k.is_empty());
        let key_pair_id = config.key_pair_id.as_deref().filter(|k| !k.is_empty());

        match (private_key, key_pair_id) {
            (Some(private_key), Some(key_pair_id)) => {
                Ok(Some(UrlSigner::from_pem(private_key, key_pair_id)?))
            }
            _ => Ok(None),
        }
    }

    async fn client(&self) -> Result<&dyn InvalidationClient> {
        let client = self
            .client
            .get_or_try_init(|| async {
                info!(
                    "Creating CloudFront client for distribution {}",
                    self.config.distribution_id
                );
                let client = CloudFrontClient::new(
                    self.config.access_key_id.clone(),
                    self.config.secret_access_key.clone(),
                    None,
                )
                .await?;
                Ok::<_, Error>(Box::new(client) as Box<dyn InvalidationClient>)
            })
            .await?;
        Ok(client.as_ref())
    }
}

#[async_trait]
impl PathResolver for DistributionAdapter {
    async fn get_path(&self, relative_path: &str, _is_flushable: bool) -> Result<String> {
        let key = compute_path(&self.config.directory, relative_path);
        let url = join_url(&self.config.host_url, &key);

        match (self.config.expiration_seconds, &self.signer) {
            (Some(seconds), Some(signer)) => signer.sign(&url, expiration_from_now(seconds)?),
            _ => Ok(url),
        }
    }

    async fn flush_paths(&self, paths: &[String]) -> Result<Option<String>> {
        let request = InvalidationRequest::new(&self.config.distribution_id, paths)?;
        let client = self
            .client()
            .await
            .map_err(|e| Error::InvalidationFailed(e.to_string()))?;

        info!(
            "Invalidating {} path(s) on distribution {} (ref {})",
            request.quantity(),
            request.distribution_id,
            request.caller_reference
        );

        let receipt = client.create_invalidation(&request).await.map_err(|e| {
            error!("Invalidation request failed: {}", e);
            Error::InvalidationFailed(e.to_string())
        })?;

        match InvalidationStatus::from_backend(&receipt.status) {
            Some(InvalidationStatus::Ok | InvalidationStatus::Waiting) => {
                info!("Invalidation {} accepted ({})", receipt.id, receipt.status);
                Ok(Some(receipt.id))
            }
            _ => {
                error!(
                    "Invalidation {} reported status {}",
                    receipt.id, receipt.status
                );
                Err(Error::InvalidationFailed(format!(
                    "invalidation {} reported status {}",
                    receipt.id, receipt.status
                )))
            }
        }
    }

    async fn get_flush_status(&self, id: &str) -> Result<Option<InvalidationStatus>> {
        let client = self
            .client()
            .await
            .map_err(|e| Error::StatusLookupFailed(e.to_string()))?;

        let status = client
            .get_invalidation(&self.config.distribution_id, id)
            .await
            .map_err(|e| {
                error!("Status lookup for invalidation {} failed: {}", id, e);
                Error::StatusLookupFailed(e.to_string())
            })?;

        let mapped = InvalidationStatus::from_backend(&status);
        if mapped.is_none() {
            warn!("Invalidation {} has unrecognized status {}", id, status);
        }
        Ok(mapped)
    }
}
