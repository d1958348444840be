use super::{expiration_from_now, ObjectUrlClient, PathResolver, S3ObjectClient};
use crate::models::{InvalidationStatus, ObjectStoreConfig};
use crate::paths::compute_path;
use crate::{Error, Result};
use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{debug, info};

/// Serves assets directly from a bucket. Objects are always read live, so
/// there is nothing to invalidate.
pub struct ObjectStoreAdapter {
    config: ObjectStoreConfig,
    client: OnceCell<Box<dyn ObjectUrlClient>>,
}

impl ObjectStoreAdapter {
    /// The S3 client is built on first use.
    pub fn new(config: ObjectStoreConfig) -> Self {
        Self {
            config,
            client: OnceCell::new(),
        }
    }

    pub fn with_client(config: ObjectStoreConfig, client: Box<dyn ObjectUrlClient>) -> Self {
        Self {
            config,
            client: OnceCell::from(client),
        }
    }

    async fn client(&self) -> Result<&dyn ObjectUrlClient> {
        let client = self
            .client
            .get_or_try_init(|| async {
                info!("Creating S3 client for bucket {}", self.config.bucket);
                let client = S3ObjectClient::new(&self.config).await?;
                Ok::<_, Error>(Box::new(client) as Box<dyn ObjectUrlClient>)
            })
            .await?;
        Ok(client.as_ref())
    }
}

#[async_trait]
impl PathResolver for ObjectStoreAdapter {
    async fn get_path(&self, relative_path: &str, _is_flushable: bool) -> Result<String> {
        let key = compute_path(&self.config.directory, relative_path);
        let expires_at = self
            .config
            .expiration_seconds
            .map(expiration_from_now)
            .transpose()?;

        self.client()
            .await?
            .object_url(&self.config.bucket, &key, expires_at)
            .await
    }

    async fn flush_paths(&self, paths: &[String]) -> Result<Option<String>> {
        debug!("Ignoring flush of {} path(s) on object storage", paths.len());
        Ok(None)
    }

    async fn get_flush_status(&self, _id: &str) -> Result<Option<InvalidationStatus>> {
        Ok(None)
    }
}
