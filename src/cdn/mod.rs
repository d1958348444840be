//! CDN adapters for resolving asset URLs and invalidating cached copies
//!
//! [`ObjectStoreAdapter`] serves assets straight out of an S3-compatible
//! bucket; [`DistributionAdapter`] fronts them with a CloudFront distribution
//! and can evict paths from its edge caches. Both speak [`PathResolver`].

pub mod cloudfront;
pub mod distribution;
pub mod mock;
pub mod object_store;
pub mod s3;
pub mod signer;

pub use cloudfront::CloudFrontClient;
pub use distribution::DistributionAdapter;
pub use mock::{MockInvalidationClient, MockObjectClient};
pub use object_store::ObjectStoreAdapter;
pub use s3::S3ObjectClient;
pub use signer::UrlSigner;

use crate::models::{Config, InvalidationReceipt, InvalidationRequest, InvalidationStatus};
use crate::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};

/// Turns relative asset paths into public URLs and, where the backend caches,
/// evicts them.
#[async_trait]
pub trait PathResolver: Send + Sync {
    /// `is_flushable` is reserved for callers and is not consulted.
    async fn get_path(&self, relative_path: &str, is_flushable: bool) -> Result<String>;

    async fn flush(&self, path: &str) -> Result<Option<String>> {
        self.flush_paths(&[path.to_string()]).await
    }

    async fn flush_by_string(&self, path: &str) -> Result<Option<String>> {
        self.flush_paths(&[path.to_string()]).await
    }

    /// Returns the backend's invalidation id, or `None` when the backend has
    /// nothing to invalidate.
    async fn flush_paths(&self, paths: &[String]) -> Result<Option<String>>;

    async fn get_flush_status(&self, id: &str) -> Result<Option<InvalidationStatus>>;
}

/// Produces direct object URLs, presigned when an expiry is given.
#[async_trait]
pub trait ObjectUrlClient: Send + Sync {
    async fn object_url(
        &self,
        bucket: &str,
        key: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<String>;
}

#[async_trait]
pub trait InvalidationClient: Send + Sync {
    async fn create_invalidation(&self, request: &InvalidationRequest)
        -> Result<InvalidationReceipt>;

    /// Returns the backend's raw status string.
    async fn get_invalidation(&self, distribution_id: &str, id: &str) -> Result<String>;
}

/// Builds the adapter selected by `config`.
pub fn resolver_from_config(config: Config) -> Result<Box<dyn PathResolver>> {
    match config {
        Config::ObjectStore(config) => Ok(Box::new(ObjectStoreAdapter::new(config))),
        Config::Distribution(config) => Ok(Box::new(DistributionAdapter::new(config)?)),
    }
}

pub(crate) fn expiration_from_now(seconds: u64) -> Result<DateTime<Utc>> {
    i64::try_from(seconds)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .and_then(|delta| Utc::now().checked_add_signed(delta))
        .ok_or_else(|| Error::Config(format!("expiration interval out of range: {}s", seconds)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiration_from_now() {
        let before = Utc::now();
        let expires = expiration_from_now(3600).unwrap();
        let after = Utc::now();

        assert!(expires >= before + TimeDelta::seconds(3600));
        assert!(expires <= after + TimeDelta::seconds(3600));
    }

    #[tokio::test]
    async fn test_resolver_from_config() {
        let resolver = resolver_from_config(Config::Distribution(
            crate::models::DistributionConfig::new("https://cdn.test", "", "k", "s", "E1"),
        ))
        .unwrap();

        assert_eq!(
            resolver.get_path("a.png", false).await.unwrap(),
            "https://cdn.test/a.png"
        );
    }

    #[test]
    fn test_expiration_out_of_range() {
        assert!(matches!(
            expiration_from_now(u64::MAX),
            Err(Error::Config(_))
        ));
    }
}
