//! Data models and structures
//!
//! Adapter configuration, invalidation requests and the closed set of
//! invalidation statuses reported back to callers.

use crate::paths::normalize_invalidation_path;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvalidationStatus {
    Ok,
    ToSend,
    ToFlush,
    Error,
    Waiting,
}

impl InvalidationStatus {
    const TABLE: [(InvalidationStatus, &'static str); 5] = [
        (InvalidationStatus::Ok, "Completed"),
        (InvalidationStatus::ToSend, "STATUS_TO_SEND"),
        (InvalidationStatus::ToFlush, "STATUS_TO_FLUSH"),
        (InvalidationStatus::Error, "STATUS_ERROR"),
        (InvalidationStatus::Waiting, "InProgress"),
    ];

    /// Maps a backend status string; unknown strings have no counterpart.
    pub fn from_backend(status: &str) -> Option<Self> {
        Self::TABLE
            .iter()
            .find(|(_, backend)| *backend == status)
            .map(|(logical, _)| *logical)
    }

    pub fn backend_str(&self) -> &'static str {
        match self {
            InvalidationStatus::Ok => "Completed",
            InvalidationStatus::ToSend => "STATUS_TO_SEND",
            InvalidationStatus::ToFlush => "STATUS_TO_FLUSH",
            InvalidationStatus::Error => "STATUS_ERROR",
            InvalidationStatus::Waiting => "InProgress",
        }
    }
}

impl fmt::Display for InvalidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InvalidationStatus::Ok => "OK",
            InvalidationStatus::ToSend => "TO_SEND",
            InvalidationStatus::ToFlush => "TO_FLUSH",
            InvalidationStatus::Error => "ERROR",
            InvalidationStatus::Waiting => "WAITING",
        };
        f.write_str(name)
    }
}

/// A batch of paths to evict from a distribution's edge caches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvalidationRequest {
    pub distribution_id: String,
    pub paths: Vec<String>,
    pub caller_reference: String,
}

impl InvalidationRequest {
    pub fn new(distribution_id: &str, paths: &[String]) -> Result<Self> {
        if paths.is_empty() {
            return Err(Error::InvalidRequest(
                "at least one path is required".to_string(),
            ));
        }

        let mut normalized: Vec<String> = Vec::with_capacity(paths.len());
        for path in paths {
            let path = normalize_invalidation_path(path);
            if !normalized.contains(&path) {
                normalized.push(path);
            }
        }

        let caller_reference = caller_reference(&normalized);

        Ok(Self {
            distribution_id: distribution_id.to_string(),
            paths: normalized,
            caller_reference,
        })
    }

    pub fn quantity(&self) -> usize {
        self.paths.len()
    }
}

/// Hex MD5 of the sorted paths joined with `,`, so any ordering of the same
/// set produces the same reference.
pub fn caller_reference(paths: &[String]) -> String {
    let mut sorted: Vec<&str> = paths.iter().map(String::as_str).collect();
    sorted.sort_unstable();
    format!("{:x}", md5::compute(sorted.join(",").as_bytes()))
}

/// What the backend returns for an accepted invalidation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidationReceipt {
    pub id: String,
    pub status: String,
}

// Configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectStoreConfig {
    pub bucket: String,
    pub directory: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub expiration_seconds: Option<u64>,
    pub region: String,
    pub endpoint: Option<String>,
}

impl ObjectStoreConfig {
    pub const DEFAULT_REGION: &'static str = "us-east-1";

    pub fn new(
        bucket: impl Into<String>,
        directory: impl Into<String>,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        expiration_seconds: Option<u64>,
    ) -> Self {
        Self {
            bucket: bucket.into(),
            directory: directory.into(),
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            expiration_seconds,
            region: Self::DEFAULT_REGION.to_string(),
            endpoint: None,
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistributionConfig {
    pub host_url: String,
    pub directory: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub distribution_id: String,
    pub expiration_seconds: Option<u64>,
    /// PEM encoded RSA key, PKCS#1 or PKCS#8.
    pub private_key: Option<String>,
    pub key_pair_id: Option<String>,
}

impl DistributionConfig {
    pub fn new(
        host_url: impl Into<String>,
        directory: impl Into<String>,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        distribution_id: impl Into<String>,
    ) -> Self {
        Self {
            host_url: host_url.into(),
            directory: directory.into(),
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            distribution_id: distribution_id.into(),
            expiration_seconds: None,
            private_key: None,
            key_pair_id: None,
        }
    }

    pub fn with_expiration(mut self, seconds: u64) -> Self {
        self.expiration_seconds = Some(seconds);
        self
    }

    pub fn with_signing_key(
        mut self,
        private_key: impl Into<String>,
        key_pair_id: impl Into<String>,
    ) -> Self {
        self.private_key = Some(private_key.into());
        self.key_pair_id = Some(key_pair_id.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Config {
    ObjectStore(ObjectStoreConfig),
    Distribution(DistributionConfig),
}

impl Config {
    pub fn from_env() -> Result<Self> {
        load_env_file(Path::new(".env"))?;
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from any variable source; empty values count
    /// as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let required = |name: &str| {
            var(name).ok_or_else(|| Error::Config(format!("{} not set", name)))
        };

        let access_key_id = required("CDN_ACCESS_KEY_ID")?;
        let secret_access_key = required("CDN_SECRET_ACCESS_KEY")?;
        let directory = var("CDN_DIRECTORY").unwrap_or_default();
        let expiration_seconds = var("CDN_EXPIRATION_SECONDS")
            .map(|raw| {
                raw.trim().parse::<u64>().map_err(|_| {
                    Error::Config(format!("CDN_EXPIRATION_SECONDS is not a number: {}", raw))
                })
            })
            .transpose()?;

        let adapter = var("CDN_ADAPTER").unwrap_or_else(|| "s3".to_string());
        match adapter.to_lowercase().as_str() {
            "s3" => {
                let mut config = ObjectStoreConfig::new(
                    required("CDN_BUCKET")?,
                    directory,
                    access_key_id,
                    secret_access_key,
                    expiration_seconds,
                );
                if let Some(region) = var("CDN_REGION") {
                    config = config.with_region(region);
                }
                if let Some(endpoint) = var("CDN_ENDPOINT") {
                    config = config.with_endpoint(endpoint);
                }
                Ok(Config::ObjectStore(config))
            }
            "cloudfront" => {
                let private_key = var("CDN_PRIVATE_KEY_PATH")
                    .map(|path| std::fs::read_to_string(Path::new(&path)))
                    .transpose()?;

                Ok(Config::Distribution(DistributionConfig {
                    host_url: required("CDN_HOST_URL")?,
                    directory,
                    access_key_id,
                    secret_access_key,
                    distribution_id: required("CDN_DISTRIBUTION_ID")?,
                    expiration_seconds,
                    private_key,
                    key_pair_id: var("CDN_KEY_PAIR_ID"),
                }))
            }
            other => Err(Error::Config(format!(
                "CDN_ADAPTER must be 's3' or 'cloudfront', got '{}'",
                other
            ))),
        }
    }
}

/// Loads `path` into the environment. A missing file is fine; a malformed one
/// is an error.
pub fn load_env_file(path: &Path) -> Result<()> {
    match dotenvy::from_path(path) {
        Ok(()) => Ok(()),
        Err(e) if e.not_found() => Ok(()),
        Err(e) => Err(e.into()),
    }
}
