//! Asset URL resolution and CDN cache invalidation
//!
//! Resolves public URLs for stored media either straight from an S3-compatible
//! bucket or through a CloudFront distribution, and evicts changed paths from
//! the distribution's edge caches.

pub mod cdn;
pub mod error;
pub mod models;
pub mod paths;

pub use cdn::{DistributionAdapter, ObjectStoreAdapter, PathResolver};
pub use error::{Error, Result};
pub use models::{Config, InvalidationStatus};
