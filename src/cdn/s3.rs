use super::ObjectUrlClient;
use crate::models::ObjectStoreConfig;
use crate::{Error, Result};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::{config::Region, Client as S3Client};
use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::debug;

pub struct S3ObjectClient {
    client: S3Client,
    region: String,
    endpoint: Option<String>,
}

impl S3ObjectClient {
    pub async fn new(config: &ObjectStoreConfig) -> Result<Self> {
        let credentials = aws_sdk_s3::config::Credentials::new(
            config.access_key_id.clone(),
            config.secret_access_key.clone(),
            None,
            None,
            "asset-cdn",
        );

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .credentials_provider(credentials)
            .region(Region::new(config.region.clone()));
        if let Some(endpoint) = &config.endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        let sdk_config = loader.load().await;

        // Custom endpoints (MinIO, Spaces, ...) are addressed path-style so the
        // plain and presigned URLs share one layout.
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.endpoint.is_some())
            .build();

        Ok(Self {
            client: S3Client::from_conf(s3_config),
            region: config.region.clone(),
            endpoint: config.endpoint.clone(),
        })
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        match &self.endpoint {
            Some(endpoint) => format!("{}/{}/{}", endpoint.trim_end_matches('/'), bucket, key),
            None => format!("https://{}.s3.{}.amazonaws.com/{}", bucket, self.region, key),
        }
    }
}

#[async_trait]
impl ObjectUrlClient for S3ObjectClient {
    async fn object_url(
        &self,
        bucket: &str,
        key: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<String> {
        let Some(expires_at) = expires_at else {
            return Ok(self.public_url(bucket, key));
        };

        let expires_in = (expires_at - Utc::now())
            .to_std()
            .unwrap_or_default()
            .max(Duration::from_secs(1));
        debug!("Presigning s3://{}/{} for {:?}", bucket, key, expires_in);

        let presigning = PresigningConfig::expires_in(expires_in)
            .map_err(|e| Error::S3(format!("Invalid presigning expiry: {}", e)))?;

        let request = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(|e| Error::S3(format!("Failed to presign URL: {}", DisplayErrorContext(&e))))?;

        Ok(request.uri().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn config() -> ObjectStoreConfig {
        ObjectStoreConfig::new("media-bucket", "media", "AKIDEXAMPLE", "secret", None)
    }

    #[tokio::test]
    async fn test_public_url_virtual_hosted() {
        let client = S3ObjectClient::new(&config().with_region("eu-west-1"))
            .await
            .unwrap();

        let url = client
            .object_url("media-bucket", "media/img/1.png", None)
            .await
            .unwrap();

        assert_eq!(
            url,
            "https://media-bucket.s3.eu-west-1.amazonaws.com/media/img/1.png"
        );
    }

    #[tokio::test]
    async fn test_public_url_custom_endpoint() {
        let client = S3ObjectClient::new(&config().with_endpoint("http://localhost:9000/"))
            .await
            .unwrap();

        let url = client
            .object_url("media-bucket", "media/img/1.png", None)
            .await
            .unwrap();

        assert_eq!(url, "http://localhost:9000/media-bucket/media/img/1.png");
    }

    #[tokio::test]
    async fn test_presigned_url_with_expiry() {
        let client = S3ObjectClient::new(&config().with_endpoint("http://localhost:9000"))
            .await
            .unwrap();

        let expires_at = Utc::now() + TimeDelta::seconds(600);
        let url = client
            .object_url("media-bucket", "media/img/1.png", Some(expires_at))
            .await
            .unwrap();

        assert!(url.starts_with("http://localhost:9000/media-bucket/media/img/1.png?"));
        assert!(url.contains("X-Amz-Expires="));
        assert!(url.contains("X-Amz-Signature="));
        assert!(url.contains("AKIDEXAMPLE"));
    }
}
