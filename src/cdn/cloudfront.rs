use super::InvalidationClient;
use crate::models::{InvalidationReceipt, InvalidationRequest};
use crate::{Error, Result};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_cloudfront::error::DisplayErrorContext;
use aws_sdk_cloudfront::types::{InvalidationBatch, Paths};
use aws_sdk_cloudfront::{config::Region, Client as CloudFrontSdkClient};
use tracing::debug;

pub struct CloudFrontClient {
    client: CloudFrontSdkClient,
}

impl CloudFrontClient {
    /// `endpoint` overrides the global CloudFront API endpoint.
    pub async fn new(
        access_key_id: String,
        secret_access_key: String,
        endpoint: Option<String>,
    ) -> Result<Self> {
        let credentials = aws_sdk_cloudfront::config::Credentials::new(
            access_key_id,
            secret_access_key,
            None,
            None,
            "asset-cdn",
        );

        // CloudFront is a global service signed against us-east-1
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .credentials_provider(credentials)
            .region(Region::new("us-east-1"));
        if let Some(endpoint) = endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        let config = loader.load().await;

        Ok(Self {
            client: CloudFrontSdkClient::new(&config),
        })
    }
}

#[async_trait]
impl InvalidationClient for CloudFrontClient {
    async fn create_invalidation(
        &self,
        request: &InvalidationRequest,
    ) -> Result<InvalidationReceipt> {
        let quantity = i32::try_from(request.quantity())
            .map_err(|_| Error::CloudFront(format!("Too many paths: {}", request.quantity())))?;

        let paths = Paths::builder()
            .quantity(quantity)
            .set_items(Some(request.paths.clone()))
            .build()
            .map_err(|e| Error::CloudFront(format!("Invalid path list: {}", e)))?;

        let batch = InvalidationBatch::builder()
            .paths(paths)
            .caller_reference(&request.caller_reference)
            .build()
            .map_err(|e| Error::CloudFront(format!("Invalid invalidation batch: {}", e)))?;

        debug!(
            "Sending invalidation for {} to distribution {}",
            request.caller_reference, request.distribution_id
        );

        let output = self
            .client
            .create_invalidation()
            .distribution_id(&request.distribution_id)
            .invalidation_batch(batch)
            .send()
            .await
            .map_err(|e| {
                Error::CloudFront(format!(
                    "Failed to create invalidation: {}",
                    DisplayErrorContext(&e)
                ))
            })?;

        let invalidation = output.invalidation().ok_or_else(|| {
            Error::CloudFront("Invalidation missing from response".to_string())
        })?;

        Ok(InvalidationReceipt {
            id: invalidation.id().to_string(),
            status: invalidation.status().to_string(),
        })
    }

    async fn get_invalidation(&self, distribution_id: &str, id: &str) -> Result<String> {
        let output = self
            .client
            .get_invalidation()
            .distribution_id(distribution_id)
            .id(id)
            .send()
            .await
            .map_err(|e| {
                Error::CloudFront(format!(
                    "Failed to get invalidation {}: {}",
                    id,
                    DisplayErrorContext(&e)
                ))
            })?;

        output
            .invalidation()
            .map(|invalidation| invalidation.status().to_string())
            .ok_or_else(|| Error::CloudFront("Invalidation missing from response".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn invalidation_xml(id: &str, status: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<Invalidation xmlns="http://cloudfront.amazonaws.com/doc/2020-05-31/">
  <Id>{id}</Id>
  <Status>{status}</Status>
  <CreateTime>2024-01-01T00:00:00Z</CreateTime>
  <InvalidationBatch>
    <Paths><Quantity>1</Quantity><Items><Path>/media/a.png</Path></Items></Paths>
    <CallerReference>ref</CallerReference>
  </InvalidationBatch>
</Invalidation>"#
        )
    }

    async fn client_for(server: &MockServer) -> CloudFrontClient {
        CloudFrontClient::new(
            "AKIDEXAMPLE".to_string(),
            "secret".to_string(),
            Some(server.uri()),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_invalidation() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/2020-05-31/distribution/E123/invalidation"))
            .respond_with(
                ResponseTemplate::new(201)
                    .insert_header("Content-Type", "text/xml")
                    .set_body_string(invalidation_xml("I2J0I21PCUYOIK", "InProgress")),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let request = InvalidationRequest::new("E123", &["media/a.png".to_string()]).unwrap();
        let receipt = client.create_invalidation(&request).await.unwrap();

        assert_eq!(receipt.id, "I2J0I21PCUYOIK");
        assert_eq!(receipt.status, "InProgress");

        let received = server.received_requests().await.unwrap();
        let body = String::from_utf8_lossy(&received[0].body);
        assert!(body.contains("<Path>/media/a.png</Path>"));
        assert!(body.contains(&request.caller_reference));
    }

    #[tokio::test]
    async fn test_get_invalidation_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/2020-05-31/distribution/E123/invalidation/I2J0I21PCUYOIK"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Content-Type", "text/xml")
                    .set_body_string(invalidation_xml("I2J0I21PCUYOIK", "Completed")),
            )
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let status = client
            .get_invalidation("E123", "I2J0I21PCUYOIK")
            .await
            .unwrap();

        assert_eq!(status, "Completed");
    }

    #[tokio::test]
    async fn test_backend_error_is_wrapped() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(404)
                    .insert_header("Content-Type", "text/xml")
                    .set_body_string(
                        r#"<?xml version="1.0" encoding="UTF-8"?>
<ErrorResponse xmlns="http://cloudfront.amazonaws.com/doc/2020-05-31/">
  <Error>
    <Type>Sender</Type>
    <Code>NoSuchInvalidation</Code>
    <Message>The specified invalidation does not exist.</Message>
  </Error>
  <RequestId>a1b2c3</RequestId>
</ErrorResponse>"#,
                    ),
            )
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.get_invalidation("E123", "missing").await.unwrap_err();

        assert!(matches!(err, Error::CloudFront(_)));
        assert!(err.to_string().contains("does not exist"));
    }
}
