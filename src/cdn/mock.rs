use super::{InvalidationClient, ObjectUrlClient};
use crate::models::{InvalidationReceipt, InvalidationRequest};
use crate::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Arguments of one `object_url` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectUrlCall {
    pub bucket: String,
    pub key: String,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct MockObjectClient {
    base_url: String,
    calls: Arc<Mutex<Vec<ObjectUrlCall>>>,
}

impl MockObjectClient {
    pub fn new() -> Self {
        Self {
            base_url: "https://mock-storage.example.com".to_string(),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn get_calls(&self) -> Vec<ObjectUrlCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for MockObjectClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ObjectUrlClient for MockObjectClient {
    async fn object_url(
        &self,
        bucket: &str,
        key: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<String> {
        self.calls.lock().unwrap().push(ObjectUrlCall {
            bucket: bucket.to_string(),
            key: key.to_string(),
            expires_at,
        });

        let url = format!("{}/{}/{}", self.base_url, bucket, key);
        Ok(match expires_at {
            Some(expires_at) => format!("{}?Expires={}", url, expires_at.timestamp()),
            None => url,
        })
    }
}

/// In-memory invalidation backend. Every accepted request gets a sequential
/// id and the configured submission status.
#[derive(Clone)]
pub struct MockInvalidationClient {
    submit_status: Arc<Mutex<String>>,
    statuses: Arc<Mutex<HashMap<String, String>>>,
    failure: Arc<Mutex<Option<String>>>,
    requests: Arc<Mutex<Vec<InvalidationRequest>>>,
    lookup_count: Arc<Mutex<usize>>,
}

impl MockInvalidationClient {
    pub fn new() -> Self {
        Self {
            submit_status: Arc::new(Mutex::new("InProgress".to_string())),
            statuses: Arc::new(Mutex::new(HashMap::new())),
            failure: Arc::new(Mutex::new(None)),
            requests: Arc::new(Mutex::new(Vec::new())),
            lookup_count: Arc::new(Mutex::new(0)),
        }
    }

    /// Status reported by the next submissions.
    pub fn with_submit_status(self, status: &str) -> Self {
        *self.submit_status.lock().unwrap() = status.to_string();
        self
    }

    pub fn with_invalidation(self, id: &str, status: &str) -> Self {
        self.statuses
            .lock()
            .unwrap()
            .insert(id.to_string(), status.to_string());
        self
    }

    /// Makes every call fail with `message`.
    pub fn with_failure(self, message: &str) -> Self {
        *self.failure.lock().unwrap() = Some(message.to_string());
        self
    }

    pub fn get_requests(&self) -> Vec<InvalidationRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn get_lookup_count(&self) -> usize {
        *self.lookup_count.lock().unwrap()
    }

    fn check_failure(&self) -> Result<()> {
        match self.failure.lock().unwrap().as_ref() {
            Some(message) => Err(Error::CloudFront(message.clone())),
            None => Ok(()),
        }
    }
}

impl Default for MockInvalidationClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InvalidationClient for MockInvalidationClient {
    async fn create_invalidation(
        &self,
        request: &InvalidationRequest,
    ) -> Result<InvalidationReceipt> {
        self.check_failure()?;

        let mut requests = self.requests.lock().unwrap();
        requests.push(request.clone());
        let id = format!("MOCK{}", requests.len());

        let status = self.submit_status.lock().unwrap().clone();
        self.statuses
            .lock()
            .unwrap()
            .insert(id.clone(), status.clone());

        Ok(InvalidationReceipt { id, status })
    }

    async fn get_invalidation(&self, distribution_id: &str, id: &str) -> Result<String> {
        *self.lookup_count.lock().unwrap() += 1;
        self.check_failure()?;

        self.statuses.lock().unwrap().get(id).cloned().ok_or_else(|| {
            Error::CloudFront(format!(
                "NoSuchInvalidation: {} on distribution {}",
                id, distribution_id
            ))
        })
    }
}
