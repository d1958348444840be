use crate::{Error, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs1v15::SigningKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::signature::{SignatureEncoding, Signer};
use rsa::RsaPrivateKey;
use serde::Serialize;
use sha1::Sha1;
use std::fmt;

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct CannedPolicy<'a> {
    statement: [PolicyStatement<'a>; 1],
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct PolicyStatement<'a> {
    resource: &'a str,
    condition: PolicyCondition,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct PolicyCondition {
    date_less_than: EpochTime,
}

#[derive(Serialize)]
struct EpochTime {
    #[serde(rename = "AWS:EpochTime")]
    epoch_time: i64,
}

/// Signs distribution URLs with a canned policy so they stop working after a
/// fixed instant.
pub struct UrlSigner {
    key_pair_id: String,
    signing_key: SigningKey<Sha1>,
}

impl UrlSigner {
    /// Accepts PKCS#1 (`BEGIN RSA PRIVATE KEY`) or PKCS#8 PEM.
    pub fn from_pem(private_key_pem: &str, key_pair_id: impl Into<String>) -> Result<Self> {
        let private_key = RsaPrivateKey::from_pkcs1_pem(private_key_pem)
            .or_else(|_| RsaPrivateKey::from_pkcs8_pem(private_key_pem))
            .map_err(|e| Error::Signing(format!("Failed to parse private key: {}", e)))?;

        Ok(Self {
            key_pair_id: key_pair_id.into(),
            signing_key: SigningKey::<Sha1>::new(private_key),
        })
    }

    pub fn sign(&self, url: &str, expires_at: DateTime<Utc>) -> Result<String> {
        let expires = expires_at.timestamp();
        let policy = canned_policy(url, expires)?;

        let signature = self
            .signing_key
            .try_sign(policy.as_bytes())
            .map_err(|e| Error::Signing(format!("Failed to sign policy: {}", e)))?;

        let separator = if url.contains('?') { '&' } else { '?' };
        Ok(format!(
            "{}{}Expires={}&Signature={}&Key-Pair-Id={}",
            url,
            separator,
            expires,
            url_safe_base64(&signature.to_bytes()),
            self.key_pair_id
        ))
    }
}

impl fmt::Debug for UrlSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UrlSigner")
            .field("key_pair_id", &self.key_pair_id)
            .finish_non_exhaustive()
    }
}

fn canned_policy(url: &str, expires: i64) -> Result<String> {
    let policy = CannedPolicy {
        statement: [PolicyStatement {
            resource: url,
            condition: PolicyCondition {
                date_less_than: EpochTime {
                    epoch_time: expires,
                },
            },
        }],
    };
    Ok(serde_json::to_string(&policy)?)
}

// CloudFront's query-safe alphabet: + becomes -, = becomes _, / becomes ~
fn url_safe_base64(bytes: &[u8]) -> String {
    STANDARD
        .encode(bytes)
        .chars()
        .map(|c| match c {
            '+' => '-',
            '=' => '_',
            '/' => '~',
            other => other,
        })
        .collect()
}
