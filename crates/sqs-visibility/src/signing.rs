//! AWS Signature Version 4 request signing.
//!
//! Signing steps:
//! 1. Create canonical request (method, URI, query, headers, payload)
//! 2. Create string to sign (algorithm, timestamp, scope, request hash)
//! 3. Derive signing key (4-level HMAC chain)
//! 4. Calculate signature and build the Authorization header
//!
//! See <https://docs.aws.amazon.com/general/latest/gr/sigv4_signing.html>.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use zeroize::Zeroizing;

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";
const SERVICE: &str = "sqs";

/// Static AWS credentials
#[derive(Clone)]
pub struct Credentials {
    access_key_id: String,
    secret_access_key: Zeroizing<String>,
    session_token: Option<Zeroizing<String>>,
}

impl Credentials {
    /// Create credentials from an access key pair
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: Zeroizing::new(secret_access_key.into()),
            session_token: None,
        }
    }

    /// Attach a session token issued with temporary credentials
    pub fn with_session_token(mut self, token: impl Into<String>) -> Self {
        self.session_token = Some(Zeroizing::new(token.into()));
        self
    }

    /// Get access key ID
    pub fn access_key_id(&self) -> &str {
        &self.access_key_id
    }

    /// Get session token, if any
    pub fn session_token(&self) -> Option<&str> {
        self.session_token.as_deref().map(String::as_str)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field(
                "session_token",
                &self.session_token.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// Signs SQS Query API requests
#[derive(Debug, Clone)]
pub struct RequestSigner {
    credentials: Credentials,
}

impl RequestSigner {
    /// Create signer for the given credentials
    pub fn new(credentials: Credentials) -> Self {
        Self { credentials }
    }

    /// Sign a request and return the headers to add to it
    ///
    /// The returned headers always contain `Authorization`, `x-amz-date` and
    /// `host`, plus `x-amz-security-token` when the credentials carry a
    /// session token.
    #[allow(clippy::too_many_arguments)]
    pub fn sign(
        &self,
        method: &str,
        host: &str,
        path: &str,
        region: &str,
        query_params: &BTreeMap<String, String>,
        body: &str,
        timestamp: &DateTime<Utc>,
    ) -> BTreeMap<String, String> {
        let date_stamp = timestamp.format("%Y%m%d").to_string();
        let amz_date = timestamp.format("%Y%m%dT%H%M%SZ").to_string();

        // Canonical headers must be lower-case and sorted
        let mut signed = BTreeMap::new();
        signed.insert("host".to_string(), host.to_string());
        signed.insert("x-amz-date".to_string(), amz_date.clone());
        if let Some(token) = self.credentials.session_token() {
            signed.insert("x-amz-security-token".to_string(), token.to_string());
        }

        let canonical_headers: String = signed
            .iter()
            .map(|(k, v)| format!("{}:{}\n", k, v.trim()))
            .collect();
        let signed_headers = signed.keys().cloned().collect::<Vec<_>>().join(";");

        let payload_hash = hex::encode(Sha256::digest(body.as_bytes()));

        let canonical_request = format!(
            "{}\n{}\n{}\n{}\n{}\n{}",
            method,
            path,
            canonical_query_string(query_params),
            canonical_headers,
            signed_headers,
            payload_hash
        );

        let credential_scope = format!("{}/{}/{}/aws4_request", date_stamp, region, SERVICE);
        let string_to_sign = format!(
            "{}\n{}\n{}\n{}",
            ALGORITHM,
            amz_date,
            credential_scope,
            hex::encode(Sha256::digest(canonical_request.as_bytes()))
        );

        let signing_key = derive_signing_key(
            &self.credentials.secret_access_key,
            &date_stamp,
            region,
            SERVICE,
        );
        let signature = hex::encode(hmac_sha256(&signing_key, string_to_sign.as_bytes()));

        let authorization = format!(
            "{} Credential={}/{}, SignedHeaders={}, Signature={}",
            ALGORITHM, self.credentials.access_key_id, credential_scope, signed_headers, signature
        );

        let mut headers = signed;
        headers.insert("Authorization".to_string(), authorization);
        headers
    }
}

/// Percent-encode and sort query parameters for signing and for the request URL
pub fn canonical_query_string(query_params: &BTreeMap<String, String>) -> String {
    let mut pairs = query_params
        .iter()
        .map(|(k, v)| (urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>();
    pairs.sort();
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

/// Derive the SigV4 signing key
///
/// kSecret = "AWS4" + secret, then HMAC over date, region, service and
/// the literal `aws4_request`.
pub fn derive_signing_key(secret: &str, date_stamp: &str, region: &str, service: &str) -> Vec<u8> {
    let k_secret = Zeroizing::new(format!("AWS4{}", secret));
    let k_date = hmac_sha256(k_secret.as_bytes(), date_stamp.as_bytes());
    let k_region = hmac_sha256(&k_date, region.as_bytes());
    let k_service = hmac_sha256(&k_region, service.as_bytes());
    hmac_sha256(&k_service, b"aws4_request")
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

#[cfg(test)]
#[path = "signing_tests.rs"]
mod tests;
