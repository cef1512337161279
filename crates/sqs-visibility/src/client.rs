//! SQS client seam and its HTTP implementation.
//!
//! [`HttpSqsClient`] talks to the SQS Query API directly over HTTP and signs
//! requests with AWS Signature Version 4. Every request carries the resolved
//! queue URL as its `QueueUrl` parameter and is sent to the regional endpoint,
//! or to the configured endpoint override (LocalStack, mock servers).
//!
//! Calls are single round trips. Retrying is left to the caller.

use crate::attributes::QueueAttributes;
use crate::config::CoordinatorConfig;
use crate::error::{SqsError, SqsOperation};
use crate::resolver::{DeliveryHandle, QueueIdentity};
use crate::signing::{canonical_query_string, RequestSigner};
use crate::xml;
use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client as HttpClient, Url};
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;

const API_VERSION: &str = "2012-11-05";

/// Hosts that bypass a configured proxy
const NO_PROXY_HOSTS: &str = "localhost,127.0.0.1,::1";

/// Metadata returned by a successful visibility change or delete
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqsResponse {
    pub request_id: Option<String>,
    pub status: u16,
}

/// Remote operations the coordinator needs from the queue service
#[async_trait]
pub trait SqsClient: Send + Sync {
    /// Fetch the named attributes of a queue
    ///
    /// A response with a non-success status yields an empty attribute set
    /// rather than an error.
    async fn get_queue_attributes(
        &self,
        queue: &QueueIdentity,
        names: &[&str],
    ) -> Result<QueueAttributes, SqsError>;

    /// Set the visibility timeout of one delivery
    async fn change_message_visibility(
        &self,
        queue: &QueueIdentity,
        handle: &DeliveryHandle,
        timeout_seconds: i64,
    ) -> Result<SqsResponse, SqsError>;

    /// Delete one delivery from the queue
    async fn delete_message(
        &self,
        queue: &QueueIdentity,
        handle: &DeliveryHandle,
    ) -> Result<SqsResponse, SqsError>;
}

// ============================================================================
// HTTP Client
// ============================================================================

/// Raw HTTP outcome of a Query API call
struct RawResponse {
    status: u16,
    body: String,
}

impl RawResponse {
    fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// SQS client using the Query API over HTTP
pub struct HttpSqsClient {
    http_client: HttpClient,
    signer: Option<RequestSigner>,
    endpoint: Option<Url>,
}

impl HttpSqsClient {
    /// Create a client from configuration
    ///
    /// # Errors
    ///
    /// Returns [`SqsError::Configuration`] when the endpoint or proxy URL is
    /// invalid or the HTTP client cannot be built.
    pub fn new(config: &CoordinatorConfig) -> Result<Self, SqsError> {
        let mut builder = HttpClient::builder().timeout(config.request_timeout());

        if let Some(proxy_url) = config.proxy() {
            let proxy = reqwest::Proxy::all(proxy_url)
                .map_err(|e| {
                    SqsError::Configuration(format!("Invalid proxy URL '{}': {}", proxy_url, e))
                })?
                .no_proxy(reqwest::NoProxy::from_string(NO_PROXY_HOSTS));
            builder = builder.proxy(proxy);
            debug!(proxy = %proxy_url, "Routing SQS calls through proxy");
        }

        let http_client = builder
            .build()
            .map_err(|e| SqsError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        let endpoint = config
            .endpoint
            .as_deref()
            .map(|e| {
                Url::parse(e).map_err(|err| {
                    SqsError::Configuration(format!("Invalid endpoint '{}': {}", e, err))
                })
            })
            .transpose()?;

        Ok(Self {
            http_client,
            signer: config.credentials().map(RequestSigner::new),
            endpoint,
        })
    }

    /// Endpoint requests for `queue` are sent to
    pub fn endpoint_for(&self, queue: &QueueIdentity) -> Result<Url, SqsError> {
        match &self.endpoint {
            Some(endpoint) => Ok(endpoint.clone()),
            None => {
                let regional = format!("https://sqs.{}.amazonaws.com/", queue.region());
                Url::parse(&regional).map_err(|e| {
                    SqsError::Configuration(format!("Invalid region '{}': {}", queue.region(), e))
                })
            }
        }
    }

    /// Sign and send a Query API request
    async fn send(
        &self,
        queue: &QueueIdentity,
        operation: SqsOperation,
        mut params: BTreeMap<String, String>,
    ) -> Result<RawResponse, SqsError> {
        let signer = self
            .signer
            .as_ref()
            .ok_or_else(|| SqsError::Authentication("No credentials configured".to_string()))?;

        params.insert("Action".to_string(), operation.action().to_string());
        params.insert("Version".to_string(), API_VERSION.to_string());
        params.insert("QueueUrl".to_string(), queue.url());

        let mut url = self.endpoint_for(queue)?;
        let host = match (url.host_str(), url.port()) {
            (Some(host), Some(port)) => format!("{}:{}", host, port),
            (Some(host), None) => host.to_string(),
            (None, _) => {
                return Err(SqsError::Configuration(format!(
                    "Endpoint '{}' has no host",
                    url
                )))
            }
        };

        let headers = signer.sign(
            "POST",
            &host,
            url.path(),
            queue.region(),
            &params,
            "",
            &Utc::now(),
        );
        url.set_query(Some(&canonical_query_string(&params)));

        debug!(
            operation = %operation,
            queue = %queue,
            endpoint = %host,
            "Sending SQS request"
        );

        let mut request = self.http_client.post(url);
        for (key, value) in headers {
            request = request.header(key.as_str(), value);
        }

        let response = request
            .send()
            .await
            .map_err(|e| transport_error(operation, &e))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| transport_error(operation, &e))?;

        Ok(RawResponse { status, body })
    }

    /// Send a request whose only useful result is its metadata
    async fn execute(
        &self,
        queue: &QueueIdentity,
        operation: SqsOperation,
        params: BTreeMap<String, String>,
    ) -> Result<SqsResponse, SqsError> {
        let raw = self.send(queue, operation, params).await?;

        if !raw.is_success() {
            return Err(xml::parse_error_response(&raw.body, raw.status));
        }

        Ok(SqsResponse {
            request_id: xml::parse_request_id(&raw.body),
            status: raw.status,
        })
    }
}

/// Classify a reqwest failure for `operation`
///
/// Requests that could not be built are configuration problems. Everything
/// else happened on the wire and is reported as [`SqsError::Network`].
fn transport_error(operation: SqsOperation, error: &reqwest::Error) -> SqsError {
    if error.is_builder() {
        return SqsError::Configuration(format!("{} request is invalid: {}", operation, error));
    }

    let stage = if error.is_timeout() {
        "timed out"
    } else if error.is_connect() {
        "could not connect"
    } else if error.is_body() || error.is_decode() {
        "response body unreadable"
    } else {
        "transport failure"
    };
    SqsError::Network(format!("{} {}: {}", operation, stage, error))
}

impl fmt::Debug for HttpSqsClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpSqsClient")
            .field("endpoint", &self.endpoint.as_ref().map(Url::as_str))
            .field("signer", &self.signer.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[async_trait]
impl SqsClient for HttpSqsClient {
    async fn get_queue_attributes(
        &self,
        queue: &QueueIdentity,
        names: &[&str],
    ) -> Result<QueueAttributes, SqsError> {
        let mut params = BTreeMap::new();
        for (index, name) in names.iter().enumerate() {
            params.insert(format!("AttributeName.{}", index + 1), name.to_string());
        }

        let raw = self
            .send(queue, SqsOperation::GetQueueAttributes, params)
            .await?;

        if !raw.is_success() {
            debug!(
                queue = %queue,
                status = raw.status,
                error = %xml::parse_error_response(&raw.body, raw.status),
                "GetQueueAttributes did not succeed"
            );
            return Ok(QueueAttributes::unavailable(raw.status));
        }

        let values = xml::parse_attributes(&raw.body)?;
        Ok(QueueAttributes::new(raw.status, values))
    }

    async fn change_message_visibility(
        &self,
        queue: &QueueIdentity,
        handle: &DeliveryHandle,
        timeout_seconds: i64,
    ) -> Result<SqsResponse, SqsError> {
        let mut params = BTreeMap::new();
        params.insert("ReceiptHandle".to_string(), handle.as_str().to_string());
        params.insert("VisibilityTimeout".to_string(), timeout_seconds.to_string());

        self.execute(queue, SqsOperation::ChangeMessageVisibility, params)
            .await
    }

    async fn delete_message(
        &self,
        queue: &QueueIdentity,
        handle: &DeliveryHandle,
    ) -> Result<SqsResponse, SqsError> {
        let mut params = BTreeMap::new();
        params.insert("ReceiptHandle".to_string(), handle.as_str().to_string());

        self.execute(queue, SqsOperation::DeleteMessage, params)
            .await
    }
}
