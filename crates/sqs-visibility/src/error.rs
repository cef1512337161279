//! Error types for envelope resolution and queue operations.

use std::fmt;
use thiserror::Error;

/// Failure to derive a queue identity or delivery handle from an envelope.
///
/// Any of these is fatal for the message: no visibility change or delete may
/// be attempted on a context that failed to resolve.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvelopeError {
    #[error("Invalid event source ARN '{arn}': {message}")]
    InvalidArn { arn: String, message: String },

    #[error("Envelope is missing the SenderId attribute")]
    MissingSenderId,

    #[error("Envelope is missing the AWS region")]
    MissingRegion,

    #[error("Envelope is missing the receipt handle")]
    MissingReceiptHandle,
}

/// Remote queue operations that can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqsOperation {
    GetQueueAttributes,
    ChangeMessageVisibility,
    DeleteMessage,
}

impl SqsOperation {
    /// Query API action name for this operation
    pub fn action(&self) -> &'static str {
        match self {
            Self::GetQueueAttributes => "GetQueueAttributes",
            Self::ChangeMessageVisibility => "ChangeMessageVisibility",
            Self::DeleteMessage => "DeleteMessage",
        }
    }
}

impl fmt::Display for SqsOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.action())
    }
}

/// Errors reported by the SQS client adapter
#[derive(Debug, Error)]
pub enum SqsError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("SQS service error ({status}): {code} - {message}")]
    Service {
        code: String,
        message: String,
        status: u16,
    },

    #[error("Request throttled: {0}")]
    Throttled(String),

    #[error("Queue not found: {0}")]
    QueueNotFound(String),

    #[error("Invalid receipt handle: {0}")]
    InvalidReceipt(String),

    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl SqsError {
    /// Check if error is transient and the caller may retry
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Authentication(_) => false,
            Self::Network(_) => true,
            Self::Throttled(_) => true,
            Self::Service { status, .. } => *status >= 500 || *status == 429,
            Self::QueueNotFound(_) => false,
            Self::InvalidReceipt(_) => false,
            Self::Configuration(_) => false,
            Self::Serialization(_) => false,
        }
    }
}

/// Error returned by coordinator operations
#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("Malformed envelope: {0}")]
    MalformedEnvelope(#[from] EnvelopeError),

    #[error("Failed to create SQS client: {0}")]
    ClientSetup(#[source] SqsError),

    #[error("{operation} failed: {source}")]
    Remote {
        operation: SqsOperation,
        #[source]
        source: SqsError,
    },
}

impl CoordinatorError {
    pub(crate) fn remote(operation: SqsOperation, source: SqsError) -> Self {
        Self::Remote { operation, source }
    }

    /// Check if the failed operation may succeed when retried by the caller
    pub fn is_transient(&self) -> bool {
        match self {
            Self::MalformedEnvelope(_) => false,
            Self::ClientSetup(_) => false,
            Self::Remote { source, .. } => source.is_transient(),
        }
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration parsing failed: {0}")]
    Parsing(#[from] config::ConfigError),

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
