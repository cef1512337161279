//! Resolution of a delivered message into its queue identity and delivery handle.

use crate::arn::Arn;
use crate::envelope::SqsRecord;
use crate::error::EnvelopeError;
use std::fmt;

// ============================================================================
// Queue Identity
// ============================================================================

/// Addressable identity of the queue a message was delivered from
///
/// The identity is fixed once resolved. Every request for the message is
/// addressed to [`QueueIdentity::url`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueueIdentity {
    region: String,
    owner_id: String,
    queue_name: String,
}

impl QueueIdentity {
    /// Create new queue identity
    pub fn new(
        region: impl Into<String>,
        owner_id: impl Into<String>,
        queue_name: impl Into<String>,
    ) -> Self {
        Self {
            region: region.into(),
            owner_id: owner_id.into(),
            queue_name: queue_name.into(),
        }
    }

    /// Get queue region
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Get owner ID used in the queue URL
    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    /// Get queue name
    pub fn queue_name(&self) -> &str {
        &self.queue_name
    }

    /// Queue URL in the form the queue service resolves
    pub fn url(&self) -> String {
        format!(
            "https://sqs.{}.amazonaws.com/{}/{}",
            self.region, self.owner_id, self.queue_name
        )
    }
}

impl fmt::Display for QueueIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url())
    }
}

// ============================================================================
// Delivery Handle
// ============================================================================

/// Opaque token identifying one delivery of a message
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct DeliveryHandle(String);

impl DeliveryHandle {
    /// Create new delivery handle, rejecting blank values
    pub fn new(handle: impl Into<String>) -> Result<Self, EnvelopeError> {
        let handle = handle.into();
        if handle.trim().is_empty() {
            return Err(EnvelopeError::MissingReceiptHandle);
        }
        Ok(Self(handle))
    }

    /// Get handle as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for DeliveryHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix: String = self.0.chars().take(8).collect();
        write!(f, "DeliveryHandle({}...)", prefix)
    }
}

// ============================================================================
// Message Context
// ============================================================================

/// Everything needed to act on one delivered message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageContext {
    pub identity: QueueIdentity,
    pub handle: DeliveryHandle,
    /// `ApproximateReceiveCount` reported with the delivery
    pub receive_count: Option<u32>,
}

impl MessageContext {
    /// Create new message context without a receive count
    pub fn new(identity: QueueIdentity, handle: DeliveryHandle) -> Self {
        Self {
            identity,
            handle,
            receive_count: None,
        }
    }

    /// Set the approximate receive count
    pub fn with_receive_count(mut self, count: u32) -> Self {
        self.receive_count = Some(count);
        self
    }
}

/// Resolve a delivered record into its queue identity and delivery handle
///
/// The owner is the record's `SenderId` attribute, the queue name is the
/// resource part of `eventSourceARN` and the region is `awsRegion`.
///
/// # Errors
///
/// Returns [`EnvelopeError`] when the ARN cannot be parsed, or when the
/// sender, region or receipt handle is missing.
pub fn resolve(record: &SqsRecord) -> Result<MessageContext, EnvelopeError> {
    let arn: Arn = record.event_source_arn.parse()?;

    let owner_id = record.sender_id().ok_or(EnvelopeError::MissingSenderId)?;

    if record.aws_region.trim().is_empty() {
        return Err(EnvelopeError::MissingRegion);
    }

    let handle = DeliveryHandle::new(record.receipt_handle.as_str())?;
    let identity = QueueIdentity::new(record.aws_region.as_str(), owner_id, arn.resource());

    Ok(MessageContext {
        identity,
        handle,
        receive_count: record.approximate_receive_count(),
    })
}

impl TryFrom<&SqsRecord> for MessageContext {
    type Error = EnvelopeError;

    fn try_from(record: &SqsRecord) -> Result<Self, Self::Error> {
        resolve(record)
    }
}

#[cfg(test)]
#[path = "resolver_tests.rs"]
mod tests;
