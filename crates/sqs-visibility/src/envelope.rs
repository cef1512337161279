//! Inbound SQS message envelopes as delivered by an event source mapping.
//!
//! These types mirror the JSON record shape produced when SQS invokes a
//! consumer with a batch of messages. They are consumed, never produced.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// System attribute carrying the account id of the sender
pub const SENDER_ID: &str = "SenderId";

/// System attribute carrying the number of times the message was received
pub const APPROXIMATE_RECEIVE_COUNT: &str = "ApproximateReceiveCount";

/// A batch of SQS records
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SqsEvent {
    #[serde(rename = "Records", default)]
    pub records: Vec<SqsRecord>,
}

/// A single delivered SQS message
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SqsRecord {
    #[serde(default)]
    pub message_id: String,
    #[serde(default)]
    pub receipt_handle: String,
    #[serde(default)]
    pub body: String,
    /// System attributes (`SenderId`, `ApproximateReceiveCount`, ...)
    #[serde(default)]
    pub attributes: HashMap<String, String>,
    #[serde(default)]
    pub message_attributes: HashMap<String, MessageAttributeValue>,
    #[serde(default)]
    pub md5_of_body: Option<String>,
    #[serde(default)]
    pub event_source: Option<String>,
    #[serde(rename = "eventSourceARN", default)]
    pub event_source_arn: String,
    #[serde(default)]
    pub aws_region: String,
}

impl SqsRecord {
    /// Look up a system attribute by name
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Account id of the sender, when present
    pub fn sender_id(&self) -> Option<&str> {
        self.attribute(SENDER_ID).filter(|s| !s.is_empty())
    }

    /// Number of times this message has been received, when reported
    pub fn approximate_receive_count(&self) -> Option<u32> {
        self.attribute(APPROXIMATE_RECEIVE_COUNT)
            .and_then(|v| v.trim().parse().ok())
    }
}

/// User-defined message attribute
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageAttributeValue {
    #[serde(default)]
    pub data_type: String,
    #[serde(default)]
    pub string_value: Option<String>,
    #[serde(default)]
    pub binary_value: Option<String>,
    #[serde(default)]
    pub string_list_values: Vec<String>,
    #[serde(default)]
    pub binary_list_values: Vec<String>,
}

#[cfg(test)]
#[path = "envelope_tests.rs"]
mod tests;
