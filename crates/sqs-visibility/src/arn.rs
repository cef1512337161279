//! Amazon Resource Name parsing.

use crate::error::EnvelopeError;
use std::fmt;
use std::str::FromStr;

/// Parsed Amazon Resource Name
///
/// Format: `arn:<partition>:<service>:<region>:<account-id>:<resource>`. The
/// resource is everything after the fifth colon and may itself contain colons.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Arn {
    partition: String,
    service: String,
    region: String,
    account_id: String,
    resource: String,
}

impl Arn {
    /// Get the partition, e.g. `aws`
    pub fn partition(&self) -> &str {
        &self.partition
    }

    /// Get the service namespace
    pub fn service(&self) -> &str {
        &self.service
    }

    /// Get the region; empty for global resources
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Get the owning account ID
    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    /// Get the resource part, for SQS the queue name
    pub fn resource(&self) -> &str {
        &self.resource
    }
}

impl FromStr for Arn {
    type Err = EnvelopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |message: &str| EnvelopeError::InvalidArn {
            arn: s.to_string(),
            message: message.to_string(),
        };

        let mut parts = s.splitn(6, ':');
        if parts.next() != Some("arn") {
            return Err(invalid("must start with 'arn:'"));
        }

        let (partition, service, region, account_id, resource) = match (
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
        ) {
            (Some(p), Some(s), Some(r), Some(a), Some(res)) => (p, s, r, a, res),
            _ => return Err(invalid("expected six colon-separated segments")),
        };

        if partition.is_empty() || service.is_empty() {
            return Err(invalid("partition and service must not be empty"));
        }
        if account_id.is_empty() {
            return Err(invalid("account segment is empty"));
        }
        if resource.is_empty() {
            return Err(invalid("resource segment is empty"));
        }

        Ok(Self {
            partition: partition.to_string(),
            service: service.to_string(),
            region: region.to_string(),
            account_id: account_id.to_string(),
            resource: resource.to_string(),
        })
    }
}

impl fmt::Display for Arn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "arn:{}:{}:{}:{}:{}",
            self.partition, self.service, self.region, self.account_id, self.resource
        )
    }
}

#[cfg(test)]
#[path = "arn_tests.rs"]
mod tests;
