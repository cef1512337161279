//! Queue attribute sets returned by `GetQueueAttributes`.

use crate::backoff::BaseTimeout;
use std::collections::HashMap;

/// Queue attribute holding the default visibility timeout in seconds
pub const VISIBILITY_TIMEOUT: &str = "VisibilityTimeout";

/// Attribute set fetched from the queue service
///
/// A response with a non-success status yields an empty set; the status is
/// kept so callers can tell an empty queue configuration from a failed fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueAttributes {
    status: u16,
    values: HashMap<String, String>,
}

impl QueueAttributes {
    /// Create attribute set from a parsed response
    pub fn new(status: u16, values: HashMap<String, String>) -> Self {
        Self { status, values }
    }

    /// Attribute set for a response that did not succeed
    pub fn unavailable(status: u16) -> Self {
        Self {
            status,
            values: HashMap::new(),
        }
    }

    /// Get HTTP status of the attribute request
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Check if the attribute request succeeded
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Get attribute value by name
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Check if no attributes were returned
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The queue's default visibility timeout, falling back to zero
    pub fn base_timeout(&self) -> BaseTimeout {
        if !self.is_success() {
            return BaseTimeout::Degraded {
                reason: format!("GetQueueAttributes returned status {}", self.status),
            };
        }
        BaseTimeout::from_attribute(self.get(VISIBILITY_TIMEOUT))
    }
}

#[cfg(test)]
#[path = "attributes_tests.rs"]
mod tests;
