//! Visibility timeout backoff planning.
//!
//! A [`VisibilityRequest`] is resolved once into a [`BackoffPlan`] before any
//! remote call is made. The plan decides whether the queue's current
//! `VisibilityTimeout` has to be fetched and how the new timeout is computed:
//!
//! | increment | override | plan                            | timeout                             |
//! |-----------|----------|---------------------------------|-------------------------------------|
//! | `!= 0`    | any      | [`BackoffPlan::Incremental`]    | `base + increment * (previous - 1)` |
//! | `0`       | `!= 0`   | [`BackoffPlan::Explicit`]       | `override`                          |
//! | `0`       | `0`      | [`BackoffPlan::Reset`]          | `0`                                 |
//!
//! A non-zero increment takes precedence over an override. Callers that want
//! the override applied must pass an increment of zero, which
//! [`VisibilityRequest::explicit`] does.

use std::fmt;

/// Seconds added per prior delivery when no increment is configured
pub const DEFAULT_INCREMENT_SECONDS: u32 = 5;

// ============================================================================
// Policy and Request
// ============================================================================

/// Configured backoff behaviour for a consumer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub increment_seconds: u32,
}

impl BackoffPolicy {
    /// Create a policy adding `increment_seconds` per prior delivery
    pub fn new(increment_seconds: u32) -> Self {
        Self { increment_seconds }
    }

    /// Build an incremental request for a message delivered `previous_deliveries` times
    pub fn request(&self, previous_deliveries: u32) -> VisibilityRequest {
        VisibilityRequest::incremental(previous_deliveries, self.increment_seconds)
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_INCREMENT_SECONDS)
    }
}

/// Parameters of a single visibility extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibilityRequest {
    /// Deliveries so far, including the current one
    pub previous_deliveries: u32,
    /// Seconds added per prior delivery; `0` disables the incremental path
    pub increment_seconds: u32,
    /// Explicit new timeout; `0` means unset
    pub override_seconds: u32,
}

impl VisibilityRequest {
    /// Create a request from its raw parameters
    pub fn new(previous_deliveries: u32, increment_seconds: u32, override_seconds: u32) -> Self {
        Self {
            previous_deliveries,
            increment_seconds,
            override_seconds,
        }
    }

    /// Grow the queue's current timeout by `increment_seconds` per prior delivery
    pub fn incremental(previous_deliveries: u32, increment_seconds: u32) -> Self {
        Self::new(previous_deliveries, increment_seconds, 0)
    }

    /// Set the timeout to exactly `seconds`
    pub fn explicit(previous_deliveries: u32, seconds: u32) -> Self {
        Self::new(previous_deliveries, 0, seconds)
    }

    /// Resolve which computation applies to this request
    pub fn plan(&self) -> BackoffPlan {
        if self.increment_seconds != 0 {
            BackoffPlan::Incremental {
                increment_seconds: self.increment_seconds,
            }
        } else if self.override_seconds != 0 {
            BackoffPlan::Explicit {
                seconds: self.override_seconds,
            }
        } else {
            BackoffPlan::Reset
        }
    }

    /// True when an override was supplied but the increment takes precedence
    pub fn override_shadowed(&self) -> bool {
        self.increment_seconds != 0 && self.override_seconds != 0
    }
}

// ============================================================================
// Plan
// ============================================================================

/// Computation chosen for a visibility request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackoffPlan {
    /// Queue base timeout plus `increment_seconds` per prior delivery
    Incremental { increment_seconds: u32 },
    /// Caller supplied timeout
    Explicit { seconds: u32 },
    /// Make the message visible again immediately
    Reset,
}

impl BackoffPlan {
    /// Whether the queue's current `VisibilityTimeout` is needed
    pub fn needs_base_timeout(&self) -> bool {
        matches!(self, Self::Incremental { .. })
    }

    /// Compute the new visibility timeout in seconds
    ///
    /// `base_seconds` is ignored unless the plan is incremental. The result is
    /// not validated: a delivery count of zero produces a negative value which
    /// the queue service rejects. Arithmetic saturates at the `i64` bounds.
    pub fn timeout(&self, previous_deliveries: u32, base_seconds: i64) -> i64 {
        match self {
            Self::Incremental { increment_seconds } => {
                let prior = i64::from(previous_deliveries) - 1;
                base_seconds.saturating_add(i64::from(*increment_seconds).saturating_mul(prior))
            }
            Self::Explicit { seconds } => i64::from(*seconds),
            Self::Reset => 0,
        }
    }
}

impl fmt::Display for BackoffPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Incremental { increment_seconds } => {
                write!(f, "incremental(+{}s)", increment_seconds)
            }
            Self::Explicit { seconds } => write!(f, "explicit({}s)", seconds),
            Self::Reset => f.write_str("reset"),
        }
    }
}

// ============================================================================
// Base Timeout
// ============================================================================

/// The queue's current default visibility timeout, as far as it could be read
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BaseTimeout {
    Configured(i64),
    /// The attribute could not be read; the base falls back to zero
    Degraded { reason: String },
}

impl BaseTimeout {
    /// Interpret a raw `VisibilityTimeout` attribute value
    pub fn from_attribute(value: Option<&str>) -> Self {
        match value {
            Some(raw) => match raw.trim().parse::<i64>() {
                Ok(seconds) => Self::Configured(seconds),
                Err(_) => Self::Degraded {
                    reason: format!("VisibilityTimeout '{}' is not an integer", raw),
                },
            },
            None => Self::Degraded {
                reason: "VisibilityTimeout attribute not returned".to_string(),
            },
        }
    }

    /// Get base timeout in seconds, zero when degraded
    pub fn seconds(&self) -> i64 {
        match self {
            Self::Configured(seconds) => *seconds,
            Self::Degraded { .. } => 0,
        }
    }

    /// Check if the base timeout could not be read
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }
}

#[cfg(test)]
#[path = "backoff_tests.rs"]
mod tests;
