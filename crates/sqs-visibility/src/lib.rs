//! # SQS Visibility
//!
//! Lifecycle helper for a single in-flight SQS message delivered to a consumer.
//!
//! This library provides:
//! - Resolution of a delivered record into its queue URL and receipt handle
//! - Visibility timeout backoff computed from the queue's live configuration
//! - Delete-on-success
//! - A signed HTTP client for the SQS Query API, with optional proxy
//!
//! ## Module Organization
//!
//! - [`envelope`] - Inbound SQS record types
//! - [`arn`] - Amazon Resource Name parsing
//! - [`resolver`] - Queue identity, delivery handle and message context
//! - [`backoff`] - Backoff requests, plans and base timeouts
//! - [`attributes`] - Queue attribute sets
//! - [`client`] - SQS client trait and HTTP implementation
//! - [`signing`] - AWS Signature Version 4
//! - [`coordinator`] - Per-message visibility coordinator
//! - [`config`] - Configuration
//! - [`error`] - Error types

// Module declarations
pub mod arn;
pub mod attributes;
pub mod backoff;
pub mod client;
pub mod config;
pub mod coordinator;
pub mod envelope;
pub mod error;
pub mod resolver;
pub mod signing;
mod xml;

// Re-export commonly used types at crate root for convenience
pub use arn::Arn;
pub use attributes::{QueueAttributes, VISIBILITY_TIMEOUT};
pub use backoff::{
    BackoffPlan, BackoffPolicy, BaseTimeout, VisibilityRequest, DEFAULT_INCREMENT_SECONDS,
};
pub use client::{HttpSqsClient, SqsClient, SqsResponse};
pub use config::CoordinatorConfig;
pub use coordinator::VisibilityCoordinator;
pub use envelope::{SqsEvent, SqsRecord};
pub use error::{ConfigError, CoordinatorError, EnvelopeError, SqsError, SqsOperation};
pub use resolver::{resolve, DeliveryHandle, MessageContext, QueueIdentity};
pub use signing::Credentials;
