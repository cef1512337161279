//! Per-message visibility backoff and delete-on-success.
//!
//! One [`VisibilityCoordinator`] is created for each message being processed.
//! It owns its [`SqsClient`] for its whole lifetime and is not meant to be
//! shared between concurrent callers.
//!
//! ## Example
//!
//! ```no_run
//! use sqs_visibility::{CoordinatorConfig, SqsEvent, VisibilityCoordinator};
//!
//! # async fn example(event: SqsEvent) -> Result<(), Box<dyn std::error::Error>> {
//! let config = CoordinatorConfig::from_env()?;
//!
//! for record in &event.records {
//!     let coordinator = VisibilityCoordinator::connect(&config, record)?;
//!
//!     match process(&record.body).await {
//!         Ok(()) => {
//!             coordinator.delete().await?;
//!         }
//!         Err(_) => {
//!             coordinator
//!                 .extend_visibility_for_receive_count(config.backoff_policy())
//!                 .await?;
//!         }
//!     }
//!
//!     coordinator.close();
//! }
//! # Ok(())
//! # }
//! # async fn process(_body: &str) -> Result<(), ()> { Ok(()) }
//! ```

use crate::attributes::VISIBILITY_TIMEOUT;
use crate::backoff::{BackoffPolicy, BaseTimeout, VisibilityRequest};
use crate::client::{HttpSqsClient, SqsClient, SqsResponse};
use crate::config::CoordinatorConfig;
use crate::envelope::SqsRecord;
use crate::error::{CoordinatorError, SqsOperation};
use crate::resolver::{resolve, MessageContext};
use tracing::{debug, info, warn};

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;

/// Extends visibility and deletes a single resolved message
pub struct VisibilityCoordinator<C: SqsClient = HttpSqsClient> {
    client: C,
    context: MessageContext,
}

impl VisibilityCoordinator<HttpSqsClient> {
    /// Resolve `record` and create an HTTP client for it
    ///
    /// Resolution happens first, so a malformed envelope never results in a
    /// client being created.
    ///
    /// # Errors
    ///
    /// - [`CoordinatorError::MalformedEnvelope`] when the record cannot be resolved
    /// - [`CoordinatorError::ClientSetup`] when the HTTP client cannot be built
    pub fn connect(config: &CoordinatorConfig, record: &SqsRecord) -> Result<Self, CoordinatorError> {
        let context = resolve(record)?;
        let client = HttpSqsClient::new(config).map_err(CoordinatorError::ClientSetup)?;
        Ok(Self::new(client, context))
    }
}

impl<C: SqsClient> VisibilityCoordinator<C> {
    /// Create coordinator for an already resolved message
    pub fn new(client: C, context: MessageContext) -> Self {
        debug!(queue = %context.identity, "Acquired SQS client for message");
        Self { client, context }
    }

    /// Resolve `record` and bind it to an existing client
    pub fn from_record(client: C, record: &SqsRecord) -> Result<Self, CoordinatorError> {
        let context = resolve(record)?;
        Ok(Self::new(client, context))
    }

    /// Get the resolved message context
    pub fn context(&self) -> &MessageContext {
        &self.context
    }

    /// Get the queue URL of the message
    pub fn queue_url(&self) -> String {
        self.context.identity.url()
    }

    /// Read the queue's current default visibility timeout
    ///
    /// Never fails: a failed fetch, a non-success status or an unparsable
    /// value all produce [`BaseTimeout::Degraded`], which counts as zero.
    pub async fn base_timeout(&self) -> BaseTimeout {
        let base = match self
            .client
            .get_queue_attributes(&self.context.identity, &[VISIBILITY_TIMEOUT])
            .await
        {
            Ok(attributes) => attributes.base_timeout(),
            Err(e) => BaseTimeout::Degraded {
                reason: e.to_string(),
            },
        };

        if let BaseTimeout::Degraded { reason } = &base {
            warn!(
                queue = %self.context.identity,
                reason = %reason,
                "Queue VisibilityTimeout unavailable; using 0 as backoff base"
            );
        }

        base
    }

    /// Compute the timeout `request` resolves to right now
    ///
    /// Incremental requests re-read the queue attributes on every call.
    pub async fn compute_timeout(&self, request: &VisibilityRequest) -> i64 {
        let plan = request.plan();

        if request.override_shadowed() {
            debug!(
                queue = %self.context.identity,
                override_seconds = request.override_seconds,
                increment_seconds = request.increment_seconds,
                "Increment takes precedence over explicit visibility timeout"
            );
        }

        let base_seconds = if plan.needs_base_timeout() {
            self.base_timeout().await.seconds()
        } else {
            0
        };

        let timeout = plan.timeout(request.previous_deliveries, base_seconds);
        debug!(
            queue = %self.context.identity,
            plan = %plan,
            previous_deliveries = request.previous_deliveries,
            base_seconds,
            timeout_seconds = timeout,
            "Planned visibility timeout"
        );
        timeout
    }

    /// Push out the message's visibility deadline
    ///
    /// The computed timeout is sent without validation. The result is the
    /// queue service's answer, not the computed value.
    pub async fn extend_visibility(
        &self,
        request: VisibilityRequest,
    ) -> Result<SqsResponse, CoordinatorError> {
        let timeout = self.compute_timeout(&request).await;

        let response = self
            .client
            .change_message_visibility(&self.context.identity, &self.context.handle, timeout)
            .await
            .map_err(|e| CoordinatorError::remote(SqsOperation::ChangeMessageVisibility, e))?;

        info!(
            queue = %self.context.identity,
            timeout_seconds = timeout,
            request_id = response.request_id.as_deref().unwrap_or("-"),
            "Extended message visibility"
        );
        Ok(response)
    }

    /// Extend visibility using the delivery's `ApproximateReceiveCount`
    ///
    /// A missing receive count is treated as a first delivery.
    pub async fn extend_visibility_for_receive_count(
        &self,
        policy: BackoffPolicy,
    ) -> Result<SqsResponse, CoordinatorError> {
        let deliveries = self.context.receive_count.unwrap_or(1);
        self.extend_visibility(policy.request(deliveries)).await
    }

    /// Delete the message after successful processing
    ///
    /// Whatever the queue service reports is returned unchanged, including
    /// for a handle that was already deleted.
    pub async fn delete(&self) -> Result<SqsResponse, CoordinatorError> {
        let response = self
            .client
            .delete_message(&self.context.identity, &self.context.handle)
            .await
            .map_err(|e| CoordinatorError::remote(SqsOperation::DeleteMessage, e))?;

        info!(
            queue = %self.context.identity,
            request_id = response.request_id.as_deref().unwrap_or("-"),
            "Deleted message"
        );
        Ok(response)
    }

    /// Release the client; the coordinator cannot be used afterwards
    pub fn close(self) {
        debug!(queue = %self.context.identity, "Releasing SQS client");
    }
}

impl<C: SqsClient> std::fmt::Debug for VisibilityCoordinator<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisibilityCoordinator")
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}
