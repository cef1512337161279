//! Integration tests for the message lifecycle against a mock SQS endpoint
//!
//! These tests verify:
//! - Resolve → extend visibility with queue-derived backoff
//! - Explicit timeouts bypass the attribute fetch
//! - Degraded attribute fetches fall back to a zero base
//! - Delete-on-success and surfaced delete failures

mod common;

use common::*;
use sqs_visibility::{
    BackoffPolicy, CoordinatorError, SqsError, SqsOperation, VisibilityRequest,
};
use wiremock::matchers::{method, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Verify that a third delivery extends visibility to base + 2 increments
#[tokio::test]
async fn test_extend_visibility_with_queue_base() {
    init_logging();

    // Arrange
    let server = MockServer::start().await;
    mount_visibility_timeout(&server, "30").await;
    mount_change_visibility(&server, "40").await;

    let record = create_test_record(3);
    let coordinator = create_test_coordinator(&server, &record);

    // Act
    let response = coordinator
        .extend_visibility_for_receive_count(BackoffPolicy::default())
        .await
        .unwrap();

    // Assert
    assert_eq!(
        response.request_id.as_deref(),
        Some("req-ChangeMessageVisibility")
    );
    assert_eq!(requests_for(&server, "GetQueueAttributes").await, 1);
    coordinator.close();
}

/// Verify that an explicit timeout with no increment skips the attribute fetch
#[tokio::test]
async fn test_explicit_timeout_skips_attribute_fetch() {
    init_logging();

    // Arrange
    let server = MockServer::start().await;
    mount_visibility_timeout(&server, "30").await;
    mount_change_visibility(&server, "120").await;

    let coordinator = create_test_coordinator(&server, &create_test_record(3));

    // Act
    let result = coordinator
        .extend_visibility(VisibilityRequest::explicit(3, 120))
        .await;

    // Assert
    assert!(result.is_ok());
    assert_eq!(requests_for(&server, "GetQueueAttributes").await, 0);
}

/// Verify that an increment wins over an explicit timeout
#[tokio::test]
async fn test_increment_wins_over_explicit_timeout() {
    init_logging();

    // Arrange
    let server = MockServer::start().await;
    mount_visibility_timeout(&server, "30").await;
    mount_change_visibility(&server, "40").await;

    let coordinator = create_test_coordinator(&server, &create_test_record(3));

    // Act
    let result = coordinator
        .extend_visibility(VisibilityRequest::new(3, 5, 120))
        .await;

    // Assert
    assert!(result.is_ok());
}

/// Verify that a failed attribute fetch degrades to a zero base
#[tokio::test]
async fn test_attribute_fetch_failure_degrades_to_zero() {
    init_logging();

    // Arrange
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(query_param("Action", "GetQueueAttributes"))
        .respond_with(
            ResponseTemplate::new(500).set_body_string(error_xml("InternalError", "boom")),
        )
        .mount(&server)
        .await;
    mount_change_visibility(&server, "10").await;

    let coordinator = create_test_coordinator(&server, &create_test_record(3));

    // Act
    let base = coordinator.base_timeout().await;
    let result = coordinator
        .extend_visibility(VisibilityRequest::incremental(3, 5))
        .await;

    // Assert
    assert!(base.is_degraded());
    assert!(result.is_ok());
}

/// Verify that a non-numeric attribute value degrades to a zero base
#[tokio::test]
async fn test_unparsable_attribute_degrades_to_zero() {
    init_logging();

    // Arrange
    let server = MockServer::start().await;
    mount_visibility_timeout(&server, "not-a-number").await;
    mount_change_visibility(&server, "5").await;

    let coordinator = create_test_coordinator(&server, &create_test_record(2));

    // Act
    let result = coordinator
        .extend_visibility(VisibilityRequest::incremental(2, 5))
        .await;

    // Assert
    assert!(result.is_ok());
}

/// Verify that a rejected visibility change is surfaced to the caller
#[tokio::test]
async fn test_rejected_visibility_change_is_surfaced() {
    init_logging();

    // Arrange
    let server = MockServer::start().await;
    mount_visibility_timeout(&server, "0").await;
    Mock::given(method("POST"))
        .and(query_param("Action", "ChangeMessageVisibility"))
        .and(query_param("VisibilityTimeout", "-5"))
        .respond_with(ResponseTemplate::new(400).set_body_string(error_xml(
            "InvalidParameterValue",
            "Value -5 for parameter VisibilityTimeout is invalid.",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let coordinator = create_test_coordinator(&server, &create_test_record(1));

    // Act
    let result = coordinator
        .extend_visibility(VisibilityRequest::incremental(0, 5))
        .await;

    // Assert
    match result {
        Err(CoordinatorError::Remote { operation, source }) => {
            assert_eq!(operation, SqsOperation::ChangeMessageVisibility);
            assert!(matches!(source, SqsError::Service { status: 400, .. }));
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

/// Verify delete-on-success
#[tokio::test]
async fn test_delete_on_success() {
    init_logging();

    // Arrange
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(query_param("Action", "DeleteMessage"))
        .and(query_param("QueueUrl", QUEUE_URL))
        .and(query_param("ReceiptHandle", RECEIPT_HANDLE))
        .respond_with(ResponseTemplate::new(200).set_body_string(metadata_xml("DeleteMessage")))
        .expect(1)
        .mount(&server)
        .await;

    let coordinator = create_test_coordinator(&server, &create_test_record(1));

    // Act
    let response = coordinator.delete().await.unwrap();

    // Assert
    assert_eq!(response.status, 200);
    assert_eq!(response.request_id.as_deref(), Some("req-DeleteMessage"));
    coordinator.close();
}

/// Verify that deleting an already-deleted handle surfaces the service answer
#[tokio::test]
async fn test_delete_of_stale_handle_is_surfaced() {
    init_logging();

    // Arrange
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(query_param("Action", "DeleteMessage"))
        .respond_with(ResponseTemplate::new(400).set_body_string(error_xml(
            "ReceiptHandleIsInvalid",
            "The input receipt handle is invalid.",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let coordinator = create_test_coordinator(&server, &create_test_record(1));

    // Act
    let result = coordinator.delete().await;

    // Assert
    match result {
        Err(err @ CoordinatorError::Remote { .. }) => assert!(!err.is_transient()),
        other => panic!("unexpected result: {:?}", other),
    }
}
