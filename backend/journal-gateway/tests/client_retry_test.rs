//! Retry and saga behavior against a mock downstream HTTP server.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use journal_gateway::clients::{
    CreateEntryPayload, EntryOwnerApi, HttpEntryOwnerClient, HttpLinkClient, HttpTaskClient,
    LinkApi, RemoteError,
};
use journal_gateway::error::GatewayError;
use journal_gateway::saga::JournalCreationSaga;
use resilience::{CancellationToken, RetryConfig};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_retry(max_retries: u32) -> RetryConfig {
    RetryConfig {
        max_retries,
        delay: Duration::from_millis(10),
    }
}

fn payload() -> CreateEntryPayload {
    CreateEntryPayload {
        owner_user_id: "user-1".to_string(),
        title: "notes".to_string(),
        body: String::new(),
    }
}

#[tokio::test]
async fn transient_5xx_is_retried_until_success() {
    let server = MockServer::start().await;

    // Two failures, then success: with 3 retries the call must succeed.
    Mock::given(method("POST"))
        .and(path("/entries"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/entries"))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({"id": "E1"})))
        .mount(&server)
        .await;

    let client = HttpEntryOwnerClient::new(server.uri(), fast_retry(3));
    let entry = client
        .create_entry(&payload(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(entry.id, "E1");
    assert_eq!(entry.owner_user_id, "user-1");
}

#[tokio::test]
async fn client_4xx_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/entries"))
        .respond_with(ResponseTemplate::new(400))
        .expect(1) // a permanent failure must hit the server exactly once
        .mount(&server)
        .await;

    let client = HttpEntryOwnerClient::new(server.uri(), fast_retry(3));
    let err = client
        .create_entry(&payload(), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, RemoteError::Status { status: 400, .. }));
}

#[tokio::test]
async fn exhausted_retries_surface_last_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/entries"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3) // initial attempt + 2 retries
        .mount(&server)
        .await;

    let client = HttpEntryOwnerClient::new(server.uri(), fast_retry(2));
    let err = client
        .create_entry(&payload(), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, RemoteError::Status { status: 500, .. }));
}

#[tokio::test]
async fn undecodable_body_is_a_permanent_decode_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/entries"))
        .respond_with(ResponseTemplate::new(201).set_body_string("not json"))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpEntryOwnerClient::new(server.uri(), fast_retry(3));
    let err = client
        .create_entry(&payload(), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, RemoteError::Decode { .. }));
}

#[tokio::test]
async fn link_count_mismatch_fails_the_call() {
    let server = MockServer::start().await;

    // Asked for two targets, the service reports only one created link.
    Mock::given(method("POST"))
        .and(path("/links"))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!([{
            "id": "L1",
            "owner_id": "E1",
            "target_id": "T1",
            "created_at": "2026-08-28T00:00:00Z",
        }])))
        .mount(&server)
        .await;

    let client = HttpLinkClient::new(server.uri(), fast_retry(0));
    let targets: BTreeSet<String> = ["T1".to_string(), "T2".to_string()].into();
    let err = client
        .link_entry_to_targets("E1", &targets, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        RemoteError::LinkCountMismatch {
            expected: 2,
            actual: 1,
            ..
        }
    ));
}

#[tokio::test]
async fn saga_compensates_over_the_wire() {
    let journal = MockServer::start().await;
    let link = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/entries"))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({"id": "E1"})))
        .expect(1)
        .mount(&journal)
        .await;
    // Exactly one compensating delete for the created entry.
    Mock::given(method("DELETE"))
        .and(path("/entries/E1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&journal)
        .await;
    Mock::given(method("POST"))
        .and(path("/links"))
        .respond_with(ResponseTemplate::new(409))
        .expect(1)
        .mount(&link)
        .await;

    let saga = JournalCreationSaga::new(
        Arc::new(HttpEntryOwnerClient::new(journal.uri(), fast_retry(0))),
        Arc::new(HttpLinkClient::new(link.uri(), fast_retry(0))),
        Arc::new(HttpTaskClient::new("http://127.0.0.1:1".to_string(), fast_retry(0))),
    );

    let targets: BTreeSet<String> = ["T1".to_string()].into();
    let err = saga
        .execute(payload(), targets, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, GatewayError::SagaAborted { .. }));
}
