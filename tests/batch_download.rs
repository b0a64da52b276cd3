//! End-to-end batch download tests against a mock Ocean server.

use std::path::Path;
use std::time::Duration;

use tokio::sync::mpsc;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use letterfetch::api::OceanClient;
use letterfetch::config::Credentials;
use letterfetch::models::letter_path;
use letterfetch::services::{BatchError, DownloadConfig, DownloadEvent, DownloadService};

const TOKEN: &str = "test-access-token";
const PDF: &[u8] = b"%PDF-1.4 test letter";

fn credentials() -> Credentials {
    Credentials {
        client_id: "client-id".to_string(),
        client_secret: "client-secret".to_string(),
    }
}

/// Mount the OAuth2 token endpoint, asserting the Basic auth header.
async fn mount_token_endpoint(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/svc/oauth2/token"))
        .and(query_param("grant_type", "client_credentials"))
        .and(header(
            "authorization",
            "Basic Y2xpZW50LWlkOmNsaWVudC1zZWNyZXQ=",
        ))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "access_token": TOKEN })),
        )
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_letter_endpoint(server: &MockServer, reference: &str, template: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(format!(
            "/svc/fhir/v1/ServiceRequest/{}/$letter",
            reference
        )))
        .and(query_param("attachments", "true"))
        .and(header("authorization", "Bearer test-access-token"))
        .respond_with(template)
        .mount(server)
        .await;
}

fn service(server: &MockServer, output_dir: &Path) -> DownloadService {
    DownloadService::new(
        OceanClient::new(server.uri(), Duration::from_secs(5)),
        DownloadConfig {
            output_dir: output_dir.to_path_buf(),
            request_delay: Duration::ZERO,
        },
    )
}

/// Collect every event the service emits; finishes when the sender drops.
fn spawn_collector() -> (
    mpsc::Sender<DownloadEvent>,
    tokio::task::JoinHandle<Vec<DownloadEvent>>,
) {
    let (tx, mut rx) = mpsc::channel(100);
    let handle = tokio::spawn(async move {
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        events
    });
    (tx, handle)
}

fn progress_values(events: &[DownloadEvent]) -> Vec<(usize, usize)> {
    events
        .iter()
        .filter_map(|e| match e {
            DownloadEvent::Progress { completed, total } => Some((*completed, *total)),
            _ => None,
        })
        .collect()
}

fn refs(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn mixed_batch_downloads_valid_refs_and_records_invalid() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    mount_token_endpoint(&server).await;
    for reference in ["ABCDEFGHIJ", "KLMNOPQRST"] {
        mount_letter_endpoint(
            &server,
            reference,
            ResponseTemplate::new(200).set_body_raw(PDF.to_vec(), "application/pdf"),
        )
        .await;
    }

    let references = refs(&["ABCDEFGHIJ", "short", "KLMNOPQRST"]);
    let (tx, collector) = spawn_collector();
    let result = service(&server, dir.path())
        .run(Some(credentials()), &references, tx)
        .await
        .unwrap();

    assert_eq!(result.successful, vec!["ABCDEFGHIJ", "KLMNOPQRST"]);
    assert_eq!(result.failed.len(), 1);
    assert_eq!(result.failed[0].reference, "short");
    assert_eq!(result.failed[0].error, "Invalid referral ref: short");
    assert_eq!(result.skipped, 0);
    assert_eq!(
        result.successful.len() + result.failed.len(),
        references.len()
    );

    for reference in ["ABCDEFGHIJ", "KLMNOPQRST"] {
        let written = std::fs::read(letter_path(dir.path(), reference)).unwrap();
        assert_eq!(written, PDF);
    }
    assert!(!letter_path(dir.path(), "short").exists());

    // One Progress per reference, strictly increasing 1..=total.
    let events = collector.await.unwrap();
    assert_eq!(progress_values(&events), vec![(1, 3), (2, 3), (3, 3)]);

    // The per-item event precedes its Progress event.
    assert!(matches!(&events[0], DownloadEvent::Fetched { reference } if reference == "ABCDEFGHIJ"));
    assert!(matches!(&events[2], DownloadEvent::Failed { reference, .. } if reference == "short"));
    assert!(matches!(&events[4], DownloadEvent::Fetched { reference } if reference == "KLMNOPQRST"));
}

#[tokio::test]
async fn short_reference_fails_without_a_letter_request() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    mount_token_endpoint(&server).await;

    let references = refs(&["short"]);
    let (tx, _collector) = spawn_collector();
    let result = service(&server, dir.path())
        .run(Some(credentials()), &references, tx)
        .await
        .unwrap();

    assert!(result.successful.is_empty());
    assert_eq!(result.failed[0].error, "Invalid referral ref: short");

    // Only the token exchange reached the server.
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method.to_string(), "POST");
}

#[tokio::test]
async fn existing_file_is_skipped_without_a_fetch() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    mount_token_endpoint(&server).await;

    let existing = letter_path(dir.path(), "ABCDEFGHIJ");
    std::fs::write(&existing, b"existing letter").unwrap();

    let references = refs(&["ABCDEFGHIJ"]);
    let (tx, collector) = spawn_collector();
    let result = service(&server, dir.path())
        .run(Some(credentials()), &references, tx)
        .await
        .unwrap();

    assert_eq!(result.successful, vec!["ABCDEFGHIJ"]);
    assert_eq!(result.skipped, 1);
    assert!(result.failed.is_empty());

    // File untouched, no letter request issued.
    assert_eq!(std::fs::read(&existing).unwrap(), b"existing letter");
    assert_eq!(server.received_requests().await.unwrap().len(), 1);

    let events = collector.await.unwrap();
    assert!(matches!(&events[0], DownloadEvent::Skipped { reference } if reference == "ABCDEFGHIJ"));
}

#[tokio::test]
async fn missing_credentials_aborts_before_any_work() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let output_dir = dir.path().join("letters");

    let references = refs(&["ABCDEFGHIJ"]);
    let (tx, collector) = spawn_collector();
    let err = service(&server, &output_dir)
        .run(None, &references, tx)
        .await
        .unwrap_err();

    assert!(matches!(err, BatchError::NoCredentials));
    assert_eq!(err.to_string(), "No credentials found");

    // Nothing happened: no events, no requests, no output directory.
    assert!(collector.await.unwrap().is_empty());
    assert!(server.received_requests().await.unwrap().is_empty());
    assert!(!output_dir.exists());
}

#[tokio::test]
async fn token_exchange_failure_is_batch_fatal() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let output_dir = dir.path().join("letters");

    Mock::given(method("POST"))
        .and(path("/svc/oauth2/token"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let references = refs(&["ABCDEFGHIJ", "KLMNOPQRST"]);
    let (tx, collector) = spawn_collector();
    let err = service(&server, &output_dir)
        .run(Some(credentials()), &references, tx)
        .await
        .unwrap_err();

    assert!(matches!(err, BatchError::Token(_)));
    assert!(collector.await.unwrap().is_empty());
    assert!(!output_dir.exists());
}

#[tokio::test]
async fn empty_access_token_is_batch_fatal() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("POST"))
        .and(path("/svc/oauth2/token"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "access_token": "" })),
        )
        .mount(&server)
        .await;

    let (tx, _collector) = spawn_collector();
    let err = service(&server, dir.path())
        .run(Some(credentials()), &refs(&["ABCDEFGHIJ"]), tx)
        .await
        .unwrap_err();

    assert!(matches!(err, BatchError::Token(_)));
}

#[tokio::test]
async fn http_404_fails_one_reference_and_spares_the_rest() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    mount_token_endpoint(&server).await;

    let good = ["AAAAAAAAAA", "BBBBBBBBBB", "CCCCCCCCCC", "DDDDDDDDDD"];
    for reference in good {
        mount_letter_endpoint(
            &server,
            reference,
            ResponseTemplate::new(200).set_body_raw(PDF.to_vec(), "application/pdf"),
        )
        .await;
    }
    mount_letter_endpoint(&server, "MISSING404X", ResponseTemplate::new(404)).await;

    let references = refs(&[
        "AAAAAAAAAA",
        "BBBBBBBBBB",
        "MISSING404X",
        "CCCCCCCCCC",
        "DDDDDDDDDD",
    ]);
    let (tx, _collector) = spawn_collector();
    let result = service(&server, dir.path())
        .run(Some(credentials()), &references, tx)
        .await
        .unwrap();

    assert_eq!(result.successful.len(), 4);
    assert_eq!(result.failed.len(), 1);
    assert_eq!(result.failed[0].reference, "MISSING404X");
    assert_eq!(result.failed[0].error, "HTTP error! status: 404");

    for reference in good {
        assert!(letter_path(dir.path(), reference).exists());
    }
    assert!(!letter_path(dir.path(), "MISSING404X").exists());
}

#[tokio::test]
async fn rerun_resolves_from_disk_without_letter_requests() {
    let dir = tempfile::tempdir().unwrap();
    let references = refs(&["ABCDEFGHIJ", "short", "KLMNOPQRST"]);

    // First run downloads the two valid references.
    {
        let server = MockServer::start().await;
        mount_token_endpoint(&server).await;
        for reference in ["ABCDEFGHIJ", "KLMNOPQRST"] {
            mount_letter_endpoint(
                &server,
                reference,
                ResponseTemplate::new(200).set_body_raw(PDF.to_vec(), "application/pdf"),
            )
            .await;
        }

        let (tx, _collector) = spawn_collector();
        let result = service(&server, dir.path())
            .run(Some(credentials()), &references, tx)
            .await
            .unwrap();
        assert_eq!(result.successful.len(), 2);
    }

    let file_count = std::fs::read_dir(dir.path()).unwrap().count();
    assert_eq!(file_count, 2);

    // Second run against a server with no letter endpoints: both valid
    // references resolve from disk, the short one still fails validation.
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    let (tx, _collector) = spawn_collector();
    let result = service(&server, dir.path())
        .run(Some(credentials()), &references, tx)
        .await
        .unwrap();

    assert_eq!(result.successful, vec!["ABCDEFGHIJ", "KLMNOPQRST"]);
    assert_eq!(result.skipped, 2);
    assert_eq!(result.failed.len(), 1);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), file_count);
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}
