//! Integration tests for `HttpObjectStore` using wiremock HTTP mocks.

use bezz_storage::{HttpObjectStore, ObjectStore, StorageError};
use wiremock::matchers::{body_bytes, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_store(base_url: &str) -> HttpObjectStore {
    HttpObjectStore::new(base_url, "bezz-media", "signing-secret", 600)
        .expect("store construction should not fail")
}

#[tokio::test]
async fn put_uploads_bytes_and_returns_signed_url() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/bezz-media/ads/b1/acme-ad-1.png"))
        .and(header("content-type", "image/png"))
        .and(header("authorization", "Bearer upload-token"))
        .and(body_bytes(vec![9_u8, 8, 7]))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let store = test_store(&server.uri()).with_token(Some("upload-token".to_string()));
    let url = store
        .put("ads/b1/acme-ad-1.png", vec![9, 8, 7], "image/png")
        .await
        .unwrap();

    assert!(url.starts_with(&format!(
        "{}/bezz-media/ads/b1/acme-ad-1.png?expires=",
        server.uri()
    )));
    assert!(store.is_stored_reference(&url));
}

#[tokio::test]
async fn rejected_upload_reports_status() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let store = test_store(&server.uri());
    let err = store
        .put("logos/b1/acme-logo.png", vec![1], "image/png")
        .await
        .unwrap_err();

    assert!(
        matches!(err, StorageError::Upload { ref key, status: 403 } if key == "logos/b1/acme-logo.png")
    );
}
