//! Replicate client tests against a mock HTTP server.

use std::time::Duration;

use serde_json::json;
use vidforge::{
    GenerationOptions, Provider, ReplicateVideoClient, VendorError, VideoClient, VideoGenError,
};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer, model: &str) -> ReplicateVideoClient {
    ReplicateVideoClient::builder()
        .model(model)
        .api_token("r8_test")
        .base_url(server.uri())
        .poll_interval(Duration::from_millis(10))
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_synchronous_prediction_returns_artifacts() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/models/bytedance/seedance-1-lite/predictions"))
        .and(header("Authorization", "Bearer r8_test"))
        .and(header("Prefer", "wait"))
        .and(body_partial_json(json!({
            "input": {"prompt": "a cat", "duration": 5, "resolution": "480p"}
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "p1",
            "status": "succeeded",
            "output": "https://replicate.delivery/x.mp4"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = client(&server, "bytedance/seedance-1-lite")
        .generate_content(
            "a cat",
            GenerationOptions::new().with_duration(5).with_resolution("480p"),
        )
        .await
        .unwrap();

    assert_eq!(response.provider(), Provider::Replicate);
    assert_eq!(response.metadata()["model"], "bytedance/seedance-1-lite");
    assert_eq!(response.content().len(), 1);
    assert_eq!(
        response.content()[0].url.as_deref(),
        Some("https://replicate.delivery/x.mp4")
    );
}

#[tokio::test]
async fn test_pending_prediction_is_polled_until_succeeded() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/models/owner/model/predictions"))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({"id": "p2", "status": "starting"})),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/predictions/p2"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"id": "p2", "status": "processing"})),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/predictions/p2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "p2",
            "status": "succeeded",
            "output": ["https://d/1.mp4", "not-a-url", 42, {"url": "https://d/2.mp4"}]
        })))
        .mount(&server)
        .await;

    let response = client(&server, "owner/model")
        .generate_content("waves", GenerationOptions::new())
        .await
        .unwrap();

    let urls: Vec<_> = response
        .content()
        .iter()
        .map(|a| a.url.clone().unwrap())
        .collect();
    assert_eq!(urls, vec!["https://d/1.mp4", "https://d/2.mp4"]);

    let polls = server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.method.as_str() == "GET")
        .count();
    assert_eq!(polls, 2);
}

#[tokio::test]
async fn test_versioned_model_uses_predictions_endpoint() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/predictions"))
        .and(body_partial_json(json!({"version": "abc123"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "p3",
            "status": "succeeded",
            "output": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = client(&server, "owner/model:abc123")
        .generate_content("x", GenerationOptions::new())
        .await
        .unwrap();
    assert!(response.content().is_empty());
}

#[tokio::test]
async fn test_failed_prediction_is_vendor_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/models/owner/model/predictions"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "p4",
            "status": "failed",
            "error": "NSFW content detected"
        })))
        .mount(&server)
        .await;

    let err = client(&server, "owner/model")
        .generate_content("x", GenerationOptions::new())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        VideoGenError::Vendor(VendorError::Prediction(ref m)) if m == "NSFW content detected"
    ));
}

#[tokio::test]
async fn test_http_error_is_propagated_with_detail() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/models/owner/model/predictions"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "title": "Input validation failed",
            "detail": "duration must be one of 5, 10"
        })))
        .mount(&server)
        .await;

    let err = client(&server, "owner/model")
        .generate_content("x", GenerationOptions::new().with_duration(7))
        .await
        .unwrap_err();
    match err {
        VideoGenError::Vendor(VendorError::Api { status, message }) => {
            assert_eq!(status, 422);
            assert_eq!(message, "duration must be one of 5, 10");
        }
        other => panic!("unexpected error: {other}"),
    }
}

// Replicate holds `Prefer: wait` requests open for up to a minute; the create
// call must outlast reqwest's default 30s timeout.
#[tokio::test]
async fn test_held_open_create_request_is_not_cut_off() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/models/owner/model/predictions"))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!({
                    "id": "p6",
                    "status": "succeeded",
                    "output": "https://replicate.delivery/slow.mp4"
                }))
                .set_delay(Duration::from_secs(35)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let response = client(&server, "owner/model")
        .generate_content("x", GenerationOptions::new())
        .await
        .unwrap();
    assert_eq!(
        response.content()[0].url.as_deref(),
        Some("https://replicate.delivery/slow.mp4")
    );
}
