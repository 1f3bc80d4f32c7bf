//! # Client-Visible Flows
//!
//! ```text
//! POST /generate-url ──→ PUT write URL ──→ notification ──→ worker
//!                                                              │
//! GET /access-object ←── processed / broken ←──────────────────┘
//! ```

use axum::body::Body;
use axum::http::{Method, StatusCode};
use image::imageops;

use super::harness::*;
use shared_types::JobStatus;

const GRAYSCALE: &str = r#"[{"Name":"grayscale"}]"#;

#[tokio::test]
async fn test_issue_creates_processing_record() {
    let p = Pipeline::new();
    let (id, url) = p.issue("photo.png", GRAYSCALE, OWNER).await;

    assert!(id.as_str().starts_with("image-"));
    assert!(id.as_str().ends_with(".png"));
    assert!(url.starts_with(&format!("{BASE}/objects/input/{id}?op=write")));

    let job = p.container.jobs.fetch(&id).await.unwrap().unwrap();
    assert_eq!(job.status(), Some(JobStatus::Processing));
    assert_eq!(job.source_identity().unwrap().as_str(), "203.0.113.10");
    assert_eq!(job.transforms().unwrap().len(), 1);
}

#[tokio::test]
async fn test_unsupported_suffix_creates_nothing() {
    let p = Pipeline::new();
    for name in ["photo.txt", "photo", "photo.PNG.exe"] {
        let body = format!(r#"{{"ObjectName":"{name}","Transforms":[]}}"#);
        let response = p
            .send(request(Method::POST, "/generate-url", Some(OWNER), Body::from(body)))
            .await;
        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE, "{name}");
    }
    assert!(p.container.transform_queue.is_empty());
}

#[tokio::test]
async fn test_processed_object_is_readable() {
    let p = Pipeline::new();
    let source = test_image(8, 6);
    let (id, url) = p.issue("photo.png", GRAYSCALE, OWNER).await;
    assert_eq!(p.upload(&url, png(&source)).await, StatusCode::OK);

    // Uploaded but not yet transformed.
    let response = p.access(&id, OWNER).await;
    assert_eq!(response.status(), StatusCode::TOO_EARLY);

    let outcome = p.run_transform().await.unwrap();
    assert_eq!(outcome.acknowledged, 1);
    assert_eq!(p.status(&id).await, Some(JobStatus::Processed));

    let response = p.access(&id, OWNER).await;
    assert_eq!(response.status(), StatusCode::OK);
    let read_url = body_text(response).await;
    assert!(read_url.starts_with(&format!("{BASE}/objects/output/{id}?op=read")));

    let response = p
        .send(request(Method::GET, path_of(&read_url), None, Body::empty()))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("content-type").unwrap(), "image/png");
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    let output = decode(&bytes);
    assert_eq!(output.dimensions(), source.dimensions());
    let expected = imageops::grayscale_alpha(&source);
    for (x, y, pixel) in output.enumerate_pixels() {
        let [r, g, b, _] = pixel.0;
        assert_eq!(r, g);
        assert_eq!(g, b);
        assert_eq!(r, expected.get_pixel(x, y).0[0]);
    }
}

#[tokio::test]
async fn test_read_url_expires() {
    let p = Pipeline::new();
    let (id, url) = p.issue("photo.png", "[]", OWNER).await;
    p.upload(&url, png(&test_image(2, 2))).await;
    p.settle().await;

    let read_url = body_text(p.access(&id, OWNER).await).await;
    p.time.advance(61);
    let response = p
        .send(request(Method::GET, path_of(&read_url), None, Body::empty()))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // A fresh access mints a fresh capability.
    let read_url = body_text(p.access(&id, OWNER).await).await;
    let response = p
        .send(request(Method::GET, path_of(&read_url), None, Body::empty()))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_unprocessable_upload_becomes_broken() {
    let p = Pipeline::new();
    let (id, url) = p.issue("photo.jpeg", GRAYSCALE, OWNER).await;
    assert_eq!(p.upload(&url, b"definitely not a jpeg".to_vec()).await, StatusCode::OK);

    p.settle().await;
    assert_eq!(p.status(&id).await, Some(JobStatus::Broken));
    assert!(p.output(&id).await.is_none());

    let response = p.access(&id, OWNER).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await,
        serde_json::json!({"code": "object_broken", "message": "object could not be processed"})
    );
}

#[tokio::test]
async fn test_other_identity_is_denied_in_every_state() {
    let p = Pipeline::new();
    let (id, url) = p.issue("photo.png", GRAYSCALE, OWNER).await;

    let response = p.access(&id, STRANGER).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["code"], "access_denied");

    p.upload(&url, png(&test_image(4, 4))).await;
    p.settle().await;
    assert_eq!(p.status(&id).await, Some(JobStatus::Processed));

    let response = p.access(&id, STRANGER).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // The owner is still served.
    assert_eq!(p.access(&id, OWNER).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_object_is_denied() {
    let p = Pipeline::new();
    let response = p
        .send(request(
            Method::GET,
            "/access-object?object-name=image-00000000-0000-0000-0000-000000000000.png",
            Some(OWNER),
            Body::empty(),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_wrong_verbs_are_rejected() {
    let p = Pipeline::new();
    for (method, uri) in [
        (Method::GET, "/generate-url"),
        (Method::PUT, "/generate-url"),
        (Method::POST, "/access-object"),
        (Method::DELETE, "/access-object"),
    ] {
        let response = p
            .send(request(method.clone(), uri, Some(OWNER), Body::empty()))
            .await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED, "{method} {uri}");
    }
}
