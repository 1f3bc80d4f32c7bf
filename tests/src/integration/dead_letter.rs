//! # Redelivery Exhaustion
//!
//! With a max receive count of 1 a failed item is redriven on its next
//! receive, and the DLQ handler marks the job broken.

use axum::http::StatusCode;

use super::harness::*;
use node_runtime::NodeConfig;
use shared_types::{JobStatus, StorageEvent};

#[tokio::test]
async fn test_failed_item_is_redriven_once() {
    let p = Pipeline::new();
    let (id, url) = p.issue("photo.gif", "[]", OWNER).await;
    p.upload(&url, b"GIF89a truncated".to_vec()).await;

    // First delivery fails and is released.
    let outcome = p.run_transform().await.unwrap();
    assert_eq!(outcome.released, 1);
    assert_eq!(p.status(&id).await, Some(JobStatus::Processing));

    // Next receive moves it aside instead of delivering it.
    assert!(p.run_transform().await.is_none());
    assert!(p.container.transform_queue.is_empty());
    assert_eq!(p.container.transform_queue.stats().dead_lettered, 1);

    let outcome = p.run_dead_letter().await.unwrap();
    assert_eq!(outcome.acknowledged, 1);
    assert_eq!(p.status(&id).await, Some(JobStatus::Broken));
    assert!(p.container.dead_letter_queue.is_empty());
}

#[tokio::test]
async fn test_more_receives_delay_quarantine() {
    let mut config = NodeConfig::default();
    config.queue.max_receive_count = 3;
    let p = Pipeline::with_config(config);
    let (id, url) = p.issue("photo.png", "[]", OWNER).await;
    p.upload(&url, vec![0u8; 32]).await;

    for attempt in 1..=3 {
        let outcome = p.run_transform().await.unwrap();
        assert_eq!(outcome.released, 1, "attempt {attempt}");
        assert_eq!(p.status(&id).await, Some(JobStatus::Processing));
    }
    p.settle().await;
    assert_eq!(p.status(&id).await, Some(JobStatus::Broken));
}

#[tokio::test]
async fn test_failures_do_not_block_siblings() {
    let p = Pipeline::new();
    let (good, good_url) = p.issue("good.png", "[]", OWNER).await;
    let (bad, bad_url) = p.issue("bad.png", "[]", OWNER).await;
    p.upload(&bad_url, b"broken".to_vec()).await;
    p.upload(&good_url, png(&test_image(3, 3))).await;

    let outcome = p.run_transform().await.unwrap();
    assert_eq!(outcome.acknowledged, 1);
    assert_eq!(outcome.released, 1);

    p.settle().await;
    assert_eq!(p.status(&good).await, Some(JobStatus::Processed));
    assert_eq!(p.status(&bad).await, Some(JobStatus::Broken));
    assert_eq!(p.access(&good, OWNER).await.status(), StatusCode::OK);
    assert_eq!(p.access(&bad, OWNER).await.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_dead_letter_never_downgrades_processed() {
    let p = Pipeline::new();
    let (id, url) = p.issue("photo.png", "[]", OWNER).await;
    p.upload(&url, png(&test_image(2, 2))).await;
    p.settle().await;
    assert_eq!(p.status(&id).await, Some(JobStatus::Processed));

    // A late duplicate lands in the dead-letter queue.
    let body = StorageEvent::object_created("input", id.as_str(), 1, "etag", "01", "2024-01-01T00:00:00Z")
        .to_json()
        .unwrap();
    p.container.dead_letter_queue.send(body);

    let outcome = p.run_dead_letter().await.unwrap();
    assert_eq!(outcome.acknowledged, 1);
    assert_eq!(p.status(&id).await, Some(JobStatus::Processed));
}

#[tokio::test]
async fn test_malformed_dead_letter_is_dropped() {
    let p = Pipeline::new();
    p.container.dead_letter_queue.send("not an event");

    let outcome = p.run_dead_letter().await.unwrap();
    assert_eq!(outcome.acknowledged, 1);
    assert_eq!(outcome.released, 0);
    assert!(p.container.dead_letter_queue.is_empty());
}
