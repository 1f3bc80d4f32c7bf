//! # Cross-Component Invariants
//!
//! - One job record per issued identifier, status only leaves `processing`
//! - Capabilities grant one operation on one object
//! - Filter chains apply in order; unknown names are skipped
//! - Oversized inputs never reach the output bucket

use std::collections::HashSet;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, StatusCode};
use image::imageops;
use proptest::prelude::*;

use super::harness::*;
use it_01_job_store::{InMemoryMetadataStore, JobStore};
use node_runtime::NodeConfig;
use shared_types::{ContentType, JobRecord, JobStatus, ObjectId, SourceIdentity};

#[tokio::test]
async fn test_every_issue_gets_its_own_record() {
    let p = Pipeline::new();
    let mut seen = HashSet::new();
    for i in 0..25 {
        let name = format!("photo-{i}.{}", ["png", "jpg", "jpeg", "gif"][i % 4]);
        let (id, _) = p.issue(&name, "[]", OWNER).await;
        assert!(seen.insert(id.clone()), "duplicate identifier {id}");
        assert_eq!(p.status(&id).await, Some(JobStatus::Processing));
    }
}

#[tokio::test]
async fn test_capability_grants_one_operation_on_one_object() {
    let p = Pipeline::new();
    let (id, write_url) = p.issue("photo.png", "[]", OWNER).await;
    let write_path = path_of(&write_url).to_string();

    // Same key, other bucket.
    let moved = write_path.replace("/objects/input/", "/objects/output/");
    let response = p
        .send(request(Method::PUT, &moved, None, Body::from("x")))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Operation swapped in the query.
    let swapped = write_path.replace("op=write", "op=read");
    let response = p
        .send(request(Method::GET, &swapped, None, Body::empty()))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    p.upload(&write_url, png(&test_image(2, 2))).await;
    p.settle().await;

    // Read capability cannot overwrite the result.
    let read_url = body_text(p.access(&id, OWNER).await).await;
    let response = p
        .send(request(Method::PUT, path_of(&read_url), None, Body::from("x")))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(p.output(&id).await.unwrap().len() > 1);
}

#[tokio::test]
async fn test_empty_chain_preserves_pixels() {
    let p = Pipeline::new();
    let source = test_image(7, 5);
    let (id, url) = p.issue("photo.png", "[]", OWNER).await;
    p.upload(&url, png(&source)).await;
    p.settle().await;

    assert_eq!(p.status(&id).await, Some(JobStatus::Processed));
    assert_eq!(decode(&p.output(&id).await.unwrap()), source);
}

#[tokio::test]
async fn test_unknown_and_reserved_filters_are_skipped() {
    let p = Pipeline::new();
    let source = test_image(4, 4);
    let chain = r#"[{"Name":"vignette"},{"Name":"quality","Params":["80"]},{"Name":"invert"}]"#;
    let (id, url) = p.issue("photo.png", chain, OWNER).await;
    p.upload(&url, png(&source)).await;
    p.settle().await;

    assert_eq!(p.status(&id).await, Some(JobStatus::Processed));
    let mut expected = source.clone();
    imageops::invert(&mut expected);
    assert_eq!(decode(&p.output(&id).await.unwrap()), expected);
}

#[tokio::test]
async fn test_chain_order_matters() {
    let p = Pipeline::new();
    let source = test_image(5, 5);
    let (a, url_a) = p
        .issue("a.png", r#"[{"Name":"grayscale"},{"Name":"sepia"}]"#, OWNER)
        .await;
    let (b, url_b) = p
        .issue("b.png", r#"[{"Name":"sepia"},{"Name":"grayscale"}]"#, OWNER)
        .await;
    p.upload(&url_a, png(&source)).await;
    p.upload(&url_b, png(&source)).await;
    p.settle().await;

    let out_a = decode(&p.output(&a).await.unwrap());
    let out_b = decode(&p.output(&b).await.unwrap());
    assert_ne!(out_a, out_b);
    // Grayscale last leaves equal channels.
    assert!(out_b.pixels().all(|px| px.0[0] == px.0[1] && px.0[1] == px.0[2]));
}

#[tokio::test]
async fn test_invalid_filter_parameter_breaks_job() {
    let p = Pipeline::new();
    let (id, url) = p
        .issue("photo.png", r#"[{"Name":"median","Params":["wide"]}]"#, OWNER)
        .await;
    p.upload(&url, png(&test_image(3, 3))).await;
    p.settle().await;

    assert_eq!(p.status(&id).await, Some(JobStatus::Broken));
    assert!(p.output(&id).await.is_none());
}

#[tokio::test]
async fn test_oversized_dimensions_are_rejected() {
    let p = Pipeline::new();
    let (id, url) = p.issue("wide.png", "[]", OWNER).await;
    p.upload(&url, png(&test_image(7681, 1))).await;
    p.settle().await;

    assert_eq!(p.status(&id).await, Some(JobStatus::Broken));
    assert!(p.output(&id).await.is_none());
}

#[tokio::test]
async fn test_oversized_upload_never_lands() {
    let mut config = NodeConfig::default();
    config.gateway.limits.max_object_bytes = 64;
    let p = Pipeline::with_config(config);
    let (id, url) = p.issue("photo.png", "[]", OWNER).await;

    assert_eq!(p.upload(&url, vec![0u8; 65]).await, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(p.container.transform_queue.is_empty());
    assert_eq!(p.status(&id).await, Some(JobStatus::Processing));
}

#[tokio::test]
async fn test_duplicate_notification_is_harmless() {
    let p = Pipeline::new();
    let (id, url) = p.issue("photo.png", r#"[{"Name":"invert"}]"#, OWNER).await;
    p.upload(&url, png(&test_image(3, 3))).await;

    let delivery = p.container.transform_queue.receive_batch().pop().unwrap();
    p.container.transform_queue.ack(delivery.message_id).unwrap();
    p.container.transform_queue.send(delivery.body.clone());
    p.container.transform_queue.send(delivery.body);

    let outcome = p.run_transform().await.unwrap();
    assert_eq!(outcome.acknowledged, 2);
    assert_eq!(p.status(&id).await, Some(JobStatus::Processed));
}

#[derive(Debug, Clone, Copy)]
enum Step {
    Processed,
    Broken,
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_status_never_leaves_first_terminal(steps in prop::collection::vec(
        prop_oneof![Just(Step::Processed), Just(Step::Broken)],
        1..8,
    )) {
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        runtime.block_on(async {
            let jobs = JobStore::new(Arc::new(InMemoryMetadataStore::new()));
            let id = ObjectId::generate(ContentType::Png);
            jobs.create(&JobRecord::issued(
                id.clone(),
                SourceIdentity::new("192.0.2.1"),
                ContentType::Png,
                Vec::new(),
            ))
            .await
            .unwrap();

            let first = match steps[0] {
                Step::Processed => JobStatus::Processed,
                Step::Broken => JobStatus::Broken,
            };
            for step in &steps {
                let _ = match step {
                    Step::Processed => jobs.mark_processed(&id).await,
                    Step::Broken => jobs.mark_broken(&id).await,
                };
                let status = jobs.fetch(&id).await.unwrap().unwrap().status();
                prop_assert_eq!(status, Some(first));
            }
            Ok::<(), TestCaseError>(())
        })?;
    }
}
