// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! End-to-end tests driving the orchestrator against in-process fake
//! services.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Body;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use bytes::Bytes;
use futures_util::StreamExt;
use serde_json::{json, Map, Value};
use tokio::net::TcpListener;

use crate::engine::{NodeOutput, Orchestrator, ScheduleOutput};
use crate::errors::ExecutionError;
use crate::graph::ServiceDag;
use crate::registry::{ServiceKind, ServiceRegistry};

/// Serve a router on an ephemeral port and return its base URL.
async fn spawn_fake_services(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(fields) => fields,
        _ => panic!("expected object"),
    }
}

#[tokio::test]
async fn fan_in_inputs_are_union_merged() {
    // x and y are sources; z depends on both and must be invoked with the
    // union of their outputs.
    let seen_by_x: Arc<Mutex<Option<Value>>> = Arc::new(Mutex::new(None));
    let seen_by_z: Arc<Mutex<Option<Value>>> = Arc::new(Mutex::new(None));

    let x_capture = seen_by_x.clone();
    let z_capture = seen_by_z.clone();
    let router = Router::new()
        .route(
            "/x",
            post(move |Json(body): Json<Value>| {
                let x_capture = x_capture.clone();
                async move {
                    *x_capture.lock().unwrap() = Some(body);
                    Json(json!({"x": 1}))
                }
            }),
        )
        .route("/y", post(|| async { Json(json!({"y": 2})) }))
        .route(
            "/z",
            post(move |Json(body): Json<Value>| {
                let z_capture = z_capture.clone();
                async move {
                    *z_capture.lock().unwrap() = Some(body);
                    Json(json!({"answer": 42}))
                }
            }),
        );
    let base = spawn_fake_services(router).await;

    let mut dag = ServiceDag::new();
    for id in ["x", "y", "z"] {
        dag.add_node(id).unwrap();
    }
    dag.add_edge("x", "z").unwrap();
    dag.add_edge("y", "z").unwrap();

    let mut registry = ServiceRegistry::new();
    registry
        .register("x", format!("{}/x", base), ServiceKind::Generic)
        .unwrap();
    registry
        .register("y", format!("{}/y", base), ServiceKind::Generic)
        .unwrap();
    registry
        .register("z", format!("{}/z", base), ServiceKind::Generic)
        .unwrap();

    let orchestrator = Orchestrator::new(dag, registry);
    let initial = object(json!({"query": "what is the answer"}));
    let output = orchestrator.schedule(initial).await.unwrap();

    // Sources receive the original payload untouched.
    assert_eq!(
        seen_by_x.lock().unwrap().take().unwrap(),
        json!({"query": "what is the answer"})
    );
    // The fan-in stage receives the merged predecessor outputs.
    assert_eq!(
        seen_by_z.lock().unwrap().take().unwrap(),
        json!({"x": 1, "y": 2})
    );
    // Single leaf: its result is returned directly.
    match output {
        ScheduleOutput::Single(NodeOutput::Json(fields)) => {
            assert_eq!(fields["answer"], json!(42));
        }
        other => panic!("expected single JSON leaf, got {:?}", other),
    }
}

#[tokio::test]
async fn downstream_stage_receives_predecessor_output_not_initial_payload() {
    let seen_by_b: Arc<Mutex<Option<Value>>> = Arc::new(Mutex::new(None));

    let b_capture = seen_by_b.clone();
    let router = Router::new()
        .route("/a", post(|| async { Json(json!({"step": "a"})) }))
        .route(
            "/b",
            post(move |Json(body): Json<Value>| {
                let b_capture = b_capture.clone();
                async move {
                    *b_capture.lock().unwrap() = Some(body);
                    Json(json!({"step": "b"}))
                }
            }),
        );
    let base = spawn_fake_services(router).await;

    let mut dag = ServiceDag::new();
    dag.add_node("a").unwrap();
    dag.add_node("b").unwrap();
    dag.add_edge("a", "b").unwrap();

    let mut registry = ServiceRegistry::new();
    registry
        .register("a", format!("{}/a", base), ServiceKind::Generic)
        .unwrap();
    registry
        .register("b", format!("{}/b", base), ServiceKind::Generic)
        .unwrap();

    let orchestrator = Orchestrator::new(dag, registry);
    orchestrator
        .schedule(object(json!({"query": "hi"})))
        .await
        .unwrap();

    assert_eq!(
        seen_by_b.lock().unwrap().take().unwrap(),
        json!({"step": "a"})
    );
}

#[tokio::test]
async fn failed_stage_aborts_without_dispatching_downstream() {
    let c_invocations = Arc::new(AtomicUsize::new(0));

    let c_counter = c_invocations.clone();
    let router = Router::new()
        .route("/a", post(|| async { Json(json!({"ok": true})) }))
        .route("/b", post(|| async { StatusCode::INTERNAL_SERVER_ERROR }))
        .route(
            "/c",
            post(move || {
                let c_counter = c_counter.clone();
                async move {
                    c_counter.fetch_add(1, Ordering::SeqCst);
                    Json(json!({"ok": true}))
                }
            }),
        );
    let base = spawn_fake_services(router).await;

    let mut dag = ServiceDag::new();
    for id in ["a", "b", "c"] {
        dag.add_node(id).unwrap();
    }
    dag.add_edge("a", "b").unwrap();
    dag.add_edge("b", "c").unwrap();

    let mut registry = ServiceRegistry::new();
    for id in ["a", "b", "c"] {
        registry
            .register(id, format!("{}/{}", base, id), ServiceKind::Generic)
            .unwrap();
    }

    let orchestrator = Orchestrator::new(dag, registry);
    let err = orchestrator.schedule(Map::new()).await.unwrap_err();

    match err {
        ExecutionError::Status { service, status } => {
            assert_eq!(service, "b");
            assert_eq!(status.as_u16(), 500);
        }
        other => panic!("expected Status error, got {:?}", other),
    }
    // No partial results are synthesized: c is never reached.
    assert_eq!(c_invocations.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn non_object_response_is_malformed() {
    let router = Router::new().route("/a", post(|| async { Json(json!([1, 2, 3])) }));
    let base = spawn_fake_services(router).await;

    let mut dag = ServiceDag::new();
    dag.add_node("a").unwrap();
    let mut registry = ServiceRegistry::new();
    registry
        .register("a", format!("{}/a", base), ServiceKind::Generic)
        .unwrap();

    let orchestrator = Orchestrator::new(dag, registry);
    let err = orchestrator.schedule(Map::new()).await.unwrap_err();
    match err {
        ExecutionError::MalformedResponse { service, reason } => {
            assert_eq!(service, "a");
            assert!(reason.contains("array"), "unexpected reason: {}", reason);
        }
        other => panic!("expected MalformedResponse, got {:?}", other),
    }
}

#[tokio::test]
async fn non_json_response_is_malformed() {
    let router = Router::new().route("/a", post(|| async { "plain text, not json" }));
    let base = spawn_fake_services(router).await;

    let mut dag = ServiceDag::new();
    dag.add_node("a").unwrap();
    let mut registry = ServiceRegistry::new();
    registry
        .register("a", format!("{}/a", base), ServiceKind::Generic)
        .unwrap();

    let orchestrator = Orchestrator::new(dag, registry);
    let err = orchestrator.schedule(Map::new()).await.unwrap_err();
    assert!(matches!(err, ExecutionError::MalformedResponse { .. }));
}

#[tokio::test]
async fn streaming_leaf_yields_chunks_before_upstream_completes() {
    const CHUNKS: usize = 5;
    let finished_emitting = Arc::new(AtomicBool::new(false));

    let flag = finished_emitting.clone();
    let router = Router::new()
        .route("/embed", post(|| async { Json(json!({"context": "docs"})) }))
        .route(
            "/llm",
            post(move |Json(_body): Json<Value>| {
                let flag = flag.clone();
                async move {
                    // Deliberately slow fake endpoint: one chunk every 150ms.
                    let stream = futures_util::stream::iter(0..CHUNKS).then(move |i| {
                        let flag = flag.clone();
                        async move {
                            if i > 0 {
                                tokio::time::sleep(Duration::from_millis(150)).await;
                            }
                            if i == CHUNKS - 1 {
                                flag.store(true, Ordering::SeqCst);
                            }
                            Ok::<_, std::io::Error>(Bytes::from(format!("tok{} ", i)))
                        }
                    });
                    Body::from_stream(stream)
                }
            }),
        );
    let base = spawn_fake_services(router).await;

    let mut dag = ServiceDag::new();
    dag.add_node("embed").unwrap();
    dag.add_node("llm").unwrap();
    dag.add_edge("embed", "llm").unwrap();

    let mut registry = ServiceRegistry::new();
    registry
        .register("embed", format!("{}/embed", base), ServiceKind::Generic)
        .unwrap();
    registry
        .register("llm", format!("{}/llm", base), ServiceKind::Streaming)
        .unwrap();

    let orchestrator = Orchestrator::new(dag, registry);
    let output = orchestrator
        .schedule(object(json!({"query": "stream it"})))
        .await
        .unwrap();

    let mut stream = match output {
        ScheduleOutput::Single(NodeOutput::Stream(stream)) => stream,
        other => panic!("expected streaming leaf, got {:?}", other),
    };

    // The first chunk must arrive while the endpoint is still emitting.
    let first = stream.next().await.unwrap().unwrap();
    assert_eq!(first, Bytes::from("tok0 "));
    assert!(
        !finished_emitting.load(Ordering::SeqCst),
        "first chunk should be observable before the endpoint finishes"
    );

    let mut collected = String::from_utf8(first.to_vec()).unwrap();
    while let Some(chunk) = stream.next().await {
        collected.push_str(std::str::from_utf8(&chunk.unwrap()).unwrap());
    }
    assert_eq!(collected, "tok0 tok1 tok2 tok3 tok4 ");
    assert!(finished_emitting.load(Ordering::SeqCst));
}

#[tokio::test]
async fn multi_leaf_pipeline_returns_one_output_per_leaf() {
    let router = Router::new()
        .route("/a", post(|| async { Json(json!({"seed": 7})) }))
        .route("/b", post(|| async { Json(json!({"b": "left"})) }))
        .route("/c", post(|| async { Json(json!({"c": "right"})) }));
    let base = spawn_fake_services(router).await;

    let mut dag = ServiceDag::new();
    for id in ["a", "b", "c"] {
        dag.add_node(id).unwrap();
    }
    dag.add_edge("a", "b").unwrap();
    dag.add_edge("a", "c").unwrap();

    let mut registry = ServiceRegistry::new();
    for id in ["a", "b", "c"] {
        registry
            .register(id, format!("{}/{}", base, id), ServiceKind::Generic)
            .unwrap();
    }

    let orchestrator = Orchestrator::new(dag, registry);
    let output = orchestrator.schedule(Map::new()).await.unwrap();

    match output {
        ScheduleOutput::PerLeaf(outputs) => {
            assert_eq!(outputs.len(), 2);
            assert_eq!(outputs["b"].as_json().unwrap()["b"], json!("left"));
            assert_eq!(outputs["c"].as_json().unwrap()["c"], json!("right"));
        }
        other => panic!("expected per-leaf outputs, got {:?}", other),
    }
}
