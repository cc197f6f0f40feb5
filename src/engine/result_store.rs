// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Per-run capture of stage responses.
//!
//! The result store is created fresh for every `schedule()` call and dropped
//! once the leaf results are returned. It is never shared across concurrent
//! runs; each run owns its own store.

use std::collections::HashMap;
use std::pin::Pin;

use bytes::Bytes;
use futures_util::Stream;
use serde_json::{Map, Value};

use crate::errors::ExecutionError;

/// A live, lazily-consumable byte stream from a streaming stage.
///
/// Handed to the caller unbuffered; consuming it pulls chunks off the wire as
/// the upstream service produces them.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, ExecutionError>> + Send>>;

/// Captured response of one pipeline stage.
pub enum NodeOutput {
    /// Parsed JSON object from a generic stage.
    Json(Map<String, Value>),
    /// Open stream handle from a streaming stage. Deliberately not buffered:
    /// streaming exists to deliver incremental output as it arrives.
    Stream(ByteStream),
}

impl NodeOutput {
    /// Whether this output is a live stream.
    pub fn is_stream(&self) -> bool {
        matches!(self, NodeOutput::Stream(_))
    }

    /// The JSON object, if this output is buffered.
    pub fn as_json(&self) -> Option<&Map<String, Value>> {
        match self {
            NodeOutput::Json(fields) => Some(fields),
            NodeOutput::Stream(_) => None,
        }
    }

    /// Consume the output, yielding the stream handle if there is one.
    pub fn into_stream(self) -> Option<ByteStream> {
        match self {
            NodeOutput::Json(_) => None,
            NodeOutput::Stream(stream) => Some(stream),
        }
    }
}

impl std::fmt::Debug for NodeOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeOutput::Json(fields) => f.debug_tuple("Json").field(fields).finish(),
            NodeOutput::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

/// Newtype wrapper for the per-run result store providing type safety.
#[derive(Default)]
pub struct ResultStore(pub HashMap<String, NodeOutput>);

impl ResultStore {
    /// Create a new empty result store.
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    /// Capture a stage's output.
    pub fn insert(&mut self, service: String, output: NodeOutput) {
        self.0.insert(service, output);
    }

    /// Borrow a captured output.
    pub fn get(&self, service: &str) -> Option<&NodeOutput> {
        self.0.get(service)
    }

    /// Remove and return a captured output.
    pub fn take(&mut self, service: &str) -> Option<NodeOutput> {
        self.0.remove(service)
    }

    /// Number of captured outputs.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the store has no captured outputs.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for ResultStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultStore")
            .field("captured_count", &self.0.len())
            .field("captured_ids", &self.0.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(fields) => fields,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn insert_get_take_roundtrip() {
        let mut store = ResultStore::new();
        store.insert(
            "embed".to_string(),
            NodeOutput::Json(object(json!({"vector": [1, 2]}))),
        );

        assert_eq!(store.len(), 1);
        assert!(store.get("embed").is_some());
        assert!(store.get("llm").is_none());

        let output = store.take("embed").unwrap();
        assert!(!output.is_stream());
        assert_eq!(output.as_json().unwrap()["vector"], json!([1, 2]));
        assert!(store.is_empty());
    }

    #[test]
    fn stream_output_classifies_as_stream() {
        let stream: ByteStream = Box::pin(futures_util::stream::empty());
        let output = NodeOutput::Stream(stream);
        assert!(output.is_stream());
        assert!(output.as_json().is_none());
        assert!(output.into_stream().is_some());
    }
}
