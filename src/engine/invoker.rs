// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Invocation of a single pipeline stage over HTTP.
//!
//! The node invocation contract: the stage's merged input is POSTed as a JSON
//! body; the response is either a JSON object (generic) or a chunked byte
//! stream (streaming), selected by the stage's statically registered behavior
//! tag, never by inspecting the response. The two behaviors are the two
//! implementations of [`Invoker`]; there is no string-typed branching.
//!
//! Timeouts are not imposed here. They belong to the `reqwest::Client` the
//! orchestrator is constructed with.

use async_trait::async_trait;
use futures_util::TryStreamExt;
use serde_json::Value;

use crate::engine::result_store::NodeOutput;
use crate::errors::ExecutionError;

/// Dispatch one stage's input to its endpoint and capture the response.
#[async_trait]
pub trait Invoker: Send + Sync {
    /// POST `payload` to `endpoint` and capture the response according to the
    /// stage's behavior.
    ///
    /// `service` is the stage id, used only for error context.
    async fn invoke(
        &self,
        client: &reqwest::Client,
        service: &str,
        endpoint: &str,
        payload: &Value,
    ) -> Result<NodeOutput, ExecutionError>;
}

/// Blocking invoker: waits for the full response and parses it as a JSON
/// object.
pub struct GenericInvoker;

/// Streaming invoker: blocks only until the response headers arrive, then
/// hands back the live body stream for lazy consumption.
pub struct StreamingInvoker;

/// Select the invoker for a behavior tag.
pub fn invoker_for(kind: crate::registry::ServiceKind) -> &'static dyn Invoker {
    match kind {
        crate::registry::ServiceKind::Generic => &GenericInvoker,
        crate::registry::ServiceKind::Streaming => &StreamingInvoker,
    }
}

async fn post(
    client: &reqwest::Client,
    service: &str,
    endpoint: &str,
    payload: &Value,
) -> Result<reqwest::Response, ExecutionError> {
    let response = client
        .post(endpoint)
        .json(payload)
        .send()
        .await
        .map_err(|source| ExecutionError::Connect {
            service: service.to_string(),
            endpoint: endpoint.to_string(),
            source,
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(ExecutionError::Status {
            service: service.to_string(),
            status,
        });
    }
    Ok(response)
}

#[async_trait]
impl Invoker for GenericInvoker {
    async fn invoke(
        &self,
        client: &reqwest::Client,
        service: &str,
        endpoint: &str,
        payload: &Value,
    ) -> Result<NodeOutput, ExecutionError> {
        let response = post(client, service, endpoint, payload).await?;

        let body: Value =
            response
                .json()
                .await
                .map_err(|source| ExecutionError::MalformedResponse {
                    service: service.to_string(),
                    reason: source.to_string(),
                })?;

        match body {
            Value::Object(fields) => Ok(NodeOutput::Json(fields)),
            other => Err(ExecutionError::MalformedResponse {
                service: service.to_string(),
                reason: format!("expected a JSON object, got {}", json_type_name(&other)),
            }),
        }
    }
}

#[async_trait]
impl Invoker for StreamingInvoker {
    async fn invoke(
        &self,
        client: &reqwest::Client,
        service: &str,
        endpoint: &str,
        payload: &Value,
    ) -> Result<NodeOutput, ExecutionError> {
        let response = post(client, service, endpoint, payload).await?;

        let service = service.to_string();
        let stream = response
            .bytes_stream()
            .map_err(move |source| ExecutionError::Stream {
                service: service.clone(),
                reason: source.to_string(),
            });

        Ok(NodeOutput::Stream(Box::pin(stream)))
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ServiceKind;
    use serde_json::json;

    #[tokio::test]
    async fn unreachable_endpoint_is_a_connect_error() {
        let client = reqwest::Client::new();
        // Port 1 is never listening locally.
        let result = invoker_for(ServiceKind::Generic)
            .invoke(&client, "embed", "http://127.0.0.1:1/embed", &json!({}))
            .await;

        match result {
            Err(ExecutionError::Connect { service, .. }) => assert_eq!(service, "embed"),
            other => panic!("expected Connect error, got {:?}", other),
        }
    }
}
