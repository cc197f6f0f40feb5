// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Error types for pipeline scheduling and remote service calls.
//!
//! Any of these aborts the in-flight `schedule()` run immediately. No partial
//! or default results are synthesized for unexecuted downstream stages, and
//! there is no automatic retry; the caller decides how to surface the failure
//! (typically as an HTTP 5xx).

use thiserror::Error;

use crate::errors::GraphError;

/// Errors raised while driving a request through the pipeline.
#[derive(Error, Debug)]
pub enum ExecutionError {
    /// A node in the graph has no registered endpoint. Detected before any
    /// HTTP call is dispatched for the run.
    #[error("service '{0}' appears in the graph but is not registered")]
    UnregisteredService(String),

    /// The HTTP request could not be sent or the connection failed.
    #[error("failed to reach service '{service}' at {endpoint}: {source}")]
    Connect {
        service: String,
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// The service answered with a non-2xx status.
    #[error("service '{service}' returned HTTP {status}")]
    Status {
        service: String,
        status: reqwest::StatusCode,
    },

    /// The service body was not the JSON object the invocation contract
    /// requires.
    #[error("service '{service}' returned a malformed response: {reason}")]
    MalformedResponse { service: String, reason: String },

    /// Reading from an established response stream failed.
    #[error("stream from service '{service}' failed: {reason}")]
    Stream { service: String, reason: String },

    /// A streaming stage feeds a downstream stage. Streams exist to be handed
    /// to the caller unbuffered, so they cannot participate in fan-in merges;
    /// streaming stages must be pipeline leaves.
    #[error("streaming output of '{service}' cannot be merged into input of '{dependent}'")]
    StreamNotMergeable { service: String, dependent: String },

    /// The graph could not produce a topological order.
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// Invariant violation inside the engine itself.
    #[error("internal scheduling error: {message}")]
    Internal { message: String },
}
