// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The megaservice orchestrator: drives one request through the service
//! graph end-to-end.
//!
//! # Execution model
//!
//! `schedule()` walks the graph's topological order strictly sequentially.
//! Source stages receive the original payload; every other stage receives the
//! union-merge of its direct predecessors' captured outputs. Each generic
//! call blocks until the full response returns; a streaming call blocks only
//! until the stream is established, after which the open handle is stored for
//! lazy consumption by the caller. Independent sibling branches are **not**
//! parallelized even though nothing prevents it structurally; sequential
//! semantics are the contract here, and concurrent branch execution would be
//! an explicit, documented enhancement.
//!
//! The graph and registry are built once at startup and treated as immutable
//! while runs are in flight. All per-run state lives in a [`ResultStore`]
//! local to the `schedule()` call, so concurrent runs on one orchestrator do
//! not observe each other.
//!
//! # Failure handling
//!
//! Any failed call (connection error, non-2xx status, malformed JSON) aborts
//! the remainder of the run immediately. No default or partial results are
//! synthesized for unexecuted downstream stages, and nothing is retried.

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use serde_json::{Map, Value};

use crate::engine::invoker::invoker_for;
use crate::engine::result_store::{NodeOutput, ResultStore};
use crate::errors::ExecutionError;
use crate::graph::ServiceDag;
use crate::observability::messages::schedule::{
    MergeKeyCollision, ScheduleCompleted, ScheduleFailed, ScheduleStarted, StageCompleted,
    StageDispatched,
};
use crate::observability::messages::StructuredLog;
use crate::registry::{ServiceKind, ServiceRegistry};

/// Leaf result(s) of one pipeline run.
///
/// A single-leaf pipeline returns that stage's output directly; a multi-leaf
/// pipeline returns one output per leaf, keyed by stage id. Streams inside
/// are live: bytes can be forwarded to the caller as they arrive.
#[derive(Debug)]
pub enum ScheduleOutput {
    /// Output of the pipeline's only leaf.
    Single(NodeOutput),
    /// Outputs of all leaves, keyed by stage id.
    PerLeaf(HashMap<String, NodeOutput>),
}

/// The orchestration engine: a service graph, the registry backing its
/// nodes, and the HTTP client used to dispatch stage calls.
///
/// Built once at startup and reused across many runs. Impose per-call
/// timeouts by constructing with [`Orchestrator::with_client`] and a
/// `reqwest::Client` configured accordingly; this layer defines no timeout or
/// cancellation primitive of its own.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    dag: ServiceDag,
    registry: ServiceRegistry,
    client: reqwest::Client,
}

impl Orchestrator {
    /// Create an orchestrator with a default HTTP client.
    pub fn new(dag: ServiceDag, registry: ServiceRegistry) -> Self {
        Self::with_client(dag, registry, reqwest::Client::new())
    }

    /// Create an orchestrator with a caller-configured HTTP client.
    pub fn with_client(dag: ServiceDag, registry: ServiceRegistry, client: reqwest::Client) -> Self {
        Self {
            dag,
            registry,
            client,
        }
    }

    /// The service graph this orchestrator schedules over.
    pub fn dag(&self) -> &ServiceDag {
        &self.dag
    }

    /// The registry backing the graph's nodes.
    pub fn registry(&self) -> &ServiceRegistry {
        &self.registry
    }

    /// Run one request through the pipeline.
    ///
    /// Walks the topological order, feeding source stages `initial_payload`
    /// and downstream stages the merged results of their predecessors, and
    /// returns the leaf result(s).
    pub async fn schedule(
        &self,
        initial_payload: Map<String, Value>,
    ) -> Result<ScheduleOutput, ExecutionError> {
        let order = self.dag.topological_sort()?;

        // Every scheduled node must be backed by a registration before the
        // first call goes out.
        if let Some(unregistered) = order.iter().find(|node| !self.registry.contains(node)) {
            let error = ExecutionError::UnregisteredService(unregistered.clone());
            ScheduleFailed {
                service: unregistered,
                error: &error,
            }
            .log();
            return Err(error);
        }

        let sources: HashSet<String> = self.dag.ind_nodes().into_iter().collect();
        ScheduleStarted {
            node_count: order.len(),
            source_count: sources.len(),
        }
        .log();
        let started = Instant::now();

        let mut store = ResultStore::new();
        for node in &order {
            let input = if sources.contains(node) {
                Value::Object(initial_payload.clone())
            } else {
                match self.merge_inputs(node, &store) {
                    Ok(merged) => Value::Object(merged),
                    Err(error) => {
                        ScheduleFailed {
                            service: node,
                            error: &error,
                        }
                        .log();
                        return Err(error);
                    }
                }
            };

            let descriptor = self
                .registry
                .get(node)
                .ok_or_else(|| ExecutionError::UnregisteredService(node.clone()))?;
            let streaming = descriptor.kind == ServiceKind::Streaming;
            StageDispatched {
                service: node,
                endpoint: &descriptor.endpoint,
                streaming,
            }
            .log();

            let output = match invoker_for(descriptor.kind)
                .invoke(&self.client, node, &descriptor.endpoint, &input)
                .await
            {
                Ok(output) => output,
                Err(error) => {
                    ScheduleFailed {
                        service: node,
                        error: &error,
                    }
                    .log();
                    return Err(error);
                }
            };

            StageCompleted {
                service: node,
                streaming,
            }
            .log();
            store.insert(node.clone(), output);
        }

        ScheduleCompleted {
            node_count: order.len(),
            duration: started.elapsed(),
        }
        .log();

        self.collect_leaves(&mut store)
    }

    /// Union-merge the captured outputs of a stage's direct predecessors.
    ///
    /// Last writer wins on key collision; upstream stages are expected to
    /// emit disjoint keys by convention, so a collision is logged as a
    /// warning rather than silently absorbed.
    fn merge_inputs(
        &self,
        node: &str,
        store: &ResultStore,
    ) -> Result<Map<String, Value>, ExecutionError> {
        let mut merged = Map::new();
        for predecessor in self.dag.predecessors(node)? {
            match store.get(&predecessor) {
                Some(NodeOutput::Json(fields)) => {
                    for (key, value) in fields {
                        if merged.contains_key(key) {
                            MergeKeyCollision {
                                key,
                                service: &predecessor,
                                dependent: node,
                            }
                            .log();
                        }
                        merged.insert(key.clone(), value.clone());
                    }
                }
                Some(NodeOutput::Stream(_)) => {
                    return Err(ExecutionError::StreamNotMergeable {
                        service: predecessor,
                        dependent: node.to_string(),
                    });
                }
                None => {
                    return Err(ExecutionError::Internal {
                        message: format!(
                            "predecessor '{}' of '{}' has no captured result",
                            predecessor, node
                        ),
                    });
                }
            }
        }
        Ok(merged)
    }

    /// Pull the leaf output(s) out of the run's result store.
    fn collect_leaves(&self, store: &mut ResultStore) -> Result<ScheduleOutput, ExecutionError> {
        let mut leaves = self.dag.all_leaves();
        if leaves.len() == 1 {
            let leaf = leaves.remove(0);
            let output = store.take(&leaf).ok_or_else(|| ExecutionError::Internal {
                message: format!("leaf '{}' missing from result store", leaf),
            })?;
            return Ok(ScheduleOutput::Single(output));
        }

        let mut outputs = HashMap::with_capacity(leaves.len());
        for leaf in leaves {
            let output = store.take(&leaf).ok_or_else(|| ExecutionError::Internal {
                message: format!("leaf '{}' missing from result store", leaf),
            })?;
            outputs.insert(leaf, output);
        }
        Ok(ScheduleOutput::PerLeaf(outputs))
    }
}
