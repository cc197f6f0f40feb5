// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Error types for service graph mutations and traversal.

use thiserror::Error;

/// Errors raised by structural graph operations.
///
/// These signal configuration bugs, not runtime conditions: every variant is
/// produced synchronously at the mutating call site, and a failed mutation
/// leaves the graph unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// A node with this id already exists in the graph.
    #[error("duplicate node: '{0}' already exists")]
    DuplicateNode(String),

    /// The referenced node does not exist in the graph.
    #[error("node not found: '{0}'")]
    NodeNotFound(String),

    /// The referenced edge does not exist in the graph.
    #[error("edge not found: '{from}' -> '{to}'")]
    EdgeNotFound { from: String, to: String },

    /// The graph (or a hypothetical mutation of it) is not acyclic.
    #[error("graph is not acyclic")]
    Cycle,

    /// The graph has nodes but none with zero in-degree, so a pipeline run
    /// would have nowhere to start.
    #[error("graph has no independent nodes")]
    NoIndependentNodes,
}
