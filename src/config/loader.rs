// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Pipeline configuration: a YAML file declaring the service definitions and
//! the flow rules that wire them into a DAG.
//!
//! ```yaml
//! services:
//!   - name: embed
//!     endpoint: http://embed:6000/v1/embeddings
//!   - name: llm
//!     endpoint: http://llm:9000/v1/chat/completions
//!     kind: streaming
//!
//! flow:
//!   - embed >> llm
//! ```
//!
//! Loading is strict: a flow that does not form a valid DAG, a flow stage
//! with no service definition, or a duplicate service name all fail startup.
//! A service defined but never referenced only warns.

use std::path::Path;

use serde::Deserialize;

use crate::engine::Orchestrator;
use crate::errors::ConfigError;
use crate::graph::from_rule_set;
use crate::observability::messages::validation::{
    FlowRulesRejected, UnknownFlowStage, UnusedService,
};
use crate::observability::messages::StructuredLog;
use crate::registry::{ServiceKind, ServiceRegistry};

/// One service definition from the `services` list.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Stage id referenced by the flow rules.
    pub name: String,
    /// Full URL the stage's input is POSTed to.
    pub endpoint: String,
    /// Behavior tag; defaults to `generic` when omitted.
    #[serde(default)]
    pub kind: ServiceKind,
}

/// The whole pipeline configuration file.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Service definitions backing the flow's stage ids.
    pub services: Vec<ServiceConfig>,
    /// Flow rules in `a >> b` / `(a, b) >> c` form.
    pub flow: Vec<String>,
}

/// Read and parse a pipeline configuration file.
pub fn load_config(path: impl AsRef<Path>) -> Result<PipelineConfig, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    let config: PipelineConfig = serde_yaml::from_str(&contents)?;
    Ok(config)
}

/// Assemble a ready-to-run [`Orchestrator`] from a parsed configuration.
///
/// Builds the DAG from the flow rules, registers every service definition,
/// and cross-checks the two: every flow stage must be defined, while unused
/// definitions are logged and dropped from the registry's concerns.
pub fn build_orchestrator(config: &PipelineConfig) -> Result<Orchestrator, ConfigError> {
    let outcome = from_rule_set(&config.flow);
    if !outcome.valid {
        FlowRulesRejected {
            rule_count: config.flow.len(),
        }
        .log();
        return Err(ConfigError::InvalidFlow);
    }
    let graph = outcome.graph;

    let mut registry = ServiceRegistry::new();
    for service in &config.services {
        registry.register(&service.name, &service.endpoint, service.kind)?;
    }

    for stage in graph.nodes() {
        if !registry.contains(stage) {
            UnknownFlowStage { stage }.log();
            return Err(ConfigError::UnknownFlowService(stage.clone()));
        }
    }
    for service in registry.names() {
        if !graph.contains_node(service) {
            UnusedService { service }.log();
        }
    }

    Ok(Orchestrator::new(graph, registry))
}

/// Convenience: load a configuration file and assemble the orchestrator.
pub fn load_orchestrator(path: impl AsRef<Path>) -> Result<Orchestrator, ConfigError> {
    let config = load_config(path)?;
    build_orchestrator(&config)
}
