// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Error types for pipeline configuration loading and validation.

use thiserror::Error;

use crate::errors::RegistryError;

/// Errors raised while loading a pipeline configuration file and assembling
/// the runtime from it.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file is not valid YAML for the expected schema.
    #[error("failed to parse config file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The flow rules do not describe a valid DAG. This is a one-time startup
    /// check meant to fail the process fast rather than run with a broken
    /// topology.
    #[error("flow rules do not form a valid pipeline DAG")]
    InvalidFlow,

    /// A stage named in the flow rules has no matching service entry.
    #[error("flow stage '{0}' has no service definition")]
    UnknownFlowService(String),

    /// Service registration failed (duplicate names).
    #[error(transparent)]
    Registry(#[from] RegistryError),
}
