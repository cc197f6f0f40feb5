// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The service registry: maps pipeline stage ids to invocation targets.
//!
//! Each graph node is backed by exactly one registered service descriptor,
//! registered once at startup and immutable during runs. The behavior tag is
//! a closed enum; how a service's response is consumed is decided by its
//! registration, never by inspecting the response.

use std::collections::HashMap;

use serde::Deserialize;

use crate::errors::RegistryError;

/// How a service's response is consumed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceKind {
    /// Bounded JSON object response, buffered and parsed in full.
    #[default]
    Generic,
    /// Chunked byte stream, handed to the caller unbuffered so incremental
    /// (e.g. token-by-token) output arrives as it is produced.
    Streaming,
}

/// Invocation target for one pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDescriptor {
    /// Full URL the stage's input is POSTed to.
    pub endpoint: String,
    /// Behavior tag selecting the invoker.
    pub kind: ServiceKind,
}

/// Newtype wrapper for the service registry providing type safety.
#[derive(Debug, Clone, Default)]
pub struct ServiceRegistry(pub HashMap<String, ServiceDescriptor>);

impl ServiceRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    /// Register a service endpoint for a stage id.
    ///
    /// Fails with `DuplicateService` if the name is already registered.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        endpoint: impl Into<String>,
        kind: ServiceKind,
    ) -> Result<(), RegistryError> {
        let name = name.into();
        if self.0.contains_key(&name) {
            return Err(RegistryError::DuplicateService(name));
        }
        self.0.insert(
            name,
            ServiceDescriptor {
                endpoint: endpoint.into(),
                kind,
            },
        );
        Ok(())
    }

    /// Look up the descriptor for a stage id.
    pub fn get(&self, name: &str) -> Option<&ServiceDescriptor> {
        self.0.get(name)
    }

    /// Check if a stage id is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Number of registered services.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterator over registered stage ids.
    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }
}
