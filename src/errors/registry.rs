// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Error types for service registration.

use thiserror::Error;

/// Errors raised while registering service endpoints.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// A service with this name was already registered. The registry is
    /// populated once at startup and is immutable during runs, so a second
    /// registration is always a configuration bug.
    #[error("duplicate service: '{0}' is already registered")]
    DuplicateService(String),
}
