// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod config;
mod execution;
mod graph;
mod registry;

pub use config::ConfigError;
pub use execution::ExecutionError;
pub use graph::GraphError;
pub use registry::RegistryError;
