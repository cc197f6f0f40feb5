// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod config;     // config loading + validation
pub mod engine;     // orchestrator + stage invokers
pub mod errors;     // error handling
pub mod graph;      // service DAG + flow rule parser
pub mod observability;
pub mod registry;   // stage id -> endpoint mapping
