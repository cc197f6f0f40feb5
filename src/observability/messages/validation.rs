// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for startup configuration diagnostics.

use std::fmt::{Display, Formatter};

use tracing::Span;

use crate::observability::messages::StructuredLog;

/// The flow rule set failed to build a valid DAG.
///
/// # Log Level
/// `error!` - Startup must not proceed with a broken topology
///
/// # Example
/// ```
/// use the_hoagie::observability::messages::validation::FlowRulesRejected;
///
/// let msg = FlowRulesRejected { rule_count: 3 };
///
/// tracing::error!("{}", msg);
/// ```
pub struct FlowRulesRejected {
    pub rule_count: usize,
}

impl Display for FlowRulesRejected {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Flow rule set rejected: {} rules did not form a valid pipeline DAG",
            self.rule_count
        )
    }
}

impl StructuredLog for FlowRulesRejected {
    fn log(&self) {
        tracing::error!(rule_count = self.rule_count, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "flow_rules_rejected",
            span_name = name,
            rule_count = self.rule_count,
        )
    }
}

/// A stage named in the flow rules has no service definition.
///
/// # Log Level
/// `error!` - Startup must not proceed with an unresolvable stage
pub struct UnknownFlowStage<'a> {
    pub stage: &'a str,
}

impl Display for UnknownFlowStage<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Flow stage '{}' has no matching service definition",
            self.stage
        )
    }
}

impl StructuredLog for UnknownFlowStage<'_> {
    fn log(&self) {
        tracing::error!(stage = self.stage, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!("unknown_flow_stage", span_name = name, stage = self.stage)
    }
}

/// A service is defined but never referenced by the flow rules.
///
/// # Log Level
/// `warn!` - Probably a stale config entry, not fatal
pub struct UnusedService<'a> {
    pub service: &'a str,
}

impl Display for UnusedService<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Service '{}' is defined but not referenced by any flow rule",
            self.service
        )
    }
}

impl StructuredLog for UnusedService<'_> {
    fn log(&self) {
        tracing::warn!(service = self.service, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("unused_service", span_name = name, service = self.service)
    }
}
