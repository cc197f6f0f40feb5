// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for pipeline run lifecycle and per-stage dispatch events.

use std::fmt::{Display, Formatter};
use std::time::Duration;

use tracing::Span;

use crate::observability::messages::StructuredLog;

/// A pipeline run started.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use the_hoagie::observability::messages::schedule::ScheduleStarted;
///
/// let msg = ScheduleStarted {
///     node_count: 4,
///     source_count: 2,
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct ScheduleStarted {
    pub node_count: usize,
    pub source_count: usize,
}

impl Display for ScheduleStarted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Starting pipeline run: {} stages, {} sources",
            self.node_count, self.source_count
        )
    }
}

impl StructuredLog for ScheduleStarted {
    fn log(&self) {
        tracing::info!(
            node_count = self.node_count,
            source_count = self.source_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "schedule",
            span_name = name,
            node_count = self.node_count,
            source_count = self.source_count,
        )
    }
}

/// A stage's input is about to be POSTed to its endpoint.
///
/// # Log Level
/// `debug!` - Per-stage detail
pub struct StageDispatched<'a> {
    pub service: &'a str,
    pub endpoint: &'a str,
    pub streaming: bool,
}

impl Display for StageDispatched<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Dispatching stage '{}' to {} (streaming={})",
            self.service, self.endpoint, self.streaming
        )
    }
}

impl StructuredLog for StageDispatched<'_> {
    fn log(&self) {
        tracing::debug!(
            service = self.service,
            endpoint = self.endpoint,
            streaming = self.streaming,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "stage_dispatch",
            span_name = name,
            service = self.service,
            endpoint = self.endpoint,
            streaming = self.streaming,
        )
    }
}

/// A stage's response was captured into the run's result store.
///
/// # Log Level
/// `debug!` - Per-stage detail
pub struct StageCompleted<'a> {
    pub service: &'a str,
    pub streaming: bool,
}

impl Display for StageCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        if self.streaming {
            write!(f, "Stage '{}' stream established", self.service)
        } else {
            write!(f, "Stage '{}' completed", self.service)
        }
    }
}

impl StructuredLog for StageCompleted<'_> {
    fn log(&self) {
        tracing::debug!(
            service = self.service,
            streaming = self.streaming,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "stage_completed",
            span_name = name,
            service = self.service,
            streaming = self.streaming,
        )
    }
}

/// A pipeline run traversed every stage.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use std::time::Duration;
/// use the_hoagie::observability::messages::schedule::ScheduleCompleted;
///
/// let msg = ScheduleCompleted {
///     node_count: 4,
///     duration: Duration::from_millis(250),
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct ScheduleCompleted {
    pub node_count: usize,
    pub duration: Duration,
}

impl Display for ScheduleCompleted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Pipeline run completed: {} stages in {:?}",
            self.node_count, self.duration
        )
    }
}

impl StructuredLog for ScheduleCompleted {
    fn log(&self) {
        tracing::info!(
            node_count = self.node_count,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "schedule_completed",
            span_name = name,
            node_count = self.node_count,
            duration = ?self.duration,
        )
    }
}

/// A pipeline run aborted at a stage.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct ScheduleFailed<'a> {
    pub service: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for ScheduleFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Pipeline run aborted at stage '{}': {}",
            self.service, self.error
        )
    }
}

impl StructuredLog for ScheduleFailed<'_> {
    fn log(&self) {
        tracing::error!(
            service = self.service,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "schedule_failed",
            span_name = name,
            service = self.service,
            error = %self.error,
        )
    }
}

/// Two predecessors of a fan-in stage emitted the same key.
///
/// Upstream stages are expected to emit disjoint keys by convention; on
/// collision the later writer wins and this warning records the overwrite.
///
/// # Log Level
/// `warn!` - Possible configuration problem
///
/// # Example
/// ```
/// use the_hoagie::observability::messages::schedule::MergeKeyCollision;
///
/// let msg = MergeKeyCollision {
///     key: "text",
///     service: "rerank",
///     dependent: "llm",
/// };
///
/// tracing::warn!("{}", msg);
/// ```
pub struct MergeKeyCollision<'a> {
    pub key: &'a str,
    pub service: &'a str,
    pub dependent: &'a str,
}

impl Display for MergeKeyCollision<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Merging inputs of '{}': key '{}' from '{}' overwrites an earlier value",
            self.dependent, self.key, self.service
        )
    }
}

impl StructuredLog for MergeKeyCollision<'_> {
    fn log(&self) {
        tracing::warn!(
            key = self.key,
            service = self.service,
            dependent = self.dependent,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "merge_key_collision",
            span_name = name,
            key = self.key,
            service = self.service,
            dependent = self.dependent,
        )
    }
}
