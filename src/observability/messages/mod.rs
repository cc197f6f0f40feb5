// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! Each message type implements `Display` for human-readable output plus
//! [`StructuredLog`] so call sites emit the same fields everywhere the event
//! occurs.

use tracing::Span;

pub mod schedule;
pub mod validation;

/// Emit a message as a structured `tracing` event, or open a span carrying
/// the same fields.
pub trait StructuredLog {
    /// Log the message at its intrinsic level with structured fields.
    fn log(&self);

    /// Create a span carrying the message's fields.
    fn span(&self, name: &str) -> Span;
}
