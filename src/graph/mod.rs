// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod dag;
mod rules;

pub use dag::ServiceDag;
pub use rules::{from_rule_set, RuleSetOutcome};
