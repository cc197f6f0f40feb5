// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The flow-rule DSL: build a [`ServiceDag`] from compact stage notation.
//!
//! A rule is a `>>`-separated sequence of *stage groups*. A group is either a
//! bare identifier (`s3`) or a parenthesized comma list (`(s1, s2)`) denoting
//! unordered siblings. Consecutive groups imply the full bipartite edge set:
//! every stage in group *i* feeds every stage in group *i+1*. Multiple rules
//! are unioned into one graph, and stages are registered idempotently as they
//! are first seen. The notation is whitespace-insensitive.
//!
//! ```text
//! "(s1, s2) >> s3"    =>  edges {s1->s3, s2->s3}
//! "s3 >> (s4, s5)"    =>  edges {s3->s4, s3->s5}
//! ```
//!
//! Construction is all-or-nothing: if any rule is malformed or any edge would
//! violate the DAG invariants, the whole rule set is reported invalid and the
//! returned graph is empty. The flag (rather than an error type) exists so a
//! startup path can fail the process fast instead of running with a broken
//! topology.

use crate::graph::ServiceDag;

/// Result of building a graph from a rule set.
#[derive(Debug)]
pub struct RuleSetOutcome {
    /// The constructed graph. Empty when `valid` is false.
    pub graph: ServiceDag,
    /// Whether every rule parsed and every edge committed.
    pub valid: bool,
}

impl RuleSetOutcome {
    fn invalid() -> Self {
        Self {
            graph: ServiceDag::new(),
            valid: false,
        }
    }
}

/// Build a graph from flow rules, unioning all rules into one DAG.
///
/// # Examples
///
/// ```
/// use the_hoagie::graph::from_rule_set;
///
/// let outcome = from_rule_set(&["(s1, s2) >> s3", "s3 >> (s4, s5)"]);
/// assert!(outcome.valid);
/// assert_eq!(outcome.graph.ind_nodes(), vec!["s1", "s2"]);
/// assert_eq!(outcome.graph.all_leaves(), vec!["s4", "s5"]);
/// ```
pub fn from_rule_set<S: AsRef<str>>(rules: &[S]) -> RuleSetOutcome {
    let mut graph = ServiceDag::new();

    for rule in rules {
        let groups = match parse_rule(rule.as_ref()) {
            Some(groups) => groups,
            None => return RuleSetOutcome::invalid(),
        };

        for group in &groups {
            for stage in group {
                graph.add_node_if_absent(stage.clone());
            }
        }

        // Full bipartite edge set between each adjacent pair of groups.
        for window in groups.windows(2) {
            for from in &window[0] {
                for to in &window[1] {
                    if graph.add_edge(from, to).is_err() {
                        return RuleSetOutcome::invalid();
                    }
                }
            }
        }
    }

    RuleSetOutcome { graph, valid: true }
}

/// Split one rule into its stage groups, or `None` if the text is malformed.
///
/// Malformed means: an empty rule, an empty group or stage id, or unbalanced
/// parentheses.
fn parse_rule(rule: &str) -> Option<Vec<Vec<String>>> {
    if rule.trim().is_empty() {
        return None;
    }

    let mut groups = Vec::new();
    for segment in rule.split(">>") {
        groups.push(parse_group(segment)?);
    }
    Some(groups)
}

/// Parse one stage group: a bare identifier or a parenthesized comma list.
fn parse_group(segment: &str) -> Option<Vec<String>> {
    let segment = segment.trim();
    if segment.is_empty() {
        return None;
    }

    let members = if let Some(inner) = segment.strip_prefix('(') {
        let inner = inner.strip_suffix(')')?;
        inner.split(',').map(str::trim).collect::<Vec<_>>()
    } else {
        if segment.contains(['(', ')', ',']) {
            return None;
        }
        vec![segment]
    };

    if members.iter().any(|stage| {
        stage.is_empty() || stage.contains(['(', ')']) || stage.split_whitespace().count() > 1
    }) {
        return None;
    }

    Some(members.into_iter().map(str::to_string).collect())
}
