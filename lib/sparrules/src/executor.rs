//! Execution of a single rule.

use crate::error::QueryError;
use crate::graph::{QueryableGraph, Solutions};
use crate::rule::RuleDefinition;
use std::time::Instant;
use tracing::debug;

/// Runs rules against a loaded graph.
///
/// The graph is only read: rules are evaluated as queries, one after the other, without retry.
pub struct RuleExecutor<'a, G: QueryableGraph + ?Sized> {
    graph: &'a G,
}

impl<'a, G: QueryableGraph + ?Sized> RuleExecutor<'a, G> {
    pub fn new(graph: &'a G) -> Self {
        Self { graph }
    }

    /// Evaluates the rule body. An empty result means the rule passed.
    pub fn execute(&self, rule: &RuleDefinition) -> Result<Solutions, QueryError> {
        let start = Instant::now();
        let result = self.graph.evaluate(rule.body());
        debug!(
            rule = rule.name(),
            elapsed = ?start.elapsed(),
            ok = result.is_ok(),
            "Rule evaluated"
        );
        result
    }
}
