//! Deadlock detection for interlock.
//!
//! This module is the detection kernel: it turns a ledger snapshot into a
//! wait-for graph, enumerates circular waits, scores candidate locks to
//! preempt, and coordinates when evaluations run.
//!
//! The kernel is stateless between evaluations. Each evaluation is a pure
//! function of its snapshot (rebuilding from the same snapshot always
//! produces the same graph, the same cycle set, and the same verdict) and
//! owns its graph exclusively; nothing is shared with a concurrent or later
//! evaluation. Detection never mutates the ledger and never fails on
//! well-typed input: malformed records are skipped with a warning and every
//! defensive path degrades to "no cycle" rather than an error.

mod advisor;
mod coordinator;
mod cycles;
mod graph;


// Re-export public API
pub use advisor::{Recommendation, UserActivity, disruption_score, recommend, recommend_for_cycle};
pub(crate) use advisor::cycle_user_ids;
pub use coordinator::{Coordinator, EvalState, PublishedEvaluation, Snapshot};
pub use cycles::find_cycles;
pub use graph::{NodeId, WaitForGraph};

use crate::ledger::{LockRecord, Resource};
use serde::Serialize;

/// A circular wait: a closed walk of node IDs, alternating user and
/// resource nodes, with the start node repeated at the end.
pub type Cycle = Vec<NodeId>;

/// The outcome of one detection evaluation.
///
/// Derived, never persisted; recomputed from scratch on every evaluation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionResult {
    /// Whether at least one circular wait exists.
    pub has_deadlock: bool,

    /// All circular waits found, in traversal order.
    pub cycles: Vec<Cycle>,

    /// Human-readable verdict summary.
    pub message: String,
}

impl DetectionResult {
    /// Build a result from a cycle set and the size of the analyzed input.
    fn from_cycles(active_lock_count: usize, cycles: Vec<Cycle>) -> Self {
        if active_lock_count == 0 {
            return Self {
                has_deadlock: false,
                cycles: Vec::new(),
                message: "No locks to analyze".to_string(),
            };
        }

        if cycles.is_empty() {
            return Self {
                has_deadlock: false,
                cycles,
                message: "No deadlock detected. System is in a safe state.".to_string(),
            };
        }

        Self {
            has_deadlock: true,
            message: format!(
                "Deadlock detected! Found {} circular wait condition(s).",
                cycles.len()
            ),
            cycles,
        }
    }
}

/// One completed evaluation: the verdict plus any skipped-record warnings.
///
/// `DetectionResult` is the external contract; warnings ride alongside so
/// callers can surface them without widening the result shape.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub result: DetectionResult,
    pub warnings: Vec<String>,
}

/// Evaluate a ledger snapshot for deadlocks.
///
/// Builds the wait-for graph from the unreleased records, enumerates all
/// circular waits, and returns the verdict. Pure function of its input.
pub fn evaluate(locks: &[LockRecord], resources: &[Resource]) -> Evaluation {
    let graph = WaitForGraph::build(locks, resources);
    let cycles = find_cycles(&graph);

    let active_lock_count = locks.iter().filter(|l| !l.is_released()).count();

    Evaluation {
        result: DetectionResult::from_cycles(active_lock_count, cycles),
        warnings: graph.warnings().to_vec(),
    }
}
