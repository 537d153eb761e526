//! Detection coordinator: decides when evaluations run and what gets
//! published.
//!
//! The coordinator is a two-state machine (`Idle` / `Evaluating`) fed by
//! change notifications. Notifications are coalesced: if more arrive while
//! an evaluation is in flight, exactly one further evaluation is run
//! afterwards against the then-latest snapshot; intermediate snapshots are
//! skipped, never queued. An in-flight evaluation is never cancelled; its
//! result is simply superseded (discarded) when a newer one completes in
//! the same drain.
//!
//! Published evaluations carry the ledger revision they were computed from
//! and are monotonic in it: a consumer never observes a result for an older
//! snapshot after one for a newer snapshot.

use super::{Evaluation, evaluate};
use crate::error::Result;
use crate::ledger::{Ledger, LockRecord, Resource};
use std::cell::Cell;

/// Coordinator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvalState {
    /// No evaluation in flight.
    Idle,
    /// An evaluation is running.
    Evaluating,
}

/// A consistent point-in-time view of the ledger handed to one evaluation.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// The ledger revision this snapshot was taken at.
    pub revision: u64,

    /// All lock records (the builder ignores released ones).
    pub locks: Vec<LockRecord>,

    /// All resources.
    pub resources: Vec<Resource>,
}

impl From<&Ledger> for Snapshot {
    fn from(ledger: &Ledger) -> Self {
        Self {
            revision: ledger.revision(),
            locks: ledger.locks().to_vec(),
            resources: ledger.resources().to_vec(),
        }
    }
}

/// An evaluation the coordinator published to its consumer.
#[derive(Debug, Clone)]
pub struct PublishedEvaluation {
    /// Revision of the snapshot the result was computed from.
    pub revision: u64,

    /// The detection outcome.
    pub evaluation: Evaluation,
}

/// Orchestrates evaluations over ledger change notifications.
///
/// Interior mutability (cells) lets the snapshot callback itself deliver
/// further notifications mid-evaluation, which is exactly the overlap the
/// coalescing policy exists for.
#[derive(Debug)]
pub struct Coordinator {
    state: Cell<EvalState>,
    pending: Cell<bool>,
    published_revision: Cell<Option<u64>>,
}

impl Coordinator {
    /// Create an idle coordinator with no pending notifications.
    pub fn new() -> Self {
        Self {
            state: Cell::new(EvalState::Idle),
            pending: Cell::new(false),
            published_revision: Cell::new(None),
        }
    }

    /// Current state.
    pub fn state(&self) -> EvalState {
        self.state.get()
    }

    /// Revision of the most recently published evaluation, if any.
    pub fn published_revision(&self) -> Option<u64> {
        self.published_revision.get()
    }

    /// Record that the ledger may have changed.
    ///
    /// Safe to call at any time, including while an evaluation is running;
    /// overlapping notifications collapse into a single follow-up run.
    pub fn notify_changed(&self) {
        self.pending.set(true);
    }

    /// Whether a notification is waiting to be evaluated.
    pub fn has_pending(&self) -> bool {
        self.pending.get()
    }

    /// Drain pending notifications, publishing at most one evaluation.
    ///
    /// Runs one evaluation per outstanding notification burst, each against
    /// a fresh snapshot from `take_snapshot`, and returns only the result
    /// for the latest snapshot (earlier in-drain results are superseded and
    /// discarded). Returns `Ok(None)` when nothing was pending or when every
    /// snapshot taken was older than one already published.
    pub fn run_pending<S>(&self, mut take_snapshot: S) -> Result<Option<PublishedEvaluation>>
    where
        S: FnMut() -> Result<Snapshot>,
    {
        let mut latest: Option<PublishedEvaluation> = None;

        while self.pending.replace(false) {
            self.state.set(EvalState::Evaluating);

            let snapshot = match take_snapshot() {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    // Leave the notification consumed; the caller decides
                    // whether to retry by notifying again.
                    self.state.set(EvalState::Idle);
                    return Err(e);
                }
            };

            let evaluation = evaluate(&snapshot.locks, &snapshot.resources);
            self.state.set(EvalState::Idle);

            // Never publish a result for a snapshot older than one already
            // published; ledger revisions only move forward.
            if self
                .published_revision
                .get()
                .is_some_and(|published| snapshot.revision < published)
            {
                continue;
            }

            latest = Some(PublishedEvaluation {
                revision: snapshot.revision,
                evaluation,
            });
        }

        if let Some(published) = &latest {
            self.published_revision.set(Some(published.revision));
        }

        Ok(latest)
    }
}

impl Default for Coordinator {
    fn default() -> Self {
        Self::new()
    }
}
