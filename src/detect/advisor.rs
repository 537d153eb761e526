//! Resolution advisor: scores and ranks candidate locks to preempt.
//!
//! For every user holding a resource inside a detected cycle, the advisor
//! computes a disruption score: an estimate of how costly it would be to
//! force-release that user's lock. Lower is cheaper; candidates are ranked
//! ascending so the first recommendation is the least disruptive way to
//! break the cycle.
//!
//! The advisor only recommends. Applying a recommendation means calling the
//! ledger's force-release path with the `target_lock_id`; that decision and
//! any caller-identity policy live outside this module.

use super::Cycle;
use super::graph::NodeId;
use crate::config::DisruptionWeights;
use crate::ledger::{LockRecord, format_age};
use chrono::Duration;
use serde::Serialize;
use std::collections::HashMap;

/// Activity metadata for one user, assembled from the profile store and the
/// ledger snapshot.
#[derive(Debug, Clone)]
pub struct UserActivity {
    /// Weight of the user's role (higher => more protected).
    pub role_weight: f64,

    /// Time since the user's last observed action.
    pub idle: Duration,

    /// Time since the user's session started.
    pub session: Duration,

    /// Number of locks the user currently holds.
    pub active_locks: u32,
}

impl Default for UserActivity {
    fn default() -> Self {
        Self {
            role_weight: 1.0,
            idle: Duration::zero(),
            session: Duration::zero(),
            active_locks: 0,
        }
    }
}

/// A ranked suggestion for breaking one cycle.
#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    /// Resolution strategy; currently always `force_release`.
    pub strategy: String,

    /// The user whose lock should be preempted.
    pub target_user_id: String,

    /// The lock to release.
    pub target_lock_id: String,

    /// Human-readable reasoning behind the score.
    pub justification: String,

    /// The computed disruption score (lower = cheaper to preempt).
    pub disruption_score: f64,
}

/// Compute the disruption score for one user.
///
/// A weighted sum over the configured features:
/// - role weight, scaled by `weights.role` (protects privileged users)
/// - an inverse idle term `1 / (1 + idle_minutes)`, scaled by
///   `weights.idle`; strictly decreasing in idle time, so with any
///   non-negative coefficient a longer-idle user never scores higher than
///   an otherwise-identical less-idle one
/// - session minutes, scaled by `weights.session` (protects long sessions)
/// - held-lock count, scaled by `weights.held_locks` (protects users mid
///   multi-resource work)
///
/// Negative durations (clock skew between collaborators) clamp to zero.
pub fn disruption_score(activity: &UserActivity, weights: &DisruptionWeights) -> f64 {
    let idle_minutes = (activity.idle.num_seconds().max(0) as f64) / 60.0;
    let session_minutes = (activity.session.num_seconds().max(0) as f64) / 60.0;

    weights.role * activity.role_weight
        + weights.idle * (1.0 / (1.0 + idle_minutes))
        + weights.session * session_minutes
        + weights.held_locks * f64::from(activity.active_locks)
}

/// Rank the preemption candidates for one cycle.
///
/// Candidates are the held locks whose holder and resource both sit inside
/// the cycle (the cycle's allocation edges). Unknown users fall back to
/// default activity rather than being excluded, so a missing profile cannot
/// hide a resolution path. Output is sorted ascending by score; ties break
/// by earliest `acquired_at` (the oldest-held lock loses the least work
/// variance when released), then by lock ID for stability.
///
/// A cycle with no eligible holder yields an empty list; the deadlock
/// itself is still reported by the detector.
pub fn recommend_for_cycle(
    cycle: &Cycle,
    locks: &[LockRecord],
    activity: &HashMap<String, UserActivity>,
    weights: &DisruptionWeights,
) -> Vec<Recommendation> {
    let cycle_users: Vec<&str> = cycle
        .iter()
        .filter(|n| n.is_user())
        .map(|n| n.raw())
        .collect();
    let in_cycle_resource =
        |id: &str| cycle.iter().any(|n| n.is_resource() && n.raw() == id);

    let mut candidates: Vec<(Recommendation, chrono::DateTime<chrono::Utc>)> = Vec::new();

    for lock in locks {
        if !lock.is_held() {
            continue;
        }
        if !cycle_users.contains(&lock.user_id.as_str()) {
            continue;
        }
        if !in_cycle_resource(&lock.resource_id) {
            continue;
        }

        let user_activity = activity.get(&lock.user_id).cloned().unwrap_or_default();
        let score = disruption_score(&user_activity, weights);

        let recommendation = Recommendation {
            strategy: "force_release".to_string(),
            target_user_id: lock.user_id.clone(),
            target_lock_id: lock.id.clone(),
            justification: format!(
                "idle {}, session {}, role weight {:.1}, {} active lock(s)",
                format_age(user_activity.idle),
                format_age(user_activity.session),
                user_activity.role_weight,
                user_activity.active_locks
            ),
            disruption_score: score,
        };

        let acquired_at = lock.acquired_at.expect("held lock has acquired_at");
        candidates.push((recommendation, acquired_at));
    }

    candidates.sort_by(|(a, a_acquired), (b, b_acquired)| {
        a.disruption_score
            .total_cmp(&b.disruption_score)
            .then_with(|| a_acquired.cmp(b_acquired))
            .then_with(|| a.target_lock_id.cmp(&b.target_lock_id))
    });

    candidates.into_iter().map(|(rec, _)| rec).collect()
}

/// Rank preemption candidates for every cycle.
///
/// Returns one ranked list per cycle, in cycle order.
pub fn recommend(
    cycles: &[Cycle],
    locks: &[LockRecord],
    activity: &HashMap<String, UserActivity>,
    weights: &DisruptionWeights,
) -> Vec<Vec<Recommendation>> {
    cycles
        .iter()
        .map(|cycle| recommend_for_cycle(cycle, locks, activity, weights))
        .collect()
}

/// Helper naming user nodes of a cycle, used for report rendering.
pub(crate) fn cycle_user_ids(cycle: &Cycle) -> Vec<&str> {
    let mut users = Vec::new();
    for node in cycle {
        if let NodeId::User(id) = node
            && !users.contains(&id.as_str())
        {
            users.push(id.as_str());
        }
    }
    users
}
