//! Implementation of the `interlock advise` command.
//!
//! Runs detection, then ranks the candidate locks to preempt for every
//! detected cycle. The JSON report is the machine-applicable form: each
//! recommendation names a `target_lock_id` that `interlock lock clear
//! <lock-id> --force` applies verbatim. Which candidate to apply, and
//! whether a caller may release someone else's lock at all, stays a
//! policy of the surrounding team, not of this command.

use crate::cli::AdviseArgs;
use crate::config::Config;
use crate::context::require_initialized_workspace;
use crate::detect::{Cycle, Recommendation, cycle_user_ids, evaluate, recommend};
use crate::error::{InterlockError, Result};
use crate::events::{Event, EventAction, append_event};
use crate::ledger::Ledger;
use crate::profiles::{Profiles, activity_map};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;

/// Per-cycle section of the JSON report.
#[derive(Debug, Serialize)]
struct CycleReport<'a> {
    cycle: &'a Cycle,
    conflicting_users: Vec<&'a str>,
    recommended_actions: &'a [Recommendation],
}

/// The full recommendation report.
#[derive(Debug, Serialize)]
struct AdviseReport<'a> {
    timestamp: DateTime<Utc>,
    message: &'a str,
    cycles: Vec<CycleReport<'a>>,
}

/// Execute the `interlock advise` command.
pub fn cmd_advise(args: AdviseArgs, actor: &str) -> Result<()> {
    let ctx = require_initialized_workspace()?;
    let config = Config::load(ctx.config_path()).unwrap_or_default();

    let ledger = Ledger::load(&ctx)?;
    let profiles = Profiles::load(&ctx)?;

    let evaluation = evaluate(ledger.locks(), ledger.resources());
    for warning in &evaluation.warnings {
        eprintln!("Warning: {}", warning);
    }

    if !evaluation.result.has_deadlock {
        println!("{}", evaluation.result.message);
        println!("Nothing to recommend.");
        return Ok(());
    }

    let activity = activity_map(&profiles, &config, ledger.locks());
    let per_cycle = recommend(
        &evaluation.result.cycles,
        ledger.locks(),
        &activity,
        &config.disruption_weights,
    );

    if args.json {
        let report = AdviseReport {
            timestamp: Utc::now(),
            message: &evaluation.result.message,
            cycles: evaluation
                .result
                .cycles
                .iter()
                .zip(per_cycle.iter())
                .map(|(cycle, recommendations)| CycleReport {
                    cycle,
                    conflicting_users: cycle_user_ids(cycle),
                    recommended_actions: recommendations,
                })
                .collect(),
        };

        let json = serde_json::to_string_pretty(&report).map_err(|e| {
            InterlockError::UserError(format!("failed to serialize advise report: {}", e))
        })?;
        println!("{}", json);
    } else {
        println!("{}", evaluation.result.message);
        println!();

        for (i, (cycle, recommendations)) in evaluation
            .result
            .cycles
            .iter()
            .zip(per_cycle.iter())
            .enumerate()
        {
            println!("Cycle {}: {}", i + 1, super::format_cycle(cycle));

            if recommendations.is_empty() {
                println!("  No eligible lock to preempt in this cycle.");
            } else {
                for (rank, rec) in recommendations.iter().enumerate() {
                    println!(
                        "  {}. release {} (held by {}), score {:.1}",
                        rank + 1,
                        rec.target_lock_id,
                        rec.target_user_id,
                        rec.disruption_score
                    );
                    println!("     {}", rec.justification);
                }
                println!(
                    "  Apply with: interlock lock clear {} --force",
                    recommendations[0].target_lock_id
                );
            }
            println!();
        }
    }

    // The report is also the audit trail of what was recommended and when.
    let top_targets: Vec<&str> = per_cycle
        .iter()
        .filter_map(|recs| recs.first())
        .map(|rec| rec.target_lock_id.as_str())
        .collect();
    let event = Event::new(EventAction::Advise, actor).with_details(json!({
        "cycle_count": evaluation.result.cycles.len(),
        "top_targets": top_targets,
    }));
    if let Err(e) = append_event(&ctx, &event) {
        eprintln!("Warning: failed to log advise event: {}", e);
    }

    Ok(())
}
