//! Implementation of the `interlock status` command.
//!
//! Displays workspace status: resource and collaborator counts against
//! their configured limits, lock activity, stale holds, and the current
//! detection verdict.

use crate::config::Config;
use crate::context::require_initialized_workspace;
use crate::detect::evaluate;
use crate::error::Result;
use crate::ledger::{Ledger, format_age};
use crate::profiles::Profiles;

/// Execute the `interlock status` command.
pub fn cmd_status() -> Result<()> {
    let ctx = require_initialized_workspace()?;
    let config = Config::load(ctx.config_path()).unwrap_or_default();

    let ledger = Ledger::load(&ctx)?;
    let profiles = Profiles::load(&ctx)?;

    let active = ledger.active_locks();
    let held: Vec<_> = active.iter().filter(|l| l.is_held()).collect();
    let pending: Vec<_> = active.iter().filter(|l| l.is_pending()).collect();

    println!("Workspace Status");
    println!("================");
    println!();
    println!(
        "  Resources:  {:>3} of {}",
        ledger.resources().len(),
        config.max_resources
    );
    println!(
        "  Users:      {:>3} of {}",
        profiles.len(),
        config.max_users
    );
    println!("  Held locks: {:>3}", held.len());
    println!("  Pending:    {:>3}", pending.len());
    println!("  Revision:   {:>3}", ledger.revision());
    println!();

    // Collect issues to highlight
    let mut issues: Vec<String> = Vec::new();

    let stale: Vec<_> = held
        .iter()
        .filter(|l| l.is_stale(config.lock_stale_minutes))
        .collect();
    if !stale.is_empty() {
        issues.push(format!(
            "{} stale lock(s) (older than {} minutes):",
            stale.len(),
            config.lock_stale_minutes
        ));
        for lock in &stale {
            issues.push(format!(
                "  - {} on {} (by {}, held {})",
                lock.id,
                lock.resource_id,
                lock.user_id,
                lock.held_for().map(format_age).unwrap_or_default()
            ));
        }
    }

    let evaluation = evaluate(ledger.locks(), ledger.resources());
    for warning in &evaluation.warnings {
        issues.push(format!("ledger warning: {}", warning));
    }

    if evaluation.result.has_deadlock {
        issues.push(evaluation.result.message.clone());
        for (i, cycle) in evaluation.result.cycles.iter().enumerate() {
            issues.push(format!(
                "  Cycle {}: {}",
                i + 1,
                super::format_cycle(cycle)
            ));
        }
        issues.push("Run `interlock advise` for resolution recommendations.".to_string());
    }

    if issues.is_empty() {
        println!("{}", evaluation.result.message);
    } else {
        println!("Attention:");
        for issue in &issues {
            println!("  {}", issue);
        }
    }

    Ok(())
}
