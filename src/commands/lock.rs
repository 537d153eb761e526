//! Implementation of the `interlock lock` commands.
//!
//! `request` and `release` are the two ledger mutations collaborators use
//! directly; `clear` is the force-release path that applies a resolution
//! recommendation. Every mutation ends with a detection pass over the new
//! ledger state, so a lock action that creates a circular wait is reported
//! in the same command invocation.

use crate::cli::{LockClearArgs, LockReleaseArgs, LockRequestArgs};
use crate::config::Config;
use crate::context::require_initialized_workspace;
use crate::error::{InterlockError, Result};
use crate::events::{Event, EventAction, append_event};
use crate::ledger::{
    Ledger, LockState, RequestOutcome, acquire_mutation_lock, format_age, validate_resource_id,
};
use crate::profiles::Profiles;
use serde_json::json;

/// Execute the `interlock lock request` command.
pub fn cmd_lock_request(args: LockRequestArgs, actor: &str) -> Result<()> {
    let ctx = require_initialized_workspace()?;
    let config = Config::load(ctx.config_path()).unwrap_or_default();
    let resource_id = validate_resource_id(&args.resource_id)?;

    let _mutation_lock = acquire_mutation_lock(&ctx, actor, "lock_request")?;

    // First contact creates the profile; repeat contact refreshes idle time.
    let mut profiles = Profiles::load(&ctx)?;
    profiles.touch(&config, actor)?;
    profiles.save(&ctx)?;

    let mut ledger = Ledger::load(&ctx)?;
    let outcome = ledger.request_lock(actor, &resource_id)?;
    ledger.save(&ctx)?;

    match &outcome {
        RequestOutcome::Acquired(record) => {
            let event = Event::new(EventAction::LockAcquire, actor)
                .with_resource(&resource_id)
                .with_details(json!({"lock_id": record.id}));
            append_event(&ctx, &event)?;

            println!("Lock acquired: {} on {}", record.id, resource_id);
            println!("You now have exclusive access to this component.");
        }
        RequestOutcome::Queued { record, holder } => {
            let position = ledger.pending_for(&resource_id).len();
            let event = Event::new(EventAction::LockRequest, actor)
                .with_resource(&resource_id)
                .with_details(json!({
                    "lock_id": record.id,
                    "holder": holder,
                    "queue_position": position,
                }));
            append_event(&ctx, &event)?;

            println!(
                "Request queued: {} on {} (held by {}, position {})",
                record.id, resource_id, holder, position
            );
        }
    }

    super::report_detection_after_mutation(&ctx)
}

/// Execute the `interlock lock release` command.
pub fn cmd_lock_release(args: LockReleaseArgs, actor: &str) -> Result<()> {
    let ctx = require_initialized_workspace()?;
    let config = Config::load(ctx.config_path()).unwrap_or_default();
    let resource_id = validate_resource_id(&args.resource_id)?;

    let _mutation_lock = acquire_mutation_lock(&ctx, actor, "lock_release")?;

    let mut profiles = Profiles::load(&ctx)?;
    profiles.touch(&config, actor)?;
    profiles.save(&ctx)?;

    let mut ledger = Ledger::load(&ctx)?;
    let outcome = ledger.release_lock(actor, &resource_id, config.grant_pending_on_release)?;
    ledger.save(&ctx)?;

    let event = Event::new(EventAction::LockRelease, actor)
        .with_resource(&resource_id)
        .with_details(json!({
            "lock_id": outcome.released.id,
            "was_pending": outcome.released.acquired_at.is_none(),
        }));
    append_event(&ctx, &event)?;

    if outcome.released.acquired_at.is_some() {
        println!("Lock released: {} on {}", outcome.released.id, resource_id);
        println!("Component is now available for others.");
    } else {
        println!(
            "Request cancelled: {} on {}",
            outcome.released.id, resource_id
        );
    }

    if let Some(promoted) = &outcome.promoted {
        let event = Event::new(EventAction::LockPromote, &promoted.user_id)
            .with_resource(&resource_id)
            .with_details(json!({
                "lock_id": promoted.id,
                "released_lock_id": outcome.released.id,
            }));
        append_event(&ctx, &event)?;

        println!(
            "Granted to next in queue: {} ({})",
            promoted.user_id, promoted.id
        );
    }

    super::report_detection_after_mutation(&ctx)
}

/// Execute the `interlock lock list` command.
pub fn cmd_lock_list() -> Result<()> {
    let ctx = require_initialized_workspace()?;
    let config = Config::load(ctx.config_path()).unwrap_or_default();

    let ledger = Ledger::load(&ctx)?;
    let active = ledger.active_locks();

    if active.is_empty() {
        println!("No active locks.");
        return Ok(());
    }

    let held: Vec<_> = active.iter().filter(|l| l.is_held()).collect();
    let pending: Vec<_> = active.iter().filter(|l| l.is_pending()).collect();

    if !held.is_empty() {
        println!("Held locks ({}):", held.len());
        for lock in &held {
            let title = ledger
                .resource(&lock.resource_id)
                .map(|r| r.title.as_str())
                .unwrap_or("unknown resource");
            let stale_marker = if lock.is_stale(config.lock_stale_minutes) {
                " [STALE]"
            } else {
                ""
            };
            println!(
                "  {}  {} \"{}\" held by {} for {}{}",
                lock.id,
                lock.resource_id,
                title,
                lock.user_id,
                lock.held_for().map(format_age).unwrap_or_default(),
                stale_marker
            );
        }
        println!();
    }

    if !pending.is_empty() {
        println!("Pending requests ({}):", pending.len());
        for lock in &pending {
            let holder = ledger
                .holder_of(&lock.resource_id)
                .map(|h| h.user_id.clone())
                .unwrap_or_else(|| "nobody".to_string());
            println!(
                "  {}  {} requested by {} {} ago (held by {})",
                lock.id,
                lock.resource_id,
                lock.user_id,
                format_age(lock.age()),
                holder
            );
        }
        println!();
    }

    let stale_count = held
        .iter()
        .filter(|l| l.is_stale(config.lock_stale_minutes))
        .count();
    if stale_count > 0 {
        println!(
            "Note: {} lock(s) exceed the {} minute stale threshold. \
             Use `interlock lock clear <lock-id> --force` to preempt.",
            stale_count, config.lock_stale_minutes
        );
    }

    Ok(())
}

/// Execute the `interlock lock clear` command.
///
/// Force-releases any active lock by ID. This is the application path for
/// advisor recommendations, so it works on other users' locks; that is
/// exactly why it refuses to run without `--force`.
pub fn cmd_lock_clear(args: LockClearArgs, actor: &str) -> Result<()> {
    if !args.force {
        return Err(InterlockError::UserError(format!(
            "refusing to clear lock without --force flag.\n\n\
             Clearing releases another collaborator's lock and may discard\n\
             their in-progress work. Only clear locks you are certain are\n\
             abandoned, or ones named by `interlock advise`.\n\n\
             To clear the lock, run:\n  interlock lock clear {} --force",
            args.lock_id
        )));
    }

    let ctx = require_initialized_workspace()?;
    let config = Config::load(ctx.config_path()).unwrap_or_default();

    let _mutation_lock = acquire_mutation_lock(&ctx, actor, "lock_clear")?;

    let mut ledger = Ledger::load(&ctx)?;
    let outcome = ledger.force_release(&args.lock_id, config.grant_pending_on_release)?;
    ledger.save(&ctx)?;

    let event = Event::new(EventAction::LockClear, actor)
        .with_resource(&outcome.released.resource_id)
        .with_details(json!({
            "lock_id": outcome.released.id,
            "owner": outcome.released.user_id,
            "was_state": match outcome.released.acquired_at {
                Some(_) => LockState::Held.to_string(),
                None => LockState::Pending.to_string(),
            },
            "age_minutes": outcome.released.age().num_minutes(),
            "force": args.force,
        }));
    append_event(&ctx, &event)?;

    println!(
        "Cleared lock {} ({} on {}, requested {} ago)",
        outcome.released.id,
        outcome.released.user_id,
        outcome.released.resource_id,
        format_age(outcome.released.age())
    );

    if let Some(promoted) = &outcome.promoted {
        let event = Event::new(EventAction::LockPromote, &promoted.user_id)
            .with_resource(&promoted.resource_id)
            .with_details(json!({
                "lock_id": promoted.id,
                "released_lock_id": outcome.released.id,
            }));
        append_event(&ctx, &event)?;

        println!(
            "Granted to next in queue: {} ({})",
            promoted.user_id, promoted.id
        );
    }

    super::report_detection_after_mutation(&ctx)
}
