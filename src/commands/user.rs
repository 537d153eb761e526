//! Implementation of the `interlock user` commands.

use crate::cli::UserRoleArgs;
use crate::config::Config;
use crate::context::require_initialized_workspace;
use crate::error::Result;
use crate::events::{Event, EventAction, append_event};
use crate::ledger::{Ledger, format_age};
use crate::profiles::Profiles;
use chrono::Utc;
use serde_json::json;

/// Execute the `interlock user list` command.
pub fn cmd_user_list() -> Result<()> {
    let ctx = require_initialized_workspace()?;
    let config = Config::load(ctx.config_path()).unwrap_or_default();

    let profiles = Profiles::load(&ctx)?;
    let ledger = Ledger::load(&ctx)?;

    if profiles.is_empty() {
        println!("No collaborators yet.");
        println!("Profiles are created on first lock activity.");
        return Ok(());
    }

    println!("Collaborators ({} of {}):", profiles.len(), config.max_users);
    println!();

    let now = Utc::now();
    for (user_id, profile) in profiles.all() {
        let held = ledger
            .active_locks()
            .iter()
            .filter(|l| l.is_held() && &l.user_id == user_id)
            .count();

        println!(
            "  {:<24} role: {:<8} (weight {:.1})  idle: {:<8} session: {:<8} holds: {}",
            user_id,
            profile.role,
            config.role_weight_for(&profile.role),
            format_age(now.signed_duration_since(profile.last_seen_at)),
            format_age(now.signed_duration_since(profile.session_started_at)),
            held
        );
    }

    Ok(())
}

/// Execute the `interlock user role` command.
pub fn cmd_user_role(args: UserRoleArgs, actor: &str) -> Result<()> {
    let ctx = require_initialized_workspace()?;
    let config = Config::load(ctx.config_path()).unwrap_or_default();

    let mut profiles = Profiles::load(&ctx)?;
    profiles.set_role(&config, &args.user_id, &args.role)?;
    profiles.save(&ctx)?;

    let event = Event::new(EventAction::UserRole, actor).with_details(json!({
        "user_id": args.user_id,
        "role": args.role,
        "weight": config.role_weight_for(&args.role),
    }));
    append_event(&ctx, &event)?;

    println!(
        "Set role of {} to {} (weight {:.1})",
        args.user_id,
        args.role,
        config.role_weight_for(&args.role)
    );

    if !config.role_weights.contains_key(&args.role) {
        eprintln!(
            "Warning: role '{}' has no entry in config role_weights; \
             it scores with the default weight.",
            args.role
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::scoped_workspace;
    use serial_test::serial;

    #[test]
    #[serial]
    fn user_list_on_empty_workspace_succeeds() {
        let (_temp_dir, _ctx, _guard) = scoped_workspace();

        cmd_user_list().unwrap();
    }

    #[test]
    #[serial]
    fn user_role_creates_profile_and_logs() {
        let (_temp_dir, ctx, _guard) = scoped_workspace();

        cmd_user_role(
            UserRoleArgs {
                user_id: "alice@laptop".to_string(),
                role: "admin".to_string(),
            },
            "admin@host",
        )
        .unwrap();

        let profiles = Profiles::load(&ctx).unwrap();
        assert_eq!(profiles.get("alice@laptop").unwrap().role, "admin");

        let events = std::fs::read_to_string(ctx.events_file()).unwrap();
        assert!(events.contains("\"user_role\""));

        cmd_user_list().unwrap();
    }

    #[test]
    #[serial]
    fn user_role_rejects_empty_role() {
        let (_temp_dir, _ctx, _guard) = scoped_workspace();

        let result = cmd_user_role(
            UserRoleArgs {
                user_id: "alice@laptop".to_string(),
                role: "  ".to_string(),
            },
            "admin@host",
        );

        assert!(result.is_err());
    }
}
