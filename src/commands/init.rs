//! Implementation of the `interlock init` command.
//!
//! Creates the `.interlock/` state directory in the current working
//! directory with a default configuration, an empty ledger, and the
//! events directory.

use crate::config::Config;
use crate::context::WorkspaceContext;
use crate::error::{InterlockError, Result};
use crate::events::{Event, EventAction, append_event};
use crate::fs::atomic_write_file;
use crate::ledger::Ledger;
use serde_json::json;
use std::fs;

/// Execute the `interlock init` command.
///
/// Fails when the current directory (or a parent) already hosts a
/// workspace, so nested workspaces can't shadow each other by accident.
pub fn cmd_init(actor: &str) -> Result<()> {
    let cwd = std::env::current_dir().map_err(|e| {
        InterlockError::UserError(format!("failed to get current working directory: {}", e))
    })?;

    if let Ok(existing) = WorkspaceContext::resolve_from(&cwd) {
        return Err(InterlockError::UserError(format!(
            "workspace already initialized at: {}\n\n\
             Remove '{}' first if you really want to start over.",
            existing.root.display(),
            existing.state_dir.display()
        )));
    }

    let ctx = WorkspaceContext::at_root(&cwd);

    fs::create_dir_all(&ctx.locks_dir).map_err(|e| {
        InterlockError::UserError(format!(
            "failed to create state directory '{}': {}",
            ctx.locks_dir.display(),
            e
        ))
    })?;
    fs::create_dir_all(ctx.events_dir()).map_err(|e| {
        InterlockError::UserError(format!(
            "failed to create events directory '{}': {}",
            ctx.events_dir().display(),
            e
        ))
    })?;

    let config = Config::default();
    atomic_write_file(ctx.config_path(), &config.to_yaml()?)?;

    let mut ledger = Ledger::new();
    ledger.save(&ctx)?;

    let event = Event::new(EventAction::Init, actor).with_details(json!({
        "max_users": config.max_users,
        "max_resources": config.max_resources,
    }));
    append_event(&ctx, &event)?;

    println!("Initialized interlock workspace");
    println!("  root:   {}", ctx.root.display());
    println!("  state:  {}", ctx.state_dir.display());
    println!("  config: {}", ctx.config_path().display());
    println!();
    println!("Next steps:");
    println!("  interlock resource add \"<title>\"   # create lockable components");
    println!("  interlock lock request RES-001      # take an exclusive lock");
    println!("  interlock watch                     # monitor for deadlocks");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::DirGuard;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    #[serial]
    fn init_creates_workspace_layout() {
        let temp_dir = TempDir::new().unwrap();
        let _guard = DirGuard::new(temp_dir.path());

        cmd_init("alice@laptop").unwrap();

        let ctx = WorkspaceContext::resolve_from(temp_dir.path()).unwrap();
        assert!(ctx.state_dir.is_dir());
        assert!(ctx.locks_dir.is_dir());
        assert!(ctx.events_dir().is_dir());
        assert!(ctx.config_path().is_file());
        assert!(ctx.ledger_path().is_file());

        // Ledger starts empty
        let ledger = Ledger::load(&ctx).unwrap();
        assert!(ledger.resources().is_empty());
        assert!(ledger.locks().is_empty());

        // Init event is on the log
        let events = std::fs::read_to_string(ctx.events_file()).unwrap();
        assert!(events.contains("\"init\""));
        assert!(events.contains("alice@laptop"));
    }

    #[test]
    #[serial]
    fn init_twice_fails() {
        let temp_dir = TempDir::new().unwrap();
        let _guard = DirGuard::new(temp_dir.path());

        cmd_init("alice@laptop").unwrap();
        let result = cmd_init("alice@laptop");

        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("already initialized")
        );
    }

    #[test]
    #[serial]
    fn init_inside_existing_workspace_fails() {
        let temp_dir = TempDir::new().unwrap();
        {
            let _guard = DirGuard::new(temp_dir.path());
            cmd_init("alice@laptop").unwrap();
        }

        let nested = temp_dir.path().join("sub/dir");
        std::fs::create_dir_all(&nested).unwrap();
        let _guard = DirGuard::new(&nested);

        let result = cmd_init("alice@laptop");
        assert!(result.is_err());
    }

    #[test]
    #[serial]
    fn init_writes_loadable_default_config() {
        let temp_dir = TempDir::new().unwrap();
        let _guard = DirGuard::new(temp_dir.path());

        cmd_init("alice@laptop").unwrap();

        let ctx = WorkspaceContext::resolve_from(temp_dir.path()).unwrap();
        let config = Config::load(ctx.config_path()).unwrap();
        assert_eq!(config.max_users, Config::default().max_users);
        assert_eq!(config.default_role, Config::default().default_role);
    }
}
