//! Implementation of the `interlock watch` command.
//!
//! `watch` is the detection coordinator's driving loop: it polls the
//! ledger's revision counter, feeds change notifications to the
//! coordinator, and reports published evaluations. Bursts of mutations
//! between two polls coalesce into a single evaluation against the latest
//! snapshot.
//!
//! To avoid spamming repeated detection events, `watch` persists the last
//! reported revision and verdict and only appends a `detection` event when
//! the verdict actually changes (a deadlock appears or clears).

use crate::cli::WatchArgs;
use crate::context::WorkspaceContext;
use crate::context::require_initialized_workspace;
use crate::detect::{Coordinator, PublishedEvaluation, Snapshot};
use crate::error::{InterlockError, Result};
use crate::events::{Event, EventAction, append_event};
use crate::fs::atomic_write_file;
use crate::ledger::Ledger;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::Path;
use std::thread;
use std::time::Duration;

const WATCH_STATE_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WatchState {
    version: u32,
    /// Last ledger revision a published evaluation covered.
    last_revision: Option<u64>,
    /// Verdict of that evaluation.
    last_deadlock: bool,
}

impl Default for WatchState {
    fn default() -> Self {
        Self {
            version: WATCH_STATE_VERSION,
            last_revision: None,
            last_deadlock: false,
        }
    }
}

/// Execute the `interlock watch` command.
pub fn cmd_watch(args: WatchArgs, actor: &str) -> Result<()> {
    let ctx = require_initialized_workspace()?;

    let state_path = ctx.watch_state_path();
    let mut state = load_watch_state(&state_path);

    let coordinator = Coordinator::new();

    eprintln!("interlock watch started");
    eprintln!("  workspace: {}", ctx.root.display());
    eprintln!("  interval:  {}ms", args.interval_ms);
    eprintln!();

    loop {
        match Ledger::peek_revision(&ctx) {
            Ok(revision) => {
                if state.last_revision != Some(revision) {
                    coordinator.notify_changed();
                }
            }
            Err(e) => {
                eprintln!("watch: failed to read ledger revision: {}", e);
            }
        }

        match coordinator.run_pending(|| Ledger::load(&ctx).map(|ledger| Snapshot::from(&ledger))) {
            Ok(Some(published)) => {
                report_published(&ctx, actor, &published, &mut state);
                if let Err(e) = save_watch_state(&state_path, &state) {
                    eprintln!("watch: failed to save state: {}", e);
                }
            }
            Ok(None) => {}
            Err(e) => {
                eprintln!("watch: evaluation failed: {}", e);
            }
        }

        if args.once {
            break;
        }

        thread::sleep(Duration::from_millis(args.interval_ms.max(50)));
    }

    Ok(())
}

/// Print a published evaluation and log verdict changes.
fn report_published(
    ctx: &WorkspaceContext,
    actor: &str,
    published: &PublishedEvaluation,
    state: &mut WatchState,
) {
    for warning in &published.evaluation.warnings {
        eprintln!("watch: warning: {}", warning);
    }

    let result = &published.evaluation.result;
    println!("[rev {}] {}", published.revision, result.message);
    for (i, cycle) in result.cycles.iter().enumerate() {
        println!("  Cycle {}: {}", i + 1, super::format_cycle(cycle));
    }

    let verdict_changed =
        state.last_revision.is_none() || state.last_deadlock != result.has_deadlock;

    if verdict_changed {
        let event = Event::new(EventAction::Detection, actor).with_details(json!({
            "revision": published.revision,
            "has_deadlock": result.has_deadlock,
            "cycle_count": result.cycles.len(),
            "message": result.message,
        }));
        if let Err(e) = append_event(ctx, &event) {
            eprintln!("watch: failed to log detection event: {}", e);
        }

        if result.has_deadlock {
            println!("Run `interlock advise` for ranked resolution recommendations.");
        }
    }

    state.last_revision = Some(published.revision);
    state.last_deadlock = result.has_deadlock;
}

fn load_watch_state(path: &Path) -> WatchState {
    let Ok(content) = std::fs::read_to_string(path) else {
        return WatchState::default();
    };

    match serde_json::from_str::<WatchState>(&content) {
        Ok(state) if state.version == WATCH_STATE_VERSION => state,
        Ok(_) => {
            eprintln!(
                "Warning: watch state file has unknown version; resetting: {}",
                path.display()
            );
            WatchState::default()
        }
        Err(e) => {
            eprintln!(
                "Warning: failed to parse watch state file; resetting: {} ({})",
                path.display(),
                e
            );
            WatchState::default()
        }
    }
}

fn save_watch_state(path: &Path, state: &WatchState) -> Result<()> {
    let json = serde_json::to_string_pretty(state)
        .map_err(|e| InterlockError::UserError(format!("failed to serialize watch state: {}", e)))?;
    atomic_write_file(path, &json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{LockRequestArgs, ResourceAddArgs};
    use crate::test_support::DirGuard;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    fn watch_state_default() {
        let state = WatchState::default();
        assert_eq!(state.version, WATCH_STATE_VERSION);
        assert!(state.last_revision.is_none());
        assert!(!state.last_deadlock);
    }

    #[test]
    fn watch_state_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("watch.state.json");

        let state = WatchState {
            version: WATCH_STATE_VERSION,
            last_revision: Some(42),
            last_deadlock: true,
        };

        save_watch_state(&path, &state).unwrap();
        let loaded = load_watch_state(&path);

        assert_eq!(loaded.last_revision, Some(42));
        assert!(loaded.last_deadlock);
    }

    #[test]
    fn load_watch_state_missing_file_resets() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nonexistent.json");

        let state = load_watch_state(&path);
        assert_eq!(state.version, WATCH_STATE_VERSION);
        assert!(state.last_revision.is_none());
    }

    #[test]
    fn load_watch_state_unknown_version_resets() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("watch.state.json");

        std::fs::write(
            &path,
            r#"{"version": 99, "last_revision": 7, "last_deadlock": true}"#,
        )
        .unwrap();

        let state = load_watch_state(&path);
        assert_eq!(state.version, WATCH_STATE_VERSION);
        assert!(state.last_revision.is_none());
    }

    #[test]
    fn load_watch_state_invalid_json_resets() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("watch.state.json");

        std::fs::write(&path, "not valid json").unwrap();

        let state = load_watch_state(&path);
        assert_eq!(state.version, WATCH_STATE_VERSION);
    }

    #[test]
    #[serial]
    fn watch_once_evaluates_and_persists_state() {
        let temp_dir = TempDir::new().unwrap();
        let _guard = DirGuard::new(temp_dir.path());
        crate::commands::init::cmd_init("admin@host").unwrap();

        cmd_watch(
            WatchArgs {
                interval_ms: 50,
                once: true,
            },
            "admin@host",
        )
        .unwrap();

        let ctx = require_initialized_workspace().unwrap();
        let state = load_watch_state(&ctx.watch_state_path());
        assert!(state.last_revision.is_some());
        assert!(!state.last_deadlock);

        // First evaluation counts as a verdict change and is logged
        let events = std::fs::read_to_string(ctx.events_file()).unwrap();
        assert!(events.contains("\"detection\""));
    }

    #[test]
    #[serial]
    fn watch_once_reports_deadlock_verdict() {
        let temp_dir = TempDir::new().unwrap();
        let _guard = DirGuard::new(temp_dir.path());
        crate::commands::init::cmd_init("admin@host").unwrap();
        for i in 0..2 {
            crate::commands::resource::cmd_resource_add(
                ResourceAddArgs {
                    title: format!("Component {}", i + 1),
                },
                "admin@host",
            )
            .unwrap();
        }
        for (user, resource) in [
            ("alice@laptop", "RES-001"),
            ("bob@desk", "RES-002"),
            ("alice@laptop", "RES-002"),
            ("bob@desk", "RES-001"),
        ] {
            crate::commands::lock::cmd_lock_request(
                LockRequestArgs {
                    resource_id: resource.to_string(),
                },
                user,
            )
            .unwrap();
        }

        cmd_watch(
            WatchArgs {
                interval_ms: 50,
                once: true,
            },
            "admin@host",
        )
        .unwrap();

        let ctx = require_initialized_workspace().unwrap();
        let state = load_watch_state(&ctx.watch_state_path());
        assert!(state.last_deadlock);
    }

    #[test]
    #[serial]
    fn watch_once_skips_unchanged_revision() {
        let temp_dir = TempDir::new().unwrap();
        let _guard = DirGuard::new(temp_dir.path());
        crate::commands::init::cmd_init("admin@host").unwrap();

        // First pass evaluates and records the revision
        cmd_watch(
            WatchArgs {
                interval_ms: 50,
                once: true,
            },
            "admin@host",
        )
        .unwrap();

        let ctx = require_initialized_workspace().unwrap();
        let events_before = std::fs::read_to_string(ctx.events_file()).unwrap();

        // Second pass sees the same revision: no new evaluation, no event
        cmd_watch(
            WatchArgs {
                interval_ms: 50,
                once: true,
            },
            "admin@host",
        )
        .unwrap();

        let events_after = std::fs::read_to_string(ctx.events_file()).unwrap();
        assert_eq!(events_before, events_after);
    }
}
