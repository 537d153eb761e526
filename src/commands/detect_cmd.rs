//! Implementation of the `interlock detect` command.
//!
//! One-shot evaluation of the current ledger. With `--check`, a detected
//! deadlock becomes a dedicated non-zero exit code so scripts and CI hooks
//! can gate on it.

use crate::cli::DetectArgs;
use crate::context::require_initialized_workspace;
use crate::detect::evaluate;
use crate::error::{InterlockError, Result};
use crate::ledger::Ledger;

/// Execute the `interlock detect` command.
pub fn cmd_detect(args: DetectArgs) -> Result<()> {
    let ctx = require_initialized_workspace()?;

    let ledger = Ledger::load(&ctx)?;
    let evaluation = evaluate(ledger.locks(), ledger.resources());

    for warning in &evaluation.warnings {
        eprintln!("Warning: {}", warning);
    }

    if args.json {
        let json = serde_json::to_string_pretty(&evaluation.result).map_err(|e| {
            InterlockError::UserError(format!("failed to serialize detection result: {}", e))
        })?;
        println!("{}", json);
    } else {
        println!("{}", evaluation.result.message);
        for (i, cycle) in evaluation.result.cycles.iter().enumerate() {
            println!("  Cycle {}: {}", i + 1, super::format_cycle(cycle));
        }
    }

    if args.check && evaluation.result.has_deadlock {
        return Err(InterlockError::DeadlockFound(format!(
            "{} circular wait condition(s)",
            evaluation.result.cycles.len()
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{LockRequestArgs, ResourceAddArgs};
    use crate::test_support::DirGuard;
    use serial_test::serial;
    use tempfile::TempDir;

    fn workspace_with_classic_cycle() -> TempDir {
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
        temp_dir
    }

    #[test]
    #[serial]
    fn detect_on_clean_workspace_succeeds() {
        let temp_dir = TempDir::new().unwrap();
        let _guard = DirGuard::new(temp_dir.path());
        crate::commands::init::cmd_init("admin@host").unwrap();

        cmd_detect(DetectArgs {
            json: false,
            check: true,
        })
        .unwrap();
    }

    #[test]
    #[serial]
    fn detect_check_exits_nonzero_on_deadlock() {
        let temp_dir = workspace_with_classic_cycle();
        let _guard = DirGuard::new(temp_dir.path());

        // Without --check, detection reports but succeeds
        cmd_detect(DetectArgs {
            json: false,
            check: false,
        })
        .unwrap();

        // With --check, the deadlock becomes the exit status
        let result = cmd_detect(DetectArgs {
            json: false,
            check: true,
        });
        assert!(result.is_err());
        assert_eq!(
            result.unwrap_err().exit_code(),
            crate::exit_codes::DEADLOCK_FOUND
        );
    }

    #[test]
    #[serial]
    fn detect_json_output_succeeds() {
        let temp_dir = workspace_with_classic_cycle();
        let _guard = DirGuard::new(temp_dir.path());

        cmd_detect(DetectArgs {
            json: true,
            check: false,
        })
        .unwrap();
    }
}
