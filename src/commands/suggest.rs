//! Implementation of the `interlock suggest` command.
//!
//! Prints the structured board summary and the prompt the external advice
//! service would receive. The text generation itself happens outside this
//! tool; pipe the prompt into whatever assistant the team uses.

use crate::advice::AdviceSummary;
use crate::config::Config;
use crate::context::require_initialized_workspace;
use crate::detect::evaluate;
use crate::error::{InterlockError, Result};
use crate::ledger::Ledger;

/// Execute the `interlock suggest` command.
pub fn cmd_suggest() -> Result<()> {
    let ctx = require_initialized_workspace()?;
    let config = Config::load(ctx.config_path()).unwrap_or_default();

    let ledger = Ledger::load(&ctx)?;
    let evaluation = evaluate(ledger.locks(), ledger.resources());

    let summary = AdviceSummary::from_ledger(&ledger, &config, evaluation.result.has_deadlock);

    let json = serde_json::to_string_pretty(&summary).map_err(|e| {
        InterlockError::UserError(format!("failed to serialize advice summary: {}", e))
    })?;

    println!("Summary:");
    println!("{}", json);
    println!();
    println!("Prompt:");
    println!("{}", summary.prompt());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{DirGuard, scoped_workspace};
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    #[serial]
    fn suggest_runs_on_fresh_workspace() {
        let (_temp_dir, _ctx, _guard) = scoped_workspace();

        cmd_suggest().unwrap();
    }

    #[test]
    #[serial]
    fn suggest_outside_workspace_fails() {
        let temp_dir = TempDir::new().unwrap();
        let _guard = DirGuard::new(temp_dir.path());

        assert!(cmd_suggest().is_err());
    }
}
