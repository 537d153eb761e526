//! Workspace context resolution for interlock.
//!
//! This module provides the "environment resolution" layer that finds the
//! workspace root from any working directory and resolves the canonical
//! state paths under `.interlock/`.
//!
//! All interlock commands must use this module to locate workspace state,
//! ensuring that operations always target the same `.interlock/` directory
//! regardless of where inside the workspace the command is invoked from.

use crate::error::{InterlockError, Result};
use std::env;
use std::path::{Path, PathBuf};

/// Name of the workspace state directory.
pub const STATE_DIR_NAME: &str = ".interlock";

/// Resolved paths for the interlock workspace.
///
/// All paths are absolute.
#[derive(Debug, Clone)]
pub struct WorkspaceContext {
    /// Absolute path to the workspace root (the directory containing `.interlock/`).
    pub root: PathBuf,

    /// Absolute path to the state directory (`{root}/.interlock/`).
    pub state_dir: PathBuf,

    /// Absolute path to the mutation locks directory (`{root}/.interlock/locks/`).
    pub locks_dir: PathBuf,
}

impl WorkspaceContext {
    /// Resolve the workspace context from the current working directory.
    ///
    /// Walks up from the current directory until a `.interlock/` directory
    /// is found. Fails with a `UserError` when none exists on the path to
    /// the filesystem root.
    pub fn resolve() -> Result<Self> {
        let cwd = env::current_dir().map_err(|e| {
            InterlockError::UserError(format!("failed to get current working directory: {}", e))
        })?;

        Self::resolve_from(&cwd)
    }

    /// Resolve the workspace context from a specific directory.
    ///
    /// This is useful for testing or when the working directory is known.
    pub fn resolve_from<P: AsRef<Path>>(cwd: P) -> Result<Self> {
        let start = cwd.as_ref();

        let mut dir = Some(start.to_path_buf());
        while let Some(candidate) = dir {
            if candidate.join(STATE_DIR_NAME).is_dir() {
                return Ok(Self::at_root(&candidate));
            }
            dir = candidate.parent().map(Path::to_path_buf);
        }

        Err(InterlockError::UserError(format!(
            "no interlock workspace found.\n\
             Searched '{}' and its parent directories for a '{}' directory.\n\n\
             Run `interlock init` in the directory you want to share.",
            start.display(),
            STATE_DIR_NAME
        )))
    }

    /// Build a context rooted at a known workspace root.
    ///
    /// Does not check that the state directory exists; used by `init` and by
    /// `resolve_from` after discovery.
    pub fn at_root<P: AsRef<Path>>(root: P) -> Self {
        let root = root.as_ref().to_path_buf();
        let state_dir = root.join(STATE_DIR_NAME);
        let locks_dir = state_dir.join("locks");

        Self {
            root,
            state_dir,
            locks_dir,
        }
    }

    /// Check whether the workspace state directory exists.
    pub fn workspace_exists(&self) -> bool {
        self.state_dir.is_dir()
    }

    /// Get the path to the ledger document.
    pub fn ledger_path(&self) -> PathBuf {
        self.state_dir.join("ledger.json")
    }

    /// Get the path to the ledger mutation lock file.
    pub fn ledger_lock_path(&self) -> PathBuf {
        self.locks_dir.join("ledger.lock")
    }

    /// Get the path to the config file.
    pub fn config_path(&self) -> PathBuf {
        self.state_dir.join("config.yaml")
    }

    /// Get the path to the user profiles file.
    pub fn profiles_path(&self) -> PathBuf {
        self.state_dir.join("profiles.json")
    }

    /// Get the path to the events directory.
    pub fn events_dir(&self) -> PathBuf {
        self.state_dir.join("events")
    }

    /// Get the path to the main events log file.
    pub fn events_file(&self) -> PathBuf {
        self.events_dir().join("events.ndjson")
    }

    /// Get the path to the watch loop's persisted state.
    pub fn watch_state_path(&self) -> PathBuf {
        self.state_dir.join("watch.state.json")
    }
}

/// Resolve the workspace context and require that it is initialized.
///
/// This should be called by all commands except `init` to provide a helpful
/// error message guiding users to run `interlock init`.
pub fn require_initialized_workspace() -> Result<WorkspaceContext> {
    let ctx = WorkspaceContext::resolve()?;

    if !ctx.workspace_exists() {
        return Err(InterlockError::UserError(format!(
            "interlock workspace not initialized.\n\
             Expected state directory at: {}\n\n\
             Run `interlock init` to initialize the workspace.",
            ctx.state_dir.display()
        )));
    }

    Ok(ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn resolve_from_workspace_root() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::create_dir(temp_dir.path().join(STATE_DIR_NAME)).unwrap();

        let ctx = WorkspaceContext::resolve_from(temp_dir.path()).unwrap();
        assert_eq!(ctx.root, temp_dir.path());
        assert_eq!(ctx.state_dir, temp_dir.path().join(STATE_DIR_NAME));
    }

    #[test]
    fn resolve_from_nested_directory() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::create_dir(temp_dir.path().join(STATE_DIR_NAME)).unwrap();
        let nested = temp_dir.path().join("a/b/c");
        std::fs::create_dir_all(&nested).unwrap();

        let ctx = WorkspaceContext::resolve_from(&nested).unwrap();
        assert_eq!(ctx.root, temp_dir.path());
    }

    #[test]
    fn resolve_fails_outside_workspace() {
        let temp_dir = TempDir::new().unwrap();

        let result = WorkspaceContext::resolve_from(temp_dir.path());
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(err.to_string().contains("no interlock workspace found"));
        assert!(err.to_string().contains("interlock init"));
    }

    #[test]
    fn state_file_paths_are_under_state_dir() {
        let temp_dir = TempDir::new().unwrap();
        let ctx = WorkspaceContext::at_root(temp_dir.path());

        assert!(ctx.ledger_path().starts_with(&ctx.state_dir));
        assert!(ctx.config_path().starts_with(&ctx.state_dir));
        assert!(ctx.profiles_path().starts_with(&ctx.state_dir));
        assert!(ctx.events_file().starts_with(&ctx.events_dir()));
        assert!(ctx.ledger_lock_path().starts_with(&ctx.locks_dir));
    }

    #[test]
    fn at_root_does_not_require_existing_state() {
        let temp_dir = TempDir::new().unwrap();
        let ctx = WorkspaceContext::at_root(temp_dir.path());

        assert!(!ctx.workspace_exists());
    }
}
