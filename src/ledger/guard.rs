//! Exclusive mutation lock for the ledger document.
//!
//! Ledger writes from concurrent processes are serialized through a lock
//! file created with **create_new** semantics (exclusive create): only one
//! process can hold `locks/ledger.lock` at a time. The file contains JSON
//! metadata identifying the holder so a blocked collaborator gets a useful
//! error message instead of a bare failure.
//!
//! The lock is managed through an RAII guard that removes the file on drop.
//! If deletion fails during drop, a warning is printed but the program does
//! not crash.

use crate::context::WorkspaceContext;
use crate::error::{InterlockError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Metadata stored in the ledger mutation lock file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutationLockMetadata {
    /// Owner of the lock (e.g., `user@HOST`).
    pub owner: String,

    /// Process ID of the lock holder (optional).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,

    /// Timestamp when the lock was created (RFC3339).
    pub created_at: DateTime<Utc>,

    /// The mutation being performed (lock_request/lock_release/etc.).
    pub action: String,
}

impl MutationLockMetadata {
    /// Create new metadata for the current process and the given action.
    pub fn new(owner: &str, action: &str) -> Self {
        Self {
            owner: owner.to_string(),
            pid: Some(std::process::id()),
            created_at: Utc::now(),
            action: action.to_string(),
        }
    }

    /// Parse metadata from an existing lock file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            InterlockError::LockError(format!(
                "failed to read lock file '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;

        serde_json::from_str(&content).map_err(|e| {
            InterlockError::LockError(format!(
                "failed to parse lock file '{}': {}",
                path.as_ref().display(),
                e
            ))
        })
    }
}

/// RAII guard for the ledger mutation lock.
///
/// When dropped, the lock file is automatically deleted.
#[derive(Debug)]
pub struct MutationGuard {
    /// Path to the lock file.
    path: PathBuf,

    /// Whether the lock has been released manually.
    released: bool,
}

impl MutationGuard {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            released: false,
        }
    }

    /// Get the path to the lock file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Manually release the lock, handling errors explicitly.
    pub fn release(mut self) -> Result<()> {
        self.released = true;
        fs::remove_file(&self.path).map_err(|e| {
            InterlockError::LockError(format!(
                "failed to release mutation lock '{}': {}",
                self.path.display(),
                e
            ))
        })
    }
}

impl Drop for MutationGuard {
    fn drop(&mut self) {
        if !self.released
            && let Err(e) = fs::remove_file(&self.path)
        {
            eprintln!(
                "Warning: failed to release mutation lock '{}': {}",
                self.path.display(),
                e
            );
        }
    }
}

/// Acquire the ledger mutation lock.
///
/// Must be held across every load-mutate-save sequence on the ledger.
///
/// # Arguments
///
/// * `ctx` - The workspace context
/// * `actor` - The acting user (recorded in the lock metadata)
/// * `action` - The mutation being performed (for diagnostics)
///
/// # Returns
///
/// * `Ok(MutationGuard)` - Successfully acquired lock with RAII guard
/// * `Err(InterlockError::LockError)` - Lock already held (exit code 4)
pub fn acquire_mutation_lock(
    ctx: &WorkspaceContext,
    actor: &str,
    action: &str,
) -> Result<MutationGuard> {
    let lock_path = ctx.ledger_lock_path();

    if let Some(parent) = lock_path.parent()
        && !parent.exists()
    {
        fs::create_dir_all(parent).map_err(|e| {
            InterlockError::LockError(format!(
                "failed to create locks directory '{}': {}",
                parent.display(),
                e
            ))
        })?;
    }

    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&lock_path)
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::AlreadyExists {
                // Read the existing metadata for a helpful error message
                let existing = match MutationLockMetadata::from_file(&lock_path) {
                    Ok(meta) => format!(
                        "\nLock: {} (created {} by {})\nAction: {}",
                        lock_path.display(),
                        meta.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
                        meta.owner,
                        meta.action
                    ),
                    Err(_) => format!("\nLock: {}", lock_path.display()),
                };
                InterlockError::LockError(format!(
                    "ledger is being mutated by another process{}",
                    existing
                ))
            } else {
                InterlockError::LockError(format!(
                    "failed to acquire mutation lock '{}': {}",
                    lock_path.display(),
                    e
                ))
            }
        })?;

    let metadata = MutationLockMetadata::new(actor, action);
    let json = serde_json::to_string_pretty(&metadata).map_err(|e| {
        InterlockError::LockError(format!("failed to serialize lock metadata: {}", e))
    })?;

    file.write_all(json.as_bytes()).map_err(|e| {
        let _ = fs::remove_file(&lock_path);
        InterlockError::LockError(format!("failed to write lock metadata: {}", e))
    })?;

    file.sync_all().map_err(|e| {
        let _ = fs::remove_file(&lock_path);
        InterlockError::LockError(format!("failed to sync lock file: {}", e))
    })?;

    Ok(MutationGuard::new(lock_path))
}
