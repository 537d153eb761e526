//! Error types for the interlock CLI.
//!
//! Uses thiserror for derive macros and provides user-actionable error messages.

use crate::exit_codes;
use thiserror::Error;

/// Main error type for interlock operations.
///
/// Each variant maps to a specific exit code so the CLI is scriptable:
/// automation can distinguish "you asked for something invalid" from
/// "the ledger is unhealthy" from "a deadlock is present".
#[derive(Error, Debug)]
pub enum InterlockError {
    /// User provided invalid arguments or the workspace is in an invalid state.
    #[error("{0}")]
    UserError(String),

    /// The ledger document could not be read, parsed, or written.
    #[error("Ledger operation failed: {0}")]
    LedgerError(String),

    /// Reported by `detect --check` when at least one circular wait exists.
    #[error("deadlock detected: {0}")]
    DeadlockFound(String),

    /// The ledger mutation lock could not be acquired.
    #[error("Lock acquisition failed: {0}")]
    LockError(String),
}

impl InterlockError {
    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            InterlockError::UserError(_) => exit_codes::USER_ERROR,
            InterlockError::LedgerError(_) => exit_codes::LEDGER_FAILURE,
            InterlockError::DeadlockFound(_) => exit_codes::DEADLOCK_FOUND,
            InterlockError::LockError(_) => exit_codes::LOCK_FAILURE,
        }
    }
}

/// Result type alias for interlock operations.
pub type Result<T> = std::result::Result<T, InterlockError>;
