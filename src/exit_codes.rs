//! Exit code constants for the interlock CLI.
//!
//! - 0: Success
//! - 1: User error (bad args, invalid state)
//! - 2: Ledger failure (corrupt or unwritable ledger state)
//! - 3: Deadlock present (only from `detect --check`)
//! - 4: Mutation lock acquisition failure

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// User error: bad arguments, invalid state, or uninitialized workspace.
pub const USER_ERROR: i32 = 1;

/// Ledger failure: the ledger document could not be read, parsed, or written.
pub const LEDGER_FAILURE: i32 = 2;

/// Deadlock present: `detect --check` found at least one circular wait.
pub const DEADLOCK_FOUND: i32 = 3;

/// Lock failure: the ledger mutation lock could not be acquired.
pub const LOCK_FAILURE: i32 = 4;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_distinct() {
        let codes = [
            SUCCESS,
            USER_ERROR,
            LEDGER_FAILURE,
            DEADLOCK_FOUND,
            LOCK_FAILURE,
        ];
        for (i, &a) in codes.iter().enumerate() {
            for (j, &b) in codes.iter().enumerate() {
                if i != j {
                    assert_ne!(a, b, "Exit codes must be distinct");
                }
            }
        }
    }

    #[test]
    fn exit_codes_are_stable() {
        assert_eq!(SUCCESS, 0);
        assert_eq!(USER_ERROR, 1);
        assert_eq!(LEDGER_FAILURE, 2);
        assert_eq!(DEADLOCK_FOUND, 3);
        assert_eq!(LOCK_FAILURE, 4);
    }
}
