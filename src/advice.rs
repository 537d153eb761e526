//! Contract with the external advice service.
//!
//! Free-form "how do I avoid this deadlock" text comes from an external
//! assistant, not from this crate. The kernel's entire contract with that
//! service is a small structured summary of the board state, rendered into
//! a prompt, and a failure taxonomy that distinguishes transient rate
//! limiting (surface a "try again shortly" message, let the external layer
//! do its own bounded backoff) from terminal upstream errors. The kernel
//! itself never retries.

use crate::config::Config;
use crate::ledger::Ledger;
use serde::Serialize;
use thiserror::Error;

/// Structured board summary handed to the advice service as prompt input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AdviceSummary {
    pub current_users: u32,
    pub max_users: u32,
    pub current_resources: u32,
    pub max_resources: u32,
    pub has_deadlock: bool,
}

impl AdviceSummary {
    /// Build the summary from the current ledger and config limits.
    pub fn from_ledger(ledger: &Ledger, config: &Config, has_deadlock: bool) -> Self {
        Self {
            current_users: ledger.active_users().len() as u32,
            max_users: config.max_users,
            current_resources: ledger.resources().len() as u32,
            max_resources: config.max_resources,
            has_deadlock,
        }
    }

    /// Render the prompt the external service receives.
    pub fn prompt(&self) -> String {
        let deadlock_line = if self.has_deadlock {
            "- A deadlock has been detected!\n"
        } else {
            ""
        };

        format!(
            "I'm managing a collaborative workspace with resource locking. Currently:\n\
             - {} users are active (max: {})\n\
             - {} components exist (max: {})\n\
             {}\n\
             Please provide:\n\
             1. Best practices to avoid deadlocks in collaborative systems\n\
             2. Specific strategies for resolving the current situation\n\
             3. How to optimize resource allocation\n\
             4. Prevention tips for the future\n\n\
             Keep it concise and actionable.",
            self.current_users,
            self.max_users,
            self.current_resources,
            self.max_resources,
            deadlock_line
        )
    }
}

/// Failures from the advice service, classified for the caller.
#[derive(Error, Debug)]
pub enum AdviceError {
    /// The upstream is rate limiting; retryable after a backoff window.
    #[error("advice service is rate limited: {message}")]
    RateLimited {
        message: String,
        /// Suggested wait before retrying, in seconds.
        retry_after_secs: u64,
    },

    /// Terminal upstream failure.
    #[error("advice service failed: {0}")]
    Upstream(String),
}

impl AdviceError {
    /// Whether the caller may retry after waiting.
    pub fn is_transient(&self) -> bool {
        matches!(self, AdviceError::RateLimited { .. })
    }

    /// A message suitable for direct display to the user.
    pub fn user_message(&self) -> String {
        match self {
            AdviceError::RateLimited {
                retry_after_secs, ..
            } => format!(
                "The advice service is receiving too many requests. \
                 Please wait {} seconds before trying again.",
                retry_after_secs
            ),
            AdviceError::Upstream(_) => {
                "Unable to get suggestions right now. Please try again in a moment.".to_string()
            }
        }
    }
}

/// An external advice backend.
///
/// Implementations live outside this crate (the service is an out-of-scope
/// collaborator); the trait pins down the only interface the kernel relies
/// on.
pub trait AdviceService {
    /// Generate free-form suggestions for the given board summary.
    fn suggest(&self, summary: &AdviceSummary) -> Result<String, AdviceError>;
}
