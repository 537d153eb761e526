//! Lock record and resource definitions, plus ID schemes.

use chrono::{DateTime, Duration, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::error::{InterlockError, Result};

/// Regex pattern for valid resource IDs.
static RESOURCE_ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^RES-\d{3,}$").expect("Invalid resource ID regex"));

/// A lockable resource (a "component" of the shared workspace).
///
/// The ID is the key everything else hangs off; the title exists only for
/// human-readable output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    /// The resource ID (e.g., "RES-001").
    pub id: String,

    /// Display title.
    pub title: String,
}

/// State of a lock record, derived from its timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockState {
    /// Requested but not yet granted.
    Pending,
    /// Granted and exclusive.
    Held,
    /// Terminal; excluded from all detection input.
    Released,
}

impl std::fmt::Display for LockState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LockState::Pending => write!(f, "pending"),
            LockState::Held => write!(f, "held"),
            LockState::Released => write!(f, "released"),
        }
    }
}

/// A single lock record in the ledger.
///
/// `released_at` is terminal: once set the record is inert history and is
/// never mutated again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockRecord {
    /// The lock ID (e.g., "LCK-001").
    pub id: String,

    /// The requesting user (e.g., `alice@laptop`).
    pub user_id: String,

    /// The resource this lock targets.
    pub resource_id: String,

    /// When the lock was requested.
    pub requested_at: DateTime<Utc>,

    /// When the lock was granted, if it has been.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acquired_at: Option<DateTime<Utc>>,

    /// When the lock was released, if it has been.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub released_at: Option<DateTime<Utc>>,
}

impl LockRecord {
    /// Derive the record's state from its timestamps.
    pub fn state(&self) -> LockState {
        if self.released_at.is_some() {
            LockState::Released
        } else if self.acquired_at.is_some() {
            LockState::Held
        } else {
            LockState::Pending
        }
    }

    /// Whether the record is a pending request.
    pub fn is_pending(&self) -> bool {
        self.state() == LockState::Pending
    }

    /// Whether the record currently holds its resource.
    pub fn is_held(&self) -> bool {
        self.state() == LockState::Held
    }

    /// Whether the record is released (terminal).
    pub fn is_released(&self) -> bool {
        self.state() == LockState::Released
    }

    /// Age of the record since it was requested.
    pub fn age(&self) -> Duration {
        Utc::now().signed_duration_since(self.requested_at)
    }

    /// How long the lock has been held, if it is held.
    pub fn held_for(&self) -> Option<Duration> {
        match self.state() {
            LockState::Held => self
                .acquired_at
                .map(|t| Utc::now().signed_duration_since(t)),
            _ => None,
        }
    }

    /// Whether a held lock exceeds the stale threshold in minutes.
    ///
    /// Pending and released records are never stale.
    pub fn is_stale(&self, stale_minutes: u32) -> bool {
        self.held_for()
            .is_some_and(|d| d.num_minutes() > stale_minutes as i64)
    }
}

impl std::fmt::Display for LockRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({} on {}, {}, age: {})",
            self.id,
            self.user_id,
            self.resource_id,
            self.state(),
            format_age(self.age())
        )
    }
}

/// Format a duration as a compact human-readable age string.
pub fn format_age(age: Duration) -> String {
    let minutes = age.num_minutes();
    let hours = age.num_hours();
    let days = age.num_days();

    if days > 0 {
        format!("{}d {}h", days, hours % 24)
    } else if hours > 0 {
        format!("{}h {}m", hours, minutes % 60)
    } else {
        format!("{}m", minutes)
    }
}

/// Validate and normalize a resource ID.
///
/// Accepts lowercase input (`res-001`) and returns the canonical uppercase
/// form. Valid IDs match `RES-NNN` with at least three digits.
pub fn validate_resource_id(id: &str) -> Result<String> {
    let normalized = id.to_uppercase();

    if !RESOURCE_ID_REGEX.is_match(&normalized) {
        return Err(InterlockError::UserError(format!(
            "invalid resource ID '{}': must be in the format RES-NNN (e.g., RES-001)",
            id
        )));
    }

    Ok(normalized)
}

/// Generate a resource ID from a number, zero-padded to at least 3 digits.
pub fn generate_resource_id(number: u64) -> String {
    format!("RES-{:03}", number)
}

/// Generate a lock ID from a number, zero-padded to at least 3 digits.
pub fn generate_lock_id(number: u64) -> String {
    format!("LCK-{:03}", number)
}

/// Extract the numeric part of a resource ID, if well-formed.
pub fn resource_number(id: &str) -> Option<u64> {
    id.strip_prefix("RES-").and_then(|n| n.parse().ok())
}

/// Extract the numeric part of a lock ID, if well-formed.
pub fn lock_number(id: &str) -> Option<u64> {
    id.strip_prefix("LCK-").and_then(|n| n.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(acquired: bool, released: bool) -> LockRecord {
        LockRecord {
            id: "LCK-001".to_string(),
            user_id: "alice@laptop".to_string(),
            resource_id: "RES-001".to_string(),
            requested_at: Utc::now(),
            acquired_at: acquired.then(Utc::now),
            released_at: released.then(Utc::now),
        }
    }

    #[test]
    fn state_derivation() {
        assert_eq!(record(false, false).state(), LockState::Pending);
        assert_eq!(record(true, false).state(), LockState::Held);
        assert_eq!(record(true, true).state(), LockState::Released);
        // A cancelled pending request is also terminal
        assert_eq!(record(false, true).state(), LockState::Released);
    }

    #[test]
    fn state_predicates() {
        assert!(record(false, false).is_pending());
        assert!(record(true, false).is_held());
        assert!(record(true, true).is_released());
        assert!(!record(true, false).is_released());
    }

    #[test]
    fn held_for_only_when_held() {
        assert!(record(false, false).held_for().is_none());
        assert!(record(true, true).held_for().is_none());
        assert!(record(true, false).held_for().is_some());
    }

    #[test]
    fn stale_detection() {
        let mut rec = record(true, false);
        assert!(!rec.is_stale(120));

        rec.acquired_at = Some(Utc::now() - Duration::minutes(150));
        assert!(rec.is_stale(120));

        // Pending records are never stale, however old
        let mut pending = record(false, false);
        pending.requested_at = Utc::now() - Duration::minutes(500);
        assert!(!pending.is_stale(120));
    }

    #[test]
    fn serialization_roundtrip_omits_unset_timestamps() {
        let rec = record(false, false);
        let json = serde_json::to_string(&rec).unwrap();

        assert!(!json.contains("acquired_at"));
        assert!(!json.contains("released_at"));

        let parsed: LockRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.state(), LockState::Pending);
    }

    #[test]
    fn display_includes_state() {
        let rec = record(true, false);
        let display = format!("{}", rec);
        assert!(display.contains("LCK-001"));
        assert!(display.contains("alice@laptop"));
        assert!(display.contains("held"));
    }

    #[test]
    fn format_age_units() {
        assert_eq!(format_age(Duration::minutes(5)), "5m");
        assert_eq!(format_age(Duration::minutes(125)), "2h 5m");
        assert_eq!(format_age(Duration::hours(50)), "2d 2h");
    }

    #[test]
    fn validate_resource_id_accepts_canonical_and_lowercase() {
        assert_eq!(validate_resource_id("RES-001").unwrap(), "RES-001");
        assert_eq!(validate_resource_id("res-042").unwrap(), "RES-042");
        assert_eq!(validate_resource_id("RES-1234").unwrap(), "RES-1234");
    }

    #[test]
    fn validate_resource_id_rejects_malformed() {
        assert!(validate_resource_id("RES-01").is_err());
        assert!(validate_resource_id("RES001").is_err());
        assert!(validate_resource_id("CMP-001").is_err());
        assert!(validate_resource_id("").is_err());
    }

    #[test]
    fn id_generation_zero_pads() {
        assert_eq!(generate_resource_id(1), "RES-001");
        assert_eq!(generate_resource_id(42), "RES-042");
        assert_eq!(generate_resource_id(1234), "RES-1234");
        assert_eq!(generate_lock_id(7), "LCK-007");
    }

    #[test]
    fn id_number_extraction() {
        assert_eq!(resource_number("RES-001"), Some(1));
        assert_eq!(resource_number("RES-1234"), Some(1234));
        assert_eq!(resource_number("LCK-001"), None);
        assert_eq!(lock_number("LCK-009"), Some(9));
        assert_eq!(lock_number("bogus"), None);
    }
}
