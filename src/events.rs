//! Event logging subsystem for interlock.
//!
//! This module implements append-only event logging to support audit and
//! reconstruction of lock history across collaborators. Events are stored in
//! NDJSON format (one JSON object per line) in `.interlock/events/events.ndjson`.
//!
//! # Event Format
//!
//! Each event is a JSON object with the following fields:
//! - `ts`: RFC3339 timestamp
//! - `action`: The action performed (init, lock_request, detection, etc.)
//! - `actor`: The actor string (e.g., `user@HOST`)
//! - `resource`: Optional resource ID for resource-specific events
//! - `details`: Freeform object with action-specific details
//!
//! Mutating commands append their event after the ledger write succeeds, so
//! the log trails the ledger rather than predicting it.

use crate::context::WorkspaceContext;
use crate::error::{InterlockError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::{self, OpenOptions};
use std::io::Write;

/// Actions that can be logged as events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventAction {
    /// Workspace initialization
    Init,
    /// Resource added to the workspace
    ResourceAdd,
    /// Lock requested but queued behind a holder
    LockRequest,
    /// Lock acquired (immediately or by promotion)
    LockAcquire,
    /// Lock released by its holder
    LockRelease,
    /// Pending lock promoted to held after a release
    LockPromote,
    /// Lock force-released by a third party
    LockClear,
    /// Detection verdict changed (deadlock appeared or cleared)
    Detection,
    /// Resolution recommendations generated
    Advise,
    /// User role changed
    UserRole,
    /// Scenario preset loaded into the ledger
    ScenarioLoad,
}

impl std::fmt::Display for EventAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventAction::Init => write!(f, "init"),
            EventAction::ResourceAdd => write!(f, "resource_add"),
            EventAction::LockRequest => write!(f, "lock_request"),
            EventAction::LockAcquire => write!(f, "lock_acquire"),
            EventAction::LockRelease => write!(f, "lock_release"),
            EventAction::LockPromote => write!(f, "lock_promote"),
            EventAction::LockClear => write!(f, "lock_clear"),
            EventAction::Detection => write!(f, "detection"),
            EventAction::Advise => write!(f, "advise"),
            EventAction::UserRole => write!(f, "user_role"),
            EventAction::ScenarioLoad => write!(f, "scenario_load"),
        }
    }
}

/// An event record for the audit log.
///
/// Events are serialized as single-line JSON objects and appended to
/// the events.ndjson file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// RFC3339 timestamp when the event occurred.
    pub ts: DateTime<Utc>,

    /// The action that was performed.
    pub action: EventAction,

    /// The actor who performed the action (e.g., `user@HOST`).
    pub actor: String,

    /// Optional resource ID for resource-specific events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,

    /// Freeform details object with action-specific information.
    pub details: Value,
}

impl Event {
    /// Create a new event with the given action and actor.
    ///
    /// The timestamp is set to the current time. The actor is passed in
    /// rather than read from the environment so that `--as` overrides
    /// flow through to the audit log.
    pub fn new(action: EventAction, actor: impl Into<String>) -> Self {
        Self {
            ts: Utc::now(),
            action,
            actor: actor.into(),
            resource: None,
            details: Value::Object(serde_json::Map::new()),
        }
    }

    /// Set the resource ID for this event.
    pub fn with_resource(mut self, resource_id: impl Into<String>) -> Self {
        self.resource = Some(resource_id.into());
        self
    }

    /// Set the details object for this event.
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }

    /// Serialize the event to a single-line JSON string.
    pub fn to_ndjson_line(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| {
            InterlockError::UserError(format!("failed to serialize event to JSON: {}", e))
        })
    }
}

/// Get the actor string for the current process.
///
/// Returns `user@host` derived from the environment; either side degrades
/// to `unknown` rather than failing.
pub fn current_actor() -> String {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string());

    let host = hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    format!("{}@{}", user, host)
}

/// Append an event to the events log.
///
/// This function appends the event as a single JSON line to the events.ndjson
/// file. The file is created if it doesn't exist. Each append results in one
/// line with a trailing newline.
pub fn append_event(ctx: &WorkspaceContext, event: &Event) -> Result<()> {
    let events_file = ctx.events_file();

    let json_line = event.to_ndjson_line()?;

    let events_dir = ctx.events_dir();
    if !events_dir.exists() {
        fs::create_dir_all(&events_dir).map_err(|e| {
            InterlockError::UserError(format!(
                "failed to create events directory '{}': {}",
                events_dir.display(),
                e
            ))
        })?;
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&events_file)
        .map_err(|e| {
            InterlockError::UserError(format!(
                "failed to open events file '{}': {}",
                events_file.display(),
                e
            ))
        })?;

    writeln!(file, "{}", json_line).map_err(|e| {
        InterlockError::UserError(format!(
            "failed to write event to '{}': {}",
            events_file.display(),
            e
        ))
    })?;

    file.sync_all().map_err(|e| {
        InterlockError::UserError(format!(
            "failed to sync events file '{}': {}",
            events_file.display(),
            e
        ))
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn create_test_workspace() -> (TempDir, WorkspaceContext) {
        let temp_dir = TempDir::new().unwrap();
        let ctx = WorkspaceContext::at_root(temp_dir.path());
        std::fs::create_dir_all(&ctx.state_dir).unwrap();
        (temp_dir, ctx)
    }

    #[test]
    fn test_event_creation() {
        let event = Event::new(EventAction::Init, "alice@laptop");

        assert_eq!(event.action, EventAction::Init);
        assert_eq!(event.actor, "alice@laptop");
        assert!(event.resource.is_none());
        // Timestamp should be recent (within last minute)
        let age = Utc::now().signed_duration_since(event.ts);
        assert!(age.num_minutes() < 1);
    }

    #[test]
    fn test_event_with_resource() {
        let event = Event::new(EventAction::LockAcquire, "alice@laptop").with_resource("RES-001");

        assert_eq!(event.action, EventAction::LockAcquire);
        assert_eq!(event.resource, Some("RES-001".to_string()));
    }

    #[test]
    fn test_event_serialization() {
        let event = Event::new(EventAction::LockRequest, "bob@desk")
            .with_resource("RES-002")
            .with_details(json!({"lock_id": "LCK-004", "queued_behind": "alice@laptop"}));

        let json_line = event.to_ndjson_line().unwrap();

        // Should be valid JSON
        let parsed: Event = serde_json::from_str(&json_line).unwrap();
        assert_eq!(parsed.action, EventAction::LockRequest);
        assert_eq!(parsed.resource, Some("RES-002".to_string()));
        assert_eq!(parsed.details["lock_id"], "LCK-004");

        // Should not contain newlines (single line)
        assert!(!json_line.contains('\n'));
    }

    #[test]
    fn test_event_action_serialization() {
        // Verify that actions serialize to snake_case
        let event = Event::new(EventAction::LockClear, "a@b");
        assert!(event.to_ndjson_line().unwrap().contains("\"lock_clear\""));

        let event = Event::new(EventAction::ScenarioLoad, "a@b");
        assert!(
            event
                .to_ndjson_line()
                .unwrap()
                .contains("\"scenario_load\"")
        );
    }

    #[test]
    fn test_event_without_resource_omits_field() {
        let event = Event::new(EventAction::Init, "a@b");
        let json_line = event.to_ndjson_line().unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&json_line).unwrap();
        assert!(parsed.get("resource").is_none());
    }

    #[test]
    fn test_append_event_creates_file() {
        let (_temp_dir, ctx) = create_test_workspace();
        let events_file = ctx.events_file();

        assert!(!events_file.exists());

        let event = Event::new(EventAction::Init, "alice@laptop");
        append_event(&ctx, &event).unwrap();

        assert!(events_file.exists());

        let content = fs::read_to_string(&events_file).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 1);

        let parsed: Event = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(parsed.action, EventAction::Init);
    }

    #[test]
    fn test_append_event_multiple_lines() {
        let (_temp_dir, ctx) = create_test_workspace();

        append_event(&ctx, &Event::new(EventAction::Init, "a@b")).unwrap();
        append_event(
            &ctx,
            &Event::new(EventAction::ResourceAdd, "a@b").with_resource("RES-001"),
        )
        .unwrap();

        let content = fs::read_to_string(ctx.events_file()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let parsed1: Event = serde_json::from_str(lines[0]).unwrap();
        let parsed2: Event = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(parsed1.action, EventAction::Init);
        assert_eq!(parsed2.action, EventAction::ResourceAdd);
        assert_eq!(parsed2.resource, Some("RES-001".to_string()));
    }

    #[test]
    fn test_append_event_trailing_newline() {
        let (_temp_dir, ctx) = create_test_workspace();

        append_event(&ctx, &Event::new(EventAction::Init, "a@b")).unwrap();

        let content = fs::read_to_string(ctx.events_file()).unwrap();
        assert!(content.ends_with('\n'));
    }

    #[test]
    fn test_current_actor_shape() {
        let actor = current_actor();
        assert!(actor.contains('@'));
        assert!(!actor.is_empty());
    }

    #[test]
    fn test_event_action_display() {
        assert_eq!(format!("{}", EventAction::Init), "init");
        assert_eq!(format!("{}", EventAction::ResourceAdd), "resource_add");
        assert_eq!(format!("{}", EventAction::LockRequest), "lock_request");
        assert_eq!(format!("{}", EventAction::LockAcquire), "lock_acquire");
        assert_eq!(format!("{}", EventAction::LockRelease), "lock_release");
        assert_eq!(format!("{}", EventAction::LockPromote), "lock_promote");
        assert_eq!(format!("{}", EventAction::LockClear), "lock_clear");
        assert_eq!(format!("{}", EventAction::Detection), "detection");
        assert_eq!(format!("{}", EventAction::Advise), "advise");
        assert_eq!(format!("{}", EventAction::UserRole), "user_role");
        assert_eq!(format!("{}", EventAction::ScenarioLoad), "scenario_load");
    }
}
