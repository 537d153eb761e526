//! Ledger document loading, snapshots, and mutations.

use super::record::{
    LockRecord, Resource, generate_lock_id, generate_resource_id, lock_number, resource_number,
};
use crate::config::Config;
use crate::context::WorkspaceContext;
use crate::error::{InterlockError, Result};
use crate::fs::atomic_write_file;
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Current on-disk document version.
const LEDGER_VERSION: u32 = 1;

/// The on-disk ledger document.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct LedgerDocument {
    version: u32,
    /// Monotonically increasing mutation counter; bumped on every save.
    revision: u64,
    resources: Vec<Resource>,
    locks: Vec<LockRecord>,
}

impl LedgerDocument {
    fn empty() -> Self {
        Self {
            version: LEDGER_VERSION,
            revision: 0,
            resources: Vec::new(),
            locks: Vec::new(),
        }
    }
}

/// Outcome of a lock request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOutcome {
    /// The resource was free; the lock was granted immediately.
    Acquired(LockRecord),
    /// The resource is held by someone else; the request is queued.
    Queued {
        record: LockRecord,
        holder: String,
    },
}

/// Outcome of a release (voluntary or forced).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseOutcome {
    /// The record that was released.
    pub released: LockRecord,
    /// The pending request promoted to held, if any.
    pub promoted: Option<LockRecord>,
}

/// In-memory view of the ledger document.
///
/// Loading produces a consistent point-in-time snapshot (the document is
/// replaced atomically on disk). Mutating methods operate on the in-memory
/// copy; callers persist with [`Ledger::save`] while holding the mutation
/// lock from [`super::acquire_mutation_lock`].
#[derive(Debug, Clone)]
pub struct Ledger {
    doc: LedgerDocument,
}

impl Ledger {
    /// Create an empty ledger (used by `init` and scenario loading).
    pub fn new() -> Self {
        Self {
            doc: LedgerDocument::empty(),
        }
    }

    /// Load the ledger document from the workspace.
    pub fn load(ctx: &WorkspaceContext) -> Result<Self> {
        let path = ctx.ledger_path();

        let content = std::fs::read_to_string(&path).map_err(|e| {
            InterlockError::LedgerError(format!(
                "failed to read ledger '{}': {}",
                path.display(),
                e
            ))
        })?;

        let doc: LedgerDocument = serde_json::from_str(&content).map_err(|e| {
            InterlockError::LedgerError(format!(
                "failed to parse ledger '{}': {}",
                path.display(),
                e
            ))
        })?;

        if doc.version != LEDGER_VERSION {
            return Err(InterlockError::LedgerError(format!(
                "unsupported ledger version {} in '{}' (expected {})",
                doc.version,
                path.display(),
                LEDGER_VERSION
            )));
        }

        Ok(Self { doc })
    }

    /// Read only the revision counter of the on-disk document.
    ///
    /// Used by the watch loop to decide whether a change notification is due
    /// without deserializing the full record set into a new snapshot.
    pub fn peek_revision(ctx: &WorkspaceContext) -> Result<u64> {
        #[derive(Deserialize)]
        struct RevisionOnly {
            revision: u64,
        }

        let path = ctx.ledger_path();
        let content = std::fs::read_to_string(&path).map_err(|e| {
            InterlockError::LedgerError(format!(
                "failed to read ledger '{}': {}",
                path.display(),
                e
            ))
        })?;

        let head: RevisionOnly = serde_json::from_str(&content).map_err(|e| {
            InterlockError::LedgerError(format!(
                "failed to parse ledger '{}': {}",
                path.display(),
                e
            ))
        })?;

        Ok(head.revision)
    }

    /// Persist the document, bumping its revision.
    pub fn save(&mut self, ctx: &WorkspaceContext) -> Result<()> {
        self.doc.revision += 1;

        let json = serde_json::to_string_pretty(&self.doc).map_err(|e| {
            InterlockError::LedgerError(format!("failed to serialize ledger: {}", e))
        })?;

        atomic_write_file(ctx.ledger_path(), &json)
    }

    /// The snapshot sequence number of this view.
    pub fn revision(&self) -> u64 {
        self.doc.revision
    }

    /// All resources in the workspace.
    pub fn resources(&self) -> &[Resource] {
        &self.doc.resources
    }

    /// All lock records, including released history.
    pub fn locks(&self) -> &[LockRecord] {
        &self.doc.locks
    }

    /// All unreleased lock records (held and pending).
    pub fn active_locks(&self) -> Vec<&LockRecord> {
        self.doc.locks.iter().filter(|l| !l.is_released()).collect()
    }

    /// Look up a resource by ID.
    pub fn resource(&self, resource_id: &str) -> Option<&Resource> {
        self.doc.resources.iter().find(|r| r.id == resource_id)
    }

    /// The record currently holding a resource, if any.
    pub fn holder_of(&self, resource_id: &str) -> Option<&LockRecord> {
        self.doc
            .locks
            .iter()
            .find(|l| l.resource_id == resource_id && l.is_held())
    }

    /// Pending requests for a resource, oldest first.
    pub fn pending_for(&self, resource_id: &str) -> Vec<&LockRecord> {
        let mut pending: Vec<&LockRecord> = self
            .doc
            .locks
            .iter()
            .filter(|l| l.resource_id == resource_id && l.is_pending())
            .collect();
        pending.sort_by(|a, b| {
            a.requested_at
                .cmp(&b.requested_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        pending
    }

    /// Distinct users with at least one unreleased record.
    pub fn active_users(&self) -> Vec<String> {
        let mut users: Vec<String> = Vec::new();
        for lock in self.active_locks() {
            if !users.contains(&lock.user_id) {
                users.push(lock.user_id.clone());
            }
        }
        users
    }

    /// Next free resource number (monotonic over all history).
    fn next_resource_number(&self) -> u64 {
        self.doc
            .resources
            .iter()
            .filter_map(|r| resource_number(&r.id))
            .max()
            .unwrap_or(0)
            + 1
    }

    /// Next free lock number (monotonic over all history, including released).
    fn next_lock_number(&self) -> u64 {
        self.doc
            .locks
            .iter()
            .filter_map(|l| lock_number(&l.id))
            .max()
            .unwrap_or(0)
            + 1
    }

    /// Add a resource with a generated ID.
    ///
    /// Fails when the configured `max_resources` limit is reached.
    pub fn add_resource(&mut self, config: &Config, title: &str) -> Result<Resource> {
        let title = title.trim();
        if title.is_empty() {
            return Err(InterlockError::UserError(
                "resource title must be non-empty".to_string(),
            ));
        }

        if self.doc.resources.len() >= config.max_resources as usize {
            return Err(InterlockError::UserError(format!(
                "resource limit reached ({} of {}).\n\
                 Raise max_resources in config.yaml to allow more.",
                self.doc.resources.len(),
                config.max_resources
            )));
        }

        let resource = Resource {
            id: generate_resource_id(self.next_resource_number()),
            title: title.to_string(),
        };
        self.doc.resources.push(resource.clone());
        Ok(resource)
    }

    /// Request an exclusive lock on a resource for a user.
    ///
    /// A request on a free resource is granted immediately; a request on a
    /// resource held by someone else is queued as a pending record. A user
    /// cannot hold and request the same resource twice.
    pub fn request_lock(&mut self, user_id: &str, resource_id: &str) -> Result<RequestOutcome> {
        if self.resource(resource_id).is_none() {
            return Err(InterlockError::UserError(format!(
                "resource '{}' not found.\n\
                 Use `interlock resource list` to see available resources.",
                resource_id
            )));
        }

        for lock in &self.doc.locks {
            if lock.resource_id == resource_id && lock.user_id == user_id {
                match lock.state() {
                    super::LockState::Held => {
                        return Err(InterlockError::UserError(format!(
                            "you already hold '{}' (lock {})",
                            resource_id, lock.id
                        )));
                    }
                    super::LockState::Pending => {
                        return Err(InterlockError::UserError(format!(
                            "you already have a pending request for '{}' (lock {})",
                            resource_id, lock.id
                        )));
                    }
                    super::LockState::Released => {}
                }
            }
        }

        let now = Utc::now();
        let holder = self.holder_of(resource_id).map(|l| l.user_id.clone());

        let record = LockRecord {
            id: generate_lock_id(self.next_lock_number()),
            user_id: user_id.to_string(),
            resource_id: resource_id.to_string(),
            requested_at: now,
            // Free resource: the request is a wait condition for nobody and
            // is granted on the spot.
            acquired_at: holder.is_none().then_some(now),
            released_at: None,
        };
        self.doc.locks.push(record.clone());

        match holder {
            None => Ok(RequestOutcome::Acquired(record)),
            Some(holder) => Ok(RequestOutcome::Queued { record, holder }),
        }
    }

    /// Release the caller's lock on a resource.
    ///
    /// Releases a held lock, or cancels the caller's pending request when
    /// they do not hold the resource. Releasing a held resource promotes the
    /// oldest pending request when `grant_pending` is set.
    pub fn release_lock(
        &mut self,
        user_id: &str,
        resource_id: &str,
        grant_pending: bool,
    ) -> Result<ReleaseOutcome> {
        let position = self
            .doc
            .locks
            .iter()
            .position(|l| l.resource_id == resource_id && l.user_id == user_id && l.is_held())
            .or_else(|| {
                self.doc.locks.iter().position(|l| {
                    l.resource_id == resource_id && l.user_id == user_id && l.is_pending()
                })
            });

        let Some(position) = position else {
            return Err(InterlockError::UserError(format!(
                "no active lock or request on '{}' for '{}'",
                resource_id, user_id
            )));
        };

        self.finish_release(position, grant_pending)
    }

    /// Force-release a lock by lock ID, regardless of owner.
    ///
    /// This is the application path for resolution recommendations: the
    /// advisor names a `target_lock_id`, and any collaborator (or an
    /// automation acting on their behalf) applies it here.
    pub fn force_release(&mut self, lock_id: &str, grant_pending: bool) -> Result<ReleaseOutcome> {
        let Some(position) = self
            .doc
            .locks
            .iter()
            .position(|l| l.id == lock_id && !l.is_released())
        else {
            return Err(InterlockError::UserError(format!(
                "no active lock '{}'.\n\
                 Use `interlock lock list` to see active locks.",
                lock_id
            )));
        };

        self.finish_release(position, grant_pending)
    }

    /// Mark the record at `position` released and promote the next pending
    /// request when the released record actually held the resource.
    fn finish_release(&mut self, position: usize, grant_pending: bool) -> Result<ReleaseOutcome> {
        let now = Utc::now();
        let was_held = self.doc.locks[position].is_held();
        self.doc.locks[position].released_at = Some(now);
        let released = self.doc.locks[position].clone();

        let mut promoted = None;
        if was_held && grant_pending {
            let next_id = self
                .pending_for(&released.resource_id)
                .first()
                .map(|l| l.id.clone());

            if let Some(next_id) = next_id
                && let Some(next) = self.doc.locks.iter_mut().find(|l| l.id == next_id)
            {
                next.acquired_at = Some(now);
                promoted = Some(next.clone());
            }
        }

        Ok(ReleaseOutcome { released, promoted })
    }

    /// Replace the entire contents of the ledger (scenario loading).
    ///
    /// The revision counter is preserved so watchers still observe a
    /// monotonic sequence across the reset.
    pub fn replace_contents(&mut self, resources: Vec<Resource>, locks: Vec<LockRecord>) {
        self.doc.resources = resources;
        self.doc.locks = locks;
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}
