//! Lock ledger for interlock.
//!
//! The ledger is the authoritative record of resources, held locks, and
//! pending lock requests for a workspace. It lives in a single JSON document
//! (`.interlock/ledger.json`) that is rewritten atomically on every mutation,
//! so any plain read of the file is a consistent point-in-time snapshot.
//!
//! # Records
//!
//! A lock record moves through at most three states:
//! - **pending**: requested, not yet granted (`acquired_at` unset)
//! - **held**: granted and exclusive (`acquired_at` set, `released_at` unset)
//! - **released**: terminal; the record stays in the document as history
//!
//! For a given resource at most one record is held at any time.
//!
//! # Mutations
//!
//! Mutations are serialized between processes by an exclusive-create
//! mutation lock (`locks/ledger.lock`) managed through an RAII guard.
//! Commands acquire the guard, load a fresh document, apply the mutation,
//! and save; every save bumps the document's `revision`, which downstream
//! detection uses as its snapshot sequence number.

mod guard;
mod record;
mod store;


// Re-export public API
pub use guard::{MutationGuard, MutationLockMetadata, acquire_mutation_lock};
pub use record::{
    LockRecord, LockState, Resource, format_age, generate_lock_id, generate_resource_id,
    lock_number, resource_number, validate_resource_id,
};
pub use store::{Ledger, ReleaseOutcome, RequestOutcome};
