//! User activity profiles.
//!
//! Profiles back the resolution advisor's metadata: who has which role,
//! when their session started, and when they last did anything. They are
//! persisted to `.interlock/profiles.json` and updated as a side effect of
//! lock commands (each mutation "touches" the acting user).
//!
//! Profiles are advisory. A missing profiles file or a user without an
//! entry degrades to default activity in the advisor, never to an error.

use crate::config::Config;
use crate::context::WorkspaceContext;
use crate::detect::UserActivity;
use crate::error::{InterlockError, Result};
use crate::fs::atomic_write_file;
use crate::ledger::LockRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Current on-disk document version.
const PROFILES_VERSION: u32 = 1;

/// One user's profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Role name, resolved to a weight through the config's role table.
    pub role: String,

    /// When the user first touched this workspace.
    pub session_started_at: DateTime<Utc>,

    /// When the user last performed an action.
    pub last_seen_at: DateTime<Utc>,
}

/// The on-disk profiles document.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ProfilesDocument {
    version: u32,
    users: BTreeMap<String, UserProfile>,
}

/// Profile store for a workspace.
#[derive(Debug, Clone)]
pub struct Profiles {
    doc: ProfilesDocument,
}

impl Profiles {
    /// Create an empty profile store.
    pub fn new() -> Self {
        Self {
            doc: ProfilesDocument {
                version: PROFILES_VERSION,
                users: BTreeMap::new(),
            },
        }
    }

    /// Load profiles from the workspace.
    ///
    /// A missing file yields an empty store; a corrupt or wrong-version file
    /// is an error (it holds collaborator state that should not be silently
    /// discarded).
    pub fn load(ctx: &WorkspaceContext) -> Result<Self> {
        let path = ctx.profiles_path();

        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::new()),
            Err(e) => {
                return Err(InterlockError::LedgerError(format!(
                    "failed to read profiles '{}': {}",
                    path.display(),
                    e
                )));
            }
        };

        let doc: ProfilesDocument = serde_json::from_str(&content).map_err(|e| {
            InterlockError::LedgerError(format!(
                "failed to parse profiles '{}': {}",
                path.display(),
                e
            ))
        })?;

        if doc.version != PROFILES_VERSION {
            return Err(InterlockError::LedgerError(format!(
                "unsupported profiles version {} in '{}' (expected {})",
                doc.version,
                path.display(),
                PROFILES_VERSION
            )));
        }

        Ok(Self { doc })
    }

    /// Persist the profiles document.
    pub fn save(&self, ctx: &WorkspaceContext) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.doc).map_err(|e| {
            InterlockError::LedgerError(format!("failed to serialize profiles: {}", e))
        })?;

        atomic_write_file(ctx.profiles_path(), &json)
    }

    /// Look up a user's profile.
    pub fn get(&self, user_id: &str) -> Option<&UserProfile> {
        self.doc.users.get(user_id)
    }

    /// All profiles, keyed by user ID, in stable order.
    pub fn all(&self) -> impl Iterator<Item = (&String, &UserProfile)> {
        self.doc.users.iter()
    }

    /// Number of known users.
    pub fn len(&self) -> usize {
        self.doc.users.len()
    }

    /// Whether no users are known.
    pub fn is_empty(&self) -> bool {
        self.doc.users.is_empty()
    }

    /// Record activity for a user, creating the profile on first contact.
    ///
    /// New users get the configured default role and a session starting now.
    /// Creation fails when the `max_users` limit is already reached.
    pub fn touch(&mut self, config: &Config, user_id: &str) -> Result<&UserProfile> {
        let now = Utc::now();

        if !self.doc.users.contains_key(user_id) {
            if self.doc.users.len() >= config.max_users as usize {
                return Err(InterlockError::UserError(format!(
                    "user limit reached ({} of {}).\n\
                     Raise max_users in config.yaml to allow more collaborators.",
                    self.doc.users.len(),
                    config.max_users
                )));
            }

            self.doc.users.insert(
                user_id.to_string(),
                UserProfile {
                    role: config.default_role.clone(),
                    session_started_at: now,
                    last_seen_at: now,
                },
            );
        } else if let Some(profile) = self.doc.users.get_mut(user_id) {
            profile.last_seen_at = now;
        }

        Ok(&self.doc.users[user_id])
    }

    /// Set a user's role, creating the profile if needed.
    ///
    /// The role name does not have to appear in the config's weight table;
    /// unknown roles resolve to the default weight at scoring time.
    pub fn set_role(&mut self, config: &Config, user_id: &str, role: &str) -> Result<()> {
        let role = role.trim();
        if role.is_empty() {
            return Err(InterlockError::UserError(
                "role must be non-empty".to_string(),
            ));
        }

        if let Some(profile) = self.doc.users.get_mut(user_id) {
            profile.role = role.to_string();
            return Ok(());
        }

        self.touch(config, user_id)?;
        if let Some(profile) = self.doc.users.get_mut(user_id) {
            profile.role = role.to_string();
        }
        Ok(())
    }
}

impl Default for Profiles {
    fn default() -> Self {
        Self::new()
    }
}

/// Assemble the advisor's per-user activity metadata.
///
/// Covers every user with an unreleased lock record: profile-backed idle
/// and session durations where a profile exists, defaults otherwise, and
/// held-lock counts straight from the snapshot.
pub fn activity_map(
    profiles: &Profiles,
    config: &Config,
    locks: &[LockRecord],
) -> HashMap<String, UserActivity> {
    let now = Utc::now();
    let mut map: HashMap<String, UserActivity> = HashMap::new();

    for lock in locks {
        if lock.is_released() {
            continue;
        }

        let entry = map
            .entry(lock.user_id.clone())
            .or_insert_with(|| match profiles.get(&lock.user_id) {
                Some(profile) => UserActivity {
                    role_weight: config.role_weight_for(&profile.role),
                    idle: now.signed_duration_since(profile.last_seen_at),
                    session: now.signed_duration_since(profile.session_started_at),
                    active_locks: 0,
                },
                None => UserActivity {
                    role_weight: config.role_weight_for(&config.default_role),
                    ..UserActivity::default()
                },
            });

        if lock.is_held() {
            entry.active_locks += 1;
        }
    }

    map
}
