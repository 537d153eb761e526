//! Configuration model for interlock.
//!
//! This module defines the Config struct that represents `.interlock/config.yaml`.
//! It supports forward-compatible YAML parsing (unknown fields are ignored),
//! sensible defaults for optional fields, and validation of config values.

use crate::error::{InterlockError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Coefficients of the disruption score.
///
/// The score estimates how costly it is to preempt a user's lock when
/// breaking a deadlock; candidates are ranked ascending. The coefficients
/// are configuration, not contract. The only ordering guarantee the
/// advisor maintains is that, all else equal, a longer-idle user never
/// scores higher than a less-idle one, which holds for any non-negative
/// `idle` coefficient.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisruptionWeights {
    /// Weight of the user's role (higher role => more protected).
    pub role: f64,

    /// Weight of the inverse idle term (longer idle => cheaper to preempt).
    pub idle: f64,

    /// Weight per minute of session duration (longer session => more protected).
    pub session: f64,

    /// Weight per concurrently held lock (mid multi-resource work => more protected).
    pub held_locks: f64,
}

impl Default for DisruptionWeights {
    fn default() -> Self {
        Self {
            role: 10.0,
            idle: 5.0,
            session: 0.05,
            held_locks: 2.0,
        }
    }
}

/// Default role-name-to-weight table.
pub fn default_role_weights() -> HashMap<String, f64> {
    HashMap::from([
        ("viewer".to_string(), 1.0),
        ("editor".to_string(), 2.0),
        ("admin".to_string(), 4.0),
    ])
}

/// Configuration for an interlock workspace.
///
/// This struct represents the contents of `.interlock/config.yaml`.
/// Unknown fields in the YAML are ignored for forward compatibility.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // =========================================================================
    // Board limits
    // =========================================================================
    /// Maximum number of users the workspace is planned for.
    #[serde(default = "default_max_users")]
    pub max_users: u32,

    /// Maximum number of lockable resources the workspace is planned for.
    #[serde(default = "default_max_resources")]
    pub max_resources: u32,

    // =========================================================================
    // Lock settings
    // =========================================================================
    /// Minutes after which a held lock is flagged as stale.
    #[serde(default = "default_lock_stale_minutes")]
    pub lock_stale_minutes: u32,

    /// Whether releasing a resource grants its oldest pending request.
    #[serde(default = "default_true")]
    pub grant_pending_on_release: bool,

    // =========================================================================
    // Advisor settings
    // =========================================================================
    /// Role assigned to users on first contact.
    #[serde(default = "default_role")]
    pub default_role: String,

    /// Role-name-to-weight table used by the disruption score.
    #[serde(default = "default_role_weights")]
    pub role_weights: HashMap<String, f64>,

    /// Disruption score coefficients.
    #[serde(default)]
    pub disruption_weights: DisruptionWeights,
}

// Default value functions for serde
fn default_max_users() -> u32 {
    10
}
fn default_max_resources() -> u32 {
    20
}
fn default_lock_stale_minutes() -> u32 {
    120
}
fn default_role() -> String {
    "editor".to_string()
}
fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_users: default_max_users(),
            max_resources: default_max_resources(),
            lock_stale_minutes: default_lock_stale_minutes(),
            grant_pending_on_release: default_true(),
            default_role: default_role(),
            role_weights: default_role_weights(),
            disruption_weights: DisruptionWeights::default(),
        }
    }
}

impl Config {
    /// Load config from a YAML file.
    ///
    /// Unknown fields in the YAML are silently ignored for forward compatibility.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|e| {
            InterlockError::UserError(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml(&content)
    }

    /// Parse config from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)
            .map_err(|e| InterlockError::UserError(format!("failed to parse config YAML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Serialize config to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| {
            InterlockError::UserError(format!("failed to serialize config to YAML: {}", e))
        })
    }

    /// Validate config values and return error on invalid values.
    ///
    /// Validation rules:
    /// - `max_users`, `max_resources`, and `lock_stale_minutes` must be positive
    /// - `default_role` must be non-empty
    /// - role weights and disruption weights must be non-negative
    pub fn validate(&self) -> Result<()> {
        if self.max_users == 0 {
            return Err(InterlockError::UserError(
                "config validation failed: max_users must be greater than 0".to_string(),
            ));
        }

        if self.max_resources == 0 {
            return Err(InterlockError::UserError(
                "config validation failed: max_resources must be greater than 0".to_string(),
            ));
        }

        if self.lock_stale_minutes == 0 {
            return Err(InterlockError::UserError(
                "config validation failed: lock_stale_minutes must be greater than 0".to_string(),
            ));
        }

        if self.default_role.trim().is_empty() {
            return Err(InterlockError::UserError(
                "config validation failed: default_role must be non-empty".to_string(),
            ));
        }

        for (role, weight) in &self.role_weights {
            if role.trim().is_empty() {
                return Err(InterlockError::UserError(
                    "config validation failed: role_weights keys must be non-empty".to_string(),
                ));
            }
            if *weight < 0.0 || !weight.is_finite() {
                return Err(InterlockError::UserError(format!(
                    "config validation failed: role_weights['{}'] must be a non-negative number",
                    role
                )));
            }
        }

        let w = &self.disruption_weights;
        for (name, value) in [
            ("role", w.role),
            ("idle", w.idle),
            ("session", w.session),
            ("held_locks", w.held_locks),
        ] {
            if value < 0.0 || !value.is_finite() {
                return Err(InterlockError::UserError(format!(
                    "config validation failed: disruption_weights.{} must be a non-negative number",
                    name
                )));
            }
        }

        Ok(())
    }

    /// Resolve the weight for a role name.
    ///
    /// Unknown roles fall back to the default role's weight, then to 1.0.
    pub fn role_weight_for(&self, role: &str) -> f64 {
        self.role_weights
            .get(role)
            .or_else(|| self.role_weights.get(&self.default_role))
            .copied()
            .unwrap_or(1.0)
    }
}
