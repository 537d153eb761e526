//! Implementation of the `interlock scenario` commands.
//!
//! Ships the four example lock patterns as loadable presets for demos and
//! deadlock drills. Presets are written as per-user holds/requests lists
//! and reduced to ledger records on load: a "holds" entry becomes a lock
//! acquired now, a "requests" entry a pending request.

use crate::cli::ScenarioLoadArgs;
use crate::context::require_initialized_workspace;
use crate::error::{InterlockError, Result};
use crate::events::{Event, EventAction, append_event};
use crate::ledger::{
    Ledger, LockRecord, Resource, acquire_mutation_lock, generate_lock_id, generate_resource_id,
};
use chrono::{Duration, Utc};
use serde_json::json;

/// One collaborator's part in a scenario.
struct ScenarioUser {
    user_id: &'static str,
    /// Resource numbers this user holds.
    holds: &'static [u64],
    /// Resource numbers this user is waiting for.
    requests: &'static [u64],
}

/// A loadable example scenario.
struct Scenario {
    name: &'static str,
    description: &'static str,
    resource_count: u64,
    users: &'static [ScenarioUser],
}

/// The preset catalog.
const SCENARIOS: &[Scenario] = &[
    Scenario {
        name: "classic-deadlock",
        description: "Two users competing for two resources",
        resource_count: 2,
        users: &[
            ScenarioUser {
                user_id: "alice@demo",
                holds: &[1],
                requests: &[2],
            },
            ScenarioUser {
                user_id: "bob@demo",
                holds: &[2],
                requests: &[1],
            },
        ],
    },
    Scenario {
        name: "three-way-deadlock",
        description: "Three users in a circular wait",
        resource_count: 3,
        users: &[
            ScenarioUser {
                user_id: "alice@demo",
                holds: &[1],
                requests: &[2],
            },
            ScenarioUser {
                user_id: "bob@demo",
                holds: &[2],
                requests: &[3],
            },
            ScenarioUser {
                user_id: "carol@demo",
                holds: &[3],
                requests: &[1],
            },
        ],
    },
    Scenario {
        name: "safe-state",
        description: "Busy board with no circular dependencies",
        resource_count: 4,
        users: &[
            ScenarioUser {
                user_id: "alice@demo",
                holds: &[1],
                requests: &[2],
            },
            ScenarioUser {
                user_id: "bob@demo",
                holds: &[3],
                requests: &[4],
            },
            ScenarioUser {
                user_id: "carol@demo",
                holds: &[2],
                requests: &[],
            },
        ],
    },
    Scenario {
        name: "complex",
        description: "Mixed dependencies with one bystander",
        resource_count: 5,
        users: &[
            ScenarioUser {
                user_id: "alice@demo",
                holds: &[1, 2],
                requests: &[3],
            },
            ScenarioUser {
                user_id: "bob@demo",
                holds: &[3],
                requests: &[4],
            },
            ScenarioUser {
                user_id: "carol@demo",
                holds: &[4],
                requests: &[1],
            },
            ScenarioUser {
                user_id: "dave@demo",
                holds: &[5],
                requests: &[],
            },
        ],
    },
];

/// Execute the `interlock scenario list` command.
pub fn cmd_scenario_list() -> Result<()> {
    println!("Available scenarios:");
    println!();
    for scenario in SCENARIOS {
        println!("  {:<20} {}", scenario.name, scenario.description);
    }
    println!();
    println!("Load one with `interlock scenario load <name>`.");

    Ok(())
}

/// Execute the `interlock scenario load` command.
///
/// Replaces the ledger contents with the preset. Refuses to overwrite a
/// non-empty ledger unless `--force` is given.
pub fn cmd_scenario_load(args: ScenarioLoadArgs, actor: &str) -> Result<()> {
    let Some(scenario) = SCENARIOS.iter().find(|s| s.name == args.name) else {
        let names: Vec<&str> = SCENARIOS.iter().map(|s| s.name).collect();
        return Err(InterlockError::UserError(format!(
            "unknown scenario '{}'.\n\
             Available scenarios: {}",
            args.name,
            names.join(", ")
        )));
    };

    let ctx = require_initialized_workspace()?;

    let _mutation_lock = acquire_mutation_lock(&ctx, actor, "scenario_load")?;

    let mut ledger = Ledger::load(&ctx)?;
    if (!ledger.resources().is_empty() || !ledger.locks().is_empty()) && !args.force {
        return Err(InterlockError::UserError(
            "ledger is not empty; loading a scenario replaces all resources and locks.\n\n\
             Re-run with --force to overwrite."
                .to_string(),
        ));
    }

    let (resources, locks) = build_scenario(scenario);
    ledger.replace_contents(resources, locks);
    ledger.save(&ctx)?;

    let event = Event::new(EventAction::ScenarioLoad, actor).with_details(json!({
        "scenario": scenario.name,
        "resources": ledger.resources().len(),
        "locks": ledger.locks().len(),
        "forced": args.force,
    }));
    append_event(&ctx, &event)?;

    println!("Loaded scenario '{}': {}", scenario.name, scenario.description);
    println!(
        "  {} resource(s), {} lock record(s)",
        ledger.resources().len(),
        ledger.locks().len()
    );

    super::report_detection_after_mutation(&ctx)
}

/// Reduce a scenario's holds/requests lists to ledger records.
///
/// Timestamps are staggered so hold order (and therefore advisor
/// tie-breaking) is deterministic: earlier-listed users hold longer.
fn build_scenario(scenario: &Scenario) -> (Vec<Resource>, Vec<LockRecord>) {
    let now = Utc::now();

    let resources: Vec<Resource> = (1..=scenario.resource_count)
        .map(|n| Resource {
            id: generate_resource_id(n),
            title: format!("Demo Component {}", n),
        })
        .collect();

    let mut locks = Vec::new();
    let mut lock_number = 0u64;

    for (i, user) in scenario.users.iter().enumerate() {
        for &resource_number in user.holds {
            lock_number += 1;
            let acquired = now - Duration::minutes(60 - (i as i64) * 10);
            locks.push(LockRecord {
                id: generate_lock_id(lock_number),
                user_id: user.user_id.to_string(),
                resource_id: generate_resource_id(resource_number),
                requested_at: acquired,
                acquired_at: Some(acquired),
                released_at: None,
            });
        }
    }

    for (i, user) in scenario.users.iter().enumerate() {
        for &resource_number in user.requests {
            lock_number += 1;
            locks.push(LockRecord {
                id: generate_lock_id(lock_number),
                user_id: user.user_id.to_string(),
                resource_id: generate_resource_id(resource_number),
                requested_at: now - Duration::minutes(10 - (i as i64)),
                acquired_at: None,
                released_at: None,
            });
        }
    }

    (resources, locks)
}
