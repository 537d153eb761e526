//! Command implementations for interlock.
//!
//! This module provides the dispatcher that routes CLI commands to their
//! implementations, plus the small shared pieces every mutation command
//! uses: cycle formatting and the post-mutation detection pass.

mod advise;
mod detect_cmd;
mod graph_cmd;
mod init;
mod lock;
mod resource;
mod scenario;
mod status;
mod suggest;
mod user;
mod watch;

use crate::cli::{
    Command, LockAction, LockCommand, ResourceAction, ResourceCommand, ScenarioAction,
    ScenarioCommand, UserAction, UserCommand,
};
use crate::context::WorkspaceContext;
use crate::detect::{Coordinator, Cycle, Snapshot};
use crate::error::Result;
use crate::ledger::Ledger;

/// Dispatch a command to its implementation.
///
/// This is the main entry point for command execution. Each command
/// is routed to its handler function with the resolved acting user.
pub fn dispatch(command: Command, actor: &str) -> Result<()> {
    match command {
        Command::Init => init::cmd_init(actor),
        Command::Resource(resource_cmd) => dispatch_resource(resource_cmd, actor),
        Command::Lock(lock_cmd) => dispatch_lock(lock_cmd, actor),
        Command::Status => status::cmd_status(),
        Command::Detect(args) => detect_cmd::cmd_detect(args),
        Command::Advise(args) => advise::cmd_advise(args, actor),
        Command::Graph(args) => graph_cmd::cmd_graph(args),
        Command::Suggest => suggest::cmd_suggest(),
        Command::User(user_cmd) => dispatch_user(user_cmd, actor),
        Command::Scenario(scenario_cmd) => dispatch_scenario(scenario_cmd, actor),
        Command::Watch(args) => watch::cmd_watch(args, actor),
    }
}

/// Dispatch resource subcommands.
fn dispatch_resource(resource_cmd: ResourceCommand, actor: &str) -> Result<()> {
    match resource_cmd.action {
        ResourceAction::Add(args) => resource::cmd_resource_add(args, actor),
        ResourceAction::List => resource::cmd_resource_list(),
    }
}

/// Dispatch lock subcommands.
fn dispatch_lock(lock_cmd: LockCommand, actor: &str) -> Result<()> {
    match lock_cmd.action {
        LockAction::Request(args) => lock::cmd_lock_request(args, actor),
        LockAction::Release(args) => lock::cmd_lock_release(args, actor),
        LockAction::List => lock::cmd_lock_list(),
        LockAction::Clear(args) => lock::cmd_lock_clear(args, actor),
    }
}

/// Dispatch user subcommands.
fn dispatch_user(user_cmd: UserCommand, actor: &str) -> Result<()> {
    match user_cmd.action {
        UserAction::List => user::cmd_user_list(),
        UserAction::Role(args) => user::cmd_user_role(args, actor),
    }
}

/// Dispatch scenario subcommands.
fn dispatch_scenario(scenario_cmd: ScenarioCommand, actor: &str) -> Result<()> {
    match scenario_cmd.action {
        ScenarioAction::List => scenario::cmd_scenario_list(),
        ScenarioAction::Load(args) => scenario::cmd_scenario_load(args, actor),
    }
}

/// Render a cycle as a readable walk, e.g. `alice -> RES-002 -> bob -> RES-001 -> alice`.
pub(crate) fn format_cycle(cycle: &Cycle) -> String {
    cycle
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Run one detection pass after a ledger mutation and report the verdict.
///
/// Mutation commands are the coordinator's change notifications in CLI
/// form: notify, drain against a fresh snapshot, and surface the outcome.
/// Only a deadlock verdict is printed here; quiet success stays quiet.
pub(crate) fn report_detection_after_mutation(ctx: &WorkspaceContext) -> Result<()> {
    let coordinator = Coordinator::new();
    coordinator.notify_changed();

    let published =
        coordinator.run_pending(|| Ledger::load(ctx).map(|ledger| Snapshot::from(&ledger)))?;

    if let Some(published) = published {
        for warning in &published.evaluation.warnings {
            eprintln!("Warning: {}", warning);
        }

        let result = &published.evaluation.result;
        if result.has_deadlock {
            println!();
            println!("{}", result.message);
            for (i, cycle) in result.cycles.iter().enumerate() {
                println!("  Cycle {}: {}", i + 1, format_cycle(cycle));
            }
            println!();
            println!("Run `interlock advise` for ranked resolution recommendations.");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::NodeId;

    #[test]
    fn format_cycle_renders_closed_walk() {
        let cycle: Cycle = vec![
            NodeId::User("alice@laptop".to_string()),
            NodeId::Resource("RES-002".to_string()),
            NodeId::User("bob@desk".to_string()),
            NodeId::Resource("RES-001".to_string()),
            NodeId::User("alice@laptop".to_string()),
        ];

        assert_eq!(
            format_cycle(&cycle),
            "alice@laptop -> RES-002 -> bob@desk -> RES-001 -> alice@laptop"
        );
    }
}
