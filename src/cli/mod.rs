//! CLI argument parsing for interlock.
//!
//! Uses clap derive macros for declarative argument definitions.
//! This module defines the command structure; actual implementations
//! are in the `commands` module.

use clap::{Parser, Subcommand};

/// Interlock: deadlock-aware collaborative lock coordinator for shared workspaces.
///
/// Collaborators place exclusive locks on shared components through a file
/// ledger inside the workspace:
/// - `.interlock/ledger.json` is the authoritative lock record
/// - every mutation re-runs deadlock detection over the wait-for graph
/// - detected circular waits come with ranked release recommendations
#[derive(Parser, Debug)]
#[command(name = "interlock")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Act as this user instead of the current `user@host` identity.
    ///
    /// Intended for shared automation and for exercising multi-user
    /// scenarios from a single machine; identity is cooperative.
    #[arg(long = "as", global = true, value_name = "USER")]
    pub acting_user: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands for interlock.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Initialize an interlock workspace in the current directory.
    ///
    /// Creates the `.interlock/` state directory with an empty ledger
    /// and a default configuration.
    Init,

    /// Resource management commands.
    ///
    /// Add lockable components or list them with their lock state.
    Resource(ResourceCommand),

    /// Lock management commands.
    ///
    /// Request, release, list, or force-clear locks on resources.
    Lock(LockCommand),

    /// Show workspace status summary.
    ///
    /// Displays resource/user/lock counts, stale locks, and the current
    /// detection verdict.
    Status,

    /// Run deadlock detection over the current ledger.
    ///
    /// Prints the verdict and every circular wait found.
    Detect(DetectArgs),

    /// Rank resolution recommendations for detected deadlocks.
    ///
    /// For every cycle, scores the candidate locks to preempt and prints
    /// them cheapest-first.
    Advise(AdviseArgs),

    /// Dump the current wait-for graph.
    ///
    /// Plain text by default; `--dot` emits Graphviz.
    Graph(GraphArgs),

    /// Print the advice-service summary and prompt.
    ///
    /// Emits the structured board summary and the prompt an external
    /// assistant would receive; text generation itself is external.
    Suggest,

    /// User profile commands.
    ///
    /// List collaborators or assign roles used by the disruption score.
    User(UserCommand),

    /// Example scenario commands.
    ///
    /// Seed the ledger with preset lock patterns for demos and drills.
    Scenario(ScenarioCommand),

    /// Detection loop: watch the ledger and re-evaluate on change.
    ///
    /// Polls the ledger revision, coalesces bursts of changes into one
    /// evaluation against the latest snapshot, and reports verdict changes.
    /// (Alias: `monitor`)
    #[command(alias = "monitor")]
    Watch(WatchArgs),
}

/// Resource subcommands.
#[derive(Parser, Debug)]
pub struct ResourceCommand {
    #[command(subcommand)]
    pub action: ResourceAction,
}

/// Available resource actions.
#[derive(Subcommand, Debug)]
pub enum ResourceAction {
    /// Add a lockable resource to the workspace.
    Add(ResourceAddArgs),

    /// List resources with their current lock state.
    List,
}

/// Arguments for the `resource add` command.
#[derive(Parser, Debug)]
pub struct ResourceAddArgs {
    /// Display title for the new resource.
    pub title: String,
}

/// Lock subcommands.
#[derive(Parser, Debug)]
pub struct LockCommand {
    #[command(subcommand)]
    pub action: LockAction,
}

/// Available lock actions.
#[derive(Subcommand, Debug)]
pub enum LockAction {
    /// Request an exclusive lock on a resource.
    ///
    /// Granted immediately when the resource is free, queued otherwise.
    Request(LockRequestArgs),

    /// Release your lock on a resource (or cancel your pending request).
    Release(LockReleaseArgs),

    /// List all active locks and pending requests.
    List,

    /// Force-release a lock by lock ID, regardless of owner.
    ///
    /// This is how a resolution recommendation is applied.
    /// Requires --force to prevent accidental preemption.
    Clear(LockClearArgs),
}

/// Arguments for the `lock request` command.
#[derive(Parser, Debug)]
pub struct LockRequestArgs {
    /// Resource ID to lock (e.g., RES-001).
    pub resource_id: String,
}

/// Arguments for the `lock release` command.
#[derive(Parser, Debug)]
pub struct LockReleaseArgs {
    /// Resource ID to release (e.g., RES-001).
    pub resource_id: String,
}

/// Arguments for the `lock clear` command.
#[derive(Parser, Debug)]
pub struct LockClearArgs {
    /// Lock ID to force-release (e.g., LCK-003).
    pub lock_id: String,

    /// Force the release (required for safety).
    #[arg(long)]
    pub force: bool,
}

/// Arguments for the `detect` command.
#[derive(Parser, Debug)]
pub struct DetectArgs {
    /// Emit the detection result as JSON.
    #[arg(long)]
    pub json: bool,

    /// Exit with a dedicated non-zero code when a deadlock is present.
    #[arg(long)]
    pub check: bool,
}

/// Arguments for the `advise` command.
#[derive(Parser, Debug)]
pub struct AdviseArgs {
    /// Emit the recommendation report as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `graph` command.
#[derive(Parser, Debug)]
pub struct GraphArgs {
    /// Emit Graphviz DOT instead of plain text.
    #[arg(long)]
    pub dot: bool,
}

/// User subcommands.
#[derive(Parser, Debug)]
pub struct UserCommand {
    #[command(subcommand)]
    pub action: UserAction,
}

/// Available user actions.
#[derive(Subcommand, Debug)]
pub enum UserAction {
    /// List known collaborators with their roles and activity.
    List,

    /// Assign a role to a user.
    Role(UserRoleArgs),
}

/// Arguments for the `user role` command.
#[derive(Parser, Debug)]
pub struct UserRoleArgs {
    /// User ID (e.g., alice@laptop).
    pub user_id: String,

    /// Role name (resolved to a weight through config role_weights).
    pub role: String,
}

/// Scenario subcommands.
#[derive(Parser, Debug)]
pub struct ScenarioCommand {
    #[command(subcommand)]
    pub action: ScenarioAction,
}

/// Available scenario actions.
#[derive(Subcommand, Debug)]
pub enum ScenarioAction {
    /// List available example scenarios.
    List,

    /// Replace the ledger with a preset scenario.
    Load(ScenarioLoadArgs),
}

/// Arguments for the `scenario load` command.
#[derive(Parser, Debug)]
pub struct ScenarioLoadArgs {
    /// Scenario name (see `interlock scenario list`).
    pub name: String,

    /// Overwrite a non-empty ledger (required when locks or resources exist).
    #[arg(long)]
    pub force: bool,
}

/// Arguments for the `watch` command.
#[derive(Parser, Debug)]
pub struct WatchArgs {
    /// Poll interval in milliseconds.
    #[arg(long, default_value_t = 2000)]
    pub interval_ms: u64,

    /// Run a single iteration and exit.
    #[arg(long)]
    pub once: bool,
}

impl Cli {
    /// Parse command line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_debug_assert() {
        // Verifies the CLI arguments configuration is valid
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_init() {
        let cli = Cli::try_parse_from(["interlock", "init"]).unwrap();
        assert!(matches!(cli.command, Command::Init));
        assert!(cli.acting_user.is_none());
    }

    #[test]
    fn parse_global_as_flag() {
        let cli =
            Cli::try_parse_from(["interlock", "lock", "request", "RES-001", "--as", "bob@desk"])
                .unwrap();
        assert_eq!(cli.acting_user, Some("bob@desk".to_string()));
    }

    #[test]
    fn parse_resource_add() {
        let cli = Cli::try_parse_from(["interlock", "resource", "add", "Login Form"]).unwrap();
        if let Command::Resource(resource_cmd) = cli.command {
            if let ResourceAction::Add(args) = resource_cmd.action {
                assert_eq!(args.title, "Login Form");
            } else {
                panic!("Expected Add action");
            }
        } else {
            panic!("Expected Resource command");
        }
    }

    #[test]
    fn parse_resource_list() {
        let cli = Cli::try_parse_from(["interlock", "resource", "list"]).unwrap();
        if let Command::Resource(resource_cmd) = cli.command {
            assert!(matches!(resource_cmd.action, ResourceAction::List));
        } else {
            panic!("Expected Resource command");
        }
    }

    #[test]
    fn parse_lock_request() {
        let cli = Cli::try_parse_from(["interlock", "lock", "request", "RES-001"]).unwrap();
        if let Command::Lock(lock_cmd) = cli.command {
            if let LockAction::Request(args) = lock_cmd.action {
                assert_eq!(args.resource_id, "RES-001");
            } else {
                panic!("Expected Request action");
            }
        } else {
            panic!("Expected Lock command");
        }
    }

    #[test]
    fn parse_lock_release() {
        let cli = Cli::try_parse_from(["interlock", "lock", "release", "RES-002"]).unwrap();
        if let Command::Lock(lock_cmd) = cli.command {
            if let LockAction::Release(args) = lock_cmd.action {
                assert_eq!(args.resource_id, "RES-002");
            } else {
                panic!("Expected Release action");
            }
        } else {
            panic!("Expected Lock command");
        }
    }

    #[test]
    fn parse_lock_list() {
        let cli = Cli::try_parse_from(["interlock", "lock", "list"]).unwrap();
        if let Command::Lock(lock_cmd) = cli.command {
            assert!(matches!(lock_cmd.action, LockAction::List));
        } else {
            panic!("Expected Lock command");
        }
    }

    #[test]
    fn parse_lock_clear() {
        let cli = Cli::try_parse_from(["interlock", "lock", "clear", "LCK-003", "--force"]).unwrap();
        if let Command::Lock(lock_cmd) = cli.command {
            if let LockAction::Clear(args) = lock_cmd.action {
                assert_eq!(args.lock_id, "LCK-003");
                assert!(args.force);
            } else {
                panic!("Expected Clear action");
            }
        } else {
            panic!("Expected Lock command");
        }
    }

    #[test]
    fn parse_status() {
        let cli = Cli::try_parse_from(["interlock", "status"]).unwrap();
        assert!(matches!(cli.command, Command::Status));
    }

    #[test]
    fn parse_detect_defaults() {
        let cli = Cli::try_parse_from(["interlock", "detect"]).unwrap();
        if let Command::Detect(args) = cli.command {
            assert!(!args.json);
            assert!(!args.check);
        } else {
            panic!("Expected Detect command");
        }
    }

    #[test]
    fn parse_detect_check_json() {
        let cli = Cli::try_parse_from(["interlock", "detect", "--check", "--json"]).unwrap();
        if let Command::Detect(args) = cli.command {
            assert!(args.json);
            assert!(args.check);
        } else {
            panic!("Expected Detect command");
        }
    }

    #[test]
    fn parse_advise() {
        let cli = Cli::try_parse_from(["interlock", "advise", "--json"]).unwrap();
        if let Command::Advise(args) = cli.command {
            assert!(args.json);
        } else {
            panic!("Expected Advise command");
        }
    }

    #[test]
    fn parse_graph_dot() {
        let cli = Cli::try_parse_from(["interlock", "graph", "--dot"]).unwrap();
        if let Command::Graph(args) = cli.command {
            assert!(args.dot);
        } else {
            panic!("Expected Graph command");
        }
    }

    #[test]
    fn parse_suggest() {
        let cli = Cli::try_parse_from(["interlock", "suggest"]).unwrap();
        assert!(matches!(cli.command, Command::Suggest));
    }

    #[test]
    fn parse_user_role() {
        let cli =
            Cli::try_parse_from(["interlock", "user", "role", "alice@laptop", "admin"]).unwrap();
        if let Command::User(user_cmd) = cli.command {
            if let UserAction::Role(args) = user_cmd.action {
                assert_eq!(args.user_id, "alice@laptop");
                assert_eq!(args.role, "admin");
            } else {
                panic!("Expected Role action");
            }
        } else {
            panic!("Expected User command");
        }
    }

    #[test]
    fn parse_scenario_load() {
        let cli =
            Cli::try_parse_from(["interlock", "scenario", "load", "classic-deadlock", "--force"])
                .unwrap();
        if let Command::Scenario(scenario_cmd) = cli.command {
            if let ScenarioAction::Load(args) = scenario_cmd.action {
                assert_eq!(args.name, "classic-deadlock");
                assert!(args.force);
            } else {
                panic!("Expected Load action");
            }
        } else {
            panic!("Expected Scenario command");
        }
    }

    #[test]
    fn parse_watch_defaults() {
        let cli = Cli::try_parse_from(["interlock", "watch"]).unwrap();
        if let Command::Watch(args) = cli.command {
            assert_eq!(args.interval_ms, 2000);
            assert!(!args.once);
        } else {
            panic!("Expected Watch command");
        }
    }

    #[test]
    fn parse_monitor_alias() {
        let cli = Cli::try_parse_from(["interlock", "monitor", "--once"]).unwrap();
        assert!(matches!(cli.command, Command::Watch(_)));
    }
}
