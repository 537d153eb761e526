//! Interlock: deadlock-aware collaborative lock coordinator for shared workspaces.
//!
//! This is the main entry point for the `interlock` CLI. It parses
//! arguments, dispatches to the appropriate command handler, and handles
//! errors with proper exit codes.

mod cli;
mod commands;
pub mod advice;
pub mod config;
pub mod context;
pub mod detect;
pub mod error;
pub mod events;
pub mod exit_codes;
pub mod fs;
pub mod ledger;
pub mod profiles;

#[cfg(test)]
mod test_support;

use cli::Cli;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse_args();

    let actor = cli
        .acting_user
        .clone()
        .unwrap_or_else(events::current_actor);

    match commands::dispatch(cli.command, &actor) {
        Ok(()) => ExitCode::from(exit_codes::SUCCESS as u8),
        Err(err) => {
            // Print user-actionable error message to stderr
            eprintln!("Error: {}", err);

            // Return appropriate exit code
            ExitCode::from(err.exit_code() as u8)
        }
    }
}
