//! Implementation of the `interlock resource` commands.

use crate::cli::ResourceAddArgs;
use crate::config::Config;
use crate::context::require_initialized_workspace;
use crate::error::Result;
use crate::events::{Event, EventAction, append_event};
use crate::ledger::{Ledger, acquire_mutation_lock};
use serde_json::json;

/// Execute the `interlock resource add` command.
///
/// Creates a resource with a generated `RES-NNN` ID under the mutation lock.
pub fn cmd_resource_add(args: ResourceAddArgs, actor: &str) -> Result<()> {
    let ctx = require_initialized_workspace()?;
    let config = Config::load(ctx.config_path()).unwrap_or_default();

    let _mutation_lock = acquire_mutation_lock(&ctx, actor, "resource_add")?;

    let mut ledger = Ledger::load(&ctx)?;
    let resource = ledger.add_resource(&config, &args.title)?;
    ledger.save(&ctx)?;

    let event = Event::new(EventAction::ResourceAdd, actor)
        .with_resource(&resource.id)
        .with_details(json!({
            "title": resource.title,
            "resource_count": ledger.resources().len(),
        }));
    append_event(&ctx, &event)?;

    println!("Added {}: {}", resource.id, resource.title);

    super::report_detection_after_mutation(&ctx)
}

/// Execute the `interlock resource list` command.
pub fn cmd_resource_list() -> Result<()> {
    let ctx = require_initialized_workspace()?;
    let config = Config::load(ctx.config_path()).unwrap_or_default();

    let ledger = Ledger::load(&ctx)?;
    let resources = ledger.resources();

    if resources.is_empty() {
        println!("No resources yet.");
        println!("Use `interlock resource add \"<title>\"` to create one.");
        return Ok(());
    }

    println!(
        "Resources ({} of {}):",
        resources.len(),
        config.max_resources
    );
    println!();

    for resource in resources {
        let state = match ledger.holder_of(&resource.id) {
            Some(holder) => {
                let queue = ledger.pending_for(&resource.id).len();
                if queue > 0 {
                    format!("locked by {} ({} waiting)", holder.user_id, queue)
                } else {
                    format!("locked by {}", holder.user_id)
                }
            }
            None => "free".to_string(),
        };

        println!("  {}  {:<30}  {}", resource.id, resource.title, state);
    }

    Ok(())
}
