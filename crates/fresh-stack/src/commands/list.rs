//! List command: show the stacks `new` can create.

use clap::Args;
use owo_colors::OwoColorize;
use tracing::{debug, instrument};

use fresh_stack_core::stack::Registry;

/// Arguments for the `list` subcommand.
#[derive(Args, Debug, Default)]
pub struct ListArgs {
    // No subcommand-specific arguments; uses global --json flag
}

/// Print the registered stacks in menu order.
#[instrument(name = "cmd_list", skip_all, fields(json_output = global_json))]
pub fn cmd_list(_args: ListArgs, global_json: bool) -> anyhow::Result<()> {
    let registry = Registry::builtin();
    debug!(count = registry.list_all().len(), "executing list command");

    if global_json {
        println!("{}", serde_json::to_string_pretty(registry.list_all())?);
        return Ok(());
    }

    let width = registry
        .list_all()
        .iter()
        .map(|stack| stack.id.len())
        .max()
        .unwrap_or(0);
    for stack in registry.list_all() {
        println!(
            "  {:<width$}  {}  {}",
            stack.id.cyan(),
            stack.title.bold(),
            format!("needs: {}", stack.dependencies.join(", ")).dimmed(),
        );
    }
    Ok(())
}
