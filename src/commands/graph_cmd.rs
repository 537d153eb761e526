//! Implementation of the `interlock graph` command.
//!
//! Renders the current wait-for graph as text or Graphviz DOT. The DOT
//! output draws resources as boxes and users as ellipses, with allocation
//! and wait edges labeled, so `interlock graph --dot | dot -Tsvg` gives
//! the same picture the detection pass operates on.

use crate::cli::GraphArgs;
use crate::context::require_initialized_workspace;
use crate::detect::{NodeId, WaitForGraph};
use crate::error::Result;
use crate::ledger::Ledger;

/// Execute the `interlock graph` command.
pub fn cmd_graph(args: GraphArgs) -> Result<()> {
    let ctx = require_initialized_workspace()?;

    let ledger = Ledger::load(&ctx)?;
    let graph = WaitForGraph::build(ledger.locks(), ledger.resources());

    for warning in graph.warnings() {
        eprintln!("Warning: {}", warning);
    }

    if args.dot {
        print!("{}", render_dot(&graph));
    } else {
        print!("{}", render_text(&graph));
    }

    Ok(())
}

/// Plain-text rendering: nodes, then edges with their meaning.
fn render_text(graph: &WaitForGraph) -> String {
    if graph.is_empty() {
        return "Wait-for graph is empty (no active locks).\n".to_string();
    }

    let mut out = String::new();

    out.push_str(&format!(
        "Wait-for graph: {} node(s), {} edge(s)\n\n",
        graph.node_count(),
        graph.edge_count()
    ));

    out.push_str("Nodes:\n");
    for node in graph.nodes() {
        let kind = if node.is_user() { "user" } else { "resource" };
        out.push_str(&format!("  {} ({})\n", node, kind));
    }

    out.push_str("\nEdges:\n");
    for (from, to) in graph.edges() {
        let (from_node, to_node) = (graph.node(from), graph.node(to));
        let meaning = if from_node.is_resource() {
            "held by"
        } else {
            "waiting for"
        };
        out.push_str(&format!("  {} -> {} ({})\n", from_node, to_node, meaning));
    }

    out
}

/// Graphviz DOT rendering.
fn render_dot(graph: &WaitForGraph) -> String {
    let mut out = String::from("digraph wait_for {\n  rankdir=LR;\n");

    for node in graph.nodes() {
        match node {
            NodeId::Resource(id) => {
                out.push_str(&format!("  \"{}\" [shape=box];\n", id));
            }
            NodeId::User(id) => {
                out.push_str(&format!("  \"{}\" [shape=ellipse];\n", id));
            }
        }
    }

    for (from, to) in graph.edges() {
        let (from_node, to_node) = (graph.node(from), graph.node(to));
        let label = if from_node.is_resource() {
            "held"
        } else {
            "waits"
        };
        out.push_str(&format!(
            "  \"{}\" -> \"{}\" [label=\"{}\"];\n",
            from_node.raw(),
            to_node.raw(),
            label
        ));
    }

    out.push_str("}\n");
    out
}
