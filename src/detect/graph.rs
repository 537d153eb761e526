//! Wait-for graph construction from a ledger snapshot.
//!
//! The graph is bipartite and directed:
//! - allocation edge `resource -> user` for every held lock
//! - wait edge `user -> resource` for every pending request whose resource
//!   is currently held by a *different* user
//!
//! A pending request on a free resource adds no wait edge: it is not a wait
//! condition, since the external grant path would satisfy it immediately.
//!
//! Nodes and per-node edge lists preserve insertion order (ledger record
//! order), so rebuilding from an identical snapshot yields an identical
//! graph and a deterministic traversal order downstream.

use crate::ledger::{LockRecord, Resource};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Identity of a graph node.
///
/// A tagged union rather than a string prefix convention: user IDs are
/// free-form (`alice@laptop`) and must never collide with resource IDs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum NodeId {
    User(String),
    Resource(String),
}

impl NodeId {
    /// Whether this node is a user node.
    pub fn is_user(&self) -> bool {
        matches!(self, NodeId::User(_))
    }

    /// Whether this node is a resource node.
    pub fn is_resource(&self) -> bool {
        matches!(self, NodeId::Resource(_))
    }

    /// The underlying identifier, without the kind tag.
    pub fn raw(&self) -> &str {
        match self {
            NodeId::User(id) | NodeId::Resource(id) => id,
        }
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.raw())
    }
}

/// Directed wait-for graph over user and resource nodes.
#[derive(Debug, Clone)]
pub struct WaitForGraph {
    nodes: Vec<NodeId>,
    index: HashMap<NodeId, usize>,
    adjacency: Vec<Vec<usize>>,
    warnings: Vec<String>,
}

impl WaitForGraph {
    /// Build the graph from a ledger snapshot.
    ///
    /// Single pass over the unreleased records, after an ownership pre-pass.
    /// Records referencing a resource absent from the snapshot are skipped
    /// with a warning, never an error.
    pub fn build(locks: &[LockRecord], resources: &[Resource]) -> Self {
        let mut graph = Self {
            nodes: Vec::new(),
            index: HashMap::new(),
            adjacency: Vec::new(),
            warnings: Vec::new(),
        };

        let known: HashSet<&str> = resources.iter().map(|r| r.id.as_str()).collect();

        // Ownership pre-pass: who currently holds which resource.
        let mut owners: HashMap<&str, &str> = HashMap::new();
        for lock in locks {
            if lock.is_held() && known.contains(lock.resource_id.as_str()) {
                owners.insert(lock.resource_id.as_str(), lock.user_id.as_str());
            }
        }

        // Edge pass, in ledger record order.
        for lock in locks {
            if lock.is_released() {
                continue;
            }

            if !known.contains(lock.resource_id.as_str()) {
                graph.warnings.push(format!(
                    "skipping lock {}: resource '{}' not present in snapshot",
                    lock.id, lock.resource_id
                ));
                continue;
            }

            if lock.is_held() {
                // Allocation edge: resource -> holder
                let resource = graph.intern(NodeId::Resource(lock.resource_id.clone()));
                let user = graph.intern(NodeId::User(lock.user_id.clone()));
                graph.add_edge(resource, user);
            } else {
                let user = graph.intern(NodeId::User(lock.user_id.clone()));
                let resource = graph.intern(NodeId::Resource(lock.resource_id.clone()));

                // Wait edge only when a distinct holder exists; a request on
                // a free resource (or, defensively, on one's own holding) is
                // not a wait condition.
                if let Some(&owner) = owners.get(lock.resource_id.as_str())
                    && owner != lock.user_id
                {
                    graph.add_edge(user, resource);
                }
            }
        }

        graph
    }

    /// Intern a node, returning its index.
    fn intern(&mut self, node: NodeId) -> usize {
        if let Some(&idx) = self.index.get(&node) {
            return idx;
        }

        let idx = self.nodes.len();
        self.index.insert(node.clone(), idx);
        self.nodes.push(node);
        self.adjacency.push(Vec::new());
        idx
    }

    /// Add an edge, suppressing duplicates.
    fn add_edge(&mut self, from: usize, to: usize) {
        if !self.adjacency[from].contains(&to) {
            self.adjacency[from].push(to);
        }
    }

    /// All nodes in insertion order.
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    /// The node at an index.
    pub fn node(&self, idx: usize) -> &NodeId {
        &self.nodes[idx]
    }

    /// Look up the index of a node.
    pub fn index_of(&self, node: &NodeId) -> Option<usize> {
        self.index.get(node).copied()
    }

    /// Successors of a node, in insertion order.
    pub fn neighbors(&self, idx: usize) -> &[usize] {
        &self.adjacency[idx]
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.adjacency.iter().map(Vec::len).sum()
    }

    /// Iterate all edges as (from, to) index pairs, in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.adjacency
            .iter()
            .enumerate()
            .flat_map(|(from, targets)| targets.iter().map(move |&to| (from, to)))
    }

    /// Warnings recorded while building (skipped malformed records).
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Whether the graph has no nodes at all.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
