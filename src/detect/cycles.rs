//! Circular-wait enumeration over the wait-for graph.
//!
//! Depth-first traversal with an explicit three-state node map and an
//! explicit path stack (no recursion, no shared mutable sets):
//!
//! - **unvisited**: never reached
//! - **on-path**: currently on the traversal path
//! - **done**: fully explored; never re-expanded
//!
//! Reaching an on-path node closes a cycle: the cycle is the path slice
//! from that node's first occurrence up to the current node, re-closed at
//! the start. The traversal then continues with the current node's
//! remaining neighbors rather than returning: overlapping or disjoint
//! cycles sharing a prefix must all surface, because each one is an
//! independent circular wait that the advisor has to break separately.
//!
//! Roots and neighbors are taken in the graph's insertion order. That
//! order decides only which node a cycle nominally starts at, never its
//! membership; callers comparing cycles must compare them as node sets.

use super::Cycle;
use super::graph::WaitForGraph;

/// Per-node traversal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VisitState {
    Unvisited,
    OnPath,
    Done,
}

/// A node being expanded, with a cursor into its neighbor list.
struct Frame {
    node: usize,
    next: usize,
}

/// Enumerate all circular waits in the graph.
///
/// Returns each cycle as a closed walk `[n0, ..., nk, n0]`. The empty graph
/// yields an empty set. Total edge visits are O(V + E); every node is
/// expanded exactly once.
pub fn find_cycles(graph: &WaitForGraph) -> Vec<Cycle> {
    let node_count = graph.node_count();
    let mut state = vec![VisitState::Unvisited; node_count];
    let mut cycles: Vec<Vec<usize>> = Vec::new();

    for root in 0..node_count {
        if state[root] != VisitState::Unvisited {
            continue;
        }

        let mut path: Vec<usize> = vec![root];
        let mut stack: Vec<Frame> = vec![Frame {
            node: root,
            next: 0,
        }];
        state[root] = VisitState::OnPath;

        while let Some(frame) = stack.last_mut() {
            let neighbors = graph.neighbors(frame.node);

            if frame.next < neighbors.len() {
                let neighbor = neighbors[frame.next];
                frame.next += 1;

                match state[neighbor] {
                    VisitState::Unvisited => {
                        state[neighbor] = VisitState::OnPath;
                        path.push(neighbor);
                        stack.push(Frame {
                            node: neighbor,
                            next: 0,
                        });
                    }
                    VisitState::OnPath => {
                        // Cycle closed: slice the path from the neighbor's
                        // first occurrence and re-close at the start.
                        let start = path
                            .iter()
                            .position(|&n| n == neighbor)
                            .expect("on-path node must be on the path");
                        let mut cycle = path[start..].to_vec();
                        cycle.push(neighbor);
                        cycles.push(cycle);
                        // Keep going: sibling edges may close further cycles.
                    }
                    VisitState::Done => {}
                }
            } else {
                state[frame.node] = VisitState::Done;
                path.pop();
                stack.pop();
            }
        }
    }

    cycles
        .into_iter()
        .map(|cycle| cycle.into_iter().map(|idx| graph.node(idx).clone()).collect())
        .collect()
}
