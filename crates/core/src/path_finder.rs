use std::collections::VecDeque;

use super::graph::PredecessorGraph;
use common::{error::Error, types::Path};

/// Finds a minimum-hop path from node `from` to node `to`.
///
/// Breadth-first search seeded at `to`, walking predecessor adjacency. A node
/// is marked visited the first time it is enqueued and never revisited, and
/// the search stops as soon as `from` is discovered as a predecessor of the
/// frontier. Ties between equally short paths are broken by discovery order,
/// which follows the graph's predecessor ordering. This minimizes the number
/// of conversions, not the rate.
///
/// `from == to` yields an empty path.
///
/// # Errors
/// Returns `Error::UnknownCurrency` if either index is out of bounds, or
/// `Error::NoPathFound` if the queue drains without reaching `from`.
pub fn shortest_path(graph: &PredecessorGraph, from: usize, to: usize) -> Result<Path, Error> {
    let num_nodes = graph.num_nodes();
    for node in [from, to] {
        if node >= num_nodes {
            return Err(Error::UnknownCurrency(format!("#{node}")));
        }
    }

    if from == to {
        return Ok(Vec::new());
    }

    // next_hop[u] is the node one step closer to `to` on the discovered path.
    let mut next_hop: Vec<Option<usize>> = vec![None; num_nodes];
    let mut visited = vec![false; num_nodes];
    let mut queue = VecDeque::with_capacity(num_nodes);

    visited[to] = true;
    queue.push_back(to);

    while let Some(node) = queue.pop_front() {
        for &pred in graph.predecessors(node) {
            if visited[pred] {
                continue;
            }
            visited[pred] = true;
            next_hop[pred] = Some(node);

            if pred == from {
                return reconstruct_path(graph, from, to, &next_hop);
            }
            queue.push_back(pred);
        }
    }

    Err(Error::NoPathFound {
        from: graph.currencies[from].to_string(),
        to: graph.currencies[to].to_string(),
    })
}

/// Follows the `next_hop` chain from `from` until `to`, collecting node indices.
///
/// The chain was written toward `to`, so the trail comes out in travel order
/// and is handed to `trail_to_path` reversed.
fn reconstruct_path(
    graph: &PredecessorGraph,
    from: usize,
    to: usize,
    next_hop: &[Option<usize>],
) -> Result<Path, Error> {
    let mut trail = vec![from];
    let mut current = from;

    while current != to {
        current = next_hop[current].ok_or_else(|| Error::NoPathFound {
            from: graph.currencies[from].to_string(),
            to: graph.currencies[to].to_string(),
        })?;
        trail.push(current);
    }

    trail.reverse();
    graph.trail_to_path(&trail)
}
