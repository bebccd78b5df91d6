//! Circular dependency detection for proposed edges.

use thiserror::Error;

use crate::graph::DependencyGraph;
use crate::interner::Slot;
use crate::models::{DependencyEdge, Task, TaskKey};
use crate::{log_debug, log_summary};

/// Reasons a proposed dependency edge must not be committed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DependencyError {
    #[error("A task cannot depend on itself: {0}")]
    SelfDependency(TaskKey),
    #[error("Task not found: {0}")]
    UnknownTask(TaskKey),
    #[error("Dependency {dependent} -> {prerequisite} would create a circular dependency")]
    WouldCreateCycle {
        dependent: TaskKey,
        prerequisite: TaskKey,
    },
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    /// On the active DFS path.
    OnStack,
    /// Subtree fully explored.
    Done,
}

/// Find an edge that closes a cycle, returned as (from, to) slots.
///
/// Iterative white/gray/black DFS started from every unvisited node in slot order.
fn find_back_edge(graph: &DependencyGraph) -> Option<(Slot, Slot)> {
    let n = graph.len();
    let mut marks = vec![Mark::Unvisited; n];
    // (node, index of the next prerequisite to explore)
    let mut stack: Vec<(Slot, usize)> = Vec::new();

    for root in 0..n as Slot {
        if marks[root as usize] != Mark::Unvisited {
            continue;
        }
        marks[root as usize] = Mark::OnStack;
        stack.push((root, 0));

        while let Some(frame) = stack.last_mut() {
            let node = frame.0;
            let prereqs = graph.prerequisites(node);
            if frame.1 == prereqs.len() {
                marks[node as usize] = Mark::Done;
                stack.pop();
                continue;
            }

            let next = prereqs[frame.1];
            frame.1 += 1;
            match marks[next as usize] {
                Mark::Unvisited => {
                    marks[next as usize] = Mark::OnStack;
                    stack.push((next, 0));
                }
                Mark::OnStack => return Some((node, next)),
                Mark::Done => {}
            }
        }
    }

    None
}

/// Return an edge that lies on a cycle of `graph`, if any.
pub fn find_cycle_edge(graph: &DependencyGraph) -> Option<DependencyEdge> {
    find_back_edge(graph).map(|(from, to)| DependencyEdge::new(graph.id(from), graph.id(to)))
}

/// Whether `graph` contains any cycle.
pub fn has_cycle(graph: &DependencyGraph) -> bool {
    find_back_edge(graph).is_some()
}

/// Whether committing `edge` on top of `tasks` would create a cycle.
///
/// The edge is only added to a graph local to this call. Callers are expected
/// to reject self-dependencies beforehand; if one gets through it is reported
/// as a cycle.
pub fn would_create_cycle(tasks: &[Task], edge: DependencyEdge) -> bool {
    let mut graph = DependencyGraph::from_tasks(tasks);
    graph.add_edge(edge);
    has_cycle(&graph)
}

/// Admission check run before a new dependency edge is committed.
///
/// Rejects self-dependencies, ids without a task record in the snapshot, and
/// edges that would close a cycle. An edge that already exists passes.
pub fn check_dependency(
    tasks: &[Task],
    edge: DependencyEdge,
    verbosity: u8,
) -> Result<(), DependencyError> {
    if edge.is_self_loop() {
        log_summary!(verbosity, "Rejected self-dependency on task {}", edge.dependent);
        return Err(DependencyError::SelfDependency(edge.dependent));
    }

    let mut graph = DependencyGraph::from_tasks(tasks);
    for id in [edge.dependent, edge.prerequisite] {
        if !graph.contains_task(id) {
            log_summary!(verbosity, "Rejected dependency on unknown task {}", id);
            return Err(DependencyError::UnknownTask(id));
        }
    }

    graph.add_edge(edge);
    if let Some(back_edge) = find_cycle_edge(&graph) {
        log_debug!(
            verbosity,
            "Back-edge {} -> {} closes a cycle",
            back_edge.dependent,
            back_edge.prerequisite
        );
        log_summary!(
            verbosity,
            "Rejected dependency {} -> {}: circular",
            edge.dependent,
            edge.prerequisite
        );
        return Err(DependencyError::WouldCreateCycle {
            dependent: edge.dependent,
            prerequisite: edge.prerequisite,
        });
    }

    Ok(())
}
