//! Critical path calculation using forward and backward passes.

use std::collections::{HashMap, VecDeque};
use thiserror::Error;

use crate::config::{ScheduleConfig, TerminalAnchor};
use crate::graph::DependencyGraph;
use crate::interner::Slot;
use crate::models::{Task, TaskKey};
use crate::{log_debug, log_steps, log_summary};

use super::types::{ScheduleResult, TaskTiming};

/// Errors that can occur during schedule computation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    /// A pass drained its queue with tasks still waiting; they sit on or behind a cycle.
    #[error("Circular dependency detected involving tasks {unresolved:?}")]
    CircularDependency { unresolved: Vec<TaskKey> },
    #[error("Unknown terminal anchor: {0}")]
    UnknownTerminalAnchor(String),
}

/// Output of the forward pass, indexed by slot.
struct EarliestTimes {
    start: Vec<u64>,
    finish: Vec<u64>,
}

/// Output of the backward pass, indexed by slot.
struct LatestTimes {
    start: Vec<u64>,
    finish: Vec<u64>,
}

/// Task ids whose counter never reached zero, sorted.
fn unresolved_tasks(graph: &DependencyGraph, remaining: &[usize]) -> Vec<TaskKey> {
    let mut ids: Vec<TaskKey> = remaining
        .iter()
        .enumerate()
        .filter(|&(slot, &count)| count > 0 && graph.is_task(slot as Slot))
        .map(|(slot, _)| graph.id(slot as Slot))
        .collect();
    ids.sort_unstable();
    ids
}

#[inline]
fn duration_of(graph: &DependencyGraph, slot: Slot) -> u64 {
    graph.duration(slot).map_or(0, u64::from)
}

/// Kahn-style propagation of earliest start/finish from tasks without prerequisites.
///
/// Edges to dangling prerequisites count as already satisfied.
fn forward_pass(
    graph: &DependencyGraph,
    dependents: &[Vec<Slot>],
    verbosity: u8,
) -> Result<EarliestTimes, ScheduleError> {
    let n = graph.len();
    let mut start = vec![0u64; n];
    let mut finish = vec![0u64; n];

    let mut remaining: Vec<usize> = (0..n as Slot)
        .map(|slot| {
            graph
                .prerequisites(slot)
                .iter()
                .filter(|&&p| graph.is_task(p))
                .count()
        })
        .collect();

    let mut queue: VecDeque<Slot> = (0..n as Slot)
        .filter(|&slot| graph.is_task(slot) && remaining[slot as usize] == 0)
        .collect();

    let mut processed = 0usize;
    while let Some(slot) = queue.pop_front() {
        processed += 1;
        let idx = slot as usize;
        finish[idx] = start[idx] + duration_of(graph, slot);
        log_steps!(
            verbosity,
            "Forward: task {} es={} ef={}",
            graph.id(slot),
            start[idx],
            finish[idx]
        );

        for &dependent in &dependents[idx] {
            let dep_idx = dependent as usize;
            if finish[idx] > start[dep_idx] {
                log_debug!(
                    verbosity,
                    "  raise es of {} from {} to {}",
                    graph.id(dependent),
                    start[dep_idx],
                    finish[idx]
                );
                start[dep_idx] = finish[idx];
            }
            remaining[dep_idx] -= 1;
            if remaining[dep_idx] == 0 {
                queue.push_back(dependent);
            }
        }
    }

    if processed < graph.task_count() {
        return Err(ScheduleError::CircularDependency {
            unresolved: unresolved_tasks(graph, &remaining),
        });
    }

    Ok(EarliestTimes { start, finish })
}

/// Kahn-style propagation of latest start/finish from tasks nothing depends on.
fn backward_pass(
    graph: &DependencyGraph,
    dependents: &[Vec<Slot>],
    earliest: &EarliestTimes,
    project_finish: u64,
    anchor: TerminalAnchor,
    verbosity: u8,
) -> Result<LatestTimes, ScheduleError> {
    let n = graph.len();
    let mut finish = vec![project_finish; n];
    let mut start = vec![0u64; n];
    let mut remaining: Vec<usize> = dependents.iter().map(Vec::len).collect();

    let mut queue: VecDeque<Slot> = VecDeque::new();
    for slot in 0..n as Slot {
        let idx = slot as usize;
        if !graph.is_task(slot) || remaining[idx] > 0 {
            continue;
        }
        finish[idx] = match anchor {
            TerminalAnchor::ProjectFinish => project_finish,
            TerminalAnchor::OwnFinish => earliest.finish[idx],
        };
        queue.push_back(slot);
    }

    let mut processed = 0usize;
    while let Some(slot) = queue.pop_front() {
        processed += 1;
        let idx = slot as usize;
        start[idx] = finish[idx].saturating_sub(duration_of(graph, slot));
        log_steps!(
            verbosity,
            "Backward: task {} ls={} lf={}",
            graph.id(slot),
            start[idx],
            finish[idx]
        );

        for &prereq in graph.prerequisites(slot) {
            if !graph.is_task(prereq) {
                continue;
            }
            let pre_idx = prereq as usize;
            if start[idx] < finish[pre_idx] {
                log_debug!(
                    verbosity,
                    "  tighten lf of {} from {} to {}",
                    graph.id(prereq),
                    finish[pre_idx],
                    start[idx]
                );
                finish[pre_idx] = start[idx];
            }
            remaining[pre_idx] -= 1;
            if remaining[pre_idx] == 0 {
                queue.push_back(prereq);
            }
        }
    }

    if processed < graph.task_count() {
        return Err(ScheduleError::CircularDependency {
            unresolved: unresolved_tasks(graph, &remaining),
        });
    }

    Ok(LatestTimes { start, finish })
}

/// Compute earliest/latest start and finish for every task, plus the critical path.
///
/// The snapshot must be acyclic. A cycle is reported as
/// `ScheduleError::CircularDependency` rather than yielding partial timings.
///
/// # Arguments
/// * `tasks` - Full task snapshot
/// * `config` - Terminal anchoring and verbosity
///
/// # Returns
/// * `Ok(ScheduleResult)` with one timing per task in the snapshot
/// * `Err(ScheduleError)` on a cyclic snapshot or invalid configuration
pub fn compute_schedule(
    tasks: &[Task],
    config: &ScheduleConfig,
) -> Result<ScheduleResult, ScheduleError> {
    let anchor = config.anchor()?;
    let verbosity = config.verbosity;

    let graph = DependencyGraph::from_tasks(tasks);
    let dependents = graph.build_dependents();

    let earliest = forward_pass(&graph, &dependents, verbosity)?;

    let project_finish = (0..graph.len() as Slot)
        .filter(|&slot| graph.is_task(slot))
        .map(|slot| earliest.finish[slot as usize])
        .max()
        .unwrap_or(0);

    let latest = backward_pass(
        &graph,
        &dependents,
        &earliest,
        project_finish,
        anchor,
        verbosity,
    )?;

    let mut timings: HashMap<TaskKey, TaskTiming> = HashMap::with_capacity(graph.task_count());
    for slot in (0..graph.len() as Slot).filter(|&slot| graph.is_task(slot)) {
        let idx = slot as usize;
        let task_id = graph.id(slot);
        timings.insert(
            task_id,
            TaskTiming {
                task_id,
                earliest_start: earliest.start[idx],
                earliest_finish: earliest.finish[idx],
                latest_start: latest.start[idx],
                latest_finish: latest.finish[idx],
            },
        );
    }

    let mut critical: Vec<&TaskTiming> = timings.values().filter(|t| t.is_critical()).collect();
    critical.sort_unstable_by_key(|t| (t.earliest_start, t.task_id));
    let critical_path: Vec<TaskKey> = critical.into_iter().map(|t| t.task_id).collect();

    log_summary!(
        verbosity,
        "Project finish: {}, critical path: {} of {} tasks",
        project_finish,
        critical_path.len(),
        timings.len()
    );

    Ok(ScheduleResult {
        timings,
        critical_path,
        project_finish,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cycle::would_create_cycle;
    use crate::models::DependencyEdge;

    fn make_task(id: TaskKey, duration: u32, deps: Vec<TaskKey>) -> Task {
        Task::with_deps(id, duration, deps)
    }

    fn schedule(tasks: &[Task]) -> ScheduleResult {
        compute_schedule(tasks, &ScheduleConfig::default()).unwrap()
    }

    fn bounds(result: &ScheduleResult, id: TaskKey) -> (u64, u64, u64, u64) {
        let t = result.timing(id).unwrap();
        (
            t.earliest_start,
            t.earliest_finish,
            t.latest_start,
            t.latest_finish,
        )
    }

    #[test]
    fn test_fan_out_from_one_task() {
        // 2 and 3 both wait on 1; 2 is the longer branch.
        let tasks = vec![
            make_task(1, 2, vec![]),
            make_task(2, 3, vec![1]),
            make_task(3, 1, vec![1]),
        ];
        let result = schedule(&tasks);

        assert_eq!(bounds(&result, 1), (0, 2, 0, 2));
        assert_eq!(bounds(&result, 2), (2, 5, 2, 5));
        assert_eq!(bounds(&result, 3), (2, 3, 4, 5));
        assert_eq!(result.project_finish, 5);
        assert_eq!(result.critical_path, vec![1, 2]);
        assert_eq!(result.timing(3).unwrap().slack(), 2);
    }

    #[test]
    fn test_own_finish_anchor_marks_every_terminal_task() {
        let tasks = vec![
            make_task(1, 2, vec![]),
            make_task(2, 3, vec![1]),
            make_task(3, 1, vec![1]),
        ];
        let config = ScheduleConfig::with_anchor(TerminalAnchor::OwnFinish);
        let result = compute_schedule(&tasks, &config).unwrap();

        assert_eq!(bounds(&result, 3), (2, 3, 2, 3));
        assert_eq!(result.critical_path, vec![1, 2, 3]);
        assert_eq!(result.project_finish, 5);
    }

    #[test]
    fn test_single_task() {
        let result = schedule(&[make_task(1, 4, vec![])]);

        assert_eq!(bounds(&result, 1), (0, 4, 0, 4));
        assert_eq!(result.critical_path, vec![1]);
        assert_eq!(result.project_finish, 4);
    }

    #[test]
    fn test_diamond_dependency() {
        // 1 -> 2 (5d) -> 4
        // 1 -> 3 (1d) -> 4
        let tasks = vec![
            make_task(1, 1, vec![]),
            make_task(2, 5, vec![1]),
            make_task(3, 1, vec![1]),
            make_task(4, 1, vec![2, 3]),
        ];

        for anchor in [TerminalAnchor::ProjectFinish, TerminalAnchor::OwnFinish] {
            let result = compute_schedule(&tasks, &ScheduleConfig::with_anchor(anchor)).unwrap();

            assert_eq!(result.timing(4).unwrap().earliest_start, 6);
            assert_eq!(result.project_finish, 7);
            assert_eq!(result.critical_path, vec![1, 2, 4]);
            assert!(!result.is_critical(3));
            assert_eq!(bounds(&result, 3), (1, 2, 5, 6));
        }
    }

    #[test]
    fn test_chain_is_fully_critical() {
        let tasks = vec![
            make_task(10, 2, vec![]),
            make_task(20, 3, vec![10]),
            make_task(30, 4, vec![20]),
        ];
        let result = schedule(&tasks);

        assert_eq!(result.project_finish, 9);
        assert_eq!(result.critical_path, vec![10, 20, 30]);
        assert_eq!(bounds(&result, 30), (5, 9, 5, 9));
    }

    #[test]
    fn test_independent_tasks_share_horizon() {
        let tasks = vec![make_task(1, 2, vec![]), make_task(2, 6, vec![])];
        let result = schedule(&tasks);

        assert_eq!(bounds(&result, 1), (0, 2, 4, 6));
        assert_eq!(bounds(&result, 2), (0, 6, 0, 6));
        assert_eq!(result.critical_path, vec![2]);
    }

    #[test]
    fn test_empty_snapshot() {
        let result = schedule(&[]);

        assert!(result.timings.is_empty());
        assert!(result.critical_path.is_empty());
        assert_eq!(result.project_finish, 0);
    }

    #[test]
    fn test_dangling_prerequisite_is_satisfied() {
        let tasks = vec![make_task(1, 2, vec![]), make_task(2, 3, vec![1, 99])];
        let result = schedule(&tasks);

        assert_eq!(result.timings.len(), 2);
        assert!(result.timing(99).is_none());
        assert_eq!(bounds(&result, 2), (2, 5, 2, 5));
    }

    #[test]
    fn test_duplicate_prerequisites_counted_once() {
        let tasks = vec![make_task(1, 2, vec![]), make_task(2, 1, vec![1, 1])];
        let result = schedule(&tasks);

        assert_eq!(bounds(&result, 2), (2, 3, 2, 3));
    }

    #[test]
    fn test_cycle_is_reported() {
        // 1 <-> 2 form a cycle, 3 sits behind it, 4 is unaffected.
        let tasks = vec![
            make_task(1, 1, vec![2]),
            make_task(2, 1, vec![1]),
            make_task(3, 1, vec![2]),
            make_task(4, 1, vec![]),
        ];
        let err = compute_schedule(&tasks, &ScheduleConfig::default()).unwrap_err();

        assert_eq!(
            err,
            ScheduleError::CircularDependency {
                unresolved: vec![1, 2, 3]
            }
        );
        assert_eq!(
            err.to_string(),
            "Circular dependency detected involving tasks [1, 2, 3]"
        );
    }

    #[test]
    fn test_self_dependency_in_snapshot_is_cycle() {
        let tasks = vec![make_task(1, 1, vec![1])];
        assert!(matches!(
            compute_schedule(&tasks, &ScheduleConfig::default()),
            Err(ScheduleError::CircularDependency { .. })
        ));
    }

    #[test]
    fn test_unknown_anchor_is_error() {
        let config = ScheduleConfig {
            terminal_anchor: "later".to_string(),
            verbosity: 0,
        };
        assert_eq!(
            compute_schedule(&[make_task(1, 1, vec![])], &config),
            Err(ScheduleError::UnknownTerminalAnchor("later".to_string()))
        );
    }

    #[test]
    fn test_repeated_computation_is_identical() {
        let tasks = vec![
            make_task(1, 3, vec![]),
            make_task(2, 2, vec![1]),
            make_task(3, 4, vec![1]),
            make_task(4, 1, vec![2, 3]),
            make_task(5, 2, vec![]),
        ];
        assert_eq!(schedule(&tasks), schedule(&tasks));
    }

    #[test]
    fn test_verbose_logging_does_not_change_result() {
        let tasks = vec![make_task(1, 2, vec![]), make_task(2, 3, vec![1])];
        let config = ScheduleConfig {
            verbosity: crate::logging::VERBOSITY_DEBUG,
            ..ScheduleConfig::default()
        };
        assert_eq!(compute_schedule(&tasks, &config).unwrap(), schedule(&tasks));
    }

    /// Minimal deterministic generator so the randomized test is reproducible.
    struct Lcg(u64);

    impl Lcg {
        fn next(&mut self, bound: u64) -> u64 {
            self.0 = self
                .0
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            (self.0 >> 33) % bound
        }
    }

    /// Whether `to` is reachable from `from` by following prerequisite links.
    fn reaches(tasks: &[Task], from: TaskKey, to: TaskKey) -> bool {
        let mut stack = vec![from];
        let mut seen = rustc_hash::FxHashSet::default();
        while let Some(id) = stack.pop() {
            if id == to {
                return true;
            }
            if !seen.insert(id) {
                continue;
            }
            if let Some(task) = tasks.iter().find(|t| t.id == id) {
                stack.extend(task.depends_on.iter().copied());
            }
        }
        false
    }

    #[test]
    fn test_accepted_edges_keep_graph_schedulable() {
        let n = 25;
        let mut rng = Lcg(0x5eed);
        let mut tasks: Vec<Task> = (0..n)
            .map(|id| make_task(id as TaskKey, 1 + rng.next(6) as u32, vec![]))
            .collect();

        for _ in 0..200 {
            let dependent = rng.next(n) as TaskKey;
            let prerequisite = rng.next(n) as TaskKey;
            if dependent == prerequisite {
                continue;
            }

            let edge = DependencyEdge::new(dependent, prerequisite);
            let closes_loop = reaches(&tasks, prerequisite, dependent);
            assert_eq!(would_create_cycle(&tasks, edge), closes_loop);

            if !closes_loop {
                let deps = &mut tasks[dependent as usize].depends_on;
                if !deps.contains(&prerequisite) {
                    deps.push(prerequisite);
                }
            }
        }

        let result = schedule(&tasks);
        assert!(!result.critical_path.is_empty());

        for task in &tasks {
            let t = result.timing(task.id).unwrap();
            assert!(t.latest_start >= t.earliest_start);
            assert!(t.latest_finish >= t.earliest_finish);
            assert_eq!(t.earliest_finish, t.earliest_start + task.duration as u64);
            assert_eq!(t.latest_finish, t.latest_start + task.duration as u64);
            assert!(t.latest_finish <= result.project_finish);

            for dep in &task.depends_on {
                let p = result.timing(*dep).unwrap();
                assert!(t.earliest_start >= p.earliest_finish);
                assert!(p.latest_finish <= t.latest_start);
            }
        }

        let horizon_task = tasks
            .iter()
            .find(|t| result.timing(t.id).unwrap().earliest_finish == result.project_finish)
            .unwrap();
        assert!(result.is_critical(horizon_task.id));
    }

    #[test]
    fn test_long_chain() {
        let n: TaskKey = 20_000;
        let tasks: Vec<Task> = (0..n)
            .map(|i| make_task(i, 1, if i == 0 { vec![] } else { vec![i - 1] }))
            .collect();
        let result = schedule(&tasks);

        assert_eq!(result.project_finish, n as u64);
        assert_eq!(result.critical_path.len(), n as usize);
        assert_eq!(result.critical_path.first(), Some(&0));
    }
}
