//! Result types for schedule computation.

use pyo3::prelude::*;
use std::collections::HashMap;

use crate::models::TaskKey;

// Note: std HashMap here for PyO3 interface compatibility

/// Earliest/latest bounds for one task, in the same unit as its duration.
#[pyclass]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TaskTiming {
    #[pyo3(get)]
    pub task_id: TaskKey,
    /// Earliest possible start time (from forward pass).
    #[pyo3(get)]
    pub earliest_start: u64,
    /// Earliest possible finish time (from forward pass).
    #[pyo3(get)]
    pub earliest_finish: u64,
    /// Latest allowable start time (from backward pass).
    #[pyo3(get)]
    pub latest_start: u64,
    /// Latest allowable finish time (from backward pass).
    #[pyo3(get)]
    pub latest_finish: u64,
}

#[pymethods]
impl TaskTiming {
    /// Slack = latest_start - earliest_start.
    pub fn slack(&self) -> u64 {
        self.latest_start.saturating_sub(self.earliest_start)
    }

    pub fn is_critical(&self) -> bool {
        self.earliest_start == self.latest_start
    }

    fn __repr__(&self) -> String {
        format!(
            "TaskTiming(task_id={}, es={}, ef={}, ls={}, lf={})",
            self.task_id,
            self.earliest_start,
            self.earliest_finish,
            self.latest_start,
            self.latest_finish
        )
    }
}

/// Schedule derived from one task snapshot. Discarded after the caller merges it.
#[pyclass]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScheduleResult {
    /// Timing per task id present in the snapshot.
    #[pyo3(get)]
    pub timings: HashMap<TaskKey, TaskTiming>,
    /// Zero-slack task ids, ordered by earliest start then id.
    #[pyo3(get)]
    pub critical_path: Vec<TaskKey>,
    /// Maximum earliest finish across all tasks (0 for an empty snapshot).
    #[pyo3(get)]
    pub project_finish: u64,
}

impl ScheduleResult {
    pub fn timing(&self, task_id: TaskKey) -> Option<&TaskTiming> {
        self.timings.get(&task_id)
    }
}

#[pymethods]
impl ScheduleResult {
    pub fn is_critical(&self, task_id: TaskKey) -> bool {
        self.timings
            .get(&task_id)
            .is_some_and(|timing| timing.is_critical())
    }

    #[pyo3(name = "timing")]
    fn py_timing(&self, task_id: TaskKey) -> Option<TaskTiming> {
        self.timings.get(&task_id).cloned()
    }

    fn __len__(&self) -> usize {
        self.timings.len()
    }

    fn __repr__(&self) -> String {
        format!(
            "ScheduleResult(tasks={}, critical_path={:?}, project_finish={})",
            self.timings.len(),
            self.critical_path,
            self.project_finish
        )
    }
}
