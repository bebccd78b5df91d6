//! Scheduling engine for the task planner.
//!
//! Provides dependency-graph construction, circular dependency detection for
//! proposed edges, and critical path (CPM) scheduling. Everything operates on
//! an in-memory snapshot handed in by the caller and keeps no state between calls.

// Allow clippy warning triggered by PyO3 macro expansion
#![allow(clippy::useless_conversion)]

use pyo3::prelude::*;
use std::collections::HashMap;

mod config;
pub mod critical_path;
pub mod cycle;
pub mod graph;
mod interner;
pub mod logging;
mod models;

pub use config::{ScheduleConfig, TerminalAnchor};
pub use critical_path::{compute_schedule, ScheduleError, ScheduleResult, TaskTiming};
pub use cycle::{check_dependency, would_create_cycle, DependencyError};
pub use graph::{build_adjacency, DependencyGraph};
pub use interner::{Slot, TaskIdInterner};
pub use models::{DependencyEdge, Task, TaskKey};

/// Report whether making `dependent` depend on `prerequisite` would create a cycle.
///
/// The caller is expected to have rejected `dependent == prerequisite` already.
#[pyfunction]
#[pyo3(name = "would_create_cycle")]
fn py_would_create_cycle(tasks: Vec<Task>, dependent: TaskKey, prerequisite: TaskKey) -> bool {
    would_create_cycle(&tasks, DependencyEdge::new(dependent, prerequisite))
}

/// Validate a new dependency edge before it is committed.
///
/// # Raises
/// * ValueError on self-dependency, unknown task id, or circular dependency
#[pyfunction]
#[pyo3(name = "check_dependency", signature = (tasks, dependent, prerequisite, verbosity=0))]
fn py_check_dependency(
    tasks: Vec<Task>,
    dependent: TaskKey,
    prerequisite: TaskKey,
    verbosity: u8,
) -> PyResult<()> {
    check_dependency(&tasks, DependencyEdge::new(dependent, prerequisite), verbosity)
        .map_err(|e| pyo3::exceptions::PyValueError::new_err(e.to_string()))
}

/// Compute earliest/latest times and the critical path for a task snapshot.
///
/// # Raises
/// * ValueError if the snapshot contains a circular dependency or the config is invalid
#[pyfunction]
#[pyo3(name = "compute_schedule", signature = (tasks, config=None))]
fn py_compute_schedule(tasks: Vec<Task>, config: Option<ScheduleConfig>) -> PyResult<ScheduleResult> {
    let config = config.unwrap_or_default();
    compute_schedule(&tasks, &config)
        .map_err(|e| pyo3::exceptions::PyValueError::new_err(e.to_string()))
}

/// Map every task id to its direct prerequisite ids.
#[pyfunction]
#[pyo3(name = "build_adjacency")]
fn py_build_adjacency(tasks: Vec<Task>) -> HashMap<TaskKey, Vec<TaskKey>> {
    build_adjacency(&tasks).into_iter().collect()
}

/// The taskplan.rust Python module.
#[pymodule]
fn rust(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Data types
    m.add_class::<Task>()?;
    m.add_class::<DependencyEdge>()?;
    m.add_class::<TaskTiming>()?;
    m.add_class::<ScheduleResult>()?;

    // Config types
    m.add_class::<ScheduleConfig>()?;

    // Algorithms
    m.add_function(wrap_pyfunction!(py_would_create_cycle, m)?)?;
    m.add_function(wrap_pyfunction!(py_check_dependency, m)?)?;
    m.add_function(wrap_pyfunction!(py_compute_schedule, m)?)?;
    m.add_function(wrap_pyfunction!(py_build_adjacency, m)?)?;

    Ok(())
}
