//! Core data types handed to the scheduling engine.

use chrono::NaiveDate;
use pyo3::prelude::*;

/// Task identifier as stored by the persistence layer.
pub type TaskKey = i64;

/// A task snapshot: identity, duration and its direct prerequisites.
#[pyclass]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Task {
    #[pyo3(get, set)]
    pub id: TaskKey,
    #[pyo3(get, set)]
    pub title: String,
    /// Working days consumed once the task starts.
    #[pyo3(get, set)]
    pub duration: u32,
    /// Advisory only; never read by the scheduling arithmetic.
    #[pyo3(get, set)]
    pub due_date: Option<NaiveDate>,
    /// Tasks that must finish before this one may start.
    #[pyo3(get, set)]
    pub depends_on: Vec<TaskKey>,
}

impl Task {
    /// Build a task with no title or due date, mostly useful for tests and callers
    /// that only care about the schedule.
    pub fn with_deps(id: TaskKey, duration: u32, depends_on: Vec<TaskKey>) -> Self {
        Self {
            id,
            title: String::new(),
            duration,
            due_date: None,
            depends_on,
        }
    }
}

#[pymethods]
impl Task {
    #[new]
    #[pyo3(signature = (id, title, duration=1, due_date=None, depends_on=None))]
    fn new(
        id: TaskKey,
        title: String,
        duration: u32,
        due_date: Option<NaiveDate>,
        depends_on: Option<Vec<TaskKey>>,
    ) -> Self {
        Self {
            id,
            title,
            duration,
            due_date,
            depends_on: depends_on.unwrap_or_default(),
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "Task(id={}, title={:?}, duration={}, deps={:?})",
            self.id, self.title, self.duration, self.depends_on
        )
    }
}

/// A proposed "dependent cannot start until prerequisite finishes" edge.
#[pyclass]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DependencyEdge {
    #[pyo3(get, set)]
    pub dependent: TaskKey,
    #[pyo3(get, set)]
    pub prerequisite: TaskKey,
}

#[pymethods]
impl DependencyEdge {
    #[new]
    pub fn new(dependent: TaskKey, prerequisite: TaskKey) -> Self {
        Self {
            dependent,
            prerequisite,
        }
    }

    pub fn is_self_loop(&self) -> bool {
        self.dependent == self.prerequisite
    }

    fn __repr__(&self) -> String {
        format!(
            "DependencyEdge(dependent={}, prerequisite={})",
            self.dependent, self.prerequisite
        )
    }
}
