//! Configuration for schedule computation.

use pyo3::prelude::*;
use std::str::FromStr;

use crate::critical_path::ScheduleError;

/// Where the backward pass anchors tasks that nothing depends on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TerminalAnchor {
    /// Latest finish of a terminal task is the project horizon.
    #[default]
    ProjectFinish,
    /// Latest finish of a terminal task is its own earliest finish,
    /// which puts every terminal task on the critical path.
    OwnFinish,
}

impl TerminalAnchor {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProjectFinish => "project_finish",
            Self::OwnFinish => "own_finish",
        }
    }
}

impl FromStr for TerminalAnchor {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "project_finish" => Ok(Self::ProjectFinish),
            "own_finish" => Ok(Self::OwnFinish),
            other => Err(ScheduleError::UnknownTerminalAnchor(other.to_string())),
        }
    }
}

/// Configuration for `compute_schedule`.
#[pyclass]
#[derive(Clone, Debug)]
pub struct ScheduleConfig {
    /// Terminal task anchoring: "project_finish" or "own_finish"
    #[pyo3(get, set)]
    pub terminal_anchor: String,
    /// Verbosity level: 0=silent, 1=summary, 2=steps, 3=debug
    #[pyo3(get, set)]
    pub verbosity: u8,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            terminal_anchor: TerminalAnchor::default().as_str().to_string(),
            verbosity: 0,
        }
    }
}

impl ScheduleConfig {
    pub fn with_anchor(anchor: TerminalAnchor) -> Self {
        Self {
            terminal_anchor: anchor.as_str().to_string(),
            ..Self::default()
        }
    }

    /// Parse the configured terminal anchor.
    pub fn anchor(&self) -> Result<TerminalAnchor, ScheduleError> {
        self.terminal_anchor.parse()
    }
}

#[pymethods]
impl ScheduleConfig {
    #[new]
    #[pyo3(signature = (terminal_anchor=None, verbosity=None))]
    fn new(terminal_anchor: Option<String>, verbosity: Option<u8>) -> Self {
        let defaults = Self::default();
        Self {
            terminal_anchor: terminal_anchor.unwrap_or(defaults.terminal_anchor),
            verbosity: verbosity.unwrap_or(defaults.verbosity),
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "ScheduleConfig(terminal_anchor={:?}, verbosity={})",
            self.terminal_anchor, self.verbosity
        )
    }
}
