//! Dependency graph construction.
//!
//! Builds the per-call adjacency (task -> direct prerequisites) that both the
//! cycle detector and the scheduler run over. Every id that appears in the
//! snapshot, either as a task or as a referenced prerequisite, gets a slot.

use rustc_hash::FxHashMap;

use crate::interner::{Slot, TaskIdInterner};
use crate::models::{DependencyEdge, Task, TaskKey};

/// Adjacency over dense slots, built fresh from one task snapshot.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    index: TaskIdInterner,
    /// `None` for ids that are only referenced as prerequisites (dangling).
    durations: Vec<Option<u32>>,
    /// Direct prerequisites per slot, duplicates collapsed.
    prerequisites: Vec<Vec<Slot>>,
}

impl DependencyGraph {
    /// Build the graph from a snapshot.
    ///
    /// Tasks receive slots in snapshot order, dangling prerequisite ids after
    /// them in the order they are first referenced. A repeated task id keeps
    /// the later duration and merges its prerequisite lists.
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let mut graph = Self {
            index: TaskIdInterner::with_capacity(tasks.len()),
            durations: Vec::with_capacity(tasks.len()),
            prerequisites: Vec::with_capacity(tasks.len()),
        };

        for task in tasks {
            let slot = graph.ensure_slot(task.id);
            graph.durations[slot as usize] = Some(task.duration);
        }

        for task in tasks {
            for &dep in &task.depends_on {
                graph.insert_edge(task.id, dep);
            }
        }

        graph
    }

    /// Add `edge` to this graph, returning false if it was already present.
    ///
    /// Unknown endpoints become dangling nodes. Only the local graph is
    /// touched; the snapshot it was built from is never modified.
    pub fn add_edge(&mut self, edge: DependencyEdge) -> bool {
        self.insert_edge(edge.dependent, edge.prerequisite)
    }

    fn insert_edge(&mut self, dependent: TaskKey, prerequisite: TaskKey) -> bool {
        let from = self.ensure_slot(dependent);
        let to = self.ensure_slot(prerequisite);
        let list = &mut self.prerequisites[from as usize];
        if list.contains(&to) {
            return false;
        }
        list.push(to);
        true
    }

    fn ensure_slot(&mut self, id: TaskKey) -> Slot {
        let slot = self.index.intern(id);
        if slot as usize == self.durations.len() {
            self.durations.push(None);
            self.prerequisites.push(Vec::new());
        }
        slot
    }

    /// Number of nodes, dangling ids included.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Number of nodes backed by a task record.
    pub fn task_count(&self) -> usize {
        self.durations.iter().filter(|d| d.is_some()).count()
    }

    pub fn slot(&self, id: TaskKey) -> Option<Slot> {
        self.index.get(id)
    }

    pub fn id(&self, slot: Slot) -> TaskKey {
        self.index.resolve(slot)
    }

    pub fn contains_task(&self, id: TaskKey) -> bool {
        self.slot(id).is_some_and(|slot| self.is_task(slot))
    }

    /// Whether the slot carries a task record (as opposed to a dangling reference).
    #[inline]
    pub fn is_task(&self, slot: Slot) -> bool {
        self.durations[slot as usize].is_some()
    }

    #[inline]
    pub fn duration(&self, slot: Slot) -> Option<u32> {
        self.durations[slot as usize]
    }

    #[inline]
    pub fn prerequisites(&self, slot: Slot) -> &[Slot] {
        &self.prerequisites[slot as usize]
    }

    /// Reverse adjacency (slot -> direct dependents), built in a single pass.
    pub fn build_dependents(&self) -> Vec<Vec<Slot>> {
        let mut dependents: Vec<Vec<Slot>> = vec![Vec::new(); self.len()];
        for (from, prereqs) in self.prerequisites.iter().enumerate() {
            for &to in prereqs {
                dependents[to as usize].push(from as Slot);
            }
        }
        dependents
    }

    /// Direct prerequisites of a task, by id.
    pub fn prerequisites_of(&self, id: TaskKey) -> Vec<TaskKey> {
        match self.slot(id) {
            Some(slot) => self.resolve_all(self.prerequisites(slot)),
            None => Vec::new(),
        }
    }

    /// Direct dependents of a task, by id.
    pub fn dependents_of(&self, id: TaskKey) -> Vec<TaskKey> {
        let Some(target) = self.slot(id) else {
            return Vec::new();
        };
        self.prerequisites
            .iter()
            .enumerate()
            .filter(|(_, prereqs)| prereqs.contains(&target))
            .map(|(from, _)| self.id(from as Slot))
            .collect()
    }

    /// Id-keyed view of the adjacency: every node maps to its prerequisites.
    pub fn to_adjacency(&self) -> FxHashMap<TaskKey, Vec<TaskKey>> {
        self.index
            .ids()
            .iter()
            .zip(&self.prerequisites)
            .map(|(&id, prereqs)| (id, self.resolve_all(prereqs)))
            .collect()
    }

    fn resolve_all(&self, slots: &[Slot]) -> Vec<TaskKey> {
        slots.iter().map(|&s| self.id(s)).collect()
    }
}

/// Map every task id (and every referenced prerequisite id) to its direct prerequisites.
pub fn build_adjacency(tasks: &[Task]) -> FxHashMap<TaskKey, Vec<TaskKey>> {
    DependencyGraph::from_tasks(tasks).to_adjacency()
}
