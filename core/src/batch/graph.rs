use std::collections::HashMap;

use crate::error::BatchError;

use super::types::{BatchPlan, TaskLike};

/// DFS marking used by cycle detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

/// Task dependency graph (DAG) over a parsed batch.
#[derive(Debug, Clone)]
pub struct TaskGraph {
    /// Dependency edges: task_id -> list of dependencies
    pub edges: HashMap<String, Vec<String>>,

    /// Original insertion order (for stable traversal)
    insertion_order: Vec<String>,
}

impl TaskGraph {
    /// Construct the graph from a batch plan
    pub fn from_plan(plan: &BatchPlan) -> Self {
        let edges = plan
            .iter()
            .map(|task| (task.id().to_string(), task.dependencies().to_vec()))
            .collect();

        Self {
            edges,
            insertion_order: plan.order.clone(),
        }
    }

    /// Validate dependency relationships
    pub fn validate(&self) -> Result<(), BatchError> {
        // Check all dependencies exist
        for task_id in &self.insertion_order {
            for dep in &self.edges[task_id] {
                if !self.edges.contains_key(dep) {
                    return Err(BatchError::DependencyNotFound {
                        task_id: task_id.clone(),
                        missing_dep: dep.clone(),
                    });
                }
            }
        }

        // Detect circular dependencies
        if let Some(cycle) = self.detect_cycle() {
            return Err(BatchError::CircularDependency(cycle));
        }

        Ok(())
    }

    /// Detect circular dependencies using three-colour DFS, returning the
    /// cycle as `a -> b -> a`.
    ///
    /// # Time Complexity
    ///
    /// O(V + E) where V = number of tasks, E = number of dependencies
    pub fn detect_cycle(&self) -> Option<String> {
        let mut marks: HashMap<&str, Mark> = self
            .insertion_order
            .iter()
            .map(|id| (id.as_str(), Mark::Unvisited))
            .collect();
        let mut stack = Vec::new();

        for task_id in &self.insertion_order {
            if marks[task_id.as_str()] == Mark::Unvisited {
                if let Some(cycle) = self.dfs_cycle(task_id, &mut marks, &mut stack) {
                    return Some(format_cycle_path(&cycle));
                }
            }
        }

        None
    }

    fn dfs_cycle<'a>(
        &'a self,
        node: &'a str,
        marks: &mut HashMap<&'a str, Mark>,
        stack: &mut Vec<&'a str>,
    ) -> Option<Vec<&'a str>> {
        marks.insert(node, Mark::InProgress);
        stack.push(node);

        if let Some(dependencies) = self.edges.get(node) {
            for dep in dependencies {
                match marks.get(dep.as_str()).copied() {
                    // Back edge: the dependency is on the current path
                    Some(Mark::InProgress) => {
                        let pos = stack.iter().position(|x| *x == dep.as_str())?;
                        let mut cycle = stack[pos..].to_vec();
                        cycle.push(dep.as_str());
                        return Some(cycle);
                    }
                    Some(Mark::Unvisited) => {
                        if let Some(cycle) = self.dfs_cycle(dep, marks, stack) {
                            return Some(cycle);
                        }
                    }
                    Some(Mark::Done) | None => {}
                }
            }
        }

        stack.pop();
        marks.insert(node, Mark::Done);
        None
    }
}

/// Cycle check over a task table, returning the cycle path or `None`.
pub fn detect_cycle(plan: &BatchPlan) -> Option<String> {
    TaskGraph::from_plan(plan).detect_cycle()
}

fn format_cycle_path(stack: &[&str]) -> String {
    stack.join(" -> ")
}
