//! Dependency graph over the flat task/relationship model, and the
//! topological order the CPM passes walk.
//!
//! Unlike a WBS, there is no container/leaf distinction here: every task in
//! the schedule is a graph node. Dangling relationships (an edge naming a
//! task id absent from the task set) are kept rather than dropped — the
//! analyzer's logic check is what surfaces them, not this module.

use std::collections::{HashMap, HashSet, VecDeque};

use xerproj_core::{Relationship, Schedule};

/// A predecessor→successor edge, carried alongside the relationship it was
/// built from so callers can recover type and lag.
#[derive(Debug, Clone)]
pub struct Edge<'a> {
    pub other_task_id: &'a str,
    pub relationship: &'a Relationship,
}

/// Adjacency indexes built once per CPM run, per the guidance that large
/// schedules should not rebuild these per task.
pub struct TaskGraph<'a> {
    pub task_ids: Vec<&'a str>,
    pub predecessors: HashMap<&'a str, Vec<Edge<'a>>>,
    pub successors: HashMap<&'a str, Vec<Edge<'a>>>,
}

impl<'a> TaskGraph<'a> {
    /// Build predecessor/successor adjacency from a schedule's tasks and
    /// relationships. Relationships referencing a task id outside the task
    /// set still appear in the graph's edges keyed by the present side;
    /// CPM simply never visits a node that does not exist.
    pub fn build(schedule: &'a Schedule) -> Self {
        let task_ids: Vec<&str> = schedule.tasks.keys().map(String::as_str).collect();
        let mut predecessors: HashMap<&str, Vec<Edge<'a>>> =
            task_ids.iter().map(|&id| (id, Vec::new())).collect();
        let mut successors: HashMap<&str, Vec<Edge<'a>>> =
            task_ids.iter().map(|&id| (id, Vec::new())).collect();

        for relationship in &schedule.relationships {
            let successor = relationship.successor_task_id.as_str();
            let predecessor = relationship.predecessor_task_id.as_str();

            if schedule.tasks.contains_key(successor) {
                predecessors.entry(successor).or_default().push(Edge {
                    other_task_id: predecessor,
                    relationship,
                });
            }
            if schedule.tasks.contains_key(predecessor) {
                successors.entry(predecessor).or_default().push(Edge {
                    other_task_id: successor,
                    relationship,
                });
            }
        }

        Self {
            task_ids,
            predecessors,
            successors,
        }
    }

    pub fn predecessors_of(&self, task_id: &str) -> &[Edge<'a>] {
        self.predecessors.get(task_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn successors_of(&self, task_id: &str) -> &[Edge<'a>] {
        self.successors.get(task_id).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Kahn's algorithm: a queue of zero-indegree nodes, in declaration order.
/// Residual unsorted nodes after the queue drains are a cycle; they are
/// returned as `remaining` rather than propagated as an error, since the
/// CPM passes still owe every task *some* computed value.
pub struct TopoResult<'a> {
    pub order: Vec<&'a str>,
    pub remaining: Vec<&'a str>,
}

pub fn topological_order<'a>(graph: &TaskGraph<'a>) -> TopoResult<'a> {
    let nodes: HashSet<&str> = graph.task_ids.iter().copied().collect();
    let mut in_degree: HashMap<&str, usize> = graph.task_ids.iter().map(|&id| (id, 0)).collect();
    for (&task_id, edges) in &graph.predecessors {
        // A dangling edge's other endpoint is not a node in this graph; it
        // can never be visited to decrement the count, so it must not be
        // counted in the first place or every dangling-pred task would be
        // misreported as part of a cycle.
        let real_edges = edges.iter().filter(|edge| nodes.contains(edge.other_task_id)).count();
        in_degree.insert(task_id, real_edges);
    }

    let mut queue: VecDeque<&str> = graph
        .task_ids
        .iter()
        .copied()
        .filter(|id| in_degree[id] == 0)
        .collect();

    let mut order = Vec::with_capacity(graph.task_ids.len());
    let mut visited: HashSet<&str> = HashSet::new();

    while let Some(task_id) = queue.pop_front() {
        if !visited.insert(task_id) {
            continue;
        }
        order.push(task_id);
        for edge in graph.successors_of(task_id) {
            if let Some(degree) = in_degree.get_mut(edge.other_task_id) {
                *degree -= 1;
                if *degree == 0 {
                    queue.push_back(edge.other_task_id);
                }
            }
        }
    }

    let remaining: Vec<&str> = graph
        .task_ids
        .iter()
        .copied()
        .filter(|id| !visited.contains(id))
        .collect();

    TopoResult { order, remaining }
}
