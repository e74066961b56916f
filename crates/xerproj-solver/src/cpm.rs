//! Critical Path Method forward/backward pass.
//!
//! Operates in wall-clock seconds: one day of lag is 86400 seconds, task
//! durations are hours converted to seconds with `* 3600`. Calendars are
//! never consulted. Both passes walk an explicit order derived from
//! [`crate::dag::topological_order`] rather than recursing, so pathological
//! linear chains cannot blow the call stack.

use std::collections::HashMap;

use chrono::Utc;
use xerproj_core::{ComputedFields, Diagnostic, DiagnosticCode, DiagnosticEmitter, RelationshipType, Schedule, Severity};

use crate::dag::{Edge, TaskGraph};

const SECONDS_PER_DAY: i64 = 86_400;
const SECONDS_PER_HOUR: i64 = 3_600;

/// Stands in for "no target start": far enough in the past that no real
/// lag/duration arithmetic against it can overflow `i64`.
const EARLY_SENTINEL_SECONDS: i64 = i64::MIN / 4;

/// Run the CPM forward/backward pass over `schedule` and write
/// [`ComputedFields`] for every task, keyed by task id. Cyclic input is
/// handled best-effort: a residual node's computed fields are derived from
/// whatever predecessor/successor values happened to be available when it
/// was reached, and a [`DiagnosticCode::CycleDetected`] is emitted.
pub fn run(schedule: &mut Schedule, emitter: &mut dyn DiagnosticEmitter) {
    let graph = TaskGraph::build(schedule);
    let topo = crate::dag::topological_order(&graph);

    if !topo.remaining.is_empty() {
        tracing::warn!(count = topo.remaining.len(), "cycle detected in task graph");
        emitter.emit(
            Diagnostic::new(
                DiagnosticCode::CycleDetected,
                Severity::Warning,
                format!("{} task(s) participate in a dependency cycle", topo.remaining.len()),
            )
            .with_context(topo.remaining.join(",")),
        );
    }

    // Process the acyclic order first, then whatever is left over, so a
    // cyclic residual still gets best-effort values instead of none.
    let mut order: Vec<&str> = topo.order;
    order.extend(topo.remaining.iter().copied());

    let duration_seconds: HashMap<&str, i64> = order
        .iter()
        .map(|&id| (id, (schedule.tasks[id].target_duration_hours * SECONDS_PER_HOUR as f64) as i64))
        .collect();

    let target_start_seconds: HashMap<&str, i64> = order
        .iter()
        .map(|&id| {
            let seconds = schedule.tasks[id]
                .target_start
                .map(|dt| dt.and_utc().timestamp())
                .unwrap_or(EARLY_SENTINEL_SECONDS);
            (id, seconds)
        })
        .collect();

    let mut early_start: HashMap<&str, i64> = HashMap::with_capacity(order.len());
    let mut early_end: HashMap<&str, i64> = HashMap::with_capacity(order.len());

    for &task_id in &order {
        let d = duration_seconds[task_id];
        let mut es = target_start_seconds[task_id];

        for edge in graph.predecessors_of(task_id) {
            if let Some(candidate) = forward_candidate(edge, &early_start, &early_end, d) {
                if candidate > es {
                    es = candidate;
                }
            }
        }

        early_start.insert(task_id, es);
        early_end.insert(task_id, es + d);
    }

    let project_end = early_end
        .values()
        .copied()
        .max()
        .unwrap_or_else(|| Utc::now().timestamp());

    let mut late_start: HashMap<&str, i64> = HashMap::with_capacity(order.len());
    let mut late_end: HashMap<&str, i64> = HashMap::with_capacity(order.len());

    for &task_id in order.iter().rev() {
        let d = duration_seconds[task_id];
        let mut lf = project_end;

        for edge in graph.successors_of(task_id) {
            if let Some(candidate) = backward_candidate(edge, &late_start, &late_end, d) {
                if candidate < lf {
                    lf = candidate;
                }
            }
        }

        late_end.insert(task_id, lf);
        late_start.insert(task_id, lf - d);
    }

    for &task_id in &order {
        let es = early_start[task_id];
        let ee = early_end[task_id];
        let ls = late_start[task_id];
        let le = late_end[task_id];
        let total_float_hours = (ls - es) as f64 / SECONDS_PER_HOUR as f64;

        let free_float_hours = {
            let successor_starts: Vec<i64> = graph
                .successors_of(task_id)
                .iter()
                .filter_map(|edge| early_start.get(edge.other_task_id).copied())
                .collect();
            if successor_starts.is_empty() {
                total_float_hours
            } else {
                let min_successor_start = successor_starts.into_iter().min().unwrap();
                ((min_successor_start - ee) as f64 / SECONDS_PER_HOUR as f64).max(0.0)
            }
        };

        schedule.computed.insert(
            task_id.to_string(),
            ComputedFields {
                early_start_seconds: es,
                early_end_seconds: ee,
                late_start_seconds: ls,
                late_end_seconds: le,
                total_float_hours,
                free_float_hours,
            },
        );
    }
}

fn forward_candidate(
    edge: &Edge,
    early_start: &HashMap<&str, i64>,
    early_end: &HashMap<&str, i64>,
    successor_duration: i64,
) -> Option<i64> {
    let pred = edge.other_task_id;
    let lag_seconds = (edge.relationship.lag_days * SECONDS_PER_DAY as f64) as i64;

    let base = match edge.relationship.rel_type {
        RelationshipType::FinishToStart => *early_end.get(pred)?,
        RelationshipType::StartToStart => *early_start.get(pred)?,
        RelationshipType::FinishToFinish => early_end.get(pred)? - successor_duration,
        RelationshipType::StartToFinish => early_start.get(pred)? - successor_duration,
    };

    Some(base + lag_seconds)
}

/// The `StartToFinish` arm intentionally mirrors the `FinishToFinish` arm
/// (`successor.lateEnd`, unadjusted by this task's own duration) rather than
/// the duration-corrected form the forward pass would suggest — preserved
/// from the source behavior rather than "fixed".
fn backward_candidate(
    edge: &Edge,
    late_start: &HashMap<&str, i64>,
    late_end: &HashMap<&str, i64>,
    predecessor_duration: i64,
) -> Option<i64> {
    let succ = edge.other_task_id;
    let lag_seconds = (edge.relationship.lag_days * SECONDS_PER_DAY as f64) as i64;

    let base = match edge.relationship.rel_type {
        RelationshipType::FinishToStart => *late_start.get(succ)?,
        RelationshipType::StartToStart => late_start.get(succ)? + predecessor_duration,
        RelationshipType::FinishToFinish => *late_end.get(succ)?,
        RelationshipType::StartToFinish => *late_end.get(succ)?,
    };

    Some(base - lag_seconds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use xerproj_core::{CollectingEmitter, Project, Relationship, Task, TaskStatus, TaskType};

    fn task(id: &str, duration_hours: f64, target_start: Option<chrono::NaiveDateTime>) -> Task {
        Task {
            id: id.to_string(),
            project_id: "p".to_string(),
            wbs_id: None,
            task_code: id.to_string(),
            name: id.to_string(),
            task_type: TaskType::TaskDependent,
            status: TaskStatus::NotStarted,
            percent_complete: 0.0,
            target_start,
            target_end: None,
            actual_start: None,
            actual_end: None,
            target_duration_hours: duration_hours,
            remaining_duration_hours: duration_hours,
        }
    }

    fn fs(successor: &str, predecessor: &str) -> Relationship {
        Relationship {
            successor_task_id: successor.to_string(),
            predecessor_task_id: predecessor.to_string(),
            rel_type: RelationshipType::FinishToStart,
            lag_days: 0.0,
        }
    }

    fn new_schedule() -> Schedule {
        Schedule::new(Project {
            id: "p".to_string(),
            short_name: "P".to_string(),
            name: "Project".to_string(),
            plan_start: None,
            plan_end: None,
            data_date: None,
        })
    }

    fn day(y: i32, m: u32, d: u32) -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(8, 0, 0).unwrap()
    }

    #[test]
    fn two_task_chain_second_task_is_critical() {
        let mut schedule = new_schedule();
        schedule.tasks.insert("t1".to_string(), task("t1", 40.0, Some(day(2024, 1, 1))));
        schedule.tasks.insert("t2".to_string(), task("t2", 40.0, None));
        schedule.relationships.push(fs("t2", "t1"));

        let mut emitter = CollectingEmitter::new();
        run(&mut schedule, &mut emitter);

        let t2 = &schedule.computed["t2"];
        assert_eq!(t2.total_float_hours, 0.0);
        assert!(t2.is_critical());
    }

    #[test]
    fn lag_days_shift_early_start_by_whole_days() {
        let mut schedule = new_schedule();
        schedule.tasks.insert("t1".to_string(), task("t1", 8.0, Some(day(2024, 1, 1))));
        schedule.tasks.insert("t2".to_string(), task("t2", 8.0, None));
        schedule.relationships.push(Relationship {
            successor_task_id: "t2".to_string(),
            predecessor_task_id: "t1".to_string(),
            rel_type: RelationshipType::FinishToStart,
            lag_days: 1.0,
        });

        let mut emitter = CollectingEmitter::new();
        run(&mut schedule, &mut emitter);

        let t1 = &schedule.computed["t1"];
        let t2 = &schedule.computed["t2"];
        assert_eq!(t2.early_start_seconds - t1.early_end_seconds, SECONDS_PER_DAY);
    }

    #[test]
    fn cycle_is_reported_and_still_produces_values() {
        let mut schedule = new_schedule();
        schedule.tasks.insert("a".to_string(), task("a", 8.0, None));
        schedule.tasks.insert("b".to_string(), task("b", 8.0, None));
        schedule.relationships.push(fs("b", "a"));
        schedule.relationships.push(fs("a", "b"));

        let mut emitter = CollectingEmitter::new();
        run(&mut schedule, &mut emitter);

        assert_eq!(emitter.by_code(DiagnosticCode::CycleDetected).count(), 1);
        assert!(schedule.computed.contains_key("a"));
        assert!(schedule.computed.contains_key("b"));
    }

    #[test]
    fn repeated_runs_are_deterministic() {
        let mut schedule = new_schedule();
        schedule.tasks.insert("t1".to_string(), task("t1", 40.0, Some(day(2024, 1, 1))));
        schedule.tasks.insert("t2".to_string(), task("t2", 40.0, None));
        schedule.relationships.push(fs("t2", "t1"));

        let mut emitter = CollectingEmitter::new();
        run(&mut schedule, &mut emitter);
        let first = schedule.computed.clone();

        let mut emitter2 = CollectingEmitter::new();
        run(&mut schedule, &mut emitter2);
        let second = schedule.computed.clone();

        assert_eq!(first, second);
    }

    #[test]
    fn no_predecessors_keeps_target_start_anchor() {
        let mut schedule = new_schedule();
        schedule.tasks.insert("solo".to_string(), task("solo", 8.0, Some(day(2024, 3, 1))));

        let mut emitter = CollectingEmitter::new();
        run(&mut schedule, &mut emitter);

        let expected = day(2024, 3, 1).and_utc().timestamp();
        assert_eq!(schedule.computed["solo"].early_start_seconds, expected);
    }
}
