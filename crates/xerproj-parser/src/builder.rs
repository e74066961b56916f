//! Maps recognized XER tables to typed records in the normalized schedule
//! model, coercing strings to dates, enums, and numbers with the
//! documented tolerant defaults.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use xerproj_core::{
    ActivityCode, ActivityCodeScope, ActivityCodeType, Diagnostic, DiagnosticCode,
    DiagnosticEmitter, Project, Relationship, RelationshipType, Resource, ResourceAssignment,
    ResourceType, Schedule, Task, TaskActivityCode, TaskStatus, TaskType, WbsElement,
    WorkCalendar, XerProjError,
};

use crate::xer::TableMap;

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Build a [`Schedule`] from the tokenized table map. `PROJECT` is the only
/// table whose absence fails the build; every other missing table yields an
/// empty collection.
pub fn build_schedule(
    tables: &TableMap,
    emitter: &mut dyn DiagnosticEmitter,
) -> Result<Schedule, XerProjError> {
    let project_rows = tables
        .get("PROJECT")
        .ok_or_else(|| XerProjError::MissingRequiredTable("PROJECT".to_string()))?;
    let project_row = project_rows
        .rows
        .first()
        .ok_or_else(|| XerProjError::MissingRequiredTable("PROJECT".to_string()))?;

    let project = Project {
        id: field(project_row, "proj_id"),
        short_name: field(project_row, "proj_short_name"),
        name: field(project_row, "proj_name"),
        plan_start: coerce_date(project_row, "plan_start_date", "PROJECT", emitter),
        plan_end: coerce_date(project_row, "plan_end_date", "PROJECT", emitter),
        data_date: coerce_date(project_row, "last_recalc_date", "PROJECT", emitter),
    };

    let mut schedule = Schedule::new(project);

    schedule.wbs_elements = tables
        .get("PROJWBS")
        .map(|t| t.rows.iter().map(build_wbs_element).collect())
        .unwrap_or_default();

    schedule.calendars = tables
        .get("CALENDAR")
        .map(|t| t.rows.iter().map(build_calendar).collect())
        .unwrap_or_default();

    let known_project_ids: std::collections::HashSet<&str> =
        std::iter::once(schedule.project.id.as_str()).collect();

    if let Some(task_table) = tables.get("TASK") {
        let mut by_id: HashMap<String, Task> = HashMap::new();
        for row in &task_table.rows {
            let task = build_task(row, emitter);
            if !known_project_ids.contains(task.project_id.as_str()) {
                tracing::debug!(task_id = %task.id, "dropping orphan task, unknown project");
                emitter.emit(
                    Diagnostic::new(
                        DiagnosticCode::OrphanTaskDropped,
                        xerproj_core::Severity::Warning,
                        "task references a project id not present in this export",
                    )
                    .with_context(task.id.clone()),
                );
                continue;
            }
            if by_id.contains_key(&task.id) {
                tracing::debug!(task_id = %task.id, "duplicate task id; later row wins");
                emitter.emit(
                    Diagnostic::new(
                        DiagnosticCode::DuplicateTaskId,
                        xerproj_core::Severity::Warning,
                        "duplicate task id; later row replaces the earlier one",
                    )
                    .with_context(task.id.clone()),
                );
            }
            by_id.insert(task.id.clone(), task);
        }
        schedule.tasks = by_id;
    }

    schedule.relationships = tables
        .get("TASKPRED")
        .map(|t| t.rows.iter().map(build_relationship).collect())
        .unwrap_or_default();

    schedule.resources = tables
        .get("RSRC")
        .map(|t| t.rows.iter().map(build_resource).collect())
        .unwrap_or_default();

    schedule.assignments = tables
        .get("TASKRSRC")
        .map(|t| t.rows.iter().map(build_assignment).collect())
        .unwrap_or_default();

    schedule.activity_code_types = tables
        .get("ACTVTYPE")
        .map(|t| t.rows.iter().map(build_activity_code_type).collect())
        .unwrap_or_default();

    schedule.activity_codes = tables
        .get("ACTVCODE")
        .map(|t| t.rows.iter().map(build_activity_code).collect())
        .unwrap_or_default();

    schedule.task_activity_codes = tables
        .get("TASKACTV")
        .map(|t| t.rows.iter().map(build_task_activity_code).collect())
        .unwrap_or_default();

    Ok(schedule)
}

fn field(row: &HashMap<String, String>, name: &str) -> String {
    row.get(name).filter(|s| !s.is_empty()).cloned().unwrap_or_default()
}

fn opt_field(row: &HashMap<String, String>, name: &str) -> Option<String> {
    row.get(name).filter(|s| !s.is_empty()).cloned()
}

fn coerce_date(
    row: &HashMap<String, String>,
    name: &str,
    context: &str,
    emitter: &mut dyn DiagnosticEmitter,
) -> Option<NaiveDateTime> {
    let raw = opt_field(row, name)?;
    match NaiveDateTime::parse_from_str(&raw, DATE_FORMAT) {
        Ok(date) => Some(date),
        Err(_) => {
            tracing::debug!(field = name, value = %raw, "malformed date coerced to null");
            emitter.emit(
                Diagnostic::new(
                    DiagnosticCode::DateCoerced,
                    xerproj_core::Severity::Info,
                    format!("could not parse {name:?} = {raw:?} as {DATE_FORMAT:?}"),
                )
                .with_context(context.to_string()),
            );
            None
        }
    }
}

fn coerce_f64(row: &HashMap<String, String>, name: &str, default: f64) -> f64 {
    opt_field(row, name).and_then(|s| s.parse().ok()).unwrap_or(default)
}

fn coerce_i64(row: &HashMap<String, String>, name: &str, default: i64) -> i64 {
    opt_field(row, name).and_then(|s| s.parse().ok()).unwrap_or(default)
}

fn build_wbs_element(row: &HashMap<String, String>) -> WbsElement {
    WbsElement {
        id: field(row, "wbs_id"),
        project_id: field(row, "proj_id"),
        parent_id: opt_field(row, "parent_wbs_id"),
        name: field(row, "wbs_name"),
        short_name: field(row, "wbs_short_name"),
        sequence_number: coerce_i64(row, "seq_num", 0),
    }
}

fn build_calendar(row: &HashMap<String, String>) -> WorkCalendar {
    WorkCalendar {
        id: field(row, "clndr_id"),
        name: field(row, "clndr_name"),
        project_id: opt_field(row, "proj_id"),
        is_default: field(row, "default_flag") == "Y",
        hours_per_day: coerce_f64(row, "day_hr_cnt", 8.0),
        hours_per_week: coerce_f64(row, "week_hr_cnt", 40.0),
        hours_per_month: coerce_f64(row, "month_hr_cnt", 172.0),
        hours_per_year: coerce_f64(row, "year_hr_cnt", 2080.0),
        ..WorkCalendar::default()
    }
}

fn build_task(row: &HashMap<String, String>, emitter: &mut dyn DiagnosticEmitter) -> Task {
    let (task_type, known) = TaskType::from_raw_token(&field(row, "task_type"));
    if !known {
        emit_unknown_token(emitter, "task_type", &field(row, "task_type"));
    }
    let (status, known) = TaskStatus::from_raw_token(&field(row, "status_code"));
    if !known {
        emit_unknown_token(emitter, "status_code", &field(row, "status_code"));
    }

    Task {
        id: field(row, "task_id"),
        project_id: field(row, "proj_id"),
        wbs_id: opt_field(row, "wbs_id"),
        task_code: field(row, "task_code"),
        name: field(row, "task_name"),
        task_type,
        status,
        percent_complete: coerce_f64(row, "phys_complete_pct", 0.0),
        target_start: coerce_date(row, "target_start_date", "TASK", emitter),
        target_end: coerce_date(row, "target_end_date", "TASK", emitter),
        actual_start: coerce_date(row, "act_start_date", "TASK", emitter),
        actual_end: coerce_date(row, "act_end_date", "TASK", emitter),
        target_duration_hours: coerce_f64(row, "target_drtn_hr_cnt", 0.0),
        remaining_duration_hours: coerce_f64(row, "remain_drtn_hr_cnt", 0.0),
    }
}

fn build_relationship(row: &HashMap<String, String>) -> Relationship {
    let (rel_type, _known) = RelationshipType::from_raw_token(&field(row, "pred_type"));
    Relationship {
        successor_task_id: field(row, "task_id"),
        predecessor_task_id: field(row, "pred_task_id"),
        rel_type,
        lag_days: coerce_f64(row, "lag_hr_cnt", 0.0) / 8.0,
    }
}

fn build_resource(row: &HashMap<String, String>) -> Resource {
    let (resource_type, _known) = ResourceType::from_raw_token(&field(row, "rsrc_type"));
    Resource {
        id: field(row, "rsrc_id"),
        short_name: field(row, "rsrc_short_name"),
        name: field(row, "rsrc_name"),
        resource_type,
        unit: field(row, "unit_of_measure"),
        default_units_per_time: coerce_f64(row, "def_qty_per_hr", 1.0),
    }
}

fn build_assignment(row: &HashMap<String, String>) -> ResourceAssignment {
    ResourceAssignment {
        task_id: field(row, "task_id"),
        resource_id: field(row, "rsrc_id"),
        project_id: field(row, "proj_id"),
        target_quantity: coerce_f64(row, "target_qty", 0.0),
        actual_quantity: coerce_f64(row, "act_reg_qty", 0.0),
        remaining_quantity: coerce_f64(row, "remain_qty", 0.0),
        target_cost: coerce_f64(row, "target_cost", 0.0),
        actual_cost: coerce_f64(row, "act_reg_cost", 0.0),
    }
}

fn build_activity_code_type(row: &HashMap<String, String>) -> ActivityCodeType {
    let (scope, _known) = ActivityCodeScope::from_raw_token(&field(row, "actv_code_type_scope"));
    ActivityCodeType {
        id: field(row, "actv_code_type_id"),
        name: field(row, "actv_code_type"),
        short_length: coerce_i64(row, "actv_short_len", 0),
        sequence_number: coerce_i64(row, "seq_num", 0),
        project_id: opt_field(row, "proj_id"),
        scope,
    }
}

fn build_activity_code(row: &HashMap<String, String>) -> ActivityCode {
    ActivityCode {
        id: field(row, "actv_code_id"),
        type_id: field(row, "actv_code_type_id"),
        parent_id: opt_field(row, "parent_actv_code_id"),
        name: field(row, "actv_code_name"),
        short_name: field(row, "short_name"),
        sequence_number: coerce_i64(row, "seq_num", 0),
        color: opt_field(row, "color"),
    }
}

fn build_task_activity_code(row: &HashMap<String, String>) -> TaskActivityCode {
    TaskActivityCode {
        task_id: field(row, "task_id"),
        code_id: field(row, "actv_code_id"),
        type_id: field(row, "actv_code_type_id"),
        project_id: field(row, "proj_id"),
    }
}

fn emit_unknown_token(emitter: &mut dyn DiagnosticEmitter, field_name: &str, raw: &str) {
    tracing::debug!(field = field_name, value = %raw, "unknown enum token coerced to default");
    emitter.emit(Diagnostic::new(
        DiagnosticCode::UnknownEnumToken,
        xerproj_core::Severity::Info,
        format!("unknown value {raw:?} for {field_name}; coerced to documented default"),
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xer::read_tables;
    use xerproj_core::CollectingEmitter;

    fn build(input: &str) -> Result<Schedule, XerProjError> {
        let mut emitter = CollectingEmitter::new();
        let tables = read_tables(input.as_bytes(), &mut emitter).unwrap();
        build_schedule(&tables, &mut emitter)
    }

    fn smoke_input() -> &'static str {
        "ERMHDR\n\
         %T\tPROJECT\n\
         %F\tproj_id\tproj_short_name\tproj_name\tplan_start_date\tplan_end_date\n\
         %R\t1000\tTEST\tTest Project\t2024-01-15 08:00\t2024-12-31 17:00\n\
         %T\tTASK\n\
         %F\ttask_id\tproj_id\ttask_code\ttarget_drtn_hr_cnt\n\
         %R\t1001\t1000\tA1000\t80\n\
         %R\t1002\t1000\tA1010\t80\n\
         %T\tTASKPRED\n\
         %F\ttask_id\tpred_task_id\tpred_type\tlag_hr_cnt\n\
         %R\t1002\t1001\tPR_FS\t0\n\
         %E\n"
    }

    #[test]
    fn smoke_parse_yields_one_project_two_tasks_one_relationship() {
        let schedule = build(smoke_input()).unwrap();
        assert_eq!(schedule.project.id, "1000");
        assert_eq!(schedule.tasks.len(), 2);
        assert_eq!(schedule.relationships.len(), 1);
        assert_eq!(schedule.relationships[0].rel_type, RelationshipType::FinishToStart);
    }

    #[test]
    fn missing_project_table_fails() {
        let input = "ERMHDR\n%T\tTASK\n%F\ttask_id\tproj_id\n%R\t1\t1\n%E\n";
        let err = build(input).unwrap_err();
        assert_eq!(err, XerProjError::MissingRequiredTable("PROJECT".to_string()));
    }

    #[test]
    fn lag_hours_convert_to_days() {
        let input = "ERMHDR\n\
            %T\tPROJECT\n%F\tproj_id\n%R\t1\n\
            %T\tTASKPRED\n%F\ttask_id\tpred_task_id\tpred_type\tlag_hr_cnt\n\
            %R\ta\tb\tPR_FS\t0\n\
            %R\ta\tc\tPR_FS\t8\n\
            %R\ta\td\tPR_FS\t16\n\
            %E\n";
        let schedule = build(input).unwrap();
        let lags: Vec<f64> = schedule.relationships.iter().map(|r| r.lag_days).collect();
        assert_eq!(lags, vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn relationship_type_coverage() {
        let input = "ERMHDR\n\
            %T\tPROJECT\n%F\tproj_id\n%R\t1\n\
            %T\tTASKPRED\n%F\ttask_id\tpred_task_id\tpred_type\n\
            %R\ta\tb\tPR_FS\n\
            %R\ta\tc\tPR_SS\n\
            %R\ta\td\tPR_FF\n\
            %R\ta\te\tPR_SF\n\
            %R\ta\tf\tPR_??\n\
            %E\n";
        let schedule = build(input).unwrap();
        let types: Vec<RelationshipType> = schedule.relationships.iter().map(|r| r.rel_type).collect();
        assert_eq!(
            types,
            vec![
                RelationshipType::FinishToStart,
                RelationshipType::StartToStart,
                RelationshipType::FinishToFinish,
                RelationshipType::StartToFinish,
                RelationshipType::FinishToStart,
            ]
        );
    }

    #[test]
    fn orphan_task_is_dropped_with_diagnostic() {
        let input = "ERMHDR\n\
            %T\tPROJECT\n%F\tproj_id\n%R\t1\n\
            %T\tTASK\n%F\ttask_id\tproj_id\n%R\t1001\t999\n\
            %E\n";
        let mut emitter = CollectingEmitter::new();
        let tables = read_tables(input.as_bytes(), &mut emitter).unwrap();
        let schedule = build_schedule(&tables, &mut emitter).unwrap();
        assert!(schedule.tasks.is_empty());
        assert_eq!(emitter.by_code(DiagnosticCode::OrphanTaskDropped).count(), 1);
    }

    #[test]
    fn duplicate_task_id_last_row_wins() {
        let input = "ERMHDR\n\
            %T\tPROJECT\n%F\tproj_id\n%R\t1\n\
            %T\tTASK\n%F\ttask_id\tproj_id\ttask_name\n%R\t1001\t1\tFirst\n%R\t1001\t1\tSecond\n\
            %E\n";
        let mut emitter = CollectingEmitter::new();
        let tables = read_tables(input.as_bytes(), &mut emitter).unwrap();
        let schedule = build_schedule(&tables, &mut emitter).unwrap();
        assert_eq!(schedule.tasks.len(), 1);
        assert_eq!(schedule.tasks["1001"].name, "Second");
        assert_eq!(emitter.by_code(DiagnosticCode::DuplicateTaskId).count(), 1);
    }

    #[test]
    fn malformed_date_coerces_to_null_with_diagnostic() {
        let input = "ERMHDR\n\
            %T\tPROJECT\n%F\tproj_id\tplan_start_date\n%R\t1\tnot-a-date\n\
            %E\n";
        let mut emitter = CollectingEmitter::new();
        let tables = read_tables(input.as_bytes(), &mut emitter).unwrap();
        let schedule = build_schedule(&tables, &mut emitter).unwrap();
        assert!(schedule.project.plan_start.is_none());
        assert_eq!(emitter.by_code(DiagnosticCode::DateCoerced).count(), 1);
    }

    #[test]
    fn zero_task_schedule_builds_successfully() {
        let schedule = build("ERMHDR\n%T\tPROJECT\n%F\tproj_id\n%R\t1\n%E\n").unwrap();
        assert!(schedule.tasks.is_empty());
    }
}
