//! Entities of the normalized schedule model.
//!
//! All identifiers are opaque strings as they appear in the source export;
//! nothing here assumes numeric form. `Task` carries only descriptive
//! fields; `ComputedFields` is the CPM engine's side-table, keyed by task
//! id, and `Schedule::task_view` merges the two for analyzer/CLI
//! consumption.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// The root of ownership for a single exported schedule.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub short_name: String,
    pub name: String,
    pub plan_start: Option<NaiveDateTime>,
    pub plan_end: Option<NaiveDateTime>,
    pub data_date: Option<NaiveDateTime>,
}

/// A node in a project's WBS forest (`parent_id` may point outside the
/// project only if dangling, which the builder does not special-case).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WbsElement {
    pub id: String,
    pub project_id: String,
    pub parent_id: Option<String>,
    pub name: String,
    pub short_name: String,
    pub sequence_number: i64,
}

/// Raw export token → documented default, per entity. Unknown raw_token
/// values never fail the build; they coerce to the variant this enum's
/// `Default` impl returns, and the builder records a diagnostic for the
/// substitution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskType {
    TaskDependent,
    ResourceDependent,
    LevelOfEffort,
    StartMilestone,
    FinishMilestone,
    WbsSummary,
}

impl Default for TaskType {
    fn default() -> Self {
        TaskType::TaskDependent
    }
}

impl TaskType {
    /// Decode a raw XER token, falling back to the documented default.
    /// Returns `(variant, was_known)` so callers can decide whether to
    /// record a coercion diagnostic.
    pub fn from_raw_token(token: &str) -> (Self, bool) {
        match token {
            "TT_Task" => (TaskType::TaskDependent, true),
            "TT_Rsrc" => (TaskType::ResourceDependent, true),
            "TT_LOE" => (TaskType::LevelOfEffort, true),
            "TT_Mile" => (TaskType::StartMilestone, true),
            "TT_FinMile" => (TaskType::FinishMilestone, true),
            "TT_WBS" => (TaskType::WbsSummary, true),
            _ => (TaskType::default(), false),
        }
    }

    pub fn as_raw_token(&self) -> &'static str {
        match self {
            TaskType::TaskDependent => "TT_Task",
            TaskType::ResourceDependent => "TT_Rsrc",
            TaskType::LevelOfEffort => "TT_LOE",
            TaskType::StartMilestone => "TT_Mile",
            TaskType::FinishMilestone => "TT_FinMile",
            TaskType::WbsSummary => "TT_WBS",
        }
    }

    pub fn is_start_milestone(&self) -> bool {
        matches!(self, TaskType::StartMilestone)
    }

    pub fn is_finish_milestone(&self) -> bool {
        matches!(self, TaskType::FinishMilestone)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    NotStarted,
    InProgress,
    Completed,
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::NotStarted
    }
}

impl TaskStatus {
    pub fn from_raw_token(token: &str) -> (Self, bool) {
        match token {
            "TK_NotStart" => (TaskStatus::NotStarted, true),
            "TK_Active" => (TaskStatus::InProgress, true),
            "TK_Complete" => (TaskStatus::Completed, true),
            _ => (TaskStatus::default(), false),
        }
    }

    pub fn as_raw_token(&self) -> &'static str {
        match self {
            TaskStatus::NotStarted => "TK_NotStart",
            TaskStatus::InProgress => "TK_Active",
            TaskStatus::Completed => "TK_Complete",
        }
    }
}

/// Relationship polarity between a predecessor and a successor task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationshipType {
    FinishToStart,
    StartToStart,
    FinishToFinish,
    StartToFinish,
}

impl Default for RelationshipType {
    fn default() -> Self {
        RelationshipType::FinishToStart
    }
}

impl RelationshipType {
    pub fn from_raw_token(token: &str) -> (Self, bool) {
        match token {
            "PR_FS" => (RelationshipType::FinishToStart, true),
            "PR_SS" => (RelationshipType::StartToStart, true),
            "PR_FF" => (RelationshipType::FinishToFinish, true),
            "PR_SF" => (RelationshipType::StartToFinish, true),
            _ => (RelationshipType::default(), false),
        }
    }

    pub fn as_raw_token(&self) -> &'static str {
        match self {
            RelationshipType::FinishToStart => "PR_FS",
            RelationshipType::StartToStart => "PR_SS",
            RelationshipType::FinishToFinish => "PR_FF",
            RelationshipType::StartToFinish => "PR_SF",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceType {
    Labor,
    NonLabor,
    Material,
}

impl Default for ResourceType {
    fn default() -> Self {
        ResourceType::Labor
    }
}

impl ResourceType {
    pub fn from_raw_token(token: &str) -> (Self, bool) {
        match token {
            "RT_Labor" => (ResourceType::Labor, true),
            "RT_Equip" => (ResourceType::NonLabor, true),
            "RT_Mat" => (ResourceType::Material, true),
            _ => (ResourceType::default(), false),
        }
    }

    pub fn as_raw_token(&self) -> &'static str {
        match self {
            ResourceType::Labor => "RT_Labor",
            ResourceType::NonLabor => "RT_Equip",
            ResourceType::Material => "RT_Mat",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivityCodeScope {
    Global,
    Eps,
    Project,
}

impl Default for ActivityCodeScope {
    fn default() -> Self {
        ActivityCodeScope::Project
    }
}

impl ActivityCodeScope {
    pub fn from_raw_token(token: &str) -> (Self, bool) {
        match token {
            "AS_Global" => (ActivityCodeScope::Global, true),
            "AS_EPS" => (ActivityCodeScope::Eps, true),
            "AS_Project" => (ActivityCodeScope::Project, true),
            _ => (ActivityCodeScope::default(), false),
        }
    }

    pub fn as_raw_token(&self) -> &'static str {
        match self {
            ActivityCodeScope::Global => "AS_Global",
            ActivityCodeScope::Eps => "AS_EPS",
            ActivityCodeScope::Project => "AS_Project",
        }
    }
}

/// Descriptive fields of a task. Computed schedule fields (early/late
/// dates, float) live in [`ComputedFields`], not here.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub project_id: String,
    pub wbs_id: Option<String>,
    pub task_code: String,
    pub name: String,
    pub task_type: TaskType,
    pub status: TaskStatus,
    pub percent_complete: f64,
    pub target_start: Option<NaiveDateTime>,
    pub target_end: Option<NaiveDateTime>,
    pub actual_start: Option<NaiveDateTime>,
    pub actual_end: Option<NaiveDateTime>,
    pub target_duration_hours: f64,
    pub remaining_duration_hours: f64,
}

impl Task {
    /// `floor(targetDurationHours / 8)`, a fixed constant independent of
    /// any calendar.
    pub fn duration_days(&self) -> i64 {
        (self.target_duration_hours / 8.0).floor() as i64
    }
}

/// Fields the CPM engine writes once, keyed by task id, merged into a
/// [`TaskView`] for read-only consumption.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ComputedFields {
    pub early_start_seconds: i64,
    pub early_end_seconds: i64,
    pub late_start_seconds: i64,
    pub late_end_seconds: i64,
    pub total_float_hours: f64,
    pub free_float_hours: f64,
}

impl ComputedFields {
    pub fn is_critical(&self) -> bool {
        self.total_float_hours <= 0.0
    }

    /// `floor(floatHours / 8)`.
    pub fn float_days(&self) -> i64 {
        (self.total_float_hours / 8.0).floor() as i64
    }
}

/// A directed edge between two tasks. Composite identity is
/// `(successor_task_id, predecessor_task_id, rel_type)`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub successor_task_id: String,
    pub predecessor_task_id: String,
    pub rel_type: RelationshipType,
    /// Stored in days; the XER field is hours and the builder divides by 8.
    pub lag_days: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,
    pub short_name: String,
    pub name: String,
    pub resource_type: ResourceType,
    pub unit: String,
    pub default_units_per_time: f64,
}

/// Composite identity is `(task_id, resource_id)`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResourceAssignment {
    pub task_id: String,
    pub resource_id: String,
    pub project_id: String,
    pub target_quantity: f64,
    pub actual_quantity: f64,
    pub remaining_quantity: f64,
    pub target_cost: f64,
    pub actual_cost: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorkCalendar {
    pub id: String,
    pub name: String,
    pub project_id: Option<String>,
    pub is_default: bool,
    pub hours_per_day: f64,
    pub hours_per_week: f64,
    pub hours_per_month: f64,
    pub hours_per_year: f64,
    /// 0 = Sunday .. 6 = Saturday. Stored but never consulted by the CPM
    /// engine (calendar-aware scheduling is a non-goal).
    pub work_days: Vec<u8>,
}

impl Default for WorkCalendar {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            project_id: None,
            is_default: false,
            hours_per_day: 8.0,
            hours_per_week: 40.0,
            hours_per_month: 172.0,
            hours_per_year: 2080.0,
            work_days: vec![1, 2, 3, 4, 5],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalendarException {
    pub calendar_id: String,
    pub date: chrono::NaiveDate,
    /// 0 means a holiday.
    pub hours_worked: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActivityCodeType {
    pub id: String,
    pub name: String,
    pub short_length: i64,
    pub sequence_number: i64,
    pub project_id: Option<String>,
    pub scope: ActivityCodeScope,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActivityCode {
    pub id: String,
    pub type_id: String,
    pub parent_id: Option<String>,
    pub name: String,
    pub short_name: String,
    pub sequence_number: i64,
    pub color: Option<String>,
}

/// Composite identity is `(task_id, code_id)`. Grouping by activity-code
/// type is a tagged variant carrying `type_id`, not a type hierarchy: two
/// assignments belong to the same group iff their `type_id` is equal.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TaskActivityCode {
    pub task_id: String,
    pub code_id: String,
    pub type_id: String,
    pub project_id: String,
}

/// The fully built, CPM-populated schedule. Immutable once handed to the
/// analyzer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub project: Project,
    pub wbs_elements: Vec<WbsElement>,
    pub tasks: HashMap<String, Task>,
    pub computed: HashMap<String, ComputedFields>,
    pub relationships: Vec<Relationship>,
    pub resources: Vec<Resource>,
    pub assignments: Vec<ResourceAssignment>,
    pub calendars: Vec<WorkCalendar>,
    pub calendar_exceptions: Vec<CalendarException>,
    pub activity_code_types: Vec<ActivityCodeType>,
    pub activity_codes: Vec<ActivityCode>,
    pub task_activity_codes: Vec<TaskActivityCode>,
}

/// A task merged with its computed CPM fields, the shape the analyzer and
/// CLI actually consume. `None` for `computed` means the CPM engine has not
/// run yet (or the task id was not present in its output).
///
/// Borrows from a `Schedule` rather than owning its data, so it has no
/// `Serialize`/`Deserialize` impl; the owned `Schedule` is what gets
/// serialized.
#[derive(Clone, Debug, PartialEq)]
pub struct TaskView<'a> {
    pub task: &'a Task,
    pub computed: Option<&'a ComputedFields>,
}

impl<'a> TaskView<'a> {
    pub fn is_critical(&self) -> bool {
        self.computed.map(ComputedFields::is_critical).unwrap_or(false)
    }

    pub fn float_days(&self) -> Option<i64> {
        self.computed.map(ComputedFields::float_days)
    }
}

impl Schedule {
    pub fn new(project: Project) -> Self {
        Self {
            project,
            wbs_elements: Vec::new(),
            tasks: HashMap::new(),
            computed: HashMap::new(),
            relationships: Vec::new(),
            resources: Vec::new(),
            assignments: Vec::new(),
            calendars: Vec::new(),
            calendar_exceptions: Vec::new(),
            activity_code_types: Vec::new(),
            activity_codes: Vec::new(),
            task_activity_codes: Vec::new(),
        }
    }

    pub fn task_view(&self, task_id: &str) -> Option<TaskView<'_>> {
        self.tasks.get(task_id).map(|task| TaskView {
            task,
            computed: self.computed.get(task_id),
        })
    }

    pub fn task_views(&self) -> impl Iterator<Item = TaskView<'_>> {
        self.tasks.values().map(|task| TaskView {
            task,
            computed: self.computed.get(&task.id),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_type_unknown_token_coerces_to_default_and_reports_unknown() {
        let (variant, known) = TaskType::from_raw_token("PR_??");
        assert_eq!(variant, TaskType::TaskDependent);
        assert!(!known);
    }

    #[test]
    fn task_type_roundtrip_is_identity_for_known_tokens() {
        for token in ["TT_Task", "TT_Rsrc", "TT_LOE", "TT_Mile", "TT_FinMile", "TT_WBS"] {
            let (variant, known) = TaskType::from_raw_token(token);
            assert!(known);
            assert_eq!(variant.as_raw_token(), token);
        }
    }

    #[test]
    fn relationship_type_unknown_defaults_to_fs() {
        let (variant, known) = RelationshipType::from_raw_token("PR_XX");
        assert_eq!(variant, RelationshipType::FinishToStart);
        assert!(!known);
    }

    #[test]
    fn relationship_type_roundtrip() {
        for token in ["PR_FS", "PR_SS", "PR_FF", "PR_SF"] {
            let (variant, known) = RelationshipType::from_raw_token(token);
            assert!(known);
            assert_eq!(variant.as_raw_token(), token);
        }
    }

    #[test]
    fn task_status_unknown_defaults_to_not_started() {
        let (variant, known) = TaskStatus::from_raw_token("TK_Bogus");
        assert_eq!(variant, TaskStatus::NotStarted);
        assert!(!known);
    }

    #[test]
    fn resource_type_unknown_defaults_to_labor() {
        let (variant, known) = ResourceType::from_raw_token("RT_Bogus");
        assert_eq!(variant, ResourceType::Labor);
        assert!(!known);
    }

    #[test]
    fn activity_code_scope_unknown_defaults_to_project() {
        let (variant, known) = ActivityCodeScope::from_raw_token("AS_Bogus");
        assert_eq!(variant, ActivityCodeScope::Project);
        assert!(!known);
    }

    #[test]
    fn duration_days_floors_hours_over_eight() {
        let task = Task {
            id: "1".into(),
            project_id: "p".into(),
            wbs_id: None,
            task_code: "A1000".into(),
            name: "Task".into(),
            task_type: TaskType::TaskDependent,
            status: TaskStatus::NotStarted,
            percent_complete: 0.0,
            target_start: None,
            target_end: None,
            actual_start: None,
            actual_end: None,
            target_duration_hours: 100.0,
            remaining_duration_hours: 100.0,
        };
        assert_eq!(task.duration_days(), 12); // floor(100/8) = 12
    }

    #[test]
    fn is_critical_iff_float_le_zero() {
        let critical = ComputedFields {
            early_start_seconds: 0,
            early_end_seconds: 0,
            late_start_seconds: 0,
            late_end_seconds: 0,
            total_float_hours: 0.0,
            free_float_hours: 0.0,
        };
        assert!(critical.is_critical());

        let negative = ComputedFields {
            total_float_hours: -4.0,
            ..critical
        };
        assert!(negative.is_critical());

        let not_critical = ComputedFields {
            total_float_hours: 40.0,
            ..critical
        };
        assert!(!not_critical.is_critical());
    }

    #[test]
    fn task_view_merges_descriptive_and_computed_fields() {
        let project = Project {
            id: "p".into(),
            short_name: "P".into(),
            name: "Project".into(),
            plan_start: None,
            plan_end: None,
            data_date: None,
        };
        let mut schedule = Schedule::new(project);
        schedule.tasks.insert(
            "1".into(),
            Task {
                id: "1".into(),
                project_id: "p".into(),
                wbs_id: None,
                task_code: "A1000".into(),
                name: "Task".into(),
                task_type: TaskType::TaskDependent,
                status: TaskStatus::NotStarted,
                percent_complete: 0.0,
                target_start: None,
                target_end: None,
                actual_start: None,
                actual_end: None,
                target_duration_hours: 80.0,
                remaining_duration_hours: 80.0,
            },
        );

        // No CPM run yet: computed is None.
        let view = schedule.task_view("1").unwrap();
        assert!(view.computed.is_none());
        assert!(!view.is_critical());

        schedule.computed.insert(
            "1".into(),
            ComputedFields {
                early_start_seconds: 0,
                early_end_seconds: 288_000,
                late_start_seconds: 0,
                late_end_seconds: 288_000,
                total_float_hours: 0.0,
                free_float_hours: 0.0,
            },
        );

        let view = schedule.task_view("1").unwrap();
        assert!(view.is_critical());
        assert_eq!(view.float_days(), Some(0));
    }
}
