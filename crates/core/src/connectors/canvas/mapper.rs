use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::models::assignment::{UNKNOWN_ASSIGNMENT, UNKNOWN_COURSE};
use crate::models::{Assignment, Course, Enrollment, Student, Submission, WorkflowState};

type Record = Map<String, Value>;

/// Normalizes raw Canvas JSON into Homeroom's fixed-shape records.
///
/// This is the only place that knows which upstream fields may be missing,
/// null, numeric or textual. A list endpoint that answers with anything but
/// an array degrades to an empty list with a warning.
pub struct CanvasMapper;

impl CanvasMapper {
    /// Normalize the observee list.
    pub fn students(value: Value) -> Vec<Student> {
        Self::records("students", value)
            .iter()
            .map(Self::normalize_student)
            .collect()
    }

    /// Normalize one observee's course list.
    pub fn courses(value: Value) -> Vec<Course> {
        Self::records("courses", value)
            .iter()
            .map(Self::normalize_course)
            .collect()
    }

    /// Normalize one course's assignment list.
    pub fn assignments(value: Value) -> Vec<Assignment> {
        Self::records("assignments", value)
            .iter()
            .map(Self::normalize_assignment)
            .collect()
    }

    /// Normalize one course's submission list.
    pub fn submissions(value: Value) -> Vec<Submission> {
        Self::records("submissions", value)
            .iter()
            .map(Self::normalize_submission)
            .collect()
    }

    fn records(kind: &str, value: Value) -> Vec<Record> {
        let items = match value {
            Value::Array(items) => items,
            Value::Null => return Vec::new(),
            other => {
                warn!(kind, received = json_type(&other), "Invalid {kind} data type, using empty list");
                return Vec::new();
            }
        };

        let total = items.len();
        let records: Vec<Record> = items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(record) => Some(record),
                _ => None,
            })
            .collect();
        if records.len() < total {
            debug!(kind, skipped = total - records.len(), "Skipped non-object records");
        }
        records
    }

    fn normalize_student(record: &Record) -> Student {
        let id = id_field(record, "id");
        let name = string_field(record, "name").unwrap_or_else(|| Student::fallback_name(&id));
        Student {
            short_name: string_field(record, "short_name").unwrap_or_else(|| name.clone()),
            sortable_name: string_field(record, "sortable_name").unwrap_or_else(|| name.clone()),
            name,
            id,
        }
    }

    fn normalize_course(record: &Record) -> Course {
        let enrollments = match record.get("enrollments") {
            Some(Value::Array(items)) => items.iter().map(Self::normalize_enrollment).collect(),
            _ => Vec::new(),
        };
        Course {
            id: id_field(record, "id"),
            name: string_field(record, "name")
                .or_else(|| string_field(record, "course_code"))
                .unwrap_or_default(),
            enrollments,
        }
    }

    fn normalize_enrollment(value: &Value) -> Enrollment {
        match value {
            Value::Object(record) => Enrollment {
                user_id: string_field(record, "user_id"),
                enrollment_type: string_field(record, "type"),
                enrollment_state: string_field(record, "enrollment_state"),
            },
            _ => Enrollment::default(),
        }
    }

    fn normalize_assignment(record: &Record) -> Assignment {
        Assignment {
            id: id_field(record, "id"),
            name: string_field(record, "name").unwrap_or_else(|| UNKNOWN_ASSIGNMENT.to_string()),
            course_id: id_field(record, "course_id"),
            course_name: string_field(record, "course_name")
                .unwrap_or_else(|| UNKNOWN_COURSE.to_string()),
            due_at: string_field(record, "due_at"),
            points_possible: number_field(record, "points_possible"),
            html_url: string_field(record, "html_url"),
        }
    }

    fn normalize_submission(record: &Record) -> Submission {
        Submission {
            assignment_id: id_field(record, "assignment_id"),
            workflow_state: string_field(record, "workflow_state")
                .map(WorkflowState::from)
                .unwrap_or(WorkflowState::Unsubmitted),
            submitted_at: string_field(record, "submitted_at"),
            score: number_field(record, "score"),
            grade: string_field(record, "grade"),
        }
    }
}

/// Text or numeric field as a trimmed, non-empty string.
fn string_field(record: &Record, key: &str) -> Option<String> {
    match record.get(key)? {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Identifier field; empty when absent so correlation can drop the record.
fn id_field(record: &Record, key: &str) -> String {
    string_field(record, key).unwrap_or_default()
}

fn number_field(record: &Record, key: &str) -> Option<f64> {
    match record.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
