use serde::{Deserialize, Serialize};

use super::course::Course;

/// Name used when upstream omits an assignment name.
pub const UNKNOWN_ASSIGNMENT: &str = "Unknown Assignment";

/// Name used when neither the assignment nor its course carries a name.
pub const UNKNOWN_COURSE: &str = "Unknown Course";

/// A Canvas assignment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Assignment {
    pub id: String,
    pub name: String,
    pub course_id: String,
    pub course_name: String,
    pub due_at: Option<String>,
    pub points_possible: Option<f64>,
    pub html_url: Option<String>,
}

impl Assignment {
    /// Fill in course details the assignment payload did not carry.
    pub fn with_course_context(mut self, course: &Course) -> Self {
        if self.course_id.is_empty() {
            self.course_id = course.id.clone();
        }
        if self.course_name == UNKNOWN_COURSE && !course.name.is_empty() {
            self.course_name = course.name.clone();
        }
        self
    }
}
