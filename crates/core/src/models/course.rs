use serde::{Deserialize, Serialize};

/// A Canvas course as seen through one observee's course list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Course {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub enrollments: Vec<Enrollment>,
}

/// Enrollment record attached to a course.
///
/// A `null` enrollment upstream normalizes to the default value, which has
/// no `user_id` and therefore owns nothing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Enrollment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub enrollment_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enrollment_state: Option<String>,
}

impl Course {
    /// Identifier of the student owning this course.
    ///
    /// Only the first enrollment is trusted.
    pub fn owner(&self) -> Option<&str> {
        self.enrollments
            .first()?
            .user_id
            .as_deref()
            .filter(|id| !id.is_empty())
    }
}
