use serde::{Deserialize, Serialize};

/// An observee: a student the observer account is allowed to see.
///
/// The same shape is cached in the tracking memory and persisted as
/// `student_info`, so display names survive a student disappearing from
/// one poll and coming back in a later one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Student {
    pub id: String,
    pub name: String,
    pub short_name: String,
    pub sortable_name: String,
}

impl Student {
    /// Display name used when upstream sends none.
    pub fn fallback_name(id: &str) -> String {
        format!("Student {id}")
    }

    /// A student known only by identifier.
    pub fn placeholder(id: &str) -> Self {
        let name = Self::fallback_name(id);
        Self {
            id: id.to_string(),
            short_name: name.clone(),
            sortable_name: name.clone(),
            name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_uses_fallback_everywhere() {
        let student = Student::placeholder("42");
        assert_eq!(student.id, "42");
        assert_eq!(student.name, "Student 42");
        assert_eq!(student.short_name, "Student 42");
        assert_eq!(student.sortable_name, "Student 42");
    }

    #[test]
    fn serializes_with_snake_case_fields() {
        let student = Student {
            id: "7".into(),
            name: "Avery Lee".into(),
            short_name: "Avery".into(),
            sortable_name: "Lee, Avery".into(),
        };
        let v = serde_json::to_value(&student).unwrap();
        assert_eq!(v["id"], "7");
        assert_eq!(v["short_name"], "Avery");
        assert_eq!(v["sortable_name"], "Lee, Avery");
    }
}
