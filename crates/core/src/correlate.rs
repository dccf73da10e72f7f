//! Pure correlation of polled collections by student.
//!
//! Courses map to students through their first enrollment; assignments map
//! to students through their course; submissions follow the assignment they
//! belong to. Anything that cannot be resolved is dropped, never an error.

use std::collections::{BTreeMap, HashMap};

use crate::models::{Assignment, Course, Submission};
use crate::poller::PollSnapshot;

/// `student_id -> assignment_id -> assignment`
pub type AssignmentsByStudent = BTreeMap<String, BTreeMap<String, Assignment>>;

/// `student_id -> assignment_id -> submission`
pub type SubmissionsByStudent = BTreeMap<String, BTreeMap<String, Submission>>;

/// Build `assignment_id -> student_id` via course ownership.
pub fn map_assignment_to_student(
    courses: &[Course],
    assignments: &[Assignment],
) -> HashMap<String, String> {
    let course_to_student: HashMap<&str, &str> = courses
        .iter()
        .filter(|course| !course.id.is_empty())
        .filter_map(|course| Some((course.id.as_str(), course.owner()?)))
        .collect();

    assignments
        .iter()
        .filter(|assignment| !assignment.id.is_empty())
        .filter_map(|assignment| {
            let student_id = course_to_student.get(assignment.course_id.as_str())?;
            Some((assignment.id.clone(), student_id.to_string()))
        })
        .collect()
}

pub fn group_assignments_by_student(
    assignments: &[Assignment],
    assignment_to_student: &HashMap<String, String>,
) -> AssignmentsByStudent {
    let mut grouped = AssignmentsByStudent::new();
    for assignment in assignments {
        if assignment.id.is_empty() {
            continue;
        }
        if let Some(student_id) = assignment_to_student.get(&assignment.id) {
            grouped
                .entry(student_id.clone())
                .or_default()
                .insert(assignment.id.clone(), assignment.clone());
        }
    }
    grouped
}

pub fn group_submissions_by_student(
    submissions: &[Submission],
    assignment_to_student: &HashMap<String, String>,
) -> SubmissionsByStudent {
    let mut grouped = SubmissionsByStudent::new();
    for submission in submissions {
        if let Some(student_id) = assignment_to_student.get(&submission.assignment_id) {
            grouped
                .entry(student_id.clone())
                .or_default()
                .insert(submission.assignment_id.clone(), submission.clone());
        }
    }
    grouped
}

/// One cycle's assignments and submissions, grouped per student.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Correlation {
    pub assignments: AssignmentsByStudent,
    pub submissions: SubmissionsByStudent,
}

impl Correlation {
    pub fn new(
        courses: &[Course],
        assignments: &[Assignment],
        submissions: &[Submission],
    ) -> Self {
        let owners = map_assignment_to_student(courses, assignments);
        Self {
            assignments: group_assignments_by_student(assignments, &owners),
            submissions: group_submissions_by_student(submissions, &owners),
        }
    }

    pub fn from_snapshot(snapshot: &PollSnapshot) -> Self {
        Self::new(
            &snapshot.courses,
            &snapshot.assignments,
            &snapshot.submissions,
        )
    }

    /// Whether `assignment_id` was seen for `student_id` this cycle.
    pub fn contains(&self, student_id: &str, assignment_id: &str) -> bool {
        self.assignments
            .get(student_id)
            .is_some_and(|assignments| assignments.contains_key(assignment_id))
    }
}
