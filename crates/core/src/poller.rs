//! Data acquisition: students, then courses, then per-course assignments
//! and submissions.
//!
//! The poller holds no state between calls. Per-course fetches are issued
//! concurrently through the [`FetchGate`] and joined before the caller gets
//! a result; nothing downstream depends on the order they finish in, since
//! correlation works by identifier lookup.

use std::collections::HashSet;
use std::sync::Arc;

use futures_util::future::try_join_all;
use futures_util::try_join;
use serde::Serialize;
use tracing::debug;

use crate::connectors::LmsConnector;
use crate::error::Result;
use crate::gate::FetchGate;
use crate::models::{Assignment, Course, Student, Submission};

/// Everything fetched in one update cycle.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PollSnapshot {
    pub students: Vec<Student>,
    pub courses: Vec<Course>,
    pub assignments: Vec<Assignment>,
    pub submissions: Vec<Submission>,
}

pub struct Poller {
    connector: Arc<dyn LmsConnector>,
    gate: FetchGate,
}

impl Poller {
    pub fn new(connector: Arc<dyn LmsConnector>, gate: FetchGate) -> Self {
        Self { connector, gate }
    }

    pub fn connector(&self) -> &dyn LmsConnector {
        self.connector.as_ref()
    }

    pub fn gate(&self) -> &FetchGate {
        &self.gate
    }

    pub async fn poll_students(&self) -> Result<Vec<Student>> {
        self.connector.list_students().await
    }

    /// Courses of every observed student, flattened.
    pub async fn poll_courses(&self) -> Result<Vec<Course>> {
        let students = self.poll_students().await?;
        self.courses_for(&students).await
    }

    /// Assignments of every course that has an owning enrollment.
    pub async fn poll_assignments(&self) -> Result<Vec<Assignment>> {
        let courses = self.poll_courses().await?;
        self.assignments_for(&courses).await
    }

    /// Submissions of every course that has an owning enrollment.
    pub async fn poll_submissions(&self) -> Result<Vec<Submission>> {
        let courses = self.poll_courses().await?;
        self.submissions_for(&courses).await
    }

    /// Assignments that have not been turned in yet.
    pub async fn poll_pending_assignments(&self) -> Result<Vec<Assignment>> {
        let courses = self.poll_courses().await?;
        let (assignments, submissions) = try_join!(
            self.assignments_for(&courses),
            self.submissions_for(&courses)
        )?;
        Ok(pending_assignments(assignments, &submissions))
    }

    /// One consistent pass over every collection.
    ///
    /// Students and courses are fetched once and reused for the
    /// assignment and submission fan-out.
    pub async fn poll_snapshot(&self) -> Result<PollSnapshot> {
        let students = self.poll_students().await?;
        let courses = self.courses_for(&students).await?;
        let (assignments, submissions) = try_join!(
            self.assignments_for(&courses),
            self.submissions_for(&courses)
        )?;

        debug!(
            students = students.len(),
            courses = courses.len(),
            assignments = assignments.len(),
            submissions = submissions.len(),
            "Poll snapshot complete"
        );

        Ok(PollSnapshot {
            students,
            courses,
            assignments,
            submissions,
        })
    }

    async fn courses_for(&self, students: &[Student]) -> Result<Vec<Course>> {
        let fetches = students
            .iter()
            .filter(|student| !student.id.is_empty())
            .map(|student| self.gate.run(self.connector.list_courses(&student.id)));
        let results = try_join_all(fetches).await?;
        Ok(results.into_iter().flatten().collect())
    }

    async fn assignments_for(&self, courses: &[Course]) -> Result<Vec<Assignment>> {
        let fetches = owned_courses(courses).map(|(owner, course)| async move {
            let assignments = self
                .gate
                .run(self.connector.list_assignments(owner, &course.id))
                .await?;
            Ok::<_, crate::error::HomeroomError>(
                assignments
                    .into_iter()
                    .map(|a| a.with_course_context(course))
                    .collect::<Vec<_>>(),
            )
        });
        let results = try_join_all(fetches).await?;
        Ok(results.into_iter().flatten().collect())
    }

    async fn submissions_for(&self, courses: &[Course]) -> Result<Vec<Submission>> {
        let fetches = owned_courses(courses).map(|(owner, course)| {
            self.gate
                .run(self.connector.list_submissions(owner, &course.id))
        });
        let results = try_join_all(fetches).await?;
        Ok(results.into_iter().flatten().collect())
    }
}

/// Courses paired with their owning student; courses without one are skipped.
fn owned_courses<'a>(courses: &'a [Course]) -> impl Iterator<Item = (&'a str, &'a Course)> + 'a {
    courses.iter().filter_map(|course| match course.owner() {
        Some(owner) => Some((owner, course)),
        None => {
            debug!(course_id = %course.id, "Course has no owning enrollment, skipping");
            None
        }
    })
}

/// Drop assignments whose submission has been turned in.
pub fn pending_assignments(
    assignments: Vec<Assignment>,
    submissions: &[Submission],
) -> Vec<Assignment> {
    let turned_in: HashSet<&str> = submissions
        .iter()
        .filter(|s| s.is_turned_in() && !s.assignment_id.is_empty())
        .map(|s| s.assignment_id.as_str())
        .collect();

    assignments
        .into_iter()
        .filter(|a| !a.id.is_empty() && !turned_in.contains(a.id.as_str()))
        .collect()
}
